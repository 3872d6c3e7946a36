//! mechcount - annotated viewer for part detection on mechanical drawings
//!
//! Load an engineering drawing, run a (mock) part/symbol detection service
//! over it and inspect the result through a pannable, zoomable view with
//! bounding boxes and labels drawn on top.
//!
//! The [`viewer::AnnotatedViewer`] owns all state and renders through the
//! pure [`render::render`]. Detection runs on a background
//! [`detection::DetectionWorker`], and results can be exported as JSON,
//! COCO or Pascal VOC through [`export`].

pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod export;
pub mod interaction;
pub mod model;
pub mod project;
pub mod render;
pub mod session;
pub mod source;
pub mod viewer;
pub mod zoom_math;

pub use config::ViewerConfig;
pub use error::ViewerError;
pub use session::Session;
pub use viewer::{AnnotatedViewer, DetectionOutcome, ViewerMessage};
