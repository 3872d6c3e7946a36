//! Detection result export.
//!
//! An [`ExportDocument`] is a snapshot of one detection result. Formats
//! implementing [`ExportFormat`] turn it into bytes, and an [`ExportSink`]
//! persists those bytes.
//!
//! ## Supported Formats
//!
//! - **JSON**: native self-describing document (default)
//! - **COCO JSON**: single-image dataset with scores
//! - **Pascal VOC XML**: one annotation file with corner coordinates
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mechcount::export::{ExportDocument, ExportSink, FileSink, FormatRegistry};
//!
//! let registry = FormatRegistry::new();
//! let format = registry.require("coco")?;
//! let path = FileSink::new("out").write(&document, format)?;
//! ```

mod document;
mod error;
pub mod formats;
mod registry;
mod sink;
pub mod timestamp;
mod traits;

pub use document::{ExportDocument, ImageSize};
pub use error::FormatError;
pub use registry::{FormatRegistry, NATIVE_FORMAT};
pub use sink::{ExportSink, FileSink, MemorySink};
pub use traits::ExportFormat;
