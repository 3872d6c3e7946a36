//! Data models for detection results.

mod category;
mod detection;
mod result;

pub use category::{Category, CategoryPalette, FALLBACK_COLOR, default_categories};
pub use detection::{BoundingBox, Detection, DetectionId};
pub use result::{CategoryCounts, CategorySummary, DetectionResult};
