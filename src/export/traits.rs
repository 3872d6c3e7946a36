//! Trait definitions for export format implementations.

use super::document::ExportDocument;
use super::error::FormatError;

/// An encoding of [`ExportDocument`] into bytes.
///
/// Each format (native JSON, COCO, Pascal VOC) implements this trait.
pub trait ExportFormat: Send + Sync {
    /// Unique identifier (e.g., "json", "coco", "voc").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn mime_type(&self) -> &'static str;

    /// Encode the document.
    fn encode(&self, document: &ExportDocument) -> Result<Vec<u8>, FormatError>;
}
