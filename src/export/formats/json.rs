//! Native JSON export.
//!
//! Field names are spelled out so the file can be read without this crate:
//! `filename`, `exportedAt`, `totalCount`, `countsByCategory` and
//! `detections[].boundingBox`.

use crate::export::document::ExportDocument;
use crate::export::error::FormatError;
use crate::export::traits::ExportFormat;

/// Native detection-results JSON.
pub struct JsonFormat;

impl ExportFormat for JsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Detection results (JSON)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, document: &ExportDocument) -> Result<Vec<u8>, FormatError> {
        log::debug!(
            "Encoding {} detections of {} as JSON",
            document.total_count,
            document.filename
        );
        Ok(serde_json::to_vec_pretty(document)?)
    }
}
