//! Self-describing export document built from a detection result.

use std::path::Path;

use serde::Serialize;

use super::timestamp;
use crate::model::{CategoryCounts, Detection, DetectionResult};

/// Pixel size of the exported source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Everything an export format needs: source filename, export time,
/// aggregate counts and the full detection list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub filename: String,
    /// ISO 8601 UTC
    pub exported_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_size: Option<ImageSize>,
    pub total_count: usize,
    pub counts_by_category: CategoryCounts,
    pub detections: Vec<Detection>,
}

impl ExportDocument {
    /// Snapshot `result` with an explicit export time.
    pub fn new(
        filename: impl Into<String>,
        result: &DetectionResult,
        exported_at: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            exported_at: exported_at.into(),
            image_size: None,
            total_count: result.total_count(),
            counts_by_category: result.counts_by_category().clone(),
            detections: result.detections().to_vec(),
        }
    }

    /// Snapshot `result` stamped with the current time.
    pub fn from_result(filename: impl Into<String>, result: &DetectionResult) -> Self {
        Self::new(filename, result, timestamp::current_timestamp())
    }

    /// Attach the source image size. Zero sizes are ignored.
    pub fn with_image_size(mut self, width: u32, height: u32) -> Self {
        self.image_size = (width > 0 && height > 0).then_some(ImageSize { width, height });
        self
    }

    /// Filename without directory or extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
    }
}
