//! Unit tests for export format implementations.

mod coco_tests;

use crate::export::document::ExportDocument;
use crate::model::{BoundingBox, DetectionResult};

/// Two-detection document with a fixed export time.
fn sample_document() -> ExportDocument {
    let result = DetectionResult::from_entries([
        ("Valve", 0.95, BoundingBox::new(150.0, 200.0, 40.0, 40.0)),
        ("Pump", 0.88, BoundingBox::new(300.0, 150.0, 60.0, 50.0)),
    ])
    .expect("valid result");
    ExportDocument::new("plan.png", &result, "2024-03-01T08:00:00Z").with_image_size(1024, 768)
}
