//! COCO JSON export.
//!
//! Writes a single-image COCO dataset. Categories are numbered from 1 in
//! order of first appearance; each detection becomes one annotation with
//! its confidence carried as `score`.

use serde::Serialize;

use crate::export::document::ExportDocument;
use crate::export::error::FormatError;
use crate::export::traits::ExportFormat;

/// COCO JSON format.
///
/// Supports:
/// - Bounding boxes (bbox)
/// - Detection scores
///
/// Does not support:
/// - Segmentation (detections are boxes only)
/// - Category colors (not part of standard COCO)
pub struct CocoFormat;

impl ExportFormat for CocoFormat {
    fn id(&self) -> &'static str {
        "coco"
    }

    fn display_name(&self) -> &'static str {
        "COCO (JSON)"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn mime_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, document: &ExportDocument) -> Result<Vec<u8>, FormatError> {
        let (width, height) = document
            .image_size
            .map_or((0, 0), |size| (size.width, size.height));
        if width == 0 || height == 0 {
            log::warn!(
                "Image '{}' has no dimensions, COCO image entry uses 0x0",
                document.filename
            );
        }

        let categories: Vec<CocoCategory> = document
            .counts_by_category
            .iter()
            .zip(1u32..)
            .map(|((name, _), id)| CocoCategory {
                id,
                name: name.to_string(),
                supercategory: "none".to_string(),
            })
            .collect();

        let mut annotations = Vec::with_capacity(document.detections.len());
        for det in &document.detections {
            let category_id = categories
                .iter()
                .find(|c| c.name == det.category)
                .map(|c| c.id)
                .ok_or_else(|| {
                    FormatError::invalid_format(format!(
                        "detection {} has category '{}' missing from counts",
                        det.id, det.category
                    ))
                })?;
            let b = det.bounding_box;
            annotations.push(CocoAnnotation {
                id: u64::from(det.id),
                image_id: 1,
                category_id,
                bbox: [b.x, b.y, b.width, b.height],
                area: b.area(),
                iscrowd: 0,
                score: det.confidence,
            });
        }

        let dataset = CocoDataset {
            info: CocoInfo {
                description: format!("Detections for {}", document.filename),
                date_created: document.exported_at.clone(),
            },
            images: vec![CocoImage {
                id: 1,
                file_name: document.filename.clone(),
                width,
                height,
            }],
            annotations,
            categories,
        };

        log::debug!(
            "Encoded {} COCO annotations in {} categories",
            dataset.annotations.len(),
            dataset.categories.len()
        );

        Ok(serde_json::to_vec_pretty(&dataset)?)
    }
}

#[derive(Debug, Serialize)]
struct CocoDataset {
    info: CocoInfo,
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize)]
struct CocoInfo {
    description: String,
    date_created: String,
}

#[derive(Debug, Serialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct CocoAnnotation {
    id: u64,
    image_id: u64,
    category_id: u32,
    bbox: [f32; 4],
    area: f32,
    iscrowd: u8,
    score: f32,
}

#[derive(Debug, Serialize)]
struct CocoCategory {
    id: u32,
    name: String,
    supercategory: String,
}
