//! Output of one processing run over one source image.

use std::collections::HashSet;

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use super::category::CategoryPalette;
use super::detection::{BoundingBox, Detection, DetectionId};
use crate::error::ViewerError;

/// Per-category detection counts in first-appearance order.
///
/// Serializes as a JSON object keyed by category name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    entries: Vec<(String, usize)>,
}

impl CategoryCounts {
    /// Count detections grouped by category.
    pub fn from_detections(detections: &[Detection]) -> Self {
        let mut entries: Vec<(String, usize)> = Vec::new();
        for det in detections {
            match entries.iter_mut().find(|(name, _)| *name == det.category) {
                Some((_, count)) => *count += 1,
                None => entries.push((det.category.clone(), 1)),
            }
        }
        Self { entries }
    }

    /// Count for a category (0 when absent).
    pub fn get(&self, category: &str) -> usize {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map_or(0, |(_, count)| *count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Number of distinct categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, count)| count).sum()
    }
}

impl Serialize for CategoryCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, count) in &self.entries {
            map.serialize_entry(name, count)?;
        }
        map.end()
    }
}

/// One row of the per-category summary panel.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub category: String,
    pub count: usize,
    pub color: [u8; 3],
    pub mean_confidence: f32,
}

/// The complete, immutable output of one processing run.
///
/// Counts are always derived from the detection list, so
/// `counts.total() == total_count() == detections().len()` holds by
/// construction. Serialized as the bare detection list and validated again
/// on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Detection>", into = "Vec<Detection>")]
pub struct DetectionResult {
    detections: Vec<Detection>,
    counts: CategoryCounts,
}

impl DetectionResult {
    /// Build a result from service output.
    ///
    /// Rejects duplicate ids, confidences outside `[0, 1]` and boxes with
    /// negative or non-finite components as a malformed service response.
    pub fn new(detections: Vec<Detection>) -> Result<Self, ViewerError> {
        let mut seen: HashSet<DetectionId> = HashSet::with_capacity(detections.len());
        for det in &detections {
            if !seen.insert(det.id) {
                return Err(ViewerError::service(format!(
                    "duplicate detection id {}",
                    det.id
                )));
            }
            if !(0.0..=1.0).contains(&det.confidence) {
                return Err(ViewerError::service(format!(
                    "detection {} has confidence {} outside [0, 1]",
                    det.id, det.confidence
                )));
            }
            if !det.bounding_box.is_valid() {
                return Err(ViewerError::service(format!(
                    "detection {} has an invalid bounding box",
                    det.id
                )));
            }
        }

        let counts = CategoryCounts::from_detections(&detections);
        Ok(Self { detections, counts })
    }

    /// Result with no detections.
    pub fn empty() -> Self {
        Self {
            detections: Vec::new(),
            counts: CategoryCounts::default(),
        }
    }

    /// Build a result from `(category, confidence, box)` entries, numbering
    /// ids from 1 in order.
    pub fn from_entries<I, S>(entries: I) -> Result<Self, ViewerError>
    where
        I: IntoIterator<Item = (S, f32, BoundingBox)>,
        S: Into<String>,
    {
        let detections = entries
            .into_iter()
            .zip(1..)
            .map(|((category, confidence, bbox), id)| {
                Detection::new(id, category, confidence, bbox)
            })
            .collect();
        Self::new(detections)
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn counts_by_category(&self) -> &CategoryCounts {
        &self.counts
    }

    pub fn total_count(&self) -> usize {
        self.detections.len()
    }

    /// Mean confidence across all detections (0 when empty).
    pub fn mean_confidence(&self) -> f32 {
        if self.detections.is_empty() {
            return 0.0;
        }
        let sum: f32 = self.detections.iter().map(|d| d.confidence).sum();
        sum / self.detections.len() as f32
    }

    /// Per-category rows in first-appearance order.
    pub fn summary(&self, palette: &CategoryPalette) -> Vec<CategorySummary> {
        self.counts
            .iter()
            .map(|(category, count)| {
                let confidence_sum: f32 = self
                    .detections
                    .iter()
                    .filter(|d| d.category == category)
                    .map(|d| d.confidence)
                    .sum();
                CategorySummary {
                    category: category.to_string(),
                    count,
                    color: palette.color_for(category),
                    mean_confidence: confidence_sum / count as f32,
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<Detection>> for DetectionResult {
    type Error = ViewerError;

    fn try_from(detections: Vec<Detection>) -> Result<Self, Self::Error> {
        Self::new(detections)
    }
}

impl From<DetectionResult> for Vec<Detection> {
    fn from(result: DetectionResult) -> Self {
        result.detections
    }
}
