//! A single recognized symbol or part instance.

use serde::{Deserialize, Serialize};

/// Identifier of a detection, unique within one result set.
pub type DetectionId = u32;

/// Axis-aligned rectangle in image-pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Whether all components are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Whether the box lies completely inside an image of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        self.right() <= image_width as f32 && self.bottom() <= image_height as f32
    }
}

/// One recognized symbol/part instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub id: DetectionId,
    pub category: String,
    /// Model confidence in `[0, 1]`.
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl Detection {
    pub fn new(
        id: DetectionId,
        category: impl Into<String>,
        confidence: f32,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            id,
            category: category.into(),
            confidence,
            bounding_box,
        }
    }

    /// Confidence as a rounded percentage (0.876 -> 88).
    pub fn confidence_percent(&self) -> u32 {
        (self.confidence * 100.0).round() as u32
    }

    /// Overlay label text, e.g. `Valve (95%)`.
    pub fn label(&self) -> String {
        format!("{} ({}%)", self.category, self.confidence_percent())
    }
}
