//! Detection overlay: box strokes and category labels.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use super::font;
use crate::constants::overlay;
use crate::model::{CategoryPalette, Detection, DetectionResult};

/// Label text scale (7 px glyphs drawn at 2x).
const LABEL_TEXT_SCALE: u32 = 2;

/// Top-left corner and size of a detection's label background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelPlacement {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Where the label for `detection` is drawn.
///
/// Normally just above the box's top-left corner. When the box is too close
/// to the top edge for that, the label moves inside the box.
pub fn label_placement(detection: &Detection) -> LabelPlacement {
    let bbox = &detection.bounding_box;
    let box_x = bbox.x.round() as i32;
    let box_y = bbox.y.round() as i32;

    let y = if box_y < overlay::LABEL_OFFSET {
        box_y + overlay::LABEL_INSET
    } else {
        box_y - overlay::LABEL_OFFSET
    };

    LabelPlacement {
        x: box_x,
        y,
        width: font::text_width(&detection.label(), LABEL_TEXT_SCALE) + overlay::LABEL_PADDING,
        height: overlay::LABEL_HEIGHT,
    }
}

/// Draw every detection of `result` onto `surface` (image-pixel space).
///
/// Boxes lying entirely past the surface are skipped.
pub fn draw_detections(surface: &mut RgbaImage, result: &DetectionResult, palette: &CategoryPalette) {
    let (width, height) = surface.dimensions();
    for detection in result.detections() {
        let bbox = &detection.bounding_box;
        if bbox.x.round() >= width as f32 || bbox.y.round() >= height as f32 {
            log::debug!("Detection {} lies outside the image, not drawn", detection.id);
            continue;
        }
        let [r, g, b] = palette.color_for(&detection.category);
        let color = Rgba([r, g, b, 255]);
        stroke_box(surface, detection, color);
        draw_label(surface, detection);
    }
}

/// Stroke the bounding box `BOX_STROKE` pixels wide, centered on its edge.
///
/// Edges past the surface are pulled in to just beyond its border, so they
/// stay clipped while the visible edges keep their position.
fn stroke_box(surface: &mut RgbaImage, detection: &Detection, color: Rgba<u8>) {
    let bbox = &detection.bounding_box;
    let margin = overlay::BOX_STROKE as f32;
    let right = bbox.right().round().min(surface.width() as f32 + margin);
    let bottom = bbox.bottom().round().min(surface.height() as f32 + margin);
    let x = bbox.x.round() as i32;
    let y = bbox.y.round() as i32;
    let width = right as i32 - x;
    let height = bottom as i32 - y;

    let half = (overlay::BOX_STROKE / 2) as i32;
    for inset in -half..=half {
        let w = width - 2 * inset;
        let h = height - 2 * inset;
        // imageproc rects must be at least 1x1
        if w < 1 || h < 1 {
            continue;
        }
        let rect = Rect::at(x + inset, y + inset).of_size(w as u32, h as u32);
        draw_hollow_rect_mut(surface, rect, color);
    }
}

fn draw_label(surface: &mut RgbaImage, detection: &Detection) {
    let placement = label_placement(detection);
    blend_rect(
        surface,
        placement.x,
        placement.y,
        placement.width,
        placement.height,
        Rgba(overlay::LABEL_BACKGROUND),
    );

    let text_top = placement.y
        + (placement.height.saturating_sub(font::text_height(LABEL_TEXT_SCALE)) / 2) as i32;
    font::draw_text(
        surface,
        placement.x + (overlay::LABEL_PADDING / 2) as i32,
        text_top,
        &detection.label(),
        LABEL_TEXT_SCALE,
        Rgba(overlay::LABEL_TEXT),
    );
}

/// Alpha-blend a filled rectangle over `surface`, clipped to its bounds.
pub fn blend_rect(surface: &mut RgbaImage, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
    let x0 = x.max(0) as u32;
    let y0 = y.max(0) as u32;
    let x1 = (i64::from(x) + i64::from(width)).clamp(0, i64::from(surface.width())) as u32;
    let y1 = (i64::from(y) + i64::from(height)).clamp(0, i64::from(surface.height())) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            let dst = surface.get_pixel_mut(px, py);
            *dst = blend(*dst, color);
        }
    }
}

/// Source-over blend of `src` onto `dst` with integer rounding.
pub fn blend(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = u32::from(src[3]);
    let inv = 255 - a;
    let mix = |s: u8, d: u8| ((u32::from(s) * a + u32::from(d) * inv + 127) / 255) as u8;
    let alpha = ((a * 255 + u32::from(dst[3]) * inv + 127) / 255) as u8;
    Rgba([mix(src[0], dst[0]), mix(src[1], dst[1]), mix(src[2], dst[2]), alpha])
}
