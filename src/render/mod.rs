//! Rendering of the annotated view.
//!
//! [`render`] is a pure function of its inputs: the source image is drawn at
//! native resolution into an off-screen surface, detections are drawn on
//! top, and the surface is composited into the viewport through the current
//! [`ViewTransform`]. Identical inputs always produce identical pixels.

mod composite;
pub mod font;
mod overlay;

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::constants::viewport;
use crate::error::ViewerError;
use crate::model::{CategoryPalette, DetectionResult};
use crate::source::{SourceContent, SourceImage};
use crate::zoom_math::ViewTransform;

pub use composite::composite;
pub use overlay::{LabelPlacement, blend, draw_detections, label_placement};

/// Viewport size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl ViewportSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(viewport::DEFAULT_WIDTH, viewport::DEFAULT_HEIGHT)
    }
}

/// What a rendered frame shows.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Image with overlays composited through the transform
    Composited,
    /// Document source; placeholder with a summary caption
    Document,
    /// Nothing loaded
    Empty,
    /// Source could not be rasterized; placeholder shown instead
    Fallback(ViewerError),
}

/// One rendered viewport frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub pixels: RgbaImage,
    pub outcome: RenderOutcome,
}

impl Frame {
    /// Encode the frame as PNG.
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        encode_png(&self.pixels)
    }
}

/// Render the current view.
pub fn render(
    source: Option<&SourceImage>,
    result: Option<&DetectionResult>,
    transform: &ViewTransform,
    size: ViewportSize,
    palette: &CategoryPalette,
) -> Frame {
    let Some(source) = source else {
        return Frame {
            pixels: RgbaImage::from_pixel(size.width, size.height, Rgba(viewport::BACKGROUND)),
            outcome: RenderOutcome::Empty,
        };
    };

    match source.content() {
        SourceContent::Raster(pixels) => {
            let surface = annotate(pixels, result, palette);
            Frame {
                pixels: composite(
                    &surface,
                    transform,
                    size.width,
                    size.height,
                    Rgba(viewport::BACKGROUND),
                ),
                outcome: RenderOutcome::Composited,
            }
        }
        SourceContent::Document => Frame {
            pixels: placeholder(size, &format!("Document: {}", source.filename())),
            outcome: RenderOutcome::Document,
        },
        SourceContent::Undecodable(err) => {
            log::warn!("Rendering placeholder for {}: {}", source.filename(), err);
            Frame {
                pixels: placeholder(size, "Preview unavailable"),
                outcome: RenderOutcome::Fallback(err.clone()),
            }
        }
    }
}

/// Draw detections over a copy of `pixels` at native resolution.
pub fn annotate(
    pixels: &RgbaImage,
    result: Option<&DetectionResult>,
    palette: &CategoryPalette,
) -> RgbaImage {
    let mut surface = pixels.clone();
    if let Some(result) = result {
        draw_detections(&mut surface, result, palette);
    }
    surface
}

/// Encode RGBA pixels as PNG bytes.
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buffer = Cursor::new(Vec::new());
    pixels.write_to(&mut buffer, ImageFormat::Png)?;
    Ok(buffer.into_inner())
}

fn placeholder(size: ViewportSize, caption: &str) -> RgbaImage {
    let mut pixels = RgbaImage::from_pixel(size.width, size.height, Rgba(viewport::PLACEHOLDER));
    let scale = 2;
    let x = (size.width as i32 - font::text_width(caption, scale) as i32) / 2;
    let y = (size.height as i32 - font::text_height(scale) as i32) / 2;
    font::draw_text(&mut pixels, x, y, caption, scale, Rgba([75, 85, 99, 255]));
    pixels
}
