//! Compositing the annotated surface into the viewport.

use image::{Rgba, RgbaImage};

use super::overlay::blend;
use crate::zoom_math::{Point, ViewTransform};

/// Project `surface` into a `width` x `height` viewport through `transform`.
///
/// Each viewport pixel samples the surface at the image-space position of
/// its center (nearest neighbour). Uncovered pixels keep `background`.
pub fn composite(
    surface: &RgbaImage,
    transform: &ViewTransform,
    width: u32,
    height: u32,
    background: Rgba<u8>,
) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(width, height, background);
    let (surface_w, surface_h) = surface.dimensions();
    if surface_w == 0 || surface_h == 0 {
        return out;
    }

    for (vx, vy, pixel) in out.enumerate_pixels_mut() {
        let p = transform.screen_to_image(Point::new(vx as f32 + 0.5, vy as f32 + 0.5));
        if p.x < 0.0 || p.y < 0.0 {
            continue;
        }
        let (ix, iy) = (p.x.floor() as u32, p.y.floor() as u32);
        if ix < surface_w && iy < surface_h {
            *pixel = blend(background, *surface.get_pixel(ix, iy));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgba<u8> = Rgba([243, 244, 246, 255]);

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8 * 10, y as u8 * 10, 0, 255]))
    }

    #[test]
    fn test_identity_copies_surface() {
        let surface = gradient(6, 4);
        let out = composite(&surface, &ViewTransform::identity(), 6, 4, BG);
        assert_eq!(out, surface);
    }

    #[test]
    fn test_offset_translates() {
        let surface = gradient(6, 4);
        let t = ViewTransform::new(1.0, Point::new(2.0, 1.0));
        let out = composite(&surface, &t, 8, 6, BG);

        assert_eq!(out.get_pixel(2, 1), surface.get_pixel(0, 0));
        assert_eq!(out.get_pixel(5, 3), surface.get_pixel(3, 2));
        assert_eq!(*out.get_pixel(0, 0), BG);
        assert_eq!(*out.get_pixel(1, 5), BG);
    }

    #[test]
    fn test_scale_magnifies() {
        let surface = gradient(4, 4);
        let t = ViewTransform::new(2.0, Point::ZERO);
        let out = composite(&surface, &t, 8, 8, BG);

        assert_eq!(out.get_pixel(0, 0), surface.get_pixel(0, 0));
        assert_eq!(out.get_pixel(1, 1), surface.get_pixel(0, 0));
        assert_eq!(out.get_pixel(2, 3), surface.get_pixel(1, 1));
        assert_eq!(out.get_pixel(7, 7), surface.get_pixel(3, 3));
    }

    #[test]
    fn test_image_panned_out_of_view_shows_background() {
        let surface = gradient(4, 4);
        let t = ViewTransform::new(1.0, Point::new(-100.0, 0.0));
        let out = composite(&surface, &t, 4, 4, BG);
        assert!(out.pixels().all(|p| *p == BG));
    }

    #[test]
    fn test_empty_surface_and_viewport() {
        let empty = RgbaImage::new(0, 0);
        let out = composite(&empty, &ViewTransform::identity(), 3, 3, BG);
        assert!(out.pixels().all(|p| *p == BG));

        let zero = composite(&gradient(2, 2), &ViewTransform::identity(), 0, 0, BG);
        assert_eq!(zero.dimensions(), (0, 0));
    }
}
