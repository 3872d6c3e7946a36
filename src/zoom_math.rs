//! Pan/zoom view transform mathematics.
//!
//! The viewport shows the image translated by `offset` and scaled by `scale`,
//! with the transform origin at the top-left corner:
//! `screen = image * scale + offset`.
//!
//! All operations are pure and return a new transform, which keeps the
//! viewer's state transitions easy to test.

use std::ops::{Add, Sub};

use crate::constants::zoom;

/// A 2D point or vector in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Direction of a discrete zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Direction for a wheel event. Positive `delta_y` (scrolling down)
    /// zooms out; a zero delta has no direction.
    pub fn from_wheel_delta(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(ZoomDirection::Out)
        } else if delta_y < 0.0 {
            Some(ZoomDirection::In)
        } else {
            None
        }
    }
}

/// Zoom limits and factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomSettings {
    pub min: f32,
    pub max: f32,
    /// Factor for zoom buttons (multiply to zoom in, divide to zoom out)
    pub step_factor: f32,
    /// Wheel factor towards zoom-in
    pub wheel_in_factor: f32,
    /// Wheel factor towards zoom-out
    pub wheel_out_factor: f32,
}

impl ZoomSettings {
    /// Build settings, rejecting a range or factor the transform cannot
    /// work with.
    pub fn new(
        min: f32,
        max: f32,
        step_factor: f32,
        wheel_in_factor: f32,
        wheel_out_factor: f32,
    ) -> Result<Self, InvalidZoomSettings> {
        let settings = Self {
            min,
            max,
            step_factor,
            wheel_in_factor,
            wheel_out_factor,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Check that `[min, max]` is a finite positive interval, both zoom-in
    /// factors are finite and above 1, and the wheel zoom-out factor lies
    /// in `(0, 1)`.
    pub fn validate(&self) -> Result<(), InvalidZoomSettings> {
        if !(self.min.is_finite() && self.max.is_finite() && self.min > 0.0 && self.min <= self.max)
        {
            return Err(InvalidZoomSettings(format!(
                "zoom range [{}, {}] is not a positive interval",
                self.min, self.max
            )));
        }
        let zoom_in = [self.step_factor, self.wheel_in_factor];
        if !zoom_in.iter().all(|f| f.is_finite() && *f > 1.0) {
            return Err(InvalidZoomSettings(
                "zoom-in factors must be finite and greater than 1".to_string(),
            ));
        }
        if !(self.wheel_out_factor > 0.0 && self.wheel_out_factor < 1.0) {
            return Err(InvalidZoomSettings(
                "wheel zoom-out factor must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a scale into `[min, max]`. Non-finite input falls back to 1.0
    /// (clamped) so the transform stays invertible. A range that is not a
    /// positive interval is replaced by the built-in limits.
    pub fn clamp(&self, scale: f32) -> f32 {
        let (min, max) = if self.min.is_finite()
            && self.max.is_finite()
            && self.min > 0.0
            && self.min <= self.max
        {
            (self.min, self.max)
        } else {
            (zoom::MIN, zoom::MAX)
        };
        let scale = if scale.is_finite() { scale } else { 1.0 };
        scale.clamp(min, max)
    }
}

/// Zoom settings rejected by [`ZoomSettings::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct InvalidZoomSettings(String);

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            min: zoom::MIN,
            max: zoom::MAX,
            step_factor: zoom::STEP_FACTOR,
            wheel_in_factor: zoom::WHEEL_IN_FACTOR,
            wheel_out_factor: zoom::WHEEL_OUT_FACTOR,
        }
    }
}

/// Current zoom scale and pan offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub scale: f32,
    pub offset: Point,
}

impl ViewTransform {
    pub fn new(scale: f32, offset: Point) -> Self {
        Self { scale, offset }
    }

    /// Identity transform (scale=1, no pan).
    pub fn identity() -> Self {
        Self::new(1.0, Point::ZERO)
    }

    /// Zoom level as a rounded percentage, e.g. 120 for 1.2x.
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    /// Map an image-space point to viewport space.
    pub fn image_to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    /// Map a viewport-space point back to image space.
    pub fn screen_to_image(&self, p: Point) -> Point {
        Point::new(
            (p.x - self.offset.x) / self.scale,
            (p.y - self.offset.y) / self.scale,
        )
    }

    /// Replace the offset, keeping the scale.
    pub fn with_offset(&self, offset: Point) -> ViewTransform {
        ViewTransform::new(self.scale, offset)
    }

    /// Set a new scale (clamped).
    ///
    /// With a focal point, the image point under it stays fixed on screen;
    /// without one the offset is unchanged.
    pub fn zoom_to(
        &self,
        new_scale: f32,
        focal: Option<Point>,
        settings: &ZoomSettings,
    ) -> ViewTransform {
        let new_scale = settings.clamp(new_scale);
        match focal {
            Some(focal) => {
                let anchor = self.screen_to_image(focal);
                let offset = Point::new(
                    focal.x - anchor.x * new_scale,
                    focal.y - anchor.y * new_scale,
                );
                ViewTransform::new(new_scale, offset)
            }
            None => ViewTransform::new(new_scale, self.offset),
        }
    }

    /// Discrete step zoom (buttons): multiply or divide by the step factor.
    pub fn zoom_step(
        &self,
        direction: ZoomDirection,
        focal: Option<Point>,
        settings: &ZoomSettings,
    ) -> ViewTransform {
        let factor = settings.step_factor;
        if !(factor.is_finite() && factor > 0.0) {
            return *self;
        }
        let new_scale = match direction {
            ZoomDirection::In => self.scale * factor,
            ZoomDirection::Out => self.scale / factor,
        };
        self.zoom_to(new_scale, focal, settings)
    }

    /// Continuous zoom (wheel): multiply by the in or out wheel factor.
    pub fn zoom_wheel(
        &self,
        direction: ZoomDirection,
        focal: Option<Point>,
        settings: &ZoomSettings,
    ) -> ViewTransform {
        let factor = match direction {
            ZoomDirection::In => settings.wheel_in_factor,
            ZoomDirection::Out => settings.wheel_out_factor,
        };
        if !(factor.is_finite() && factor > 0.0) {
            return *self;
        }
        self.zoom_to(self.scale * factor, focal, settings)
    }
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::identity()
    }
}
