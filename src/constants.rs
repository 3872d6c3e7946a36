//! Global constants for the mechcount viewer.

/// Upload validation limits and accepted media types.
pub mod upload {
    /// Maximum accepted file size in bytes (10 MiB).
    pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// MIME types accepted by default. `image/jpg` is a common browser alias.
    pub const ALLOWED_MIME_TYPES: &[&str] =
        &["image/jpeg", "image/jpg", "image/png", "application/pdf"];
}

/// Zoom constants.
pub mod zoom {
    /// Step factor for zoom buttons
    pub const STEP_FACTOR: f32 = 1.2;
    /// Wheel factor when scrolling towards the zoom-in direction
    pub const WHEEL_IN_FACTOR: f32 = 1.1;
    /// Wheel factor when scrolling towards the zoom-out direction
    pub const WHEEL_OUT_FACTOR: f32 = 0.9;
    /// Maximum zoom level
    pub const MAX: f32 = 5.0;
    /// Minimum zoom level
    pub const MIN: f32 = 0.1;
}

/// Detection overlay geometry (image pixels).
pub mod overlay {
    /// Stroke width of bounding boxes
    pub const BOX_STROKE: u32 = 3;
    /// Distance from the box top to the label top when drawn above
    pub const LABEL_OFFSET: i32 = 25;
    /// Label background height
    pub const LABEL_HEIGHT: u32 = 20;
    /// Horizontal padding added to the measured text width
    pub const LABEL_PADDING: u32 = 10;
    /// Inset used when the label is shifted inside the box
    pub const LABEL_INSET: i32 = 2;
    /// Label background color (black, 70% opacity)
    pub const LABEL_BACKGROUND: [u8; 4] = [0, 0, 0, 178];
    /// Label text color
    pub const LABEL_TEXT: [u8; 4] = [255, 255, 255, 255];
}

/// Viewport constants.
pub mod viewport {
    /// Default viewport width when none is configured
    pub const DEFAULT_WIDTH: u32 = 800;
    /// Default viewport height when none is configured
    pub const DEFAULT_HEIGHT: u32 = 600;
    /// Viewport background (gray-100)
    pub const BACKGROUND: [u8; 4] = [243, 244, 246, 255];
    /// Placeholder fill used when nothing can be drawn
    pub const PLACEHOLDER: [u8; 4] = [209, 213, 219, 255];
}

/// Mock detection service constants.
pub mod service {
    /// Artificial processing delay of the mock service (milliseconds)
    pub const MOCK_DELAY_MS: u64 = 3000;
}
