//! Message-driven interface to the viewer.
//!
//! Hosts translate their input events into [`ViewerMessage`]s and feed them
//! to [`AnnotatedViewer::update`], one at a time.

use super::{AnnotatedViewer, DetectionOutcome};
use crate::detection::DetectionResponse;
use crate::error::ViewerError;
use crate::model::DetectionResult;
use crate::source::UploadedFile;
use crate::zoom_math::{Point, ZoomDirection};

/// Input events understood by the viewer.
#[derive(Debug, Clone)]
pub enum ViewerMessage {
    /// A file was picked or dropped
    LoadImage(UploadedFile),
    /// The image was removed
    Clear,
    /// A result was supplied directly
    SetResult(DetectionResult),
    /// Primary button pressed over the viewport
    PointerDown(Point),
    /// Pointer moved over the viewport
    PointerMove(Point),
    /// Primary button released (or pointer left the viewport)
    PointerUp,
    /// Scroll wheel turned, optionally over a cursor position
    Wheel { delta_y: f32, cursor: Option<Point> },
    /// Zoom button pressed
    Zoom(ZoomDirection),
    /// Reset button pressed
    ResetView,
    /// A detection call completed
    DetectionFinished(DetectionResponse),
}

impl AnnotatedViewer {
    /// Apply one message.
    ///
    /// Errors are the recoverable viewer errors of the triggering action;
    /// state is left as documented on the corresponding method.
    pub fn update(&mut self, message: ViewerMessage) -> Result<(), ViewerError> {
        match message {
            ViewerMessage::LoadImage(file) => {
                self.load_image(file)?;
            }
            ViewerMessage::Clear => self.clear(),
            ViewerMessage::SetResult(result) => self.set_detection_result(result),
            ViewerMessage::PointerDown(pointer) => self.begin_pan(pointer),
            ViewerMessage::PointerMove(pointer) => {
                self.continue_pan(pointer);
            }
            ViewerMessage::PointerUp => self.end_pan(),
            ViewerMessage::Wheel { delta_y, cursor } => {
                self.wheel(delta_y, cursor);
            }
            ViewerMessage::Zoom(direction) => {
                self.zoom(direction, None);
            }
            ViewerMessage::ResetView => self.reset_view(),
            ViewerMessage::DetectionFinished(response) => {
                if let DetectionOutcome::Failed(err) = self.complete_detection(response) {
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::source::tests::png_bytes;
    use crate::zoom_math::ViewTransform;

    fn load_message(name: &str) -> ViewerMessage {
        ViewerMessage::LoadImage(UploadedFile::new(
            name,
            "image/png",
            png_bytes(32, 32, [0, 0, 0, 255]),
        ))
    }

    #[test]
    fn test_drag_sequence() {
        let mut viewer = AnnotatedViewer::default();
        let messages = [
            load_message("plan.png"),
            ViewerMessage::PointerMove(Point::new(1.0, 1.0)),
            ViewerMessage::PointerDown(Point::new(10.0, 10.0)),
            ViewerMessage::PointerMove(Point::new(15.0, 30.0)),
            ViewerMessage::PointerUp,
            ViewerMessage::PointerMove(Point::new(90.0, 90.0)),
        ];
        for message in messages {
            viewer.update(message).expect("update");
        }

        assert_eq!(viewer.transform().offset, Point::new(5.0, 20.0));
    }

    #[test]
    fn test_zoom_and_reset_messages() {
        let mut viewer = AnnotatedViewer::default();
        viewer
            .update(ViewerMessage::Zoom(ZoomDirection::In))
            .expect("zoom");
        viewer
            .update(ViewerMessage::Wheel {
                delta_y: -1.0,
                cursor: Some(Point::new(10.0, 10.0)),
            })
            .expect("wheel");
        assert!(viewer.transform().scale > 1.3);

        viewer.update(ViewerMessage::ResetView).expect("reset");
        assert_eq!(viewer.transform(), ViewTransform::identity());
    }

    #[test]
    fn test_failed_detection_surfaces_error() {
        let mut viewer = AnnotatedViewer::default();
        viewer.update(load_message("plan.png")).expect("load");
        let request = viewer.begin_detection().expect("request");

        let err = viewer
            .update(ViewerMessage::DetectionFinished(DetectionResponse {
                generation: request.generation,
                result: Err(ViewerError::service("unavailable")),
                elapsed: Duration::ZERO,
            }))
            .unwrap_err();

        assert_eq!(err, ViewerError::service("unavailable"));
    }

    #[test]
    fn test_stale_response_is_silent() {
        let mut viewer = AnnotatedViewer::default();
        viewer.update(load_message("a.png")).expect("load");
        let request = viewer.begin_detection().expect("request");
        viewer.update(load_message("b.png")).expect("load");

        let result = viewer.update(ViewerMessage::DetectionFinished(DetectionResponse {
            generation: request.generation,
            result: Err(ViewerError::service("late failure")),
            elapsed: Duration::ZERO,
        }));

        assert!(result.is_ok());
        assert!(viewer.result().is_none());
    }

    #[test]
    fn test_invalid_upload_is_reported() {
        let mut viewer = AnnotatedViewer::default();
        let err = viewer
            .update(ViewerMessage::LoadImage(UploadedFile::new(
                "a.gif",
                "image/gif",
                vec![0; 8],
            )))
            .unwrap_err();
        assert!(matches!(err, ViewerError::UnsupportedFormat { .. }));
    }
}
