//! The annotated image viewer.
//!
//! [`AnnotatedViewer`] owns the source image, the optional detection result
//! and the view transform. Every state change goes through one of its
//! methods (or [`AnnotatedViewer::update`] with a [`ViewerMessage`]), and
//! rendering is delegated to the pure [`render::render`].
//!
//! Detection runs outside the viewer. The viewer hands out requests tagged
//! with an image generation that increases on every load and clear, and
//! drops responses that arrive for an older generation.

mod message;

use std::time::Duration;

use crate::detection::{DetectionRequest, DetectionResponse};
use crate::error::ViewerError;
use crate::export::ExportDocument;
use crate::interaction::PanState;
use crate::model::{CategoryPalette, DetectionResult};
use crate::render::{self, Frame, ViewportSize};
use crate::source::{SourceImage, UploadPolicy, UploadedFile};
use crate::zoom_math::{Point, ViewTransform, ZoomDirection, ZoomSettings};

pub use message::ViewerMessage;

/// What happened to a detection response.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionOutcome {
    /// The result became the current result
    Applied,
    /// The response belonged to a superseded image
    Discarded,
    /// The service failed for the current image
    Failed(ViewerError),
}

/// Viewer state for one upload session at a time.
#[derive(Debug, Clone)]
pub struct AnnotatedViewer {
    policy: UploadPolicy,
    zoom: ZoomSettings,
    palette: CategoryPalette,
    source: Option<SourceImage>,
    result: Option<DetectionResult>,
    transform: ViewTransform,
    pan: PanState,
    generation: u64,
    /// Generation with a detection request outstanding
    pending: Option<u64>,
    /// Service time of the detection that produced `result`
    processing_time: Option<Duration>,
}

impl AnnotatedViewer {
    pub fn new(policy: UploadPolicy, zoom: ZoomSettings, palette: CategoryPalette) -> Self {
        Self {
            policy,
            zoom,
            palette,
            source: None,
            result: None,
            transform: ViewTransform::identity(),
            pan: PanState::Idle,
            generation: 0,
            pending: None,
            processing_time: None,
        }
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        self.result.as_ref()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    pub fn pan_state(&self) -> PanState {
        self.pan
    }

    /// Current image generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How long the service took to produce the current result, when it
    /// came from a detection run.
    pub fn processing_time(&self) -> Option<Duration> {
        self.processing_time
    }

    /// Whether a detection request for the current image is outstanding.
    pub fn is_processing(&self) -> bool {
        self.pending == Some(self.generation)
    }

    pub fn palette(&self) -> &CategoryPalette {
        &self.palette
    }

    pub fn zoom_settings(&self) -> &ZoomSettings {
        &self.zoom
    }

    /// Validate, decode and take ownership of an uploaded file.
    ///
    /// On success the previous image and result are dropped, the transform
    /// is reset and the generation advances so late responses for the old
    /// image are ignored. On failure nothing changes.
    pub fn load_image(&mut self, file: UploadedFile) -> Result<&SourceImage, ViewerError> {
        let source = SourceImage::load(file, &self.policy)?;

        self.generation += 1;
        self.result = None;
        self.transform = ViewTransform::identity();
        self.pan = PanState::Idle;
        self.pending = None;
        self.processing_time = None;

        log::info!(
            "Loaded {} ({}, {} bytes, generation {})",
            source.filename(),
            source.mime_type(),
            source.bytes().len(),
            self.generation
        );

        Ok(self.source.insert(source))
    }

    /// Release the image and result.
    ///
    /// An active drag is dropped without a final offset update.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.source = None;
        self.result = None;
        self.pan = PanState::Idle;
        self.pending = None;
        self.processing_time = None;
        log::debug!("Viewer cleared (generation {})", self.generation);
    }

    /// Replace the current result wholesale.
    pub fn set_detection_result(&mut self, result: DetectionResult) {
        log::debug!(
            "Detection result set: {} detections in {} categories",
            result.total_count(),
            result.counts_by_category().len()
        );
        self.result = Some(result);
        self.processing_time = None;
    }

    /// Render the current state into a viewport of `size`.
    pub fn render(&self, size: ViewportSize) -> Frame {
        render::render(
            self.source.as_ref(),
            self.result.as_ref(),
            &self.transform,
            size,
            &self.palette,
        )
    }

    /// Start a pan drag at `pointer`. Ignored while already panning.
    pub fn begin_pan(&mut self, pointer: Point) {
        if self.pan.is_panning() {
            log::trace!("begin_pan ignored: already panning");
            return;
        }
        self.pan = self.pan.begin(pointer, self.transform.offset);
        log::debug!("Pan started at ({:.1}, {:.1})", pointer.x, pointer.y);
    }

    /// Move the drag to `pointer`. Returns whether the offset changed.
    pub fn continue_pan(&mut self, pointer: Point) -> bool {
        match self.pan.offset_for(pointer) {
            Some(offset) => {
                self.transform = self.transform.with_offset(offset);
                true
            }
            None => false,
        }
    }

    pub fn end_pan(&mut self) {
        if self.pan.is_panning() {
            log::debug!(
                "Pan ended at offset ({:.1}, {:.1})",
                self.transform.offset.x,
                self.transform.offset.y
            );
        }
        self.pan = self.pan.end();
    }

    /// Discrete step zoom. Returns the new scale.
    pub fn zoom(&mut self, direction: ZoomDirection, focal: Option<Point>) -> f32 {
        self.transform = self.transform.zoom_step(direction, focal, &self.zoom);
        log::debug!("Zoom {:?}: {:.2}x", direction, self.transform.scale);
        self.transform.scale
    }

    /// Wheel zoom; a zero delta leaves the transform unchanged. Returns the
    /// new scale.
    pub fn wheel(&mut self, delta_y: f32, focal: Option<Point>) -> f32 {
        if let Some(direction) = ZoomDirection::from_wheel_delta(delta_y) {
            self.transform = self.transform.zoom_wheel(direction, focal, &self.zoom);
            log::trace!("Wheel zoom {:?}: {:.2}x", direction, self.transform.scale);
        }
        self.transform.scale
    }

    pub fn reset_view(&mut self) {
        self.transform = ViewTransform::identity();
        log::debug!("View reset");
    }

    /// Snapshot the current result for export.
    pub fn export_result(&self) -> Result<ExportDocument, ViewerError> {
        let result = self.result.as_ref().ok_or(ViewerError::NoResultAvailable)?;
        let filename = self.source.as_ref().map_or("untitled", |s| s.filename());
        let (width, height) = self.source.as_ref().map_or((0, 0), |s| s.dimensions());

        Ok(ExportDocument::from_result(filename, result).with_image_size(width, height))
    }

    /// Request detection for the current image.
    ///
    /// Returns `None` when nothing is loaded or a request for this image is
    /// already outstanding.
    pub fn begin_detection(&mut self) -> Option<DetectionRequest> {
        let source = self.source.as_ref()?;
        if self.is_processing() {
            log::debug!("Detection already running for generation {}", self.generation);
            return None;
        }

        self.pending = Some(self.generation);
        log::info!(
            "Detection started for {} (generation {})",
            source.filename(),
            self.generation
        );
        Some(DetectionRequest {
            generation: self.generation,
            filename: source.filename().to_string(),
            bytes: source.bytes(),
        })
    }

    /// Give up on the outstanding request for `generation`, e.g. because it
    /// could not be delivered. The image can be processed again afterwards.
    pub fn abandon_detection(&mut self, generation: u64) {
        if self.pending == Some(generation) {
            log::warn!("Abandoning detection for generation {}", generation);
            self.pending = None;
        }
    }

    /// Accept a detection response.
    ///
    /// Responses tagged with an older generation are dropped without
    /// touching state.
    pub fn complete_detection(&mut self, response: DetectionResponse) -> DetectionOutcome {
        if response.generation != self.generation {
            log::warn!(
                "Discarding stale detection response (generation {}, current {})",
                response.generation,
                self.generation
            );
            return DetectionOutcome::Discarded;
        }

        self.pending = None;
        match response.result {
            Ok(result) => {
                log::info!(
                    "Detection finished: {} detections in {:?} (generation {})",
                    result.total_count(),
                    response.elapsed,
                    response.generation
                );
                self.set_detection_result(result);
                self.processing_time = Some(response.elapsed);
                DetectionOutcome::Applied
            }
            Err(err) => {
                log::warn!("Detection failed: {}", err);
                DetectionOutcome::Failed(err)
            }
        }
    }
}

impl Default for AnnotatedViewer {
    fn default() -> Self {
        Self::new(
            UploadPolicy::default(),
            ZoomSettings::default(),
            CategoryPalette::new(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;
    use crate::source::tests::png_bytes;

    const EPSILON: f32 = 0.0001;

    fn plan(name: &str) -> UploadedFile {
        UploadedFile::new(name, "image/png", png_bytes(64, 48, [255, 255, 255, 255]))
    }

    fn two_detections() -> DetectionResult {
        DetectionResult::from_entries([
            ("Valve", 0.95, BoundingBox::new(150.0, 200.0, 40.0, 40.0)),
            ("Pump", 0.88, BoundingBox::new(300.0, 150.0, 60.0, 50.0)),
        ])
        .expect("valid result")
    }

    fn loaded() -> AnnotatedViewer {
        let mut viewer = AnnotatedViewer::default();
        viewer.load_image(plan("plan.png")).expect("load");
        viewer
    }

    #[test]
    fn test_load_resets_transform_and_result() {
        let mut viewer = loaded();
        viewer.set_detection_result(two_detections());
        viewer.zoom(ZoomDirection::In, None);
        viewer.begin_pan(Point::new(0.0, 0.0));
        viewer.continue_pan(Point::new(20.0, 10.0));

        let generation = viewer.generation();
        viewer.load_image(plan("second.png")).expect("load");

        assert_eq!(viewer.transform(), ViewTransform::identity());
        assert!(viewer.result().is_none());
        assert_eq!(viewer.pan_state(), PanState::Idle);
        assert_eq!(viewer.generation(), generation + 1);
        assert_eq!(viewer.source().map(|s| s.filename()), Some("second.png"));
    }

    #[test]
    fn test_oversized_file_leaves_state_untouched() {
        let mut viewer = loaded();
        viewer.set_detection_result(two_detections());
        viewer.zoom(ZoomDirection::In, None);
        let transform = viewer.transform();
        let generation = viewer.generation();

        let big = plan("big.png").with_declared_size(11 * 1024 * 1024);
        let err = viewer.load_image(big).unwrap_err();

        assert!(matches!(err, ViewerError::FileTooLarge { .. }));
        assert_eq!(viewer.result(), Some(&two_detections()));
        assert_eq!(viewer.transform(), transform);
        assert_eq!(viewer.generation(), generation);
        assert_eq!(viewer.source().map(|s| s.filename()), Some("plan.png"));
    }

    #[test]
    fn test_text_file_is_unsupported() {
        let mut viewer = AnnotatedViewer::default();
        let err = viewer
            .load_image(UploadedFile::new("notes.txt", "text/plain", b"hi".to_vec()))
            .unwrap_err();

        assert!(matches!(err, ViewerError::UnsupportedFormat { .. }));
        assert!(viewer.source().is_none());
    }

    #[test]
    fn test_pan_offset_is_delta_from_drag_start() {
        let mut viewer = loaded();
        viewer.begin_pan(Point::new(5.0, 5.0));
        viewer.continue_pan(Point::new(30.0, 30.0));
        viewer.end_pan();
        let start = viewer.transform().offset;

        let p0 = Point::new(100.0, 100.0);
        let p1 = Point::new(250.0, -40.0);
        let p2 = Point::new(130.0, 85.0);
        viewer.begin_pan(p0);
        viewer.continue_pan(p1);
        viewer.continue_pan(p2);
        viewer.end_pan();

        assert_eq!(viewer.transform().offset, start + (p2 - p0));
        assert_eq!(viewer.pan_state(), PanState::Idle);
    }

    #[test]
    fn test_second_begin_pan_keeps_anchor() {
        let mut viewer = loaded();
        viewer.begin_pan(Point::new(0.0, 0.0));
        viewer.begin_pan(Point::new(50.0, 50.0));
        viewer.continue_pan(Point::new(10.0, 0.0));

        assert_eq!(viewer.transform().offset, Point::new(10.0, 0.0));
    }

    #[test]
    fn test_move_while_idle_is_noop() {
        let mut viewer = loaded();
        assert!(!viewer.continue_pan(Point::new(40.0, 40.0)));
        assert_eq!(viewer.transform(), ViewTransform::identity());
    }

    #[test]
    fn test_clear_while_panning_returns_to_idle() {
        let mut viewer = loaded();
        viewer.begin_pan(Point::new(0.0, 0.0));
        viewer.continue_pan(Point::new(12.0, 7.0));
        let transform = viewer.transform();

        viewer.clear();

        assert_eq!(viewer.pan_state(), PanState::Idle);
        assert!(viewer.source().is_none());
        assert_eq!(viewer.transform(), transform);
        assert!(!viewer.continue_pan(Point::new(99.0, 99.0)));
    }

    #[test]
    fn test_reset_view_yields_identity() {
        let mut viewer = loaded();
        for _ in 0..7 {
            viewer.zoom(ZoomDirection::In, Some(Point::new(30.0, 20.0)));
        }
        viewer.wheel(-120.0, Some(Point::new(3.0, 4.0)));
        viewer.begin_pan(Point::ZERO);
        viewer.continue_pan(Point::new(-80.0, 15.0));
        viewer.end_pan();

        viewer.reset_view();

        assert_eq!(viewer.transform().scale, 1.0);
        assert_eq!(viewer.transform().offset, Point::ZERO);
    }

    #[test]
    fn test_zoom_stays_clamped() {
        let mut viewer = AnnotatedViewer::default();
        for _ in 0..50 {
            let scale = viewer.zoom(ZoomDirection::In, None);
            assert!(scale <= 5.0);
        }
        assert_eq!(viewer.transform().scale, 5.0);
        for _ in 0..100 {
            let scale = viewer.wheel(1.0, None);
            assert!(scale >= 0.1);
        }
        assert_eq!(viewer.transform().scale, 0.1);
    }

    #[test]
    fn test_wheel_direction_and_zero_delta() {
        let mut viewer = AnnotatedViewer::default();
        assert!((viewer.wheel(-3.0, None) - 1.1).abs() < EPSILON);
        viewer.reset_view();
        assert!((viewer.wheel(3.0, None) - 0.9).abs() < EPSILON);
        assert!((viewer.wheel(0.0, None) - 0.9).abs() < EPSILON);
    }

    #[test]
    fn test_export_without_result_fails() {
        let viewer = loaded();
        assert_eq!(viewer.export_result(), Err(ViewerError::NoResultAvailable));
    }

    #[test]
    fn test_export_counts() {
        let mut viewer = loaded();
        viewer.set_detection_result(two_detections());

        let doc = viewer.export_result().expect("export");

        assert_eq!(doc.filename, "plan.png");
        assert_eq!(doc.total_count, 2);
        assert_eq!(doc.counts_by_category.get("Valve"), 1);
        assert_eq!(doc.counts_by_category.get("Pump"), 1);
        assert_eq!(
            doc.image_size.map(|s| (s.width, s.height)),
            Some((64, 48))
        );
    }

    #[test]
    fn test_stale_detection_response_is_discarded() {
        let mut viewer = loaded();
        let first = viewer.begin_detection().expect("request");

        viewer.load_image(plan("second.png")).expect("load");
        let second = viewer.begin_detection().expect("request");
        assert_ne!(first.generation, second.generation);

        let late = DetectionResponse {
            generation: first.generation,
            result: Ok(two_detections()),
            elapsed: Duration::ZERO,
        };
        assert_eq!(viewer.complete_detection(late), DetectionOutcome::Discarded);
        assert!(viewer.result().is_none());
        assert!(viewer.is_processing());

        let own = DetectionResult::from_entries([(
            "Filter",
            0.9,
            BoundingBox::new(1.0, 1.0, 5.0, 5.0),
        )])
        .expect("valid result");
        let response = DetectionResponse {
            generation: second.generation,
            result: Ok(own.clone()),
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(viewer.complete_detection(response), DetectionOutcome::Applied);
        assert_eq!(viewer.result(), Some(&own));
        assert_eq!(viewer.processing_time(), Some(Duration::from_millis(1500)));
        assert!(!viewer.is_processing());
    }

    #[test]
    fn test_detection_is_single_flight() {
        let mut viewer = loaded();
        assert!(viewer.begin_detection().is_some());
        assert!(viewer.begin_detection().is_none());
    }

    #[test]
    fn test_detection_requires_source() {
        let mut viewer = AnnotatedViewer::default();
        assert!(viewer.begin_detection().is_none());
    }

    #[test]
    fn test_failed_detection_allows_retry() {
        let mut viewer = loaded();
        let request = viewer.begin_detection().expect("request");

        let outcome = viewer.complete_detection(DetectionResponse {
            generation: request.generation,
            result: Err(ViewerError::service("timeout")),
            elapsed: Duration::ZERO,
        });

        assert_eq!(outcome, DetectionOutcome::Failed(ViewerError::service("timeout")));
        assert!(viewer.result().is_none());
        assert!(viewer.begin_detection().is_some());
    }

    #[test]
    fn test_abandoned_detection_can_be_restarted() {
        let mut viewer = loaded();
        let request = viewer.begin_detection().expect("request");

        viewer.abandon_detection(request.generation - 1);
        assert!(viewer.is_processing());

        viewer.abandon_detection(request.generation);
        assert!(!viewer.is_processing());
        assert!(viewer.begin_detection().is_some());
    }

    #[test]
    fn test_processing_time_resets_on_load() {
        let mut viewer = loaded();
        let request = viewer.begin_detection().expect("request");
        viewer.complete_detection(DetectionResponse {
            generation: request.generation,
            result: Ok(two_detections()),
            elapsed: Duration::from_millis(20),
        });
        assert_eq!(viewer.processing_time(), Some(Duration::from_millis(20)));

        viewer.load_image(plan("next.png")).expect("load");
        assert_eq!(viewer.processing_time(), None);
    }

    #[test]
    fn test_render_uses_current_state() {
        let mut viewer = loaded();
        let size = ViewportSize::new(64, 48);
        let plain = viewer.render(size);

        viewer.set_detection_result(
            DetectionResult::from_entries([(
                "Valve",
                0.95,
                BoundingBox::new(10.0, 30.0, 20.0, 10.0),
            )])
            .expect("valid result"),
        );
        let annotated = viewer.render(size);

        assert_ne!(plain.pixels, annotated.pixels);
        assert_eq!(annotated.pixels, viewer.render(size).pixels);
    }
}
