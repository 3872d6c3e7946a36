//! Part/symbol detection service boundary.
//!
//! The viewer never calls a service directly. It hands out a
//! [`DetectionRequest`] tagged with its current image generation, and later
//! accepts a [`DetectionResponse`] carrying the same tag. Responses for a
//! superseded generation are discarded by the viewer.

mod mock;
mod worker;

use std::sync::Arc;
use std::time::Duration;

use crate::error::ViewerError;
use crate::model::DetectionResult;

pub use mock::{MockDetectionService, mock_result};
pub use worker::{DetectionWorker, WorkerDisconnected};

/// A detection backend.
///
/// Implementations complete once per call with a full result; there are no
/// partial results.
pub trait DetectionService: Send + Sync {
    /// Identifier for logging (e.g. "mock").
    fn id(&self) -> &'static str;

    /// Run detection over raw image bytes.
    fn detect(&self, image: &[u8]) -> Result<DetectionResult, ViewerError>;
}

/// Work item for one detection call.
#[derive(Debug, Clone)]
pub struct DetectionRequest {
    /// Viewer image generation this request belongs to
    pub generation: u64,
    /// Source filename, for logging
    pub filename: String,
    /// Raw image bytes
    pub bytes: Arc<[u8]>,
}

/// Completion of one detection call.
#[derive(Debug, Clone)]
pub struct DetectionResponse {
    pub generation: u64,
    pub result: Result<DetectionResult, ViewerError>,
    /// Wall time spent in the service call
    pub elapsed: Duration,
}

impl DetectionRequest {
    /// Run the request synchronously against `service`.
    pub fn run(&self, service: &dyn DetectionService) -> DetectionResponse {
        log::debug!(
            "Running {} detection for {} (generation {}, {} bytes)",
            service.id(),
            self.filename,
            self.generation,
            self.bytes.len()
        );
        let started = web_time::Instant::now();
        let result = service.detect(&self.bytes);
        DetectionResponse {
            generation: self.generation,
            result,
            elapsed: started.elapsed(),
        }
    }
}
