//! Mock detection service with a fixed result set.

use std::thread;
use std::time::Duration;

use super::DetectionService;
use crate::constants::service;
use crate::error::ViewerError;
use crate::model::{BoundingBox, DetectionResult};

/// Returns the same demonstration result for every image after an
/// artificial delay.
#[derive(Debug, Clone)]
pub struct MockDetectionService {
    delay: Duration,
    failure: Option<String>,
}

impl MockDetectionService {
    /// Mock with the default processing delay.
    pub fn new() -> Self {
        Self::with_delay(Duration::from_millis(service::MOCK_DELAY_MS))
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
        }
    }

    /// Mock that fails every call with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            failure: Some(reason.into()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for MockDetectionService {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionService for MockDetectionService {
    fn id(&self) -> &'static str {
        "mock"
    }

    fn detect(&self, _image: &[u8]) -> Result<DetectionResult, ViewerError> {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some(reason) = &self.failure {
            return Err(ViewerError::service(reason.clone()));
        }
        mock_result()
    }
}

/// The fixed demonstration result: ten symbols on a piping drawing.
pub fn mock_result() -> Result<DetectionResult, ViewerError> {
    DetectionResult::from_entries([
        ("Valve", 0.95, BoundingBox::new(150.0, 200.0, 40.0, 40.0)),
        ("Pump", 0.88, BoundingBox::new(300.0, 150.0, 60.0, 50.0)),
        ("Filter", 0.92, BoundingBox::new(450.0, 180.0, 45.0, 35.0)),
        ("Valve", 0.89, BoundingBox::new(200.0, 350.0, 40.0, 40.0)),
        ("Pipe Joint", 0.94, BoundingBox::new(100.0, 100.0, 25.0, 25.0)),
        ("Pressure Gauge", 0.91, BoundingBox::new(500.0, 250.0, 35.0, 35.0)),
        ("Valve", 0.87, BoundingBox::new(600.0, 300.0, 40.0, 40.0)),
        ("Filter", 0.93, BoundingBox::new(750.0, 180.0, 45.0, 35.0)),
        ("Pump", 0.91, BoundingBox::new(400.0, 450.0, 60.0, 50.0)),
        ("Pipe Joint", 0.89, BoundingBox::new(850.0, 100.0, 25.0, 25.0)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_result_counts() {
        let result = mock_result().expect("mock result is valid");
        let counts = result.counts_by_category();

        assert_eq!(result.total_count(), 10);
        assert_eq!(counts.get("Valve"), 3);
        assert_eq!(counts.get("Pump"), 2);
        assert_eq!(counts.get("Filter"), 2);
        assert_eq!(counts.get("Pipe Joint"), 2);
        assert_eq!(counts.get("Pressure Gauge"), 1);
        assert_eq!(counts.total(), 10);
    }

    #[test]
    fn test_mock_ids_are_sequential() {
        let result = mock_result().expect("mock result is valid");
        let ids: Vec<u32> = result.detections().iter().map(|d| d.id).collect();
        assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn test_failing_mock() {
        let service = MockDetectionService::failing("service unavailable");
        let err = service.detect(&[]).unwrap_err();
        assert_eq!(err, ViewerError::service("service unavailable"));
    }

    #[test]
    fn test_zero_delay_mock_returns_result() {
        let service = MockDetectionService::with_delay(Duration::ZERO);
        assert_eq!(service.detect(&[1, 2, 3]).map(|r| r.total_count()), Ok(10));
    }
}
