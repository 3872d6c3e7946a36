//! Background thread for detection calls.
//!
//! Requests are sent over a channel to a dedicated thread which runs the
//! service and sends responses back. Results are collected by polling, so
//! the caller's control flow stays single-threaded.

use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{DetectionRequest, DetectionResponse, DetectionService};

/// The worker thread has stopped, e.g. because the service panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("detection worker is not running")]
pub struct WorkerDisconnected;

/// Message sent to the worker thread.
enum WorkerMessage {
    Detect(DetectionRequest),
    Shutdown,
}

/// Owns the detection thread and its channels.
pub struct DetectionWorker {
    request_tx: Sender<WorkerMessage>,
    result_rx: Receiver<DetectionResponse>,
    thread_handle: Option<JoinHandle<()>>,
    /// Generations with a request in flight
    pending: HashSet<u64>,
    /// Set once the result channel reports the thread gone
    disconnected: bool,
}

impl DetectionWorker {
    /// Spawn the worker thread around `service`.
    pub fn spawn(service: Arc<dyn DetectionService>) -> io::Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<WorkerMessage>();
        let (result_tx, result_rx) = mpsc::channel::<DetectionResponse>();

        let thread_handle = thread::Builder::new()
            .name("detection-worker".to_string())
            .spawn(move || {
                log::info!("Detection worker started ({})", service.id());
                Self::thread_loop(service.as_ref(), request_rx, result_tx);
                log::info!("Detection worker exiting");
            })?;

        Ok(Self {
            request_tx,
            result_rx,
            thread_handle: Some(thread_handle),
            pending: HashSet::new(),
            disconnected: false,
        })
    }

    fn thread_loop(
        service: &dyn DetectionService,
        request_rx: Receiver<WorkerMessage>,
        result_tx: Sender<DetectionResponse>,
    ) {
        loop {
            match request_rx.recv() {
                Ok(WorkerMessage::Detect(request)) => {
                    let response = request.run(service);
                    if result_tx.send(response).is_err() {
                        log::warn!("Result channel closed, detection worker exiting");
                        break;
                    }
                }
                Ok(WorkerMessage::Shutdown) => {
                    log::debug!("Received shutdown signal");
                    break;
                }
                Err(_) => {
                    log::debug!("Request channel closed, detection worker exiting");
                    break;
                }
            }
        }
    }

    /// Queue a request.
    pub fn submit(&mut self, request: DetectionRequest) -> Result<(), WorkerDisconnected> {
        if self.disconnected {
            return Err(WorkerDisconnected);
        }
        let generation = request.generation;
        if self.request_tx.send(WorkerMessage::Detect(request)).is_err() {
            log::error!("Failed to send detection request: channel closed");
            self.mark_disconnected();
            return Err(WorkerDisconnected);
        }
        self.pending.insert(generation);
        log::debug!("Sent detection request for generation {}", generation);
        Ok(())
    }

    /// Take one completed response without blocking.
    pub fn take_one_result(&mut self) -> Result<Option<DetectionResponse>, WorkerDisconnected> {
        match self.result_rx.try_recv() {
            Ok(response) => Ok(Some(self.received(response))),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                self.mark_disconnected();
                Err(WorkerDisconnected)
            }
        }
    }

    /// Wait up to `timeout` for one completed response. `Ok(None)` means
    /// the timeout elapsed.
    pub fn wait_result(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<DetectionResponse>, WorkerDisconnected> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(response) => Ok(Some(self.received(response))),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                self.mark_disconnected();
                Err(WorkerDisconnected)
            }
        }
    }

    fn received(&mut self, response: DetectionResponse) -> DetectionResponse {
        self.pending.remove(&response.generation);
        response
    }

    fn mark_disconnected(&mut self) {
        if !self.disconnected {
            log::error!(
                "Detection worker disconnected with {} request(s) in flight",
                self.pending.len()
            );
        }
        self.disconnected = true;
        self.pending.clear();
    }

    /// Whether the worker thread is known to have stopped.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    /// Number of requests still in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, generation: u64) -> bool {
        self.pending.contains(&generation)
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        log::debug!("Shutting down detection worker");

        let _ = self.request_tx.send(WorkerMessage::Shutdown);

        if let Some(handle) = self.thread_handle.take() {
            if let Err(e) = handle.join() {
                log::warn!("Detection worker panicked: {:?}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::MockDetectionService;
    use crate::error::ViewerError;
    use crate::model::DetectionResult;

    struct CrashingService;

    impl DetectionService for CrashingService {
        fn id(&self) -> &'static str {
            "crashing"
        }

        fn detect(&self, _image: &[u8]) -> Result<DetectionResult, ViewerError> {
            panic!("detector crashed");
        }
    }

    const WAIT: Duration = Duration::from_secs(5);

    fn request(generation: u64) -> DetectionRequest {
        DetectionRequest {
            generation,
            filename: "plan.png".to_string(),
            bytes: Arc::from(vec![0u8; 16]),
        }
    }

    #[test]
    fn test_worker_returns_tagged_response() {
        let service = Arc::new(MockDetectionService::with_delay(Duration::ZERO));
        let mut worker = DetectionWorker::spawn(service).expect("spawn worker");

        assert_eq!(worker.submit(request(7)), Ok(()));
        assert!(worker.is_pending(7));

        let response = worker.wait_result(WAIT).expect("worker").expect("response");
        assert_eq!(response.generation, 7);
        assert_eq!(response.result.map(|r| r.total_count()), Ok(10));
        assert_eq!(worker.pending_count(), 0);
    }

    #[test]
    fn test_worker_preserves_request_order() {
        let service = Arc::new(MockDetectionService::with_delay(Duration::ZERO));
        let mut worker = DetectionWorker::spawn(service).expect("spawn worker");

        worker.submit(request(1)).expect("submit");
        worker.submit(request(2)).expect("submit");

        let first = worker.wait_result(WAIT).expect("worker").expect("first");
        let second = worker.wait_result(WAIT).expect("worker").expect("second");
        assert_eq!((first.generation, second.generation), (1, 2));
    }

    #[test]
    fn test_worker_forwards_service_errors() {
        let service = Arc::new(MockDetectionService::failing("timeout"));
        let mut worker = DetectionWorker::spawn(service).expect("spawn worker");

        worker.submit(request(3)).expect("submit");
        let response = worker.wait_result(WAIT).expect("worker").expect("response");
        assert_eq!(response.result.unwrap_err(), ViewerError::service("timeout"));
    }

    #[test]
    fn test_take_one_result_when_idle() {
        let service = Arc::new(MockDetectionService::with_delay(Duration::ZERO));
        let mut worker = DetectionWorker::spawn(service).expect("spawn worker");
        assert_eq!(worker.take_one_result().map(|r| r.is_none()), Ok(true));
    }

    #[test]
    fn test_response_carries_service_time() {
        let delay = Duration::from_millis(20);
        let service = Arc::new(MockDetectionService::with_delay(delay));
        let mut worker = DetectionWorker::spawn(service).expect("spawn worker");

        worker.submit(request(9)).expect("submit");
        let response = worker.wait_result(WAIT).expect("worker").expect("response");
        assert!(response.elapsed >= delay);
    }

    #[test]
    fn test_crashed_worker_reports_disconnect() {
        let mut worker = DetectionWorker::spawn(Arc::new(CrashingService)).expect("spawn worker");

        worker.submit(request(4)).expect("submit");
        let err = worker.wait_result(WAIT).unwrap_err();

        assert_eq!(err, WorkerDisconnected);
        assert!(worker.is_disconnected());
        assert_eq!(worker.pending_count(), 0);
        assert_eq!(worker.submit(request(5)), Err(WorkerDisconnected));
        assert_eq!(worker.take_one_result().unwrap_err(), WorkerDisconnected);
    }
}
