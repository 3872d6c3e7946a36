//! Host-side wiring of viewer, detection worker and project store.
//!
//! A [`Session`] uploads files into the viewer, records them as documents
//! of one project, sends detection requests to the worker and feeds the
//! responses back. The viewer decides which responses still apply.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ViewerConfig;
use crate::detection::{DetectionRequest, DetectionResponse, DetectionService, DetectionWorker};
use crate::error::ViewerError;
use crate::export::{ExportSink, FormatError, FormatRegistry};
use crate::project::{DocumentId, ProjectError, ProjectId, ProjectStore};
use crate::source::UploadedFile;
use crate::viewer::{AnnotatedViewer, DetectionOutcome};

/// Errors surfaced by a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error("Export failed: {0}")]
    Export(#[from] FormatError),

    #[error("Project store error: {0}")]
    Project(#[from] ProjectError),

    /// The worker thread could not be started
    #[error("Failed to start detection worker: {0}")]
    Worker(#[from] std::io::Error),
}

impl SessionError {
    /// Sentence suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Viewer(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// One interactive session over a project.
pub struct Session {
    viewer: AnnotatedViewer,
    worker: DetectionWorker,
    store: ProjectStore,
    project_id: ProjectId,
    /// Generation and document of the image currently in the viewer
    current: Option<(u64, DocumentId)>,
    registry: FormatRegistry,
}

impl Session {
    /// Start a session with a fresh store holding one project.
    pub fn new(
        config: &ViewerConfig,
        service: Arc<dyn DetectionService>,
        project_name: &str,
    ) -> Result<Self, SessionError> {
        let mut store = ProjectStore::new();
        let project_id = store.create_project(project_name, "");
        Self::with_store(config, service, store, project_id)
    }

    /// Start a session over an existing store and project.
    pub fn with_store(
        config: &ViewerConfig,
        service: Arc<dyn DetectionService>,
        store: ProjectStore,
        project_id: ProjectId,
    ) -> Result<Self, SessionError> {
        if store.project(project_id).is_none() {
            return Err(ProjectError::ProjectNotFound(project_id).into());
        }

        let viewer = AnnotatedViewer::new(
            config.upload_policy(),
            config.zoom_settings(),
            config.palette(),
        );

        Ok(Self {
            viewer,
            worker: DetectionWorker::spawn(service)?,
            store,
            project_id,
            current: None,
            registry: FormatRegistry::new(),
        })
    }

    pub fn viewer(&self) -> &AnnotatedViewer {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut AnnotatedViewer {
        &mut self.viewer
    }

    pub fn store(&self) -> &ProjectStore {
        &self.store
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Load a file into the viewer, record it and start detection.
    pub fn upload(&mut self, file: UploadedFile) -> Result<DocumentId, SessionError> {
        let (filename, mime_type, size) = (file.filename.clone(), file.mime_type.clone(), file.size());
        self.viewer.load_image(file)?;

        let document_id = self
            .store
            .add_document(self.project_id, filename, mime_type, size)?;
        self.current = Some((self.viewer.generation(), document_id));

        if let Some(request) = self.viewer.begin_detection() {
            self.submit(request)?;
        }
        Ok(document_id)
    }

    /// Re-run detection for the current image, e.g. after a failure.
    pub fn reprocess(&mut self) -> Result<bool, SessionError> {
        match self.viewer.begin_detection() {
            Some(request) => {
                self.submit(request)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Hand a request to the worker. If the worker is gone the viewer
    /// drops the request so the user can try again.
    fn submit(&mut self, request: DetectionRequest) -> Result<(), SessionError> {
        let generation = request.generation;
        self.worker.submit(request).map_err(|e| {
            self.viewer.abandon_detection(generation);
            SessionError::Viewer(ViewerError::service(e.to_string()))
        })
    }

    /// The worker stopped: release the current image's request and report
    /// the fault as a service error.
    fn worker_lost(&mut self, reason: String) -> ViewerError {
        self.viewer.abandon_detection(self.viewer.generation());
        ViewerError::service(reason)
    }

    /// Apply every response that has already arrived. A worker that has
    /// stopped while the current image was processing yields one
    /// `Failed` outcome.
    pub fn poll(&mut self) -> Vec<DetectionOutcome> {
        let mut outcomes = Vec::new();
        loop {
            match self.worker.take_one_result() {
                Ok(Some(response)) => outcomes.push(self.apply(response)),
                Ok(None) => break,
                Err(e) => {
                    if self.viewer.is_processing() {
                        outcomes.push(DetectionOutcome::Failed(self.worker_lost(e.to_string())));
                    }
                    break;
                }
            }
        }
        outcomes
    }

    /// Block until the current image's detection completes or `timeout`
    /// elapses. Stale responses arriving meanwhile are dropped.
    pub fn wait_for_result(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        while self.viewer.is_processing() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ViewerError::service("detection timed out").into());
            }
            let response = match self.worker.wait_result(remaining) {
                Ok(Some(response)) => response,
                Ok(None) => continue,
                Err(e) => return Err(self.worker_lost(e.to_string()).into()),
            };
            if let DetectionOutcome::Failed(err) = self.apply(response) {
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn apply(&mut self, response: DetectionResponse) -> DetectionOutcome {
        let generation = response.generation;
        let outcome = self.viewer.complete_detection(response);

        if outcome == DetectionOutcome::Applied {
            if let (Some((current_generation, document_id)), Some(result)) =
                (self.current, self.viewer.result())
            {
                if current_generation == generation {
                    if let Err(e) = self.store.record_result(document_id, result.clone()) {
                        log::error!("Failed to record result for document {}: {}", document_id, e);
                    }
                }
            }
        }
        outcome
    }

    /// Export the current result with the format `format_id`.
    pub fn export(
        &self,
        format_id: &str,
        sink: &mut dyn ExportSink,
    ) -> Result<PathBuf, SessionError> {
        let document = self.viewer.export_result()?;
        let format = self.registry.require(format_id)?;
        Ok(sink.write(&document, format)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::MockDetectionService;
    use crate::export::MemorySink;
    use crate::model::DetectionResult;
    use crate::source::tests::png_bytes;

    const WAIT: Duration = Duration::from_secs(5);

    struct CrashingService;

    impl DetectionService for CrashingService {
        fn id(&self) -> &'static str {
            "crashing"
        }

        fn detect(&self, _image: &[u8]) -> Result<DetectionResult, ViewerError> {
            panic!("detector crashed");
        }
    }

    fn session(service: MockDetectionService) -> Session {
        Session::new(&ViewerConfig::default(), Arc::new(service), "Test").expect("session")
    }

    fn crashing_session() -> Session {
        Session::new(&ViewerConfig::default(), Arc::new(CrashingService), "Test")
            .expect("session")
    }

    fn is_worker_error(err: &SessionError) -> bool {
        matches!(
            err,
            SessionError::Viewer(ViewerError::ServiceError { reason })
                if reason == "detection worker is not running"
        )
    }

    fn upload(name: &str) -> UploadedFile {
        UploadedFile::new(name, "image/png", png_bytes(16, 16, [255, 255, 255, 255]))
    }

    #[test]
    fn test_upload_process_and_record() {
        let mut session = session(MockDetectionService::with_delay(Duration::ZERO));
        let doc = session.upload(upload("plan.png")).expect("upload");

        session.wait_for_result(WAIT).expect("result");

        assert_eq!(session.viewer().result().map(|r| r.total_count()), Some(10));
        assert!(session.viewer().processing_time().is_some());
        assert_eq!(session.store().document(doc).map(|d| d.processed), Some(true));
        assert_eq!(session.store().result_for(doc).map(|r| r.total_count()), Some(10));
    }

    #[test]
    fn test_second_upload_supersedes_first() {
        let mut session = session(MockDetectionService::with_delay(Duration::from_millis(20)));
        let first = session.upload(upload("a.png")).expect("upload");
        let second = session.upload(upload("b.png")).expect("upload");

        session.wait_for_result(WAIT).expect("result");

        assert_eq!(session.viewer().source().map(|s| s.filename()), Some("b.png"));
        assert_eq!(session.store().document(first).map(|d| d.processed), Some(false));
        assert_eq!(session.store().document(second).map(|d| d.processed), Some(true));
    }

    #[test]
    fn test_service_failure_is_reported() {
        let mut session = session(MockDetectionService::failing("offline"));
        session.upload(upload("plan.png")).expect("upload");

        let err = session.wait_for_result(WAIT).unwrap_err();
        assert!(matches!(
            err,
            SessionError::Viewer(ViewerError::ServiceError { .. })
        ));
        assert_eq!(err.user_message(), "Error processing file. Please try again.");
        assert!(session.reprocess().expect("reprocess"));
    }

    #[test]
    fn test_rejected_upload_is_not_recorded() {
        let mut session = session(MockDetectionService::with_delay(Duration::ZERO));
        let err = session
            .upload(UploadedFile::new("notes.txt", "text/plain", vec![1]))
            .unwrap_err();

        assert!(matches!(
            err,
            SessionError::Viewer(ViewerError::UnsupportedFormat { .. })
        ));
        assert_eq!(session.store().documents_in(session.project_id()).count(), 0);
    }

    #[test]
    fn test_export_through_sink() {
        let mut session = session(MockDetectionService::with_delay(Duration::ZERO));
        let mut sink = MemorySink::default();

        let err = session.export("json", &mut sink).unwrap_err();
        assert!(matches!(err, SessionError::Viewer(ViewerError::NoResultAvailable)));

        session.upload(upload("plan.png")).expect("upload");
        session.wait_for_result(WAIT).expect("result");
        session.export("coco", &mut sink).expect("export");

        assert_eq!(sink.files.len(), 1);
        assert_eq!(sink.files[0].0, "plan.json");
        assert!(matches!(
            session.export("yolo", &mut sink),
            Err(SessionError::Export(FormatError::UnknownFormat { .. }))
        ));
    }

    #[test]
    fn test_crashed_worker_fails_fast() {
        let mut session = crashing_session();
        session.upload(upload("plan.png")).expect("upload");

        let started = Instant::now();
        let err = session.wait_for_result(WAIT).unwrap_err();

        assert!(is_worker_error(&err));
        assert!(started.elapsed() < WAIT);
        assert!(!session.viewer().is_processing());
    }

    #[test]
    fn test_failed_submit_leaves_viewer_retryable() {
        let mut session = crashing_session();
        session.upload(upload("a.png")).expect("upload");
        assert!(session.wait_for_result(WAIT).is_err());

        let err = session.upload(upload("b.png")).unwrap_err();
        assert!(is_worker_error(&err));
        assert!(!session.viewer().is_processing());

        // Still processable: each retry reports the fault instead of
        // silently doing nothing
        let err = session.reprocess().unwrap_err();
        assert!(is_worker_error(&err));
        assert!(!session.viewer().is_processing());
    }

    #[test]
    fn test_poll_reports_crashed_worker_once() {
        let mut session = crashing_session();
        session.upload(upload("plan.png")).expect("upload");

        let deadline = Instant::now() + WAIT;
        let mut outcomes = Vec::new();
        while outcomes.is_empty() && Instant::now() < deadline {
            outcomes = session.poll();
            std::thread::sleep(Duration::from_millis(5));
        }

        assert!(matches!(
            outcomes.as_slice(),
            [DetectionOutcome::Failed(ViewerError::ServiceError { .. })]
        ));
        assert!(session.poll().is_empty());
    }

    #[test]
    fn test_poll_without_work() {
        let mut session = session(MockDetectionService::with_delay(Duration::ZERO));
        assert!(session.poll().is_empty());
    }
}
