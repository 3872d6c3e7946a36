//! Projects, their uploaded documents and processing results.
//!
//! A [`ProjectStore`] is an explicit object owned by the host and passed to
//! whatever needs it. It can be saved to and loaded from a JSON file.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "projects": [{ "id": 1, "name": "Engine Block Analysis", ... }],
//!   "documents": [{ "id": 1, "project_id": 1, "filename": "plan.png", ... }],
//!   "results": [{ "document_id": 1, "processed_at": "...", "detections": [...] }]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::export::timestamp;
use crate::model::DetectionResult;

/// Current store file format version.
pub const STORE_VERSION: &str = "1.0";

pub type ProjectId = u32;
pub type DocumentId = u32;

/// A named group of documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    /// Creation date (YYYY-MM-DD)
    pub created_at: String,
}

/// An uploaded file belonging to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub project_id: ProjectId,
    pub filename: String,
    /// Declared MIME type
    pub file_type: String,
    /// Upload time (ISO 8601)
    pub upload_date: String,
    /// Size in bytes
    pub size: u64,
    pub processed: bool,
}

/// Detection result recorded for a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingRecord {
    pub document_id: DocumentId,
    pub processed_at: String,
    pub detections: DetectionResult,
}

/// In-memory store of projects and documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStore {
    version: String,
    projects: Vec<Project>,
    documents: Vec<Document>,
    results: Vec<ProcessingRecord>,
}

impl ProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            version: STORE_VERSION.to_string(),
            projects: Vec::new(),
            documents: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Create a project and return its id.
    pub fn create_project(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> ProjectId {
        let id = self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let created_at = timestamp::current_timestamp()
            .get(..10)
            .unwrap_or_default()
            .to_string();
        let project = Project {
            id,
            name: name.into(),
            description: description.into(),
            created_at,
        };
        log::debug!("Created project {} '{}'", id, project.name);
        self.projects.push(project);
        id
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Add a document to an existing project.
    pub fn add_document(
        &mut self,
        project_id: ProjectId,
        filename: impl Into<String>,
        file_type: impl Into<String>,
        size: u64,
    ) -> Result<DocumentId, ProjectError> {
        if self.project(project_id).is_none() {
            return Err(ProjectError::ProjectNotFound(project_id));
        }

        let id = self.documents.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        let document = Document {
            id,
            project_id,
            filename: filename.into(),
            file_type: file_type.into(),
            upload_date: timestamp::current_timestamp(),
            size,
            processed: false,
        };
        log::debug!(
            "Added document {} '{}' to project {}",
            id,
            document.filename,
            project_id
        );
        self.documents.push(document);
        Ok(id)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Documents of a project in upload order.
    pub fn documents_in(&self, project_id: ProjectId) -> impl Iterator<Item = &Document> {
        self.documents
            .iter()
            .filter(move |d| d.project_id == project_id)
    }

    /// Documents of a project whose filename contains `query`
    /// (case-insensitive).
    pub fn search_documents(&self, project_id: ProjectId, query: &str) -> Vec<&Document> {
        let query = query.to_lowercase();
        self.documents_in(project_id)
            .filter(|d| d.filename.to_lowercase().contains(&query))
            .collect()
    }

    /// Record the result for a document and mark it processed. A previous
    /// result for the same document is replaced.
    pub fn record_result(
        &mut self,
        document_id: DocumentId,
        result: DetectionResult,
    ) -> Result<(), ProjectError> {
        let document = self
            .documents
            .iter_mut()
            .find(|d| d.id == document_id)
            .ok_or(ProjectError::DocumentNotFound(document_id))?;
        document.processed = true;

        self.results.retain(|r| r.document_id != document_id);
        self.results.push(ProcessingRecord {
            document_id,
            processed_at: timestamp::current_timestamp(),
            detections: result,
        });
        Ok(())
    }

    pub fn result_for(&self, document_id: DocumentId) -> Option<&DetectionResult> {
        self.results
            .iter()
            .find(|r| r.document_id == document_id)
            .map(|r| &r.detections)
    }

    /// Serialize the store to a JSON string.
    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a store from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        let store: Self = serde_json::from_str(json)?;

        if store.version != STORE_VERSION {
            log::warn!(
                "Store version mismatch: expected {}, got {}",
                STORE_VERSION,
                store.version
            );
        }

        Ok(store)
    }

    /// Save the store to a file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ProjectError> {
        let json = self.to_json()?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a store from a file (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, ProjectError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for ProjectStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    /// No project with this id
    #[error("Project {0} not found")]
    ProjectNotFound(ProjectId),

    /// No document with this id
    #[error("Document {0} not found")]
    DocumentNotFound(DocumentId),

    /// JSON (de)serialization error
    #[error("Failed to (de)serialize project store: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}
