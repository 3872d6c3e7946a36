//! Destinations for encoded exports.

use std::fs;
use std::path::PathBuf;

use super::document::ExportDocument;
use super::error::FormatError;
use super::timestamp;
use super::traits::ExportFormat;

/// Consumes an encoded export and persists it.
pub trait ExportSink {
    /// Encode `document` with `format` and persist it. Returns a
    /// description of where it went (a path for file sinks).
    fn write(
        &mut self,
        document: &ExportDocument,
        format: &dyn ExportFormat,
    ) -> Result<PathBuf, FormatError>;
}

/// Writes `detection-results-<unix-millis>.<ext>` files into a directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Output filename for a given timestamp and extension.
    pub fn file_name(millis: u128, extension: &str) -> String {
        format!("detection-results-{}.{}", millis, extension)
    }
}

impl ExportSink for FileSink {
    fn write(
        &mut self,
        document: &ExportDocument,
        format: &dyn ExportFormat,
    ) -> Result<PathBuf, FormatError> {
        let bytes = format.encode(document)?;

        fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(Self::file_name(timestamp::unix_millis(), format.extension()));
        fs::write(&path, &bytes)?;

        log::info!(
            "Exported {} detections as {} to {:?}",
            document.total_count,
            format.display_name(),
            path
        );
        Ok(path)
    }
}

/// Keeps encoded exports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<(String, Vec<u8>)>,
}

impl ExportSink for MemorySink {
    fn write(
        &mut self,
        document: &ExportDocument,
        format: &dyn ExportFormat,
    ) -> Result<PathBuf, FormatError> {
        let bytes = format.encode(document)?;
        let name = format!("{}.{}", document.stem(), format.extension());
        self.files.push((name.clone(), bytes));
        Ok(PathBuf::from(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::formats::{JsonFormat, PascalVocFormat};
    use crate::model::DetectionResult;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mechcount-sink-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            FileSink::file_name(1_700_000_000_123, "json"),
            "detection-results-1700000000123.json"
        );
    }

    #[test]
    fn test_file_sink_writes_into_directory() {
        let dir = temp_dir("write");
        let mut sink = FileSink::new(&dir);
        let doc = ExportDocument::new("plan.png", &DetectionResult::empty(), "t");

        let path = sink.write(&doc, &JsonFormat).expect("write");

        assert_eq!(path.parent(), Some(dir.as_path()));
        let name = path.file_name().and_then(|n| n.to_str()).expect("name");
        assert!(name.starts_with("detection-results-"));
        assert!(name.ends_with(".json"));
        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).expect("read")).expect("json");
        assert_eq!(json["filename"], "plan.png");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_memory_sink() {
        let mut sink = MemorySink::default();
        let doc = ExportDocument::new("plan.png", &DetectionResult::empty(), "t");

        sink.write(&doc, &PascalVocFormat).expect("write");

        assert_eq!(sink.files.len(), 1);
        assert_eq!(sink.files[0].0, "plan.xml");
    }
}
