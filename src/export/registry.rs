//! Format registry for discovering export formats.

use std::collections::HashMap;

use super::error::FormatError;
use super::formats::{CocoFormat, JsonFormat, PascalVocFormat};
use super::traits::ExportFormat;

/// Id of the native format.
pub const NATIVE_FORMAT: &str = "json";

/// Registry of available export formats.
///
/// All built-in formats are registered on creation.
pub struct FormatRegistry {
    formats: HashMap<&'static str, Box<dyn ExportFormat>>,
}

impl FormatRegistry {
    /// Create a new registry with all built-in formats registered.
    pub fn new() -> Self {
        let mut registry = Self {
            formats: HashMap::new(),
        };

        registry.register(Box::new(JsonFormat));
        registry.register(Box::new(CocoFormat));
        registry.register(Box::new(PascalVocFormat));

        registry
    }

    /// Register a format implementation, replacing any with the same id.
    pub fn register(&mut self, format: Box<dyn ExportFormat>) {
        self.formats.insert(format.id(), format);
    }

    /// Get a format by its ID.
    pub fn get(&self, id: &str) -> Option<&dyn ExportFormat> {
        self.formats.get(id).map(|f| f.as_ref())
    }

    /// Get a format by its ID or fail with [`FormatError::UnknownFormat`].
    pub fn require(&self, id: &str) -> Result<&dyn ExportFormat, FormatError> {
        self.get(id).ok_or_else(|| FormatError::unknown_format(id))
    }

    /// All registered formats, sorted by id.
    pub fn all(&self) -> Vec<&dyn ExportFormat> {
        let mut formats: Vec<&dyn ExportFormat> = self.formats.values().map(|f| f.as_ref()).collect();
        formats.sort_by_key(|f| f.id());
        formats
    }

    /// All format IDs, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<&'static str> = self.formats.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// The native JSON format, if still registered.
    pub fn native(&self) -> Option<&dyn ExportFormat> {
        self.get(NATIVE_FORMAT)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_formats() {
        let registry = FormatRegistry::new();

        assert!(registry.get("json").is_some());
        assert!(registry.get("coco").is_some());
        assert!(registry.get("voc").is_some());
        assert_eq!(registry.ids(), vec!["coco", "json", "voc"]);
    }

    #[test]
    fn test_native_format() {
        let registry = FormatRegistry::new();
        assert_eq!(registry.native().map(|f| f.id()), Some("json"));
    }

    #[test]
    fn test_unknown_format() {
        let registry = FormatRegistry::new();
        assert!(matches!(
            registry.require("yolo"),
            Err(FormatError::UnknownFormat { .. })
        ));
    }
}
