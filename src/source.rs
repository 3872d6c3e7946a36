//! Uploaded files and the decoded source image.
//!
//! Validation (MIME allow-list, size limit) happens before any decode
//! attempt. Raster types are decoded with the `image` crate; PDF-like
//! documents are kept as opaque bytes and only summarized.

use std::sync::Arc;

use image::RgbaImage;

use crate::constants::upload;
use crate::error::ViewerError;

/// Raw file as supplied by a file picker or drag-drop source.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Size reported by the picker, when it differs from the bytes read
    declared_size: Option<u64>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            bytes,
            declared_size: None,
        }
    }

    /// Set the size reported by the file source.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Effective size for validation: the larger of declared and actual.
    pub fn size(&self) -> u64 {
        let actual = self.bytes.len() as u64;
        self.declared_size.map_or(actual, |declared| declared.max(actual))
    }
}

/// How an accepted file is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Raster image rendered in the viewport
    Raster,
    /// Opaque document (PDF); summary-only display
    Document,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            MediaKind::Raster
        } else {
            MediaKind::Document
        }
    }
}

/// Upload acceptance rules.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadPolicy {
    pub allowed_mime_types: Vec<String>,
    pub max_file_size: u64,
}

impl UploadPolicy {
    /// Check type and size, in that order. Nothing is decoded here.
    pub fn validate(&self, file: &UploadedFile) -> Result<MediaKind, ViewerError> {
        let mime_type = file.mime_type.trim().to_ascii_lowercase();
        if !self.allowed_mime_types.iter().any(|m| *m == mime_type) {
            return Err(ViewerError::UnsupportedFormat {
                mime_type: file.mime_type.clone(),
            });
        }

        let size = file.size();
        if size > self.max_file_size {
            return Err(ViewerError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(MediaKind::from_mime(&mime_type))
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_mime_types: upload::ALLOWED_MIME_TYPES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            max_file_size: upload::MAX_FILE_SIZE,
        }
    }
}

/// Displayable content of a source.
#[derive(Debug, Clone)]
pub enum SourceContent {
    /// Decoded RGBA pixels at native resolution
    Raster(RgbaImage),
    /// Accepted document that is not rendered
    Document,
    /// Accepted raster type whose bytes failed to decode
    Undecodable(ViewerError),
}

/// The uploaded image owned by the viewer for one upload session.
#[derive(Debug, Clone)]
pub struct SourceImage {
    filename: String,
    mime_type: String,
    kind: MediaKind,
    bytes: Arc<[u8]>,
    content: SourceContent,
}

impl SourceImage {
    /// Validate and decode an uploaded file.
    ///
    /// Format and size failures are returned as errors. Bytes of an accepted
    /// raster type that do not decode still produce a source; rendering it
    /// reports [`ViewerError::DecodeError`].
    pub fn load(file: UploadedFile, policy: &UploadPolicy) -> Result<Self, ViewerError> {
        let kind = policy.validate(&file)?;

        let content = match kind {
            MediaKind::Raster => match decode_raster(&file.bytes) {
                Ok(pixels) => {
                    log::debug!(
                        "Decoded {} as {}x{} RGBA",
                        file.filename,
                        pixels.width(),
                        pixels.height()
                    );
                    SourceContent::Raster(pixels)
                }
                Err(err) => {
                    log::warn!("Could not decode {}: {}", file.filename, err);
                    SourceContent::Undecodable(err)
                }
            },
            MediaKind::Document => SourceContent::Document,
        };

        Ok(Self {
            filename: file.filename,
            mime_type: file.mime_type,
            kind,
            bytes: Arc::from(file.bytes),
            content,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    /// Shared handle to the raw bytes.
    pub fn bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn content(&self) -> &SourceContent {
        &self.content
    }

    /// Decoded pixels, if this source is a decodable raster.
    pub fn raster(&self) -> Option<&RgbaImage> {
        match &self.content {
            SourceContent::Raster(pixels) => Some(pixels),
            _ => None,
        }
    }

    /// Pixel dimensions, `(0, 0)` when nothing was decoded.
    pub fn dimensions(&self) -> (u32, u32) {
        self.raster().map_or((0, 0), |p| p.dimensions())
    }
}

/// Decode raster bytes into RGBA.
pub fn decode_raster(bytes: &[u8]) -> Result<RgbaImage, ViewerError> {
    let image = image::load_from_memory(bytes).map_err(|e| ViewerError::decode(e.to_string()))?;
    Ok(image.to_rgba8())
}
