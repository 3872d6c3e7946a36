//! Error types for viewer operations.

use thiserror::Error;

/// Errors reported at the viewer boundary.
///
/// Every variant is recoverable: the caller shows [`ViewerError::user_message`]
/// and the user re-initiates the action.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// The declared MIME type is not on the allow-list
    #[error("Unsupported format: {mime_type}")]
    UnsupportedFormat {
        /// The rejected MIME type
        mime_type: String,
    },

    /// The file exceeds the configured size limit
    #[error("File too large: {size} bytes (maximum {max} bytes)")]
    FileTooLarge {
        /// Size of the rejected file in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// The detection call failed or timed out
    #[error("Detection service error: {reason}")]
    ServiceError {
        /// Failure description from the service
        reason: String,
    },

    /// Export was attempted before any detection result was set
    #[error("No detection result available")]
    NoResultAvailable,

    /// Image bytes could not be rasterized
    #[error("Failed to decode image: {message}")]
    DecodeError {
        /// Decoder message
        message: String,
    },
}

impl ViewerError {
    /// Create a service error with a reason.
    pub fn service(reason: impl Into<String>) -> Self {
        Self::ServiceError {
            reason: reason.into(),
        }
    }

    /// Create a decode error with a message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::DecodeError {
            message: message.into(),
        }
    }

    /// Sentence suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::UnsupportedFormat { .. } => {
                "Please upload a valid image (JPEG, PNG) or PDF file.".to_string()
            }
            ViewerError::FileTooLarge { max, .. } => {
                format!("File size must be less than {}MB.", max / (1024 * 1024))
            }
            ViewerError::ServiceError { .. } => {
                "Error processing file. Please try again.".to_string()
            }
            ViewerError::NoResultAvailable => {
                "There are no detection results to export yet.".to_string()
            }
            ViewerError::DecodeError { .. } => {
                "The image could not be displayed. Please re-upload the file.".to_string()
            }
        }
    }
}
