//! Error types for gateway and backend operations

use thiserror::Error;

/// Result type alias for studio operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Message shown when an operation is triggered without an upload
pub const MISSING_IMAGE_MESSAGE: &str = "Please upload an image first!";

/// Error types surfaced by the gateway, backends and surfaces
#[derive(Error, Debug)]
pub enum StudioError {
    /// User input rejected before any backend call (missing image, bad color, ...)
    #[error("{0}")]
    Validation(String),

    /// Failure reported by a processing backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// The session has used up its free generations
    #[error("Free generation limit of {limit} reached for this session. Sign up for unlimited access.")]
    QuotaExceeded { limit: u32 },

    /// Transport failure while talking to a remote backend
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or encoding errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported file format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudioError {
    /// Create a new validation error
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }

    /// The error raised when no image was supplied
    #[must_use]
    pub fn missing_image() -> Self {
        Self::Validation(MISSING_IMAGE_MESSAGE.to_string())
    }

    /// Create a new backend error
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: &std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create configuration error with valid ranges
    pub fn config_value_error<T: std::fmt::Display>(
        parameter: &str,
        value: T,
        valid_range: &str,
        recommended: Option<T>,
    ) -> Self {
        let recommendation = match recommended {
            Some(rec) => format!(" Recommended: {}", rec),
            None => String::new(),
        };

        Self::InvalidConfig(format!(
            "Invalid {}: {} (valid range: {}).{}",
            parameter, value, valid_range, recommendation
        ))
    }

    /// Create backend error with HTTP status context
    pub fn backend_status_error(operation: &str, status: u16, body: &str) -> Self {
        let detail = body.trim();
        if detail.is_empty() {
            Self::Backend(format!("{} failed with status {}", operation, status))
        } else {
            Self::Backend(format!(
                "{} failed with status {}: {}",
                operation, status, detail
            ))
        }
    }

    /// Whether this error was caused by user input rather than processing
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::QuotaExceeded { .. })
    }
}
