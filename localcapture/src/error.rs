//! Error type for the top-level API

use localcapture_core::CaptureError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the facade: capture failures plus setup problems
#[derive(Error, Debug)]
pub enum LocalCaptureError {
    /// Failure reported by the session manager
    #[error(transparent)]
    Capture(#[from] CaptureError),

    /// Initialization error
    #[error("Initialization failed: {reason}")]
    Initialization {
        /// Reason for initialization failure
        reason: String,
    },

    /// Logging could not be set up
    #[error("Logging initialization failed: {reason}")]
    Logging {
        /// Reason for the failure
        reason: String,
    },

    /// Configuration file could not be read
    #[error("Cannot read configuration {path}: {source}")]
    ConfigIo {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid JSON or has the wrong shape
    #[error("Invalid configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),
}

impl LocalCaptureError {
    /// The capture error behind this error, if any
    pub fn as_capture(&self) -> Option<&CaptureError> {
        match self {
            LocalCaptureError::Capture(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias for facade operations
pub type Result<T> = std::result::Result<T, LocalCaptureError>;
