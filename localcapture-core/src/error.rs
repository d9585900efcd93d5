//! Capture error types and handling
//!
//! This module defines the error taxonomy surfaced by the session manager and
//! the raw error surface reported by platform backends, together with the
//! translation between the two.

use crate::device::DeviceKind;
use crate::track::TrackKind;
use thiserror::Error;

/// Main error type for device and capture session operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// The platform capture capability is missing or unusable
    #[error("Platform unavailable: {reason}")]
    PlatformUnavailable {
        /// Reason reported by the platform
        reason: String,
    },

    /// The user or a policy refused access to capture devices
    #[error("Acquisition denied: {reason}")]
    AcquisitionDenied {
        /// Reason reported by the platform
        reason: String,
    },

    /// No device matched the requested kind or exact device id
    #[error("Device not found: {}", device_not_found_detail(.kind, .device_id))]
    DeviceNotFound {
        /// Kind of device that was requested, when known
        kind: Option<DeviceKind>,
        /// Exact device id that could not be matched, if any
        device_id: Option<String>,
    },

    /// Capability bounds could not be met by any matching device
    #[error("Constraint unsatisfiable: {constraint} - {reason}")]
    ConstraintUnsatisfiable {
        /// Name of the offending constraint (e.g. `width`)
        constraint: String,
        /// Failure reason
        reason: String,
    },

    /// The caller supplied a malformed constraint request
    #[error("Invalid constraint: {reason}")]
    InvalidConstraint {
        /// Why the constraint was rejected
        reason: String,
    },

    /// A session or track handle does not exist or is stale
    #[error("Invalid handle: {handle}")]
    InvalidHandle {
        /// Description of the handle
        handle: String,
    },
}

fn device_not_found_detail(kind: &Option<DeviceKind>, device_id: &Option<String>) -> String {
    match (kind, device_id) {
        (_, Some(id)) => format!("no device with id '{}'", id),
        (Some(kind), None) => format!("no {} device available", kind),
        (None, None) => "no matching device".to_string(),
    }
}

/// Result type alias for capture operations
pub type CaptureResult<T> = Result<T, CaptureError>;

impl CaptureError {
    pub(crate) fn invalid_constraint(reason: impl Into<String>) -> Self {
        CaptureError::InvalidConstraint {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_handle(handle: impl Into<String>) -> Self {
        CaptureError::InvalidHandle {
            handle: handle.into(),
        }
    }

    /// Check if retrying the same request can succeed without caller changes
    ///
    /// Only platform-level failures qualify: a busy or briefly missing
    /// capability may come back, a refused permission or an impossible
    /// constraint will not.
    pub fn is_recoverable(&self) -> bool {
        match self {
            CaptureError::PlatformUnavailable { .. } => true,
            CaptureError::DeviceNotFound { .. } => true,
            CaptureError::AcquisitionDenied { .. } => false,
            CaptureError::ConstraintUnsatisfiable { .. } => false,
            CaptureError::InvalidConstraint { .. } => false,
            CaptureError::InvalidHandle { .. } => false,
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            CaptureError::PlatformUnavailable { .. } => ErrorCategory::Platform,
            CaptureError::AcquisitionDenied { .. } => ErrorCategory::Permission,
            CaptureError::DeviceNotFound { .. } => ErrorCategory::Device,
            CaptureError::ConstraintUnsatisfiable { .. } => ErrorCategory::Constraint,
            CaptureError::InvalidConstraint { .. } => ErrorCategory::Constraint,
            CaptureError::InvalidHandle { .. } => ErrorCategory::State,
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Platform capability errors
    Platform,
    /// Permission and policy errors
    Permission,
    /// Device lookup errors
    Device,
    /// Constraint construction and satisfaction errors
    Constraint,
    /// Stale or unknown handles
    State,
}

/// Raw failure surface of a [`MediaPlatform`](crate::platform::MediaPlatform)
///
/// Variants follow the exception names capture platforms commonly report so
/// backends can map their native failures one-to-one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// Permission refused
    #[error("NotAllowedError: {message}")]
    NotAllowed {
        /// Platform message
        message: String,
    },

    /// No device of the requested kind exists
    #[error("NotFoundError: {message}")]
    NotFound {
        /// Track kind whose device lookup failed, when the backend knows it
        kind: Option<TrackKind>,
        /// Platform message
        message: String,
    },

    /// A hard constraint could not be met
    #[error("OverconstrainedError: {constraint} - {message}")]
    Overconstrained {
        /// Track kind whose constraint failed, when the backend knows it
        kind: Option<TrackKind>,
        /// Name of the constraint that failed
        constraint: String,
        /// Platform message
        message: String,
    },

    /// The device exists but could not be opened (busy, hardware fault)
    #[error("NotReadableError: {message}")]
    NotReadable {
        /// Platform message
        message: String,
    },

    /// The request was aborted by the platform
    #[error("AbortError: {message}")]
    Aborted {
        /// Platform message
        message: String,
    },

    /// The request itself was malformed
    #[error("TypeError: {message}")]
    TypeError {
        /// Platform message
        message: String,
    },

    /// The capture capability is absent
    #[error("capture capability unavailable: {message}")]
    Unavailable {
        /// Platform message
        message: String,
    },

    /// The referenced track is unknown to the platform
    #[error("unknown track: {track_id}")]
    UnknownTrack {
        /// Platform track id
        track_id: String,
    },
}

impl PlatformError {
    /// Track kind the failure belongs to, if the backend reported one
    pub fn track_kind(&self) -> Option<TrackKind> {
        match self {
            PlatformError::NotFound { kind, .. } | PlatformError::Overconstrained { kind, .. } => {
                *kind
            }
            _ => None,
        }
    }

    /// Translate a platform failure into the manager's error taxonomy
    ///
    /// `kind` and `device_id` describe the request that failed and are
    /// attached to device lookup errors.
    pub fn into_capture_error(
        self,
        kind: Option<DeviceKind>,
        device_id: Option<String>,
    ) -> CaptureError {
        match self {
            PlatformError::NotAllowed { message } => {
                CaptureError::AcquisitionDenied { reason: message }
            }
            PlatformError::NotFound { .. } => CaptureError::DeviceNotFound { kind, device_id },
            PlatformError::Overconstrained { constraint, .. } if constraint == "deviceId" => {
                CaptureError::DeviceNotFound { kind, device_id }
            }
            PlatformError::Overconstrained {
                constraint,
                message,
                ..
            } => CaptureError::ConstraintUnsatisfiable {
                constraint,
                reason: message,
            },
            PlatformError::NotReadable { message }
            | PlatformError::Aborted { message }
            | PlatformError::Unavailable { message } => {
                CaptureError::PlatformUnavailable { reason: message }
            }
            PlatformError::TypeError { message } => {
                CaptureError::InvalidConstraint { reason: message }
            }
            PlatformError::UnknownTrack { track_id } => CaptureError::InvalidHandle {
                handle: format!("platform track {}", track_id),
            },
        }
    }
}
