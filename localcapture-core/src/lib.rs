//! # localcapture core
//!
//! Device enumeration, constraint resolution and capture session management.
//! This crate holds everything between a host platform's capture primitives
//! and the caller's rendering surfaces: validated constraint requests, the
//! error taxonomy, session and track lifecycle, and device-change
//! notification.

#![warn(clippy::all)]

pub mod capabilities;
pub mod constraints;
pub mod device;
pub mod error;
pub mod events;
pub mod manager;
pub mod platform;
pub mod render;
pub mod session;
pub mod track;

// Re-export main types
pub use capabilities::{AudioCapabilities, VideoCapabilities, VideoResolution};
pub use constraints::{
    AudioConstraints, Constrain, ConstrainBool, ConstraintSpec, DeviceSelection, MediaRequest,
    TrackConstraints, VideoConstraints,
};
pub use device::{DeviceDescriptor, DeviceKind};
pub use error::{CaptureError, CaptureResult, ErrorCategory, PlatformError};
pub use events::{DeviceChangeListeners, ListenerHandle};
pub use manager::DeviceSessionManager;
pub use platform::{
    DeviceChangeEvent, MediaPlatform, MockDevice, MockPlatform, Permission, PlatformStream,
    PlatformTrack,
};
pub use render::{
    device_options, render_device_list, DeviceListView, DeviceOption, LabelFallback,
    MemoryDeviceList, RecordingSink, StreamBinding, StreamSink,
};
pub use session::{CaptureSource, MediaSession, SessionId, SessionState};
pub use track::{TrackHandle, TrackKind, TrackSettings, TrackState};

#[cfg(feature = "cpal-backend")]
pub use platform::cpal_backend::{CapturedAudio, CpalPlatform};
