//! # localcapture - Local Media Capture
//!
//! localcapture enumerates cameras, microphones and speakers, opens capture
//! streams under declarative constraints, and hands the resulting streams to
//! whatever surface plays them.
//!
//! ## Key Features
//!
//! - **Constraint resolution**: exact device pinning combined with
//!   min/ideal/max bounds on resolution, frame rate and audio parameters
//! - **Distinct errors**: denied permission, missing devices, unsatisfiable
//!   bounds and malformed requests are reported separately
//! - **Live reconfiguration**: change a running track's parameters without
//!   re-acquiring it
//! - **Device-change tracking**: re-render device lists as hardware comes and
//!   goes
//! - **Pluggable platforms**: in-memory platform for tests and demos, cpal
//!   for native audio devices
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use localcapture::{DeviceKind, GlobalConfig, LocalCapture, MemoryDeviceList, MockPlatform, RecordingSink};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let capture = LocalCapture::init_with(
//!         Arc::new(MockPlatform::with_default_devices()),
//!         GlobalConfig::default(),
//!     )?;
//!     let picker = capture.picker();
//!
//!     // Fill the camera list, then play the first camera
//!     let mut cameras = MemoryDeviceList::new(DeviceKind::VideoInput);
//!     picker.refresh(DeviceKind::VideoInput, &mut cameras).await?;
//!
//!     let mut player = RecordingSink::new();
//!     let session = picker.play_first_camera(&mut player).await?;
//!
//!     capture.manager().stop(session)?;
//!     Ok(())
//! }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Re-export core types for easy access
pub use localcapture_core::{
    device_options, render_device_list, AudioCapabilities, AudioConstraints, CaptureError,
    CaptureResult, CaptureSource, Constrain, ConstrainBool, ConstraintSpec, DeviceChangeEvent,
    DeviceDescriptor, DeviceKind, DeviceListView, DeviceOption, DeviceSelection,
    DeviceSessionManager, ErrorCategory, LabelFallback, ListenerHandle, MediaPlatform,
    MediaRequest, MediaSession, MemoryDeviceList, MockDevice, MockPlatform, Permission,
    PlatformError, PlatformStream, PlatformTrack, RecordingSink, SessionId, SessionState,
    StreamBinding, StreamSink, TrackConstraints, TrackHandle, TrackKind, TrackSettings,
    TrackState, VideoCapabilities, VideoConstraints, VideoResolution,
};

#[cfg(feature = "cpal-backend")]
pub use localcapture_core::{CapturedAudio, CpalPlatform};

// Public API modules
pub mod config;
pub mod error;
pub mod logging;
pub mod picker;

// Re-export main API types
pub use config::GlobalConfig;
pub use error::{LocalCaptureError, Result};
pub use logging::init_logging;
pub use picker::{DevicePicker, DeviceWatch};

use std::sync::Arc;
use tracing::info;

/// Main entry point for localcapture
#[derive(Debug, Clone)]
pub struct LocalCapture {
    inner: Arc<LocalCaptureInner>,
}

#[derive(Debug)]
struct LocalCaptureInner {
    manager: Arc<DeviceSessionManager>,
    config: Arc<GlobalConfig>,
}

impl LocalCapture {
    /// Initialize on the default platform with default settings
    ///
    /// The default platform is cpal when the `cpal-backend` feature is
    /// enabled, the in-memory platform otherwise. Must be called from within
    /// a tokio runtime.
    pub fn init() -> Result<Self> {
        Self::init_with(default_platform(), GlobalConfig::default())
    }

    /// Initialize on `platform` with custom global configuration
    ///
    /// # Example
    /// ```rust,no_run
    /// use localcapture::{GlobalConfig, LocalCapture, MockPlatform};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> localcapture::Result<()> {
    /// let config = GlobalConfig {
    ///     debug_logging: true,
    ///     ..Default::default()
    /// };
    /// let capture = LocalCapture::init_with(Arc::new(MockPlatform::new()), config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn init_with(platform: Arc<dyn MediaPlatform>, config: GlobalConfig) -> Result<Self> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(LocalCaptureError::Initialization {
                reason: "localcapture must be initialized inside a tokio runtime".to_string(),
            });
        }
        if config.debug_logging || config.log_filter.is_some() {
            init_logging(&config)?;
        }

        let manager = Arc::new(DeviceSessionManager::new(platform));
        info!("🚀 localcapture initialized on {}", manager.platform_name());
        Ok(Self {
            inner: Arc::new(LocalCaptureInner {
                manager,
                config: Arc::new(config),
            }),
        })
    }

    /// Session manager driving every capture operation
    pub fn manager(&self) -> &DeviceSessionManager {
        &self.inner.manager
    }

    /// Active configuration
    pub fn config(&self) -> &GlobalConfig {
        &self.inner.config
    }

    /// Create a device picker sharing this instance's manager
    pub fn picker(&self) -> DevicePicker {
        DevicePicker::new(
            Arc::clone(&self.inner.manager),
            Arc::clone(&self.inner.config),
        )
    }
}

#[cfg(feature = "cpal-backend")]
fn default_platform() -> Arc<dyn MediaPlatform> {
    Arc::new(CpalPlatform::new())
}

#[cfg(not(feature = "cpal-backend"))]
fn default_platform() -> Arc<dyn MediaPlatform> {
    Arc::new(MockPlatform::with_default_devices())
}
