//! Host platform capture capability
//!
//! The manager never touches devices directly; everything goes through a
//! [`MediaPlatform`]. Backends translate their native failures into
//! [`PlatformError`] and push device-set changes through a broadcast
//! channel.

#[cfg(feature = "cpal-backend")]
pub mod cpal_backend;
pub mod mock;

use crate::constraints::{ConstraintSpec, TrackConstraints};
use crate::device::DeviceDescriptor;
use crate::error::PlatformError;
use crate::track::{TrackKind, TrackSettings};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

pub use mock::{MockDevice, MockPlatform, Permission};

/// Capacity of device-change broadcast channels
pub const DEVICE_CHANGE_CHANNEL_CAPACITY: usize = 16;

/// Push notification that the platform's device set changed
///
/// Carries no device list; receivers re-enumerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceChangeEvent {
    /// Monotonic sequence number assigned by the platform
    pub sequence: u64,
    /// When the platform observed the change
    pub observed_at: DateTime<Utc>,
}

/// Track as returned by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformTrack {
    /// Platform track id
    pub id: String,
    /// Media kind
    pub kind: TrackKind,
    /// Label of the source
    pub label: String,
    /// Effective settings
    pub settings: TrackSettings,
}

/// Stream as returned by the platform
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformStream {
    /// Platform stream id
    pub id: String,
    /// Tracks in platform order
    pub tracks: Vec<PlatformTrack>,
}

/// Device enumeration and media acquisition primitives of the host
#[async_trait]
pub trait MediaPlatform: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// List every device the platform knows about
    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PlatformError>;

    /// Open capture devices matching `constraints`
    async fn acquire_stream(
        &self,
        constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError>;

    /// Open a display (screen or window) capture matching `constraints`
    async fn acquire_display_stream(
        &self,
        constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError>;

    /// Apply new constraints to a live track, returning its new settings
    ///
    /// On error the track must keep running with its previous settings.
    async fn apply_track_constraints(
        &self,
        track_id: &str,
        constraints: &TrackConstraints,
    ) -> Result<TrackSettings, PlatformError>;

    /// Pause or resume media flow on a live track
    fn set_track_enabled(&self, track_id: &str, enabled: bool);

    /// Release a track and its device
    fn stop_track(&self, track_id: &str);

    /// Subscribe to device-change notifications
    fn device_changes(&self) -> broadcast::Receiver<DeviceChangeEvent>;
}
