//! Track handles and effective settings

use crate::constraints::TrackConstraints;
use crate::device::DeviceKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

impl TrackKind {
    /// Input device kind that produces this track kind
    pub fn device_kind(&self) -> DeviceKind {
        match self {
            TrackKind::Audio => DeviceKind::AudioInput,
            TrackKind::Video => DeviceKind::VideoInput,
        }
    }
}

/// Liveness of a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackState {
    /// Track is producing media
    Live,
    /// Track was stopped and released
    Ended,
}

/// Parameters a track is actually running with, as reported by the platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    /// Device the track captures from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Frame width (video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Frame height (video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Frames per second (video)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<f64>,
    /// Sample rate in Hz (audio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    /// Number of channels (audio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<u32>,
    /// Echo cancellation (audio)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_cancellation: Option<bool>,
}

impl TrackSettings {
    /// Frame size as `(width, height)` when both are known
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }
}

/// One media channel inside a capture session
///
/// Handles belong to exactly one session. Enabling or disabling a track
/// mutates it in place; the session and the underlying platform stream stay
/// alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackHandle {
    id: String,
    kind: TrackKind,
    label: String,
    enabled: bool,
    state: TrackState,
    constraints: Option<TrackConstraints>,
    settings: TrackSettings,
}

impl TrackHandle {
    /// Wrap a freshly acquired platform track
    pub fn new(
        id: impl Into<String>,
        kind: TrackKind,
        label: impl Into<String>,
        constraints: Option<TrackConstraints>,
        settings: TrackSettings,
    ) -> Self {
        let id = id.into();
        let label = label.into();
        match kind {
            TrackKind::Video => info!("📹 Wrapping video track {} ({})", id, label),
            TrackKind::Audio => info!("🎵 Wrapping audio track {} ({})", id, label),
        }
        Self {
            id,
            kind,
            label,
            enabled: true,
            state: TrackState::Live,
            constraints,
            settings,
        }
    }

    /// Platform track id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Track kind
    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Label of the source device
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Check if the track is currently capturing
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable capture
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!(
                "{} track {}",
                if enabled { "🔊 Enabling" } else { "🔇 Disabling" },
                self.id
            );
            self.enabled = enabled;
        }
    }

    /// Track liveness
    pub fn state(&self) -> TrackState {
        self.state
    }

    /// Check if the track has been released
    pub fn is_ended(&self) -> bool {
        matches!(self.state, TrackState::Ended)
    }

    /// Mark the track as released
    pub(crate) fn end(&mut self) {
        if self.state != TrackState::Ended {
            debug!("🔄 Track {} ended", self.id);
            self.state = TrackState::Ended;
        }
    }

    /// Constraints last applied successfully, `None` when acquired without any
    pub fn constraints(&self) -> Option<&TrackConstraints> {
        self.constraints.as_ref()
    }

    /// Effective settings
    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    /// Device the track captures from
    pub fn device_id(&self) -> Option<&str> {
        self.settings.device_id.as_deref()
    }

    /// Record a successful reconfiguration
    pub(crate) fn apply(&mut self, constraints: TrackConstraints, settings: TrackSettings) {
        debug!("⚙️ Updating track {} settings", self.id);
        self.constraints = Some(constraints);
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constrain, VideoConstraints};

    fn video_track() -> TrackHandle {
        TrackHandle::new(
            "track-1",
            TrackKind::Video,
            "Front",
            None,
            TrackSettings {
                device_id: Some("cam1".to_string()),
                width: Some(1280),
                height: Some(720),
                frame_rate: Some(30.0),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_track_starts_live_and_enabled() {
        let track = video_track();
        assert!(track.is_enabled());
        assert_eq!(track.state(), TrackState::Live);
        assert_eq!(track.device_id(), Some("cam1"));
        assert_eq!(track.settings().resolution(), Some((1280, 720)));
    }

    #[test]
    fn test_toggle_is_in_place() {
        let mut track = video_track();
        track.set_enabled(false);
        assert!(!track.is_enabled());
        track.set_enabled(false);
        assert!(!track.is_enabled());
        track.set_enabled(true);
        assert!(track.is_enabled());
        assert_eq!(track.state(), TrackState::Live);
    }

    #[test]
    fn test_apply_replaces_constraints_and_settings() {
        let mut track = video_track();
        let constraints =
            TrackConstraints::Video(VideoConstraints::new().width(Constrain::exact(640)));
        let settings = TrackSettings {
            width: Some(640),
            height: Some(480),
            ..track.settings().clone()
        };

        track.apply(constraints.clone(), settings);
        assert_eq!(track.constraints(), Some(&constraints));
        assert_eq!(track.settings().resolution(), Some((640, 480)));
    }

    #[test]
    fn test_kind_maps_to_input_device() {
        assert_eq!(TrackKind::Video.device_kind(), DeviceKind::VideoInput);
        assert_eq!(TrackKind::Audio.device_kind(), DeviceKind::AudioInput);
    }
}
