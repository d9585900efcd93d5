//! In-memory capture platform
//!
//! Used by tests and demos, and as the fallback on hosts without a native
//! backend. Devices can be plugged and unplugged at runtime, permission can
//! be withheld, and every track release is counted.

use super::{
    DeviceChangeEvent, MediaPlatform, PlatformStream, PlatformTrack,
    DEVICE_CHANGE_CHANNEL_CAPACITY,
};
use crate::capabilities::{
    resolve_audio, resolve_video, AudioCapabilities, VideoCapabilities, VideoResolution,
};
use crate::constraints::{
    AudioConstraints, ConstraintSpec, DeviceSelection, TrackConstraints, VideoConstraints,
};
use crate::device::{DeviceDescriptor, DeviceKind};
use crate::error::PlatformError;
use crate::track::{TrackKind, TrackSettings};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::broadcast;
use tracing::debug;

/// Permission state of the mock platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Not decided yet; the first acquisition grants it
    Prompt,
    /// Granted, labels are visible
    Granted,
    /// Refused, every acquisition fails
    Denied,
}

/// What a mock device can produce
#[derive(Debug, Clone, PartialEq)]
pub enum MockCapabilities {
    Video(VideoCapabilities),
    Audio(AudioCapabilities),
    Output,
}

/// Device registered with a [`MockPlatform`]
#[derive(Debug, Clone, PartialEq)]
pub struct MockDevice {
    pub descriptor: DeviceDescriptor,
    pub capabilities: MockCapabilities,
}

impl MockDevice {
    /// Camera with VGA, HD and Full HD modes at 15 and 30 fps
    pub fn camera(id: &str, label: &str) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(id, DeviceKind::VideoInput, label),
            capabilities: MockCapabilities::Video(VideoCapabilities::default()),
        }
    }

    /// Microphone with echo cancellation support
    pub fn microphone(id: &str, label: &str) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(id, DeviceKind::AudioInput, label),
            capabilities: MockCapabilities::Audio(AudioCapabilities::default()),
        }
    }

    /// Audio output device
    pub fn speaker(id: &str, label: &str) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(id, DeviceKind::AudioOutput, label),
            capabilities: MockCapabilities::Output,
        }
    }

    /// Replace the video modes of a camera
    pub fn with_video_capabilities(mut self, caps: VideoCapabilities) -> Self {
        self.capabilities = MockCapabilities::Video(caps);
        self
    }

    /// Replace the audio modes of a microphone
    pub fn with_audio_capabilities(mut self, caps: AudioCapabilities) -> Self {
        self.capabilities = MockCapabilities::Audio(caps);
        self
    }
}

#[derive(Debug, Clone)]
struct MockTrack {
    kind: TrackKind,
    capabilities: MockCapabilities,
    settings: TrackSettings,
    enabled: bool,
    releases: u32,
}

#[derive(Debug)]
struct MockState {
    devices: Vec<MockDevice>,
    permission: Permission,
    available: bool,
    display: Option<VideoCapabilities>,
    tracks: HashMap<String, MockTrack>,
    next_id: u64,
    change_sequence: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn check_access(&self) -> Result<(), PlatformError> {
        if !self.available {
            return Err(PlatformError::Unavailable {
                message: "mock platform switched off".to_string(),
            });
        }
        if self.permission == Permission::Denied {
            return Err(PlatformError::NotAllowed {
                message: "Permission denied".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory [`MediaPlatform`]
#[derive(Debug)]
pub struct MockPlatform {
    state: Mutex<MockState>,
    change_tx: broadcast::Sender<DeviceChangeEvent>,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatform {
    /// Platform with no devices, permission not yet decided
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(DEVICE_CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(MockState {
                devices: Vec::new(),
                permission: Permission::Prompt,
                available: true,
                display: Some(VideoCapabilities {
                    resolutions: vec![VideoResolution::HD, VideoResolution::FULL_HD],
                    frame_rates: vec![5.0, 15.0, 30.0],
                }),
                tracks: HashMap::new(),
                next_id: 0,
                change_sequence: 0,
            }),
            change_tx,
        }
    }

    /// One camera, one microphone and one speaker
    pub fn with_default_devices() -> Self {
        Self::new()
            .with_device(MockDevice::camera("mock_camera_0", "Mock Camera"))
            .with_device(MockDevice::microphone("mock_microphone_0", "Mock Microphone"))
            .with_device(MockDevice::speaker("mock_speaker_0", "Mock Speaker"))
    }

    /// Register a device without notifying
    pub fn with_device(self, device: MockDevice) -> Self {
        self.state.lock().devices.push(device);
        self
    }

    /// Set the permission state
    pub fn with_permission(self, permission: Permission) -> Self {
        self.set_permission(permission);
        self
    }

    /// Change the permission state
    pub fn set_permission(&self, permission: Permission) {
        self.state.lock().permission = permission;
    }

    /// Current permission state
    pub fn permission(&self) -> Permission {
        self.state.lock().permission
    }

    /// Make the whole capability (un)available
    pub fn set_available(&self, available: bool) {
        self.state.lock().available = available;
    }

    /// Replace or remove display capture support
    pub fn set_display_capabilities(&self, caps: Option<VideoCapabilities>) {
        self.state.lock().display = caps;
    }

    /// Add a device and fire a device-change notification
    pub fn plug(&self, device: MockDevice) {
        debug!("🔌 Mock device plugged: {}", device.descriptor.id);
        self.state.lock().devices.push(device);
        self.notify_device_change();
    }

    /// Remove a device and fire a device-change notification
    ///
    /// Tracks already capturing from the device keep running.
    pub fn unplug(&self, device_id: &str) -> bool {
        let removed = {
            let mut state = self.state.lock();
            let before = state.devices.len();
            state.devices.retain(|d| d.descriptor.id != device_id);
            state.devices.len() != before
        };
        if removed {
            debug!("🔌 Mock device unplugged: {}", device_id);
            self.notify_device_change();
        }
        removed
    }

    /// Fire a device-change notification
    pub fn notify_device_change(&self) {
        let sequence = {
            let mut state = self.state.lock();
            state.change_sequence += 1;
            state.change_sequence
        };
        // no receivers is fine
        let _ = self.change_tx.send(DeviceChangeEvent {
            sequence,
            observed_at: Utc::now(),
        });
    }

    /// How many times a track was released
    pub fn release_count(&self, track_id: &str) -> u32 {
        self.state
            .lock()
            .tracks
            .get(track_id)
            .map_or(0, |track| track.releases)
    }

    /// Whether a track is flowing media, `None` for unknown tracks
    pub fn is_track_enabled(&self, track_id: &str) -> Option<bool> {
        self.state.lock().tracks.get(track_id).map(|t| t.enabled)
    }

    /// Number of tracks acquired and not yet released
    pub fn live_track_count(&self) -> usize {
        self.state
            .lock()
            .tracks
            .values()
            .filter(|t| t.releases == 0)
            .count()
    }

    fn open_video(
        state: &MockState,
        constraints: &VideoConstraints,
    ) -> Result<(DeviceDescriptor, MockCapabilities, TrackSettings), PlatformError> {
        let candidates = Self::candidates(state, TrackKind::Video, &constraints.device)?;
        let mut first_failure = None;
        for device in candidates {
            if let MockCapabilities::Video(caps) = &device.capabilities {
                match resolve_video(caps, constraints) {
                    Ok(settings) => {
                        return Ok((device.descriptor.clone(), device.capabilities.clone(), settings))
                    }
                    Err(constraint) => {
                        first_failure.get_or_insert(constraint);
                    }
                }
            }
        }
        Err(Self::overconstrained(TrackKind::Video, first_failure.unwrap_or("deviceId")))
    }

    fn open_audio(
        state: &MockState,
        constraints: &AudioConstraints,
    ) -> Result<(DeviceDescriptor, MockCapabilities, TrackSettings), PlatformError> {
        let candidates = Self::candidates(state, TrackKind::Audio, &constraints.device)?;
        let mut first_failure = None;
        for device in candidates {
            if let MockCapabilities::Audio(caps) = &device.capabilities {
                match resolve_audio(caps, constraints) {
                    Ok(settings) => {
                        return Ok((device.descriptor.clone(), device.capabilities.clone(), settings))
                    }
                    Err(constraint) => {
                        first_failure.get_or_insert(constraint);
                    }
                }
            }
        }
        Err(Self::overconstrained(TrackKind::Audio, first_failure.unwrap_or("deviceId")))
    }

    /// Devices of `kind` acceptable under `selection`, preferred device first
    fn candidates<'a>(
        state: &'a MockState,
        kind: TrackKind,
        selection: &DeviceSelection,
    ) -> Result<Vec<&'a MockDevice>, PlatformError> {
        let device_kind = kind.device_kind();
        let of_kind: Vec<_> = state
            .devices
            .iter()
            .filter(|d| d.descriptor.kind == device_kind)
            .collect();
        if of_kind.is_empty() {
            return Err(PlatformError::NotFound {
                kind: Some(kind),
                message: format!("no {} device", device_kind),
            });
        }
        let mut accepted: Vec<_> = of_kind
            .into_iter()
            .filter(|d| selection.accepts(&d.descriptor.id))
            .collect();
        if accepted.is_empty() {
            return Err(Self::overconstrained(kind, "deviceId"));
        }
        if let DeviceSelection::Preferred(id) = selection {
            // stable sort keeps platform order among the rest
            accepted.sort_by_key(|d| d.descriptor.id != *id);
        }
        Ok(accepted)
    }

    fn overconstrained(kind: TrackKind, constraint: &str) -> PlatformError {
        PlatformError::Overconstrained {
            kind: Some(kind),
            constraint: constraint.to_string(),
            message: format!("no device satisfies the {} constraint", constraint),
        }
    }

    fn register_track(
        state: &mut MockState,
        kind: TrackKind,
        label: String,
        capabilities: MockCapabilities,
        settings: TrackSettings,
    ) -> PlatformTrack {
        let id = state.next_id(match kind {
            TrackKind::Audio => "audio-track",
            TrackKind::Video => "video-track",
        });
        state.tracks.insert(
            id.clone(),
            MockTrack {
                kind,
                capabilities,
                settings: settings.clone(),
                enabled: true,
                releases: 0,
            },
        );
        PlatformTrack {
            id,
            kind,
            label,
            settings,
        }
    }
}

#[async_trait]
impl MediaPlatform for MockPlatform {
    fn name(&self) -> &str {
        "mock"
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PlatformError> {
        let state = self.state.lock();
        if !state.available {
            return Err(PlatformError::Unavailable {
                message: "mock platform switched off".to_string(),
            });
        }
        let reveal = state.permission == Permission::Granted;
        Ok(state
            .devices
            .iter()
            .map(|d| {
                if reveal {
                    d.descriptor.clone()
                } else {
                    d.descriptor.redacted()
                }
            })
            .collect())
    }

    async fn acquire_stream(
        &self,
        constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError> {
        let mut state = self.state.lock();
        state.check_access()?;

        // resolve every requested kind before registering anything
        let video = match constraints.video().resolved() {
            Some(video) => Some(Self::open_video(&state, &video)?),
            None => None,
        };
        let audio = match constraints.audio().resolved() {
            Some(audio) => Some(Self::open_audio(&state, &audio)?),
            None => None,
        };
        if video.is_none() && audio.is_none() {
            return Err(PlatformError::TypeError {
                message: "neither audio nor video requested".to_string(),
            });
        }

        let mut tracks = Vec::new();
        for (kind, opened) in [(TrackKind::Video, video), (TrackKind::Audio, audio)] {
            if let Some((descriptor, capabilities, mut settings)) = opened {
                settings.device_id = Some(descriptor.id.clone());
                tracks.push(Self::register_track(
                    &mut state,
                    kind,
                    descriptor.label,
                    capabilities,
                    settings,
                ));
            }
        }
        if state.permission == Permission::Prompt {
            state.permission = Permission::Granted;
        }

        let id = state.next_id("stream");
        Ok(PlatformStream { id, tracks })
    }

    async fn acquire_display_stream(
        &self,
        constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError> {
        let mut state = self.state.lock();
        state.check_access()?;
        let caps = state.display.clone().ok_or_else(|| PlatformError::Unavailable {
            message: "display capture not supported".to_string(),
        })?;

        let video = constraints.video().resolved().unwrap_or_default();
        let settings =
            resolve_video(&caps, &video)
            .map_err(|constraint| Self::overconstrained(TrackKind::Video, constraint))?;

        // system audio is not captured; an audio request yields no audio track
        let track = Self::register_track(
            &mut state,
            TrackKind::Video,
            "Screen 1".to_string(),
            MockCapabilities::Video(caps),
            settings,
        );
        let id = state.next_id("display-stream");
        Ok(PlatformStream {
            id,
            tracks: vec![track],
        })
    }

    async fn apply_track_constraints(
        &self,
        track_id: &str,
        constraints: &TrackConstraints,
    ) -> Result<TrackSettings, PlatformError> {
        let mut state = self.state.lock();
        let track = state
            .tracks
            .get_mut(track_id)
            .filter(|t| t.releases == 0)
            .ok_or_else(|| PlatformError::UnknownTrack {
                track_id: track_id.to_string(),
            })?;
        let kind = track.kind;

        if kind != constraints.kind() {
            return Err(PlatformError::TypeError {
                message: format!("{:?} constraints applied to a {:?} track", constraints.kind(), kind),
            });
        }
        let current_device = track.settings.device_id.clone();
        if let Some(required) = constraints.device().required_id() {
            if current_device.as_deref() != Some(required) {
                return Err(Self::overconstrained(kind, "deviceId"));
            }
        }

        let resolved = match (&track.capabilities, constraints) {
            (MockCapabilities::Video(caps), TrackConstraints::Video(video)) => {
                resolve_video(caps, video)
            }
            (MockCapabilities::Audio(caps), TrackConstraints::Audio(audio)) => {
                resolve_audio(caps, audio)
            }
            _ => {
                return Err(PlatformError::TypeError {
                    message: "constraints do not match the track source".to_string(),
                })
            }
        };
        let mut settings = resolved.map_err(|constraint| Self::overconstrained(kind, constraint))?;
        settings.device_id = current_device;
        track.settings = settings.clone();
        Ok(settings)
    }

    fn set_track_enabled(&self, track_id: &str, enabled: bool) {
        if let Some(track) = self.state.lock().tracks.get_mut(track_id) {
            track.enabled = enabled;
        }
    }

    fn stop_track(&self, track_id: &str) {
        if let Some(track) = self.state.lock().tracks.get_mut(track_id) {
            track.releases += 1;
            track.enabled = false;
        }
    }

    fn device_changes(&self) -> broadcast::Receiver<DeviceChangeEvent> {
        self.change_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{Constrain, MediaRequest};

    #[tokio::test]
    async fn test_labels_hidden_until_permission() {
        let platform = MockPlatform::with_default_devices();
        let devices = platform.enumerate_devices().await.unwrap();
        assert!(devices.iter().all(|d| d.label.is_empty()));

        platform
            .acquire_stream(&ConstraintSpec::camera_and_microphone())
            .await
            .unwrap();
        assert_eq!(platform.permission(), Permission::Granted);

        let devices = platform.enumerate_devices().await.unwrap();
        assert!(devices.iter().all(|d| !d.label.is_empty()));
    }

    #[tokio::test]
    async fn test_preferred_device_falls_back() {
        let platform = MockPlatform::new()
            .with_device(MockDevice::camera("cam1", "Front"))
            .with_device(MockDevice::camera("cam2", "Back"));

        let spec = ConstraintSpec::video_only(VideoConstraints::new().preferred_device("cam2")).unwrap();
        let stream = platform.acquire_stream(&spec).await.unwrap();
        assert_eq!(stream.tracks[0].settings.device_id.as_deref(), Some("cam2"));

        let spec =
            ConstraintSpec::video_only(VideoConstraints::new().preferred_device("gone")).unwrap();
        let stream = platform.acquire_stream(&spec).await.unwrap();
        assert_eq!(stream.tracks[0].settings.device_id.as_deref(), Some("cam1"));
    }

    #[tokio::test]
    async fn test_failed_acquisition_registers_nothing() {
        let platform = MockPlatform::with_default_devices();
        let spec = ConstraintSpec::new(
            MediaRequest::Constrained(AudioConstraints::new().channel_count(Constrain::exact(8))),
            MediaRequest::Any,
        )
        .unwrap();

        let err = platform.acquire_stream(&spec).await.unwrap_err();
        assert!(matches!(err, PlatformError::Overconstrained { ref constraint, .. } if constraint == "channelCount"));
        assert_eq!(platform.live_track_count(), 0);
    }

    #[tokio::test]
    async fn test_device_change_broadcast() {
        let platform = MockPlatform::with_default_devices();
        let mut changes = platform.device_changes();

        assert!(platform.unplug("mock_camera_0"));
        assert!(!platform.unplug("mock_camera_0"));

        let event = changes.recv().await.unwrap();
        assert_eq!(event.sequence, 1);
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_display_capture_has_single_video_track() {
        let platform = MockPlatform::with_default_devices();
        let stream = platform
            .acquire_display_stream(&ConstraintSpec::camera_and_microphone())
            .await
            .unwrap();

        assert_eq!(stream.tracks.len(), 1);
        assert_eq!(stream.tracks[0].kind, TrackKind::Video);
        assert!(stream.tracks[0].settings.device_id.is_none());
    }
}
