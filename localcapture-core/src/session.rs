//! Capture sessions

use crate::error::{CaptureError, CaptureResult};
use crate::track::{TrackHandle, TrackKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// Caller-visible handle to a session owned by the manager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Waiting for the platform to return a stream
    Acquiring,
    /// Stream acquired, tracks live
    Active,
    /// A track reconfiguration is in flight
    Reconfiguring,
    /// Every track and the stream were released
    Stopped,
}

/// Where the session's media comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureSource {
    /// Cameras and microphones
    Device,
    /// Screen or window capture
    Display,
}

/// Acquired stream and its tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSession {
    id: SessionId,
    stream_id: String,
    source: CaptureSource,
    tracks: Vec<TrackHandle>,
    state: SessionState,
    acquired_at: DateTime<Utc>,
}

impl MediaSession {
    /// Placeholder registered while the platform call is in flight
    pub(crate) fn acquiring(id: SessionId, source: CaptureSource) -> Self {
        Self {
            id,
            stream_id: String::new(),
            source,
            tracks: Vec::new(),
            state: SessionState::Acquiring,
            acquired_at: Utc::now(),
        }
    }

    /// Attach the acquired stream and move to `Active`
    pub(crate) fn activate(&mut self, stream_id: String, tracks: Vec<TrackHandle>) {
        self.stream_id = stream_id;
        self.tracks = tracks;
        self.acquired_at = Utc::now();
        self.set_state(SessionState::Active);
    }

    /// Session handle
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Platform stream id
    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    /// Capture source
    pub fn source(&self) -> CaptureSource {
        self.source
    }

    /// Tracks in platform order
    pub fn tracks(&self) -> &[TrackHandle] {
        &self.tracks
    }

    /// Tracks of one kind
    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &TrackHandle> {
        self.tracks.iter().filter(move |t| t.kind() == kind)
    }

    /// Lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the stream was acquired
    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Check if tracks are live
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Reconfiguring)
    }

    /// Check if the session was stopped
    pub fn is_stopped(&self) -> bool {
        matches!(self.state, SessionState::Stopped)
    }

    pub(crate) fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            debug!("🔄 {} state changed: {:?} -> {:?}", self.id, self.state, state);
            self.state = state;
        }
    }

    /// Track at `index`, failing with `InvalidHandle` when out of range or
    /// the session is not active
    pub fn track(&self, index: usize) -> CaptureResult<&TrackHandle> {
        self.ensure_active()?;
        self.tracks
            .get(index)
            .ok_or_else(|| CaptureError::invalid_handle(format!("{} track {}", self.id, index)))
    }

    pub(crate) fn track_mut(&mut self, index: usize) -> CaptureResult<&mut TrackHandle> {
        self.ensure_active()?;
        let id = self.id;
        self.tracks
            .get_mut(index)
            .ok_or_else(|| CaptureError::invalid_handle(format!("{} track {}", id, index)))
    }

    pub(crate) fn tracks_mut(&mut self) -> &mut [TrackHandle] {
        &mut self.tracks
    }

    pub(crate) fn ensure_active(&self) -> CaptureResult<()> {
        if !self.is_active() {
            return Err(CaptureError::invalid_handle(format!(
                "{} ({:?})",
                self.id, self.state
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackSettings;

    fn active_session() -> MediaSession {
        let mut session = MediaSession::acquiring(SessionId::new(), CaptureSource::Device);
        session.activate(
            "stream-1".to_string(),
            vec![
                TrackHandle::new("v", TrackKind::Video, "Front", None, TrackSettings::default()),
                TrackHandle::new("a", TrackKind::Audio, "Mic", None, TrackSettings::default()),
            ],
        );
        session
    }

    #[test]
    fn test_activation() {
        let session = active_session();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.stream_id(), "stream-1");
        assert_eq!(session.tracks_of(TrackKind::Video).count(), 1);
        assert_eq!(session.tracks_of(TrackKind::Audio).count(), 1);
    }

    #[test]
    fn test_track_lookup() {
        let mut session = active_session();
        assert_eq!(session.track(1).unwrap().id(), "a");
        assert!(matches!(
            session.track(2),
            Err(CaptureError::InvalidHandle { .. })
        ));

        session.set_state(SessionState::Stopped);
        assert!(matches!(
            session.track(0),
            Err(CaptureError::InvalidHandle { .. })
        ));
    }

    #[test]
    fn test_acquiring_session_has_no_usable_tracks() {
        let session = MediaSession::acquiring(SessionId::new(), CaptureSource::Display);
        assert!(!session.is_active());
        assert!(session.track(0).is_err());
    }
}
