//! Device session manager
//!
//! [`DeviceSessionManager`] owns the enumerate → acquire → bind →
//! reconfigure → release lifecycle on top of a [`MediaPlatform`].
//!
//! Operations on one session must be serialized by the caller: running
//! `reconfigure` and `stop` concurrently on the same session is not
//! supported. Different sessions are fully independent, and no lock is held
//! while the platform is being awaited.

use crate::constraints::{ConstraintSpec, DeviceSelection, TrackConstraints};
use crate::device::{filter_by_kind, DeviceDescriptor, DeviceKind};
use crate::error::{CaptureError, CaptureResult, PlatformError};
use crate::events::{DeviceChangeListeners, ListenerHandle};
use crate::platform::{DeviceChangeEvent, MediaPlatform, PlatformStream};
use crate::render::{StreamBinding, StreamSink};
use crate::session::{CaptureSource, MediaSession, SessionId, SessionState};
use crate::track::{TrackHandle, TrackKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Enumerates devices and manages capture sessions
pub struct DeviceSessionManager {
    platform: Arc<dyn MediaPlatform>,
    sessions: Mutex<HashMap<SessionId, MediaSession>>,
    listeners: Arc<DeviceChangeListeners>,
    forwarder: JoinHandle<()>,
}

impl std::fmt::Debug for DeviceSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSessionManager")
            .field("platform", &self.platform.name())
            .field("sessions", &self.sessions.lock().len())
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl DeviceSessionManager {
    /// Create a manager on top of `platform`
    ///
    /// Must be called from within a tokio runtime: a background task
    /// forwards the platform's device-change notifications to listeners
    /// until the manager is dropped.
    pub fn new(platform: Arc<dyn MediaPlatform>) -> Self {
        let listeners = Arc::new(DeviceChangeListeners::new());
        let forwarder = listeners.spawn_forwarder(platform.device_changes());
        info!("🎬 Device session manager ready (platform: {})", platform.name());
        Self {
            platform,
            sessions: Mutex::new(HashMap::new()),
            listeners,
            forwarder,
        }
    }

    /// Name of the underlying platform
    pub fn platform_name(&self) -> &str {
        self.platform.name()
    }

    /// List devices of one kind, in platform order
    ///
    /// Labels may be empty until capture permission has been granted.
    pub async fn list_devices(&self, kind: DeviceKind) -> CaptureResult<Vec<DeviceDescriptor>> {
        let devices = self.platform.enumerate_devices().await.map_err(|e| {
            warn!("❌ Device enumeration failed: {}", e);
            e.into_capture_error(Some(kind), None)
        })?;
        let devices = filter_by_kind(devices, kind);
        debug!("🔍 Found {} {} device(s)", devices.len(), kind);
        Ok(devices)
    }

    /// Acquire a camera and/or microphone stream
    ///
    /// On failure no session is created.
    pub async fn acquire(&self, constraints: &ConstraintSpec) -> CaptureResult<SessionId> {
        constraints.validate()?;
        self.acquire_from(CaptureSource::Device, constraints).await
    }

    /// Acquire a screen or window capture stream
    pub async fn acquire_display(&self, constraints: &ConstraintSpec) -> CaptureResult<SessionId> {
        constraints.validate_for_display()?;
        self.acquire_from(CaptureSource::Display, constraints).await
    }

    async fn acquire_from(
        &self,
        source: CaptureSource,
        constraints: &ConstraintSpec,
    ) -> CaptureResult<SessionId> {
        let id = SessionId::new();
        self.sessions
            .lock()
            .insert(id, MediaSession::acquiring(id, source));
        debug!("⏳ Acquiring {:?} stream for {}", source, id);

        let result = match source {
            CaptureSource::Device => self.platform.acquire_stream(constraints).await,
            CaptureSource::Display => self.platform.acquire_display_stream(constraints).await,
        };

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                self.sessions.lock().remove(&id);
                warn!("❌ Acquisition failed for {}: {}", id, e);
                let (kind, device_id) = failure_context(constraints, e.track_kind());
                return Err(e.into_capture_error(kind, device_id));
            }
        };

        let stream_id = stream.id.clone();
        let tracks = wrap_tracks(stream, constraints);
        info!(
            "✅ {} active: stream {} with {} track(s)",
            id,
            stream_id,
            tracks.len()
        );
        match self.sessions.lock().get_mut(&id) {
            Some(session) => session.activate(stream_id, tracks),
            None => {
                // the placeholder can only vanish through purge_stopped,
                // which never touches acquiring sessions
                for track in &tracks {
                    self.platform.stop_track(track.id());
                }
                return Err(CaptureError::invalid_handle(id.to_string()));
            }
        }
        Ok(id)
    }

    /// Apply new constraints to one live track without re-acquiring
    ///
    /// On failure the track keeps its previous constraints and settings.
    pub async fn reconfigure(
        &self,
        id: SessionId,
        track_index: usize,
        constraints: TrackConstraints,
    ) -> CaptureResult<()> {
        constraints.validate()?;

        let track_id = {
            let mut sessions = self.sessions.lock();
            let session = sessions
                .get_mut(&id)
                .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
            let track = session.track(track_index)?;
            if track.kind() != constraints.kind() {
                return Err(CaptureError::invalid_constraint(format!(
                    "{:?} constraints cannot be applied to a {:?} track",
                    constraints.kind(),
                    track.kind()
                )));
            }
            let track_id = track.id().to_string();
            session.set_state(SessionState::Reconfiguring);
            track_id
        };

        debug!("⚙️ Reconfiguring track {} of {}", track_id, id);
        let result = self
            .platform
            .apply_track_constraints(&track_id, &constraints)
            .await;

        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
        if session.state() == SessionState::Reconfiguring {
            session.set_state(SessionState::Active);
        }

        match result {
            Ok(settings) => {
                session.track_mut(track_index)?.apply(constraints, settings);
                Ok(())
            }
            Err(e) => {
                warn!("❌ Reconfiguration of track {} rejected: {}", track_id, e);
                Err(reconfigure_error(e, &constraints))
            }
        }
    }

    /// Enable or disable capture on one track
    pub fn set_track_enabled(
        &self,
        id: SessionId,
        track_index: usize,
        enabled: bool,
    ) -> CaptureResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
        let track = session.track_mut(track_index)?;
        track.set_enabled(enabled);
        self.platform.set_track_enabled(track.id(), enabled);
        Ok(())
    }

    /// Release every track and the stream of a session
    ///
    /// Stopping an already stopped session is a no-op.
    pub fn stop(&self, id: SessionId) -> CaptureResult<()> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
        if session.is_stopped() {
            debug!("{} already stopped", id);
            return Ok(());
        }
        for track in session.tracks_mut() {
            if !track.is_ended() {
                self.platform.stop_track(track.id());
                track.end();
            }
        }
        session.set_state(SessionState::Stopped);
        info!("⏹️ {} stopped", id);
        Ok(())
    }

    /// Stop a session and forget it
    ///
    /// Later operations on `id` fail with `InvalidHandle`.
    pub fn release(&self, id: SessionId) -> CaptureResult<()> {
        self.stop(id)?;
        self.sessions.lock().remove(&id);
        debug!("🗑️ {} released", id);
        Ok(())
    }

    /// Stop every live session, returning how many were stopped
    pub fn stop_all(&self) -> usize {
        let ids: Vec<SessionId> = self.active_sessions();
        ids.into_iter().filter(|id| self.stop(*id).is_ok()).count()
    }

    /// Bind an active session's stream to a sink
    ///
    /// The sink is only touched when the session is active.
    pub fn bind(&self, id: SessionId, sink: &mut dyn StreamSink) -> CaptureResult<()> {
        let binding = {
            let sessions = self.sessions.lock();
            let session = sessions
                .get(&id)
                .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
            session.ensure_active()?;
            StreamBinding::from_session(session)
        };
        debug!("🖥️ Binding {} to sink", id);
        sink.bind(binding);
        Ok(())
    }

    /// Snapshot of a session
    pub fn session(&self, id: SessionId) -> Option<MediaSession> {
        self.sessions.lock().get(&id).cloned()
    }

    /// Snapshot of one track
    pub fn track(&self, id: SessionId, track_index: usize) -> CaptureResult<TrackHandle> {
        let sessions = self.sessions.lock();
        let session = sessions
            .get(&id)
            .ok_or_else(|| CaptureError::invalid_handle(id.to_string()))?;
        session.track(track_index).cloned()
    }

    /// Number of sessions the manager still tracks, stopped ones included
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Ids of sessions with live tracks
    pub fn active_sessions(&self) -> Vec<SessionId> {
        self.sessions
            .lock()
            .values()
            .filter(|s| s.is_active())
            .map(|s| s.id())
            .collect()
    }

    /// Forget stopped sessions, returning how many were dropped
    ///
    /// Later operations on a purged id fail with `InvalidHandle`.
    pub fn purge_stopped(&self) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_stopped());
        before - sessions.len()
    }

    /// Register a device-change callback
    ///
    /// The manager only notifies; callers re-list devices and decide what
    /// to do with running sessions.
    pub fn on_device_change<F>(&self, callback: F) -> ListenerHandle
    where
        F: Fn(&DeviceChangeEvent) + Send + Sync + 'static,
    {
        self.listeners.register(callback)
    }

    /// Remove a device-change callback
    pub fn remove_device_change_listener(&self, handle: ListenerHandle) -> bool {
        self.listeners.unregister(handle)
    }

    /// Receive device-change notifications as a stream
    pub fn subscribe_device_changes(&self) -> broadcast::Receiver<DeviceChangeEvent> {
        self.listeners.subscribe()
    }
}

impl Drop for DeviceSessionManager {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

fn wrap_tracks(stream: PlatformStream, constraints: &ConstraintSpec) -> Vec<TrackHandle> {
    stream
        .tracks
        .into_iter()
        .map(|track| {
            let applied = match track.kind {
                TrackKind::Video => constraints
                    .video()
                    .constraints()
                    .cloned()
                    .map(TrackConstraints::Video),
                TrackKind::Audio => constraints
                    .audio()
                    .constraints()
                    .cloned()
                    .map(TrackConstraints::Audio),
            };
            TrackHandle::new(track.id, track.kind, track.label, applied, track.settings)
        })
        .collect()
}

/// Device kind and pinned id to attach to lookup failures
///
/// A failure the platform tied to one track kind is only ever blamed on the
/// device pinned for that kind.
fn failure_context(
    constraints: &ConstraintSpec,
    failing: Option<TrackKind>,
) -> (Option<DeviceKind>, Option<String>) {
    if let Some(kind) = failing {
        return (Some(kind.device_kind()), pinned_device(constraints, kind));
    }

    let pinned = [TrackKind::Video, TrackKind::Audio]
        .into_iter()
        .find_map(|kind| pinned_device(constraints, kind).map(|id| (kind, id)));
    if let Some((kind, id)) = pinned {
        return (Some(kind.device_kind()), Some(id));
    }

    match (
        constraints.requests(TrackKind::Video),
        constraints.requests(TrackKind::Audio),
    ) {
        (true, false) => (Some(DeviceKind::VideoInput), None),
        (false, true) => (Some(DeviceKind::AudioInput), None),
        _ => (None, None),
    }
}

fn pinned_device(constraints: &ConstraintSpec, kind: TrackKind) -> Option<String> {
    let selection = match kind {
        TrackKind::Video => constraints.video().constraints().map(|v| &v.device),
        TrackKind::Audio => constraints.audio().constraints().map(|a| &a.device),
    };
    selection
        .and_then(DeviceSelection::required_id)
        .map(str::to_string)
}

/// A live track cannot switch device, so every overconstraint during
/// reconfiguration is reported as unsatisfiable
fn reconfigure_error(error: PlatformError, constraints: &TrackConstraints) -> CaptureError {
    match error {
        PlatformError::Overconstrained {
            constraint,
            message,
            ..
        } => CaptureError::ConstraintUnsatisfiable {
            constraint,
            reason: message,
        },
        other => other.into_capture_error(
            Some(constraints.kind().device_kind()),
            constraints.device().required_id().map(str::to_string),
        ),
    }
}
