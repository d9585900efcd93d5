//! Device picker flow
//!
//! [`DevicePicker`] is the glue a capture page needs: fill camera and
//! microphone lists, open the chosen (or first) camera, hand the stream to a
//! player, and keep the lists current while devices come and go.

use crate::config::GlobalConfig;
use localcapture_core::{
    render_device_list, AudioConstraints, CaptureError, CaptureResult, Constrain, ConstrainBool,
    ConstraintSpec, DeviceDescriptor, DeviceKind, DeviceListView, DeviceSessionManager,
    MediaRequest, SessionId, StreamSink,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lists devices into views and plays cameras into sinks
#[derive(Debug)]
pub struct DevicePicker {
    manager: Arc<DeviceSessionManager>,
    config: Arc<GlobalConfig>,
    current: Mutex<Option<SessionId>>,
}

impl DevicePicker {
    pub(crate) fn new(manager: Arc<DeviceSessionManager>, config: Arc<GlobalConfig>) -> Self {
        Self {
            manager,
            config,
            current: Mutex::new(None),
        }
    }

    /// Session most recently bound through this picker
    pub fn current_session(&self) -> Option<SessionId> {
        *self.current.lock()
    }

    /// List devices of `kind` and render them into `view`
    pub async fn refresh(
        &self,
        kind: DeviceKind,
        view: &mut dyn DeviceListView,
    ) -> CaptureResult<Vec<DeviceDescriptor>> {
        let devices = self.manager.list_devices(kind).await?;
        render_device_list(view, &devices, self.config.label_fallback(kind));
        Ok(devices)
    }

    /// Refresh the camera and microphone lists together
    ///
    /// Both enumerations run concurrently; if either fails neither view is
    /// touched.
    pub async fn refresh_inputs(
        &self,
        camera_view: &mut dyn DeviceListView,
        microphone_view: &mut dyn DeviceListView,
    ) -> CaptureResult<(Vec<DeviceDescriptor>, Vec<DeviceDescriptor>)> {
        let (cameras, microphones) = futures::try_join!(
            self.manager.list_devices(DeviceKind::VideoInput),
            self.manager.list_devices(DeviceKind::AudioInput),
        )?;
        render_device_list(
            camera_view,
            &cameras,
            self.config.label_fallback(DeviceKind::VideoInput),
        );
        render_device_list(
            microphone_view,
            &microphones,
            self.config.label_fallback(DeviceKind::AudioInput),
        );
        debug!(
            "📋 Listed {} camera(s) and {} microphone(s)",
            cameras.len(),
            microphones.len()
        );
        Ok((cameras, microphones))
    }

    /// Open the first listed camera and play it into `sink`
    pub async fn play_first_camera(&self, sink: &mut dyn StreamSink) -> CaptureResult<SessionId> {
        let cameras = self.manager.list_devices(DeviceKind::VideoInput).await?;
        let first = cameras.first().ok_or(CaptureError::DeviceNotFound {
            kind: Some(DeviceKind::VideoInput),
            device_id: None,
        })?;
        info!("📹 Opening first camera {}", first.id);

        let video = self.config.default_video.clone().exact_device(&first.id);
        let spec = ConstraintSpec::new(self.audio_request(), MediaRequest::Constrained(video))?;
        self.acquire_and_bind(&spec, sink).await
    }

    /// Open a camera at `min_width`x`min_height` or better, with
    /// echo-cancelled audio, and play it into `sink`
    ///
    /// `device_id` is a preference: another camera meeting the minimum is
    /// used when it is gone.
    pub async fn open_camera(
        &self,
        device_id: &str,
        min_width: u32,
        min_height: u32,
        sink: &mut dyn StreamSink,
    ) -> CaptureResult<SessionId> {
        let video = self
            .config
            .default_video
            .clone()
            .preferred_device(device_id)
            .width(Constrain::at_least(min_width))
            .height(Constrain::at_least(min_height));
        let audio = AudioConstraints::new().echo_cancellation(ConstrainBool::Ideal(true));
        let spec = ConstraintSpec::new(
            MediaRequest::Constrained(audio),
            MediaRequest::Constrained(video),
        )?;
        self.acquire_and_bind(&spec, sink).await
    }

    /// Acquire a stream and play it into `sink`
    ///
    /// The session previously bound through this picker is stopped once the
    /// new one is playing. On failure the sink and the previous session are
    /// left as they were.
    pub async fn acquire_and_bind(
        &self,
        constraints: &ConstraintSpec,
        sink: &mut dyn StreamSink,
    ) -> CaptureResult<SessionId> {
        let id = self.manager.acquire(constraints).await?;
        if let Err(e) = self.manager.bind(id, sink) {
            warn!("❌ Could not bind {}: {}", id, e);
            // the fresh session is unusable without a sink
            if let Err(release_err) = self.manager.release(id) {
                debug!("Unbound session {} already gone: {}", id, release_err);
            }
            return Err(e);
        }

        let previous = self.current.lock().replace(id);
        if let Some(previous) = previous {
            debug!("⏹️ Replacing {} with {}", previous, id);
            if let Err(e) = self.manager.release(previous) {
                debug!("Previous session {} already gone: {}", previous, e);
            }
        }
        Ok(id)
    }

    /// Release the session bound through this picker and clear `sink`
    ///
    /// The sink is cleared even when the session can no longer be released.
    pub fn stop(&self, sink: &mut dyn StreamSink) -> CaptureResult<()> {
        let Some(id) = self.current.lock().take() else {
            return Ok(());
        };
        sink.unbind();
        self.manager.release(id)
    }

    /// Keep `view` in sync with the devices of `kind`
    ///
    /// One background task re-lists and re-renders after device-change
    /// notifications, in the order they arrive, until the returned guard is
    /// dropped. Must be called from within a tokio runtime.
    pub fn watch<V>(&self, kind: DeviceKind, view: Arc<Mutex<V>>) -> DeviceWatch
    where
        V: DeviceListView + Send + 'static,
    {
        let mut changes = self.manager.subscribe_device_changes();
        let manager = Arc::downgrade(&self.manager);
        let config = Arc::clone(&self.config);

        let task = tokio::spawn(async move {
            loop {
                let mut sequence = match changes.recv().await {
                    Ok(event) => Some(event.sequence),
                    Err(RecvError::Lagged(missed)) => {
                        debug!("⏭️ Missed {} device change(s)", missed);
                        None
                    }
                    Err(RecvError::Closed) => break,
                };
                // one re-list covers every change already queued
                loop {
                    match changes.try_recv() {
                        Ok(event) => sequence = Some(event.sequence),
                        Err(TryRecvError::Lagged(_)) => continue,
                        Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                    }
                }

                let Some(manager) = manager.upgrade() else {
                    break;
                };
                match manager.list_devices(kind).await {
                    Ok(devices) => {
                        debug!("🔄 Device change {:?}: re-rendering {} list", sequence, kind);
                        render_device_list(&mut *view.lock(), &devices, config.label_fallback(kind));
                    }
                    Err(e) => warn!("⚠️ Could not re-list {} devices: {}", kind, e),
                }
            }
            debug!("{} watch finished", kind);
        });

        DeviceWatch { task }
    }

    fn audio_request(&self) -> MediaRequest<AudioConstraints> {
        if self.config.request_audio_with_camera {
            MediaRequest::Any
        } else {
            MediaRequest::Off
        }
    }
}

/// Guard returned by [`DevicePicker::watch`]; dropping it stops the updates
#[derive(Debug)]
pub struct DeviceWatch {
    task: JoinHandle<()>,
}

impl DeviceWatch {
    /// Stop updating the view
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Whether the background task is still running
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for DeviceWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}
