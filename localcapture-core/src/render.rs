//! Rendering boundary
//!
//! The library never owns a display surface. Acquired streams are handed to
//! a [`StreamSink`] (a video element, a preview window) and device lists to a
//! [`DeviceListView`] (a select box, a menu). Data always flows in
//! explicitly; nothing here caches device lists.

use crate::device::{DeviceDescriptor, DeviceKind};
use crate::session::{MediaSession, SessionId};
use crate::track::TrackKind;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Track summary handed to a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundTrack {
    pub id: String,
    pub kind: TrackKind,
    pub label: String,
    pub enabled: bool,
}

/// Stream handed to a sink for playback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamBinding {
    pub session_id: SessionId,
    pub stream_id: String,
    pub tracks: Vec<BoundTrack>,
}

impl StreamBinding {
    /// Describe an active session
    pub fn from_session(session: &MediaSession) -> Self {
        Self {
            session_id: session.id(),
            stream_id: session.stream_id().to_string(),
            tracks: session
                .tracks()
                .iter()
                .map(|t| BoundTrack {
                    id: t.id().to_string(),
                    kind: t.kind(),
                    label: t.label().to_string(),
                    enabled: t.is_enabled(),
                })
                .collect(),
        }
    }

    /// Check if the stream carries video
    pub fn has_video(&self) -> bool {
        self.tracks.iter().any(|t| t.kind == TrackKind::Video)
    }
}

/// Playback surface accepting a stream
pub trait StreamSink: Send {
    /// Start playing `binding`, replacing whatever was bound before
    fn bind(&mut self, binding: StreamBinding);

    /// Stop playback
    fn unbind(&mut self) {}
}

/// Selectable entry of a device list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOption {
    /// Text shown to the user
    pub label: String,
    /// Device id submitted on selection
    pub value: String,
}

/// Text used for devices whose label is withheld
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelFallback {
    /// Same text for every unlabeled device
    Fixed(String),
    /// Kind noun followed by the device id, e.g. `Camera cam1`
    #[default]
    KindAndId,
}

impl LabelFallback {
    /// Placeholder label for `device`
    pub fn label_for(&self, device: &DeviceDescriptor) -> String {
        match self {
            LabelFallback::Fixed(text) => text.clone(),
            LabelFallback::KindAndId => format!("{} {}", device.kind.noun(), device.id),
        }
    }
}

/// Map descriptors to label/value pairs, substituting placeholders for
/// empty labels
pub fn device_options(devices: &[DeviceDescriptor], fallback: &LabelFallback) -> Vec<DeviceOption> {
    devices
        .iter()
        .map(|device| DeviceOption {
            label: if device.has_label() {
                device.label.clone()
            } else {
                fallback.label_for(device)
            },
            value: device.id.clone(),
        })
        .collect()
}

/// Surface displaying a list of selectable devices
pub trait DeviceListView: Send {
    /// Replace the displayed entries
    fn populate(&mut self, options: Vec<DeviceOption>);
}

/// Render `devices` into `view`
pub fn render_device_list(
    view: &mut dyn DeviceListView,
    devices: &[DeviceDescriptor],
    fallback: &LabelFallback,
) {
    let options = device_options(devices, fallback);
    debug!("🖥️ Rendering {} device option(s)", options.len());
    view.populate(options);
}

/// Sink that remembers what it was given
#[derive(Debug, Default)]
pub struct RecordingSink {
    current: Option<StreamBinding>,
    binds: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream currently bound
    pub fn current(&self) -> Option<&StreamBinding> {
        self.current.as_ref()
    }

    /// Number of bind calls received
    pub fn bind_count(&self) -> usize {
        self.binds
    }
}

impl StreamSink for RecordingSink {
    fn bind(&mut self, binding: StreamBinding) {
        self.binds += 1;
        self.current = Some(binding);
    }

    fn unbind(&mut self) {
        self.current = None;
    }
}

/// Device list kept in memory, one per device kind
#[derive(Debug, Clone)]
pub struct MemoryDeviceList {
    kind: DeviceKind,
    options: Vec<DeviceOption>,
    renders: usize,
}

impl MemoryDeviceList {
    pub fn new(kind: DeviceKind) -> Self {
        Self {
            kind,
            options: Vec::new(),
            renders: 0,
        }
    }

    /// Kind of device listed
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Entries currently displayed
    pub fn options(&self) -> &[DeviceOption] {
        &self.options
    }

    /// Number of times the list was repopulated
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

impl DeviceListView for MemoryDeviceList {
    fn populate(&mut self, options: Vec<DeviceOption>) {
        self.renders += 1;
        self.options = options;
    }
}
