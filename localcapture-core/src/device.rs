//! Media device descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a media device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceKind {
    /// Camera or other video source
    #[serde(rename = "videoinput")]
    VideoInput,
    /// Microphone or other audio source
    #[serde(rename = "audioinput")]
    AudioInput,
    /// Speaker or headset output
    #[serde(rename = "audiooutput")]
    AudioOutput,
}

impl DeviceKind {
    /// Platform name of the kind (`videoinput`, `audioinput`, `audiooutput`)
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "videoinput",
            DeviceKind::AudioInput => "audioinput",
            DeviceKind::AudioOutput => "audiooutput",
        }
    }

    /// Human-readable noun used when a device has no label
    pub fn noun(&self) -> &'static str {
        match self {
            DeviceKind::VideoInput => "Camera",
            DeviceKind::AudioInput => "Microphone",
            DeviceKind::AudioOutput => "Speaker",
        }
    }

    /// Check if devices of this kind can be captured from
    pub fn is_input(&self) -> bool {
        !matches!(self, DeviceKind::AudioOutput)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one device as reported by the platform
///
/// Descriptors are immutable and go stale as soon as the platform reports a
/// device change; callers re-list instead of holding on to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Opaque device handle
    #[serde(rename = "deviceId")]
    pub id: String,
    /// Device kind
    pub kind: DeviceKind,
    /// Human-readable label, empty until permission has been granted
    #[serde(default)]
    pub label: String,
    /// Identifier shared by devices on the same physical unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DeviceDescriptor {
    /// Create a new descriptor
    pub fn new(id: impl Into<String>, kind: DeviceKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            group_id: None,
        }
    }

    /// Attach a group id
    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }

    /// Check if the platform withheld the label
    pub fn has_label(&self) -> bool {
        !self.label.trim().is_empty()
    }

    /// Same descriptor without its label, as reported before permission
    pub fn redacted(&self) -> Self {
        Self {
            label: String::new(),
            ..self.clone()
        }
    }
}

/// Keep only descriptors of the given kind, preserving platform order
pub fn filter_by_kind(devices: Vec<DeviceDescriptor>, kind: DeviceKind) -> Vec<DeviceDescriptor> {
    devices.into_iter().filter(|d| d.kind == kind).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_serializes_with_platform_names() {
        let device = DeviceDescriptor::new("cam1", DeviceKind::VideoInput, "Front");
        let json = serde_json::to_value(&device).unwrap();

        assert_eq!(json["deviceId"], "cam1");
        assert_eq!(json["kind"], "videoinput");
        assert_eq!(json["label"], "Front");
        assert!(json.get("groupId").is_none());
    }

    #[test]
    fn test_filter_preserves_order() {
        let devices = vec![
            DeviceDescriptor::new("cam1", DeviceKind::VideoInput, "Front"),
            DeviceDescriptor::new("mic1", DeviceKind::AudioInput, "Built-in"),
            DeviceDescriptor::new("cam2", DeviceKind::VideoInput, "Back"),
        ];

        let cameras = filter_by_kind(devices, DeviceKind::VideoInput);
        let ids: Vec<_> = cameras.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["cam1", "cam2"]);
    }

    #[test]
    fn test_redacted_descriptor_has_no_label() {
        let device = DeviceDescriptor::new("mic1", DeviceKind::AudioInput, "Headset")
            .with_group("usb-1");
        let redacted = device.redacted();

        assert!(!redacted.has_label());
        assert_eq!(redacted.group_id.as_deref(), Some("usb-1"));
    }
}
