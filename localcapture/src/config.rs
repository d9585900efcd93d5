//! Configuration types and defaults

use crate::error::{LocalCaptureError, Result};
use localcapture_core::{DeviceKind, LabelFallback, VideoConstraints};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global localcapture configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Enable debug logging
    pub debug_logging: bool,
    /// Log filter directive, e.g. `localcapture=debug`; `RUST_LOG` applies
    /// when unset
    pub log_filter: Option<String>,
    /// Label shown for cameras whose label is withheld
    pub camera_label_fallback: LabelFallback,
    /// Label shown for microphones whose label is withheld
    pub microphone_label_fallback: LabelFallback,
    /// Label shown for speakers whose label is withheld
    pub speaker_label_fallback: LabelFallback,
    /// Request a microphone alongside every camera
    pub request_audio_with_camera: bool,
    /// Constraints applied when opening a camera without explicit bounds
    pub default_video: VideoConstraints,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            debug_logging: false,
            log_filter: None,
            camera_label_fallback: LabelFallback::KindAndId,
            microphone_label_fallback: LabelFallback::KindAndId,
            speaker_label_fallback: LabelFallback::KindAndId,
            request_audio_with_camera: true,
            default_video: VideoConstraints::default(),
        }
    }
}

impl GlobalConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.default_video.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LocalCaptureError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Placeholder policy for devices of `kind`
    pub fn label_fallback(&self, kind: DeviceKind) -> &LabelFallback {
        match kind {
            DeviceKind::VideoInput => &self.camera_label_fallback,
            DeviceKind::AudioInput => &self.microphone_label_fallback,
            DeviceKind::AudioOutput => &self.speaker_label_fallback,
        }
    }
}
