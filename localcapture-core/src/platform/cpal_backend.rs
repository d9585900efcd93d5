//! Native audio platform backed by cpal
//!
//! Enumerates the host's audio inputs and outputs and resolves audio
//! constraints against each input's supported configurations. Every acquired
//! track owns a cpal input stream running on its own thread (cpal streams
//! are not `Send`); captured blocks are published on a broadcast channel
//! obtained with [`CpalPlatform::subscribe_samples`]. Disabling a track
//! pauses its stream, stopping it drops the stream. cpal has no video or
//! display capture, so those requests fail with the matching platform
//! errors.

use super::{
    DeviceChangeEvent, MediaPlatform, PlatformStream, PlatformTrack,
    DEVICE_CHANGE_CHANNEL_CAPACITY,
};
use crate::capabilities::{resolve_audio, AudioCapabilities};
use crate::constraints::{ConstraintSpec, DeviceSelection, TrackConstraints};
use crate::device::{DeviceDescriptor, DeviceKind};
use crate::error::PlatformError;
use crate::track::{TrackKind, TrackSettings};
use async_trait::async_trait;
use chrono::Utc;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::mpsc as std_mpsc;
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

const COMMON_SAMPLE_RATES: [u32; 7] = [8_000, 16_000, 22_050, 32_000, 44_100, 48_000, 96_000];
const DEFAULT_SAMPLE_RATE: u32 = 48_000;
const DEFAULT_CHANNEL_COUNT: u16 = 1;

/// Captured blocks buffered per subscriber before it starts lagging
pub const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// One block of captured audio, interleaved samples in `[-1.0, 1.0]`
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    Play,
    Pause,
}

#[derive(Debug, Clone)]
struct CpalDevice {
    descriptor: DeviceDescriptor,
    capabilities: Option<AudioCapabilities>,
}

#[derive(Debug)]
struct CpalTrack {
    device_name: String,
    capabilities: AudioCapabilities,
    settings: TrackSettings,
    enabled: bool,
    // dropping the sender ends the stream thread
    control: std_mpsc::Sender<StreamCommand>,
    samples: broadcast::Sender<CapturedAudio>,
}

impl CpalTrack {
    fn send(&self, command: StreamCommand) {
        if self.control.send(command).is_err() {
            debug!("cpal stream of {} already closed", self.device_name);
        }
    }
}

#[derive(Debug, Default)]
struct CpalState {
    tracks: HashMap<String, CpalTrack>,
    last_snapshot: Vec<DeviceDescriptor>,
    next_id: u64,
    change_sequence: u64,
}

/// [`MediaPlatform`] over the default cpal host
#[derive(Debug)]
pub struct CpalPlatform {
    state: Mutex<CpalState>,
    change_tx: broadcast::Sender<DeviceChangeEvent>,
}

impl Default for CpalPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl CpalPlatform {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(DEVICE_CHANGE_CHANNEL_CAPACITY);
        info!("🎤 Using cpal host {}", cpal::default_host().id().name());
        Self {
            state: Mutex::new(CpalState::default()),
            change_tx,
        }
    }

    /// Whether a track is flowing samples, `None` for unknown tracks
    pub fn is_track_enabled(&self, track_id: &str) -> Option<bool> {
        self.state.lock().tracks.get(track_id).map(|t| t.enabled)
    }

    /// Receive the captured audio of a live track
    pub fn subscribe_samples(&self, track_id: &str) -> Option<broadcast::Receiver<CapturedAudio>> {
        self.state
            .lock()
            .tracks
            .get(track_id)
            .map(|t| t.samples.subscribe())
    }

    /// Re-enumerate and notify listeners if the device set changed
    ///
    /// cpal does not report hot-plug events, so hosts call this from their
    /// own event loop (e.g. on a system device notification).
    pub async fn refresh(&self) -> Result<bool, PlatformError> {
        let devices: Vec<DeviceDescriptor> = scan_devices()
            .await?
            .into_iter()
            .map(|d| d.descriptor)
            .collect();
        let sequence = {
            let mut state = self.state.lock();
            if state.last_snapshot == devices {
                return Ok(false);
            }
            state.last_snapshot = devices;
            state.change_sequence += 1;
            state.change_sequence
        };
        let _ = self.change_tx.send(DeviceChangeEvent {
            sequence,
            observed_at: Utc::now(),
        });
        Ok(true)
    }
}

async fn scan_devices() -> Result<Vec<CpalDevice>, PlatformError> {
    tokio::task::spawn_blocking(scan_devices_blocking)
        .await
        .map_err(|e| PlatformError::Aborted {
            message: format!("device scan task failed: {}", e),
        })?
}

fn scan_devices_blocking() -> Result<Vec<CpalDevice>, PlatformError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let inputs = host.input_devices().map_err(|e| PlatformError::Unavailable {
        message: format!("cannot list input devices: {}", e),
    })?;
    for device in inputs {
        let Ok(name) = device.name() else { continue };
        let capabilities = match device.supported_input_configs() {
            Ok(configs) => {
                let mut sample_rates = Vec::new();
                let mut channel_counts = Vec::new();
                for range in configs {
                    for rate in COMMON_SAMPLE_RATES {
                        if (range.min_sample_rate().0..=range.max_sample_rate().0).contains(&rate)
                            && !sample_rates.contains(&rate)
                        {
                            sample_rates.push(rate);
                        }
                    }
                    let channels = u32::from(range.channels());
                    if !channel_counts.contains(&channels) {
                        channel_counts.push(channels);
                    }
                }
                sample_rates.sort_unstable();
                channel_counts.sort_unstable();
                Some(AudioCapabilities {
                    sample_rates,
                    channel_counts,
                    echo_cancellation: false,
                })
            }
            Err(e) => {
                warn!("⚠️ Cannot query configurations of {}: {}", name, e);
                None
            }
        };
        devices.push(CpalDevice {
            descriptor: DeviceDescriptor::new(
                format!("{}:{}", DeviceKind::AudioInput, name),
                DeviceKind::AudioInput,
                name,
            ),
            capabilities,
        });
    }

    let outputs = host.output_devices().map_err(|e| PlatformError::Unavailable {
        message: format!("cannot list output devices: {}", e),
    })?;
    for device in outputs {
        let Ok(name) = device.name() else { continue };
        devices.push(CpalDevice {
            descriptor: DeviceDescriptor::new(
                format!("{}:{}", DeviceKind::AudioOutput, name),
                DeviceKind::AudioOutput,
                name,
            ),
            capabilities: None,
        });
    }

    debug!("🔍 cpal reported {} device(s)", devices.len());
    Ok(devices)
}

/// cpal stream configuration for resolved track settings
fn stream_config(settings: &TrackSettings) -> StreamConfig {
    StreamConfig {
        channels: settings
            .channel_count
            .and_then(|c| u16::try_from(c).ok())
            .unwrap_or(DEFAULT_CHANNEL_COUNT),
        sample_rate: cpal::SampleRate(settings.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE)),
        buffer_size: cpal::BufferSize::Default,
    }
}

fn to_f32_samples<T>(data: &[T]) -> Vec<f32>
where
    T: Sample,
    f32: FromSample<T>,
{
    data.iter().map(|sample| sample.to_sample::<f32>()).collect()
}

fn build_error(error: cpal::BuildStreamError) -> PlatformError {
    match error {
        cpal::BuildStreamError::DeviceNotAvailable => PlatformError::NotFound {
            kind: Some(TrackKind::Audio),
            message: "audio input disappeared".to_string(),
        },
        cpal::BuildStreamError::StreamConfigNotSupported => PlatformError::Overconstrained {
            kind: Some(TrackKind::Audio),
            constraint: "sampleRate".to_string(),
            message: "input rejected the stream configuration".to_string(),
        },
        other => PlatformError::NotReadable {
            message: format!("cannot open input stream: {}", other),
        },
    }
}

fn typed_input_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    samples: broadcast::Sender<CapturedAudio>,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels;
    let sample_rate = config.sample_rate.0;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if samples.receiver_count() == 0 {
                return;
            }
            let _ = samples.send(CapturedAudio {
                samples: to_f32_samples(data),
                channels,
                sample_rate,
            });
        },
        move |err| {
            error!("❌ Audio capture stream error: {}", err);
        },
        None,
    )
}

fn open_input_stream(
    device_name: &str,
    config: &StreamConfig,
    samples: broadcast::Sender<CapturedAudio>,
) -> Result<cpal::Stream, PlatformError> {
    let host = cpal::default_host();
    let device = host
        .input_devices()
        .map_err(|e| PlatformError::Unavailable {
            message: format!("cannot list input devices: {}", e),
        })?
        .find(|d| d.name().map_or(false, |name| name == device_name))
        .ok_or_else(|| PlatformError::NotFound {
            kind: Some(TrackKind::Audio),
            message: format!("audio input '{}' is gone", device_name),
        })?;

    let sample_format = device
        .supported_input_configs()
        .map_err(|e| PlatformError::NotReadable {
            message: format!("cannot query input configurations: {}", e),
        })?
        .find(|range| {
            range.channels() == config.channels
                && (range.min_sample_rate()..=range.max_sample_rate()).contains(&config.sample_rate)
        })
        .map(|range| range.sample_format())
        .ok_or_else(|| PlatformError::Overconstrained {
            kind: Some(TrackKind::Audio),
            constraint: "sampleRate".to_string(),
            message: format!(
                "{} Hz with {} channel(s) is not offered",
                config.sample_rate.0, config.channels
            ),
        })?;

    let stream = match sample_format {
        SampleFormat::F32 => typed_input_stream::<f32>(&device, config, samples),
        SampleFormat::I16 => typed_input_stream::<i16>(&device, config, samples),
        SampleFormat::U16 => typed_input_stream::<u16>(&device, config, samples),
        other => {
            return Err(PlatformError::NotReadable {
                message: format!("unsupported sample format {:?}", other),
            })
        }
    };
    stream.map_err(build_error)
}

/// Start the stream thread of one track and wait until it is running
async fn spawn_input_stream(
    device_name: String,
    settings: &TrackSettings,
    enabled: bool,
    samples: broadcast::Sender<CapturedAudio>,
) -> Result<std_mpsc::Sender<StreamCommand>, PlatformError> {
    let config = stream_config(settings);
    let (ready_tx, ready_rx) = oneshot::channel();
    let (control_tx, control_rx) = std_mpsc::channel();

    std::thread::Builder::new()
        .name(format!("cpal-input-{}", device_name))
        .spawn(move || {
            let stream = match open_input_stream(&device_name, &config, samples) {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            let started = if enabled { stream.play() } else { stream.pause() };
            if let Err(e) = started {
                let _ = ready_tx.send(Err(PlatformError::NotReadable {
                    message: format!("cannot start input stream: {}", e),
                }));
                return;
            }
            let _ = ready_tx.send(Ok(()));
            info!(
                "🎤 Capturing {} at {} Hz, {} channel(s)",
                device_name, config.sample_rate.0, config.channels
            );

            while let Ok(command) = control_rx.recv() {
                let result = match command {
                    StreamCommand::Play => stream.play().map_err(|e| e.to_string()),
                    StreamCommand::Pause => stream.pause().map_err(|e| e.to_string()),
                };
                if let Err(e) = result {
                    warn!("⚠️ {:?} failed on {}: {}", command, device_name, e);
                }
            }
            debug!("⏹️ Input stream of {} closed", device_name);
        })
        .map_err(|e| PlatformError::NotReadable {
            message: format!("cannot start capture thread: {}", e),
        })?;

    ready_rx.await.map_err(|_| PlatformError::Aborted {
        message: "capture thread exited before the stream started".to_string(),
    })??;
    Ok(control_tx)
}

#[async_trait]
impl MediaPlatform for CpalPlatform {
    fn name(&self) -> &str {
        "cpal"
    }

    async fn enumerate_devices(&self) -> Result<Vec<DeviceDescriptor>, PlatformError> {
        let devices: Vec<DeviceDescriptor> = scan_devices()
            .await?
            .into_iter()
            .map(|d| d.descriptor)
            .collect();
        self.state.lock().last_snapshot = devices.clone();
        Ok(devices)
    }

    async fn acquire_stream(
        &self,
        constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError> {
        if constraints.video().is_requested() {
            return Err(PlatformError::NotFound {
                kind: Some(TrackKind::Video),
                message: "cpal provides no video inputs".to_string(),
            });
        }
        let audio = constraints.audio().resolved().ok_or_else(|| PlatformError::TypeError {
            message: "no audio requested".to_string(),
        })?;

        let mut inputs: Vec<CpalDevice> = scan_devices()
            .await?
            .into_iter()
            .filter(|d| d.descriptor.kind == DeviceKind::AudioInput)
            .collect();
        if inputs.is_empty() {
            return Err(PlatformError::NotFound {
                kind: Some(TrackKind::Audio),
                message: "no audio input device".to_string(),
            });
        }
        inputs.retain(|d| audio.device.accepts(&d.descriptor.id));
        if inputs.is_empty() {
            return Err(PlatformError::Overconstrained {
                kind: Some(TrackKind::Audio),
                constraint: "deviceId".to_string(),
                message: "no audio input with that id".to_string(),
            });
        }
        if let DeviceSelection::Preferred(id) = &audio.device {
            inputs.sort_by_key(|d| d.descriptor.id != *id);
        }

        let mut first_failure = None;
        let mut chosen = None;
        for device in inputs {
            let Some(caps) = device.capabilities else {
                continue;
            };
            match resolve_audio(&caps, &audio) {
                Ok(settings) => {
                    chosen = Some((device.descriptor, caps, settings));
                    break;
                }
                Err(constraint) => {
                    first_failure.get_or_insert(constraint);
                }
            }
        }
        let Some((descriptor, capabilities, mut settings)) = chosen else {
            return Err(match first_failure {
                Some(constraint) => PlatformError::Overconstrained {
                    kind: Some(TrackKind::Audio),
                    constraint: constraint.to_string(),
                    message: format!("no input supports the requested {}", constraint),
                },
                None => PlatformError::NotReadable {
                    message: "no audio input reported usable configurations".to_string(),
                },
            });
        };
        settings.device_id = Some(descriptor.id.clone());

        let (samples, _) = broadcast::channel(SAMPLE_CHANNEL_CAPACITY);
        let control =
            spawn_input_stream(descriptor.label.clone(), &settings, true, samples.clone()).await?;

        let mut state = self.state.lock();
        state.next_id += 1;
        let track_id = format!("cpal-audio-{}", state.next_id);
        let stream_id = format!("cpal-stream-{}", state.next_id);
        state.tracks.insert(
            track_id.clone(),
            CpalTrack {
                device_name: descriptor.label.clone(),
                capabilities,
                settings: settings.clone(),
                enabled: true,
                control,
                samples,
            },
        );
        Ok(PlatformStream {
            id: stream_id,
            tracks: vec![PlatformTrack {
                id: track_id,
                kind: TrackKind::Audio,
                label: descriptor.label,
                settings,
            }],
        })
    }

    async fn acquire_display_stream(
        &self,
        _constraints: &ConstraintSpec,
    ) -> Result<PlatformStream, PlatformError> {
        Err(PlatformError::Unavailable {
            message: "cpal cannot capture displays".to_string(),
        })
    }

    async fn apply_track_constraints(
        &self,
        track_id: &str,
        constraints: &TrackConstraints,
    ) -> Result<TrackSettings, PlatformError> {
        let TrackConstraints::Audio(audio) = constraints else {
            return Err(PlatformError::TypeError {
                message: "video constraints applied to an audio track".to_string(),
            });
        };
        let (settings, reopen) = {
            let state = self.state.lock();
            let track = state
                .tracks
                .get(track_id)
                .ok_or_else(|| PlatformError::UnknownTrack {
                    track_id: track_id.to_string(),
                })?;
            if let Some(required) = audio.device.required_id() {
                if track.settings.device_id.as_deref() != Some(required) {
                    return Err(PlatformError::Overconstrained {
                        kind: Some(TrackKind::Audio),
                        constraint: "deviceId".to_string(),
                        message: "a live track cannot change device".to_string(),
                    });
                }
            }
            let mut settings =
                resolve_audio(&track.capabilities, audio).map_err(|constraint| {
                    PlatformError::Overconstrained {
                        kind: Some(TrackKind::Audio),
                        constraint: constraint.to_string(),
                        message: format!("device does not support the requested {}", constraint),
                    }
                })?;
            settings.device_id = track.settings.device_id.clone();
            let reopen = stream_config(&settings) != stream_config(&track.settings);
            let reopen = reopen.then(|| {
                (
                    track.device_name.clone(),
                    track.enabled,
                    track.samples.clone(),
                )
            });
            (settings, reopen)
        };

        // a new rate or channel layout needs a new stream; the old one keeps
        // running until the replacement is up
        let control = match reopen {
            Some((device_name, enabled, samples)) => {
                Some(spawn_input_stream(device_name, &settings, enabled, samples).await?)
            }
            None => None,
        };

        let mut state = self.state.lock();
        let track = state
            .tracks
            .get_mut(track_id)
            .ok_or_else(|| PlatformError::UnknownTrack {
                track_id: track_id.to_string(),
            })?;
        if let Some(control) = control {
            track.control = control;
        }
        track.settings = settings.clone();
        Ok(settings)
    }

    fn set_track_enabled(&self, track_id: &str, enabled: bool) {
        if let Some(track) = self.state.lock().tracks.get_mut(track_id) {
            track.enabled = enabled;
            track.send(if enabled {
                StreamCommand::Play
            } else {
                StreamCommand::Pause
            });
        }
    }

    fn stop_track(&self, track_id: &str) {
        if self.state.lock().tracks.remove(track_id).is_some() {
            debug!("⏹️ Released cpal track {}", track_id);
        }
    }

    fn device_changes(&self) -> broadcast::Receiver<DeviceChangeEvent> {
        self.change_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_follows_resolved_settings() {
        let settings = TrackSettings {
            sample_rate: Some(44_100),
            channel_count: Some(2),
            ..Default::default()
        };
        let config = stream_config(&settings);
        assert_eq!(config.sample_rate, cpal::SampleRate(44_100));
        assert_eq!(config.channels, 2);

        let config = stream_config(&TrackSettings::default());
        assert_eq!(config.sample_rate, cpal::SampleRate(DEFAULT_SAMPLE_RATE));
        assert_eq!(config.channels, DEFAULT_CHANNEL_COUNT);
    }

    #[test]
    fn test_integer_samples_are_normalized() {
        let signed = to_f32_samples(&[i16::MIN, 0]);
        assert_eq!(signed, vec![-1.0, 0.0]);

        let unsigned = to_f32_samples(&[0u16, 32_768]);
        assert_eq!(unsigned, vec![-1.0, 0.0]);
    }

    #[test]
    fn test_build_errors_keep_the_audio_kind() {
        let gone = build_error(cpal::BuildStreamError::DeviceNotAvailable);
        assert_eq!(gone.track_kind(), Some(TrackKind::Audio));
        assert!(matches!(gone, PlatformError::NotFound { .. }));

        let rejected = build_error(cpal::BuildStreamError::StreamConfigNotSupported);
        assert!(matches!(
            rejected,
            PlatformError::Overconstrained { ref constraint, .. } if constraint == "sampleRate"
        ));
    }

    #[test]
    fn test_unknown_track_has_no_sample_feed() {
        let platform = CpalPlatform {
            state: Mutex::new(CpalState::default()),
            change_tx: broadcast::channel(DEVICE_CHANGE_CHANNEL_CAPACITY).0,
        };
        assert!(platform.subscribe_samples("cpal-audio-1").is_none());
        assert!(platform.is_track_enabled("cpal-audio-1").is_none());
    }
}
