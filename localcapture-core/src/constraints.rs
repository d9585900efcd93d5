//! Capture constraints
//!
//! A [`ConstraintSpec`] describes what a caller wants from an acquisition:
//! per media kind it is either not requested, requested with any
//! parameters, or requested with a set of bounded parameters. Bounds are
//! tagged ([`Constrain::Exact`] or a min/ideal/max [`Constrain::Range`]) and
//! validated when they are built, so malformed requests never reach the
//! platform.
//!
//! The JSON form follows the usual capture-constraint shape:
//!
//! ```json
//! { "video": { "deviceId": { "exact": "cam1" }, "width": { "min": 1280 } },
//!   "audio": true }
//! ```

use crate::error::{CaptureError, CaptureResult};
use crate::track::TrackKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types that can be bounded by a [`Constrain`]
pub trait ConstrainValue:
    Copy + PartialOrd + fmt::Display + fmt::Debug + Serialize + DeserializeOwned
{
    /// Check if the value is usable as a bound
    fn is_valid_bound(&self) -> bool;
    /// Numeric view used for distance calculations
    fn as_f64(&self) -> f64;
}

impl ConstrainValue for u32 {
    fn is_valid_bound(&self) -> bool {
        true
    }

    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

impl ConstrainValue for f64 {
    fn is_valid_bound(&self) -> bool {
        self.is_finite() && *self >= 0.0
    }

    fn as_f64(&self) -> f64 {
        *self
    }
}

/// Bound on one numeric capture parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ConstrainRepr<T>",
    into = "ConstrainRepr<T>",
    bound = "T: ConstrainValue"
)]
pub enum Constrain<T> {
    /// The parameter must equal this value
    Exact(T),
    /// The parameter must fall within `[min, max]`, as close to `ideal` as
    /// the platform can manage
    Range {
        /// Lower hard bound
        min: Option<T>,
        /// Preferred value, never a hard bound
        ideal: Option<T>,
        /// Upper hard bound
        max: Option<T>,
    },
}

impl<T: ConstrainValue> Constrain<T> {
    /// Require an exact value
    pub fn exact(value: T) -> Self {
        Constrain::Exact(value)
    }

    /// Prefer a value without requiring it
    pub fn ideal(value: T) -> Self {
        Constrain::Range {
            min: None,
            ideal: Some(value),
            max: None,
        }
    }

    /// Require at least `min`
    pub fn at_least(min: T) -> Self {
        Constrain::Range {
            min: Some(min),
            ideal: None,
            max: None,
        }
    }

    /// Require at most `max`
    pub fn at_most(max: T) -> Self {
        Constrain::Range {
            min: None,
            ideal: None,
            max: Some(max),
        }
    }

    /// Build a validated min/ideal/max range
    pub fn range(min: Option<T>, ideal: Option<T>, max: Option<T>) -> CaptureResult<Self> {
        let bound = Constrain::Range { min, ideal, max };
        bound.validate("range")?;
        Ok(bound)
    }

    /// Check the bound is well formed
    ///
    /// `name` identifies the parameter in the error message.
    pub fn validate(&self, name: &str) -> CaptureResult<()> {
        match *self {
            Constrain::Exact(value) => {
                if !value.is_valid_bound() {
                    return Err(CaptureError::invalid_constraint(format!(
                        "{}: exact value {} is not a valid bound",
                        name, value
                    )));
                }
            }
            Constrain::Range { min, ideal, max } => {
                if min.is_none() && ideal.is_none() && max.is_none() {
                    return Err(CaptureError::invalid_constraint(format!(
                        "{}: range has no min, ideal or max",
                        name
                    )));
                }
                for value in [min, ideal, max].into_iter().flatten() {
                    if !value.is_valid_bound() {
                        return Err(CaptureError::invalid_constraint(format!(
                            "{}: {} is not a valid bound",
                            name, value
                        )));
                    }
                }
                if let (Some(min), Some(max)) = (min, max) {
                    if min > max {
                        return Err(CaptureError::invalid_constraint(format!(
                            "{}: min {} exceeds max {}",
                            name, min, max
                        )));
                    }
                }
                if let Some(ideal) = ideal {
                    let below = min.is_some_and(|min| ideal < min);
                    let above = max.is_some_and(|max| ideal > max);
                    if below || above {
                        return Err(CaptureError::invalid_constraint(format!(
                            "{}: ideal {} lies outside [min, max]",
                            name, ideal
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check if `value` meets the hard part of the bound
    pub fn is_satisfied_by(&self, value: T) -> bool {
        match *self {
            Constrain::Exact(exact) => value == exact,
            Constrain::Range { min, max, .. } => {
                min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
            }
        }
    }

    /// Value the platform should aim for, if any
    pub fn target(&self) -> Option<T> {
        match *self {
            Constrain::Exact(exact) => Some(exact),
            Constrain::Range { ideal, .. } => ideal,
        }
    }

    /// Relative distance between `value` and the target, 0.0 when there is none
    pub fn fitness_distance(&self, value: T) -> f64 {
        match self.target() {
            Some(target) => {
                let (value, target) = (value.as_f64(), target.as_f64());
                let scale = value.abs().max(target.abs());
                if scale == 0.0 {
                    0.0
                } else {
                    (value - target).abs() / scale
                }
            }
            None => 0.0,
        }
    }

    /// Check if the bound carries an exact value or a minimum
    pub fn has_exact_or_min(&self) -> bool {
        matches!(
            self,
            Constrain::Exact(_) | Constrain::Range { min: Some(_), .. }
        )
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConstrainRepr<T> {
    Bare(T),
    Record(BoundsRecord<T>),
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "T: Deserialize<'de>"))]
struct BoundsRecord<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exact: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    min: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ideal: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max: Option<T>,
}

impl<T: ConstrainValue> TryFrom<ConstrainRepr<T>> for Constrain<T> {
    type Error = CaptureError;

    fn try_from(repr: ConstrainRepr<T>) -> Result<Self, Self::Error> {
        let bound = match repr {
            ConstrainRepr::Bare(value) => Constrain::ideal(value),
            ConstrainRepr::Record(BoundsRecord {
                exact: Some(exact),
                min: None,
                ideal: None,
                max: None,
            }) => Constrain::Exact(exact),
            ConstrainRepr::Record(BoundsRecord { exact: Some(_), .. }) => {
                return Err(CaptureError::invalid_constraint(
                    "exact cannot be combined with min, ideal or max",
                ))
            }
            ConstrainRepr::Record(BoundsRecord { min, ideal, max, .. }) => {
                Constrain::Range { min, ideal, max }
            }
        };
        bound.validate("bound")?;
        Ok(bound)
    }
}

impl<T> From<Constrain<T>> for ConstrainRepr<T> {
    fn from(bound: Constrain<T>) -> Self {
        match bound {
            Constrain::Exact(exact) => ConstrainRepr::Record(BoundsRecord {
                exact: Some(exact),
                min: None,
                ideal: None,
                max: None,
            }),
            Constrain::Range { min, ideal, max } => ConstrainRepr::Record(BoundsRecord {
                exact: None,
                min,
                ideal,
                max,
            }),
        }
    }
}

/// Bound on a boolean capture parameter such as echo cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ConstrainBoolRepr", into = "ConstrainBoolRepr")]
pub enum ConstrainBool {
    /// The parameter must have this value
    Exact(bool),
    /// The parameter should have this value if supported
    Ideal(bool),
}

impl ConstrainBool {
    /// Check if a device setting meets the bound
    pub fn is_satisfied_by(&self, value: bool) -> bool {
        match *self {
            ConstrainBool::Exact(exact) => exact == value,
            ConstrainBool::Ideal(_) => true,
        }
    }

    /// Value the platform should aim for
    pub fn target(&self) -> bool {
        match *self {
            ConstrainBool::Exact(value) | ConstrainBool::Ideal(value) => value,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ConstrainBoolRepr {
    Bare(bool),
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ideal: Option<bool>,
    },
}

impl TryFrom<ConstrainBoolRepr> for ConstrainBool {
    type Error = CaptureError;

    fn try_from(repr: ConstrainBoolRepr) -> Result<Self, Self::Error> {
        match repr {
            ConstrainBoolRepr::Bare(value) => Ok(ConstrainBool::Ideal(value)),
            ConstrainBoolRepr::Record {
                exact: Some(value),
                ideal: None,
            } => Ok(ConstrainBool::Exact(value)),
            ConstrainBoolRepr::Record {
                exact: None,
                ideal: Some(value),
            } => Ok(ConstrainBool::Ideal(value)),
            ConstrainBoolRepr::Record { .. } => Err(CaptureError::invalid_constraint(
                "boolean bound needs exactly one of exact or ideal",
            )),
        }
    }
}

impl From<ConstrainBool> for ConstrainBoolRepr {
    fn from(bound: ConstrainBool) -> Self {
        match bound {
            ConstrainBool::Exact(value) => ConstrainBoolRepr::Record {
                exact: Some(value),
                ideal: None,
            },
            ConstrainBool::Ideal(value) => ConstrainBoolRepr::Record {
                exact: None,
                ideal: Some(value),
            },
        }
    }
}

/// Which device an acquisition should use
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "DeviceSelectionRepr", into = "DeviceSelectionRepr")]
pub enum DeviceSelection {
    /// Let the platform pick its default device
    #[default]
    Default,
    /// Use exactly this device or fail
    Exact(String),
    /// Prefer this device, fall back to any other
    Preferred(String),
}

impl DeviceSelection {
    /// Check if no device id is constrained
    pub fn is_default(&self) -> bool {
        matches!(self, DeviceSelection::Default)
    }

    /// Device id the acquisition must use
    pub fn required_id(&self) -> Option<&str> {
        match self {
            DeviceSelection::Exact(id) => Some(id),
            _ => None,
        }
    }

    /// Device id named by the selection, pinned or preferred
    pub fn device_id(&self) -> Option<&str> {
        match self {
            DeviceSelection::Default => None,
            DeviceSelection::Exact(id) | DeviceSelection::Preferred(id) => Some(id),
        }
    }

    /// Check if the device with `id` is acceptable
    pub fn accepts(&self, id: &str) -> bool {
        self.required_id().map_or(true, |required| required == id)
    }

    fn validate(&self) -> CaptureResult<()> {
        match self.device_id() {
            Some(id) if id.trim().is_empty() => Err(CaptureError::invalid_constraint(
                "deviceId: device id must not be empty",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DeviceSelectionRepr {
    Bare(String),
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exact: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ideal: Option<String>,
    },
}

impl TryFrom<DeviceSelectionRepr> for DeviceSelection {
    type Error = CaptureError;

    fn try_from(repr: DeviceSelectionRepr) -> Result<Self, Self::Error> {
        let selection = match repr {
            DeviceSelectionRepr::Bare(id) => DeviceSelection::Preferred(id),
            DeviceSelectionRepr::Record {
                exact: Some(id),
                ideal: None,
            } => DeviceSelection::Exact(id),
            DeviceSelectionRepr::Record {
                exact: None,
                ideal: Some(id),
            } => DeviceSelection::Preferred(id),
            DeviceSelectionRepr::Record {
                exact: None,
                ideal: None,
            } => DeviceSelection::Default,
            DeviceSelectionRepr::Record { .. } => {
                return Err(CaptureError::invalid_constraint(
                    "deviceId: exact and ideal cannot both be set",
                ))
            }
        };
        selection.validate()?;
        Ok(selection)
    }
}

impl From<DeviceSelection> for DeviceSelectionRepr {
    fn from(selection: DeviceSelection) -> Self {
        match selection {
            DeviceSelection::Default => DeviceSelectionRepr::Record {
                exact: None,
                ideal: None,
            },
            DeviceSelection::Exact(id) => DeviceSelectionRepr::Record {
                exact: Some(id),
                ideal: None,
            },
            DeviceSelection::Preferred(id) => DeviceSelectionRepr::Record {
                exact: None,
                ideal: Some(id),
            },
        }
    }
}

/// Video track parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VideoConstraints {
    /// Device selection policy
    #[serde(
        rename = "deviceId",
        default,
        skip_serializing_if = "DeviceSelection::is_default"
    )]
    pub device: DeviceSelection,
    /// Frame width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Constrain<u32>>,
    /// Frame height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Constrain<u32>>,
    /// Frames per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_rate: Option<Constrain<f64>>,
}

impl VideoConstraints {
    /// Empty constraints, any camera at any resolution
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device selection policy
    pub fn device(mut self, device: DeviceSelection) -> Self {
        self.device = device;
        self
    }

    /// Pin the camera by id
    pub fn exact_device(self, id: impl Into<String>) -> Self {
        self.device(DeviceSelection::Exact(id.into()))
    }

    /// Prefer a camera by id
    pub fn preferred_device(self, id: impl Into<String>) -> Self {
        self.device(DeviceSelection::Preferred(id.into()))
    }

    /// Bound the frame width
    pub fn width(mut self, width: Constrain<u32>) -> Self {
        self.width = Some(width);
        self
    }

    /// Bound the frame height
    pub fn height(mut self, height: Constrain<u32>) -> Self {
        self.height = Some(height);
        self
    }

    /// Bound the frame rate
    pub fn frame_rate(mut self, frame_rate: Constrain<f64>) -> Self {
        self.frame_rate = Some(frame_rate);
        self
    }

    /// Validate every bound
    pub fn validate(&self) -> CaptureResult<()> {
        self.device.validate()?;
        if let Some(width) = &self.width {
            width.validate("width")?;
        }
        if let Some(height) = &self.height {
            height.validate("height")?;
        }
        if let Some(frame_rate) = &self.frame_rate {
            frame_rate.validate("frameRate")?;
        }
        Ok(())
    }

    fn has_exact_or_min(&self) -> bool {
        self.width.is_some_and(|b| b.has_exact_or_min())
            || self.height.is_some_and(|b| b.has_exact_or_min())
            || self.frame_rate.is_some_and(|b| b.has_exact_or_min())
    }
}

/// Audio track parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AudioConstraints {
    /// Device selection policy
    #[serde(
        rename = "deviceId",
        default,
        skip_serializing_if = "DeviceSelection::is_default"
    )]
    pub device: DeviceSelection,
    /// Echo cancellation processing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub echo_cancellation: Option<ConstrainBool>,
    /// Sample rate in Hz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<Constrain<u32>>,
    /// Number of channels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_count: Option<Constrain<u32>>,
}

impl AudioConstraints {
    /// Empty constraints, any microphone
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device selection policy
    pub fn device(mut self, device: DeviceSelection) -> Self {
        self.device = device;
        self
    }

    /// Pin the microphone by id
    pub fn exact_device(self, id: impl Into<String>) -> Self {
        self.device(DeviceSelection::Exact(id.into()))
    }

    /// Bound echo cancellation
    pub fn echo_cancellation(mut self, bound: ConstrainBool) -> Self {
        self.echo_cancellation = Some(bound);
        self
    }

    /// Bound the sample rate
    pub fn sample_rate(mut self, sample_rate: Constrain<u32>) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Bound the channel count
    pub fn channel_count(mut self, channel_count: Constrain<u32>) -> Self {
        self.channel_count = Some(channel_count);
        self
    }

    /// Validate every bound
    pub fn validate(&self) -> CaptureResult<()> {
        self.device.validate()?;
        if let Some(sample_rate) = &self.sample_rate {
            sample_rate.validate("sampleRate")?;
        }
        if let Some(channel_count) = &self.channel_count {
            channel_count.validate("channelCount")?;
            if let Constrain::Exact(0) = channel_count {
                return Err(CaptureError::invalid_constraint(
                    "channelCount: exact channel count must be positive",
                ));
            }
        }
        Ok(())
    }

    fn has_exact_or_min(&self) -> bool {
        matches!(self.echo_cancellation, Some(ConstrainBool::Exact(_)))
            || self.sample_rate.is_some_and(|b| b.has_exact_or_min())
            || self.channel_count.is_some_and(|b| b.has_exact_or_min())
    }
}

/// Per-kind request: not requested, requested with any parameters, or
/// requested with explicit constraints
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    from = "MediaRequestRepr<C>",
    into = "MediaRequestRepr<C>",
    bound = "C: Clone + Serialize + DeserializeOwned"
)]
pub enum MediaRequest<C> {
    /// Kind not requested
    #[default]
    Off,
    /// Kind requested with platform defaults
    Any,
    /// Kind requested with explicit constraints
    Constrained(C),
}

impl<C> MediaRequest<C> {
    /// Check if the kind is requested at all
    pub fn is_requested(&self) -> bool {
        !matches!(self, MediaRequest::Off)
    }

    /// Explicit constraints, if any
    pub fn constraints(&self) -> Option<&C> {
        match self {
            MediaRequest::Constrained(constraints) => Some(constraints),
            _ => None,
        }
    }
}

impl<C: Default + Clone> MediaRequest<C> {
    /// Constraints to hand to the platform, empty for [`MediaRequest::Any`]
    pub fn resolved(&self) -> Option<C> {
        match self {
            MediaRequest::Off => None,
            MediaRequest::Any => Some(C::default()),
            MediaRequest::Constrained(constraints) => Some(constraints.clone()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum MediaRequestRepr<C> {
    Flag(bool),
    Constraints(C),
}

impl<C> From<MediaRequestRepr<C>> for MediaRequest<C> {
    fn from(repr: MediaRequestRepr<C>) -> Self {
        match repr {
            MediaRequestRepr::Flag(false) => MediaRequest::Off,
            MediaRequestRepr::Flag(true) => MediaRequest::Any,
            MediaRequestRepr::Constraints(constraints) => MediaRequest::Constrained(constraints),
        }
    }
}

impl<C> From<MediaRequest<C>> for MediaRequestRepr<C> {
    fn from(request: MediaRequest<C>) -> Self {
        match request {
            MediaRequest::Off => MediaRequestRepr::Flag(false),
            MediaRequest::Any => MediaRequestRepr::Flag(true),
            MediaRequest::Constrained(constraints) => MediaRequestRepr::Constraints(constraints),
        }
    }
}

/// Full acquisition request
///
/// Construction through [`ConstraintSpec::new`] or deserialization
/// guarantees that at least one kind is requested and every bound is well
/// formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConstraintSpecRepr", into = "ConstraintSpecRepr")]
pub struct ConstraintSpec {
    audio: MediaRequest<AudioConstraints>,
    video: MediaRequest<VideoConstraints>,
}

impl ConstraintSpec {
    /// Build a validated request
    pub fn new(
        audio: MediaRequest<AudioConstraints>,
        video: MediaRequest<VideoConstraints>,
    ) -> CaptureResult<Self> {
        let spec = Self { audio, video };
        spec.validate()?;
        Ok(spec)
    }

    /// Any camera and any microphone
    pub fn camera_and_microphone() -> Self {
        Self {
            audio: MediaRequest::Any,
            video: MediaRequest::Any,
        }
    }

    /// Video with explicit constraints, no audio
    pub fn video_only(video: VideoConstraints) -> CaptureResult<Self> {
        Self::new(MediaRequest::Off, MediaRequest::Constrained(video))
    }

    /// Audio with explicit constraints, no video
    pub fn audio_only(audio: AudioConstraints) -> CaptureResult<Self> {
        Self::new(MediaRequest::Constrained(audio), MediaRequest::Off)
    }

    /// Audio part of the request
    pub fn audio(&self) -> &MediaRequest<AudioConstraints> {
        &self.audio
    }

    /// Video part of the request
    pub fn video(&self) -> &MediaRequest<VideoConstraints> {
        &self.video
    }

    /// Check if the request asks for tracks of `kind`
    pub fn requests(&self, kind: TrackKind) -> bool {
        match kind {
            TrackKind::Audio => self.audio.is_requested(),
            TrackKind::Video => self.video.is_requested(),
        }
    }

    /// Check the request is meaningful and every bound is well formed
    pub fn validate(&self) -> CaptureResult<()> {
        if !self.audio.is_requested() && !self.video.is_requested() {
            return Err(CaptureError::invalid_constraint(
                "at least one of audio or video must be requested",
            ));
        }
        if let Some(audio) = self.audio.constraints() {
            audio.validate()?;
        }
        if let Some(video) = self.video.constraints() {
            video.validate()?;
        }
        Ok(())
    }

    /// Additional rules for display capture
    ///
    /// Display capture always produces video, cannot be pointed at a device,
    /// and only accepts `ideal` and `max` bounds.
    pub fn validate_for_display(&self) -> CaptureResult<()> {
        self.validate()?;
        if !self.video.is_requested() {
            return Err(CaptureError::invalid_constraint(
                "display capture requires video",
            ));
        }
        let pins_device = self.video.constraints().is_some_and(|v| !v.device.is_default())
            || self.audio.constraints().is_some_and(|a| !a.device.is_default());
        if pins_device {
            return Err(CaptureError::invalid_constraint(
                "display capture does not accept a device selection",
            ));
        }
        let has_lower_bound = self.video.constraints().is_some_and(|v| v.has_exact_or_min())
            || self.audio.constraints().is_some_and(|a| a.has_exact_or_min());
        if has_lower_bound {
            return Err(CaptureError::invalid_constraint(
                "display capture only accepts ideal and max bounds",
            ));
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct ConstraintSpecRepr {
    #[serde(default)]
    audio: MediaRequest<AudioConstraints>,
    #[serde(default)]
    video: MediaRequest<VideoConstraints>,
}

impl TryFrom<ConstraintSpecRepr> for ConstraintSpec {
    type Error = CaptureError;

    fn try_from(repr: ConstraintSpecRepr) -> Result<Self, Self::Error> {
        ConstraintSpec::new(repr.audio, repr.video)
    }
}

impl From<ConstraintSpec> for ConstraintSpecRepr {
    fn from(spec: ConstraintSpec) -> Self {
        Self {
            audio: spec.audio,
            video: spec.video,
        }
    }
}

/// Constraints applied to one live track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackConstraints {
    /// Audio track parameters
    Audio(AudioConstraints),
    /// Video track parameters
    Video(VideoConstraints),
}

impl TrackConstraints {
    /// Kind of track these constraints apply to
    pub fn kind(&self) -> TrackKind {
        match self {
            TrackConstraints::Audio(_) => TrackKind::Audio,
            TrackConstraints::Video(_) => TrackKind::Video,
        }
    }

    /// Validate every bound
    pub fn validate(&self) -> CaptureResult<()> {
        match self {
            TrackConstraints::Audio(audio) => audio.validate(),
            TrackConstraints::Video(video) => video.validate(),
        }
    }

    /// Device selection carried by the constraints
    pub fn device(&self) -> &DeviceSelection {
        match self {
            TrackConstraints::Audio(audio) => &audio.device,
            TrackConstraints::Video(video) => &video.device,
        }
    }
}
