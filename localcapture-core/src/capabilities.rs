//! Device capabilities and settings resolution
//!
//! Backends describe what a device can do with [`VideoCapabilities`] or
//! [`AudioCapabilities`]; the `resolve_*` functions pick the concrete
//! settings a track runs with for a given set of constraints. Hard bounds
//! filter the candidates, then the candidate closest to the targets wins.
//! Parameters without a target are steered towards the platform defaults
//! (640x480 at 30 fps, 48 kHz mono with echo cancellation).

use crate::constraints::{AudioConstraints, Constrain, VideoConstraints};
use crate::track::TrackSettings;
use serde::{Deserialize, Serialize};

/// Video resolution information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoResolution {
    pub width: u32,
    pub height: u32,
}

impl VideoResolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const VGA: Self = Self::new(640, 480);
    pub const HD: Self = Self::new(1280, 720);
    pub const FULL_HD: Self = Self::new(1920, 1080);

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Modes a video source supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoCapabilities {
    pub resolutions: Vec<VideoResolution>,
    pub frame_rates: Vec<f64>,
}

impl Default for VideoCapabilities {
    fn default() -> Self {
        Self {
            resolutions: vec![
                VideoResolution::VGA,
                VideoResolution::HD,
                VideoResolution::FULL_HD,
            ],
            frame_rates: vec![15.0, 30.0],
        }
    }
}

/// Modes an audio source supports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioCapabilities {
    pub sample_rates: Vec<u32>,
    pub channel_counts: Vec<u32>,
    pub echo_cancellation: bool,
}

impl Default for AudioCapabilities {
    fn default() -> Self {
        Self {
            sample_rates: vec![44_100, 48_000],
            channel_counts: vec![1, 2],
            echo_cancellation: true,
        }
    }
}

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_FRAME_RATE: f64 = 30.0;
const DEFAULT_SAMPLE_RATE: u32 = 48_000;
const DEFAULT_CHANNEL_COUNT: u32 = 1;

/// Name of the first constraint no candidate could satisfy
pub type UnsatisfiedConstraint = &'static str;

fn distance<T: crate::constraints::ConstrainValue>(
    bound: Option<&Constrain<T>>,
    value: T,
    default: T,
) -> f64 {
    match bound {
        Some(bound) if bound.target().is_some() => bound.fitness_distance(value),
        _ => Constrain::ideal(default).fitness_distance(value),
    }
}

fn satisfies<T: crate::constraints::ConstrainValue>(bound: Option<&Constrain<T>>, value: T) -> bool {
    bound.map_or(true, |bound| bound.is_satisfied_by(value))
}

/// Pick the video mode for `constraints`
///
/// Ties are broken towards the larger resolution, then the higher frame
/// rate.
pub fn resolve_video(
    caps: &VideoCapabilities,
    constraints: &VideoConstraints,
) -> Result<TrackSettings, UnsatisfiedConstraint> {
    let width = constraints.width.as_ref();
    let height = constraints.height.as_ref();
    let frame_rate = constraints.frame_rate.as_ref();

    let by_width: Vec<_> = caps
        .resolutions
        .iter()
        .filter(|r| satisfies(width, r.width))
        .collect();
    if by_width.is_empty() {
        return Err("width");
    }
    let by_size: Vec<_> = by_width
        .into_iter()
        .filter(|r| satisfies(height, r.height))
        .collect();
    if by_size.is_empty() {
        return Err("height");
    }
    let rates: Vec<f64> = caps
        .frame_rates
        .iter()
        .copied()
        .filter(|fps| satisfies(frame_rate, *fps))
        .collect();
    if rates.is_empty() {
        return Err("frameRate");
    }

    let mut best: Option<(f64, VideoResolution, f64)> = None;
    for resolution in by_size {
        for &fps in &rates {
            let score = distance(width, resolution.width, DEFAULT_WIDTH)
                + distance(height, resolution.height, DEFAULT_HEIGHT)
                + distance(frame_rate, fps, DEFAULT_FRAME_RATE);
            let better = match best {
                None => true,
                Some((best_score, best_res, best_fps)) => {
                    score < best_score
                        || (score == best_score
                            && (resolution.pixel_count(), fps)
                                > (best_res.pixel_count(), best_fps))
                }
            };
            if better {
                best = Some((score, *resolution, fps));
            }
        }
    }

    // both candidate lists are non-empty at this point
    let (_, resolution, fps) = best.ok_or("width")?;
    Ok(TrackSettings {
        width: Some(resolution.width),
        height: Some(resolution.height),
        frame_rate: Some(fps),
        ..Default::default()
    })
}

/// Pick the audio mode for `constraints`
pub fn resolve_audio(
    caps: &AudioCapabilities,
    constraints: &AudioConstraints,
) -> Result<TrackSettings, UnsatisfiedConstraint> {
    let sample_rate = constraints.sample_rate.as_ref();
    let channel_count = constraints.channel_count.as_ref();

    let sample_rate = caps
        .sample_rates
        .iter()
        .copied()
        .filter(|rate| satisfies(sample_rate, *rate))
        .min_by(|a, b| {
            distance(sample_rate, *a, DEFAULT_SAMPLE_RATE)
                .total_cmp(&distance(sample_rate, *b, DEFAULT_SAMPLE_RATE))
        })
        .ok_or("sampleRate")?;

    let channel_count = caps
        .channel_counts
        .iter()
        .copied()
        .filter(|count| satisfies(channel_count, *count))
        .min_by(|a, b| {
            distance(channel_count, *a, DEFAULT_CHANNEL_COUNT)
                .total_cmp(&distance(channel_count, *b, DEFAULT_CHANNEL_COUNT))
        })
        .ok_or("channelCount")?;

    let echo_cancellation = match constraints.echo_cancellation {
        Some(bound) => {
            let wanted = bound.target() && caps.echo_cancellation;
            if !bound.is_satisfied_by(wanted) {
                return Err("echoCancellation");
            }
            wanted
        }
        None => caps.echo_cancellation,
    };

    Ok(TrackSettings {
        sample_rate: Some(sample_rate),
        channel_count: Some(channel_count),
        echo_cancellation: Some(echo_cancellation),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstrainBool;

    #[test]
    fn test_pixel_count_of_huge_modes() {
        let huge = VideoResolution::new(100_000, 100_000);
        assert_eq!(huge.pixel_count(), 10_000_000_000);

        let caps = VideoCapabilities {
            resolutions: vec![huge, VideoResolution::new(70_000, 70_000)],
            frame_rates: vec![30.0],
        };
        let settings = resolve_video(
            &caps,
            &VideoConstraints::new().width(Constrain::at_least(70_000)),
        )
        .unwrap();
        assert_eq!(settings.resolution(), Some((70_000, 70_000)));
    }

    #[test]
    fn test_unconstrained_video_uses_platform_default() {
        let settings = resolve_video(&VideoCapabilities::default(), &VideoConstraints::new()).unwrap();
        assert_eq!(settings.resolution(), Some((640, 480)));
        assert_eq!(settings.frame_rate, Some(30.0));
    }

    #[test]
    fn test_min_ideal_max_picks_ideal() {
        let constraints = VideoConstraints::new()
            .width(Constrain::range(Some(640), Some(1280), Some(1920)).unwrap())
            .height(Constrain::range(Some(480), Some(720), Some(1080)).unwrap());
        let settings = resolve_video(&VideoCapabilities::default(), &constraints).unwrap();
        assert_eq!(settings.resolution(), Some((1280, 720)));
    }

    #[test]
    fn test_min_only_picks_closest_to_default_above_min() {
        let constraints = VideoConstraints::new()
            .width(Constrain::at_least(1280))
            .height(Constrain::at_least(720));
        let settings = resolve_video(&VideoCapabilities::default(), &constraints).unwrap();
        assert_eq!(settings.resolution(), Some((1280, 720)));
    }

    #[test]
    fn test_exact_resolution_unavailable() {
        let constraints = VideoConstraints::new()
            .width(Constrain::exact(1024))
            .height(Constrain::exact(768));
        assert_eq!(
            resolve_video(&VideoCapabilities::default(), &constraints),
            Err("width")
        );

        let constraints = VideoConstraints::new()
            .width(Constrain::exact(1280))
            .height(Constrain::exact(1080));
        assert_eq!(
            resolve_video(&VideoCapabilities::default(), &constraints),
            Err("height")
        );
    }

    #[test]
    fn test_frame_rate_bound() {
        let constraints = VideoConstraints::new().frame_rate(Constrain::at_least(60.0));
        assert_eq!(
            resolve_video(&VideoCapabilities::default(), &constraints),
            Err("frameRate")
        );
    }

    #[test]
    fn test_audio_defaults_and_echo_cancellation() {
        let settings = resolve_audio(&AudioCapabilities::default(), &AudioConstraints::new()).unwrap();
        assert_eq!(settings.sample_rate, Some(48_000));
        assert_eq!(settings.channel_count, Some(1));
        assert_eq!(settings.echo_cancellation, Some(true));

        let no_aec = AudioCapabilities {
            echo_cancellation: false,
            ..Default::default()
        };
        let ideal = AudioConstraints::new().echo_cancellation(ConstrainBool::Ideal(true));
        assert_eq!(
            resolve_audio(&no_aec, &ideal).unwrap().echo_cancellation,
            Some(false)
        );

        let exact = AudioConstraints::new().echo_cancellation(ConstrainBool::Exact(true));
        assert_eq!(resolve_audio(&no_aec, &exact), Err("echoCancellation"));
    }

    #[test]
    fn test_audio_channel_bound() {
        let constraints = AudioConstraints::new().channel_count(Constrain::exact(2));
        let settings = resolve_audio(&AudioCapabilities::default(), &constraints).unwrap();
        assert_eq!(settings.channel_count, Some(2));

        let constraints = AudioConstraints::new().channel_count(Constrain::exact(6));
        assert_eq!(
            resolve_audio(&AudioCapabilities::default(), &constraints),
            Err("channelCount")
        );
    }
}
