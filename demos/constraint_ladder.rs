//! Constraint Ladder Demo
//!
//! Opens the same camera under increasingly strict constraints and shows
//! which requests are met, which fall back to the closest mode, and which
//! fail with a distinct error.

use localcapture::{
    AudioConstraints, CaptureError, Constrain, ConstrainBool, ConstraintSpec, GlobalConfig,
    LocalCapture, MediaRequest, MockDevice, MockPlatform, TrackConstraints, TrackKind,
    VideoConstraints,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("⚙️  localcapture Constraint Ladder Demo");
    println!("======================================");

    let platform = Arc::new(
        MockPlatform::new()
            .with_device(MockDevice::camera("cam1", "Front"))
            .with_device(MockDevice::microphone("mic1", "Headset")),
    );
    let capture = LocalCapture::init_with(platform, GlobalConfig::default())?;
    let manager = capture.manager();

    let ladder: Vec<(&str, ConstraintSpec)> = vec![
        ("any camera and microphone", ConstraintSpec::camera_and_microphone()),
        (
            "min 640x480, ideal 1280x720, max 1920x1080",
            ConstraintSpec::new(
                MediaRequest::Constrained(
                    AudioConstraints::new().echo_cancellation(ConstrainBool::Ideal(true)),
                ),
                MediaRequest::Constrained(
                    VideoConstraints::new()
                        .preferred_device("cam1")
                        .width(Constrain::range(Some(640), Some(1280), Some(1920))?)
                        .height(Constrain::range(Some(480), Some(720), Some(1080))?),
                ),
            )?,
        ),
        (
            "exact cam1 at min 1280x720",
            ConstraintSpec::video_only(
                VideoConstraints::new()
                    .exact_device("cam1")
                    .width(Constrain::at_least(1280))
                    .height(Constrain::at_least(720)),
            )?,
        ),
        (
            "exact 1024x768",
            ConstraintSpec::video_only(
                VideoConstraints::new()
                    .width(Constrain::exact(1024))
                    .height(Constrain::exact(768)),
            )?,
        ),
        (
            "exact unknown camera",
            ConstraintSpec::video_only(VideoConstraints::new().exact_device("cam9"))?,
        ),
    ];

    for (step, (name, spec)) in ladder.iter().enumerate() {
        println!("\n📐 Step {}: {}", step + 1, name);
        match manager.acquire(spec).await {
            Ok(id) => {
                if let Some(session) = manager.session(id) {
                    for track in session.tracks() {
                        describe(track.kind(), track.settings());
                    }
                }
                manager.stop(id)?;
            }
            Err(e) => report(&e),
        }
    }

    println!("\n🔄 Reconfiguring a live track");
    let id = manager
        .acquire(&ConstraintSpec::video_only(VideoConstraints::new())?)
        .await?;
    for width in [1280, 1024] {
        let constraints = TrackConstraints::Video(VideoConstraints::new().width(Constrain::exact(width)));
        match manager.reconfigure(id, 0, constraints).await {
            Ok(()) => println!("   ✅ width {} applied", width),
            Err(e) => report(&e),
        }
        let track = manager.track(id, 0)?;
        describe(track.kind(), track.settings());
    }
    manager.stop(id)?;

    println!("\n✨ Constraint ladder demo completed!");
    Ok(())
}

fn describe(kind: TrackKind, settings: &localcapture::TrackSettings) {
    match kind {
        TrackKind::Video => println!(
            "   📹 {}x{} @ {} fps",
            settings.width.unwrap_or_default(),
            settings.height.unwrap_or_default(),
            settings.frame_rate.unwrap_or_default()
        ),
        TrackKind::Audio => println!(
            "   🎵 {} Hz, {} channel(s), echo cancellation {}",
            settings.sample_rate.unwrap_or_default(),
            settings.channel_count.unwrap_or_default(),
            settings.echo_cancellation.unwrap_or_default()
        ),
    }
}

fn report(error: &CaptureError) {
    println!("   ❌ {:?}: {}", error.category(), error);
}
