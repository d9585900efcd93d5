//! Screen Share Demo
//!
//! Captures the display next to a camera, mutes and unmutes the camera
//! track, and tears both sessions down.

use localcapture::{
    Constrain, ConstraintSpec, GlobalConfig, LocalCapture, MockPlatform, RecordingSink,
    StreamSink, VideoConstraints,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("🖥️  localcapture Screen Share Demo");
    println!("=================================");

    let capture = LocalCapture::init_with(
        Arc::new(MockPlatform::with_default_devices()),
        GlobalConfig::default(),
    )?;
    let manager = capture.manager();

    println!("\n📹 Camera session");
    let camera = manager.acquire(&ConstraintSpec::camera_and_microphone()).await?;
    let mut preview = RecordingSink::new();
    manager.bind(camera, &mut preview)?;

    println!("\n🖥️  Display session");
    let screen_spec = ConstraintSpec::video_only(
        VideoConstraints::new()
            .width(Constrain::ideal(1920))
            .frame_rate(Constrain::at_most(15.0)),
    )?;
    let screen = manager.acquire_display(&screen_spec).await?;
    let mut share = RecordingSink::new();
    manager.bind(screen, &mut share)?;
    let track = manager.track(screen, 0)?;
    println!(
        "   Sharing '{}' at {:?} @ {:?} fps",
        track.label(),
        track.settings().resolution(),
        track.settings().frame_rate
    );

    println!("\n🔇 Muting the camera while sharing");
    manager.set_track_enabled(camera, 0, false)?;
    println!("   Camera enabled: {}", manager.track(camera, 0)?.is_enabled());
    manager.set_track_enabled(camera, 0, true)?;
    println!("   Camera enabled: {}", manager.track(camera, 0)?.is_enabled());

    println!("\n⏹️  Tearing down");
    share.unbind();
    preview.unbind();
    println!("   Stopped {} session(s)", manager.stop_all());

    println!("\n✨ Screen share demo completed!");
    Ok(())
}
