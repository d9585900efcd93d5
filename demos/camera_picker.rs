//! Camera Picker Demo
//!
//! Fills camera and microphone lists, plays the first camera with audio,
//! and keeps the camera list current while cameras are plugged and
//! unplugged. Runs on the in-memory platform so it works on any host.

use localcapture::{
    DeviceKind, DeviceListView, DeviceOption, GlobalConfig, LocalCapture, MockDevice,
    MockPlatform, RecordingSink,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Device list that prints itself whenever it is repopulated
struct ConsoleList {
    title: &'static str,
}

impl DeviceListView for ConsoleList {
    fn populate(&mut self, options: Vec<DeviceOption>) {
        println!("   {} ({} entries)", self.title, options.len());
        for option in options {
            println!("     • {:<28} [{}]", option.label, option.value);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("📹 localcapture Camera Picker Demo");
    println!("==================================");

    let platform = Arc::new(
        MockPlatform::new()
            .with_device(MockDevice::camera("cam-front", "Front Camera"))
            .with_device(MockDevice::camera("cam-usb", ""))
            .with_device(MockDevice::microphone("mic-builtin", "Built-in Microphone")),
    );
    let capture = LocalCapture::init_with(platform.clone(), GlobalConfig::default())?;
    let picker = capture.picker();

    // Demo 1: labels are withheld until the first capture succeeds
    println!("\n📋 Demo 1: Device lists before permission");
    let mut cameras = ConsoleList { title: "Cameras" };
    let mut microphones = ConsoleList { title: "Microphones" };
    picker.refresh_inputs(&mut cameras, &mut microphones).await?;

    // Demo 2: play the first camera, pinned by id, with audio
    println!("\n▶️  Demo 2: Play first camera");
    let mut player = RecordingSink::new();
    let session = picker.play_first_camera(&mut player).await?;
    if let Some(binding) = player.current() {
        println!("   Playing stream {} ({})", binding.stream_id, session);
        for track in &binding.tracks {
            println!("     • {:?} track '{}'", track.kind, track.label);
        }
    }
    picker.refresh(DeviceKind::VideoInput, &mut cameras).await?;

    // Demo 3: the camera list follows hot-plug events
    println!("\n🔌 Demo 3: Device changes");
    let watched = Arc::new(Mutex::new(ConsoleList {
        title: "Cameras (updated)",
    }));
    let _watch = picker.watch(DeviceKind::VideoInput, watched);

    platform.plug(MockDevice::camera("cam-doc", "Document Camera"));
    tokio::time::sleep(Duration::from_millis(50)).await;
    platform.unplug("cam-usb");
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = capture.manager().session(session).map(|s| s.state());
    println!("   Running session after unplug: {:?}", state);

    picker.stop(&mut player)?;
    println!("\n✨ Camera picker demo completed!");
    Ok(())
}
