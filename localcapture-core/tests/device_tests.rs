//! Integration tests for device enumeration and device-change notification

use localcapture_core::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

fn two_camera_platform() -> Arc<MockPlatform> {
    Arc::new(
        MockPlatform::new()
            .with_device(MockDevice::camera("cam1", "Front"))
            .with_device(MockDevice::camera("cam2", "Back"))
            .with_device(MockDevice::microphone("mic1", "Headset"))
            .with_device(MockDevice::speaker("spk1", "Speakers"))
            .with_permission(Permission::Granted),
    )
}

// ============================================================================
// ENUMERATION TESTS
// ============================================================================

#[tokio::test]
async fn test_list_devices_by_kind() {
    let manager = DeviceSessionManager::new(two_camera_platform());

    let cameras = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    let ids: Vec<&str> = cameras.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["cam1", "cam2"]);

    let mics = manager.list_devices(DeviceKind::AudioInput).await.unwrap();
    assert_eq!(mics.len(), 1);
    assert!(mics.iter().all(|d| d.kind == DeviceKind::AudioInput));

    let outputs = manager.list_devices(DeviceKind::AudioOutput).await.unwrap();
    assert_eq!(outputs[0].label, "Speakers");
}

#[tokio::test]
async fn test_empty_list_is_not_an_error() {
    let platform = Arc::new(MockPlatform::new().with_device(MockDevice::camera("cam1", "Front")));
    let manager = DeviceSessionManager::new(platform);

    let mics = manager.list_devices(DeviceKind::AudioInput).await.unwrap();
    assert!(mics.is_empty());
}

#[tokio::test]
async fn test_labels_revealed_after_first_acquisition() {
    let platform = Arc::new(MockPlatform::with_default_devices());
    let manager = DeviceSessionManager::new(platform.clone());

    let before = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    assert_eq!(before[0].id, "mock_camera_0");
    assert!(!before[0].has_label());

    let options = device_options(&before, &LabelFallback::KindAndId);
    assert_eq!(options[0].label, "Camera mock_camera_0");

    manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();

    let after = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    assert_eq!(after[0].label, "Mock Camera");
    assert_eq!(after[0].id, before[0].id);
}

// ============================================================================
// DEVICE CHANGE TESTS
// ============================================================================

#[tokio::test]
async fn test_unplug_notifies_and_leaves_sessions_alone() {
    let platform = two_camera_platform();
    let manager = DeviceSessionManager::new(platform.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    manager.on_device_change(move |event| {
        let _ = tx.send(event.sequence);
    });

    let id = manager
        .acquire(&ConstraintSpec::video_only(VideoConstraints::new().exact_device("cam2")).unwrap())
        .await
        .unwrap();
    let before = manager.list_devices(DeviceKind::VideoInput).await.unwrap();

    assert!(platform.unplug("cam2"));
    let sequence = timeout(EVENT_TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(sequence, 1);

    let after = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|d| d.id != "cam2"));

    // the session capturing from the unplugged camera is not touched
    let session = manager.session(id).unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert!(!session.tracks()[0].is_ended());
    assert_eq!(platform.release_count(session.tracks()[0].id()), 0);
}

#[tokio::test]
async fn test_plug_reaches_every_listener() {
    let platform = two_camera_platform();
    let manager = DeviceSessionManager::new(platform.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    for _ in 0..2 {
        let calls = calls.clone();
        manager.on_device_change(move |_| {
            calls.fetch_add(1, Ordering::SeqCst);
        });
    }
    let mut stream = manager.subscribe_device_changes();

    platform.plug(MockDevice::camera("cam3", "USB"));
    let event = timeout(EVENT_TIMEOUT, stream.recv()).await.unwrap().unwrap();

    assert_eq!(event.sequence, 1);
    // callbacks run before the stream fan-out
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let cameras = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    assert_eq!(cameras.len(), 3);
}

#[tokio::test]
async fn test_removed_listener_is_not_called() {
    let platform = two_camera_platform();
    let manager = DeviceSessionManager::new(platform.clone());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handle = manager.on_device_change(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert!(manager.remove_device_change_listener(handle));
    assert!(!manager.remove_device_change_listener(handle));

    let mut stream = manager.subscribe_device_changes();
    platform.notify_device_change();
    timeout(EVENT_TIMEOUT, stream.recv()).await.unwrap().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_unplug_is_silent() {
    let platform = two_camera_platform();
    let manager = DeviceSessionManager::new(platform.clone());
    let mut stream = manager.subscribe_device_changes();

    assert!(!platform.unplug("cam9"));
    tokio::task::yield_now().await;
    assert!(stream.try_recv().is_err());
}
