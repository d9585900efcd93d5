//! Integration tests for capture session lifecycle
//!
//! These tests drive the session manager against the in-memory platform:
//! acquisition, error surfaces, reconfiguration, track toggling and
//! teardown.

use localcapture_core::*;
use std::sync::Arc;

fn front_camera_platform() -> Arc<MockPlatform> {
    Arc::new(
        MockPlatform::new()
            .with_device(MockDevice::camera("cam1", "Front"))
            .with_device(MockDevice::microphone("mic1", "Built-in Microphone")),
    )
}

fn manager_for(platform: &Arc<MockPlatform>) -> DeviceSessionManager {
    DeviceSessionManager::new(platform.clone())
}

// ============================================================================
// ACQUISITION TESTS
// ============================================================================

#[tokio::test]
async fn test_pinned_camera_with_audio() {
    let platform = front_camera_platform();
    platform.set_permission(Permission::Granted);
    let manager = manager_for(&platform);

    let cameras = manager.list_devices(DeviceKind::VideoInput).await.unwrap();
    assert_eq!(
        cameras,
        vec![DeviceDescriptor::new("cam1", DeviceKind::VideoInput, "Front")]
    );

    let spec = ConstraintSpec::new(
        MediaRequest::Any,
        MediaRequest::Constrained(VideoConstraints::new().exact_device(&cameras[0].id)),
    )
    .unwrap();
    let id = manager.acquire(&spec).await.unwrap();

    let session = manager.session(id).unwrap();
    assert_eq!(session.state(), SessionState::Active);
    assert_eq!(session.source(), CaptureSource::Device);
    assert_eq!(session.tracks().len(), 2);
    assert_eq!(session.tracks_of(TrackKind::Video).count(), 1);
    assert_eq!(session.tracks_of(TrackKind::Audio).count(), 1);

    let video = session.tracks_of(TrackKind::Video).next().unwrap();
    assert_eq!(video.device_id(), Some("cam1"));
    assert_eq!(video.label(), "Front");
    assert!(video.is_enabled());
}

#[tokio::test]
async fn test_exact_resolution_unsatisfiable() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::video_only(
        VideoConstraints::new()
            .width(Constrain::exact(1024))
            .height(Constrain::exact(768)),
    )
    .unwrap();
    let err = manager.acquire(&spec).await.unwrap_err();

    assert!(matches!(err, CaptureError::ConstraintUnsatisfiable { .. }));
    assert_eq!(err.category(), ErrorCategory::Constraint);
    assert!(manager.active_sessions().is_empty());
    assert_eq!(platform.live_track_count(), 0);
}

#[tokio::test]
async fn test_nothing_requested_is_rejected_before_the_platform() {
    let platform = front_camera_platform();
    platform.set_available(false);
    let manager = manager_for(&platform);

    // a request for nothing cannot be built
    let err = ConstraintSpec::new(MediaRequest::Off, MediaRequest::Off).unwrap_err();
    assert!(matches!(err, CaptureError::InvalidConstraint { .. }));

    // nor deserialized
    let parsed = serde_json::from_str::<ConstraintSpec>(r#"{"audio": false, "video": false}"#);
    assert!(parsed.is_err());

    assert!(manager.active_sessions().is_empty());
}

#[tokio::test]
async fn test_unknown_exact_device() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::video_only(VideoConstraints::new().exact_device("cam9")).unwrap();
    let err = manager.acquire(&spec).await.unwrap_err();

    assert_eq!(
        err,
        CaptureError::DeviceNotFound {
            kind: Some(DeviceKind::VideoInput),
            device_id: Some("cam9".to_string()),
        }
    );
}

#[tokio::test]
async fn test_missing_microphone_not_blamed_on_pinned_camera() {
    let platform = Arc::new(MockPlatform::new().with_device(MockDevice::camera("cam1", "Front")));
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::new(
        MediaRequest::Any,
        MediaRequest::Constrained(VideoConstraints::new().exact_device("cam1")),
    )
    .unwrap();
    let err = manager.acquire(&spec).await.unwrap_err();

    assert_eq!(
        err,
        CaptureError::DeviceNotFound {
            kind: Some(DeviceKind::AudioInput),
            device_id: None,
        }
    );
    assert_eq!(platform.live_track_count(), 0);
}

#[tokio::test]
async fn test_permission_denied() {
    let platform = front_camera_platform();
    platform.set_permission(Permission::Denied);
    let manager = manager_for(&platform);

    let err = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap_err();

    assert!(matches!(err, CaptureError::AcquisitionDenied { .. }));
    assert!(!err.is_recoverable());
}

#[tokio::test]
async fn test_platform_unavailable() {
    let platform = front_camera_platform();
    platform.set_available(false);
    let manager = manager_for(&platform);

    let err = manager.list_devices(DeviceKind::AudioInput).await.unwrap_err();
    assert!(matches!(err, CaptureError::PlatformUnavailable { .. }));

    let err = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::PlatformUnavailable { .. }));
}

#[tokio::test]
async fn test_minimum_capability_with_echo_cancellation() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::new(
        MediaRequest::Constrained(
            AudioConstraints::new().echo_cancellation(ConstrainBool::Ideal(true)),
        ),
        MediaRequest::Constrained(
            VideoConstraints::new()
                .preferred_device("cam1")
                .width(Constrain::at_least(1280))
                .height(Constrain::at_least(720)),
        ),
    )
    .unwrap();
    let id = manager.acquire(&spec).await.unwrap();

    let session = manager.session(id).unwrap();
    let video = session.tracks_of(TrackKind::Video).next().unwrap();
    let (width, height) = video.settings().resolution().unwrap();
    assert!(width >= 1280 && height >= 720);

    let audio = session.tracks_of(TrackKind::Audio).next().unwrap();
    assert_eq!(audio.settings().echo_cancellation, Some(true));
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::camera_and_microphone();
    let (first, second) = tokio::join!(manager.acquire(&spec), manager.acquire(&spec));
    let (first, second) = (first.unwrap(), second.unwrap());
    assert_ne!(first, second);

    manager.stop(first).unwrap();
    assert_eq!(
        manager.session(second).unwrap().state(),
        SessionState::Active
    );
    assert_eq!(manager.active_sessions(), vec![second]);
}

// ============================================================================
// DISPLAY CAPTURE TESTS
// ============================================================================

#[tokio::test]
async fn test_display_capture() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::video_only(
        VideoConstraints::new()
            .width(Constrain::ideal(1920))
            .frame_rate(Constrain::at_most(15.0)),
    )
    .unwrap();
    let id = manager.acquire_display(&spec).await.unwrap();

    let session = manager.session(id).unwrap();
    assert_eq!(session.source(), CaptureSource::Display);
    let track = &session.tracks()[0];
    assert_eq!(track.settings().width, Some(1920));
    assert!(track.settings().frame_rate.unwrap() <= 15.0);
}

#[tokio::test]
async fn test_display_capture_rejects_device_pinning() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);

    let spec = ConstraintSpec::video_only(VideoConstraints::new().exact_device("cam1")).unwrap();
    let err = manager.acquire_display(&spec).await.unwrap_err();
    assert!(matches!(err, CaptureError::InvalidConstraint { .. }));
}

#[tokio::test]
async fn test_display_capture_unsupported() {
    let platform = front_camera_platform();
    platform.set_display_capabilities(None);
    let manager = manager_for(&platform);

    let err = manager
        .acquire_display(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap_err();
    assert!(matches!(err, CaptureError::PlatformUnavailable { .. }));
}

// ============================================================================
// RECONFIGURATION TESTS
// ============================================================================

#[tokio::test]
async fn test_reconfigure_applies_and_is_idempotent() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::video_only(VideoConstraints::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        manager.track(id, 0).unwrap().settings().resolution(),
        Some((640, 480))
    );

    let hd = TrackConstraints::Video(
        VideoConstraints::new()
            .width(Constrain::exact(1280))
            .height(Constrain::exact(720)),
    );
    manager.reconfigure(id, 0, hd.clone()).await.unwrap();
    let first = manager.track(id, 0).unwrap();
    manager.reconfigure(id, 0, hd.clone()).await.unwrap();
    let second = manager.track(id, 0).unwrap();

    assert_eq!(first.settings(), second.settings());
    assert_eq!(second.settings().resolution(), Some((1280, 720)));
    assert_eq!(second.constraints(), Some(&hd));
    assert_eq!(second.id(), first.id());
    assert_eq!(manager.session(id).unwrap().state(), SessionState::Active);
}

#[tokio::test]
async fn test_rejected_reconfigure_keeps_previous_constraints() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let original = VideoConstraints::new().width(Constrain::ideal(1280));
    let id = manager
        .acquire(&ConstraintSpec::video_only(original.clone()).unwrap())
        .await
        .unwrap();
    let before = manager.track(id, 0).unwrap();

    let err = manager
        .reconfigure(
            id,
            0,
            TrackConstraints::Video(VideoConstraints::new().width(Constrain::exact(1024))),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CaptureError::ConstraintUnsatisfiable { ref constraint, .. } if constraint == "width"
    ));
    let after = manager.track(id, 0).unwrap();
    assert_eq!(after, before);
    assert_eq!(after.constraints(), Some(&TrackConstraints::Video(original)));
    assert_eq!(manager.session(id).unwrap().state(), SessionState::Active);
}

#[tokio::test]
async fn test_reconfigure_invalid_handles() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();
    let audio = TrackConstraints::Audio(AudioConstraints::new().channel_count(Constrain::exact(2)));

    let err = manager.reconfigure(id, 5, audio.clone()).await.unwrap_err();
    assert!(matches!(err, CaptureError::InvalidHandle { .. }));

    manager.stop(id).unwrap();
    let err = manager.reconfigure(id, 1, audio).await.unwrap_err();
    assert!(matches!(err, CaptureError::InvalidHandle { .. }));
}

// ============================================================================
// TRACK TOGGLE TESTS
// ============================================================================

#[tokio::test]
async fn test_set_track_enabled_is_immediate() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();

    manager.set_track_enabled(id, 0, false).unwrap();
    let track = manager.track(id, 0).unwrap();
    assert!(!track.is_enabled());
    assert_eq!(platform.is_track_enabled(track.id()), Some(false));

    manager.set_track_enabled(id, 0, true).unwrap();
    assert!(manager.track(id, 0).unwrap().is_enabled());
    assert_eq!(manager.session(id).unwrap().state(), SessionState::Active);
}

#[tokio::test]
async fn test_set_track_enabled_invalid_index() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();

    let err = manager.set_track_enabled(id, 2, false).unwrap_err();
    assert!(matches!(err, CaptureError::InvalidHandle { .. }));
}

// ============================================================================
// TEARDOWN TESTS
// ============================================================================

#[tokio::test]
async fn test_stop_is_idempotent() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();
    let track_ids: Vec<String> = manager
        .session(id)
        .unwrap()
        .tracks()
        .iter()
        .map(|t| t.id().to_string())
        .collect();

    manager.stop(id).unwrap();
    manager.stop(id).unwrap();

    let session = manager.session(id).unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.tracks().iter().all(|t| t.is_ended()));
    for track_id in &track_ids {
        assert_eq!(platform.release_count(track_id), 1);
    }
    assert_eq!(platform.live_track_count(), 0);
}

#[tokio::test]
async fn test_release_stops_and_forgets_one_session() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let kept = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();
    let released = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();
    assert_eq!(platform.live_track_count(), 4);

    manager.release(released).unwrap();

    assert!(manager.session(released).is_none());
    assert_eq!(manager.session_count(), 1);
    assert_eq!(platform.live_track_count(), 2);
    assert_eq!(manager.session(kept).unwrap().state(), SessionState::Active);
    assert!(matches!(
        manager.release(released),
        Err(CaptureError::InvalidHandle { .. })
    ));
}

#[tokio::test]
async fn test_purged_session_becomes_invalid() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();

    manager.stop(id).unwrap();
    assert_eq!(manager.purge_stopped(), 1);
    assert!(manager.session(id).is_none());
    assert!(matches!(
        manager.stop(id),
        Err(CaptureError::InvalidHandle { .. })
    ));
}

#[tokio::test]
async fn test_stop_all() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    for _ in 0..3 {
        manager
            .acquire(&ConstraintSpec::camera_and_microphone())
            .await
            .unwrap();
    }

    assert_eq!(manager.stop_all(), 3);
    assert!(manager.active_sessions().is_empty());
    assert_eq!(platform.live_track_count(), 0);
}

// ============================================================================
// SINK BINDING TESTS
// ============================================================================

#[tokio::test]
async fn test_bind_active_session() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let id = manager
        .acquire(&ConstraintSpec::camera_and_microphone())
        .await
        .unwrap();

    let mut sink = RecordingSink::new();
    manager.bind(id, &mut sink).unwrap();

    let binding = sink.current().unwrap();
    assert_eq!(binding.session_id, id);
    assert!(binding.has_video());
    assert_eq!(binding.tracks.len(), 2);
}

#[tokio::test]
async fn test_bind_stopped_session_leaves_sink_untouched() {
    let platform = front_camera_platform();
    let manager = manager_for(&platform);
    let spec = ConstraintSpec::camera_and_microphone();
    let live = manager.acquire(&spec).await.unwrap();
    let stopped = manager.acquire(&spec).await.unwrap();
    manager.stop(stopped).unwrap();

    let mut sink = RecordingSink::new();
    manager.bind(live, &mut sink).unwrap();
    assert!(manager.bind(stopped, &mut sink).is_err());

    assert_eq!(sink.bind_count(), 1);
    assert_eq!(sink.current().unwrap().session_id, live);
}
