//! 播放会话管理器集成测试
//!
//! 使用模拟后端驱动状态机、路由和通知

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Call, DEFAULT_DEVICE, MockBackend, VIRTUAL_DEVICE, default_device, drain, sound};
use soundbind_lib::events::{Notification, NotificationHub};
use soundbind_lib::playback::{
    BackendOperation, InstanceId, PlaybackDevice, PlaybackSessionManager, PlaybackState,
};
use soundbind_lib::state::{AppConfig, GlobalConfig, PlaybackConfig};
use soundbind_lib::utils::ErrorCode;

fn manager_with(
    backend: &Arc<MockBackend>,
    config: AppConfig,
) -> (PlaybackSessionManager, NotificationHub) {
    let notifications = NotificationHub::default();
    let manager = PlaybackSessionManager::new(
        backend.clone(),
        Arc::new(GlobalConfig::new(config)),
        notifications.clone(),
    )
    .unwrap();
    (manager, notifications)
}

fn manager(backend: &Arc<MockBackend>) -> (PlaybackSessionManager, NotificationHub) {
    manager_with(backend, AppConfig::default())
}

fn routing(output_device: &str, duplicate_to_default: bool, mute: bool) -> AppConfig {
    AppConfig {
        playback: PlaybackConfig {
            output_device: Some(output_device.to_string()),
            duplicate_to_default,
            mute_during_playback: mute,
        },
        ..Default::default()
    }
}

// ==================== 状态机 ====================

#[tokio::test]
async fn test_play_creates_playing_instance() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let mut rx = hub.subscribe();

    let id = manager.play(sound(1), default_device()).await[0];
    let playing = manager.get(id).await.unwrap();

    assert_eq!(playing.state, PlaybackState::Playing);
    assert_eq!(playing.position, Duration::ZERO);
    assert_eq!(playing.sound.id, sound(1).id);
    assert!(playing.device.is_default);
    assert_eq!(
        backend.starts(),
        vec![("sound-1.wav".to_string(), DEFAULT_DEVICE.to_string())]
    );
    assert_eq!(drain(&mut rx), vec![Notification::SoundPlayed { sound: playing }]);
}

#[tokio::test]
async fn test_instance_ids_are_distinct() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);

    let first = manager.play(sound(1), default_device()).await[0];
    let second = manager.play(sound(1), default_device()).await[0];
    assert_ne!(first, second);

    manager.stop(first).await;
    let third = manager.play(sound(1), default_device()).await[0];
    assert_ne!(third, first);
    assert_ne!(third, second);
}

#[tokio::test]
async fn test_pause_twice_is_noop() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];

    let paused = manager.pause(id).await.unwrap();
    assert_eq!(paused.state, PlaybackState::Paused);

    assert!(manager.pause(id).await.is_none());
    assert_eq!(manager.get(id).await.unwrap().state, PlaybackState::Paused);

    let handle = backend.last_handle();
    let pauses = backend
        .calls()
        .into_iter()
        .filter(|call| *call == Call::Pause(handle))
        .count();
    assert_eq!(pauses, 1);
}

#[tokio::test]
async fn test_resume_only_from_paused() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];

    assert!(manager.resume(id).await.is_none());

    manager.pause(id).await.unwrap();
    let resumed = manager.resume(id).await.unwrap();
    assert_eq!(resumed.state, PlaybackState::Playing);
}

#[tokio::test]
async fn test_operations_on_unknown_id() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let mut rx = hub.subscribe();
    let unknown = InstanceId(999);

    assert!(manager.pause(unknown).await.is_none());
    assert!(manager.resume(unknown).await.is_none());
    assert!(manager.seek(unknown, Duration::from_secs(1)).await.is_none());
    assert!(manager.set_repeat(unknown, true).await.is_none());
    manager.stop(unknown).await;

    assert!(backend.calls().is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_seek_clamps_to_length() {
    let backend = Arc::new(MockBackend::new().with_length(Duration::from_secs(5)));
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];

    let playing = manager.seek(id, Duration::from_secs(2)).await.unwrap();
    assert_eq!(playing.position, Duration::from_secs(2));
    assert_eq!(playing.length, Some(Duration::from_secs(5)));

    manager.pause(id).await.unwrap();
    let playing = manager.seek(id, Duration::from_secs(60)).await.unwrap();
    assert_eq!(playing.position, Duration::from_secs(5));
    assert_eq!(playing.state, PlaybackState::Paused);

    let handle = backend.last_handle();
    assert!(
        backend
            .calls()
            .contains(&Call::Seek(handle, Duration::from_secs(5)))
    );
}

#[tokio::test]
async fn test_set_repeat_only_changes_flag() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    manager.pause(id).await.unwrap();

    let playing = manager.set_repeat(id, true).await.unwrap();
    assert!(playing.repeat);
    assert_eq!(playing.state, PlaybackState::Paused);
}

// ==================== 停止 ====================

#[tokio::test]
async fn test_stop_releases_device() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    let handle = backend.last_handle();
    let mut rx = hub.subscribe();

    manager.stop(id).await;

    assert_eq!(backend.stopped_handles(), vec![handle]);
    assert!(manager.get(id).await.is_none());
    assert!(manager.pause(id).await.is_none());
    assert_eq!(drain(&mut rx), vec![Notification::AllSoundsFinished]);
}

#[tokio::test]
async fn test_stop_from_paused() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    manager.pause(id).await.unwrap();

    manager.stop(id).await;
    assert!(manager.playing().await.is_empty());
}

#[tokio::test]
async fn test_stop_all() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    for i in 1..=3 {
        manager.play(sound(i), default_device()).await;
    }
    let mut rx = hub.subscribe();

    manager.stop_all().await;

    assert!(manager.playing().await.is_empty());
    assert_eq!(backend.stopped_handles().len(), 3);
    assert_eq!(drain(&mut rx), vec![Notification::AllSoundsFinished]);
}

#[tokio::test]
async fn test_stop_all_is_atomic_with_triggers() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let manager = Arc::new(manager);

    let trigger_manager = Arc::clone(&manager);
    let triggers = std::thread::spawn(move || {
        for i in 0..200 {
            trigger_manager.trigger(sound(i));
        }
    });

    manager.stop_all().await;
    triggers.join().unwrap();
    let live = manager.playing().await;

    let started = backend.started_handles();
    let stopped = backend.stopped_handles();
    assert_eq!(started.len(), 200);
    assert_eq!(started.len(), live.len() + stopped.len());
    assert!(live.iter().all(|p| p.state == PlaybackState::Playing));

    // 被停止的一定是最早启动的那一批
    assert_eq!(&started[..stopped.len()], &stopped[..]);
}

// ==================== 自然结束与循环 ====================

#[tokio::test]
async fn test_end_of_stream_finishes_and_removes() {
    let backend = Arc::new(MockBackend::new().with_length(Duration::from_secs(3)));
    let (manager, hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    let handle = backend.last_handle();
    let mut rx = hub.subscribe();

    backend.end_of_stream(handle);

    assert!(manager.get(id).await.is_none());
    assert!(manager.playing().await.is_empty());
    assert_eq!(backend.stopped_handles(), vec![handle]);

    let received = drain(&mut rx);
    assert_eq!(received.len(), 2);
    match &received[0] {
        Notification::SoundFinished { sound } => {
            assert_eq!(sound.id, id);
            assert_eq!(sound.state, PlaybackState::Finished);
            assert_eq!(sound.position, Duration::from_secs(3));
        }
        other => panic!("unexpected notification: {:?}", other),
    }
    assert_eq!(received[1], Notification::AllSoundsFinished);
}

#[tokio::test]
async fn test_end_of_stream_with_repeat_restarts_same_instance() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let id = manager
        .play(sound(1).with_repeat(true), default_device())
        .await[0];
    let handle = backend.last_handle();

    backend.progress(handle, Duration::from_millis(1200));
    assert_eq!(
        manager.get(id).await.unwrap().position,
        Duration::from_millis(1200)
    );

    let mut rx = hub.subscribe();
    backend.end_of_stream(handle);

    let playing = manager.get(id).await.unwrap();
    assert_eq!(playing.id, id);
    assert_eq!(playing.state, PlaybackState::Playing);
    assert_eq!(playing.position, Duration::ZERO);
    assert!(backend.calls().contains(&Call::Seek(handle, Duration::ZERO)));
    assert!(backend.stopped_handles().is_empty());
    assert_eq!(
        drain(&mut rx),
        vec![Notification::SoundProgressed { sound: playing }]
    );
}

#[tokio::test]
async fn test_repeat_toggled_off_before_end() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager
        .play(sound(1).with_repeat(true), default_device())
        .await[0];

    manager.set_repeat(id, false).await.unwrap();
    backend.end_of_stream(backend.last_handle());

    assert!(manager.get(id).await.is_none());
}

#[tokio::test]
async fn test_failed_repeat_finishes_instance() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let id = manager
        .play(sound(1).with_repeat(true), default_device())
        .await[0];
    let mut rx = hub.subscribe();

    backend.fail(BackendOperation::Seek);
    backend.end_of_stream(backend.last_handle());

    assert!(manager.get(id).await.is_none());
    let received = drain(&mut rx);
    assert_eq!(
        received[0],
        Notification::Error {
            code: ErrorCode::FailedToRepeat
        }
    );
    assert!(matches!(received[1], Notification::SoundFinished { .. }));
    assert_eq!(received[2], Notification::AllSoundsFinished);
}

#[tokio::test]
async fn test_end_of_stream_while_paused_is_ignored() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    manager.pause(id).await.unwrap();

    backend.end_of_stream(backend.last_handle());

    assert_eq!(manager.get(id).await.unwrap().state, PlaybackState::Paused);
}

#[tokio::test]
async fn test_all_sounds_finished_waits_for_last_instance() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    manager.play(sound(1), default_device()).await;
    let first = backend.last_handle();
    manager.play(sound(2), default_device()).await;
    let second = backend.last_handle();
    let mut rx = hub.subscribe();

    backend.end_of_stream(first);
    manager.playing().await;
    let received = drain(&mut rx);
    assert_eq!(received.len(), 1);
    assert!(matches!(received[0], Notification::SoundFinished { .. }));

    backend.end_of_stream(second);
    manager.playing().await;
    let received = drain(&mut rx);
    assert_eq!(received.last(), Some(&Notification::AllSoundsFinished));
}

// ==================== 后端错误 ====================

#[tokio::test]
async fn test_backend_start_failure_reports_error() {
    let backend = Arc::new(MockBackend::new());
    backend.fail(BackendOperation::Start);
    let (manager, hub) = manager(&backend);
    let mut rx = hub.subscribe();

    assert!(manager.play(sound(1), default_device()).await.is_empty());
    assert!(manager.playing().await.is_empty());
    assert_eq!(
        drain(&mut rx),
        vec![Notification::Error {
            code: ErrorCode::FailedToPlay
        }]
    );
}

#[tokio::test]
async fn test_backend_pause_failure_keeps_state() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager(&backend);
    let id = manager.play(sound(1), default_device()).await[0];
    let mut rx = hub.subscribe();

    backend.fail(BackendOperation::Pause);
    assert!(manager.pause(id).await.is_none());

    assert_eq!(manager.get(id).await.unwrap().state, PlaybackState::Playing);
    assert_eq!(
        drain(&mut rx),
        vec![Notification::Error {
            code: ErrorCode::FailedToPause
        }]
    );
}

// ==================== 路由 ====================

#[tokio::test]
async fn test_trigger_on_selected_device_only() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, false, false));

    manager.trigger(sound(1));
    let live = manager.playing().await;

    assert_eq!(live.len(), 1);
    assert_eq!(live[0].device.id, VIRTUAL_DEVICE);
    assert!(!live[0].device.is_default);
}

#[tokio::test]
async fn test_trigger_duplicates_to_default() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, true, false));

    manager.trigger(sound(7));
    let live = manager.playing().await;

    assert_eq!(live.len(), 2);
    assert_ne!(live[0].id, live[1].id);
    assert!(live.iter().all(|p| p.sound.id == sound(7).id));
    let devices: Vec<&str> = live.iter().map(|p| p.device.id.as_str()).collect();
    assert_eq!(devices, vec![VIRTUAL_DEVICE, DEFAULT_DEVICE]);
}

#[tokio::test]
async fn test_mute_during_playback_suppresses_duplicate() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, true, true));

    manager.trigger(sound(1));
    let live = manager.playing().await;

    assert_eq!(live.len(), 1);
    assert_eq!(live[0].device.id, VIRTUAL_DEVICE);
}

#[tokio::test]
async fn test_duplicate_ignored_when_default_selected() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(DEFAULT_DEVICE, true, false));

    manager.trigger(sound(1));
    let live = manager.playing().await;

    assert_eq!(live.len(), 1);
    assert!(live[0].device.is_default);
}

#[tokio::test]
async fn test_missing_device_falls_back_to_default() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing("unplugged", true, false));

    manager.trigger(sound(1));
    let live = manager.playing().await;

    assert_eq!(live.len(), 1);
    assert_eq!(live[0].device.id, DEFAULT_DEVICE);
}

#[tokio::test]
async fn test_play_on_explicit_device() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    let device = PlaybackDevice::new(VIRTUAL_DEVICE, "Virtual Cable", false);

    let id = manager.play(sound(1), device.clone()).await[0];

    assert_eq!(manager.get(id).await.unwrap().device, device);
    assert_eq!(
        backend.starts(),
        vec![("sound-1.wav".to_string(), VIRTUAL_DEVICE.to_string())]
    );
}

#[tokio::test]
async fn test_play_duplicates_to_default() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, true, false));
    let device = PlaybackDevice::new(VIRTUAL_DEVICE, "Virtual Cable", false);

    let ids = manager.play(sound(1), device.clone()).await;

    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(manager.get(ids[0]).await.unwrap().device, device);
    assert_eq!(manager.get(ids[1]).await.unwrap().device.id, DEFAULT_DEVICE);
    assert_eq!(
        backend.starts(),
        vec![
            ("sound-1.wav".to_string(), VIRTUAL_DEVICE.to_string()),
            ("sound-1.wav".to_string(), DEFAULT_DEVICE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_play_without_duplicate_when_primary_fails() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, true, false));
    let device = PlaybackDevice::new(VIRTUAL_DEVICE, "Virtual Cable", false);
    backend.fail(BackendOperation::Start);

    assert!(manager.play(sound(1), device).await.is_empty());
    assert!(manager.playing().await.is_empty());
}

#[tokio::test]
async fn test_duplicated_instances_finish_separately() {
    let backend = Arc::new(MockBackend::new());
    let (manager, hub) = manager_with(&backend, routing(VIRTUAL_DEVICE, true, false));
    manager.trigger(sound(3));
    let live = manager.playing().await;
    let mut rx = hub.subscribe();

    for handle in backend.started_handles() {
        backend.end_of_stream(handle);
    }
    assert!(manager.playing().await.is_empty());

    let received = drain(&mut rx);
    assert_eq!(received.len(), 3);
    let finished: Vec<(InstanceId, &str)> = received[..2]
        .iter()
        .map(|notification| match notification {
            Notification::SoundFinished { sound } => {
                assert_eq!(sound.sound.id, live[0].sound.id);
                (sound.id, sound.device.id.as_str())
            }
            other => panic!("unexpected notification: {:?}", other),
        })
        .collect();
    assert_eq!(
        finished,
        vec![
            (live[0].id, VIRTUAL_DEVICE),
            (live[1].id, DEFAULT_DEVICE),
        ]
    );
    assert_eq!(received[2], Notification::AllSoundsFinished);
}

// ==================== 生命周期 ====================

#[tokio::test]
async fn test_drop_releases_live_playback() {
    let backend = Arc::new(MockBackend::new());
    let (manager, _hub) = manager(&backend);
    manager.play(sound(1), default_device()).await;
    let handle = backend.last_handle();

    drop(manager);

    let mut released = false;
    for _ in 0..50 {
        if backend.stopped_handles().contains(&handle) {
            released = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(released);
}
