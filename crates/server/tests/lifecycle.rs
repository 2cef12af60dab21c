//! Session slot transitions driven by platform callbacks.

use std::sync::Arc;
use std::thread;

use voxel_engine::{BlockId, BlockPos};
use voxel_session_server::config::SessionConfig;
use voxel_session_server::lifecycle::{LifecycleController, LifecycleState};
use voxel_session_server::platform::{GameSessionDescriptor, LocalPlatform, PlatformCallbacks};

fn controller() -> (Arc<LocalPlatform>, LifecycleController) {
    let platform = Arc::new(LocalPlatform::new());
    let controller = LifecycleController::new(platform.clone(), SessionConfig::default());
    (platform, controller)
}

#[test]
fn start_then_terminate() {
    let (platform, controller) = controller();
    assert_eq!(controller.state(), LifecycleState::Idle);

    let descriptor = GameSessionDescriptor::new("S1").with_property("gameMode", "arena");
    assert!(controller.on_start_game_session(descriptor));
    assert_eq!(controller.state(), LifecycleState::Active);
    assert_eq!(
        controller.with_active_session(|s| (s.session_id().to_owned(), s.game_mode().to_owned())),
        Some(("S1".to_owned(), "arena".to_owned()))
    );
    assert_eq!(platform.activated_sessions(), vec!["S1"]);

    assert!(controller.on_process_terminate());
    assert_eq!(controller.state(), LifecycleState::Idle);
    assert!(controller.active_session_id().is_none());
    assert!(platform.ending_signalled());
    assert!(controller.is_shutting_down());
}

#[test]
fn second_start_is_rejected_while_active() {
    let (platform, controller) = controller();
    assert!(controller.on_start_game_session(GameSessionDescriptor::new("S1")));
    controller.with_active_session(|s| s.add_player("p", "n"));

    assert!(!controller.on_start_game_session(GameSessionDescriptor::new("S2")));
    assert_eq!(controller.active_session_id().as_deref(), Some("S1"));
    assert_eq!(controller.with_active_session(|s| s.player_count()), Some(1));
    assert_eq!(platform.activated_sessions(), vec!["S1"]);
}

#[test]
fn health_check_is_always_true() {
    let (_, controller) = controller();
    assert!(controller.on_health_check());
    controller.on_start_game_session(GameSessionDescriptor::new("S"));
    assert!(controller.on_health_check());
    controller.on_process_terminate();
    assert!(controller.on_health_check());
}

#[test]
fn terminate_while_idle_still_signals_ending() {
    let (platform, controller) = controller();
    assert!(controller.on_process_terminate());
    assert!(platform.ending_signalled());
    assert_eq!(controller.metrics().snapshot().sessions_ended, 0);
}

#[test]
fn start_after_terminate_is_rejected() {
    let (platform, controller) = controller();
    assert!(controller.on_start_game_session(GameSessionDescriptor::new("S1")));
    assert!(controller.on_process_terminate());

    assert!(!controller.on_start_game_session(GameSessionDescriptor::new("LATE")));
    assert_eq!(controller.state(), LifecycleState::Idle);
    assert!(controller.active_session_id().is_none());
    assert_eq!(platform.activated_sessions(), vec!["S1"]);

    let snap = controller.metrics().snapshot();
    assert_eq!(snap.sessions_started, 1);
    assert_eq!(snap.sessions_ended, 1);
}

#[test]
fn start_after_shutdown_request_is_rejected() {
    let (platform, controller) = controller();
    controller.request_shutdown();
    assert!(!controller.on_start_game_session(GameSessionDescriptor::new("S1")));
    assert!(platform.activated_sessions().is_empty());
    assert_eq!(controller.metrics().snapshot().sessions_started, 0);
}

#[test]
fn terminate_racing_starts_never_leaves_a_session() {
    for round in 0..50 {
        let (platform, controller) = controller();
        let controller = Arc::new(controller);
        let starters: Vec<_> = (0..4)
            .map(|t| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    for i in 0..20 {
                        let id = format!("r{round}-t{t}-{i}");
                        controller.on_start_game_session(GameSessionDescriptor::new(id));
                    }
                })
            })
            .collect();
        controller.on_process_terminate();
        for s in starters {
            s.join().unwrap();
        }

        assert_eq!(controller.state(), LifecycleState::Idle);
        assert!(controller.active_session_id().is_none());
        assert!(platform.activated_sessions().len() <= 1);
    }
}

#[test]
fn teardown_frees_world_and_roster() {
    let (_, controller) = controller();
    controller.on_start_game_session(GameSessionDescriptor::new("S1"));
    controller.with_active_session(|s| {
        s.add_player("p", "n");
        s.world().set_block(BlockPos::new(1, 1, 1), BlockId(1));
    });
    let status = controller.status();
    assert_eq!(status.players, 1);
    assert_eq!(status.chunks, 1);

    controller.on_process_terminate();
    let status = controller.status();
    assert_eq!(status.state, LifecycleState::Idle);
    assert_eq!(status.players, 0);
    assert_eq!(status.chunks, 0);
    assert!(status.session_id.is_none());
}

#[test]
fn requests_racing_termination_become_noops() {
    let (_, controller) = controller();
    let controller = Arc::new(controller);
    controller.on_start_game_session(GameSessionDescriptor::new("S1"));

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                let mut applied = 0;
                for i in 0..500 {
                    let id = format!("t{t}-{i}");
                    let result = controller.with_active_session(|s| {
                        s.world().set_block(BlockPos::new(i, 10, t), BlockId(2));
                        s.add_player(&id, "n");
                        s.remove_player(&id);
                    });
                    if result.is_some() {
                        applied += 1;
                    }
                }
                applied
            })
        })
        .collect();

    controller.on_process_terminate();
    for w in workers {
        w.join().unwrap();
    }

    assert_eq!(controller.state(), LifecycleState::Idle);
    assert_eq!(controller.with_active_session(|_| ()), None);
}

#[test]
fn tick_evicts_idle_players_of_active_session() {
    let (_, controller) = controller();
    controller.on_start_game_session(GameSessionDescriptor::new("S1"));
    controller.with_active_session(|s| {
        s.add_player("idle", "n");
        s.with_player("idle", |p| p.set_position_at(0.0, 0.0, 0.0, 0));
        s.add_player("busy", "n");
    });

    assert!(controller.tick().is_some());
    assert_eq!(
        controller.with_active_session(|s| s.player_ids()),
        Some(vec!["busy".to_string()])
    );
    assert_eq!(controller.metrics().snapshot().players_evicted, 1);
}
