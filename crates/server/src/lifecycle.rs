//! Process-wide session slot and the platform callbacks that drive it.
//!
//! The slot moves `Idle -> Active -> Terminating -> Idle` and only platform
//! callbacks move it. Lock order is slot first, then a session's roster or
//! chunk locks; nothing takes the slot lock while holding either of those.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::watch;

use crate::config::{DEFAULT_GAME_MODE, SessionConfig};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::platform::{GameSessionDescriptor, HostPlatform, PlatformCallbacks};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LifecycleState {
    /// No session.
    Idle,
    /// A session is installed and ticking.
    Active,
    /// The session has been taken out of the slot and is being destroyed.
    Terminating,
}

struct Slot {
    state: LifecycleState,
    /// `Some` exactly when `state` is `Active`.
    session: Option<Session>,
}

/// Point-in-time view of the process for the control API.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: LifecycleState,
    pub session_id: Option<String>,
    pub game_mode: Option<String>,
    pub players: usize,
    pub chunks: usize,
    pub metrics: MetricsSnapshot,
}

/// Holds at most one active [`Session`] and couples it to the platform.
pub struct LifecycleController {
    slot: Mutex<Slot>,
    platform: Arc<dyn HostPlatform>,
    session_config: SessionConfig,
    metrics: Metrics,
    shutdown: watch::Sender<bool>,
    ending_sent: AtomicBool,
}

impl LifecycleController {
    pub fn new(platform: Arc<dyn HostPlatform>, session_config: SessionConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            slot: Mutex::new(Slot {
                state: LifecycleState::Idle,
                session: None,
            }),
            platform,
            session_config,
            metrics: Metrics::new(),
            shutdown,
            ending_sent: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.slot.lock().expect("session slot poisoned").state
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run `f` against the active session while the slot lock is held.
    /// Returns `None` when no session is active, which turns requests that
    /// race with termination into no-ops.
    pub fn with_active_session<R>(&self, f: impl FnOnce(&Session) -> R) -> Option<R> {
        let slot = self.slot.lock().expect("session slot poisoned");
        slot.session.as_ref().map(f)
    }

    pub fn active_session_id(&self) -> Option<String> {
        self.with_active_session(|s| s.session_id().to_owned())
    }

    /// One game-loop step: update the active session, if any. Returns how
    /// long the update took, or `None` when idle.
    pub fn tick(&self) -> Option<Duration> {
        let (elapsed, evicted) = {
            let slot = self.slot.lock().expect("session slot poisoned");
            let session = slot.session.as_ref()?;
            let started = Instant::now();
            let evicted = session.update();
            (started.elapsed(), evicted.len() as u64)
        };
        self.metrics.record_tick(elapsed, evicted);
        Some(elapsed)
    }

    pub fn status(&self) -> StatusSnapshot {
        let slot = self.slot.lock().expect("session slot poisoned");
        let session = slot.session.as_ref();
        StatusSnapshot {
            state: slot.state,
            session_id: session.map(|s| s.session_id().to_owned()),
            game_mode: session.map(|s| s.game_mode().to_owned()),
            players: session.map_or(0, Session::player_count),
            chunks: session.map_or(0, |s| s.world().chunk_count()),
            metrics: self.metrics.snapshot(),
        }
    }

    /// Take the active session out of the slot and destroy it. With
    /// `only_id`, a different session in the slot is left alone. Returns
    /// whether a session was torn down.
    fn teardown(&self, only_id: Option<&str>) -> bool {
        let session = {
            let mut slot = self.slot.lock().expect("session slot poisoned");
            let matches = slot
                .session
                .as_ref()
                .is_some_and(|s| only_id.is_none_or(|id| s.session_id() == id));
            if !matches {
                return false;
            }
            slot.state = LifecycleState::Terminating;
            slot.session.take()
        };
        // World and roster are freed here, outside the slot lock.
        drop(session);
        self.slot.lock().expect("session slot poisoned").state = LifecycleState::Idle;
        self.metrics.session_ended();
        true
    }

    /// Emit `process_ending` to the platform, at most once per process.
    pub fn signal_process_ending(&self) -> bool {
        if self.ending_sent.swap(true, Ordering::AcqRel) {
            return true;
        }
        match self.platform.process_ending() {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to signal process ending: {:#}", e);
                false
            }
        }
    }

    /// Destroy any active session, tell the platform the process is ending,
    /// and stop the loops. Safe to call more than once.
    pub fn end_process(&self) -> bool {
        self.request_shutdown();
        self.teardown(None);
        self.signal_process_ending()
    }

    /// Ask the tick loop and the control API to stop.
    pub fn request_shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Resolves once [`LifecycleController::request_shutdown`] has been called.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.shutdown.subscribe();
        // The sender lives in `self`, so this only errors if `self` is gone.
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl PlatformCallbacks for LifecycleController {
    /// Installs a new session. Rejected unless the slot is idle, so a second
    /// start never clobbers a running match, and rejected once the process
    /// is shutting down.
    fn on_start_game_session(&self, descriptor: GameSessionDescriptor) -> bool {
        tracing::info!("on_start_game_session: {}", descriptor.session_id);
        let game_mode = descriptor
            .property("gameMode")
            .unwrap_or(DEFAULT_GAME_MODE)
            .to_owned();

        {
            let mut slot = self.slot.lock().expect("session slot poisoned");
            // Checked under the slot lock: `end_process` raises the flag
            // before it takes the session out.
            if self.is_shutting_down() {
                tracing::warn!(
                    "Rejecting session {}: process is shutting down",
                    descriptor.session_id
                );
                return false;
            }
            if slot.state != LifecycleState::Idle {
                tracing::warn!(
                    "Rejecting session {}: slot is {:?}",
                    descriptor.session_id,
                    slot.state
                );
                return false;
            }
            slot.session = Some(Session::with_config(
                descriptor.session_id.clone(),
                game_mode,
                self.session_config,
            ));
            slot.state = LifecycleState::Active;
        }
        self.metrics.session_started();

        // A terminate that raced in after the install has already torn the
        // session down; don't activate it behind `process_ending`.
        if self.is_shutting_down() {
            self.teardown(Some(&descriptor.session_id));
            return false;
        }
        if let Err(e) = self.platform.activate_game_session(&descriptor.session_id) {
            tracing::error!(
                "Failed to activate session {}: {:#}",
                descriptor.session_id,
                e
            );
            self.teardown(Some(&descriptor.session_id));
            return false;
        }
        true
    }

    fn on_process_terminate(&self) -> bool {
        tracing::info!("on_process_terminate");
        self.end_process()
    }

    fn on_health_check(&self) -> bool {
        tracing::debug!("on_health_check");
        true
    }
}
