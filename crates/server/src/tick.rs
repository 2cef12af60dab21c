//! Fixed-rate game loop on a dedicated thread.
//!
//! Each iteration sleeps out whatever is left of the tick period since the
//! previous tick started, then updates the active session. Missed ticks are
//! not caught up: a slow update just pushes the next tick back.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::lifecycle::LifecycleController;

/// Nominal duration of one tick at `tick_rate` ticks per second.
pub fn tick_period(tick_rate: u32) -> Duration {
    Duration::from_secs(1) / tick_rate.max(1)
}

/// How long to sleep before the next tick, given when the last one started.
/// `None` when the period has already elapsed.
pub fn remaining(last_tick: Instant, now: Instant, period: Duration) -> Option<Duration> {
    period
        .checked_sub(now.saturating_duration_since(last_tick))
        .filter(|d| !d.is_zero())
}

/// Start the game loop. It runs until the controller is asked to shut down.
pub fn spawn(controller: Arc<LifecycleController>, tick_rate: u32) -> io::Result<JoinHandle<()>> {
    let period = tick_period(tick_rate);
    thread::Builder::new()
        .name("tick".into())
        .spawn(move || run(&controller, period))
}

fn run(controller: &LifecycleController, period: Duration) {
    tracing::info!("Game loop started ({:?} per tick)", period);
    let mut last_tick = Instant::now();

    while !controller.is_shutting_down() {
        if let Some(wait) = remaining(last_tick, Instant::now(), period) {
            thread::sleep(wait);
        }
        last_tick = Instant::now();

        if let Some(took) = controller.tick() {
            if took > period {
                tracing::warn!("Slow tick: session update took {:?}", took);
            }
        }
    }

    tracing::info!("Game loop stopped");
}
