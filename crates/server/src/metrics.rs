//! Lock-free tick and session counters.
//!
//! The tick thread updates these with atomic operations only, so recording
//! never blocks the game loop. The control API reads them at its own pace.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Monotonic counters
    ticks_total: AtomicU64,
    tick_ns_sum: AtomicU64,
    players_evicted: AtomicU64,
    sessions_started: AtomicU64,
    sessions_ended: AtomicU64,

    // Tick duration histogram buckets
    hist_under_1ms: AtomicU64,
    hist_1_5ms: AtomicU64,
    hist_5_20ms: AtomicU64,
    hist_20_50ms: AtomicU64,
    hist_over_50ms: AtomicU64,

    started_at: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            ticks_total: AtomicU64::new(0),
            tick_ns_sum: AtomicU64::new(0),
            players_evicted: AtomicU64::new(0),
            sessions_started: AtomicU64::new(0),
            sessions_ended: AtomicU64::new(0),
            hist_under_1ms: AtomicU64::new(0),
            hist_1_5ms: AtomicU64::new(0),
            hist_5_20ms: AtomicU64::new(0),
            hist_20_50ms: AtomicU64::new(0),
            hist_over_50ms: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Called after each session update.
    pub fn record_tick(&self, duration: Duration, evicted: u64) {
        self.ticks_total.fetch_add(1, Relaxed);
        self.tick_ns_sum.fetch_add(duration.as_nanos() as u64, Relaxed);
        if evicted > 0 {
            self.players_evicted.fetch_add(evicted, Relaxed);
        }

        let bucket = match duration.as_millis() {
            0 => &self.hist_under_1ms,
            1..=4 => &self.hist_1_5ms,
            5..=19 => &self.hist_5_20ms,
            20..=49 => &self.hist_20_50ms,
            _ => &self.hist_over_50ms,
        };
        bucket.fetch_add(1, Relaxed);
    }

    pub fn session_started(&self) {
        self.sessions_started.fetch_add(1, Relaxed);
    }

    pub fn session_ended(&self) {
        self.sessions_ended.fetch_add(1, Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.started_at.elapsed().as_secs_f64(),
            ticks_total: self.ticks_total.load(Relaxed),
            tick_ns_sum: self.tick_ns_sum.load(Relaxed),
            players_evicted: self.players_evicted.load(Relaxed),
            sessions_started: self.sessions_started.load(Relaxed),
            sessions_ended: self.sessions_ended.load(Relaxed),
            hist: [
                self.hist_under_1ms.load(Relaxed),
                self.hist_1_5ms.load(Relaxed),
                self.hist_5_20ms.load(Relaxed),
                self.hist_20_50ms.load(Relaxed),
                self.hist_over_50ms.load(Relaxed),
            ],
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable snapshot of all counters at a point in time.
/// Rates (ticks/sec etc.) come from diffing consecutive snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: f64,
    pub ticks_total: u64,
    pub tick_ns_sum: u64,
    pub players_evicted: u64,
    pub sessions_started: u64,
    pub sessions_ended: u64,
    /// `[<1ms, 1-5ms, 5-20ms, 20-50ms, >50ms]`
    pub hist: [u64; 5],
}
