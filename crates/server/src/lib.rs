//! Authoritative server for one voxel game session at a time.
//!
//! The hosting platform starts, health-checks, and terminates sessions
//! through [`lifecycle::LifecycleController`]; a dedicated thread ticks the
//! active [`session::Session`] at a fixed rate.

pub mod app;
pub mod config;
pub mod control;
pub mod lifecycle;
pub mod metrics;
pub mod platform;
pub mod player;
pub mod session;
pub mod tick;
