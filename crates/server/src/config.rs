//! Compile-time limits and runtime configuration.

use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;

/// Maximum number of players in one session's roster.
pub const MAX_PLAYERS: usize = 16;
/// Game-loop updates per second.
pub const TICK_RATE: u32 = 20;
/// A player with no movement or reconnection for longer than this is evicted.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Game port reported to the hosting platform.
pub const DEFAULT_PORT: u16 = 7777;
/// Game mode used when the session descriptor carries no `gameMode` property.
pub const DEFAULT_GAME_MODE: &str = "standard";

/// Command-line / environment configuration for the server process.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Authoritative voxel game-session server")]
pub struct ServerConfig {
    /// Game port reported to the hosting platform
    #[arg(short, long, env = "VOXEL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address of the local platform control API
    #[arg(long, env = "VOXEL_CONTROL_BIND", default_value = "127.0.0.1:7778")]
    pub control_bind: SocketAddr,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "VOXEL_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Game-loop updates per second
    #[arg(short, long, env = "VOXEL_TICK_RATE", default_value_t = TICK_RATE,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub tick_rate: u32,

    /// Seconds without activity before a player is evicted
    #[arg(long, env = "VOXEL_IDLE_TIMEOUT_SECS", default_value_t = IDLE_TIMEOUT.as_secs(),
          value_parser = clap::value_parser!(u64).range(..=i64::MAX as u64))]
    pub idle_timeout_secs: u64,
}

impl ServerConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_players: MAX_PLAYERS,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
        }
    }
}

/// Per-session roster policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_players: usize,
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_players: MAX_PLAYERS,
            idle_timeout: IDLE_TIMEOUT,
        }
    }
}
