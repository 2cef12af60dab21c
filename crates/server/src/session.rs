//! One game session: a world plus a bounded, lock-protected player roster.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use voxel_engine::{World, clock};

use crate::config::SessionConfig;
use crate::player::{Player, PlayerState};

/// Why a join was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejected {
    /// The roster already holds `max_players` players.
    RosterFull,
    /// A player with the same id is already in the roster.
    DuplicatePlayer,
}

impl fmt::Display for JoinRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinRejected::RosterFull => f.write_str("session is full"),
            JoinRejected::DuplicatePlayer => f.write_str("player is already in the session"),
        }
    }
}

impl std::error::Error for JoinRejected {}

/// Snapshot of every player in a session, taken under one roster lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub players: Vec<PlayerState>,
}

/// The runtime container for one match.
///
/// Owns its [`World`] and every [`Player`]; dropping the session frees both.
/// The roster lock and the world's chunk locks are independent and never
/// held at the same time.
pub struct Session {
    session_id: String,
    game_mode: String,
    world: World,
    /// Roster lock. Snapshots and lookups share it; joins, leaves, evictions
    /// and `with_player` mutations take it exclusively.
    players: RwLock<HashMap<String, Player>>,
    start_time: i64,
    config: SessionConfig,
}

impl Session {
    pub fn new(session_id: impl Into<String>, game_mode: impl Into<String>) -> Self {
        Self::with_config(session_id, game_mode, SessionConfig::default())
    }

    pub fn with_config(
        session_id: impl Into<String>,
        game_mode: impl Into<String>,
        config: SessionConfig,
    ) -> Self {
        let session_id = session_id.into();
        let game_mode = game_mode.into();
        tracing::info!("Creating session {} (mode: {})", session_id, game_mode);
        Self {
            world: World::new(session_id.clone()),
            session_id,
            game_mode,
            players: RwLock::new(HashMap::new()),
            start_time: clock::unix_now(),
            config,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn game_mode(&self) -> &str {
        &self.game_mode
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Admit a new player, or say why not. Neither a full roster nor an
    /// existing id changes anything.
    pub fn add_player_checked(
        &self,
        player_id: &str,
        player_name: &str,
    ) -> Result<(), JoinRejected> {
        let mut players = self.players.write().expect("session roster poisoned");
        let rejected = if players.len() >= self.config.max_players {
            Some(JoinRejected::RosterFull)
        } else if players.contains_key(player_id) {
            Some(JoinRejected::DuplicatePlayer)
        } else {
            None
        };
        if let Some(reason) = rejected {
            tracing::warn!("Rejected {} ({}): {}", player_name, player_id, reason);
            return Err(reason);
        }
        players.insert(player_id.to_owned(), Player::new(player_id, player_name));
        tracing::info!("Player joined: {} ({})", player_name, player_id);
        Ok(())
    }

    /// Returns `true` exactly when the roster grew by one.
    pub fn add_player(&self, player_id: &str, player_name: &str) -> bool {
        self.add_player_checked(player_id, player_name).is_ok()
    }

    /// Remove a player if present. Returns the removed player.
    pub fn remove_player(&self, player_id: &str) -> Option<Player> {
        let removed = self
            .players
            .write()
            .expect("session roster poisoned")
            .remove(player_id);
        if let Some(player) = &removed {
            tracing::info!("Player left: {} ({})", player.player_name(), player_id);
        }
        removed
    }

    /// Run `f` against a player while the roster lock is held. Returns `None`
    /// if the player is not in the roster.
    ///
    /// This is the way to mutate a player; nothing hands out references that
    /// outlive the lock.
    pub fn with_player<R>(&self, player_id: &str, f: impl FnOnce(&mut Player) -> R) -> Option<R> {
        let mut players = self.players.write().expect("session roster poisoned");
        players.get_mut(player_id).map(f)
    }

    /// Copy of a player's current state.
    pub fn get_player(&self, player_id: &str) -> Option<Player> {
        self.players
            .read()
            .expect("session roster poisoned")
            .get(player_id)
            .cloned()
    }

    pub fn player_count(&self) -> usize {
        self.players.read().expect("session roster poisoned").len()
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players
            .read()
            .expect("session roster poisoned")
            .keys()
            .cloned()
            .collect()
    }

    /// Tick hook: evict idle players. Returns the evicted ids.
    pub fn update(&self) -> Vec<String> {
        self.update_at(clock::unix_now())
    }

    /// [`Session::update`] as of an explicit wall-clock time.
    ///
    /// Scans under the read lock, releases it, then removes each candidate
    /// under its own write lock. A player who became active in between is
    /// re-checked and kept.
    pub fn update_at(&self, now: i64) -> Vec<String> {
        let timeout = i64::try_from(self.config.idle_timeout.as_secs()).unwrap_or(i64::MAX);
        let candidates: Vec<String> = {
            let players = self.players.read().expect("session roster poisoned");
            players
                .values()
                .filter(|p| p.is_idle(now, timeout))
                .map(|p| p.player_id().to_owned())
                .collect()
        };

        let mut evicted = Vec::with_capacity(candidates.len());
        for player_id in candidates {
            let mut players = self.players.write().expect("session roster poisoned");
            let still_idle = players
                .get(&player_id)
                .is_some_and(|p| p.is_idle(now, timeout));
            if still_idle {
                if let Some(player) = players.remove(&player_id) {
                    tracing::info!(
                        "Evicted idle player: {} ({})",
                        player.player_name(),
                        player_id
                    );
                    evicted.push(player_id);
                }
            }
        }
        evicted
    }

    /// All player states from a single roster observation.
    pub fn player_snapshot(&self) -> PlayerSnapshot {
        let players = self.players.read().expect("session roster poisoned");
        PlayerSnapshot {
            players: players.values().map(Player::state).collect(),
        }
    }

    /// Compact JSON `{"players":[...]}`.
    pub fn serialize_player_states(&self) -> String {
        serde_json::to_string(&self.player_snapshot())
            .expect("player snapshot is always serializable")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::info!("Destroying session {}", self.session_id);
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.session_id)
            .field("game_mode", &self.game_mode)
            .field("start_time", &self.start_time)
            .finish_non_exhaustive()
    }
}
