//! Per-player state: position, health, progression, and liveness.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use voxel_engine::clock;

/// Highest (and initial) health value.
pub const MAX_HEALTH: i32 = 100;
/// Area every new player starts with.
pub const STARTING_AREA: &str = "starting_area";

/// World-space position in blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Position {
    /// Spawn point: above the origin.
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 100.0,
            z: 0.0,
        }
    }
}

/// A player in a session's roster.
///
/// `player_id` is assigned by the hosting platform and never changes.
/// Health is clamped to `0..=MAX_HEALTH` on every write. The progression
/// collections are sets: re-adding an entry is a no-op and entries are never
/// removed while the player exists.
#[derive(Debug, Clone)]
pub struct Player {
    player_id: String,
    player_name: String,
    position: Position,
    health: i32,
    level: i32,
    connected: bool,
    /// Wall-clock seconds of the last movement or reconnection.
    last_activity: i64,
    unlocked_areas: IndexSet<String>,
    learned_astras: IndexSet<String>,
    learned_siddhis: IndexSet<String>,
    has_brahma_kavacha: bool,
}

impl Player {
    pub fn new(player_id: impl Into<String>, player_name: impl Into<String>) -> Self {
        Self::new_at(player_id, player_name, clock::unix_now())
    }

    /// Construct a player whose last activity is `now`.
    pub fn new_at(player_id: impl Into<String>, player_name: impl Into<String>, now: i64) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            position: Position::default(),
            health: MAX_HEALTH,
            level: 1,
            connected: true,
            last_activity: now,
            unlocked_areas: IndexSet::from([STARTING_AREA.to_owned()]),
            learned_astras: IndexSet::new(),
            learned_siddhis: IndexSet::new(),
            has_brahma_kavacha: false,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Move the player. Always counts as activity.
    pub fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.set_position_at(x, y, z, clock::unix_now());
    }

    pub fn set_position_at(&mut self, x: f64, y: f64, z: f64, now: i64) {
        self.position = Position { x, y, z };
        self.last_activity = now;
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, MAX_HEALTH);
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn set_level(&mut self, level: i32) {
        self.level = level;
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Reconnecting refreshes the activity timestamp; disconnecting does not.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        if connected {
            self.update_activity();
        }
    }

    pub fn last_activity(&self) -> i64 {
        self.last_activity
    }

    pub fn update_activity(&mut self) {
        self.last_activity = clock::unix_now();
    }

    /// Whether the player has been inactive for strictly longer than
    /// `timeout_secs` as of `now`.
    pub fn is_idle(&self, now: i64, timeout_secs: i64) -> bool {
        now.saturating_sub(self.last_activity) > timeout_secs
    }

    pub fn unlocked_areas(&self) -> &IndexSet<String> {
        &self.unlocked_areas
    }

    pub fn learned_astras(&self) -> &IndexSet<String> {
        &self.learned_astras
    }

    pub fn learned_siddhis(&self) -> &IndexSet<String> {
        &self.learned_siddhis
    }

    /// Returns `false` if the area was already unlocked.
    pub fn add_unlocked_area(&mut self, area: impl Into<String>) -> bool {
        self.unlocked_areas.insert(area.into())
    }

    pub fn add_learned_astra(&mut self, astra: impl Into<String>) -> bool {
        self.learned_astras.insert(astra.into())
    }

    pub fn add_learned_siddhi(&mut self, siddhi: impl Into<String>) -> bool {
        self.learned_siddhis.insert(siddhi.into())
    }

    pub fn has_brahma_kavacha(&self) -> bool {
        self.has_brahma_kavacha
    }

    pub fn set_brahma_kavacha(&mut self, has: bool) {
        self.has_brahma_kavacha = has;
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            player_id: self.player_id.clone(),
            player_name: self.player_name.clone(),
            x: self.position.x,
            y: self.position.y,
            z: self.position.z,
            health: self.health,
            level: self.level,
            connected: self.connected,
            has_brahma_kavacha: self.has_brahma_kavacha,
            unlocked_areas: self.unlocked_areas.clone(),
            learned_astras: self.learned_astras.clone(),
            learned_siddhis: self.learned_siddhis.clone(),
        }
    }

    /// Compact JSON form of [`Player::state`].
    pub fn serialize(&self) -> String {
        serde_json::to_string(&self.state()).expect("player state is always serializable")
    }
}

/// Wire form of a player. The progression arrays carry set semantics;
/// their order means nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub player_id: String,
    pub player_name: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub health: i32,
    pub level: i32,
    pub connected: bool,
    pub has_brahma_kavacha: bool,
    pub unlocked_areas: IndexSet<String>,
    pub learned_astras: IndexSet<String>,
    pub learned_siddhis: IndexSet<String>,
}
