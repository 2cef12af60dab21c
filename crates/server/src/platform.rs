//! Seam to the managed game-hosting platform.
//!
//! The platform drives the process through three inbound callbacks
//! ([`PlatformCallbacks`]) and receives two outbound signals
//! ([`HostPlatform::activate_game_session`], [`HostPlatform::process_ending`]).
//! [`LocalPlatform`] stands in for the managed service when running on a
//! developer machine; its inbound side is the HTTP control API.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One `{key, value}` game property attached to a session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProperty {
    pub key: String,
    pub value: String,
}

/// What the platform tells us about a session it wants started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionDescriptor {
    pub session_id: String,
    #[serde(default)]
    pub game_properties: Vec<GameProperty>,
}

impl GameSessionDescriptor {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            game_properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.game_properties.push(GameProperty {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Value of the property named `key`. When a key repeats, the last one wins.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.game_properties
            .iter()
            .rev()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

/// Registration handed to the platform once the process can host sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessParameters {
    /// Port clients connect to for gameplay.
    pub port: u16,
    /// Files the platform should collect when the process ends.
    pub log_paths: Vec<String>,
}

/// Inbound notifications from the platform. May be invoked from any thread.
pub trait PlatformCallbacks: Send + Sync {
    /// Start hosting the described session. Returns success.
    fn on_start_game_session(&self, descriptor: GameSessionDescriptor) -> bool;

    /// Tear down and prepare to exit. Returns success.
    fn on_process_terminate(&self) -> bool;

    /// Liveness probe. Must not block.
    fn on_health_check(&self) -> bool;
}

/// Outbound side of the platform SDK.
pub trait HostPlatform: Send + Sync {
    /// Initialize the SDK. Failure is fatal to the process.
    fn init_sdk(&self) -> Result<()>;

    /// Announce that this process is ready to host a session. Failure is
    /// fatal to the process.
    fn process_ready(&self, params: &ProcessParameters) -> Result<()>;

    /// Tell the platform the session it asked for is up and accepting players.
    fn activate_game_session(&self, session_id: &str) -> Result<()>;

    /// Tell the platform this process is about to exit.
    fn process_ending(&self) -> Result<()>;
}

/// In-process platform used when no managed service is present.
///
/// Records the outbound signals so they can be inspected.
#[derive(Debug, Default)]
pub struct LocalPlatform {
    params: Mutex<Option<ProcessParameters>>,
    activated: Mutex<Vec<String>>,
    ending: AtomicBool,
}

impl LocalPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters passed to the last `process_ready`, if any.
    pub fn process_parameters(&self) -> Option<ProcessParameters> {
        self.params.lock().expect("platform state poisoned").clone()
    }

    /// Every session id activated so far, oldest first.
    pub fn activated_sessions(&self) -> Vec<String> {
        self.activated.lock().expect("platform state poisoned").clone()
    }

    pub fn ending_signalled(&self) -> bool {
        self.ending.load(Ordering::Acquire)
    }
}

impl HostPlatform for LocalPlatform {
    fn init_sdk(&self) -> Result<()> {
        tracing::info!("Local platform SDK initialized");
        Ok(())
    }

    fn process_ready(&self, params: &ProcessParameters) -> Result<()> {
        tracing::info!("Process ready on port {}", params.port);
        *self.params.lock().expect("platform state poisoned") = Some(params.clone());
        Ok(())
    }

    fn activate_game_session(&self, session_id: &str) -> Result<()> {
        tracing::info!("Session {} activated", session_id);
        self.activated
            .lock()
            .expect("platform state poisoned")
            .push(session_id.to_owned());
        Ok(())
    }

    fn process_ending(&self) -> Result<()> {
        tracing::info!("Process ending");
        self.ending.store(true, Ordering::Release);
        Ok(())
    }
}
