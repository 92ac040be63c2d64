//! Per-session encounter ownership.
//!
//! An [`Encounter`] has no locking of its own. `EncounterSessions` gives each
//! game session its own encounter behind a `tokio::sync::Mutex`, so calls
//! within a session are serialized while separate sessions run in parallel.

use crate::config::EncounterConfig;
use crate::dice::DieRoller;
use crate::encounter::Encounter;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Handle to one session's encounter.
pub type SharedEncounter<R> = Arc<Mutex<Encounter<R>>>;

/// Registry of encounters keyed by session id.
pub struct EncounterSessions<R: DieRoller> {
    config: EncounterConfig,
    encounters: RwLock<HashMap<String, SharedEncounter<R>>>,
}

impl<R: DieRoller> EncounterSessions<R> {
    /// Every encounter opened through this registry uses `config`.
    pub fn new(config: EncounterConfig) -> Self {
        Self {
            config,
            encounters: RwLock::new(HashMap::new()),
        }
    }

    /// The session's encounter, creating it with `roller` if it has none yet.
    ///
    /// `roller` is dropped unused when the session already has an encounter.
    pub async fn open(&self, session: impl Into<String>, roller: R) -> SharedEncounter<R> {
        let session = session.into();
        let mut encounters = self.encounters.write().await;
        encounters
            .entry(session.clone())
            .or_insert_with(|| {
                tracing::debug!(session = %session, "Opened encounter for session");
                Arc::new(Mutex::new(Encounter::with_config(self.config.clone(), roller)))
            })
            .clone()
    }

    pub async fn get(&self, session: &str) -> Option<SharedEncounter<R>> {
        self.encounters.read().await.get(session).cloned()
    }

    /// Forget a session's encounter. Outstanding handles keep working.
    pub async fn close(&self, session: &str) -> Option<SharedEncounter<R>> {
        let removed = self.encounters.write().await.remove(session);
        if removed.is_some() {
            tracing::debug!(session, "Closed encounter for session");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.encounters.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.encounters.read().await.is_empty()
    }
}

impl<R: DieRoller> Default for EncounterSessions<R> {
    fn default() -> Self {
        Self::new(EncounterConfig::default())
    }
}
