use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use geoquiz_core::{
    Config, CountryFactsProvider, LocationProvider, SanitizedConfig, ScoreHistoryStore,
    SessionEngine, SessionPhase,
};

use crate::metrics::{ACTIVE_SESSIONS, SESSIONS_CREATED_TOTAL, SESSIONS_EVICTED_TOTAL};

/// A registered engine and when a request last reached it.
struct SessionEntry {
    engine: Arc<SessionEngine>,
    last_touched: Instant,
}

/// Shared application state
pub struct AppState {
    config: Config,
    history: Arc<dyn ScoreHistoryStore>,
    location_provider: Arc<dyn LocationProvider>,
    facts_provider: Arc<dyn CountryFactsProvider>,
    /// One engine per playthrough, keyed by session id.
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

impl AppState {
    pub fn new(
        config: Config,
        history: Arc<dyn ScoreHistoryStore>,
        location_provider: Arc<dyn LocationProvider>,
        facts_provider: Arc<dyn CountryFactsProvider>,
    ) -> Self {
        Self {
            config,
            history,
            location_provider,
            facts_provider,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn history(&self) -> &dyn ScoreHistoryStore {
        self.history.as_ref()
    }

    /// Register a new engine in the `NotStarted` phase.
    pub async fn create_session(&self) -> (Uuid, Arc<SessionEngine>) {
        let id = Uuid::new_v4();
        let engine = Arc::new(SessionEngine::new(
            &self.config.game,
            Arc::clone(&self.location_provider),
            Arc::clone(&self.facts_provider),
            Arc::clone(&self.history),
        ));

        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id,
            SessionEntry {
                engine: Arc::clone(&engine),
                last_touched: Instant::now(),
            },
        );
        ACTIVE_SESSIONS.set(sessions.len() as i64);
        SESSIONS_CREATED_TOTAL.inc();

        info!("Created session {}", id);
        (id, engine)
    }

    /// Look up a session and mark it as recently used.
    pub async fn session(&self, id: &Uuid) -> Option<Arc<SessionEngine>> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_touched = Instant::now();
        Some(Arc::clone(&entry.engine))
    }

    /// Drop a session. Returns false if it did not exist.
    pub async fn remove_session(&self, id: &Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).is_some();
        ACTIVE_SESSIONS.set(sessions.len() as i64);
        if removed {
            info!("Removed session {}", id);
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Evict sessions idle past their TTL as of `now`.
    ///
    /// Completed sessions use the shorter `completed_session_secs` TTL.
    /// Evicted engines are reset so work still in flight is discarded.
    /// Returns the number of sessions evicted.
    pub async fn evict_idle_sessions(&self, now: Instant) -> usize {
        let idle_ttl = Duration::from_secs(self.config.server.session_idle_secs);
        let completed_ttl = Duration::from_secs(self.config.server.completed_session_secs);

        let registered: Vec<(Uuid, Arc<SessionEngine>, Instant)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, entry)| (*id, Arc::clone(&entry.engine), entry.last_touched))
            .collect();

        // engine locks are taken outside the registry lock
        let mut expired = Vec::new();
        for (id, engine, last_touched) in registered {
            let ttl = if engine.phase().await == SessionPhase::Complete {
                completed_ttl
            } else {
                idle_ttl
            };
            if now.saturating_duration_since(last_touched) >= ttl {
                expired.push((id, last_touched));
            }
        }

        if expired.is_empty() {
            return 0;
        }

        let evicted: Vec<(Uuid, Arc<SessionEngine>)> = {
            let mut sessions = self.sessions.write().await;
            let mut evicted = Vec::new();
            for (id, last_touched) in expired {
                // touched again since the scan
                if sessions
                    .get(&id)
                    .is_some_and(|entry| entry.last_touched != last_touched)
                {
                    continue;
                }
                if let Some(entry) = sessions.remove(&id) {
                    evicted.push((id, entry.engine));
                }
            }
            ACTIVE_SESSIONS.set(sessions.len() as i64);
            evicted
        };

        for (id, engine) in &evicted {
            engine.reset().await;
            debug!("Evicted idle session {}", id);
        }

        SESSIONS_EVICTED_TOTAL.inc_by(evicted.len() as u64);
        if !evicted.is_empty() {
            info!("Evicted {} idle session(s)", evicted.len());
        }
        evicted.len()
    }

    /// Periodically evict idle sessions. Runs until the task is aborted.
    pub async fn run_session_sweeper(self: Arc<Self>) {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.server.session_sweep_secs));
        loop {
            ticker.tick().await;
            self.evict_idle_sessions(Instant::now()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoquiz_core::{
        load_config_from_str,
        testing::{fixtures, MockCountryFactsProvider, MockLocationProvider},
        DifficultyTier, SqliteScoreHistoryStore,
    };

    async fn test_state(rounds: u32) -> AppState {
        let config = load_config_from_str(&format!(
            r#"
[server]
session_idle_secs = 600
completed_session_secs = 60

[game]
rounds_per_session = {}
seed = 3

[providers.geodb]
api_key = "test-key"
"#,
            rounds
        ))
        .unwrap();

        let locations = Arc::new(MockLocationProvider::new());
        locations.set_pool(fixtures::world_locations()).await;
        let facts = Arc::new(MockCountryFactsProvider::new());
        facts.set_countries(fixtures::world_facts()).await;

        AppState::new(
            config,
            Arc::new(SqliteScoreHistoryStore::in_memory().unwrap()),
            locations,
            facts,
        )
    }

    #[tokio::test]
    async fn test_fresh_sessions_are_kept() {
        let state = test_state(10).await;
        state.create_session().await;
        state.create_session().await;

        let evicted = state
            .evict_idle_sessions(Instant::now() + Duration::from_secs(599))
            .await;
        assert_eq!(evicted, 0);
        assert_eq!(state.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_idle_session_is_evicted_and_reset() {
        let state = test_state(10).await;
        let (id, engine) = state.create_session().await;
        engine.start_session(DifficultyTier::Easy).await.unwrap();

        let evicted = state
            .evict_idle_sessions(Instant::now() + Duration::from_secs(601))
            .await;
        assert_eq!(evicted, 1);
        assert!(state.session(&id).await.is_none());
        assert_eq!(state.session_count().await, 0);

        // handles held elsewhere see a reset engine
        assert_eq!(engine.phase().await, SessionPhase::NotStarted);
    }

    #[tokio::test]
    async fn test_lookup_refreshes_idle_timer() {
        let state = test_state(10).await;
        let (stale, _) = state.create_session().await;
        let (active, _) = state.create_session().await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        let scan_time = Instant::now();
        assert!(state.session(&active).await.is_some());

        // `active` was touched at or after `scan_time`, `stale` 20ms before it
        let now = scan_time + Duration::from_secs(600) - Duration::from_millis(1);
        assert_eq!(state.evict_idle_sessions(now).await, 1);
        assert!(state.session(&stale).await.is_none());
        assert!(state.session(&active).await.is_some());
    }

    #[tokio::test]
    async fn test_completed_session_is_evicted_sooner() {
        let state = test_state(1).await;
        let (done, engine) = state.create_session().await;
        let (waiting, _) = state.create_session().await;

        engine.start_session(DifficultyTier::Medium).await.unwrap();
        engine.skip().await.unwrap();
        engine.advance().await.unwrap();
        assert_eq!(engine.phase().await, SessionPhase::Complete);

        let evicted = state
            .evict_idle_sessions(Instant::now() + Duration::from_secs(61))
            .await;
        assert_eq!(evicted, 1);
        assert!(state.session(&done).await.is_none());
        assert!(state.session(&waiting).await.is_some());
    }

    #[tokio::test]
    async fn test_many_completed_sessions_do_not_accumulate() {
        let state = test_state(1).await;
        for _ in 0..50 {
            let (_, engine) = state.create_session().await;
            engine.start_session(DifficultyTier::Easy).await.unwrap();
            engine.skip().await.unwrap();
            engine.advance().await.unwrap();
        }
        assert_eq!(state.session_count().await, 50);

        state
            .evict_idle_sessions(Instant::now() + Duration::from_secs(60))
            .await;
        assert_eq!(state.session_count().await, 0);
    }
}
