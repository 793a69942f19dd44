//! SQLite-backed score history.
//!
//! The whole history is one JSON record (`{"easy": 12, "hard": 4}`) stored
//! under a single well-known key and rewritten in a transaction on every
//! update.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::{HistoryError, ScoreHistory, ScoreHistoryStore};
use crate::session::DifficultyTier;

/// Key the serialized history is stored under.
pub const SCORE_HISTORY_KEY: &str = "geoquiz.score_history";

/// SQLite-backed score history store.
pub struct SqliteScoreHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteScoreHistoryStore {
    /// Open (or create) the database file and tables.
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        let conn = Connection::open(path).map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn =
            Connection::open_in_memory().map_err(|e| HistoryError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("connection lock poisoned".to_string()))
    }

    fn read_record(conn: &Connection) -> Result<ScoreHistory, HistoryError> {
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![SCORE_HISTORY_KEY],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        match value {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| HistoryError::Corrupt(e.to_string()))
            }
            None => Ok(ScoreHistory::new()),
        }
    }
}

impl ScoreHistoryStore for SqliteScoreHistoryStore {
    fn record_final_score(&self, tier: DifficultyTier, score: u32) -> Result<(), HistoryError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        let mut history = Self::read_record(&tx)?;
        history.insert(tier, score);

        let json =
            serde_json::to_string(&history).map_err(|e| HistoryError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![SCORE_HISTORY_KEY, json, Utc::now().to_rfc3339()],
        )
        .map_err(|e| HistoryError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| HistoryError::Database(e.to_string()))?;

        debug!("Recorded final score {} for {}", score, tier);
        Ok(())
    }

    fn history(&self) -> Result<ScoreHistory, HistoryError> {
        let conn = self.lock()?;
        Self::read_record(&conn)
    }
}
