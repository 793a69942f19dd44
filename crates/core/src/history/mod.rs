//! Score history persisted across sessions.

mod sqlite_store;
mod store;

pub use sqlite_store::{SqliteScoreHistoryStore, SCORE_HISTORY_KEY};
pub use store::{HistoryError, ScoreHistory, ScoreHistoryStore};
