pub mod config;
pub mod history;
pub mod metrics;
pub mod provider;
pub mod session;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, GameConfig,
    SanitizedConfig, SelectionConfig,
};
pub use history::{
    HistoryError, ScoreHistory, ScoreHistoryStore, SqliteScoreHistoryStore, SCORE_HISTORY_KEY,
};
pub use provider::{
    CountriesConfig, CountryFacts, CountryFactsProvider, GeoDbClient, GeoDbConfig,
    LocationProvider, LocationQuery, LocationRecord, ProviderError, RestCountriesClient,
    SortOrder,
};
pub use session::{
    CandidateSelector, DifficultyTier, Resolution, RoundOutcome, RoundView, ScoreKeeper,
    Selection, SessionEngine, SessionError, SessionPhase, SessionSnapshot, VisitAnswer,
    VisitPreference,
};
