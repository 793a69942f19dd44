use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::provider::{CountriesConfig, GeoDbConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub game: GameConfig,
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Sessions untouched for this long are dropped from the registry.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    /// Completed sessions stay readable this long after their last request.
    #[serde(default = "default_completed_session_secs")]
    pub completed_session_secs: u64,
    /// How often the registry is swept.
    #[serde(default = "default_session_sweep_secs")]
    pub session_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session_idle_secs: default_session_idle_secs(),
            completed_session_secs: default_completed_session_secs(),
            session_sweep_secs: default_session_sweep_secs(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_session_idle_secs() -> u64 {
    30 * 60
}

fn default_completed_session_secs() -> u64 {
    60
}

fn default_session_sweep_secs() -> u64 {
    30
}

/// Database configuration (score history lives here)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("geoquiz.db")
}

/// Game rules configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    /// Rounds in one playthrough.
    #[serde(default = "default_rounds_per_session")]
    pub rounds_per_session: u32,
    /// Fixed RNG seed for candidate selection (random when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(default)]
    pub selection: SelectionConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rounds_per_session: default_rounds_per_session(),
            seed: None,
            selection: SelectionConfig::default(),
        }
    }
}

fn default_rounds_per_session() -> u32 {
    10
}

/// Candidate selection query shape per difficulty tier.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SelectionConfig {
    /// Lookup attempts before giving up on finding an unused country.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Population floor for Easy lookups.
    #[serde(default = "default_easy_min_population")]
    pub easy_min_population: u64,
    /// Candidates requested per Easy lookup.
    #[serde(default = "default_easy_batch_size")]
    pub easy_batch_size: u32,
    /// Exclusive upper bound of the random offset for Easy lookups.
    #[serde(default = "default_easy_offset_range")]
    pub easy_offset_range: u32,
    /// Exclusive upper bound of the random offset for Medium lookups.
    #[serde(default = "default_medium_offset_range")]
    pub medium_offset_range: u32,
    /// Exclusive upper bound of the random offset for Hard lookups.
    #[serde(default = "default_hard_offset_range")]
    pub hard_offset_range: u32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            easy_min_population: default_easy_min_population(),
            easy_batch_size: default_easy_batch_size(),
            easy_offset_range: default_easy_offset_range(),
            medium_offset_range: default_medium_offset_range(),
            hard_offset_range: default_hard_offset_range(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_easy_min_population() -> u64 {
    500_000
}

fn default_easy_batch_size() -> u32 {
    10
}

fn default_easy_offset_range() -> u32 {
    1_000
}

fn default_medium_offset_range() -> u32 {
    1_000
}

fn default_hard_offset_range() -> u32 {
    10_000
}

/// External data providers
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// GeoDB Cities (location lookups)
    pub geodb: GeoDbConfig,
    /// REST Countries (country facts)
    #[serde(default)]
    pub countries: CountriesConfig,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub game: GameConfig,
    pub providers: SanitizedProvidersConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    pub geodb: SanitizedGeoDbConfig,
    pub countries: CountriesConfig,
}

/// Sanitized GeoDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedGeoDbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let geodb = &config.providers.geodb;
        Self {
            server: config.server.clone(),
            database: config.database.clone(),
            game: config.game.clone(),
            providers: SanitizedProvidersConfig {
                geodb: SanitizedGeoDbConfig {
                    base_url: geodb.base_url.clone(),
                    api_key_configured: !geodb.api_key.is_empty(),
                    timeout_secs: geodb.timeout_secs,
                },
                countries: config.providers.countries.clone(),
            },
        }
    }
}
