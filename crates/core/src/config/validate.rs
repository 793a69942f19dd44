use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Session eviction timings are not 0
/// - Game rules describe a playable session
/// - GeoDB API key is present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    for (name, secs) in [
        ("session_idle_secs", config.server.session_idle_secs),
        ("completed_session_secs", config.server.completed_session_secs),
        ("session_sweep_secs", config.server.session_sweep_secs),
    ] {
        if secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "server.{} must be at least 1",
                name
            )));
        }
    }

    if config.game.rounds_per_session == 0 {
        return Err(ConfigError::ValidationError(
            "game.rounds_per_session must be at least 1".to_string(),
        ));
    }

    let selection = &config.game.selection;
    if selection.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "game.selection.max_attempts must be at least 1".to_string(),
        ));
    }
    if selection.easy_batch_size == 0 {
        return Err(ConfigError::ValidationError(
            "game.selection.easy_batch_size must be at least 1".to_string(),
        ));
    }
    for (name, range) in [
        ("easy_offset_range", selection.easy_offset_range),
        ("medium_offset_range", selection.medium_offset_range),
        ("hard_offset_range", selection.hard_offset_range),
    ] {
        if range == 0 {
            return Err(ConfigError::ValidationError(format!(
                "game.selection.{} must be at least 1",
                name
            )));
        }
    }

    if config.providers.geodb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "providers.geodb.api_key cannot be empty".to_string(),
        ));
    }

    Ok(())
}
