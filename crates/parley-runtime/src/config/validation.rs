//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{BotSettings, LogOutput, LoggingConfig, ParleyConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ParleyConfig) -> ConfigResult<()> {
    validate_bot_settings(&config.bot)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_bot_settings(bot: &BotSettings) -> ConfigResult<()> {
    // Messages are tokenized on whitespace, so a prefix containing it
    // could never match a single leading token.
    if bot.command_prefix.chars().any(char::is_whitespace) {
        return Err(ConfigError::validation(format!(
            "Command prefix cannot contain whitespace: {:?}",
            bot.command_prefix
        )));
    }

    if bot.ack_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Acknowledgement timeout must be greater than 0",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation("max_files must be greater than 0"));
    }

    for target in logging.filters.keys() {
        if target.is_empty() || target.contains(char::is_whitespace) {
            return Err(ConfigError::validation(format!(
                "Invalid log filter target: {target:?}"
            )));
        }
    }

    Ok(())
}
