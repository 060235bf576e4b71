use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;
use crate::render::Wrap;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/termrelay/config.toml` on Unix, or the equivalent
    /// via `dirs::config_dir()`. Falls back to the current directory.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("termrelay").join("config.toml")
    }

    /// Loads configuration from the default config file.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Loads and validates configuration from `path`.
    ///
    /// There is no built-in fallback: the bot token has to come from the
    /// file, so a missing file is a read error.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The bot token is set
    /// - A message has room for text after the `<pre>` wrapping
    /// - At least one send attempt and a non-zero tick interval
    /// - Command names are non-empty, slash-free and unique
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.is_blank() {
            return Err(invalid("bot_token must not be empty"));
        }

        let overhead = Wrap::pre().overhead();
        if self.relay.message_limit <= overhead {
            return Err(invalid(format!(
                "relay.message_limit must be greater than {}",
                overhead
            )));
        }
        if self.relay.max_retries == 0 {
            return Err(invalid("relay.max_retries must be at least 1"));
        }
        if self.relay.tick_interval_ms == 0 {
            return Err(invalid("relay.tick_interval_ms must be at least 1"));
        }

        let mut seen = HashSet::new();
        for command in &self.commands {
            let name = command.name.as_str();
            if name.is_empty() || name.starts_with('/') || name.contains(char::is_whitespace) {
                return Err(invalid(format!("Invalid command name '{}'", name)));
            }
            if matches!(name, "hello" | "help" | "start") {
                return Err(invalid(format!("Command name '{}' is reserved", name)));
            }
            if !seen.insert(name) {
                return Err(invalid(format!("Duplicate command name '{}'", name)));
            }
            if command.program.trim().is_empty() {
                return Err(invalid(format!("Command '{}' has no program", name)));
            }
        }

        Ok(())
    }

    /// Look up a configured command by name.
    pub fn command(&self, name: &str) -> Option<&crate::config::CommandSpec> {
        self.commands.iter().find(|c| c.name == name)
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        message: message.into(),
    }
}
