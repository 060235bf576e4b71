use serde::{Deserialize, Serialize};

use super::credentials::SecureString;
use crate::transport::telegram::DEFAULT_API_BASE_URL;

/// Root configuration container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Bot API token.
    pub bot_token: SecureString,
    /// Usernames allowed to use the bot. Empty or `["*"]` allows everyone.
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub relay: RelaySettings,
    /// Commands exposed as `/<name>`.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// Connection settings for the Bot API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// API root, without the `/bot<token>` part.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Long-poll timeout in seconds (default: 10).
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u64,
}

/// Tuning for the live relay of command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Live message refresh interval in milliseconds (default: 1000).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Maximum chars per message (default: 4000).
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
    /// Send attempts per message before giving up (default: 5).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// An external command the bot may run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Bot command name, without the leading slash.
    pub name: String,
    /// Executable to run.
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Shown in `/help`.
    #[serde(default)]
    pub description: Option<String>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_message_limit() -> usize {
    4000
}

fn default_max_retries() -> u32 {
    5
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_timeout_seconds: default_poll_timeout(),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            message_limit: default_message_limit(),
            max_retries: default_max_retries(),
        }
    }
}

impl RelaySettings {
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_interval_ms)
    }
}

impl CommandSpec {
    /// Build the process to run. Arguments come only from configuration.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}
