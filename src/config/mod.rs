//! Startup configuration: bot credentials, allow-list, relay tuning and the
//! command table.

pub mod auth;
pub mod credentials;
pub mod loader;
pub mod types;

pub use auth::{Authorizer, REFUSAL_NOTICE};
pub use credentials::SecureString;
pub use loader::ConfigError;
pub use types::{CommandSpec, Config, RelaySettings, TelegramConfig};
