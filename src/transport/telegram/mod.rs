//! Telegram Bot API client.

pub mod api;
pub mod types;

pub use api::{TelegramApi, DEFAULT_API_BASE_URL};
pub use types::{Message, Update, User};
