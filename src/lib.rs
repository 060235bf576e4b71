//! Relay a running command's output to a Telegram chat.
//!
//! The command's combined stdout/stderr is rendered the way a terminal would
//! show it, kept visible as one message that is edited in place while the
//! command runs, and finally replaced with the complete output split into
//! message-sized chunks.

pub mod bot;
pub mod config;
pub mod relay;
pub mod render;
pub mod shutdown;
pub mod transport;
