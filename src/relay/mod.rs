//! Running commands and relaying their output to a chat.

pub mod capture;
pub mod orchestrator;
pub mod sender;

use std::sync::Arc;

use crate::config::RelaySettings;
use crate::transport::Transport;

pub use capture::{spawn_capture, Capture, CommandError, OutputLog, OutputWriter, ProcessOutcome};
pub use orchestrator::{run_relay, spawn_relay, RelayHandle, RelayPhase};
pub use sender::{Delivery, ReliableSender, DELIVERY_FAILED_NOTICE};

/// Everything a relay needs, passed explicitly instead of living in globals.
#[derive(Clone)]
pub struct RelayContext {
    pub transport: Arc<dyn Transport>,
    pub settings: RelaySettings,
}

impl RelayContext {
    pub fn new(transport: Arc<dyn Transport>, settings: RelaySettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// A sender using this context's transport and retry budget.
    pub fn sender(&self) -> ReliableSender {
        ReliableSender::new(Arc::clone(&self.transport), self.settings.max_retries)
    }
}
