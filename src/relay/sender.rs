//! Reliable delivery of single messages.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::render::Wrap;
use crate::transport::{MessageHandle, Recipient, SendOptions, Transport};

/// Sent once when a message could not be delivered within the retry budget.
pub const DELIVERY_FAILED_NOTICE: &str =
    "Messages not sent, please check your terminal log. (it may not be an issue with networking)";

/// Result of one logical send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Delivered(MessageHandle),
    /// Every attempt failed; the failure notice was sent (best effort).
    GaveUp { attempts: u32 },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Delivered(_))
    }
}

/// Sends a message with immediate retries, falling back to a failure notice.
pub struct ReliableSender {
    transport: Arc<dyn Transport>,
    max_retries: u32,
}

impl ReliableSender {
    /// `max_retries` is the total number of attempts per message; zero is
    /// treated as one.
    pub fn new(transport: Arc<dyn Transport>, max_retries: u32) -> Self {
        Self {
            transport,
            max_retries: max_retries.max(1),
        }
    }

    /// Deliver `body` wrapped in `wrap`.
    ///
    /// Each call starts with a fresh attempt budget. There is no backoff
    /// between attempts.
    pub async fn deliver(
        &self,
        recipient: &Recipient,
        body: &str,
        wrap: &Wrap,
        options: &SendOptions,
    ) -> Delivery {
        let text = wrap.apply(body);

        for attempt in 1..=self.max_retries {
            match self.transport.send(recipient, &text, options).await {
                Ok(handle) => {
                    debug!(attempt, message_id = handle.message_id, "Message delivered");
                    return Delivery::Delivered(handle);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        chars = text.chars().count(),
                        error = %e,
                        "Send failed"
                    );
                }
            }
        }

        error!(
            attempts = self.max_retries,
            "Giving up on message, sending failure notice"
        );
        let notice_options = SendOptions {
            parse_mode: None,
            ..*options
        };
        if let Err(e) = self
            .transport
            .send(recipient, DELIVERY_FAILED_NOTICE, &notice_options)
            .await
        {
            error!(error = %e, "Failure notice could not be sent either");
        }

        Delivery::GaveUp {
            attempts: self.max_retries,
        }
    }

    /// Deliver `pieces` in order, each with its own retry budget.
    pub async fn deliver_all(
        &self,
        recipient: &Recipient,
        pieces: &[String],
        wrap: &Wrap,
        options: &SendOptions,
    ) -> Vec<Delivery> {
        let mut results = Vec::with_capacity(pieces.len());
        for (index, piece) in pieces.iter().enumerate() {
            debug!(index, total = pieces.len(), "Sending piece");
            results.push(self.deliver(recipient, piece, wrap, options).await);
        }
        results
    }
}
