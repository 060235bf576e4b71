//! Shared test utilities and an in-memory transport.

#![allow(dead_code, unused_imports)]

pub mod mock_telegram;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use termrelay::config::RelaySettings;
use termrelay::relay::RelayContext;
use termrelay::transport::{MessageHandle, Recipient, SendOptions, Transport, TransportError};

pub const CHAT: Recipient = Recipient(42);

/// One call observed by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Send { message_id: i64, text: String },
    SendFailed { text: String },
    Edit { message_id: i64, text: String },
    EditFailed { message_id: i64, text: String },
    Delete { message_id: i64 },
    DeleteFailed { message_id: i64 },
}

/// Transport double that records every call and can be told to fail.
pub struct RecordingTransport {
    events: Mutex<Vec<Event>>,
    next_id: AtomicI64,
    /// Remaining sends that will fail before sends succeed again.
    failing_sends: AtomicU32,
    fail_edits: AtomicBool,
    fail_deletes: AtomicBool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failing_sends: AtomicU32::new(0),
            fail_edits: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        })
    }

    pub fn fail_next_sends(&self, count: u32) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Texts of successful sends, in order.
    pub fn sent_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Send { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Events recorded after the live message was deleted, or all events
    /// when there never was a live message.
    pub fn events_after_delete(&self) -> Vec<Event> {
        let events = self.events();
        match events
            .iter()
            .position(|e| matches!(e, Event::Delete { .. } | Event::DeleteFailed { .. }))
        {
            Some(idx) => events[idx + 1..].to_vec(),
            None => events,
        }
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        _recipient: &Recipient,
        text: &str,
        _options: &SendOptions,
    ) -> Result<MessageHandle, TransportError> {
        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            self.record(Event::SendFailed {
                text: text.to_string(),
            });
            return Err(TransportError::Rejected("scripted failure".to_string()));
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(Event::Send {
            message_id,
            text: text.to_string(),
        });
        Ok(MessageHandle {
            chat_id: CHAT.0,
            message_id,
        })
    }

    async fn edit(
        &self,
        message: &MessageHandle,
        text: &str,
        _options: &SendOptions,
    ) -> Result<(), TransportError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            self.record(Event::EditFailed {
                message_id: message.message_id,
                text: text.to_string(),
            });
            return Err(TransportError::Rejected("scripted edit failure".to_string()));
        }
        self.record(Event::Edit {
            message_id: message.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, message: &MessageHandle) -> Result<(), TransportError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            self.record(Event::DeleteFailed {
                message_id: message.message_id,
            });
            return Err(TransportError::Rejected("scripted delete failure".to_string()));
        }
        self.record(Event::Delete {
            message_id: message.message_id,
        });
        Ok(())
    }
}

/// Relay settings with a fast tick so tests see live updates quickly.
pub fn fast_settings() -> RelaySettings {
    RelaySettings {
        tick_interval_ms: 50,
        message_limit: 4000,
        max_retries: 3,
    }
}

pub fn context(transport: Arc<RecordingTransport>, settings: RelaySettings) -> RelayContext {
    RelayContext::new(transport, settings)
}

/// `sh -c <script>` as a tokio command.
pub fn shell(script: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.args(["-c", script]);
    cmd
}

/// Body of a `<pre>`-wrapped message.
pub fn unwrap_pre(text: &str) -> &str {
    text.strip_prefix("<pre>")
        .and_then(|t| t.strip_suffix("</pre>"))
        .unwrap_or_else(|| panic!("not a <pre> message: {text:?}"))
}
