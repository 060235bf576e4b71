//! Live relay of a running command.
//!
//! While the command runs, one message is kept up to date with the tail of
//! its output. When the command exits that message is deleted and the full
//! output is sent as ordered chunks, followed by a termination notice when
//! the command failed.

use std::time::Duration;

use tokio::process::Command;
use tokio::sync::oneshot;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn, Instrument};
use uuid::Uuid;

use super::capture::{spawn_capture, CommandError, ProcessOutcome};
use super::RelayContext;
use crate::render::{collapse_bytes, live_preview, split_by_lines, Wrap, EMPTY_PLACEHOLDER};
use crate::transport::{MessageHandle, Recipient, SendOptions};

/// How long finalization waits for the output pipes to close after the
/// process exited. Background children holding the pipes open would
/// otherwise delay the final output forever.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Lifecycle of one relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    Starting,
    LiveUpdating,
    Finalizing,
    Done,
}

/// Completion signal for a relay started with [`spawn_relay`].
pub struct RelayHandle {
    relay_id: Uuid,
    done: oneshot::Receiver<ProcessOutcome>,
}

impl RelayHandle {
    pub fn relay_id(&self) -> Uuid {
        self.relay_id
    }

    /// Resolves once the final output has been delivered.
    pub async fn wait(self) -> ProcessOutcome {
        self.done.await.unwrap_or(Err(CommandError::WaiterLost))
    }
}

/// Run `command` and relay its output to `recipient` in a background task.
pub fn spawn_relay(ctx: RelayContext, recipient: Recipient, command: Command) -> RelayHandle {
    let relay_id = Uuid::new_v4();
    let (done_tx, done) = oneshot::channel();
    let span = tracing::info_span!("relay", %relay_id, chat_id = recipient.0);

    tokio::spawn(
        async move {
            let outcome = run_relay(&ctx, recipient, command).await;
            if done_tx.send(outcome).is_err() {
                trace!("Relay completion dropped (caller gone)");
            }
        }
        .instrument(span),
    );

    RelayHandle { relay_id, done }
}

/// Run `command` to completion, relaying its output.
///
/// Returns the process outcome after all final messages were sent.
pub async fn run_relay(
    ctx: &RelayContext,
    recipient: Recipient,
    command: Command,
) -> ProcessOutcome {
    enter(RelayPhase::Starting);
    let capture = spawn_capture(command);
    let log = capture.log;
    let mut outcome_rx = capture.outcome;

    let mut live = LiveMessage::new(recipient);
    let tick = ctx.settings.tick_interval();
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    enter(RelayPhase::LiveUpdating);
    let outcome = loop {
        tokio::select! {
            biased;
            result = &mut outcome_rx => {
                break result.unwrap_or(Err(CommandError::WaiterLost));
            }
            _ = ticker.tick() => {
                live.refresh(ctx, &log.snapshot()).await;
            }
        }
    };
    drop(ticker);

    enter(RelayPhase::Finalizing);
    if tokio::time::timeout(DRAIN_GRACE, capture.drained).await.is_err() {
        warn!("Output still open after exit, relaying what was captured");
    }

    live.remove(ctx).await;

    let pieces = final_pieces(&log.snapshot(), ctx.settings.message_limit);
    let sender = ctx.sender();
    let options = SendOptions::relay();
    sender
        .deliver_all(&recipient, &pieces, &Wrap::pre(), &options)
        .await;

    if let Err(e) = &outcome {
        info!(error = %e, "Command failed");
        sender
            .deliver(&recipient, &termination_notice(e), &Wrap::none(), &options)
            .await;
    }

    enter(RelayPhase::Done);
    outcome
}

fn enter(phase: RelayPhase) {
    debug!(?phase, "Relay phase");
}

/// Split the collapsed output into `<pre>`-wrappable pieces that fit
/// `limit` chars including the wrap.
///
/// Never empty: output with no visible text becomes a single placeholder.
pub fn final_pieces(snapshot: &[u8], limit: usize) -> Vec<String> {
    let text = collapse_bytes(snapshot).screen;
    let budget = limit.saturating_sub(Wrap::pre().overhead());

    let pieces = match split_by_lines(&text, budget) {
        Ok(pieces) => pieces,
        Err(e) => {
            warn!(error = %e, limit, "Cannot split output, sending it whole");
            vec![text.trim().to_string()]
        }
    };

    if pieces.iter().all(|p| p.is_empty()) {
        return vec![EMPTY_PLACEHOLDER.to_string()];
    }
    pieces
}

/// Message sent after the output when the command did not succeed.
pub fn termination_notice(error: &CommandError) -> String {
    format!("Terminated:\n\n{}", Wrap::pre().apply(&error.to_string()))
}

/// The single in-place message showing progress.
struct LiveMessage {
    recipient: Recipient,
    handle: Option<MessageHandle>,
    last_text: Option<String>,
}

impl LiveMessage {
    fn new(recipient: Recipient) -> Self {
        Self {
            recipient,
            handle: None,
            last_text: None,
        }
    }

    /// Create or edit the live message from the current snapshot.
    ///
    /// Neither path retries: a later tick or finalization supersedes it.
    async fn refresh(&mut self, ctx: &RelayContext, snapshot: &[u8]) {
        let text = live_preview(snapshot, ctx.settings.message_limit, &Wrap::pre());
        if self.last_text.as_deref() == Some(text.as_str()) {
            trace!("Live message unchanged");
            return;
        }

        let options = SendOptions::relay();
        match self.handle {
            None => match ctx.transport.send(&self.recipient, &text, &options).await {
                Ok(handle) => {
                    debug!(message_id = handle.message_id, "Live message created");
                    self.handle = Some(handle);
                    self.last_text = Some(text);
                }
                Err(e) => warn!(error = %e, "Sending live message failed"),
            },
            Some(handle) => match ctx.transport.edit(&handle, &text, &options).await {
                Ok(()) => self.last_text = Some(text),
                Err(e) => debug!(error = %e, "Editing live message failed"),
            },
        }
    }

    async fn remove(&mut self, ctx: &RelayContext) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = ctx.transport.delete(&handle).await {
            warn!(
                message_id = handle.message_id,
                error = %e,
                "Deleting live message failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_pieces_of_empty_output_is_placeholder() {
        assert_eq!(final_pieces(b"", 4000), vec!["..."]);
        assert_eq!(final_pieces(b"\n \n", 4000), vec!["..."]);
    }

    #[test]
    fn final_pieces_fit_with_wrap() {
        let output = "y".repeat(5000);
        let pieces = final_pieces(output.as_bytes(), 4000);
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!(Wrap::pre().overhead() + piece.chars().count() <= 4000);
        }
        assert_eq!(pieces.concat(), output);
    }

    #[test]
    fn final_pieces_are_collapsed() {
        let pieces = final_pieces(b"50%\r100%\ndone\n", 4000);
        assert_eq!(pieces, vec!["100%\ndone"]);
    }

    #[test]
    fn final_pieces_keep_high_water_floor() {
        let pieces = final_pieces(b"abc\rxy", 4000);
        assert_eq!(pieces, vec!["xyc"]);
        let floor = crate::render::collapse("abc\rxy").len();
        assert!(pieces[0].chars().count() >= floor);
    }

    #[test]
    fn final_pieces_with_unusable_limit_fall_back_to_whole_text() {
        assert_eq!(final_pieces(b"  abc  ", 5), vec!["abc"]);
    }

    #[test]
    fn termination_notice_wraps_error_text() {
        let err = CommandError::WaiterLost;
        assert_eq!(
            termination_notice(&err),
            "Terminated:\n\n<pre>command watcher stopped before reporting an exit status</pre>"
        );
    }
}
