//! Telegram bot front-end.
//!
//! Long-polls for messages, checks the sender against the allow-list and
//! maps text commands onto relays of configured commands.

pub mod commands;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{Authorizer, Config, REFUSAL_NOTICE};
use crate::relay::{spawn_relay, RelayContext};
use crate::render::{split_by_lines, Wrap};
use crate::shutdown::ShutdownHandle;
use crate::transport::telegram::{Message, TelegramApi};
use crate::transport::{Recipient, SendOptions, Transport};

pub use commands::{help_text, parse_command, BotCommand};

const MAX_BACKOFF_SECS: u64 = 60;

pub struct Bot {
    api: Arc<TelegramApi>,
    config: Arc<Config>,
    authorizer: Authorizer,
    ctx: RelayContext,
    /// Relays and pending replies; both run off the polling loop.
    tasks: JoinSet<()>,
}

impl Bot {
    /// `api` is used for polling; replies and relays go through `transport`.
    pub fn new(api: Arc<TelegramApi>, transport: Arc<dyn Transport>, config: Config) -> Self {
        let authorizer = Authorizer::new(config.users.clone());
        let ctx = RelayContext::new(transport, config.relay);
        Self {
            api,
            config: Arc::new(config),
            authorizer,
            ctx,
            tasks: JoinSet::new(),
        }
    }

    /// Number of relays and replies that have not finished yet.
    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Poll for updates until shutdown, then wait for running relays.
    ///
    /// Running commands are never cancelled; shutdown only stops new ones.
    pub async fn run(mut self, shutdown: ShutdownHandle) {
        let poll_timeout = self.config.telegram.poll_timeout_seconds;
        let mut offset: Option<i64> = None;
        let mut backoff_secs = 1u64;

        info!(commands = self.config.commands.len(), "Bot started");

        loop {
            let updates = tokio::select! {
                result = self.api.get_updates(offset, poll_timeout) => result,
                _ = shutdown.wait() => break,
            };

            match updates {
                Ok(updates) => {
                    backoff_secs = 1;
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle_message(message);
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, backoff_secs, "getUpdates failed, backing off");
                    tokio::select! {
                        _ = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
                        _ = shutdown.wait() => break,
                    }
                    backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                }
            }

            self.reap_finished();
        }

        info!(pending = self.tasks.len(), "Bot stopping, waiting for running commands");
        self.drain().await;
    }

    /// Act on one incoming message.
    ///
    /// Never waits on delivery: replies and relays are spawned so a slow or
    /// unreachable chat cannot hold up polling for everyone else.
    pub fn handle_message(&mut self, message: Message) {
        let Some(text) = message.text.as_deref() else {
            return;
        };
        let chat = Recipient(message.chat.id);
        let username = message.from.as_ref().and_then(|u| u.username.as_deref());

        if !self.authorizer.is_allowed(username) {
            info!(chat_id = chat.0, username = username.unwrap_or("<none>"), "Refused user");
            self.reply(chat, vec![REFUSAL_NOTICE.to_string()]);
            return;
        }

        let config = Arc::clone(&self.config);
        match parse_command(text, &config) {
            BotCommand::Hello => {
                let last_name = message
                    .from
                    .as_ref()
                    .and_then(|u| u.last_name.as_deref())
                    .unwrap_or("");
                self.reply(
                    chat,
                    vec![
                        format!("hello!{}", last_name),
                        "bot configuration:".to_string(),
                        format!("{:#?}", config),
                    ],
                );
            }
            BotCommand::Help => {
                self.reply(chat, vec![help_text(&config)]);
            }
            BotCommand::Run(spec) => {
                info!(chat_id = chat.0, command = %spec.name, program = %spec.program, "Running command");
                let handle = spawn_relay(self.ctx.clone(), chat, spec.to_command());
                let name = spec.name.clone();
                self.tasks.spawn(async move {
                    let relay_id = handle.relay_id();
                    match handle.wait().await {
                        Ok(()) => info!(%relay_id, command = %name, "Command finished"),
                        Err(e) => warn!(%relay_id, command = %name, error = %e, "Command failed"),
                    }
                });
            }
            BotCommand::Unknown(name) => {
                let text = format!("Unknown command: /{}\n\n{}", name, help_text(&config));
                self.reply(chat, vec![text]);
            }
            BotCommand::NotACommand => {
                debug!(chat_id = chat.0, "Ignoring non-command text");
            }
        }
    }

    /// Wait for every running relay and reply to finish delivering.
    pub async fn drain(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Bot task ended abnormally");
            }
        }
    }

    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "Bot task ended abnormally");
            }
        }
    }

    /// Send plain-text `texts` in order from a background task, each split
    /// by lines when it exceeds the message limit.
    fn reply(&mut self, chat: Recipient, texts: Vec<String>) {
        let limit = self.ctx.settings.message_limit;
        let sender = self.ctx.sender();
        self.tasks.spawn(async move {
            for text in texts {
                let pieces =
                    split_by_lines(&text, limit).unwrap_or_else(|_| vec![text.clone()]);
                sender
                    .deliver_all(&chat, &pieces, &Wrap::none(), &SendOptions::plain())
                    .await;
            }
        });
    }
}
