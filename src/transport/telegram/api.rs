//! Raw HTTP calls to the Telegram Bot API.
//!
//! Wraps reqwest for `sendMessage`, `editMessageText`, `deleteMessage` and
//! `getUpdates`.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::types::{ApiResponse, SentMessage, Update};
use crate::transport::{MessageHandle, Recipient, SendOptions, Transport, TransportError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Low-level Telegram Bot API client.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> Self {
        Self::with_base_url(bot_token, DEFAULT_API_BASE_URL)
    }

    /// Create a client against a custom API root (self-hosted Bot API
    /// server, or a mock in tests).
    pub fn with_base_url(bot_token: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), bot_token),
        }
    }

    /// Long-poll for new updates.
    ///
    /// `offset` should be `last_update_id + 1` to acknowledge earlier updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout: u64,
    ) -> Result<Vec<Update>, TransportError> {
        let mut body = json!({
            "timeout": timeout,
            "allowed_updates": ["message"],
        });
        if let Some(off) = offset {
            body["offset"] = json!(off);
        }

        let updates: Option<Vec<Update>> = self.call("getUpdates", body).await?;
        Ok(updates.unwrap_or_default())
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
    ) -> Result<Option<T>, TransportError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await?;

        let api_resp: ApiResponse<T> = resp.json().await?;
        if !api_resp.ok {
            let description = api_resp.description.unwrap_or_default();
            warn!(method, %description, "Telegram API call failed");
            return Err(TransportError::Api { description });
        }
        Ok(api_resp.result)
    }
}

fn apply_options(body: &mut Value, options: &SendOptions) {
    if let Some(mode) = options.parse_mode {
        body["parse_mode"] = json!(mode.as_str());
    }
    if options.disable_preview {
        body["link_preview_options"] = json!({ "is_disabled": true });
    }
    if options.silent {
        body["disable_notification"] = json!(true);
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn send(
        &self,
        recipient: &Recipient,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageHandle, TransportError> {
        let mut body = json!({
            "chat_id": recipient.0,
            "text": text,
        });
        apply_options(&mut body, options);

        debug!(chat_id = recipient.0, "sendMessage");
        let sent: Option<SentMessage> = self.call("sendMessage", body).await?;
        let sent = sent.ok_or_else(|| TransportError::Api {
            description: "sendMessage returned no message".to_string(),
        })?;

        Ok(MessageHandle {
            chat_id: recipient.0,
            message_id: sent.message_id,
        })
    }

    async fn edit(
        &self,
        message: &MessageHandle,
        text: &str,
        options: &SendOptions,
    ) -> Result<(), TransportError> {
        let mut body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
            "text": text,
        });
        apply_options(&mut body, options);
        // Silent delivery is not an edit option.
        if let Some(obj) = body.as_object_mut() {
            obj.remove("disable_notification");
        }

        debug!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            "editMessageText"
        );
        let _: Option<Value> = self.call("editMessageText", body).await?;
        Ok(())
    }

    async fn delete(&self, message: &MessageHandle) -> Result<(), TransportError> {
        let body = json!({
            "chat_id": message.chat_id,
            "message_id": message.message_id,
        });

        debug!(
            chat_id = message.chat_id,
            message_id = message.message_id,
            "deleteMessage"
        );
        let _: Option<bool> = self.call("deleteMessage", body).await?;
        Ok(())
    }
}
