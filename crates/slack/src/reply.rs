use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::blocks::OutboundMessage;

pub const POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

#[derive(Debug, Error)]
pub enum ReplyError {
    #[error("reply request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("slack returned http status {0}")]
    Status(u16),
    #[error("slack rejected message: {0}")]
    Rejected(String),
}

/// Where outbound messages go.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ReplyError>;
}

/// Logs each reply instead of posting it. Used when no transport is wired.
#[derive(Default)]
pub struct LogReplySink;

#[async_trait]
impl ReplySink for LogReplySink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ReplyError> {
        info!(
            event_name = "egress.slack.reply_logged",
            channel = %message.channel,
            attachments = message.attachments.len(),
            text = %message.text,
            "reply"
        );
        Ok(())
    }
}

/// Keeps every reply in memory, in send order.
#[derive(Default)]
pub struct RecordingReplySink {
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingReplySink {
    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ReplySink for RecordingReplySink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ReplyError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Posts replies through `chat.postMessage` with the bot token.
pub struct WebApiReplySink {
    client: Client,
    token: SecretString,
    endpoint: String,
}

impl WebApiReplySink {
    pub fn new(token: SecretString) -> Self {
        Self::with_endpoint(token, POST_MESSAGE_URL)
    }

    pub fn with_endpoint(token: SecretString, endpoint: impl Into<String>) -> Self {
        Self { client: Client::new(), token, endpoint: endpoint.into() }
    }
}

#[async_trait]
impl ReplySink for WebApiReplySink {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ReplyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.token.expose_secret())
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ReplyError::Status(response.status().as_u16()));
        }

        let body: PostMessageResponse = response.json().await?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_owned());
            return Err(ReplyError::Rejected(reason));
        }

        debug!(
            event_name = "egress.slack.reply_posted",
            channel = %message.channel,
            "posted reply"
        );
        Ok(())
    }
}
