mod email;
mod push;

pub use email::{HttpEmailChannel, IEmailChannel, InMemoryEmailChannel, SentEmail};
pub use push::{IPushChannel, InMemoryPushChannel, OneSignalPushChannel, PushMessage, SentPush};

use crate::config::Config;
use reqwest::{Client, Response};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel is not configured: {0}")]
    NotConfigured(String),
    #[error("User has no {0} to deliver to")]
    MissingTarget(String),
    #[error("Request to provider failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Provider responded with status {status}: {body}")]
    Provider { status: u16, body: String },
}

/// The external channels reminders are delivered through
#[derive(Clone)]
pub struct Channels {
    pub push: Arc<dyn IPushChannel>,
    pub email: Arc<dyn IEmailChannel>,
}

impl Channels {
    /// Channels talking to the configured providers, every request is bounded
    /// by `Config::channel_timeout`
    pub fn create_http(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.channel_timeout).build()?;
        Ok(Self {
            push: Arc::new(OneSignalPushChannel::new(
                client.clone(),
                config.onesignal.clone(),
            )),
            email: Arc::new(HttpEmailChannel::new(client, config.email.clone())),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            push: Arc::new(InMemoryPushChannel::new()),
            email: Arc::new(InMemoryEmailChannel::new()),
        }
    }
}

/// Treats every non 2xx response as a failed delivery
async fn ensure_success(res: Response) -> Result<(), ChannelError> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }
    let body = res.text().await.unwrap_or_default();
    Err(ChannelError::Provider {
        status: status.as_u16(),
        body,
    })
}
