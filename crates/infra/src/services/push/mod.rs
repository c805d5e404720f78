mod inmemory;
mod onesignal;

pub use inmemory::{InMemoryPushChannel, SentPush};
pub use onesignal::OneSignalPushChannel;

use super::ChannelError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// Extra payload handed to the app when the notification is opened
    pub data: serde_json::Value,
}

#[async_trait::async_trait]
pub trait IPushChannel: Send + Sync {
    /// Sends a push notification to the device identified by `target`
    async fn send_push(&self, target: &str, message: &PushMessage) -> Result<(), ChannelError>;
}
