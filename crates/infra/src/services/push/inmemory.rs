use super::{IPushChannel, PushMessage};
use crate::services::ChannelError;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct SentPush {
    pub target: String,
    pub message: PushMessage,
}

/// Records pushes instead of sending them, used for testing
pub struct InMemoryPushChannel {
    sent: Mutex<Vec<SentPush>>,
}

impl InMemoryPushChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
        }
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryPushChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IPushChannel for InMemoryPushChannel {
    async fn send_push(&self, target: &str, message: &PushMessage) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(SentPush {
            target: target.to_string(),
            message: message.clone(),
        });
        Ok(())
    }
}
