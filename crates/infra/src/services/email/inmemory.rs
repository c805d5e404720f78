use super::IEmailChannel;
use crate::services::ChannelError;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub address: String,
    pub subject: String,
    pub html_body: String,
}

/// Records emails instead of sending them, used for testing
pub struct InMemoryEmailChannel {
    sent: Mutex<Vec<SentEmail>>,
}

impl InMemoryEmailChannel {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for InMemoryEmailChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IEmailChannel for InMemoryEmailChannel {
    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(SentEmail {
            address: address.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}
