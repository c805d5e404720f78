mod http;
mod inmemory;

pub use http::HttpEmailChannel;
pub use inmemory::{InMemoryEmailChannel, SentEmail};

use super::ChannelError;

#[async_trait::async_trait]
pub trait IEmailChannel: Send + Sync {
    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ChannelError>;
}
