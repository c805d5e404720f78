use super::IEmailChannel;
use crate::config::EmailConfig;
use crate::services::{ensure_success, ChannelError};
use reqwest::Client;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// Sends email through a transactional email REST api authenticated
/// with a bearer token
pub struct HttpEmailChannel {
    client: Client,
    config: EmailConfig,
}

impl HttpEmailChannel {
    pub fn new(client: Client, config: EmailConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl IEmailChannel for HttpEmailChannel {
    async fn send_email(
        &self,
        address: &str,
        subject: &str,
        html_body: &str,
    ) -> Result<(), ChannelError> {
        let (api_url, from) = match (&self.config.api_url, &self.config.from) {
            (Some(api_url), Some(from)) => (api_url, from),
            _ => {
                return Err(ChannelError::NotConfigured(
                    "EMAIL_API_URL and EMAIL_FROM must be set".into(),
                ))
            }
        };

        let mut req = self.client.post(api_url).json(&SendEmailRequest {
            from,
            to: address,
            subject,
            html: html_body,
        });
        if let Some(api_key) = &self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        let res = req.send().await?;
        ensure_success(res).await
    }
}
