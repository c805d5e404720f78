use super::{IPushChannel, PushMessage};
use crate::config::OneSignalConfig;
use crate::services::{ensure_success, ChannelError};
use reqwest::{header, Client};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Serialize)]
struct CreateNotificationRequest<'a> {
    app_id: &'a str,
    include_player_ids: Vec<&'a str>,
    headings: HashMap<&'static str, &'a str>,
    contents: HashMap<&'static str, &'a str>,
    data: &'a serde_json::Value,
}

/// Push notifications through the OneSignal REST api
pub struct OneSignalPushChannel {
    client: Client,
    config: OneSignalConfig,
}

impl OneSignalPushChannel {
    pub fn new(client: Client, config: OneSignalConfig) -> Self {
        Self { client, config }
    }

    fn notifications_url(&self) -> String {
        format!("{}/notifications", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait::async_trait]
impl IPushChannel for OneSignalPushChannel {
    async fn send_push(&self, target: &str, message: &PushMessage) -> Result<(), ChannelError> {
        let (app_id, api_key) = match (&self.config.app_id, &self.config.api_key) {
            (Some(app_id), Some(api_key)) => (app_id, api_key),
            _ => {
                return Err(ChannelError::NotConfigured(
                    "ONESIGNAL_APP_ID and ONESIGNAL_API_KEY must be set".into(),
                ))
            }
        };

        let body = CreateNotificationRequest {
            app_id,
            include_player_ids: vec![target],
            headings: vec![("en", message.title.as_str())].into_iter().collect(),
            contents: vec![("en", message.body.as_str())].into_iter().collect(),
            data: &message.data,
        };

        let res = self
            .client
            .post(&self.notifications_url())
            .header(header::AUTHORIZATION, format!("Basic {}", api_key))
            .json(&body)
            .send()
            .await?;

        ensure_success(res).await
    }
}
