use crate::{
    reminder::ReminderTier,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub const MEDICATION_REMINDER_TYPE: &str = "medication_reminder";

/// Which `ReminderTier`s a user wants to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierPreferences {
    pub at_time: bool,
    pub plus_10: bool,
    pub plus_20: bool,
    pub plus_30: bool,
    pub plus_60: bool,
}

impl TierPreferences {
    pub fn is_enabled(&self, tier: ReminderTier) -> bool {
        match tier {
            ReminderTier::AtTime => self.at_time,
            ReminderTier::Plus10 => self.plus_10,
            ReminderTier::Plus20 => self.plus_20,
            ReminderTier::Plus30 => self.plus_30,
            ReminderTier::Plus60 => self.plus_60,
        }
    }
}

impl Default for TierPreferences {
    fn default() -> Self {
        Self {
            at_time: true,
            plus_10: true,
            plus_20: true,
            plus_30: true,
            plus_60: true,
        }
    }
}

/// External channels a user has opted in to for medication reminders.
/// The in-app notification is always created and has no opt-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelPreferences {
    pub push: bool,
    pub email: bool,
}

impl ChannelPreferences {
    pub fn is_enabled(&self, channel: NotificationChannel) -> bool {
        match channel {
            NotificationChannel::Push => self.push,
            NotificationChannel::Email => self.email,
            NotificationChannel::InApp => true,
        }
    }
}

impl Default for ChannelPreferences {
    fn default() -> Self {
        Self {
            push: true,
            email: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    /// Master switch, no reminders at all are sent when this is off
    pub notifications_enabled: bool,
    pub tiers: TierPreferences,
    pub channels: ChannelPreferences,
}

impl Default for NotificationPreference {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            tiers: Default::default(),
            channels: Default::default(),
        }
    }
}

/// Where a user can be reached outside of the app
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelTargets {
    pub push_token: Option<String>,
    pub email: Option<String>,
}

impl ChannelTargets {
    pub fn push_token(&self) -> Option<&str> {
        non_blank(&self.push_token)
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn has_any(&self) -> bool {
        self.push_token().is_some() || self.email().is_some()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Push,
    Email,
    InApp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Email => "email",
            Self::InApp => "in_app",
        }
    }
}

impl Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Title and body of a reminder, shared by every channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderMessage {
    pub title: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn compose(
        tier: ReminderTier,
        medication_name: &str,
        dose_info: Option<&str>,
        minutes_overdue: i64,
    ) -> Self {
        if tier.is_overdue_reminder() {
            Self {
                title: "Missed dose reminder".into(),
                body: format!(
                    "Reminder: you haven't taken {} ({} min overdue)",
                    medication_name, minutes_overdue
                ),
            }
        } else {
            let dose_info = match dose_info.map(str::trim) {
                Some(info) if !info.is_empty() => format!(" ({})", info),
                _ => String::new(),
            };
            Self {
                title: "Medication reminder".into(),
                body: format!("Time to take {}{}", medication_name, dose_info),
            }
        }
    }

    /// Html version of the message used as email body
    pub fn to_html(&self) -> String {
        format!(
            "<h2>{}</h2><p>{}</p>",
            escape_html(&self.title),
            escape_html(&self.body)
        )
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// The in-app notification, a durable record of every reminder sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: ID,
    pub user_id: ID,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub related_medication_id: Option<ID>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

impl NotificationRecord {
    pub fn medication_reminder(
        user_id: ID,
        medication_id: ID,
        message: &ReminderMessage,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Default::default(),
            user_id,
            notification_type: MEDICATION_REMINDER_TYPE.into(),
            title: message.title.clone(),
            message: message.body.clone(),
            related_medication_id: Some(medication_id),
            created_at,
            is_read: false,
        }
    }
}

impl Entity for NotificationRecord {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Result of trying to deliver a reminder through one channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum ChannelOutcome {
    Sent,
    Failed(String),
    /// Not attempted, e.g. the user opted out or has no target for the channel
    Skipped(String),
}

impl ChannelOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// What happened when a reminder was dispatched. Only used for logging and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcome {
    pub dose_id: ID,
    pub user_id: ID,
    pub tier: ReminderTier,
    pub notification_id: ID,
    pub push: ChannelOutcome,
    pub email: ChannelOutcome,
}

impl DispatchOutcome {
    pub fn failed_channels(&self) -> Vec<NotificationChannel> {
        let mut failed = Vec::new();
        if self.push.is_failed() {
            failed.push(NotificationChannel::Push);
        }
        if self.email.is_failed() {
            failed.push(NotificationChannel::Email);
        }
        failed
    }

    pub fn delivered_externally(&self) -> bool {
        self.push.is_sent() || self.email.is_sent()
    }
}
