use medtrack_domain::{
    ChannelOutcome, ChannelTargets, DispatchOutcome, NotificationChannel, NotificationRecord,
    ReminderCandidate, ReminderMessage, ReminderTier, MEDICATION_REMINDER_TYPE,
};
use medtrack_infra::{ChannelError, Channels, INotificationRepo, ISys, MedtrackContext, PushMessage};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Unable to store the in-app notification: {0}")]
    InAppNotification(anyhow::Error),
}

/// Delivers one reminder tier of a dose to its owner.
///
/// The in-app notification is the durable record of the reminder and is always
/// created first. Push and email are best effort: their failures are logged and
/// reported in the `DispatchOutcome` but never fail the dispatch.
pub struct NotificationDispatcher {
    notifications: Arc<dyn INotificationRepo>,
    channels: Channels,
    sys: Arc<dyn ISys>,
}

impl NotificationDispatcher {
    pub fn new(ctx: &MedtrackContext) -> Self {
        Self {
            notifications: ctx.repos.notifications.clone(),
            channels: ctx.channels.clone(),
            sys: ctx.sys.clone(),
        }
    }

    pub async fn send(
        &self,
        candidate: &ReminderCandidate,
        tier: ReminderTier,
        targets: &ChannelTargets,
    ) -> Result<DispatchOutcome, DispatchError> {
        let now = self.sys.get_utc_now();
        let message = ReminderMessage::compose(
            tier,
            &candidate.medication_name,
            candidate.dose_info.as_deref(),
            candidate.minutes_overdue(now),
        );

        let record = NotificationRecord::medication_reminder(
            candidate.user_id().clone(),
            candidate.dose.medication_id.clone(),
            &message,
            now,
        );
        self.notifications
            .insert(&record)
            .await
            .map_err(DispatchError::InAppNotification)?;

        let push = self
            .deliver_push(candidate, tier, targets, &message, &record)
            .await;
        let email = self
            .deliver_email(candidate, tier, targets, &message)
            .await;

        Ok(DispatchOutcome {
            dose_id: candidate.dose_id().clone(),
            user_id: candidate.user_id().clone(),
            tier,
            notification_id: record.id,
            push,
            email,
        })
    }

    async fn deliver_push(
        &self,
        candidate: &ReminderCandidate,
        tier: ReminderTier,
        targets: &ChannelTargets,
        message: &ReminderMessage,
        record: &NotificationRecord,
    ) -> ChannelOutcome {
        if !candidate
            .preferences
            .channels
            .is_enabled(NotificationChannel::Push)
        {
            return disabled_by_user();
        }

        let push = PushMessage {
            title: message.title.clone(),
            body: message.body.clone(),
            data: serde_json::json!({
                "type": MEDICATION_REMINDER_TYPE,
                "doseId": candidate.dose_id(),
                "medicationId": candidate.dose.medication_id,
                "tier": tier.as_str(),
                "notificationId": record.id,
            }),
        };
        let res = match targets.push_token() {
            Some(token) => self.channels.push.send_push(token, &push).await,
            None => Err(ChannelError::MissingTarget("push token".into())),
        };
        channel_outcome(res, candidate, tier, NotificationChannel::Push)
    }

    async fn deliver_email(
        &self,
        candidate: &ReminderCandidate,
        tier: ReminderTier,
        targets: &ChannelTargets,
        message: &ReminderMessage,
    ) -> ChannelOutcome {
        if !candidate
            .preferences
            .channels
            .is_enabled(NotificationChannel::Email)
        {
            return disabled_by_user();
        }

        let res = match targets.email() {
            Some(address) => {
                self.channels
                    .email
                    .send_email(address, &message.title, &message.to_html())
                    .await
            }
            None => Err(ChannelError::MissingTarget("email address".into())),
        };
        channel_outcome(res, candidate, tier, NotificationChannel::Email)
    }
}

fn disabled_by_user() -> ChannelOutcome {
    ChannelOutcome::Skipped("disabled by user".into())
}

fn channel_outcome(
    res: Result<(), ChannelError>,
    candidate: &ReminderCandidate,
    tier: ReminderTier,
    channel: NotificationChannel,
) -> ChannelOutcome {
    match res {
        Ok(()) => ChannelOutcome::Sent,
        Err(e) => {
            warn!(
                dose_id = %candidate.dose_id(),
                tier = tier.as_str(),
                channel = channel.as_str(),
                "Failed to deliver reminder: {}",
                e
            );
            ChannelOutcome::Failed(e.to_string())
        }
    }
}
