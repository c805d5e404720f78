use medtrack_domain::{
    format_date, ChannelOutcome, DispatchOutcome, ReminderCycleSummary, ReminderTier, ID,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOutcomeDTO {
    pub dose_id: ID,
    pub user_id: ID,
    pub tier: ReminderTier,
    pub notification_id: ID,
    pub push: ChannelOutcome,
    pub email: ChannelOutcome,
}

impl DispatchOutcomeDTO {
    pub fn new(outcome: DispatchOutcome) -> Self {
        Self {
            dose_id: outcome.dose_id,
            user_id: outcome.user_id,
            tier: outcome.tier,
            notification_id: outcome.notification_id,
            push: outcome.push,
            email: outcome.email,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderCycleSummaryDTO {
    pub date: String,
    pub scanned: usize,
    pub due: usize,
    pub claimed: usize,
    pub contended: usize,
    pub notifications_sent: usize,
    pub errors: usize,
    pub outcomes: Vec<DispatchOutcomeDTO>,
}

impl ReminderCycleSummaryDTO {
    pub fn new(summary: ReminderCycleSummary) -> Self {
        Self {
            date: format_date(&summary.date),
            scanned: summary.scanned,
            due: summary.due,
            claimed: summary.claimed,
            contended: summary.contended,
            notifications_sent: summary.notifications_sent,
            errors: summary.errors,
            outcomes: summary
                .outcomes
                .into_iter()
                .map(DispatchOutcomeDTO::new)
                .collect(),
        }
    }
}
