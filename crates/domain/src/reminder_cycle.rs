use crate::notification::DispatchOutcome;
use chrono::NaiveDate;

/// What happened during one reminder pass
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCycleSummary {
    /// The local date whose doses were scanned
    pub date: NaiveDate,
    /// Candidate doses fetched from the store
    pub scanned: usize,
    /// Doses that had a tier due
    pub due: usize,
    /// Tiers this pass won the claim for
    pub claimed: usize,
    /// Tiers that another pass had already claimed
    pub contended: usize,
    /// Reminders dispatched, i.e. in-app records created
    pub notifications_sent: usize,
    /// Doses whose processing failed
    pub errors: usize,
    pub outcomes: Vec<DispatchOutcome>,
}

impl ReminderCycleSummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            scanned: 0,
            due: 0,
            claimed: 0,
            contended: 0,
            notifications_sent: 0,
            errors: 0,
            outcomes: Vec::new(),
        }
    }

    /// Number of failed push or email deliveries
    pub fn channel_failures(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| o.failed_channels().len())
            .sum()
    }

    /// Number of reminders that reached the user through push or email
    pub fn delivered_externally(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.delivered_externally())
            .count()
    }
}
