use crate::{
    reminder::ReminderTier,
    shared::entity::{Entity, ID},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Pending,
    Taken,
    Skipped,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Taken => "taken",
            Self::Skipped => "skipped",
        }
    }
}

impl Display for DoseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("Invalid dose status: {0}")]
pub struct InvalidDoseStatusError(String);

impl FromStr for DoseStatus {
    type Err = InvalidDoseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "taken" => Ok(Self::Taken),
            "skipped" => Ok(Self::Skipped),
            _ => Err(InvalidDoseStatusError(s.to_string())),
        }
    }
}

/// When each `ReminderTier` was sent for a `DoseOccurrence`.
/// Every field is written at most once, going from `None` to `Some`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierSentAt {
    pub at_time: Option<DateTime<Utc>>,
    pub plus_10: Option<DateTime<Utc>>,
    pub plus_20: Option<DateTime<Utc>>,
    pub plus_30: Option<DateTime<Utc>>,
    pub plus_60: Option<DateTime<Utc>>,
}

impl TierSentAt {
    pub fn get(&self, tier: ReminderTier) -> Option<DateTime<Utc>> {
        match tier {
            ReminderTier::AtTime => self.at_time,
            ReminderTier::Plus10 => self.plus_10,
            ReminderTier::Plus20 => self.plus_20,
            ReminderTier::Plus30 => self.plus_30,
            ReminderTier::Plus60 => self.plus_60,
        }
    }

    pub fn is_sent(&self, tier: ReminderTier) -> bool {
        self.get(tier).is_some()
    }

    /// Records `sent_at` for the tier unless it has already been recorded.
    /// Returns whether anything was written.
    pub fn mark_sent(&mut self, tier: ReminderTier, sent_at: DateTime<Utc>) -> bool {
        let field = match tier {
            ReminderTier::AtTime => &mut self.at_time,
            ReminderTier::Plus10 => &mut self.plus_10,
            ReminderTier::Plus20 => &mut self.plus_20,
            ReminderTier::Plus30 => &mut self.plus_30,
            ReminderTier::Plus60 => &mut self.plus_60,
        };
        if field.is_some() {
            return false;
        }
        *field = Some(sent_at);
        true
    }
}

/// One scheduled administration of a `Medication` for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseOccurrence {
    pub id: ID,
    pub medication_id: ID,
    pub user_id: ID,
    pub scheduled_at: DateTime<Utc>,
    pub status: DoseStatus,
    pub sent: TierSentAt,
}

impl DoseOccurrence {
    pub fn new(medication_id: ID, user_id: ID, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: Default::default(),
            medication_id,
            user_id,
            scheduled_at,
            status: DoseStatus::Pending,
            sent: Default::default(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == DoseStatus::Pending
    }
}

impl Entity for DoseOccurrence {
    fn id(&self) -> &ID {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_status() {
        for status in &[DoseStatus::Pending, DoseStatus::Taken, DoseStatus::Skipped] {
            assert_eq!(status.as_str().parse::<DoseStatus>().unwrap(), *status);
        }
        assert!("Taken".parse::<DoseStatus>().is_err());
        assert!("".parse::<DoseStatus>().is_err());
    }

    #[test]
    fn tier_sent_fields_are_write_once() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 1, 1, 9, 1, 0).unwrap();
        let mut sent = TierSentAt::default();

        assert!(!sent.is_sent(ReminderTier::Plus20));
        assert!(sent.mark_sent(ReminderTier::Plus20, first));
        assert!(!sent.mark_sent(ReminderTier::Plus20, second));
        assert_eq!(sent.get(ReminderTier::Plus20), Some(first));

        for tier in &[
            ReminderTier::AtTime,
            ReminderTier::Plus10,
            ReminderTier::Plus30,
            ReminderTier::Plus60,
        ] {
            assert!(!sent.is_sent(*tier));
        }
    }
}
