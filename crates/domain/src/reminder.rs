use crate::{
    dose::DoseOccurrence, notification::NotificationPreference, shared::entity::ID,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The default number of minutes a `ReminderTier` stays due on each side
/// of its nominal offset.
pub const DEFAULT_TOLERANCE_MINUTES: i64 = 5;

/// A fixed checkpoint relative to the scheduled time of a dose at which
/// the user is reminded about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderTier {
    AtTime,
    Plus10,
    Plus20,
    Plus30,
    Plus60,
}

/// How far before the start of a day doses can be scheduled and still have a
/// tier due during that day. Doses due late in the evening keep their
/// overdue reminders after midnight.
pub fn reminder_lookback(tolerance_minutes: i64) -> Duration {
    let last_offset = ReminderTier::ALL
        .iter()
        .map(|tier| tier.offset_minutes())
        .max()
        .unwrap_or(0);
    Duration::minutes(last_offset + tolerance_minutes)
}

impl ReminderTier {
    /// All tiers in the order they are evaluated
    pub const ALL: [ReminderTier; 5] = [
        ReminderTier::AtTime,
        ReminderTier::Plus10,
        ReminderTier::Plus20,
        ReminderTier::Plus30,
        ReminderTier::Plus60,
    ];

    pub fn offset_minutes(&self) -> i64 {
        match self {
            Self::AtTime => 0,
            Self::Plus10 => 10,
            Self::Plus20 => 20,
            Self::Plus30 => 30,
            Self::Plus60 => 60,
        }
    }

    /// Column of the dose occurrence row recording when this tier was sent
    pub fn sent_column(&self) -> &'static str {
        match self {
            Self::AtTime => "sent_at_time",
            Self::Plus10 => "sent_10",
            Self::Plus20 => "sent_20",
            Self::Plus30 => "sent_30",
            Self::Plus60 => "sent_60",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtTime => "at_time",
            Self::Plus10 => "plus_10",
            Self::Plus20 => "plus_20",
            Self::Plus30 => "plus_30",
            Self::Plus60 => "plus_60",
        }
    }

    pub fn is_overdue_reminder(&self) -> bool {
        *self != Self::AtTime
    }

    /// Whether a dose that is `diff_secs` past its scheduled time (negative when
    /// it is still upcoming) lies within this tier's window.
    fn window_contains(&self, diff_secs: i64, tolerance_minutes: i64) -> bool {
        let offset = self.offset_minutes() * 60;
        let tolerance = tolerance_minutes * 60;
        let lower = match self {
            // Never remind before the dose is actually due
            Self::AtTime => 0,
            _ => (offset - tolerance).max(-tolerance),
        };
        let upper = offset + tolerance;
        lower <= diff_secs && diff_secs <= upper
    }
}

impl Display for ReminderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pending `DoseOccurrence` joined with what is needed to remind its owner
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderCandidate {
    pub dose: DoseOccurrence,
    pub medication_name: String,
    pub dose_info: Option<String>,
    pub preferences: NotificationPreference,
}

impl ReminderCandidate {
    pub fn dose_id(&self) -> &ID {
        &self.dose.id
    }

    pub fn user_id(&self) -> &ID {
        &self.dose.user_id
    }

    pub fn decide(&self, now: DateTime<Utc>, tolerance_minutes: i64) -> Option<ReminderTier> {
        decide_tier(&self.dose, &self.preferences, now, tolerance_minutes)
    }

    /// Whole minutes since the dose was due, rounded down
    pub fn minutes_overdue(&self, now: DateTime<Utc>) -> i64 {
        (now - self.dose.scheduled_at).num_seconds().div_euclid(60)
    }
}

/// Decides which `ReminderTier`, if any, should be sent for the dose at `now`.
///
/// A tier is eligible when `now` lies within `tolerance_minutes` of the tier's
/// offset from the scheduled time, the tier has not been sent yet and the user
/// has it enabled. Tiers are checked in ascending order and the first eligible
/// one wins, so at most one tier is returned per call. Later tiers are caught by
/// subsequent calls.
pub fn decide_tier(
    dose: &DoseOccurrence,
    preferences: &NotificationPreference,
    now: DateTime<Utc>,
    tolerance_minutes: i64,
) -> Option<ReminderTier> {
    if !dose.is_pending() || !preferences.notifications_enabled {
        return None;
    }
    let diff_secs = (now - dose.scheduled_at).num_seconds();

    ReminderTier::ALL.iter().copied().find(|tier| {
        tier.window_contains(diff_secs, tolerance_minutes)
            && !dose.sent.is_sent(*tier)
            && preferences.tiers.is_enabled(*tier)
    })
}
