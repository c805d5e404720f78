mod date;
mod dose;
mod medication;
mod notification;
mod reminder;
mod reminder_cycle;
mod shared;

pub use date::{format_date, CalendarDay};
pub use dose::{DoseOccurrence, DoseStatus, InvalidDoseStatusError, TierSentAt};
pub use medication::Medication;
pub use notification::{
    ChannelOutcome, ChannelPreferences, ChannelTargets, DispatchOutcome, NotificationChannel,
    NotificationPreference, NotificationRecord, ReminderMessage, TierPreferences,
    MEDICATION_REMINDER_TYPE,
};
pub use reminder::{
    decide_tier, reminder_lookback, ReminderCandidate, ReminderTier, DEFAULT_TOLERANCE_MINUTES,
};
pub use reminder_cycle::ReminderCycleSummary;
pub use shared::entity::{Entity, InvalidIDError, ID};
