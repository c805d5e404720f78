mod inmemory;
mod postgres;

pub use inmemory::InMemoryDoseRepo;
pub use postgres::PostgresDoseRepo;

use chrono::{DateTime, Duration, Utc};
use medtrack_domain::{
    CalendarDay, ChannelTargets, DoseOccurrence, DoseStatus, Medication, NotificationPreference,
    ReminderCandidate, ReminderTier, ID,
};

#[async_trait::async_trait]
pub trait IDoseRepo: Send + Sync {
    /// Pending doses scheduled within the given day, or up to `lookback` before
    /// it starts, that are worth evaluating for reminders: the medication is not
    /// taken as needed and the owner has notifications enabled together with at
    /// least one delivery target.
    async fn fetch_pending_for_date(
        &self,
        day: &CalendarDay,
        lookback: Duration,
    ) -> anyhow::Result<Vec<ReminderCandidate>>;
    /// Atomically records that `tier` was sent at `sent_at`, but only if the tier
    /// has not been recorded before and the dose is still pending.
    /// Returns `true` when this call made the claim.
    async fn claim_tier(
        &self,
        dose_id: &ID,
        tier: ReminderTier,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    async fn get_user_channel_targets(&self, user_id: &ID) -> anyhow::Result<ChannelTargets>;
    async fn find(&self, dose_id: &ID) -> Option<DoseOccurrence>;
    async fn insert(&self, dose: &DoseOccurrence) -> anyhow::Result<()>;
    async fn update_status(&self, dose_id: &ID, status: DoseStatus) -> anyhow::Result<()>;
    async fn insert_medication(&self, medication: &Medication) -> anyhow::Result<()>;
    async fn save_user_settings(
        &self,
        user_id: &ID,
        preferences: &NotificationPreference,
        targets: &ChannelTargets,
    ) -> anyhow::Result<()>;
}
