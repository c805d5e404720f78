use medtrack_domain::{ReminderTier, ID};
use medtrack_infra::{IDoseRepo, ISys, MedtrackContext};
use std::sync::Arc;

/// Makes sure every `ReminderTier` of a dose is dispatched at most once.
///
/// The claim is made before dispatching. If the process dies between the claim
/// and the delivery that reminder is lost, but it is never sent twice.
pub struct DuplicateGuard {
    doses: Arc<dyn IDoseRepo>,
    sys: Arc<dyn ISys>,
}

impl DuplicateGuard {
    pub fn new(ctx: &MedtrackContext) -> Self {
        Self {
            doses: ctx.repos.doses.clone(),
            sys: ctx.sys.clone(),
        }
    }

    /// Returns `true` if the caller now owns dispatching `tier` for the dose.
    /// `false` means another pass already claimed it or the dose is no longer pending.
    pub async fn claim(&self, dose_id: &ID, tier: ReminderTier) -> anyhow::Result<bool> {
        let now = self.sys.get_utc_now();
        self.doses.claim_tier(dose_id, tier, now).await
    }
}
