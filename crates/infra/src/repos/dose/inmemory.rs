use super::IDoseRepo;
use chrono::{DateTime, Duration, Utc};
use medtrack_domain::{
    CalendarDay, ChannelTargets, DoseOccurrence, DoseStatus, Medication, NotificationPreference,
    ReminderCandidate, ReminderTier, ID,
};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct State {
    doses: Vec<DoseOccurrence>,
    medications: HashMap<ID, Medication>,
    preferences: HashMap<ID, NotificationPreference>,
    targets: HashMap<ID, ChannelTargets>,
}

/// Dose store kept in memory, used for testing. All state lives behind one
/// lock so that a claim is a single critical section.
pub struct InMemoryDoseRepo {
    state: Mutex<State>,
}

impl InMemoryDoseRepo {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(Default::default()),
        }
    }
}

impl Default for InMemoryDoseRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IDoseRepo for InMemoryDoseRepo {
    async fn fetch_pending_for_date(
        &self,
        day: &CalendarDay,
        lookback: Duration,
    ) -> anyhow::Result<Vec<ReminderCandidate>> {
        let since = day.start - lookback;
        let state = self.state.lock().unwrap();
        let mut candidates = state
            .doses
            .iter()
            .filter(|dose| {
                dose.is_pending() && dose.scheduled_at >= since && dose.scheduled_at < day.end
            })
            .filter_map(|dose| {
                let medication = state
                    .medications
                    .get(&dose.medication_id)
                    .filter(|m| !m.as_needed)?;
                // Users only exist once their settings have been saved
                let targets = state.targets.get(&dose.user_id)?;
                let preferences = state.preferences.get(&dose.user_id)?;
                if !preferences.notifications_enabled || !targets.has_any() {
                    return None;
                }
                Some(ReminderCandidate {
                    dose: dose.clone(),
                    medication_name: medication.name.clone(),
                    dose_info: medication.dose_info.clone(),
                    preferences: preferences.clone(),
                })
            })
            .collect::<Vec<_>>();
        candidates.sort_by(|c1, c2| {
            c1.dose
                .scheduled_at
                .cmp(&c2.dose.scheduled_at)
                .then_with(|| c1.dose.id.cmp(&c2.dose.id))
        });
        Ok(candidates)
    }

    async fn claim_tier(
        &self,
        dose_id: &ID,
        tier: ReminderTier,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut state = self.state.lock().unwrap();
        let claimed = match state.doses.iter_mut().find(|d| d.id == *dose_id) {
            Some(dose) if dose.is_pending() => dose.sent.mark_sent(tier, sent_at),
            _ => false,
        };
        Ok(claimed)
    }

    async fn get_user_channel_targets(&self, user_id: &ID) -> anyhow::Result<ChannelTargets> {
        let state = self.state.lock().unwrap();
        Ok(state.targets.get(user_id).cloned().unwrap_or_default())
    }

    async fn find(&self, dose_id: &ID) -> Option<DoseOccurrence> {
        let state = self.state.lock().unwrap();
        state.doses.iter().find(|d| d.id == *dose_id).cloned()
    }

    async fn insert(&self, dose: &DoseOccurrence) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.doses.iter().any(|d| d.id == dose.id) {
            return Err(anyhow::anyhow!("Dose {} already exists", dose.id));
        }
        state.doses.push(dose.clone());
        Ok(())
    }

    async fn update_status(&self, dose_id: &ID, status: DoseStatus) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.doses.iter_mut().find(|d| d.id == *dose_id) {
            Some(dose) => {
                dose.status = status;
                Ok(())
            }
            None => Err(anyhow::anyhow!("Dose {} not found", dose_id)),
        }
    }

    async fn insert_medication(&self, medication: &Medication) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .medications
            .insert(medication.id.clone(), medication.clone());
        Ok(())
    }

    async fn save_user_settings(
        &self,
        user_id: &ID,
        preferences: &NotificationPreference,
        targets: &ChannelTargets,
    ) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .preferences
            .insert(user_id.clone(), preferences.clone());
        state.targets.insert(user_id.clone(), targets.clone());
        Ok(())
    }
}
