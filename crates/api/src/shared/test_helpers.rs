use chrono::{DateTime, TimeZone, Utc};
use medtrack_domain::{
    ChannelTargets, DoseOccurrence, Medication, NotificationPreference, ID,
};
use medtrack_infra::{ISys, InMemoryEmailChannel, InMemoryPushChannel, MedtrackContext};
use std::sync::Arc;

pub struct StaticTimeSys(pub DateTime<Utc>);
impl ISys for StaticTimeSys {
    fn get_utc_now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Tue Jan 09 2024 09:00:00 UTC, London is on UTC in january
pub fn nine_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap()
}

pub fn minutes_after_nine(minutes: i64) -> DateTime<Utc> {
    nine_am() + chrono::Duration::minutes(minutes)
}

pub struct TestContext {
    pub ctx: MedtrackContext,
    pub push: Arc<InMemoryPushChannel>,
    pub email: Arc<InMemoryEmailChannel>,
}

impl TestContext {
    pub fn set_time(&mut self, now: DateTime<Utc>) {
        self.ctx.sys = Arc::new(StaticTimeSys(now));
    }
}

pub fn setup() -> TestContext {
    let mut ctx = MedtrackContext::create_inmemory();
    ctx.config.tolerance_minutes = 5;
    ctx.config.timezone = chrono_tz::Europe::London;
    ctx.sys = Arc::new(StaticTimeSys(nine_am()));
    let push = Arc::new(InMemoryPushChannel::new());
    let email = Arc::new(InMemoryEmailChannel::new());
    ctx.channels.push = push.clone();
    ctx.channels.email = email.clone();
    TestContext { ctx, push, email }
}

pub fn all_targets() -> ChannelTargets {
    ChannelTargets {
        push_token: Some("player-1".into()),
        email: Some("kim@example.com".into()),
    }
}

/// Stores a user with the given settings, a medication and a pending dose of it
pub async fn seed_dose(
    ctx: &MedtrackContext,
    scheduled_at: DateTime<Utc>,
    preferences: NotificationPreference,
    targets: ChannelTargets,
) -> (DoseOccurrence, Medication) {
    let user_id = ID::default();
    ctx.repos
        .doses
        .save_user_settings(&user_id, &preferences, &targets)
        .await
        .expect("To save user settings");
    let mut medication = Medication::new(user_id.clone(), "Metformin");
    medication.dose_info = Some("500mg".into());
    ctx.repos
        .doses
        .insert_medication(&medication)
        .await
        .expect("To insert medication");
    let dose = DoseOccurrence::new(medication.id.clone(), user_id, scheduled_at);
    ctx.repos.doses.insert(&dose).await.expect("To insert dose");
    (dose, medication)
}
