use chrono::{DateTime, Utc};
use medtrack_domain::{ChannelTargets, DoseOccurrence, Medication, NotificationPreference, ID};
use medtrack_infra::MedtrackContext;

pub fn targets(push_token: &str, email: &str) -> ChannelTargets {
    ChannelTargets {
        push_token: Some(push_token.into()),
        email: Some(email.into()),
    }
}

pub async fn seed_dose(
    ctx: &MedtrackContext,
    scheduled_at: DateTime<Utc>,
    targets: ChannelTargets,
) -> DoseOccurrence {
    let user_id = ID::default();
    ctx.repos
        .doses
        .save_user_settings(&user_id, &NotificationPreference::default(), &targets)
        .await
        .expect("To save user settings");
    let medication = Medication::new(user_id.clone(), "Lisinopril");
    ctx.repos
        .doses
        .insert_medication(&medication)
        .await
        .expect("To insert medication");
    let dose = DoseOccurrence::new(medication.id, user_id, scheduled_at);
    ctx.repos.doses.insert(&dose).await.expect("To insert dose");
    dose
}
