use super::IDoseRepo;
use chrono::{DateTime, Duration, Utc};
use medtrack_domain::{
    CalendarDay, ChannelPreferences, ChannelTargets, DoseOccurrence, DoseStatus, Medication,
    NotificationPreference, ReminderCandidate, ReminderTier, TierPreferences, TierSentAt, ID,
};
use sqlx::{types::Uuid, FromRow, PgPool};
use std::convert::{TryFrom, TryInto};

pub struct PostgresDoseRepo {
    pool: PgPool,
}

impl PostgresDoseRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct DoseRaw {
    id: Uuid,
    medication_id: Uuid,
    user_id: Uuid,
    scheduled_at: DateTime<Utc>,
    status: String,
    sent_at_time: Option<DateTime<Utc>>,
    sent_10: Option<DateTime<Utc>>,
    sent_20: Option<DateTime<Utc>>,
    sent_30: Option<DateTime<Utc>>,
    sent_60: Option<DateTime<Utc>>,
}

impl TryFrom<DoseRaw> for DoseOccurrence {
    type Error = anyhow::Error;

    fn try_from(raw: DoseRaw) -> anyhow::Result<Self> {
        Ok(Self {
            id: raw.id.into(),
            medication_id: raw.medication_id.into(),
            user_id: raw.user_id.into(),
            scheduled_at: raw.scheduled_at,
            status: raw.status.parse()?,
            sent: TierSentAt {
                at_time: raw.sent_at_time,
                plus_10: raw.sent_10,
                plus_20: raw.sent_20,
                plus_30: raw.sent_30,
                plus_60: raw.sent_60,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct CandidateRaw {
    #[sqlx(flatten)]
    dose: DoseRaw,
    medication_name: String,
    dose_info: Option<String>,
    notifications_enabled: bool,
    pref_at_time: bool,
    pref_plus_10: bool,
    pref_plus_20: bool,
    pref_plus_30: bool,
    pref_plus_60: bool,
    pref_push: bool,
    pref_email: bool,
}

impl TryFrom<CandidateRaw> for ReminderCandidate {
    type Error = anyhow::Error;

    fn try_from(raw: CandidateRaw) -> anyhow::Result<Self> {
        Ok(Self {
            dose: raw.dose.try_into()?,
            medication_name: raw.medication_name,
            dose_info: raw.dose_info,
            preferences: NotificationPreference {
                notifications_enabled: raw.notifications_enabled,
                tiers: TierPreferences {
                    at_time: raw.pref_at_time,
                    plus_10: raw.pref_plus_10,
                    plus_20: raw.pref_plus_20,
                    plus_30: raw.pref_plus_30,
                    plus_60: raw.pref_plus_60,
                },
                channels: ChannelPreferences {
                    push: raw.pref_push,
                    email: raw.pref_email,
                },
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct ChannelTargetsRaw {
    push_token: Option<String>,
    email: Option<String>,
}

const DOSE_COLUMNS: &str = r#"
    d.id, d.medication_id, d.user_id, d.scheduled_at, d.status,
    d.sent_at_time, d.sent_10, d.sent_20, d.sent_30, d.sent_60
"#;

#[async_trait::async_trait]
impl IDoseRepo for PostgresDoseRepo {
    async fn fetch_pending_for_date(
        &self,
        day: &CalendarDay,
        lookback: Duration,
    ) -> anyhow::Result<Vec<ReminderCandidate>> {
        let query = format!(
            r#"
            SELECT {},
                m.name AS medication_name,
                m.dose_info,
                u.notifications_enabled,
                COALESCE(p.at_time, TRUE) AS pref_at_time,
                COALESCE(p.plus_10, TRUE) AS pref_plus_10,
                COALESCE(p.plus_20, TRUE) AS pref_plus_20,
                COALESCE(p.plus_30, TRUE) AS pref_plus_30,
                COALESCE(p.plus_60, TRUE) AS pref_plus_60,
                COALESCE(p.push, TRUE) AS pref_push,
                COALESCE(p.email, TRUE) AS pref_email
            FROM dose_occurrences AS d
            INNER JOIN medications AS m ON m.id = d.medication_id
            INNER JOIN users AS u ON u.id = d.user_id
            LEFT JOIN notification_preferences AS p ON p.user_id = d.user_id
            WHERE d.status = 'pending'
                AND d.scheduled_at >= $1
                AND d.scheduled_at < $2
                AND m.as_needed = FALSE
                AND u.notifications_enabled = TRUE
                AND (
                    NULLIF(TRIM(u.push_token), '') IS NOT NULL
                    OR NULLIF(TRIM(u.email), '') IS NOT NULL
                )
            ORDER BY d.scheduled_at, d.id
            "#,
            DOSE_COLUMNS
        );
        let rows: Vec<CandidateRaw> = sqlx::query_as(&query)
            .bind(day.start - lookback)
            .bind(day.end)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(ReminderCandidate::try_from).collect()
    }

    async fn claim_tier(
        &self,
        dose_id: &ID,
        tier: ReminderTier,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        // A single conditional update, the row lock taken by postgres makes
        // concurrent claims of the same tier race for one winner
        let query = format!(
            r#"
            UPDATE dose_occurrences
            SET {column} = $2
            WHERE id = $1
                AND {column} IS NULL
                AND status = 'pending'
            "#,
            column = tier.sent_column()
        );
        let res = sqlx::query(&query)
            .bind(dose_id.inner_ref())
            .bind(sent_at)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected() == 1)
    }

    async fn get_user_channel_targets(&self, user_id: &ID) -> anyhow::Result<ChannelTargets> {
        let targets: Option<ChannelTargetsRaw> = sqlx::query_as(
            r#"
            SELECT u.push_token, u.email FROM users AS u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(targets
            .map(|t| ChannelTargets {
                push_token: t.push_token,
                email: t.email,
            })
            .unwrap_or_default())
    }

    async fn find(&self, dose_id: &ID) -> Option<DoseOccurrence> {
        let query = format!(
            r#"
            SELECT {} FROM dose_occurrences AS d
            WHERE d.id = $1
            "#,
            DOSE_COLUMNS
        );
        let dose: DoseRaw = sqlx::query_as(&query)
            .bind(dose_id.inner_ref())
            .fetch_one(&self.pool)
            .await
            .ok()?;
        dose.try_into().ok()
    }

    async fn insert(&self, dose: &DoseOccurrence) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO dose_occurrences
            (id, medication_id, user_id, scheduled_at, status,
                sent_at_time, sent_10, sent_20, sent_30, sent_60)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(dose.id.inner_ref())
        .bind(dose.medication_id.inner_ref())
        .bind(dose.user_id.inner_ref())
        .bind(dose.scheduled_at)
        .bind(dose.status.as_str())
        .bind(dose.sent.at_time)
        .bind(dose.sent.plus_10)
        .bind(dose.sent.plus_20)
        .bind(dose.sent.plus_30)
        .bind(dose.sent.plus_60)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_status(&self, dose_id: &ID, status: DoseStatus) -> anyhow::Result<()> {
        let res = sqlx::query(
            r#"
            UPDATE dose_occurrences
            SET status = $2
            WHERE id = $1
            "#,
        )
        .bind(dose_id.inner_ref())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        if res.rows_affected() == 0 {
            return Err(anyhow::anyhow!("Dose {} not found", dose_id));
        }
        Ok(())
    }

    async fn insert_medication(&self, medication: &Medication) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO medications(id, user_id, name, dose_info, as_needed)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(medication.id.inner_ref())
        .bind(medication.user_id.inner_ref())
        .bind(&medication.name)
        .bind(&medication.dose_info)
        .bind(medication.as_needed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save_user_settings(
        &self,
        user_id: &ID,
        preferences: &NotificationPreference,
        targets: &ChannelTargets,
    ) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO users(id, email, push_token, notifications_enabled)
            VALUES($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET email = $2,
                push_token = $3,
                notifications_enabled = $4
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(&targets.email)
        .bind(&targets.push_token)
        .bind(preferences.notifications_enabled)
        .execute(&mut *tx)
        .await?;

        let tiers = &preferences.tiers;
        sqlx::query(
            r#"
            INSERT INTO notification_preferences
            (user_id, at_time, plus_10, plus_20, plus_30, plus_60, push, email)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id) DO UPDATE
            SET at_time = $2,
                plus_10 = $3,
                plus_20 = $4,
                plus_30 = $5,
                plus_60 = $6,
                push = $7,
                email = $8
            "#,
        )
        .bind(user_id.inner_ref())
        .bind(tiers.at_time)
        .bind(tiers.plus_10)
        .bind(tiers.plus_20)
        .bind(tiers.plus_30)
        .bind(tiers.plus_60)
        .bind(preferences.channels.push)
        .bind(preferences.channels.email)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
