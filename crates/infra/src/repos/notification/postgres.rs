use super::INotificationRepo;
use chrono::{DateTime, Utc};
use medtrack_domain::{NotificationRecord, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresNotificationRepo {
    pool: PgPool,
}

impl PostgresNotificationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct NotificationRaw {
    id: Uuid,
    user_id: Uuid,
    #[sqlx(rename = "type")]
    notification_type: String,
    title: String,
    message: String,
    related_medication_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    is_read: bool,
}

impl From<NotificationRaw> for NotificationRecord {
    fn from(raw: NotificationRaw) -> Self {
        Self {
            id: raw.id.into(),
            user_id: raw.user_id.into(),
            notification_type: raw.notification_type,
            title: raw.title,
            message: raw.message,
            related_medication_id: raw.related_medication_id.map(ID::from),
            created_at: raw.created_at,
            is_read: raw.is_read,
        }
    }
}

#[async_trait::async_trait]
impl INotificationRepo for PostgresNotificationRepo {
    async fn insert(&self, notification: &NotificationRecord) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications
            (id, user_id, type, title, message, related_medication_id, created_at, is_read)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(notification.id.inner_ref())
        .bind(notification.user_id.inner_ref())
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_medication_id.as_ref().map(|id| id.inner_ref()))
        .bind(notification.created_at)
        .bind(notification.is_read)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<NotificationRecord>> {
        let notifications: Vec<NotificationRaw> = sqlx::query_as(
            r#"
            SELECT * FROM notifications AS n
            WHERE n.user_id = $1
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id.inner_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications.into_iter().map(|n| n.into()).collect())
    }
}
