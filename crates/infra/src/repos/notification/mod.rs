mod inmemory;
mod postgres;

pub use inmemory::InMemoryNotificationRepo;
pub use postgres::PostgresNotificationRepo;

use medtrack_domain::{NotificationRecord, ID};

/// Sink for in-app notifications
#[async_trait::async_trait]
pub trait INotificationRepo: Send + Sync {
    async fn insert(&self, notification: &NotificationRecord) -> anyhow::Result<()>;
    /// Newest first
    async fn find_by_user(&self, user_id: &ID) -> anyhow::Result<Vec<NotificationRecord>>;
}
