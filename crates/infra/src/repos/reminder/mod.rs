mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderRepo;
pub use postgres::PostgresReminderRepo;

use chime_domain::{NotificationJob, Reminder, ID};

/// Read and write access to reminder rows, always joined with the owning
/// user so a fetch directly yields dispatchable `NotificationJob`s.
///
/// A fetch error aborts the current scheduling cycle, so both reads surface
/// errors instead of defaulting to an empty batch.
#[async_trait::async_trait]
pub trait IReminderRepo: Send + Sync {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()>;
    /// One-shot reminders due within `[now_ts, now_ts + window_millis]`
    /// that have not been delivered yet
    async fn find_one_shot_due(
        &self,
        now_ts: i64,
        window_millis: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>>;
    /// Recurring reminders whose fire time-of-day matches the minute of
    /// `now_ts`. Whether the rule fires today is decided by the dispatcher,
    /// not the store.
    async fn find_recurring_due(
        &self,
        now_ts: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>>;
    /// Marks a one-shot reminder as delivered. Recurring reminders are
    /// excluded by the write predicate and are silently left untouched.
    async fn mark_sent(&self, reminder_id: &ID) -> anyhow::Result<()>;
}
