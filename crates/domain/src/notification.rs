use crate::reminder::Reminder;
use crate::user::User;

/// One due `Reminder` paired with its recipient, produced by the store read.
/// Jobs live for a single scheduling cycle and are never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationJob {
    pub reminder: Reminder,
    pub user: User,
}

impl NotificationJob {
    pub fn new(reminder: Reminder, user: User) -> Self {
        Self { reminder, user }
    }

    /// The user facing message body for this job.
    pub fn message(&self) -> String {
        format!("You have an event: {}", self.reminder.name)
    }
}
