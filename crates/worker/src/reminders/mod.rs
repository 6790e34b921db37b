pub mod dispatch_reminders;
pub mod get_due_reminders;
