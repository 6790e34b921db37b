mod date;
mod notification;
mod reminder;
mod shared;
mod user;

pub use date::{minute_of_day, weekday_name};
pub use notification::NotificationJob;
pub use reminder::{
    DeliveryStatus, InvalidDeliveryStatusError, InvalidRecurrenceError, Recurrence, Reminder,
};
pub use shared::entity::{InvalidIDError, ID};
pub use user::User;
