use crate::date::weekday_name;
use crate::shared::entity::ID;
use serde::{de::Visitor, Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

/// A `Reminder` is one row of the event store: a scheduled notification
/// for a calendar event, owned by a `User`.
///
/// One-shot reminders (no `repeat_rule`) fire at most once and are tracked
/// through `status`. Recurring reminders are re-evaluated every cycle
/// against their rule and must never be marked `Sent`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ID,
    /// Display text of the calendar event. Depending on deployment this may
    /// already be localized by the store read.
    pub name: String,
    pub description: String,
    /// Lead-time / severity code. Only reminders at or above the configured
    /// threshold are candidates for delivery.
    pub alert: i64,
    /// Scheduled fire time, UTC epoch millis.
    pub fire_ts: i64,
    /// Raw recurrence rule as stored. `None` or empty means one-shot.
    /// Recognized values parse into `Recurrence`; anything else is a
    /// data-quality problem surfaced at evaluation time.
    pub repeat_rule: Option<String>,
    /// Full english weekday name of `fire_ts`, populated by the store read
    /// for recurring reminders.
    pub weekday: Option<String>,
    pub user_id: ID,
    pub status: DeliveryStatus,
}

impl Reminder {
    pub fn is_recurring(&self) -> bool {
        matches!(&self.repeat_rule, Some(rule) if !rule.is_empty())
    }

    /// Whether this reminder should fire on the day of `now_ts`.
    ///
    /// One-shot reminders are already time-filtered by the store query and
    /// are always due. An unrecognized stored rule is returned as an error
    /// so the caller can log it and skip without notifying anyone.
    pub fn due_today(&self, now_ts: i64) -> Result<bool, InvalidRecurrenceError> {
        match &self.repeat_rule {
            Some(rule) if !rule.is_empty() => {
                let rule = rule.parse::<Recurrence>()?;
                Ok(rule.is_due_on(self.weekday.as_deref(), now_ts))
            }
            _ => Ok(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryStatus {
    Pending,
    Sent,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Sent => "SENT",
        }
    }
}

impl Default for DeliveryStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Error, Debug)]
pub enum InvalidDeliveryStatusError {
    #[error("Invalid delivery status: {0}")]
    Unrecognized(String),
}

impl FromStr for DeliveryStatus {
    type Err = InvalidDeliveryStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SENT" => Ok(Self::Sent),
            _ => Err(InvalidDeliveryStatusError::Unrecognized(s.to_string())),
        }
    }
}

/// Recurrence rule of a `Reminder`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Recurrence {
    Daily,
    Weekly,
}

impl Recurrence {
    /// Whether a reminder with this rule fires on the day of `now_ts`.
    ///
    /// `weekday` is the stored weekday name of the reminder and is only
    /// consulted for weekly rules. A weekly rule without a weekday is
    /// never due.
    pub fn is_due_on(&self, weekday: Option<&str>, now_ts: i64) -> bool {
        match self {
            Self::Daily => true,
            Self::Weekly => match weekday {
                Some(day) => day.eq_ignore_ascii_case(weekday_name(now_ts)),
                None => false,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum InvalidRecurrenceError {
    #[error("Invalid recurrence rule: {0}")]
    Unrecognized(String),
}

impl Display for Recurrence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rule = match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
        };
        write!(f, "{}", rule)
    }
}

impl FromStr for Recurrence {
    type Err = InvalidRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            _ => Err(InvalidRecurrenceError::Unrecognized(s.to_string())),
        }
    }
}

impl Serialize for Recurrence {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Recurrence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RecurrenceVisitor;

        impl<'de> Visitor<'de> for RecurrenceVisitor {
            type Value = Recurrence;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("A valid string representation of a recurrence rule")
            }

            fn visit_str<E>(self, value: &str) -> Result<Recurrence, E>
            where
                E: serde::de::Error,
            {
                value
                    .parse::<Recurrence>()
                    .map_err(|_| E::custom(format!("Malformed recurrence rule: {}", value)))
            }
        }

        deserializer.deserialize_str(RecurrenceVisitor)
    }
}
