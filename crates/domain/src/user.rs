use crate::shared::entity::ID;

/// A `User` is the recipient side of a `NotificationJob`: the owner of the
/// calendar event joined with the reminder by the store read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: ID,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Language tag used when the store read localizes reminder text.
    pub lang: String,
    pub ios_device_token: Option<String>,
    pub android_device_token: Option<String>,
}

impl User {
    /// iOS destination token, `None` when absent or empty.
    pub fn ios_token(&self) -> Option<&str> {
        self.ios_device_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Android destination token, `None` when absent or empty.
    pub fn android_token(&self) -> Option<&str> {
        self.android_device_token
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// A `User` without any device token can never receive a push and is
    /// not dispatch eligible.
    pub fn has_push_destination(&self) -> bool {
        self.ios_token().is_some() || self.android_token().is_some()
    }
}
