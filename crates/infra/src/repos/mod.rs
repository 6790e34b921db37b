mod reminder;
mod user;

pub use reminder::{IReminderRepo, InMemoryReminderRepo, PostgresReminderRepo};
pub use user::{IUserRepo, InMemoryUserRepo, PostgresUserRepo};

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct Repos {
    pub reminders: Arc<dyn IReminderRepo>,
    pub users: Arc<dyn IUserRepo>,
}

impl Repos {
    pub async fn create_postgres(
        connection_string: &str,
        localized_reminder_text: bool,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_timeout(Duration::from_secs(10))
            .after_connect(|conn| {
                Box::pin(async move {
                    // A hung statement must never stall the scheduler forever
                    sqlx::query("SET statement_timeout = '30s'")
                        .execute(conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(connection_string)
            .await?;

        Ok(Self {
            reminders: Arc::new(PostgresReminderRepo::new(
                pool.clone(),
                localized_reminder_text,
            )),
            users: Arc::new(PostgresUserRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        let users = Arc::new(InMemoryUserRepo::new());
        let reminders = Arc::new(InMemoryReminderRepo::new(users.clone()));
        Self { reminders, users }
    }
}
