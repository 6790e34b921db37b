use super::IReminderRepo;

use chime_domain::{weekday_name, NotificationJob, Reminder, User, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresReminderRepo {
    pool: PgPool,
    one_shot_query: String,
    recurring_query: String,
}

impl PostgresReminderRepo {
    pub fn new(pool: PgPool, localized_reminder_text: bool) -> Self {
        Self {
            pool,
            one_shot_query: format!(
                r#"
            {}
            WHERE r.alert >= $1
            AND r.status != 'SENT'
            AND COALESCE(r.repeat_rule, '') = ''
            AND (COALESCE(u.ios_device_token, '') != '' OR COALESCE(u.android_device_token, '') != '')
            AND r.fire_ts >= $2
            AND r.fire_ts <= $3
            "#,
                job_select(localized_reminder_text)
            ),
            recurring_query: format!(
                r#"
            {}
            WHERE r.alert >= $1
            AND COALESCE(r.repeat_rule, '') != ''
            AND (COALESCE(u.ios_device_token, '') != '' OR COALESCE(u.android_device_token, '') != '')
            AND (r.fire_ts / 60000) % 1440 = ($2 / 60000) % 1440
            "#,
                job_select(localized_reminder_text)
            ),
        }
    }
}

/// Shared select for both due-reminder reads. The localized variant lets the
/// store resolve the reminder text for the recipient's language before it
/// ever reaches the worker.
fn job_select(localized_reminder_text: bool) -> &'static str {
    if localized_reminder_text {
        r#"
        SELECT r.reminder_uid, COALESCE(t.text, r.name) AS name, r.description, r.alert,
               r.fire_ts, r.repeat_rule, r.status,
               u.user_uid, u.email, u.first_name, u.last_name, u.lang,
               u.ios_device_token, u.android_device_token
        FROM reminders AS r
        JOIN users AS u ON u.user_uid = r.user_uid
        LEFT JOIN reminder_texts AS t ON t.reminder_uid = r.reminder_uid AND t.lang = u.lang
        "#
    } else {
        r#"
        SELECT r.reminder_uid, r.name, r.description, r.alert,
               r.fire_ts, r.repeat_rule, r.status,
               u.user_uid, u.email, u.first_name, u.last_name, u.lang,
               u.ios_device_token, u.android_device_token
        FROM reminders AS r
        JOIN users AS u ON u.user_uid = r.user_uid
        "#
    }
}

#[derive(Debug, FromRow)]
struct JobRaw {
    reminder_uid: Uuid,
    name: String,
    description: String,
    alert: i64,
    fire_ts: i64,
    repeat_rule: Option<String>,
    status: String,
    user_uid: Uuid,
    email: String,
    first_name: String,
    last_name: String,
    lang: String,
    ios_device_token: Option<String>,
    android_device_token: Option<String>,
}

impl Into<NotificationJob> for JobRaw {
    fn into(self) -> NotificationJob {
        let weekday = match &self.repeat_rule {
            Some(rule) if !rule.is_empty() => Some(weekday_name(self.fire_ts).to_string()),
            _ => None,
        };
        NotificationJob::new(
            Reminder {
                id: self.reminder_uid.into(),
                name: self.name,
                description: self.description,
                alert: self.alert,
                fire_ts: self.fire_ts,
                repeat_rule: self.repeat_rule,
                weekday,
                user_id: self.user_uid.into(),
                status: self.status.parse().unwrap_or_default(),
            },
            User {
                id: self.user_uid.into(),
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                lang: self.lang,
                ios_device_token: self.ios_device_token,
                android_device_token: self.android_device_token,
            },
        )
    }
}

#[async_trait::async_trait]
impl IReminderRepo for PostgresReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reminders
            (reminder_uid, name, description, alert, fire_ts, repeat_rule, user_uid, status)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(reminder.id.inner_ref())
        .bind(&reminder.name)
        .bind(&reminder.description)
        .bind(reminder.alert)
        .bind(reminder.fire_ts)
        .bind(&reminder.repeat_rule)
        .bind(reminder.user_id.inner_ref())
        .bind(reminder.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_one_shot_due(
        &self,
        now_ts: i64,
        window_millis: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>> {
        let jobs = sqlx::query_as::<_, JobRaw>(&self.one_shot_query)
            .bind(min_alert)
            .bind(now_ts)
            .bind(now_ts + window_millis)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs.into_iter().map(|job| job.into()).collect())
    }

    async fn find_recurring_due(
        &self,
        now_ts: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>> {
        let jobs = sqlx::query_as::<_, JobRaw>(&self.recurring_query)
            .bind(min_alert)
            .bind(now_ts)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs.into_iter().map(|job| job.into()).collect())
    }

    async fn mark_sent(&self, reminder_id: &ID) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE reminders
            SET status = 'SENT'
            WHERE reminder_uid = $1
            AND COALESCE(repeat_rule, '') = ''
            "#,
        )
        .bind(reminder_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
