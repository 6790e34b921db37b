use super::IReminderRepo;
use crate::repos::user::InMemoryUserRepo;

use chime_domain::{
    minute_of_day, weekday_name, DeliveryStatus, NotificationJob, Reminder, ID,
};
use std::sync::{Arc, Mutex};

pub struct InMemoryReminderRepo {
    reminders: Mutex<Vec<Reminder>>,
    users: Arc<InMemoryUserRepo>,
}

impl InMemoryReminderRepo {
    pub fn new(users: Arc<InMemoryUserRepo>) -> Self {
        Self {
            reminders: Mutex::new(Vec::new()),
            users,
        }
    }

    fn find_jobs_by<F>(&self, pred: F) -> Vec<NotificationJob>
    where
        F: Fn(&Reminder) -> bool,
    {
        self.reminders
            .lock()
            .unwrap()
            .iter()
            .filter(|reminder| pred(reminder))
            .filter_map(|reminder| {
                let user = self.users.find_sync(&reminder.user_id)?;
                if !user.has_push_destination() {
                    return None;
                }
                Some(NotificationJob::new(reminder.clone(), user))
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl IReminderRepo for InMemoryReminderRepo {
    async fn insert(&self, reminder: &Reminder) -> anyhow::Result<()> {
        self.reminders.lock().unwrap().push(reminder.clone());
        Ok(())
    }

    async fn find_one_shot_due(
        &self,
        now_ts: i64,
        window_millis: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>> {
        Ok(self.find_jobs_by(|r| {
            !r.is_recurring()
                && r.status != DeliveryStatus::Sent
                && r.alert >= min_alert
                && r.fire_ts >= now_ts
                && r.fire_ts <= now_ts + window_millis
        }))
    }

    async fn find_recurring_due(
        &self,
        now_ts: i64,
        min_alert: i64,
    ) -> anyhow::Result<Vec<NotificationJob>> {
        let mut jobs = self.find_jobs_by(|r| {
            r.is_recurring()
                && r.alert >= min_alert
                && minute_of_day(r.fire_ts) == minute_of_day(now_ts)
        });
        for job in &mut jobs {
            job.reminder.weekday = Some(weekday_name(job.reminder.fire_ts).to_string());
        }
        Ok(jobs)
    }

    async fn mark_sent(&self, reminder_id: &ID) -> anyhow::Result<()> {
        let mut reminders = self.reminders.lock().unwrap();
        if let Some(reminder) = reminders
            .iter_mut()
            .find(|r| r.id == *reminder_id && !r.is_recurring())
        {
            reminder.status = DeliveryStatus::Sent;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::repos::Repos;
    use chime_domain::User;

    // Sun Feb 21 2021 07:30:00 UTC
    const NOW: i64 = 1613865600000 + (7 * 60 + 30) * 60 * 1000;
    const MINUTE: i64 = 60 * 1000;
    const DAY: i64 = 24 * 60 * MINUTE;

    fn user_with_token() -> User {
        User {
            ios_device_token: Some("ios-token".into()),
            ..Default::default()
        }
    }

    fn reminder_for(user: &User, fire_ts: i64, repeat_rule: Option<&str>) -> Reminder {
        Reminder {
            id: Default::default(),
            name: "Piano lesson".into(),
            description: Default::default(),
            alert: 60,
            fire_ts,
            repeat_rule: repeat_rule.map(String::from),
            weekday: None,
            user_id: user.id.clone(),
            status: Default::default(),
        }
    }

    #[tokio::test]
    async fn one_shot_fetch_respects_the_window() {
        let repos = Repos::create_inmemory();
        let user = user_with_token();
        repos.users.insert(&user).await.unwrap();

        let before = reminder_for(&user, NOW - 1, None);
        let at_start = reminder_for(&user, NOW, None);
        let inside = reminder_for(&user, NOW + 30 * 1000, None);
        let at_end = reminder_for(&user, NOW + MINUTE, None);
        let after = reminder_for(&user, NOW + MINUTE + 1, None);
        for reminder in [&before, &at_start, &inside, &at_end, &after] {
            repos.reminders.insert(reminder).await.unwrap();
        }

        let jobs = repos
            .reminders
            .find_one_shot_due(NOW, MINUTE, 32)
            .await
            .unwrap();
        let ids: Vec<_> = jobs.iter().map(|j| j.reminder.id.clone()).collect();
        assert_eq!(ids, vec![at_start.id, inside.id, at_end.id]);
    }

    #[tokio::test]
    async fn one_shot_fetch_skips_sent_low_alert_and_recurring() {
        let repos = Repos::create_inmemory();
        let user = user_with_token();
        repos.users.insert(&user).await.unwrap();

        let mut sent = reminder_for(&user, NOW, None);
        sent.status = DeliveryStatus::Sent;
        let mut low_alert = reminder_for(&user, NOW, None);
        low_alert.alert = 10;
        let recurring = reminder_for(&user, NOW, Some("DAILY"));
        let due = reminder_for(&user, NOW, None);
        for reminder in [&sent, &low_alert, &recurring, &due] {
            repos.reminders.insert(reminder).await.unwrap();
        }

        let jobs = repos
            .reminders
            .find_one_shot_due(NOW, MINUTE, 32)
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].reminder.id, due.id);
    }

    #[tokio::test]
    async fn fetches_skip_users_without_destinations() {
        let repos = Repos::create_inmemory();
        let user = User::default();
        repos.users.insert(&user).await.unwrap();

        repos
            .reminders
            .insert(&reminder_for(&user, NOW, None))
            .await
            .unwrap();
        repos
            .reminders
            .insert(&reminder_for(&user, NOW, Some("DAILY")))
            .await
            .unwrap();

        assert!(repos
            .reminders
            .find_one_shot_due(NOW, MINUTE, 32)
            .await
            .unwrap()
            .is_empty());
        assert!(repos
            .reminders
            .find_recurring_due(NOW, 32)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn recurring_fetch_matches_the_minute_of_day_only() {
        let repos = Repos::create_inmemory();
        let user = user_with_token();
        repos.users.insert(&user).await.unwrap();

        // Same time of day weeks earlier, other times of day today
        let matching = reminder_for(&user, NOW - 14 * DAY, Some("DAILY"));
        let earlier = reminder_for(&user, NOW - MINUTE, Some("DAILY"));
        let later = reminder_for(&user, NOW + MINUTE, Some("DAILY"));
        for reminder in [&matching, &earlier, &later] {
            repos.reminders.insert(reminder).await.unwrap();
        }

        let jobs = repos.reminders.find_recurring_due(NOW, 32).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].reminder.id, matching.id);
        // Weekday is derived from the stored fire time, not from today
        assert_eq!(jobs[0].reminder.weekday.as_deref(), Some("Sunday"));
    }

    #[tokio::test]
    async fn mark_sent_only_touches_one_shot_reminders() {
        let repos = Repos::create_inmemory();
        let user = user_with_token();
        repos.users.insert(&user).await.unwrap();

        let one_shot = reminder_for(&user, NOW, None);
        let recurring = reminder_for(&user, NOW, Some("DAILY"));
        repos.reminders.insert(&one_shot).await.unwrap();
        repos.reminders.insert(&recurring).await.unwrap();

        repos.reminders.mark_sent(&one_shot.id).await.unwrap();
        repos.reminders.mark_sent(&recurring.id).await.unwrap();

        // The delivered one-shot is gone from the next window
        assert!(repos
            .reminders
            .find_one_shot_due(NOW, MINUTE, 32)
            .await
            .unwrap()
            .is_empty());
        // The recurring reminder keeps firing
        assert_eq!(
            repos
                .reminders
                .find_recurring_due(NOW, 32)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn recurring_fetch_returns_the_same_reminder_across_days() {
        let repos = Repos::create_inmemory();
        let user = user_with_token();
        repos.users.insert(&user).await.unwrap();

        let daily = reminder_for(&user, NOW - 30 * DAY, Some("DAILY"));
        repos.reminders.insert(&daily).await.unwrap();

        for day in 0..3 {
            let jobs = repos
                .reminders
                .find_recurring_due(NOW + day * DAY, 32)
                .await
                .unwrap();
            assert_eq!(jobs.len(), 1, "day {}", day);
            assert_eq!(jobs[0].reminder.status, DeliveryStatus::Pending);
        }
    }
}
