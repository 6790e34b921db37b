use crate::shared::usecase::UseCase;
use chime_domain::NotificationJob;
use chime_infra::ChimeContext;
use tracing::{error, info, warn};

/// Delivers a batch of due notification jobs over the configured push
/// channels. Every failure is contained to the job (or the channel) it
/// happened on: the rest of the batch is always attempted.
#[derive(Debug)]
pub struct DispatchRemindersUseCase {
    pub jobs: Vec<NotificationJob>,
}

#[derive(Debug)]
pub enum UseCaseErrors {}

#[async_trait::async_trait(?Send)]
impl UseCase for DispatchRemindersUseCase {
    type Response = ();

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ChimeContext) -> Result<Self::Response, Self::Errors> {
        let now = ctx.sys.get_timestamp_millis();

        for job in &self.jobs {
            match job.reminder.due_today(now) {
                Ok(true) => {}
                Ok(false) => {
                    info!("Recurring reminder {} is not due today", job.reminder.id);
                    continue;
                }
                Err(e) => {
                    warn!(
                        "Skipping reminder {} with a malformed recurrence rule: {:?}",
                        job.reminder.id, e
                    );
                    continue;
                }
            }

            let message = job.message();
            let mut delivered = false;

            if let Some(token) = job.user.ios_token() {
                match ctx.notifiers.ios.send(token, &message).await {
                    Ok(delivery_id) => {
                        info!(
                            "Pushed reminder {} to an iOS device: {}",
                            job.reminder.id, delivery_id
                        );
                        delivered = true;
                    }
                    Err(e) => {
                        error!(
                            "Unable to push reminder {} to an iOS device: {}",
                            job.reminder.id, e
                        );
                        ctx.notifiers
                            .alerts
                            .report(
                                "iOS push delivery",
                                &format!("reminder {}: {}", job.reminder.id, e),
                            )
                            .await;
                    }
                }
            }

            if let Some(token) = job.user.android_token() {
                match ctx.notifiers.android.send(token, &message).await {
                    Ok(delivery_id) => {
                        info!(
                            "Pushed reminder {} to an Android device: {}",
                            job.reminder.id, delivery_id
                        );
                        delivered = true;
                    }
                    Err(e) => {
                        error!(
                            "Unable to push reminder {} to an Android device: {}",
                            job.reminder.id, e
                        );
                        ctx.notifiers
                            .alerts
                            .report(
                                "Android push delivery",
                                &format!("reminder {}: {}", job.reminder.id, e),
                            )
                            .await;
                    }
                }
            }

            if delivered && !job.reminder.is_recurring() {
                if let Err(e) = ctx.repos.reminders.mark_sent(&job.reminder.id).await {
                    error!(
                        "Reminder {} was delivered but could not be marked as sent and may be delivered again: {:?}",
                        job.reminder.id, e
                    );
                    ctx.notifiers
                        .alerts
                        .report(
                            "reminder status update",
                            &format!("reminder {}: {:?}", job.reminder.id, e),
                        )
                        .await;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::shared::usecase::execute;
    use chime_domain::{Reminder, User};
    use chime_infra::{ChimeContext, IPushChannel, ISys, LogErrorSink, Notifiers, PushError};
    use std::sync::{Arc, Mutex};

    // Sun Feb 21 2021 07:30:00 UTC
    const SUNDAY: i64 = 1613865600000 + (7 * 60 + 30) * 60 * 1000;
    const DAY: i64 = 24 * 60 * 60 * 1000;
    const TUESDAY: i64 = SUNDAY + 2 * DAY;

    struct StaticTimeSys(i64);
    impl ISys for StaticTimeSys {
        fn get_timestamp_millis(&self) -> i64 {
            self.0
        }
    }

    #[derive(Default)]
    struct MockChannel {
        sent: Mutex<Vec<(String, String)>>,
        fail_tokens: Vec<String>,
    }

    impl MockChannel {
        fn failing_for(tokens: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_tokens: tokens.iter().map(|t| t.to_string()).collect(),
            }
        }

        fn sent_tokens(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(token, _)| token.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl IPushChannel for MockChannel {
        async fn send(&self, device_token: &str, message: &str) -> Result<String, PushError> {
            if self.fail_tokens.iter().any(|t| t == device_token) {
                return Err(PushError::Rejected {
                    status: 400,
                    body: "BadDeviceToken".into(),
                });
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((device_token.to_string(), message.to_string()));
            Ok(format!("delivery-{}", sent.len()))
        }
    }

    struct TestSetup {
        ctx: ChimeContext,
        ios: Arc<MockChannel>,
        android: Arc<MockChannel>,
    }

    fn setup_with(ios: MockChannel, android: MockChannel, now: i64) -> TestSetup {
        let ios = Arc::new(ios);
        let android = Arc::new(android);
        let mut ctx = ChimeContext::create_inmemory();
        ctx.notifiers = Notifiers {
            ios: ios.clone(),
            android: android.clone(),
            alerts: Arc::new(LogErrorSink),
        };
        ctx.sys = Arc::new(StaticTimeSys(now));
        TestSetup { ctx, ios, android }
    }

    fn user_factory(ios_token: Option<&str>, android_token: Option<&str>) -> User {
        User {
            ios_device_token: ios_token.map(String::from),
            android_device_token: android_token.map(String::from),
            ..Default::default()
        }
    }

    fn job_factory(user: &User, fire_ts: i64, repeat_rule: Option<&str>) -> NotificationJob {
        let weekday = match repeat_rule {
            Some(rule) if !rule.is_empty() => {
                Some(chime_domain::weekday_name(fire_ts).to_string())
            }
            _ => None,
        };
        NotificationJob::new(
            Reminder {
                id: Default::default(),
                name: "Piano lesson".into(),
                description: Default::default(),
                alert: 60,
                fire_ts,
                repeat_rule: repeat_rule.map(String::from),
                weekday,
                user_id: user.id.clone(),
                status: Default::default(),
            },
            user.clone(),
        )
    }

    #[tokio::test]
    async fn routes_jobs_to_the_channel_matching_their_destination() {
        let setup = setup_with(MockChannel::default(), MockChannel::default(), SUNDAY);

        let ios_user = user_factory(Some("ios-token"), None);
        let android_user = user_factory(None, Some("android-token"));
        let jobs = vec![
            job_factory(&ios_user, SUNDAY, None),
            job_factory(&android_user, SUNDAY, None),
        ];

        execute(DispatchRemindersUseCase { jobs }, &setup.ctx)
            .await
            .unwrap();

        assert_eq!(setup.ios.sent_tokens(), vec!["ios-token"]);
        assert_eq!(setup.android.sent_tokens(), vec!["android-token"]);
    }

    #[tokio::test]
    async fn a_recipient_with_both_tokens_is_pushed_on_both_channels() {
        let setup = setup_with(MockChannel::default(), MockChannel::default(), SUNDAY);

        let user = user_factory(Some("ios-token"), Some("android-token"));
        let jobs = vec![job_factory(&user, SUNDAY, None)];

        execute(DispatchRemindersUseCase { jobs }, &setup.ctx)
            .await
            .unwrap();

        assert_eq!(setup.ios.sent_tokens(), vec!["ios-token"]);
        assert_eq!(setup.android.sent_tokens(), vec!["android-token"]);
    }

    #[tokio::test]
    async fn one_channel_failing_does_not_suppress_the_other() {
        let setup = setup_with(
            MockChannel::failing_for(&["ios-token"]),
            MockChannel::default(),
            SUNDAY,
        );

        let user = user_factory(Some("ios-token"), Some("android-token"));
        let job = job_factory(&user, SUNDAY, None);
        setup.ctx.repos.users.insert(&user).await.unwrap();
        setup.ctx.repos.reminders.insert(&job.reminder).await.unwrap();

        execute(DispatchRemindersUseCase { jobs: vec![job] }, &setup.ctx)
            .await
            .unwrap();

        assert!(setup.ios.sent_tokens().is_empty());
        assert_eq!(setup.android.sent_tokens(), vec!["android-token"]);

        // One successful channel is enough to consume the one-shot
        let remaining = setup
            .ctx
            .repos
            .reminders
            .find_one_shot_due(SUNDAY, 60 * 1000, 32)
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn a_failing_job_does_not_block_its_siblings() {
        let setup = setup_with(
            MockChannel::failing_for(&["ios-2"]),
            MockChannel::default(),
            SUNDAY,
        );

        let users: Vec<_> = ["ios-1", "ios-2", "ios-3"]
            .iter()
            .map(|token| user_factory(Some(*token), None))
            .collect();
        let jobs = users
            .iter()
            .map(|user| job_factory(user, SUNDAY, None))
            .collect();

        execute(DispatchRemindersUseCase { jobs }, &setup.ctx)
            .await
            .unwrap();

        assert_eq!(setup.ios.sent_tokens(), vec!["ios-1", "ios-3"]);
    }

    #[tokio::test]
    async fn weekly_reminders_are_skipped_on_other_days() {
        let setup = setup_with(MockChannel::default(), MockChannel::default(), TUESDAY);

        let user = user_factory(Some("ios-token"), None);
        // Fires weekly on Mondays, evaluated on a Tuesday
        let job = job_factory(&user, SUNDAY + DAY, Some("WEEKLY"));
        assert_eq!(job.reminder.weekday.as_deref(), Some("Monday"));
        setup.ctx.repos.users.insert(&user).await.unwrap();
        setup.ctx.repos.reminders.insert(&job.reminder).await.unwrap();

        execute(DispatchRemindersUseCase { jobs: vec![job] }, &setup.ctx)
            .await
            .unwrap();

        assert!(setup.ios.sent_tokens().is_empty());
        // Never consumed: the reminder stays fetchable for next Monday
        let recurring = setup
            .ctx
            .repos
            .reminders
            .find_recurring_due(TUESDAY, 32)
            .await
            .unwrap();
        assert_eq!(recurring.len(), 1);
    }

    #[tokio::test]
    async fn recurring_reminders_are_never_marked_sent() {
        let setup = setup_with(MockChannel::default(), MockChannel::default(), SUNDAY);

        let user = user_factory(Some("ios-token"), None);
        let job = job_factory(&user, SUNDAY - 7 * DAY, Some("DAILY"));
        setup.ctx.repos.users.insert(&user).await.unwrap();
        setup.ctx.repos.reminders.insert(&job.reminder).await.unwrap();

        execute(DispatchRemindersUseCase { jobs: vec![job] }, &setup.ctx)
            .await
            .unwrap();

        assert_eq!(setup.ios.sent_tokens(), vec!["ios-token"]);
        let recurring = setup
            .ctx
            .repos
            .reminders
            .find_recurring_due(SUNDAY, 32)
            .await
            .unwrap();
        assert_eq!(recurring.len(), 1);
    }

    #[tokio::test]
    async fn malformed_recurrence_rules_are_skipped_without_a_send() {
        let setup = setup_with(MockChannel::default(), MockChannel::default(), SUNDAY);

        let user = user_factory(Some("ios-token"), None);
        let job = job_factory(&user, SUNDAY, Some("FORTNIGHTLY"));

        execute(DispatchRemindersUseCase { jobs: vec![job] }, &setup.ctx)
            .await
            .unwrap();

        assert!(setup.ios.sent_tokens().is_empty());
    }
}
