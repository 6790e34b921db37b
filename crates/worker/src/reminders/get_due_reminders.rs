use crate::shared::usecase::UseCase;
use chime_domain::NotificationJob;
use chime_infra::ChimeContext;
use tracing::error;

/// Collects every reminder that is up for delivery right now: one-shot
/// reminders inside the upcoming fetch window plus recurring reminders
/// whose time of day matches the current minute.
#[derive(Debug)]
pub struct GetDueRemindersUseCase;

#[derive(Debug)]
pub enum UseCaseErrors {
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetDueRemindersUseCase {
    type Response = Vec<NotificationJob>;

    type Errors = UseCaseErrors;

    async fn execute(&mut self, ctx: &ChimeContext) -> Result<Self::Response, Self::Errors> {
        let now = ctx.sys.get_timestamp_millis();
        let min_alert = ctx.config.alert_threshold;

        let mut jobs = ctx
            .repos
            .reminders
            .find_one_shot_due(now, ctx.config.fetch_window_millis(), min_alert)
            .await
            .map_err(|e| {
                error!("Unable to query due one-shot reminders: {:?}", e);
                UseCaseErrors::StorageError
            })?;

        let recurring = ctx
            .repos
            .reminders
            .find_recurring_due(now, min_alert)
            .await
            .map_err(|e| {
                error!("Unable to query due recurring reminders: {:?}", e);
                UseCaseErrors::StorageError
            })?;

        jobs.extend(recurring);
        Ok(jobs)
    }
}
