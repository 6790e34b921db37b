mod reminders;
mod scheduler;
mod shared;

pub use scheduler::{millis_until_next_minute, CycleScheduler};

use reminders::dispatch_reminders::DispatchRemindersUseCase;
use reminders::get_due_reminders::GetDueRemindersUseCase;
use shared::usecase::execute;

use chime_infra::ChimeContext;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// One pass over the store: fetch the due reminders and dispatch them.
/// A fetch error aborts this cycle only; the scheduler simply runs the
/// next one when its tick comes around.
pub async fn run_cycle(ctx: &ChimeContext) {
    let jobs = match execute(GetDueRemindersUseCase, ctx).await {
        Ok(jobs) => jobs,
        Err(e) => {
            ctx.notifiers
                .alerts
                .report("due reminder query", &format!("{:?}", e))
                .await;
            return;
        }
    };

    if jobs.is_empty() {
        return;
    }

    info!("Dispatching {} due reminder(s)", jobs.len());
    // The dispatcher contains every failure to the job it happened on
    let _ = execute(DispatchRemindersUseCase { jobs }, ctx).await;
}

pub struct Application {
    context: ChimeContext,
}

impl Application {
    pub fn new(context: ChimeContext) -> Self {
        Self { context }
    }

    pub async fn start(self) -> std::io::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    // Receiver dropping just means the loop is already gone
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => error!("Unable to listen for the shutdown signal: {:?}", e),
            }
        });

        let start_delay = Duration::from_millis(millis_until_next_minute(
            self.context.sys.get_timestamp_millis(),
        ));
        let scheduler = CycleScheduler::new(start_delay, self.context.config.poll_interval());

        info!(
            "Reminder worker started, first cycle runs in {} ms",
            start_delay.as_millis()
        );

        let context = self.context;
        scheduler
            .run(shutdown_rx, move || {
                let ctx = context.clone();
                async move { run_cycle(&ctx).await }
            })
            .await;

        info!("Reminder worker stopped");
        Ok(())
    }
}
