use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::info;

/// Drives the fetch and dispatch cycle at a fixed cadence.
///
/// The cycle future is awaited inline, so two cycles can never run at the
/// same time; ticks that fire while a cycle is still in progress are
/// skipped. Once shutdown is signalled no new cycle starts and an
/// in-flight cycle is left to finish.
pub struct CycleScheduler {
    start_delay: Duration,
    interval: Duration,
}

impl CycleScheduler {
    pub fn new(start_delay: Duration, interval: Duration) -> Self {
        Self {
            start_delay,
            interval,
        }
    }

    pub async fn run<F, Fut>(&self, mut shutdown: watch::Receiver<bool>, mut cycle: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut ticks = interval_at(Instant::now() + self.start_delay, self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => cycle().await,
                _ = shutdown.changed() => {
                    info!("Shutdown requested, no further cycles will run");
                    break;
                }
            }
        }
    }
}

/// Millis from `now_ts` until the next full minute. The first cycle is
/// aligned to a minute boundary so the time-of-day match for recurring
/// reminders evaluates every minute exactly once.
pub fn millis_until_next_minute(now_ts: i64) -> u64 {
    (60_000 - now_ts.rem_euclid(60_000)) as u64
}
