//! Daily age-refresh scheduler.
//!
//! The scheduler is an explicit component with its own lifecycle rather than
//! hidden process-global state: it is constructed with the patient service it
//! depends on, [`AgeRefreshScheduler::start`] spawns the timer task, and the
//! returned [`SchedulerHandle`] stops it.
//!
//! Each day at the configured local wall-clock time the task runs
//! [`PatientService::refresh_birthday_ages`] and logs the report. A failing
//! run is logged and abandoned until the next scheduled time; there are no
//! retries and nothing propagates, since the task has no caller.

use chrono::{Local, NaiveDateTime, NaiveTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::patient::PatientService;

/// Timer task that refreshes patient ages once per day.
pub struct AgeRefreshScheduler {
    patients: PatientService,
    run_at: NaiveTime,
}

impl AgeRefreshScheduler {
    /// Creates a scheduler that will run the batch daily at `run_at` (local
    /// wall-clock time).
    pub fn new(patients: PatientService, run_at: NaiveTime) -> Self {
        Self { patients, run_at }
    }

    /// Spawns the timer task and returns a handle that stops it.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            tracing::info!(run_at = %self.run_at, "age refresh scheduler started");
            loop {
                let wait = duration_until_next(Local::now().naive_local(), self.run_at);
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        let today = Local::now().date_naive();
                        match self.patients.refresh_birthday_ages(today) {
                            Ok(report) => tracing::info!(
                                %today,
                                matched = report.matched,
                                updated = report.updated,
                                failed = report.failed,
                                "age refresh complete"
                            ),
                            Err(err) => tracing::error!(
                                %today,
                                error = %err,
                                "age refresh run failed"
                            ),
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
            tracing::info!("age refresh scheduler stopped");
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signals the scheduler to stop and waits for the task to finish.
    pub async fn stop(self) {
        // Receiver may already be gone if the task panicked; join below
        // surfaces that either way.
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

/// Time to sleep from `now` until the next occurrence of `run_at`, always
/// strictly in the future (today's slot if still ahead, otherwise tomorrow's).
pub fn duration_until_next(now: NaiveDateTime, run_at: NaiveTime) -> std::time::Duration {
    let today_run = now.date().and_time(run_at);
    let next = if today_run > now {
        today_run
    } else {
        today_run + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}
