//! Background refresh scheduling.
//!
//! One [`RefreshRunner`] guards the refresh job so that the startup run, the
//! daily cron run, and manual triggers never overlap.

use std::sync::Arc;

use boostline_pipeline::{RefreshJob, RefreshSummary};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

pub struct RefreshRunner {
    job: Arc<RefreshJob>,
    guard: Arc<Mutex<()>>,
}

impl RefreshRunner {
    #[must_use]
    pub fn new(job: Arc<RefreshJob>) -> Self {
        Self {
            job,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Runs one refresh cycle unless another is in progress.
    ///
    /// Returns `None` when the run was skipped or failed fatally.
    pub async fn run_exclusive(&self, trigger: &'static str) -> Option<RefreshSummary> {
        let Ok(_guard) = self.guard.try_lock() else {
            tracing::info!(trigger, "refresh already running; skipping trigger");
            return None;
        };
        self.run_locked(trigger).await
    }

    /// Starts a refresh cycle on a background task.
    ///
    /// Returns `false` without spawning if a cycle is already running.
    pub fn spawn(self: &Arc<Self>, trigger: &'static str) -> bool {
        let Ok(guard) = Arc::clone(&self.guard).try_lock_owned() else {
            tracing::info!(trigger, "refresh already running; skipping trigger");
            return false;
        };
        let runner = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = guard;
            runner.run_locked(trigger).await;
        });
        true
    }

    async fn run_locked(&self, trigger: &'static str) -> Option<RefreshSummary> {
        tracing::info!(trigger, "refresh: starting run");
        match self.job.run_once().await {
            Ok(summary) => {
                tracing::info!(
                    trigger,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    total = summary.total,
                    "refresh: run complete"
                );
                Some(summary)
            }
            Err(e) => {
                tracing::error!(trigger, error = %e, "refresh: run failed");
                None
            }
        }
    }
}

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process. Dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the cron expression is invalid, or the scheduler fails to start.
pub async fn build_scheduler(
    runner: Arc<RefreshRunner>,
    cron: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    register_refresh_job(&scheduler, runner, cron).await?;
    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the recurring metrics refresh (daily at 00:00 UTC by default).
async fn register_refresh_job(
    scheduler: &JobScheduler,
    runner: Arc<RefreshRunner>,
    cron: &str,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron, move |_uuid, _lock| {
        let runner = Arc::clone(&runner);

        Box::pin(async move {
            runner.run_exclusive("scheduled").await;
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron, "scheduler: registered metrics refresh job");
    Ok(())
}
