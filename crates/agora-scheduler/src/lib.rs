//! # Agora Scheduler - Tiered Periodic Jobs
//!
//! One dedicated loop ticks once per second while the stop flag is unset. A
//! counter modulo 60/600/3600 decides which tiers fire on a given tick: the
//! 600 tier only on ticks where the 60 tier fires, the 3600 tier only inside
//! the 600 tier. Jobs run synchronously in tier order; a job error is logged
//! and stops neither the loop nor the remaining jobs. The counter wraps at
//! 86 400 — exactly one day, a multiple of the largest tier, so the wrap
//! never changes which jobs fire next.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

/// Error returned by a scheduled job.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct JobError(pub String);

impl JobError {
    /// Wraps any displayable error.
    pub fn new(err: impl std::fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// A no-argument job bound to one cadence tier.
pub type ScheduledJob = Box<dyn Fn() -> Result<(), JobError> + Send + Sync>;

struct NamedJob {
    name: &'static str,
    run: ScheduledJob,
}

const SECONDS_IN_DAY: u32 = 86_400;

/// The tiered periodic executor.
pub struct Scheduler {
    jobs_60: Vec<NamedJob>,
    jobs_600: Vec<NamedJob>,
    jobs_3600: Vec<NamedJob>,
    stop: Arc<AtomicBool>,
}

impl Scheduler {
    /// Creates an empty scheduler observing `stop`.
    pub fn new(stop: Arc<AtomicBool>) -> Self {
        Self {
            jobs_60: Vec::new(),
            jobs_600: Vec::new(),
            jobs_3600: Vec::new(),
            stop,
        }
    }

    /// Registers a job on the 60-second tier.
    pub fn every_minute(
        mut self,
        name: &'static str,
        job: impl Fn() -> Result<(), JobError> + Send + Sync + 'static,
    ) -> Self {
        self.jobs_60.push(NamedJob {
            name,
            run: Box::new(job),
        });
        self
    }

    /// Registers a job on the 600-second tier.
    pub fn every_ten_minutes(
        mut self,
        name: &'static str,
        job: impl Fn() -> Result<(), JobError> + Send + Sync + 'static,
    ) -> Self {
        self.jobs_600.push(NamedJob {
            name,
            run: Box::new(job),
        });
        self
    }

    /// Registers a job on the 3600-second tier.
    pub fn every_hour(
        mut self,
        name: &'static str,
        job: impl Fn() -> Result<(), JobError> + Send + Sync + 'static,
    ) -> Self {
        self.jobs_3600.push(NamedJob {
            name,
            run: Box::new(job),
        });
        self
    }

    /// Runs the tick loop until the stop flag is set.
    pub async fn run(self) {
        // Counts seconds; resets every 24 hours.
        let mut tick: u32 = 1;

        loop {
            if self.stop.load(Ordering::Acquire) {
                break;
            }

            if tick % 60 == 0 {
                run_tier(&self.jobs_60);

                if tick % 600 == 0 {
                    run_tier(&self.jobs_600);

                    if tick % 3600 == 0 {
                        run_tier(&self.jobs_3600);
                    }
                }
            }

            if tick == SECONDS_IN_DAY {
                tick = 0;
            }
            tick += 1;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        info!("scheduler has stopped");
    }
}

fn run_tier(jobs: &[NamedJob]) {
    for job in jobs {
        if let Err(err) = (job.run)() {
            error!(job = job.name, %err, "scheduled job failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn counting_job(counter: &Arc<AtomicUsize>) -> impl Fn() -> Result<(), JobError> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn tiers_fire_at_their_cadence() {
        let stop = Arc::new(AtomicBool::new(false));
        let minute = Arc::new(AtomicUsize::new(0));
        let ten = Arc::new(AtomicUsize::new(0));
        let hour = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new(stop.clone())
            .every_minute("minute", counting_job(&minute))
            .every_ten_minutes("ten", counting_job(&ten))
            .every_hour("hour", counting_job(&hour));
        let handle = tokio::spawn(scheduler.run());

        // One simulated hour.
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(minute.load(Ordering::SeqCst), 60);
        assert_eq!(ten.load(Ordering::SeqCst), 6);
        assert_eq!(hour.load(Ordering::SeqCst), 1);

        stop.store(true, Ordering::Release);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn a_failing_job_does_not_stop_the_rest() {
        let stop = Arc::new(AtomicBool::new(false));
        let after = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new(stop.clone())
            .every_minute("broken", || Err(JobError::new("boom")))
            .every_minute("after", counting_job(&after));
        let handle = tokio::spawn(scheduler.run());

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(after.load(Ordering::SeqCst), 2);

        stop.store(true, Ordering::Release);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn day_wrap_keeps_the_cadence() {
        let stop = Arc::new(AtomicBool::new(false));
        let hour = Arc::new(AtomicUsize::new(0));

        let scheduler = Scheduler::new(stop.clone()).every_hour("hour", counting_job(&hour));
        let handle = tokio::spawn(scheduler.run());

        // A day plus one hour: the wrap at 86 400 must not shift the tier.
        tokio::time::sleep(Duration::from_secs(u64::from(SECONDS_IN_DAY) + 3600)).await;
        assert_eq!(hour.load(Ordering::SeqCst), 25);

        stop.store(true, Ordering::Release);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }
}
