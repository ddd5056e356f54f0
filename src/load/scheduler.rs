//! Fixed-rate traffic scheduler.
//!
//! # Responsibilities
//! - Drive every job on its own timeline until shutdown
//! - Dispatch firings onto a bounded worker pool
//! - Record every outcome without letting it touch the schedule
//!
//! # Timing Model
//! ```text
//! job i:  |-- initial_delay --|fire|-- period --|fire|-- period --|fire| ...
//!                             t0               t0+p             t0+2p
//! ```
//! Firing `k` is due at `start + initial_delay + k * period` whatever the
//! previous firings did. A late tick (runtime starved) is caught up in a
//! burst rather than shifting the timeline.
//!
//! # Design Decisions
//! - Each job owns a timer task; firings are spawned, never awaited inline
//! - Worker pool is a semaphore; firings beyond the pool size queue
//! - Jobs are single-flight by default: a firing that finds the previous one
//!   still running is skipped and counted, so a job whose calls outlast its
//!   period holds at most its cap of workers. Unbounded overlap is opt-in
//! - Shutdown stops all timelines and aborts in-flight firings

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::lifecycle::Shutdown;
use crate::load::job::{ScheduleError, ScheduledJob};
use crate::load::outcome::{safe_call, JobSnapshot, JobStats};
use crate::load::transport::Transport;
use crate::observability::metrics;
use crate::simulator::random::{RandomSource, ThreadRandom};

const DEFAULT_WORKERS: usize = 3;
const DEFAULT_PREVIEW_CHARS: usize = 100;

/// Runs a fixed set of jobs against a transport.
pub struct TrafficScheduler<T> {
    jobs: Vec<ScheduledJob>,
    transport: Arc<T>,
    random: Arc<dyn RandomSource>,
    workers: usize,
    preview_chars: usize,
}

/// State shared by every firing.
struct FiringContext<T> {
    transport: Arc<T>,
    workers: Arc<Semaphore>,
    random: Arc<dyn RandomSource>,
    preview_chars: usize,
}

impl<T> Clone for FiringContext<T> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            workers: self.workers.clone(),
            random: self.random.clone(),
            preview_chars: self.preview_chars,
        }
    }
}

impl<T: Transport> TrafficScheduler<T> {
    pub fn new(jobs: Vec<ScheduledJob>, transport: Arc<T>) -> Self {
        Self {
            jobs,
            transport,
            random: Arc::new(ThreadRandom),
            workers: DEFAULT_WORKERS,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    fn validate(&self) -> Result<(), ScheduleError> {
        if self.jobs.is_empty() {
            return Err(ScheduleError::NoJobs);
        }
        if self.workers == 0 {
            return Err(ScheduleError::NoWorkers);
        }
        let mut names = HashSet::new();
        for job in &self.jobs {
            job.validate()?;
            if !names.insert(job.name.as_str()) {
                return Err(ScheduleError::DuplicateJob(job.name.clone()));
            }
        }
        Ok(())
    }

    /// Validate the schedule and start every job.
    ///
    /// All timelines share one start instant, taken here.
    pub fn start(self, shutdown: &Shutdown) -> Result<SchedulerHandle, ScheduleError> {
        self.validate()?;

        let ctx = FiringContext {
            transport: self.transport,
            workers: Arc::new(Semaphore::new(self.workers)),
            random: self.random,
            preview_chars: self.preview_chars,
        };
        let start = Instant::now();
        let mut tasks = JoinSet::new();
        let mut stats = Vec::with_capacity(self.jobs.len());

        for job in self.jobs {
            let mut ticker = time::interval_at(start + job.initial_delay, job.period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            tracing::info!(
                job = %job.name,
                path = %job.path,
                initial_delay_ms = job.initial_delay.as_millis() as u64,
                period_ms = job.period.as_millis() as u64,
                max_in_flight = ?job.max_in_flight,
                "Scheduled job"
            );

            let job_stats = Arc::new(JobStats::default());
            stats.push((job.name.clone(), job_stats.clone()));
            tasks.spawn(drive_job(Arc::new(job), ticker, ctx.clone(), job_stats, shutdown.subscribe()));
        }

        tracing::info!(jobs = stats.len(), workers = self.workers, "Traffic scheduler started");
        Ok(SchedulerHandle { stats, tasks })
    }

    /// Start and run until shutdown.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), ScheduleError> {
        self.start(shutdown)?.join().await;
        Ok(())
    }
}

/// Running scheduler: per-job stats and the job tasks.
pub struct SchedulerHandle {
    stats: Vec<(String, Arc<JobStats>)>,
    tasks: JoinSet<()>,
}

impl SchedulerHandle {
    pub fn snapshot(&self, job: &str) -> Option<JobSnapshot> {
        self.stats
            .iter()
            .find(|(name, _)| name == job)
            .map(|(_, stats)| stats.snapshot())
    }

    pub fn snapshots(&self) -> Vec<(String, JobSnapshot)> {
        self.stats
            .iter()
            .map(|(name, stats)| (name.clone(), stats.snapshot()))
            .collect()
    }

    /// Wait for every job loop to exit.
    pub async fn join(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Job task terminated abnormally");
            }
        }
        for (job, snapshot) in self.snapshots() {
            tracing::info!(
                job = %job,
                fired = snapshot.fired,
                succeeded = snapshot.succeeded,
                failed = snapshot.failed,
                skipped = snapshot.skipped,
                "Job stopped"
            );
        }
    }
}

async fn drive_job<T: Transport>(
    job: Arc<ScheduledJob>,
    mut ticker: Interval,
    ctx: FiringContext<T>,
    stats: Arc<JobStats>,
    mut shutdown: broadcast::Receiver<()>,
) {
    let in_flight = job.max_in_flight.map(|limit| Arc::new(Semaphore::new(limit)));
    let mut firings = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let slot = match &in_flight {
                    Some(limit) => match limit.clone().try_acquire_owned() {
                        Ok(permit) => Some(permit),
                        Err(_) => {
                            stats.record_skipped();
                            metrics::record_skipped(&job.name);
                            tracing::debug!(job = %job.name, "Previous firing still in flight, skipping");
                            continue;
                        }
                    },
                    None => None,
                };
                stats.record_fired();
                firings.spawn(fire(job.clone(), ctx.clone(), stats.clone(), slot));
            }
            Some(joined) = firings.join_next(), if !firings.is_empty() => {
                if let Err(e) = joined {
                    tracing::error!(job = %job.name, error = %e, "Firing terminated abnormally");
                }
            }
            _ = shutdown.recv() => {
                tracing::debug!(job = %job.name, "Job received shutdown signal, exiting loop");
                break;
            }
        }
    }

    firings.shutdown().await;
}

async fn fire<T: Transport>(
    job: Arc<ScheduledJob>,
    ctx: FiringContext<T>,
    stats: Arc<JobStats>,
    _slot: Option<OwnedSemaphorePermit>,
) {
    let Ok(_worker) = ctx.workers.clone().acquire_owned().await else {
        return;
    };
    let path = job.render_path(ctx.random.as_ref());
    let outcome = safe_call(ctx.transport.as_ref(), &job.name, &path, ctx.preview_chars).await;
    stats.record(&outcome);
}
