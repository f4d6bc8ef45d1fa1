//! Chained job worker.
//!
//! Jobs are dealt round-robin into up to three chains. Chains run in
//! parallel; jobs within a chain run one after another, and a failed job
//! cancels the rest of its chain.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::sleep;
use tracing::{error, info, warn};

use compacter_core::defaults::{
    EVENT_BUS_CAPACITY, JOB_BACKOFF_INTERVAL_MS, JOB_MAX_PARALLEL, JOB_MAX_PARALLEL_LIMIT,
    JOB_MAX_RETRIES,
};
use compacter_core::{Error, QueueStore, Result};

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::job::CompressionJob;

/// Configuration for the job worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of parallel chains (clamped to 1..=3 when used).
    pub max_parallel_tasks: usize,
    /// Linear backoff step in milliseconds.
    pub backoff_interval_ms: u64,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Whether to process jobs at all.
    pub enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_parallel_tasks: JOB_MAX_PARALLEL,
            backoff_interval_ms: JOB_BACKOFF_INTERVAL_MS,
            max_retries: JOB_MAX_RETRIES,
            enabled: true,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `COMPACTER_WORKER_ENABLED` | `true` | Enable/disable job processing |
    /// | `COMPACTER_MAX_PARALLEL` | `1` | Parallel chains, 1-3 |
    /// | `COMPACTER_BACKOFF_MS` | `30000` | Linear retry backoff step |
    /// | `COMPACTER_MAX_RETRIES` | `3` | Retries per job |
    pub fn from_env() -> Self {
        let enabled = std::env::var("COMPACTER_WORKER_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let max_parallel_tasks = std::env::var("COMPACTER_MAX_PARALLEL")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(JOB_MAX_PARALLEL)
            .clamp(1, JOB_MAX_PARALLEL_LIMIT);

        let backoff_interval_ms = std::env::var("COMPACTER_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(JOB_BACKOFF_INTERVAL_MS);

        let max_retries = std::env::var("COMPACTER_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(JOB_MAX_RETRIES);

        Self {
            max_parallel_tasks,
            backoff_interval_ms,
            max_retries,
            enabled,
        }
    }

    pub fn with_max_parallel(mut self, max: usize) -> Self {
        self.max_parallel_tasks = max;
        self
    }

    pub fn with_backoff_interval(mut self, ms: u64) -> Self {
        self.backoff_interval_ms = ms;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Chain count actually used.
    pub fn parallelism(&self) -> usize {
        self.max_parallel_tasks.clamp(1, JOB_MAX_PARALLEL_LIMIT)
    }

    /// Delay before retry number `attempt` (1-based): `attempt x interval`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_interval_ms.saturating_mul(attempt as u64))
    }

    /// Deal items round-robin into at most [`parallelism`](Self::parallelism)
    /// non-empty chains.
    ///
    /// ```
    /// use compacter_jobs::WorkerConfig;
    ///
    /// let chains = WorkerConfig::default().with_max_parallel(2).split_into_chains(vec![0, 1, 2, 3, 4]);
    /// assert_eq!(chains, vec![vec![0, 2, 4], vec![1, 3]]);
    /// ```
    pub fn split_into_chains<T>(&self, items: Vec<T>) -> Vec<Vec<T>> {
        let count = self.parallelism().min(items.len());
        let mut chains: Vec<Vec<T>> = (0..count).map(|_| Vec::new()).collect();
        for (i, item) in items.into_iter().enumerate() {
            chains[i % count].push(item);
        }
        chains
    }
}

/// Event emitted by the job worker.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Worker started.
    WorkerStarted { total_jobs: usize, chains: usize },
    /// A job attempt was started.
    JobStarted {
        job_id: String,
        chain: usize,
        attempt: u32,
    },
    /// Job progress was updated.
    JobProgress { job_id: String, percent: u8 },
    /// A job completed successfully.
    JobCompleted {
        job_id: String,
        result: Option<JsonValue>,
    },
    /// A job failed for good.
    JobFailed { job_id: String, error: String },
    /// A job will be retried after `delay_ms`.
    JobRetrying {
        job_id: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    /// A job never ran.
    JobCancelled { job_id: String, reason: String },
    /// Worker stopped.
    WorkerStopped { summary: WorkerSummary },
}

/// Final job counts for one worker run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl WorkerSummary {
    fn merge(&mut self, other: WorkerSummary) {
        self.completed += other.completed;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
    }

    pub fn total(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }
}

/// Handle for a running batch.
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    event_rx: broadcast::Receiver<WorkerEvent>,
    task: JoinHandle<WorkerSummary>,
}

impl WorkerHandle {
    /// Stop starting new jobs. Running jobs finish; queued ones are cancelled.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Get a receiver for worker events.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_rx.resubscribe()
    }

    /// Wait for every chain to finish.
    pub async fn wait(self) -> Result<WorkerSummary> {
        self.task
            .await
            .map_err(|e| Error::Internal(format!("Worker task failed: {}", e)))
    }
}

/// Runs batches of compression jobs through a single handler.
pub struct JobWorker {
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
}

impl JobWorker {
    pub fn new<H: JobHandler + 'static>(handler: H, config: WorkerConfig) -> Self {
        Self::with_shared_handler(Arc::new(handler), config)
    }

    pub fn with_shared_handler(handler: Arc<dyn JobHandler>, config: WorkerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        Self {
            handler,
            config,
            event_tx,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Get a receiver for worker events.
    ///
    /// Subscribe before [`start`](Self::start) to see `WorkerStarted`.
    pub fn events(&self) -> broadcast::Receiver<WorkerEvent> {
        self.event_tx.subscribe()
    }

    /// Start processing `jobs` in the background.
    pub fn start(&self, jobs: Vec<CompressionJob>) -> WorkerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let event_rx = self.event_tx.subscribe();

        let runner = ChainRunner {
            handler: self.handler.clone(),
            config: self.config.clone(),
            event_tx: self.event_tx.clone(),
            shutdown_rx,
        };
        let task = tokio::spawn(runner.run(jobs));

        WorkerHandle {
            shutdown_tx,
            event_rx,
            task,
        }
    }

    /// Drain the queue and start processing it.
    ///
    /// A disabled worker leaves the queue untouched.
    pub async fn start_queue(&self, queue: &QueueStore) -> Result<WorkerHandle> {
        if !self.config.enabled {
            return Ok(self.start(Vec::new()));
        }
        let items = queue.take_all().await?;
        let jobs = items.iter().map(CompressionJob::from_queue_item).collect();
        Ok(self.start(jobs))
    }
}

/// Everything one background run needs, cloned into each chain task.
#[derive(Clone)]
struct ChainRunner {
    handler: Arc<dyn JobHandler>,
    config: WorkerConfig,
    event_tx: broadcast::Sender<WorkerEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl ChainRunner {
    async fn run(self, jobs: Vec<CompressionJob>) -> WorkerSummary {
        if !self.config.enabled {
            info!("Compression worker is disabled, not starting");
            return WorkerSummary::default();
        }

        let total_jobs = jobs.len();
        let chains = self.config.split_into_chains(jobs);
        info!(
            subsystem = "jobs",
            total_jobs,
            chains = chains.len(),
            backoff_interval_ms = self.config.backoff_interval_ms,
            "Compression worker started"
        );
        self.emit(WorkerEvent::WorkerStarted {
            total_jobs,
            chains: chains.len(),
        });

        let mut tasks = JoinSet::new();
        for (index, chain) in chains.into_iter().enumerate() {
            let runner = self.clone();
            tasks.spawn(async move { runner.run_chain(index, chain).await });
        }

        let mut summary = WorkerSummary::default();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(chain_summary) => summary.merge(chain_summary),
                Err(e) => error!(error = ?e, "Chain task panicked"),
            }
        }

        info!(
            subsystem = "jobs",
            completed = summary.completed,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Compression worker stopped"
        );
        self.emit(WorkerEvent::WorkerStopped { summary });
        summary
    }

    async fn run_chain(&self, chain: usize, jobs: Vec<CompressionJob>) -> WorkerSummary {
        let mut summary = WorkerSummary::default();
        let mut jobs = jobs.into_iter();

        while let Some(job) = jobs.next() {
            if *self.shutdown_rx.borrow() {
                let remaining = std::iter::once(job).chain(jobs.by_ref());
                summary.cancelled += self.cancel(remaining, "Worker shut down");
                break;
            }

            let job_id = job.id.clone();
            if self.run_job(chain, job).await {
                summary.completed += 1;
            } else {
                summary.failed += 1;
                let reason = format!("Previous job {} in chain failed", job_id);
                summary.cancelled += self.cancel(jobs.by_ref(), &reason);
                break;
            }
        }

        summary
    }

    /// Run one job to a final outcome, retrying with linear backoff.
    async fn run_job(&self, chain: usize, job: CompressionJob) -> bool {
        let job_id = job.id.clone();
        let mut attempt = 1;

        loop {
            let start = Instant::now();
            info!(job_id = %job_id, chain, attempt, "Processing job");
            self.emit(WorkerEvent::JobStarted {
                job_id: job_id.clone(),
                chain,
                attempt,
            });

            let event_tx = self.event_tx.clone();
            let progress_id = job_id.clone();
            let ctx = JobContext::new(job.clone())
                .with_attempt(attempt)
                .with_progress_callback(move |percent, _| {
                    let _ = event_tx.send(WorkerEvent::JobProgress {
                        job_id: progress_id.clone(),
                        percent,
                    });
                });

            match self.handler.execute(ctx).await {
                JobResult::Success(result) => {
                    info!(
                        job_id = %job_id,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Job completed successfully"
                    );
                    self.emit(WorkerEvent::JobCompleted { job_id, result });
                    return true;
                }
                JobResult::Failed(error) => {
                    warn!(job_id = %job_id, %error, "Job failed");
                    self.emit(WorkerEvent::JobFailed { job_id, error });
                    return false;
                }
                JobResult::Retry(reason) if attempt > self.config.max_retries => {
                    warn!(job_id = %job_id, %reason, attempt, "Job out of retries");
                    self.emit(WorkerEvent::JobFailed {
                        job_id,
                        error: reason,
                    });
                    return false;
                }
                JobResult::Retry(reason) => {
                    let delay = self.config.backoff_delay(attempt);
                    warn!(
                        job_id = %job_id,
                        %reason,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Job will be retried"
                    );
                    self.emit(WorkerEvent::JobRetrying {
                        job_id: job_id.clone(),
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                        reason,
                    });
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn cancel(&self, jobs: impl Iterator<Item = CompressionJob>, reason: &str) -> usize {
        let mut count = 0;
        for job in jobs {
            info!(job_id = %job.id, reason, "Job cancelled");
            self.emit(WorkerEvent::JobCancelled {
                job_id: job.id,
                reason: reason.to_string(),
            });
            count += 1;
        }
        count
    }

    fn emit(&self, event: WorkerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}
