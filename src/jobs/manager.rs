// src/jobs/manager.rs
//! Job orchestration. `create_job` validates, registers the job, and
//! returns its id immediately; a spawned supervisor fans the
//! (keyword, source) tasks out over a semaphore-bounded `JoinSet`,
//! records every outcome under the store lock, and finalizes the job
//! exactly once. A task failure never fails the job; a panic in one task
//! becomes one error entry.

use std::sync::Arc;

use metrics::counter;
use thiserror::Error;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::enrich::EnrichmentPipeline;
use crate::fallback::FallbackExecutor;
use crate::sources::SourceRegistry;
use crate::store::{InsertOutcome, Post, PostStore};

use super::store::JobStore;
use super::{Job, JobId, JobStatus, JobView, Task, TaskError, TaskResult};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("job not found")]
    NotFound,
}

/// Validated input to `create_job`. `limit`/`concurrency` fall back to
/// configured defaults when absent.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub keywords: Vec<String>,
    pub sources: Vec<String>,
    pub limit: Option<usize>,
    pub concurrency: Option<usize>,
}

enum TaskOutcome {
    Added(usize),
    /// Cancelled before the task started; counts toward progress only.
    Skipped,
    Failed(String),
}

pub struct JobManager {
    store: Arc<dyn JobStore>,
    registry: Arc<SourceRegistry>,
    executor: Arc<FallbackExecutor>,
    pipeline: Arc<EnrichmentPipeline>,
    posts: Arc<dyn PostStore>,
    notify_tx: mpsc::Sender<Post>,
    max_concurrency: usize,
    default_limit: usize,
}

impl JobManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn JobStore>,
        registry: Arc<SourceRegistry>,
        executor: Arc<FallbackExecutor>,
        pipeline: Arc<EnrichmentPipeline>,
        posts: Arc<dyn PostStore>,
        notify_tx: mpsc::Sender<Post>,
        max_concurrency: usize,
        default_limit: usize,
    ) -> Self {
        Self {
            store,
            registry,
            executor,
            pipeline,
            posts,
            notify_tx,
            max_concurrency: max_concurrency.max(1),
            default_limit: default_limit.max(1),
        }
    }

    /// Validate, register, and start a job. Returns the id right away;
    /// progress is observable through `get_job`.
    pub fn create_job(self: &Arc<Self>, req: NewJob) -> Result<JobId, JobError> {
        let keywords: Vec<String> = req
            .keywords
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            return Err(JobError::InvalidRequest("keywords must not be empty".into()));
        }
        if req.sources.is_empty() {
            return Err(JobError::InvalidRequest("sources must not be empty".into()));
        }
        for source in &req.sources {
            if !self.registry.contains(source) {
                return Err(JobError::InvalidRequest(format!(
                    "unknown source: {source}"
                )));
            }
        }
        let limit = req.limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(JobError::InvalidRequest("limit must be positive".into()));
        }
        let concurrency = req.concurrency.unwrap_or(self.max_concurrency);
        if concurrency == 0 {
            return Err(JobError::InvalidRequest("concurrency must be positive".into()));
        }
        let concurrency = concurrency.min(self.max_concurrency);

        let job = Job::new(keywords, req.sources, limit, concurrency);
        let id = job.id;
        let tasks = job.tasks();
        let cancel = job.cancel.clone();
        self.store.insert(job);
        counter!("jobs_created_total").increment(1);
        info!(job_id = %id, tasks = tasks.len(), "job created");

        let manager = self.clone();
        tokio::spawn(async move {
            manager.run_job(id, tasks, cancel, limit, concurrency).await;
        });
        Ok(id)
    }

    pub fn get_job(&self, id: JobId) -> Result<JobView, JobError> {
        self.store.view(id).ok_or(JobError::NotFound)
    }

    /// Request cancellation. Idempotent; a no-op on terminal jobs.
    pub fn cancel_job(&self, id: JobId) -> Result<JobView, JobError> {
        let updated = self.store.update(id, &mut |job| {
            if !job.status.is_terminal() {
                job.cancel.cancel();
            }
        });
        if !updated {
            return Err(JobError::NotFound);
        }
        self.store.view(id).ok_or(JobError::NotFound)
    }

    /// Cancel every non-terminal job. Returns how many were signalled.
    pub fn cancel_all(&self) -> usize {
        let ids = self.store.active_ids();
        for id in &ids {
            self.store.update(*id, &mut |job| job.cancel.cancel());
        }
        ids.len()
    }

    async fn run_job(
        self: Arc<Self>,
        id: JobId,
        tasks: Vec<Task>,
        cancel: Arc<super::CancelToken>,
        limit: usize,
        concurrency: usize,
    ) {
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut set: JoinSet<(Task, TaskOutcome)> = JoinSet::new();

        for task in tasks {
            let manager = self.clone();
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            set.spawn(async move {
                // Closed only if the semaphore is dropped, which we never do.
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                if cancel.is_cancelled() {
                    return (task, TaskOutcome::Skipped);
                }
                manager.store.update(id, &mut |job| {
                    if job.status == JobStatus::Pending {
                        job.status = JobStatus::Running;
                    }
                });
                let outcome = manager.run_task(&task, limit).await;
                (task, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            self.store.update(id, &mut |job| {
                job.progress.completed += 1;
                match &joined {
                    Ok((task, TaskOutcome::Added(added))) => job.results.push(TaskResult {
                        source: task.source.clone(),
                        keyword: task.keyword.clone(),
                        added: *added,
                    }),
                    Ok((task, TaskOutcome::Failed(message))) => job.errors.push(TaskError {
                        source: task.source.clone(),
                        keyword: task.keyword.clone(),
                        message: message.clone(),
                    }),
                    Ok((_, TaskOutcome::Skipped)) => {}
                    // The task identity is lost when the future panics.
                    Err(join_err) => job.errors.push(TaskError {
                        source: "unknown".into(),
                        keyword: "unknown".into(),
                        message: format!("task aborted: {join_err}"),
                    }),
                }
            });
            counter!("tasks_completed_total").increment(1);
        }

        self.store.update(id, &mut |job| {
            job.finished_at = Some(chrono::Utc::now());
            job.status = if cancel.is_cancelled() {
                JobStatus::Cancelled
            } else if !job.errors.is_empty() && job.results.is_empty() {
                JobStatus::Failed
            } else {
                JobStatus::Completed
            };
        });
        if let Ok(view) = self.get_job(id) {
            info!(
                job_id = %id,
                status = ?view.status,
                results = view.results.len(),
                errors = view.errors.len(),
                "job finished"
            );
        }
    }

    /// Fetch through the fallback chain, enrich, persist. Returns how many
    /// posts were actually inserted.
    async fn run_task(&self, task: &Task, limit: usize) -> TaskOutcome {
        let Some(adapter) = self.registry.get(&task.source) else {
            return TaskOutcome::Failed(format!("source disappeared: {}", task.source));
        };

        let raw = self
            .executor
            .run(&task.keyword, limit, &adapter.strategies)
            .await;
        let enriched = self.pipeline.process(raw);

        let mut added = 0usize;
        for item in &enriched {
            match self.posts.insert(item).await {
                Ok(InsertOutcome::Inserted(post)) => {
                    added += 1;
                    counter!("posts_inserted_total").increment(1);
                    if let Err(err) = self.notify_tx.try_send(post) {
                        warn!(error = %err, "notification queue full, alert dropped");
                    }
                }
                Ok(InsertOutcome::Duplicate) => {
                    counter!("posts_duplicate_total").increment(1);
                }
                Err(err) => {
                    warn!(source = %task.source, error = %err, "post insert failed");
                }
            }
        }
        TaskOutcome::Added(added)
    }
}
