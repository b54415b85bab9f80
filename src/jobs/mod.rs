// src/jobs/mod.rs
//! Scrape job domain types. A job fans out to one task per
//! (keyword, source) pair; progress, results, and errors accumulate on the
//! job record and a snapshot (`JobView`) is what the API serves.

pub mod manager;
pub mod store;

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub type JobId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
}

/// One (keyword, source) unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub keyword: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub source: String,
    pub keyword: String,
    /// Posts actually persisted (gated and duplicate items excluded).
    pub added: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskError {
    pub source: String,
    pub keyword: String,
    pub message: String,
}

/// Cooperative cancellation flag shared between the supervisor and its
/// tasks. Set-once; tasks check it before starting work.
#[derive(Debug, Default)]
pub struct CancelToken {
    flag: AtomicBool,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct Job {
    pub id: JobId,
    pub keywords: Vec<String>,
    pub sources: Vec<String>,
    pub limit: usize,
    pub concurrency: usize,
    pub status: JobStatus,
    pub progress: Progress,
    pub results: Vec<TaskResult>,
    pub errors: Vec<TaskError>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancel: std::sync::Arc<CancelToken>,
}

impl Job {
    pub fn new(keywords: Vec<String>, sources: Vec<String>, limit: usize, concurrency: usize) -> Self {
        let total = keywords.len() * sources.len();
        Self {
            id: Uuid::new_v4(),
            keywords,
            sources,
            limit,
            concurrency,
            status: JobStatus::Pending,
            progress: Progress { total, completed: 0 },
            results: Vec::new(),
            errors: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
            cancel: std::sync::Arc::new(CancelToken::new()),
        }
    }

    /// Cross product in stable order: keywords outer, sources inner.
    pub fn tasks(&self) -> Vec<Task> {
        let mut out = Vec::with_capacity(self.progress.total);
        for keyword in &self.keywords {
            for source in &self.sources {
                out.push(Task {
                    keyword: keyword.clone(),
                    source: source.clone(),
                });
            }
        }
        out
    }

    /// Serializable snapshot for the API.
    pub fn view(&self) -> JobView {
        JobView {
            id: self.id,
            keywords: self.keywords.clone(),
            sources: self.sources.clone(),
            status: self.status,
            progress: self.progress,
            results: self.results.clone(),
            errors: self.errors.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub keywords: Vec<String>,
    pub sources: Vec<String>,
    pub status: JobStatus,
    pub progress: Progress,
    pub results: Vec<TaskResult>,
    pub errors: Vec<TaskError>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tasks_are_the_keyword_source_cross_product() {
        let job = Job::new(
            vec!["acme".into(), "acmecloud".into()],
            vec!["reddit".into(), "github".into(), "hackernews".into()],
            25,
            4,
        );
        assert_eq!(job.progress.total, 6);
        let tasks = job.tasks();
        assert_eq!(tasks.len(), 6);
        assert_eq!(tasks[0], Task { keyword: "acme".into(), source: "reddit".into() });
        assert_eq!(tasks[5], Task { keyword: "acmecloud".into(), source: "hackernews".into() });
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
    }

    #[test]
    fn cancel_token_is_sticky() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }
}
