// src/jobs/store.rs
//! Job registry. Object-safe so the manager can hold `Arc<dyn JobStore>`
//! and tests can swap in instrumented stores; mutation goes through
//! `update` so every read-modify-write on a job happens under one lock.

use std::collections::HashMap;
use std::sync::RwLock;

use super::{Job, JobId, JobView};

pub trait JobStore: Send + Sync {
    fn insert(&self, job: Job);

    fn view(&self, id: JobId) -> Option<JobView>;

    /// Apply `f` to the job under the store lock. Returns false when the
    /// id is unknown.
    fn update(&self, id: JobId, f: &mut dyn FnMut(&mut Job)) -> bool;

    /// Ids of jobs not yet in a terminal status.
    fn active_ids(&self) -> Vec<JobId>;
}

#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobStore for InMemoryJobStore {
    fn insert(&self, job: Job) {
        self.jobs
            .write()
            .expect("job store lock poisoned")
            .insert(job.id, job);
    }

    fn view(&self, id: JobId) -> Option<JobView> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .get(&id)
            .map(Job::view)
    }

    fn update(&self, id: JobId, f: &mut dyn FnMut(&mut Job)) -> bool {
        let mut jobs = self.jobs.write().expect("job store lock poisoned");
        match jobs.get_mut(&id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    fn active_ids(&self) -> Vec<JobId> {
        self.jobs
            .read()
            .expect("job store lock poisoned")
            .values()
            .filter(|j| !j.status.is_terminal())
            .map(|j| j.id)
            .collect()
    }
}
