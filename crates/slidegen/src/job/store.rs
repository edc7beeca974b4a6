//! In-memory job store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::Serialize;

use super::model::{Job, JobId, JobStatus};
use crate::error::{Result, SlidegenError};

/// Number of jobs in each status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobCounts {
    pub total: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub by_status: HashMap<JobStatus, usize>,
}

/// Process-wide job table.
///
/// The outer map lock is only held to look up or insert a job handle. Each
/// job has its own mutex, so updates to different jobs never contend and
/// updates to the same job are serialized. Jobs are never evicted.
pub struct JobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    fn read_jobs(&self) -> RwLockReadGuard<'_, HashMap<JobId, Arc<Mutex<Job>>>> {
        match self.jobs.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_jobs(&self) -> RwLockWriteGuard<'_, HashMap<JobId, Arc<Mutex<Job>>>> {
        match self.jobs.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn lock_job(handle: &Mutex<Job>) -> MutexGuard<'_, Job> {
        match handle.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Job lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn handle(&self, id: &JobId) -> Result<Arc<Mutex<Job>>> {
        self.read_jobs()
            .get(id)
            .cloned()
            .ok_or_else(|| SlidegenError::NotFound(id.to_string()))
    }

    /// Inserts a freshly created job. Identifiers are never reused, so an
    /// existing entry is left untouched and reported as an error.
    pub fn create(&self, job: Job) -> Result<JobId> {
        let id = job.id.clone();
        match self.write_jobs().entry(id.clone()) {
            Entry::Occupied(_) => Err(SlidegenError::AlreadyExists(id)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Mutex::new(job)));
                Ok(id)
            }
        }
    }

    /// Returns a snapshot of the job.
    pub fn get(&self, id: &JobId) -> Result<Job> {
        let handle = self.handle(id)?;
        let job = Self::lock_job(&handle);
        Ok(job.clone())
    }

    /// Applies `mutator` while holding the job's lock.
    ///
    /// Status changes must go through [`JobStore::transition`]; this is for
    /// field-level updates that do not move the job between stages.
    pub fn update<T, F>(&self, id: &JobId, mutator: F) -> Result<T>
    where
        F: FnOnce(&mut Job) -> T,
    {
        let handle = self.handle(id)?;
        let mut job = Self::lock_job(&handle);
        let previous = job.status;
        let out = mutator(&mut job);
        debug_assert_eq!(previous, job.status, "status changed outside transition()");
        job.updated_at = Utc::now();
        Ok(out)
    }

    /// Moves a job to `target` if its current status is one of `expected`
    /// and the edge is legal, then applies `mutator` under the same lock.
    ///
    /// Fails with `InvalidState` without touching the job otherwise. Returns
    /// the updated snapshot.
    pub fn transition<F>(
        &self,
        id: &JobId,
        operation: &'static str,
        expected: &[JobStatus],
        target: JobStatus,
        mutator: F,
    ) -> Result<Job>
    where
        F: FnOnce(&mut Job),
    {
        let handle = self.handle(id)?;
        let mut job = Self::lock_job(&handle);

        if !expected.contains(&job.status) || !job.status.can_transition_to(target) {
            return Err(SlidegenError::InvalidState {
                job_id: id.clone(),
                operation,
                status: job.status,
            });
        }

        job.status = target;
        if let Some(progress) = target.progress() {
            job.progress = job.progress.max(progress);
        }
        mutator(&mut job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    /// Returns snapshots of all jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let handles: Vec<Arc<Mutex<Job>>> = self.read_jobs().values().cloned().collect();
        let mut jobs: Vec<Job> = handles.iter().map(|h| Self::lock_job(h).clone()).collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for job in self.list() {
            counts.total += 1;
            if job.status.is_in_progress() {
                counts.in_progress += 1;
            }
            match job.status {
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Error => counts.failed += 1,
                _ => {}
            }
            *counts.by_status.entry(job.status).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.read_jobs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}
