use crate::broadcast::{JobProgressBroadcaster, JobProgressEvent};
use crate::job::Job;

/// Receives a snapshot after every stage change.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, job: &Job);
}

impl ProgressReporter for JobProgressBroadcaster {
    fn report(&self, job: &Job) {
        self.send(JobProgressEvent::from_job(job));
    }
}
