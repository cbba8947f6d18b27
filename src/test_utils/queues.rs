use crate::tasks::{EnqueueError, Job, TaskQueue};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Accepts every job and keeps it. Nothing is executed.
#[derive(Debug, Default)]
pub struct RecordingTaskQueue {
    jobs: Mutex<Vec<Job>>,
}

impl RecordingTaskQueue {
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().map(|jobs| jobs.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TaskQueue for RecordingTaskQueue {
    async fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        self.jobs
            .lock()
            .map_err(|e| EnqueueError::Unavailable(e.to_string()))?
            .push(job);
        Ok(())
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Refuses every job, like a queue whose broker is down.
#[derive(Debug, Default)]
pub struct FailingTaskQueue {
    attempts: AtomicUsize,
}

impl FailingTaskQueue {
    /// Number of enqueue calls so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaskQueue for FailingTaskQueue {
    async fn enqueue(&self, _job: Job) -> Result<(), EnqueueError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(EnqueueError::Unavailable("broker unreachable".to_string()))
    }

    fn is_available(&self) -> bool {
        false
    }
}
