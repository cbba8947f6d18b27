use super::job::Job;
use super::runner::JobRunner;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Failure to hand a job over to the queue.
///
/// Distinct from the job failing later on a worker.
#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("Task queue is full, cannot enqueue {job}")]
    QueueFull { job: &'static str },

    #[error("Task queue is closed")]
    Closed,

    #[error("Task queue is unavailable: {0}")]
    Unavailable(String),
}

/// At-least-once, possibly delayed execution of jobs.
#[async_trait]
pub trait TaskQueue: Send + Sync + Debug {
    async fn enqueue(&self, job: Job) -> Result<(), EnqueueError>;

    /// Whether new jobs are currently accepted.
    fn is_available(&self) -> bool;
}

/// In-process queue: a bounded channel drained by a pool of tokio workers.
#[derive(Debug, Clone)]
pub struct LocalTaskQueue {
    sender: mpsc::Sender<Job>,
}

impl LocalTaskQueue {
    /// Creates the queue and spawns `workers` tasks that run jobs through `runner`.
    pub fn start(runner: Arc<JobRunner>, capacity: usize, workers: usize) -> (Self, WorkerPool) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = receiver.clone();
                let runner = runner.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, receiver, runner).await;
                })
            })
            .collect();

        (Self { sender }, WorkerPool { handles })
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    runner: Arc<JobRunner>,
) {
    debug!("Task worker {} started", worker_id);
    loop {
        // Only the receive is done under the lock, jobs run concurrently
        let job = { receiver.lock().await.recv().await };
        let Some(job) = job else {
            break;
        };
        // The runner already logged the final failure, dead letters are not kept
        let _ = runner.run(job).await;
    }
    debug!("Task worker {} stopped", worker_id);
}

#[async_trait]
impl TaskQueue for LocalTaskQueue {
    async fn enqueue(&self, job: Job) -> Result<(), EnqueueError> {
        let name = job.name();
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => EnqueueError::QueueFull { job: name },
            mpsc::error::TrySendError::Closed(_) => EnqueueError::Closed,
        })?;
        debug!("Enqueued {} job", name);
        Ok(())
    }

    fn is_available(&self) -> bool {
        !self.sender.is_closed() && self.sender.capacity() > 0
    }
}

/// Handles of the workers started with a [`LocalTaskQueue`].
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Waits for the workers to drain the queue.
    ///
    /// Workers stop once every queue handle is dropped. Whatever is still
    /// running after `grace` is aborted.
    pub async fn shutdown(self, grace: Duration) {
        let WorkerPool { handles } = self;
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        let drained = tokio::time::timeout(grace, futures::future::join_all(handles)).await;
        match drained {
            Ok(_) => info!("Task workers stopped"),
            Err(_) => {
                warn!("Task workers did not stop within {:?}, aborting", grace);
                for handle in abort_handles {
                    handle.abort();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::NewMetric;
    use crate::storage::sqlite::SqliteStorage;
    use crate::storage::{RecordDraft, StorageInstance};
    use crate::tasks::retry::RetryPolicy;
    use rust_decimal::Decimal;

    async fn storage() -> Arc<dyn StorageInstance> {
        let storage: Arc<dyn StorageInstance> =
            Arc::new(SqliteStorage::connect("sqlite::memory:").await.unwrap());
        storage.create_or_migrate().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_enqueued_job_is_executed() {
        let storage = storage().await;
        let metric = storage
            .create_metric(
                1,
                &NewMetric {
                    name: "before".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let draft = RecordDraft {
            value: Decimal::from(5),
            timestamp: 1_704_067_200,
            tag_ids: vec![],
        };
        storage.create_record(&metric, &draft).await.unwrap();

        let runner = Arc::new(JobRunner::new(storage.clone(), RetryPolicy::default()));
        let (queue, pool) = LocalTaskQueue::start(runner, 8, 2);
        assert_eq!(pool.size(), 2);
        assert!(queue.is_available());

        queue
            .enqueue(Job::RenameRecords {
                metric_id: metric.id,
                new_name: "after".to_string(),
                version: 1,
            })
            .await
            .unwrap();

        // Dropping the last sender lets the workers drain and stop
        drop(queue);
        pool.shutdown(Duration::from_secs(5)).await;

        let records = storage.list_records(metric.id, 1).await.unwrap();
        assert_eq!(records[0].metric_name.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_enqueue_fails_when_closed() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let queue = LocalTaskQueue { sender };

        let err = queue
            .enqueue(Job::RenameRecords {
                metric_id: 1,
                new_name: "x".to_string(),
                version: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EnqueueError::Closed));
        assert!(!queue.is_available());
    }

    #[tokio::test]
    async fn test_enqueue_fails_when_full() {
        let (sender, _receiver) = mpsc::channel(1);
        let queue = LocalTaskQueue { sender };
        let job = Job::RenameRecords {
            metric_id: 1,
            new_name: "x".to_string(),
            version: 1,
        };

        queue.enqueue(job.clone()).await.unwrap();
        let err = queue.enqueue(job).await.unwrap_err();
        assert!(matches!(
            err,
            EnqueueError::QueueFull {
                job: "rename_records"
            }
        ));
    }
}
