pub mod job;
pub mod queue;
pub mod retry;
pub mod runner;

pub use job::Job;
pub use queue::{EnqueueError, LocalTaskQueue, TaskQueue, WorkerPool};
pub use retry::RetryPolicy;
pub use runner::JobRunner;
