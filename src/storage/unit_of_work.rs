use super::StorageError;
use crate::datamodel::{Metric, MetricId, UserId};
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;

/// Metric writes that take part in a unit of work.
#[async_trait]
pub trait MetricTransaction: Send {
    /// Reads the stored row, bypassing anything the caller holds in memory.
    async fn stored_metric(
        &mut self,
        metric_id: MetricId,
        owner_id: UserId,
    ) -> Result<Option<Metric>, StorageError>;

    async fn update_metric(&mut self, metric: &Metric) -> Result<Metric, StorageError>;

    async fn commit(self: Box<Self>) -> Result<(), StorageError>;
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

pub type CommitHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// A database transaction with a queue of callbacks flushed after a successful commit.
///
/// Hooks never run inside the transaction. They are discarded on rollback,
/// on a failed commit, and when the unit of work is dropped uncommitted.
pub struct UnitOfWork {
    transaction: Box<dyn MetricTransaction>,
    hooks: Vec<CommitHook>,
}

impl UnitOfWork {
    pub fn new(transaction: Box<dyn MetricTransaction>) -> Self {
        Self {
            transaction,
            hooks: Vec::new(),
        }
    }

    pub fn transaction(&mut self) -> &mut (dyn MetricTransaction + 'static) {
        self.transaction.as_mut()
    }

    /// Registers a callback to run after this transaction commits.
    pub fn on_commit<F, Fut>(&mut self, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.hooks.push(Box::new(move || hook().boxed()));
    }

    /// Commits, then runs the registered hooks in registration order.
    pub async fn commit(self) -> Result<(), StorageError> {
        let UnitOfWork { transaction, hooks } = self;
        transaction.commit().await?;
        for hook in hooks {
            hook().await;
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), StorageError> {
        let UnitOfWork { transaction, hooks } = self;
        drop(hooks);
        transaction.rollback().await
    }
}

impl fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("pending_hooks", &self.hooks.len())
            .finish()
    }
}
