//! Test utilities for MetricHub tests
//!
//! In-memory stores, task queue fakes and a context that wires the services
//! the same way the binary does.

use crate::cache::MemoryCache;
use crate::datamodel::UserId;
use crate::http::auth::StaticTokenAuthenticator;
use crate::http::state::HttpServerState;
use crate::services::{IngestionService, ListingService, MetricService, RenamePropagator};
use crate::storage::StorageInstance;
use crate::tasks::TaskQueue;
use std::sync::Arc;
use std::time::Duration;

pub mod db;
pub mod http;
pub mod queues;

pub use db::{file_storage, memory_storage, seed_metric};
pub use http::{TestApp, TestResponse};
pub use queues::{FailingTaskQueue, RecordingTaskQueue};

pub const ALICE: UserId = 1;
pub const ALICE_TOKEN: &str = "alice-token";
pub const BOB: UserId = 2;
pub const BOB_TOKEN: &str = "bob-token";

/// Services wired on top of an in-memory store, with two known users.
#[derive(Debug, Clone)]
pub struct TestContext {
    pub storage: Arc<dyn StorageInstance>,
    pub cache: Arc<MemoryCache>,
    pub queue: Arc<dyn TaskQueue>,
}

impl TestContext {
    /// Context whose queue records jobs without running them.
    pub async fn new() -> Self {
        Self::with_queue(Arc::new(RecordingTaskQueue::default())).await
    }

    pub async fn with_queue(queue: Arc<dyn TaskQueue>) -> Self {
        Self::from_parts(memory_storage().await, queue)
    }

    pub fn from_parts(storage: Arc<dyn StorageInstance>, queue: Arc<dyn TaskQueue>) -> Self {
        Self {
            storage,
            cache: Arc::new(MemoryCache::new(1024)),
            queue,
        }
    }

    pub fn state(&self) -> HttpServerState {
        let propagator = RenamePropagator::new(self.queue.clone(), self.storage.clone());
        HttpServerState {
            name: Arc::new("MetricHub".to_string()),
            storage: self.storage.clone(),
            queue: self.queue.clone(),
            authenticator: Arc::new(StaticTokenAuthenticator::new([
                (ALICE_TOKEN, ALICE),
                (BOB_TOKEN, BOB),
            ])),
            ingestion: IngestionService::new(self.storage.clone(), self.cache.clone()),
            listing: ListingService::new(
                self.storage.clone(),
                self.cache.clone(),
                Duration::from_secs(300),
            ),
            metrics: MetricService::new(self.storage.clone(), propagator),
        }
    }

    pub fn app(&self) -> TestApp {
        TestApp::new(self.state())
    }
}
