use super::auth::Authenticator;
use crate::services::{IngestionService, ListingService, MetricService};
use crate::storage::StorageInstance;
use crate::tasks::TaskQueue;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    pub storage: Arc<dyn StorageInstance>,
    pub queue: Arc<dyn TaskQueue>,
    pub authenticator: Arc<dyn Authenticator>,
    pub ingestion: IngestionService,
    pub listing: ListingService,
    pub metrics: MetricService,
}
