#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use metrichub::cache::MemoryCache;
use metrichub::config::{self, load_configuration};
use metrichub::http::auth::StaticTokenAuthenticator;
use metrichub::http::server::run_http_server;
use metrichub::http::state::HttpServerState;
use metrichub::services::{IngestionService, ListingService, MetricService, RenamePropagator};
use metrichub::storage::storage_factory::create_storage_from_connection_string;
use metrichub::tasks::{JobRunner, LocalTaskQueue, RetryPolicy, TaskQueue};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, event, info, warn};

/// Time given to the task workers to finish queued jobs on shutdown.
const WORKER_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize tracing subscriber for HTTP request logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    load_configuration().context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    // Initialize storage backend
    info!("Connecting to storage: {}", config.storage_connection_string);
    let storage = create_storage_from_connection_string(&config.storage_connection_string)
        .await
        .context("Failed to create storage backend")?;

    // Initialize database schema
    storage
        .create_or_migrate()
        .await
        .context("Failed to create or migrate database schema")?;
    info!("Storage backend initialized successfully");

    let cache = Arc::new(MemoryCache::new(config.cache_capacity));

    let runner = Arc::new(JobRunner::new(
        storage.clone(),
        RetryPolicy::from_config(&config),
    ));
    let (queue, workers) = LocalTaskQueue::start(
        runner,
        config.task_queue_capacity,
        config.task_workers,
    );
    let queue: Arc<dyn TaskQueue> = Arc::new(queue);
    info!("Started {} task workers", workers.size());

    let authenticator = StaticTokenAuthenticator::from_config(&config)
        .context("Failed to parse METRICHUB_API_TOKENS")?;
    if authenticator.is_empty() {
        warn!("No API tokens configured, every authenticated endpoint will answer 401");
    }

    let state = HttpServerState {
        name: Arc::new("MetricHub".to_string()),
        storage: storage.clone(),
        queue: queue.clone(),
        authenticator: Arc::new(authenticator),
        ingestion: IngestionService::new(storage.clone(), cache.clone()),
        listing: ListingService::new(storage.clone(), cache, config.records_cache_ttl()),
        metrics: MetricService::new(
            storage.clone(),
            RenamePropagator::new(queue.clone(), storage),
        ),
    };
    // The state holds the remaining queue handles, workers stop once it is dropped
    drop(queue);

    let address = SocketAddr::from((config.endpoint, config.port));

    let result = run_http_server(state, address).await;
    workers.shutdown(WORKER_SHUTDOWN_GRACE).await;

    match result {
        Ok(_) => {
            event!(Level::INFO, "HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            event!(Level::ERROR, "HTTP server failed: {}", err);
            sentry::integrations::anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
}
