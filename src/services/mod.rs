pub mod error;
pub mod ingestion;
pub mod listing;
pub mod metrics;
pub mod rename;

pub use error::ServiceError;
pub use ingestion::IngestionService;
pub use listing::ListingService;
pub use metrics::MetricService;
pub use rename::{PropagationOutcome, RenameChange, RenamePropagator};
