pub mod error;
pub mod sqlite;
pub mod storage;
pub mod storage_factory;
pub mod unit_of_work;

pub use error::StorageError;
pub use storage::{RecordDraft, StorageInstance};
pub use unit_of_work::{MetricTransaction, UnitOfWork};
