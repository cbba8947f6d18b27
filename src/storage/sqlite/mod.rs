pub mod sqlite;
pub mod sqlite_transaction;
pub mod sqlite_utilities;

pub use sqlite::SqliteStorage;
