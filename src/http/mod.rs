pub mod app_error;
pub mod auth;
pub mod health;
pub mod metrics;
pub mod records;
pub mod server;
pub mod state;
pub mod tags;
pub mod utils;
