use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    sync::{Arc, OnceLock},
    time::Duration,
};

#[derive(Debug, Config)]
pub struct MetricHubConfig {
    #[config(env = "METRICHUB_PORT", default = 3000)]
    pub port: u16,
    #[config(env = "METRICHUB_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "METRICHUB_HTTP_BODY_LIMIT", default = "1mb")]
    pub http_body_limit: String,

    #[config(env = "METRICHUB_HTTP_SERVER_TIMEOUT_SECONDS", default = 30)]
    pub http_server_timeout_seconds: u64,

    #[config(
        env = "METRICHUB_STORAGE_CONNECTION_STRING",
        default = "sqlite://metrichub.db"
    )]
    pub storage_connection_string: String,

    /// Lifetime of a cached record listing.
    #[config(env = "METRICHUB_RECORDS_CACHE_TTL_SECONDS", default = 300)]
    pub records_cache_ttl_seconds: u64,

    #[config(env = "METRICHUB_CACHE_CAPACITY", default = 10000)]
    pub cache_capacity: usize,

    #[config(env = "METRICHUB_TASK_QUEUE_CAPACITY", default = 1024)]
    pub task_queue_capacity: usize,

    #[config(env = "METRICHUB_TASK_WORKERS", default = 2)]
    pub task_workers: usize,

    #[config(env = "METRICHUB_TASK_MAX_ATTEMPTS", default = 5)]
    pub task_max_attempts: u32,

    #[config(env = "METRICHUB_TASK_INITIAL_BACKOFF_MS", default = 500)]
    pub task_initial_backoff_ms: u64,

    #[config(env = "METRICHUB_TASK_MAX_BACKOFF_MS", default = 30000)]
    pub task_max_backoff_ms: u64,

    /// Comma separated `token=user_id` pairs.
    #[config(env = "METRICHUB_API_TOKENS")]
    pub api_tokens: Option<String>,

    #[config(env = "METRICHUB_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl MetricHubConfig {
    pub fn load() -> Result<MetricHubConfig, Error> {
        let c = MetricHubConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 128 * 1024 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 128GB");
        }
        Ok(size as usize)
    }

    pub fn records_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.records_cache_ttl_seconds)
    }
}

pub(crate) static METRICHUB_CONFIG: OnceLock<Arc<MetricHubConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<MetricHubConfig>, Error> {
    METRICHUB_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if METRICHUB_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = MetricHubConfig::load()?;
    METRICHUB_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_config() {
        let config = MetricHubConfig::load().unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.endpoint, IpAddr::from([127, 0, 0, 1]));
        assert_eq!(config.records_cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.task_max_attempts, 5);
        assert!(config.api_tokens.is_none());

        temp_env::with_var("METRICHUB_PORT", Some("8080"), || {
            let config = MetricHubConfig::load().unwrap();
            assert_eq!(config.port, 8080);
        });
    }

    #[test]
    #[serial]
    fn test_parse_http_body_limit() {
        let config = MetricHubConfig::load().unwrap();
        assert_eq!(config.parse_http_body_limit().unwrap(), 1000000);

        temp_env::with_var("METRICHUB_HTTP_BODY_LIMIT", Some("12345"), || {
            let config = MetricHubConfig::load().unwrap();
            assert_eq!(config.parse_http_body_limit().unwrap(), 12345);
        });

        temp_env::with_var("METRICHUB_HTTP_BODY_LIMIT", Some("10MiB"), || {
            let config = MetricHubConfig::load().unwrap();
            assert_eq!(config.parse_http_body_limit().unwrap(), 10485760);
        });

        temp_env::with_var("METRICHUB_HTTP_BODY_LIMIT", Some("1tb"), || {
            let config = MetricHubConfig::load().unwrap();
            assert!(config.parse_http_body_limit().is_err());
        });
    }

    #[test]
    #[serial]
    fn test_cache_ttl_from_env() {
        temp_env::with_var("METRICHUB_RECORDS_CACHE_TTL_SECONDS", Some("42"), || {
            let config = MetricHubConfig::load().unwrap();
            assert_eq!(config.records_cache_ttl(), Duration::from_secs(42));
        });
    }

    #[test]
    #[serial]
    fn test_load_configuration() {
        load_configuration().unwrap();
        assert!(METRICHUB_CONFIG.get().is_some());

        let config = get().unwrap();
        assert_eq!(config.port, 3000);
    }
}
