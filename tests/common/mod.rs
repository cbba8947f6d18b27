#![allow(dead_code)] // Each test binary uses a different subset

use anyhow::{Context, Result};
use axum::http::StatusCode;
use metrichub::datamodel::timestamp::unix_now;
use metrichub::test_utils::TestApp;
use serde_json::{Value, json};
use std::future::Future;
use std::time::Duration;

/// A timestamp `seconds_ago` seconds in the past, always inside the accepted window.
pub fn recent_timestamp(seconds_ago: i64) -> i64 {
    unix_now() - seconds_ago
}

pub fn record_payload(value: &str, timestamp: i64, tags: &[i64]) -> Value {
    json!({ "value": value, "timestamp": timestamp, "tags": tags })
}

/// Creates a metric through the API and returns its id.
pub async fn create_metric(app: &TestApp, token: &str, name: &str) -> Result<i64> {
    let response = app
        .post_json("/metrics/", Some(token), &json!({ "name": name }))
        .await?;
    response.assert_status(StatusCode::CREATED);
    let metric: Value = response.json()?;
    metric["id"].as_i64().context("Metric id missing")
}

pub async fn create_tag(app: &TestApp, token: &str, name: &str) -> Result<i64> {
    let response = app
        .post_json("/tags/", Some(token), &json!({ "name": name }))
        .await?;
    response.assert_status(StatusCode::CREATED);
    let tag: Value = response.json()?;
    tag["id"].as_i64().context("Tag id missing")
}

/// Polls `check` until it returns true or five seconds have passed.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
