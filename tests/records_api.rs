mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{create_metric, create_tag, recent_timestamp, record_payload};
use metrichub::cache::metric_records_cache_key;
use futures::future::join_all;
use metrichub::test_utils::{
    ALICE, ALICE_TOKEN, BOB_TOKEN, RecordingTaskQueue, TestContext, file_storage,
};
use std::sync::Arc;
use serde_json::{Value, json};

mod record_creation_tests {
    use super::*;

    #[tokio::test]
    async fn test_record_is_stamped_with_metric_name() -> Result<()> {
        // Given: A metric owned by Alice
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let timestamp = recent_timestamp(60);

        // When: Alice posts a record
        let response = app
            .post_json(
                &format!("/metrics/{}/records/", metric_id),
                Some(ALICE_TOKEN),
                &record_payload("21.5", timestamp, &[]),
            )
            .await?;

        // Then: The record carries the metric name and a 4 decimal value
        response.assert_status(StatusCode::CREATED);
        let record: Value = response.json()?;
        assert_eq!(record["metric"], json!(metric_id));
        assert_eq!(record["metric_name"], "temperature");
        assert_eq!(record["value"], "21.5000");
        assert_eq!(record["timestamp"], json!(timestamp));
        assert_eq!(record["tags"], json!([]));

        // And: It can be fetched on its own
        let response = app
            .get(
                &format!("/metrics/{}/records/{}/", metric_id, record["id"]),
                Some(ALICE_TOKEN),
            )
            .await?;
        response.assert_status(StatusCode::OK);
        assert_eq!(response.json::<Value>()?, record);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_timestamp_is_a_field_error() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);
        let timestamp = recent_timestamp(60);

        app.post_json(&path, Some(ALICE_TOKEN), &record_payload("1", timestamp, &[]))
            .await?
            .assert_status(StatusCode::CREATED);

        let response = app
            .post_json(&path, Some(ALICE_TOKEN), &record_payload("2", timestamp, &[]))
            .await?;
        response.assert_field_error("timestamp");

        let records: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(records.as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_duplicates_one_wins() -> Result<()> {
        // Given: Two submissions racing for the same second
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);
        let timestamp = recent_timestamp(60);
        let first = record_payload("1", timestamp, &[]);
        let second = record_payload("2", timestamp, &[]);

        // When: Both are sent concurrently
        let (a, b) = tokio::join!(
            app.post_json(&path, Some(ALICE_TOKEN), &first),
            app.post_json(&path, Some(ALICE_TOKEN), &second),
        );

        // Then: Exactly one is created, the other gets a timestamp error
        let mut statuses = vec![a?.status(), b?.status()];
        statuses.sort();
        assert_eq!(statuses, vec![StatusCode::CREATED, StatusCode::BAD_REQUEST]);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tagged_duplicates_on_file_database() -> Result<()> {
        // Given: A file database, so requests run on separate connections
        let dir = tempfile::tempdir()?;
        let storage = file_storage(&dir.path().join("metrichub.db")).await;
        let context = TestContext::from_parts(storage, Arc::new(RecordingTaskQueue::default()));
        let app = context.app();
        let tag = create_tag(&app, ALICE_TOKEN, "indoor").await?;

        for round in 0..5 {
            let metric_id = create_metric(&app, ALICE_TOKEN, &format!("temperature-{}", round)).await?;
            let path = format!("/metrics/{}/records/", metric_id);
            let timestamp = recent_timestamp(60);
            let payloads: Vec<Value> = (1..=4)
                .map(|i| record_payload(&i.to_string(), timestamp, &[tag]))
                .collect();

            // When: Four tagged submissions for the same second race
            let responses = join_all(
                payloads
                    .iter()
                    .map(|payload| app.post_json(&path, Some(ALICE_TOKEN), payload)),
            )
            .await;

            // Then: One is created, every other one is a timestamp error
            let mut created = 0;
            for response in responses {
                let response = response?;
                if response.status() == StatusCode::CREATED {
                    created += 1;
                } else {
                    response.assert_field_error("timestamp");
                }
            }
            assert_eq!(created, 1, "round {}", round);

            let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
            assert_eq!(listing.as_array().map(Vec::len), Some(1));
            assert_eq!(listing[0]["tags"], json!([tag]));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_timestamp_window() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);

        for timestamp in [0, -5, 1_500_000_000, recent_timestamp(-3600)] {
            let response = app
                .post_json(&path, Some(ALICE_TOKEN), &record_payload("1", timestamp, &[]))
                .await?;
            response.assert_field_error("timestamp");
        }

        // 2020-01-01T00:00:00Z is the first accepted second
        app.post_json(
            &path,
            Some(ALICE_TOKEN),
            &record_payload("1", 1_577_836_800, &[]),
        )
        .await?
        .assert_status(StatusCode::CREATED);
        Ok(())
    }

    #[tokio::test]
    async fn test_value_precision() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);

        app.post_json(
            &path,
            Some(ALICE_TOKEN),
            &record_payload("1.23456", recent_timestamp(10), &[]),
        )
        .await?
        .assert_field_error("value");

        app.post_json(
            &path,
            Some(ALICE_TOKEN),
            &record_payload("1234567890123.5", recent_timestamp(20), &[]),
        )
        .await?
        .assert_field_error("value");

        let response = app
            .post_json(
                &path,
                Some(ALICE_TOKEN),
                &record_payload("-123456789012.1234", recent_timestamp(30), &[]),
            )
            .await?;
        response.assert_status(StatusCode::CREATED);
        assert_eq!(response.json::<Value>()?["value"], "-123456789012.1234");
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_payload_is_bad_request() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);

        app.post_raw(&path, Some(ALICE_TOKEN), "{not json")
            .await?
            .assert_status(StatusCode::BAD_REQUEST);
        app.post_json(&path, Some(ALICE_TOKEN), &json!({ "value": "1" }))
            .await?
            .assert_status(StatusCode::BAD_REQUEST);
        Ok(())
    }
}

mod ownership_tests {
    use super::*;

    #[tokio::test]
    async fn test_foreign_metric_is_not_found() -> Result<()> {
        // Given: A metric owned by Alice with one record
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);
        let record: Value = app
            .post_json(&path, Some(ALICE_TOKEN), &record_payload("1", recent_timestamp(60), &[]))
            .await?
            .json()?;

        // When/Then: Bob cannot write to it, and gets the same answer as for a missing metric
        let response = app
            .post_json(&path, Some(BOB_TOKEN), &record_payload("2", recent_timestamp(30), &[]))
            .await?;
        response.assert_status(StatusCode::NOT_FOUND);
        assert_eq!(response.json::<Value>()?, json!({ "error": "Not found." }));

        app.post_json(
            "/metrics/999999/records/",
            Some(BOB_TOKEN),
            &record_payload("2", recent_timestamp(30), &[]),
        )
        .await?
        .assert_status(StatusCode::NOT_FOUND);

        // And: Bob sees an empty listing and cannot fetch the record
        let listing: Value = app.get(&path, Some(BOB_TOKEN)).await?.json()?;
        assert_eq!(listing, json!([]));
        app.get(
            &format!("{}{}/", path, record["id"]),
            Some(BOB_TOKEN),
        )
        .await?
        .assert_status(StatusCode::NOT_FOUND);

        // And: Alice still has exactly her record
        let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(listing.as_array().map(Vec::len), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn test_non_numeric_ids_are_not_found() -> Result<()> {
        let app = TestContext::new().await.app();

        app.get("/metrics/abc/records/", Some(ALICE_TOKEN))
            .await?
            .assert_status(StatusCode::NOT_FOUND);
        Ok(())
    }
}

mod tag_tests {
    use super::*;

    #[tokio::test]
    async fn test_tags_round_trip() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let a = create_tag(&app, ALICE_TOKEN, "a").await?;
        let b = create_tag(&app, ALICE_TOKEN, "b").await?;
        let path = format!("/metrics/{}/records/", metric_id);

        let response = app
            .post_json(
                &path,
                Some(ALICE_TOKEN),
                &record_payload("1", recent_timestamp(60), &[b, a, a]),
            )
            .await?;
        response.assert_status(StatusCode::CREATED);
        let record: Value = response.json()?;

        let fetched: Value = app
            .get(&format!("{}{}/", path, record["id"]), Some(ALICE_TOKEN))
            .await?
            .json()?;
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(fetched["tags"], json!(expected));
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_tag_creates_nothing() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let tag = create_tag(&app, ALICE_TOKEN, "a").await?;
        let path = format!("/metrics/{}/records/", metric_id);

        app.post_json(
            &path,
            Some(ALICE_TOKEN),
            &record_payload("1", recent_timestamp(60), &[tag, tag + 1000]),
        )
        .await?
        .assert_field_error("tags");

        let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(listing, json!([]));
        Ok(())
    }
}

mod cache_tests {
    use super::*;

    #[tokio::test]
    async fn test_listing_is_cached_and_invalidated() -> Result<()> {
        // Given: Alice's listing has been read once
        let context = TestContext::new().await;
        let app = context.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);
        let key = metric_records_cache_key(metric_id, ALICE);

        let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(listing, json!([]));
        assert!(context.cache.contains_key(&key));

        // When: A record is created
        app.post_json(&path, Some(ALICE_TOKEN), &record_payload("1", recent_timestamp(60), &[]))
            .await?
            .assert_status(StatusCode::CREATED);

        // Then: The cached listing is gone, and the next read sees the record
        assert!(!context.cache.contains_key(&key));
        let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(listing.as_array().map(Vec::len), Some(1));
        assert!(context.cache.contains_key(&key));
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() -> Result<()> {
        let app = TestContext::new().await.app();
        let metric_id = create_metric(&app, ALICE_TOKEN, "temperature").await?;
        let path = format!("/metrics/{}/records/", metric_id);
        let older = recent_timestamp(120);
        let newer = recent_timestamp(60);

        for timestamp in [older, newer] {
            app.post_json(&path, Some(ALICE_TOKEN), &record_payload("1", timestamp, &[]))
                .await?
                .assert_status(StatusCode::CREATED);
        }

        let listing: Value = app.get(&path, Some(ALICE_TOKEN)).await?.json()?;
        assert_eq!(listing[0]["timestamp"], json!(newer));
        assert_eq!(listing[1]["timestamp"], json!(older));
        Ok(())
    }
}
