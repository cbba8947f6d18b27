//! HTTP testing utilities

use crate::http::server::build_router;
use crate::http::state::HttpServerState;
use anyhow::Result;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt; // for `oneshot` and `ready`

/// HTTP test client driving the real router without a listener.
pub struct TestApp {
    app: axum::Router,
}

impl TestApp {
    pub fn new(state: HttpServerState) -> Self {
        // Same routes and middleware as production
        let app = build_router(state, 1024 * 1024, Duration::from_secs(30));
        Self { app }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<TestResponse> {
        self.send(Method::POST, path, token, Some(body.to_string()))
            .await
    }

    pub async fn patch_json(
        &self,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Result<TestResponse> {
        self.send(Method::PATCH, path, token, Some(body.to_string()))
            .await
    }

    /// Sends a raw body, for malformed payloads.
    pub async fn post_raw(&self, path: &str, token: Option<&str>, body: &str) -> Result<TestResponse> {
        self.send(Method::POST, path, token, Some(body.to_string()))
            .await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<String>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        Ok(TestResponse::new(response).await)
    }
}

/// Test response wrapper with helper methods
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    async fn new(response: axum::response::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap_or_default()
            .to_vec();
        let body = String::from_utf8_lossy(&body_bytes).to_string();

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Parse response body as JSON
    pub fn json<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// Assert status code
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {}. Body: {}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert response body contains text
    pub fn assert_body_contains(&self, text: &str) -> &Self {
        assert!(
            self.body.contains(text),
            "Expected body to contain '{}', but body was: {}",
            text,
            self.body
        );
        self
    }

    /// Assert a field-scoped validation error on `field`.
    pub fn assert_field_error(&self, field: &str) -> &Self {
        self.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = self.json().unwrap_or(Value::Null);
        assert!(
            body["fields"][field].is_array(),
            "Expected an error on field '{}', but body was: {}",
            field,
            self.body
        );
        self
    }
}
