use super::app_error::{AppError, ErrorBody};
use super::health::{__path_liveness, __path_readiness, liveness, readiness};
use super::metrics::{
    __path_create_metric, __path_get_metric, __path_list_metrics, __path_update_metric,
    create_metric, get_metric, list_metrics, update_metric,
};
use super::records::{
    __path_create_record, __path_get_record, __path_list_records, create_record, get_record,
    list_records,
};
use super::state::HttpServerState;
use super::tags::{__path_create_tag, __path_list_tags, create_tag, list_tags};
use crate::config;
use anyhow::Result;
use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::extract::State;
use axum::http::header;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace;
use tower_http::{ServiceBuilderExt, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{Level, error, info};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_scalar::{Scalar, Servable as ScalarServable};

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = "MetricHub", description = "MetricHub API"),
        (name = "Metrics", description = "User owned metrics"),
        (name = "Records", description = "Timestamped values of a metric"),
        (name = "Tags", description = "Labels attached to records"),
        (name = "Health", description = "Liveness and readiness probes"),
    ),
    paths(frontpage,
        list_metrics, create_metric, get_metric, update_metric,
        list_records, create_record, get_record,
        list_tags, create_tag,
        liveness, readiness),
    components(schemas(ErrorBody)),
    modifiers(&BearerSecurity),
)]
struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Routes and middleware of the API, without a listener.
pub fn build_router(state: HttpServerState, body_limit: usize, timeout: Duration) -> Router {
    // List of headers that shouldn't be logged
    let sensitive_headers: Arc<[_]> = vec![header::AUTHORIZATION, header::COOKIE].into();

    let middleware = ServiceBuilder::new()
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .sensitive_response_headers(sensitive_headers)
        .layer(TimeoutLayer::new(timeout))
        .compression()
        .into_inner();

    Router::new()
        .route("/", get(frontpage))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route("/metrics/", get(list_metrics).post(create_metric))
        .route("/metrics/{metric_id}/", get(get_metric).patch(update_metric))
        .route(
            "/metrics/{metric_id}/records/",
            get(list_records).post(create_record),
        )
        .route(
            "/metrics/{metric_id}/records/{record_id}/",
            get(get_record),
        )
        .route("/tags/", get(list_tags).post(create_tag))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware)
        .with_state(state)
}

pub async fn run_http_server(state: HttpServerState, address: SocketAddr) -> Result<()> {
    let config = config::get()?;
    let app = build_router(
        state,
        config.parse_http_body_limit()?,
        Duration::from_secs(config.http_server_timeout_seconds),
    );

    let listener = tokio::net::TcpListener::bind(address).await?;
    info!("Listening on http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    // Wait for the CTRL+C signal
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Failed to install CTRL+C signal handler: {}", err),
    }
}

#[utoipa::path(
    get,
    path = "/",
    tag = "MetricHub",
    responses(
        (status = 200, description = "MetricHub Frontpage", body = String)
    )
)]
async fn frontpage(State(state): State<HttpServerState>) -> Result<Json<String>, AppError> {
    let name: String = (*state.name).clone();
    Ok(Json(name))
}
