//! Roster is a small account directory: create, read, update and delete users.

#![forbid(unsafe_code)]
mod crypto;
pub mod database;
pub mod error;
mod router;
pub mod telemetry;
pub mod user;

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

use crate::crypto::PasswordManager;
use crate::user::{PgUserRepository, UserRepository};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State backed by `users`, with cheap hashing and no metrics.
#[cfg(test)]
pub(crate) fn state(users: Arc<dyn UserRepository>) -> AppState {
    AppState {
        config: Arc::new(config::Configuration::default()),
        users,
        crypto: Arc::new(crypto::tests::manager()),
        metrics: None,
    }
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub users: Arc<dyn UserRepository>,
    pub crypto: Arc<PasswordManager>,
    /// Set when Prometheus metrics are exposed.
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, REQUEST_TIMEOUT))
        // Remove senstive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        );

    let mut router = Router::new()
        // `GET /status.json` goes to `status`.
        .route("/status.json", get(router::status::status))
        .nest("/users", router::users::router());

    if let Some(handle) = state.metrics.clone() {
        // `GET /metrics` renders Prometheus exposition.
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state(
    config: Arc<config::Configuration>,
) -> Result<AppState, Box<dyn std::error::Error>> {
    // A database is required.
    let Some(postgres) = &config.postgres else {
        return Err("missing `postgres` entry in configuration file".into());
    };
    let db = database::Database::from_config(postgres).await?;

    // execute migrations scripts on start.
    db.migrate().await?;

    let crypto = Arc::new(PasswordManager::new(config.argon2.clone())?);

    let metrics = if config.telemetry.metrics {
        Some(telemetry::setup_metrics_recorder()?)
    } else {
        None
    };

    Ok(AppState {
        config,
        users: Arc::new(PgUserRepository::new(db.postgres)),
        crypto,
        metrics,
    })
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;
    use crate::user::memory::MemoryRepository;

    #[tokio::test]
    async fn test_status() {
        let app = app(state(Arc::new(MemoryRepository::default())));

        let response = make_request(app, Method::GET, "/status.json", String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["name"], "roster");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body.get("postgres").is_none());
    }

    #[tokio::test]
    async fn test_metrics_absent_when_disabled() {
        let app = app(state(Arc::new(MemoryRepository::default())));

        let response = make_request(app, Method::GET, "/metrics", String::default()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        use axum::extract::Request;
        use tower::util::ServiceExt;

        let app = app(state(Arc::new(MemoryRepository::default())));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/users")
                    .header(header::ORIGIN, "https://example.com")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }
}
