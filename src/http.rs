use crate::collectors::CollectError;
use crate::config::Config;
use crate::metrics::Metrics;
use crate::snapshot;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};
use reqwest::Client;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;

#[derive(Clone)]
pub struct HttpAppState {
    pub config: Arc<Config>,
    pub client: Client,
    pub metrics: Arc<Metrics>,
}

pub fn build_router(config: Arc<Config>, client: Client, metrics: Arc<Metrics>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let index = config.static_dir.join("index.html");
    let frontend = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/api/server-info", get(server_info_handler))
        .fallback_service(frontend)
        .layer(cors)
        .with_state(HttpAppState {
            config,
            client,
            metrics,
        })
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn metrics_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_scrape_count();
    match state.metrics.encode_metrics() {
        Ok(encoded) => {
            let mut response = Response::new(Body::from(encoded));
            response.headers_mut().insert(
                CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            );
            response
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("ошибка кодирования метрик: {err}"),
        )
            .into_response(),
    }
}

async fn server_info_handler(State(state): State<HttpAppState>) -> Response {
    state.metrics.inc_info_request();
    match snapshot::collect(&state.client, &state.config, &state.metrics).await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(err) => collect_failure_response(&err),
    }
}

fn collect_failure_response(err: &CollectError) -> Response {
    error!(error = %err, "не удалось собрать снимок состояния хоста");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("ошибка сбора данных: {err}"),
    )
        .into_response()
}
