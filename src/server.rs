//! HTTP surface: health, operator cache clear and the query endpoint.

use crate::aggregator::Aggregator;
use crate::error::QueryError;
use crate::query::{QueryKind, QueryParams};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

const DEGRADED_AFTER: usize = 5;
const UNAVAILABLE_AFTER: usize = 10;

pub fn router(aggregator: Arc<Aggregator>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/admin/cache/clear", post(clear_cache_handler))
        .route("/v1/:kind", get(query_handler))
        .with_state(aggregator)
}

/// Health check handler
async fn health_handler(State(aggregator): State<Arc<Aggregator>>) -> (StatusCode, Json<serde_json::Value>) {
    let providers = aggregator.status().await;
    let worst = providers
        .iter()
        .map(|p| p.health.consecutive_upstream_errors)
        .max()
        .unwrap_or(0);

    let status = if worst > DEGRADED_AFTER { "degraded" } else { "ok" };
    let http_status = if worst > UNAVAILABLE_AFTER {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (
        http_status,
        Json(json!({
            "service": "sports-aggregator",
            "version": env!("CARGO_PKG_VERSION"),
            "status": status,
            "providers": providers,
        })),
    )
}

async fn clear_cache_handler(State(aggregator): State<Arc<Aggregator>>) -> Json<serde_json::Value> {
    let cleared = aggregator.clear_all().await;
    info!("Cache cleared by operator request");
    Json(json!({ "cleared": cleared }))
}

async fn query_handler(
    State(aggregator): State<Arc<Aggregator>>,
    Path(kind): Path<String>,
    Query(params): Query<QueryParams>,
) -> Response {
    let kind = match kind.parse::<QueryKind>() {
        Ok(kind) => kind,
        Err(e) => return QueryError::InvalidQuery(e).into_response(),
    };
    match aggregator.query(kind, &params).await {
        Ok(result) => Json(&*result).into_response(),
        Err(e) => e.into_response(),
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        let status = match &self {
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            QueryError::Upstream(_) | QueryError::Normalization(_) => StatusCode::BAD_GATEWAY,
        };
        let body = json!({
            "error": self.code(),
            "message": self.to_string(),
            "transient": self.is_transient(),
        });
        (status, Json(body)).into_response()
    }
}
