// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the guard service.
//!
//! The gateway in front of the GraphQL executor calls `/check` with the
//! client identity and the parsed selection tree; the query is forwarded for
//! execution only when the response says `allowed`.
//!
//! The body is read as raw bytes: the selection document is kept as raw JSON
//! until the client has passed the rate limiter, then decoded without a
//! nesting limit so that deep queries reach the depth rule.

use crate::config::Config;
use crate::error::{graphql_error_response, invalid_document_response, Violation};
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::rules::Analysis;
use crate::telemetry::GuardMetrics;
use crate::tree::SelectionTree;
use crate::validator::{QueryGuard, ValidationResult};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{value::RawValue, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub guard: QueryGuard,
    pub metrics: GuardMetrics,
    pub config: Config,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Check request: who is asking, and what they asked for.
///
/// `query` is a selection document left undecoded; see
/// [`SelectionTree::from_json`].
#[derive(Debug, Deserialize)]
pub struct CheckRequest<'a> {
    pub client: String,
    #[serde(borrow, default)]
    pub query: Option<&'a RawValue>,
}

/// Check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<Violation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
}

impl CheckResponse {
    fn denied(violations: Vec<Violation>) -> Self {
        let mut body = graphql_error_response(&violations);
        Self {
            allowed: false,
            errors: Some(body["errors"].take()),
            violations,
            analysis: None,
            retry_after_secs: None,
            remaining: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        let mut body = invalid_document_response(message);
        Self {
            allowed: false,
            violations: Vec::new(),
            errors: Some(body["errors"].take()),
            analysis: None,
            retry_after_secs: None,
            remaining: None,
        }
    }
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/check", post(check));

    if state.config.metrics.enabled {
        router = router.route(&state.config.metrics.path, get(metrics));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "graphql-abuse-guard",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Rate-limit the client, then validate its query.
///
/// The rate check is fail-fast: a limited client's query is never decoded.
/// Validation rejections return 200 so the gateway can relay the GraphQL
/// error body unchanged; undecodable requests return 400 with the same body
/// shape.
pub async fn check(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: CheckRequest<'_> = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(error = %e, "Malformed check request");
            state.metrics.record_invalid();
            let response = CheckResponse::invalid(format!("malformed check request: {}", e));
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    if req.client.trim().is_empty() {
        warn!("Check request without client identity");
        state.metrics.record_invalid();
        let response = CheckResponse::invalid("client identity is required");
        return (StatusCode::BAD_REQUEST, Json(response)).into_response();
    }

    let rate_result = state.limiter.check(&req.client);
    state.metrics.set_tracked_clients(state.limiter.tracked_clients());

    let remaining = match rate_result {
        RateLimitResult::Allowed { remaining, .. } => remaining,
        RateLimitResult::Limited {
            violation,
            retry_after,
        } => {
            let retry_secs = retry_after.as_secs().max(1);
            warn!(
                client = %req.client,
                attempts = violation.observed,
                limit = violation.threshold,
                retry_after_secs = retry_secs,
                "Request rate limited"
            );
            state.metrics.record_rate_limited();

            let mut body = CheckResponse::denied(vec![violation]);
            body.retry_after_secs = Some(retry_secs);
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, retry_secs.to_string())],
                Json(body),
            )
                .into_response();
        }
    };

    let decoded = match req.query {
        Some(raw) => SelectionTree::from_json(raw.get()),
        None => Ok(SelectionTree::new()),
    };
    let tree = match decoded {
        Ok(tree) => tree,
        Err(e) => {
            info!(client = %req.client, error = %e, "Undecodable selection document");
            state.metrics.record_invalid();
            let mut response = CheckResponse::invalid(e.to_string());
            response.remaining = Some(remaining);
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    let analysis = state.guard.analyze(&tree);
    debug!(client = %req.client, ?analysis, "Query analysed");

    match state.guard.evaluate(&analysis) {
        ValidationResult::Admitted => {
            state.metrics.record_admitted();
            (
                StatusCode::OK,
                Json(CheckResponse {
                    allowed: true,
                    violations: Vec::new(),
                    errors: None,
                    analysis: Some(analysis),
                    retry_after_secs: None,
                    remaining: Some(remaining),
                }),
            )
                .into_response()
        }
        ValidationResult::Rejected(violations) => {
            info!(
                client = %req.client,
                violations = violations.len(),
                first = %violations[0],
                "Query rejected"
            );
            state.metrics.record_rejected(&violations);

            let mut body = CheckResponse::denied(violations);
            body.analysis = Some(analysis);
            body.remaining = Some(remaining);
            (StatusCode::OK, Json(body)).into_response()
        }
    }
}

/// Prometheus exposition endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
