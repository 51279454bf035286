// SPDX-License-Identifier: Apache-2.0
//! Operational endpoints: liveness, readiness, version, OpenAPI, metrics.

use crate::config::CONFIG_SCHEMA_VERSION;
use crate::http::request_support::{propagated_request_id, with_request_id};
use crate::AppState;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use edna_api::openapi_v1_spec;
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::Instant;

pub(crate) async fn healthz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let resp = (StatusCode::OK, "ok").into_response();
    state
        .metrics
        .observe_request("/healthz", StatusCode::OK, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn readyz_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let request_id = propagated_request_id(&headers, &state);
    let ready = state.ready.load(Ordering::Relaxed)
        && state.accepting_requests.load(Ordering::Relaxed);
    let (status, body) = if ready {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not-ready")
    };
    let resp = (status, body).into_response();
    state
        .metrics
        .observe_request("/readyz", status, started.elapsed())
        .await;
    with_request_id(resp, &request_id)
}

pub(crate) async fn version_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    let resp = Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "config_schema_version": CONFIG_SCHEMA_VERSION,
    }))
    .into_response();
    with_request_id(resp, &request_id)
}

pub(crate) async fn openapi_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    with_request_id(Json(openapi_v1_spec()).into_response(), &request_id)
}

pub(crate) async fn metrics_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let request_id = propagated_request_id(&headers, &state);
    if !state.api.enable_metrics {
        return with_request_id(StatusCode::NOT_FOUND.into_response(), &request_id);
    }
    let body = state.metrics.render_prometheus().await;
    let resp = (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        body,
    )
        .into_response();
    with_request_id(resp, &request_id)
}
