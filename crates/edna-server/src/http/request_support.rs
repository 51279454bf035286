// SPDX-License-Identifier: Apache-2.0
//! Pieces every handler shares: request-id propagation, the error contract,
//! conditional-GET support, and the drain/rate-limit admission gate.

use crate::AppState;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use edna_api::{error_envelope, success_envelope, ApiError, ApiErrorCode};
use edna_model::sha256_hex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

#[must_use]
pub(crate) fn api_error_status(code: ApiErrorCode) -> StatusCode {
    match code {
        ApiErrorCode::MissingField
        | ApiErrorCode::InvalidQueryParameter
        | ApiErrorCode::InvalidBody
        | ApiErrorCode::FileValidationFailed => StatusCode::BAD_REQUEST,
        ApiErrorCode::CredentialNotFound
        | ApiErrorCode::SampleNotFound
        | ApiErrorCode::RunNotFound => StatusCode::NOT_FOUND,
        ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ApiErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ApiErrorCode::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[must_use]
pub(crate) fn api_error_response(err: &ApiError) -> Response {
    let status = api_error_status(err.code);
    let mut resp = (status, Json(error_envelope(err))).into_response();
    if matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
    ) {
        resp.headers_mut()
            .insert("retry-after", HeaderValue::from_static("3"));
    }
    resp
}

#[must_use]
pub(crate) fn ok_envelope_response(payload: Value) -> Response {
    (StatusCode::OK, Json(success_envelope(payload))).into_response()
}

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

#[must_use]
pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

pub(crate) fn if_none_match(headers: &HeaderMap) -> Option<String> {
    headers
        .get("if-none-match")
        .and_then(|v| v.to_str().ok())
        .map(std::string::ToString::to_string)
}

pub(crate) fn put_cache_headers(headers: &mut HeaderMap, ttl: Duration, etag: &str) {
    if let Ok(value) = HeaderValue::from_str(&format!("public, max-age={}", ttl.as_secs())) {
        headers.insert("cache-control", value);
    }
    if let Ok(value) = HeaderValue::from_str(etag) {
        headers.insert("etag", value);
    }
}

#[must_use]
pub(crate) fn payload_etag(payload: &Value) -> String {
    format!(
        "\"{}\"",
        sha256_hex(&serde_json::to_vec(payload).unwrap_or_default())
    )
}

/// First hop of `x-forwarded-for` when it looks like an address, otherwise
/// nothing. Rate-limit keys fall back to a shared bucket without it.
pub(crate) fn normalized_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
    {
        Some(first.to_string())
    } else {
        None
    }
}

pub(crate) fn query_map(params: HashMap<String, String>) -> std::collections::BTreeMap<String, String> {
    params.into_iter().collect()
}

/// Admission gate run at the top of every handler: refuse while draining,
/// then charge the caller's rate-limit bucket. Returns the request id for
/// the accepted request, or the finished refusal response.
pub(crate) async fn admit(
    state: &AppState,
    headers: &HeaderMap,
    route: &'static str,
    started: Instant,
) -> Result<String, Response> {
    let request_id = propagated_request_id(headers, state);
    if !state.accepting_requests.load(Ordering::Relaxed) {
        let err = ApiError {
            code: ApiErrorCode::NotReady,
            message: "server draining; refusing new requests".to_string(),
            details: json!({}),
        };
        let resp = api_error_response(&err);
        state
            .metrics
            .observe_request(route, StatusCode::SERVICE_UNAVAILABLE, started.elapsed())
            .await;
        return Err(with_request_id(resp, &request_id));
    }
    if state.api.enable_rate_limit {
        let key = normalized_forwarded_for(headers).unwrap_or_else(|| "unknown".to_string());
        if !state
            .ip_limiter
            .allow(&key, &state.api.rate_limit_per_ip)
            .await
        {
            let err = ApiError {
                code: ApiErrorCode::RateLimited,
                message: "rate limit exceeded".to_string(),
                details: json!({}),
            };
            let resp = api_error_response(&err);
            state
                .metrics
                .observe_request(route, StatusCode::TOO_MANY_REQUESTS, started.elapsed())
                .await;
            return Err(with_request_id(resp, &request_id));
        }
    }
    Ok(request_id)
}

/// Records the route observation and stamps the request id before the
/// response leaves the handler.
pub(crate) async fn finish(
    state: &AppState,
    route: &'static str,
    started: Instant,
    request_id: &str,
    resp: Response,
) -> Response {
    state
        .metrics
        .observe_request(route, resp.status(), started.elapsed())
        .await;
    with_request_id(resp, request_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_client_and_not_found_codes() {
        assert_eq!(
            api_error_status(ApiErrorCode::MissingField),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            api_error_status(ApiErrorCode::RunNotFound),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            api_error_status(ApiErrorCode::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            api_error_status(ApiErrorCode::Internal),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn forwarded_for_takes_first_clean_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.5, 1.2.3.4"));
        assert_eq!(
            normalized_forwarded_for(&headers).as_deref(),
            Some("10.0.0.5")
        );
        headers.insert("x-forwarded-for", HeaderValue::from_static("bad value!"));
        assert!(normalized_forwarded_for(&headers).is_none());
    }

    #[test]
    fn etag_is_stable_for_equal_payloads() {
        let a = payload_etag(&json!({"total": 2}));
        let b = payload_etag(&json!({"total": 2}));
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
    }
}
