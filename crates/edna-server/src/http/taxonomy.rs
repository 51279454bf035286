// SPDX-License-Identifier: Apache-2.0

use crate::http::request_support::{
    admit, api_error_response, finish, if_none_match, ok_envelope_response, payload_etag,
    put_cache_headers, query_map,
};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use edna_api::params::parse_taxonomy_query;
use edna_api::success_envelope;
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

const ROUTE: &str = "/api/taxonomy";

/// With `q` this is a search; without it the full hierarchy, which changes
/// rarely and is served with an etag so browsers can revalidate cheaply.
pub(crate) async fn taxonomy_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = ROUTE, "request start");
    let parsed = match parse_taxonomy_query(&query_map(params)) {
        Ok(parsed) => parsed,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    let resp = match parsed.query {
        Some(query) => {
            let results = state.store.search_taxa(&query, parsed.limit as u64).await;
            let total = results.len();
            ok_envelope_response(json!({
                "query": query,
                "results": results,
                "totalCount": total,
            }))
        }
        None => {
            let hierarchy = state.store.taxonomy_hierarchy().await;
            let payload = success_envelope(
                serde_json::to_value(&hierarchy).unwrap_or_else(|_| json!({})),
            );
            let etag = payload_etag(&payload);
            if if_none_match(&headers).as_deref() == Some(etag.as_str()) {
                let mut resp = StatusCode::NOT_MODIFIED.into_response();
                put_cache_headers(resp.headers_mut(), state.api.discovery_ttl, &etag);
                resp
            } else {
                let mut resp = axum::Json(payload).into_response();
                put_cache_headers(resp.headers_mut(), state.api.discovery_ttl, &etag);
                resp
            }
        }
    };
    finish(&state, ROUTE, started, &request_id, resp).await
}
