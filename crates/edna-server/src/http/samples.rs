// SPDX-License-Identifier: Apache-2.0

use crate::http::request_support::{
    admit, api_error_response, finish, ok_envelope_response, query_map,
};
use crate::{now_iso, now_millis, AppState};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use edna_api::dto::sample_draft_from_value;
use edna_api::params::parse_sample_list_params;
use edna_model::{SampleRecord, SampleStatus};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

const ROUTE: &str = "/api/samples";

pub(crate) async fn list_samples_handler(
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
    let parsed = match parse_sample_list_params(&query_map(params)) {
        Ok(parsed) => parsed,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    let (rows, total) = state
        .store
        .list_samples(parsed.status, parsed.page as u64, parsed.limit as u64)
        .await;
    let total_pages = (total + parsed.limit as u64 - 1) / parsed.limit as u64;
    let resp = ok_envelope_response(json!({
        "samples": rows,
        "pagination": {
            "page": parsed.page,
            "limit": parsed.limit,
            "total": total,
            "totalPages": total_pages,
        },
    }));
    finish(&state, ROUTE, started, &request_id, resp).await
}

pub(crate) async fn create_sample_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = ROUTE, "request start");
    let draft = match sample_draft_from_value(&body) {
        Ok(draft) => draft,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    let now = now_iso();
    let record = SampleRecord {
        id: format!("SAMPLE_{}", now_millis()),
        sample_id: draft.sample_id,
        collection_date: draft.collection_date,
        location: draft.location,
        depth: draft.depth,
        temperature: draft.temperature,
        salinity: draft.salinity,
        researcher: draft.researcher,
        status: SampleStatus::Uploaded,
        sequence_count: None,
        species_identified: None,
        created_at: now.clone(),
        updated_at: now,
    };
    info!(request_id = %request_id, sample_id = %record.sample_id, "sample stored");
    let payload = json!({
        "sample": &record,
        "message": "Sample uploaded successfully",
    });
    state.store.insert_sample(record).await;
    let resp = ok_envelope_response(payload);
    finish(&state, ROUTE, started, &request_id, resp).await
}
