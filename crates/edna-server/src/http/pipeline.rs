// SPDX-License-Identifier: Apache-2.0
//! Pipeline run lifecycle. Starting a run synthesizes the full analysis
//! report up front; status polls replay a deterministic progress ladder
//! keyed off the run id and poll count.

use crate::http::request_support::{admit, api_error_response, finish, ok_envelope_response};
use crate::mock::{build_run_report, synth_status_report, RunInputs};
use crate::store::RunState;
use crate::{now_iso, now_millis, now_plus_minutes_iso, AppState};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use edna_api::dto::pipeline_request_from_value;
use edna_api::{ApiError, ApiErrorCode};
use edna_model::RunId;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::info;

const ROUTE: &str = "/api/ml-pipeline";

pub(crate) async fn start_run_handler(
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
    let draft = match pipeline_request_from_value(&body) {
        Ok(draft) => draft,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    if state.store.find_sample(&draft.sample_id).await.is_none() {
        let err = ApiError {
            code: ApiErrorCode::SampleNotFound,
            message: format!("unknown sample: {}", draft.sample_id),
            details: json!({"sampleId": draft.sample_id}),
        };
        let resp = api_error_response(&err);
        return finish(&state, ROUTE, started, &request_id, resp).await;
    }

    let millis = now_millis();
    // The mock guard must not live across an await, so every fallible step
    // stays inside this block and the outcome is matched afterwards.
    let synthesized = {
        let mut rng = state.lock_mock();
        let suffix = rng.run_id_suffix();
        match RunId::new(millis, &suffix) {
            Ok(run_id) => {
                let report = build_run_report(
                    &mut rng,
                    RunInputs {
                        sample_id: draft.sample_id.as_str(),
                        run_id: run_id.clone(),
                        analysis_type: draft.analysis_type,
                        sequence_counts: draft.sequence_counts,
                        document_count: draft.document_count,
                        start_time: now_iso(),
                        estimated_completion_time: now_plus_minutes_iso(5),
                    },
                );
                Ok((run_id, report))
            }
            Err(e) => Err(e),
        }
    };
    let (run_id, report) = match synthesized {
        Ok(pair) => pair,
        Err(e) => {
            let resp = api_error_response(&ApiError::internal(&e.to_string()));
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    info!(
        request_id = %request_id,
        run_id = %run_id,
        sample_id = %draft.sample_id,
        analysis_type = ?draft.analysis_type,
        "pipeline run registered"
    );
    let payload = json!({
        "runId": &run_id,
        "sampleId": draft.sample_id,
        "results": &report,
        "timestamp": now_iso(),
        "message": "ML pipeline started successfully",
    });
    state
        .store
        .register_run(RunState { report, polls: 0 })
        .await;
    let resp = ok_envelope_response(payload);
    finish(&state, ROUTE, started, &request_id, resp).await
}

pub(crate) async fn run_status_handler(
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
    let run_id = match params.get("runId") {
        None => {
            let resp = api_error_response(&ApiError::missing_field("runId"));
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
        Some(raw) => match RunId::parse(raw) {
            Ok(id) => id,
            Err(_) => {
                let resp = api_error_response(&ApiError::invalid_param("runId", raw));
                return finish(&state, ROUTE, started, &request_id, resp).await;
            }
        },
    };
    let Some((report, polls)) = state.store.poll_run(&run_id).await else {
        let err = ApiError {
            code: ApiErrorCode::RunNotFound,
            message: format!("unknown run: {run_id}"),
            details: json!({"runId": run_id}),
        };
        let resp = api_error_response(&err);
        return finish(&state, ROUTE, started, &request_id, resp).await;
    };
    let status = synth_status_report(
        &run_id,
        polls,
        &report.start_time,
        &report.estimated_completion_time,
    );
    let resp = ok_envelope_response(serde_json::to_value(&status).unwrap_or_else(|_| json!({})));
    finish(&state, ROUTE, started, &request_id, resp).await
}
