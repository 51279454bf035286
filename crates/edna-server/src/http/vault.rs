// SPDX-License-Identifier: Apache-2.0
//! Credential vault and audit log endpoints. Credential mutations write
//! their own audit entries, so the log view reflects vault activity without
//! a separate logging call.

use crate::http::request_support::{
    admit, api_error_response, finish, if_none_match, ok_envelope_response, payload_etag,
    put_cache_headers, query_map,
};
use crate::{now_audit, now_millis, AppState};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use edna_api::dto::{credential_draft_from_value, log_event_from_value};
use edna_api::params::{parse_credential_filter, parse_log_query};
use edna_api::{success_envelope, ApiError, ApiErrorCode};
use edna_model::{AccessAction, AccessLogEntry, AccessStatus, CredentialRecord};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

const CREDENTIALS_ROUTE: &str = "/api/credentials";
const LOGS_ROUTE: &str = "/api/security/logs";

async fn audit(state: &AppState, action: &str, resource: &str, status: AccessStatus) {
    let Ok(action) = AccessAction::parse(action) else {
        return;
    };
    state
        .store
        .append_access_log(AccessLogEntry {
            id: now_millis().to_string(),
            timestamp: now_audit(),
            user: "system@edna.platform".to_string(),
            action,
            resource: resource.to_string(),
            status,
            ip_address: "127.0.0.1".to_string(),
            user_agent: "edna-server".to_string(),
        })
        .await;
}

pub(crate) async fn list_credentials_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, CREDENTIALS_ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = CREDENTIALS_ROUTE, "request start");
    let kind = match parse_credential_filter(&query_map(params)) {
        Ok(kind) => kind,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await;
        }
    };
    let credentials = state.store.list_credentials(kind).await;
    let total = credentials.len();
    let payload = success_envelope(json!({
        "credentials": credentials,
        "total": total,
    }));
    let etag = payload_etag(&payload);
    let resp = if if_none_match(&headers).as_deref() == Some(etag.as_str()) {
        let mut resp = StatusCode::NOT_MODIFIED.into_response();
        put_cache_headers(resp.headers_mut(), state.api.discovery_ttl, &etag);
        resp
    } else {
        let mut resp = axum::Json(payload).into_response();
        put_cache_headers(resp.headers_mut(), state.api.discovery_ttl, &etag);
        resp
    };
    finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await
}

pub(crate) async fn create_credential_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, CREDENTIALS_ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = CREDENTIALS_ROUTE, "request start");
    let draft = match credential_draft_from_value(&body) {
        Ok(draft) => draft,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await;
        }
    };
    let record = match CredentialRecord::new(
        &now_millis().to_string(),
        &draft.name,
        draft.kind,
        &draft.description,
        &draft.secret,
        &now_audit(),
    ) {
        Ok(record) => record,
        Err(e) => {
            let resp = api_error_response(&ApiError::invalid_body(&e.to_string()));
            return finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await;
        }
    };
    info!(request_id = %request_id, credential = %record.name, "credential stored");
    audit(&state, "CREATE_CREDENTIAL", &record.name, AccessStatus::Success).await;
    let payload = json!({
        "message": "Credential stored successfully",
        "credential": &record,
    });
    state.store.insert_credential(record).await;
    let resp = ok_envelope_response(payload);
    finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await
}

pub(crate) async fn delete_credential_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, CREDENTIALS_ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = CREDENTIALS_ROUTE, "request start");
    let Some(id) = params.get("id").map(String::as_str).filter(|s| !s.is_empty()) else {
        let err = ApiError {
            code: ApiErrorCode::MissingField,
            message: "Credential ID required".to_string(),
            details: json!({"parameter": "id"}),
        };
        let resp = api_error_response(&err);
        return finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await;
    };
    if !state.store.delete_credential(id).await {
        warn!(request_id = %request_id, credential_id = id, "delete of unknown credential");
        let err = ApiError {
            code: ApiErrorCode::CredentialNotFound,
            message: format!("unknown credential: {id}"),
            details: json!({"id": id}),
        };
        let resp = api_error_response(&err);
        return finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await;
    }
    audit(&state, "DELETE_CREDENTIAL", id, AccessStatus::Success).await;
    let resp = ok_envelope_response(json!({
        "message": "Credential deleted successfully",
    }));
    finish(&state, CREDENTIALS_ROUTE, started, &request_id, resp).await
}

pub(crate) async fn list_logs_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, LOGS_ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = LOGS_ROUTE, "request start");
    let parsed = match parse_log_query(&query_map(params)) {
        Ok(parsed) => parsed,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, LOGS_ROUTE, started, &request_id, resp).await;
        }
    };
    let logs: Vec<AccessLogEntry> = state
        .store
        .list_access_logs()
        .await
        .into_iter()
        .filter(|entry| parsed.status.map_or(true, |want| entry.status == want))
        .filter(|entry| {
            parsed
                .search
                .as_deref()
                .map_or(true, |needle| entry.matches_search(needle))
        })
        .take(parsed.limit)
        .collect();
    let total = logs.len();
    let resp = ok_envelope_response(json!({
        "logs": logs,
        "total": total,
    }));
    finish(&state, LOGS_ROUTE, started, &request_id, resp).await
}

pub(crate) async fn record_log_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    axum::Json(body): axum::Json<Value>,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, LOGS_ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = LOGS_ROUTE, "request start");
    let draft = match log_event_from_value(&body) {
        Ok(draft) => draft,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, LOGS_ROUTE, started, &request_id, resp).await;
        }
    };
    let entry = AccessLogEntry {
        id: now_millis().to_string(),
        timestamp: now_audit(),
        user: draft.user,
        action: draft.action,
        resource: draft.resource,
        status: draft.status,
        ip_address: draft.ip_address,
        user_agent: draft.user_agent,
    };
    info!(
        request_id = %request_id,
        user = %entry.user,
        action = %entry.action,
        status = entry.status.as_str(),
        "security event recorded"
    );
    state.store.append_access_log(entry).await;
    let resp = ok_envelope_response(json!({
        "message": "Security event logged successfully",
    }));
    finish(&state, LOGS_ROUTE, started, &request_id, resp).await
}
