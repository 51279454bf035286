// SPDX-License-Identifier: Apache-2.0
//! Multipart intake for sequence and document files. Files are validated by
//! name and declared size only; contents are counted, never stored.

use crate::http::request_support::{admit, api_error_response, finish, ok_envelope_response};
use crate::{now_iso, now_millis, AppState};
use axum::extract::multipart::Multipart;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use edna_api::dto::sample_draft_from_value;
use edna_api::{ApiError, ApiErrorCode};
use edna_model::{
    document_type_label, validate_candidates, FileClass, ProcessedFile, SampleRecord,
    SampleStatus, UploadCandidate,
};
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

const ROUTE: &str = "/api/upload";

struct ReceivedFile {
    name: String,
    size: u64,
    class: FileClass,
}

async fn collect_parts(
    mut multipart: Multipart,
) -> Result<(Vec<ReceivedFile>, Option<serde_json::Value>), ApiError> {
    let mut files = Vec::new();
    let mut metadata = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::invalid_body(&format!("malformed multipart body: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "sequenceFiles" | "documentFiles" => {
                let class = if field_name == "sequenceFiles" {
                    FileClass::Sequence
                } else {
                    FileClass::Document
                };
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::invalid_body(&format!("failed reading file part: {e}"))
                })?;
                files.push(ReceivedFile {
                    name,
                    size: bytes.len() as u64,
                    class,
                });
            }
            "metadata" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::invalid_body(&format!("failed reading metadata part: {e}"))
                })?;
                let value = serde_json::from_str(&text)
                    .map_err(|e| ApiError::invalid_body(&format!("metadata is not JSON: {e}")))?;
                metadata = Some(value);
            }
            _ => {}
        }
    }
    Ok((files, metadata))
}

fn process_file(state: &AppState, file: &ReceivedFile, stamp: u64) -> ProcessedFile {
    match file.class {
        FileClass::Sequence => {
            let (sequence_count, quality_score) = {
                let mut rng = state.lock_mock();
                (rng.next_range(100, 1100), rng.next_range(20, 50))
            };
            ProcessedFile {
                original_name: file.name.clone(),
                size: file.size,
                class: FileClass::Sequence,
                status: "processed".to_string(),
                sequence_count: Some(sequence_count),
                quality_score: Some(quality_score),
                document_type: None,
                extracted_text: None,
                storage_path: format!("/uploads/sequences/{stamp}_{}", file.name),
            }
        }
        FileClass::Document => ProcessedFile {
            original_name: file.name.clone(),
            size: file.size,
            class: FileClass::Document,
            status: "processed".to_string(),
            sequence_count: None,
            quality_score: None,
            document_type: Some(document_type_label(&file.name).to_string()),
            extracted_text: file
                .name
                .contains(".txt")
                .then(|| "Text content extracted".to_string()),
            storage_path: format!("/uploads/documents/{stamp}_{}", file.name),
        },
    }
}

pub(crate) async fn upload_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let started = Instant::now();
    let request_id = match admit(&state, &headers, ROUTE, started).await {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    info!(request_id = %request_id, route = ROUTE, "request start");

    let (files, metadata) = match collect_parts(multipart).await {
        Ok(parts) => parts,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };
    let Some(metadata) = metadata else {
        let resp = api_error_response(&ApiError::missing_field("metadata"));
        return finish(&state, ROUTE, started, &request_id, resp).await;
    };
    let draft = match sample_draft_from_value(&metadata) {
        Ok(draft) => draft,
        Err(err) => {
            let resp = api_error_response(&err);
            return finish(&state, ROUTE, started, &request_id, resp).await;
        }
    };

    let candidates: Vec<UploadCandidate> = files
        .iter()
        .map(|f| UploadCandidate {
            name: f.name.clone(),
            size: f.size,
            class: f.class,
        })
        .collect();
    if let Err(errors) = validate_candidates(&candidates) {
        warn!(request_id = %request_id, violations = errors.len(), "upload rejected");
        let err = ApiError {
            code: ApiErrorCode::FileValidationFailed,
            message: "File validation failed".to_string(),
            details: json!({"errors": errors}),
        };
        let resp = api_error_response(&err);
        return finish(&state, ROUTE, started, &request_id, resp).await;
    }

    let stamp = now_millis();
    let mut sequence_results = Vec::new();
    let mut document_results = Vec::new();
    for file in &files {
        let processed = process_file(&state, file, stamp);
        match file.class {
            FileClass::Sequence => sequence_results.push(processed),
            FileClass::Document => document_results.push(processed),
        }
    }

    let now = now_iso();
    let record = SampleRecord {
        id: format!("SAMPLE_{stamp}"),
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
    info!(
        request_id = %request_id,
        sample_id = %record.sample_id,
        sequence_files = sequence_results.len(),
        document_files = document_results.len(),
        "upload accepted"
    );
    let payload = json!({
        "sample": &record,
        "sequenceFiles": sequence_results,
        "documentFiles": document_results,
        "message": "Sample and documents uploaded successfully",
    });
    state.store.insert_sample(record).await;
    let resp = ok_envelope_response(payload);
    finish(&state, ROUTE, started, &request_id, resp).await
}
