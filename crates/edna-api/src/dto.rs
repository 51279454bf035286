//! Request-body drafts parsed by hand from JSON values.
//!
//! Serde derive would reject a missing field with a generic message; the
//! dashboard contract wants `Missing required field: <name>` with a 400, so
//! each draft walks the value explicitly and reports the first absent field.

use crate::ApiError;
use edna_model::{
    AccessAction, AccessStatus, AnalysisKind, CredentialKind, GeoLocation, SampleId,
};
use serde_json::Value;

fn present<'a>(body: &'a Value, field: &str) -> Result<&'a Value, ApiError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ApiError::missing_field(field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ApiError::missing_field(field)),
        Some(v) => Ok(v),
    }
}

fn required_str<'a>(body: &'a Value, field: &str) -> Result<&'a str, ApiError> {
    present(body, field)?
        .as_str()
        .ok_or_else(|| ApiError::invalid_body(&format!("field {field} must be a string")))
}

fn optional_str(body: &Value, field: &str) -> Option<String> {
    body.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn optional_f64(body: &Value, field: &str) -> Result<Option<f64>, ApiError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| ApiError::invalid_body(&format!("field {field} must be a number"))),
    }
}

/// `POST /api/samples` body.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDraft {
    pub sample_id: SampleId,
    pub collection_date: String,
    pub location: GeoLocation,
    pub depth: Option<f64>,
    pub temperature: Option<f64>,
    pub salinity: Option<f64>,
    pub researcher: Option<String>,
}

pub fn sample_draft_from_value(body: &Value) -> Result<SampleDraft, ApiError> {
    let sample_id = SampleId::parse(required_str(body, "sampleId")?)
        .map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    let collection_date = required_str(body, "collectionDate")?.to_string();
    let location_value = present(body, "location")?;
    if !location_value.is_object() {
        return Err(ApiError::invalid_body("field location must be an object"));
    }
    let name = required_str(location_value, "name")?;
    let lat = location_value
        .get("lat")
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::invalid_body("location.lat must be a number"))?;
    let lng = location_value
        .get("lng")
        .and_then(Value::as_f64)
        .ok_or_else(|| ApiError::invalid_body("location.lng must be a number"))?;
    let location =
        GeoLocation::new(name, lat, lng).map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    Ok(SampleDraft {
        sample_id,
        collection_date,
        location,
        depth: optional_f64(body, "depth")?,
        temperature: optional_f64(body, "temperature")?,
        salinity: optional_f64(body, "salinity")?,
        researcher: optional_str(body, "researcher"),
    })
}

/// `POST /api/credentials` body. The secret is carried verbatim here and
/// digested before it reaches storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialDraft {
    pub name: String,
    pub kind: CredentialKind,
    pub description: String,
    pub secret: String,
}

pub fn credential_draft_from_value(body: &Value) -> Result<CredentialDraft, ApiError> {
    let name = required_str(body, "name")?.trim().to_string();
    let kind = CredentialKind::parse(required_str(body, "type")?)
        .map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    let secret = required_str(body, "value")?.to_string();
    let description = optional_str(body, "description").unwrap_or_default();
    Ok(CredentialDraft {
        name,
        kind,
        description,
        secret,
    })
}

/// `POST /api/security/logs` body.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEventDraft {
    pub user: String,
    pub action: AccessAction,
    pub resource: String,
    pub status: AccessStatus,
    pub ip_address: String,
    pub user_agent: String,
}

pub fn log_event_from_value(body: &Value) -> Result<LogEventDraft, ApiError> {
    let user = required_str(body, "user")?.to_string();
    let action = AccessAction::parse(required_str(body, "action")?)
        .map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    let resource = required_str(body, "resource")?.to_string();
    let status = AccessStatus::parse(required_str(body, "status")?)
        .map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    Ok(LogEventDraft {
        user,
        action,
        resource,
        status,
        ip_address: optional_str(body, "ipAddress").unwrap_or_else(|| "unknown".to_string()),
        user_agent: optional_str(body, "userAgent").unwrap_or_else(|| "unknown".to_string()),
    })
}

/// `POST /api/ml-pipeline` body. File entries carry an optional
/// `sequenceCount` hint; absent hints default later, at analysis time.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRequestDraft {
    pub sample_id: SampleId,
    pub analysis_type: AnalysisKind,
    pub sequence_counts: Vec<u64>,
    pub document_count: u64,
}

pub fn pipeline_request_from_value(body: &Value) -> Result<PipelineRequestDraft, ApiError> {
    let sample_id = SampleId::parse(required_str(body, "sampleId")?)
        .map_err(|e| ApiError::invalid_body(&e.to_string()))?;
    let analysis_type = match body.get("analysisType") {
        None | Some(Value::Null) => AnalysisKind::default(),
        Some(v) => {
            let raw = v
                .as_str()
                .ok_or_else(|| ApiError::invalid_body("field analysisType must be a string"))?;
            AnalysisKind::parse(raw).map_err(|e| ApiError::invalid_body(&e.to_string()))?
        }
    };
    let sequence_counts = match body.get("sequenceFiles") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(files)) => files
            .iter()
            .map(|f| f.get("sequenceCount").and_then(Value::as_u64).unwrap_or(0))
            .collect(),
        Some(_) => {
            return Err(ApiError::invalid_body(
                "field sequenceFiles must be an array",
            ))
        }
    };
    let document_count = match body.get("documentFiles") {
        None | Some(Value::Null) => 0,
        Some(Value::Array(files)) => files.len() as u64,
        Some(_) => {
            return Err(ApiError::invalid_body(
                "field documentFiles must be an array",
            ))
        }
    };
    Ok(PipelineRequestDraft {
        sample_id,
        analysis_type,
        sequence_counts,
        document_count,
    })
}
