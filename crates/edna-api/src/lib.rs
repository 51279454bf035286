#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const CRATE_NAME: &str = "edna-api";

pub mod dto;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    MissingField,
    InvalidQueryParameter,
    InvalidBody,
    FileValidationFailed,
    CredentialNotFound,
    SampleNotFound,
    RunNotFound,
    PayloadTooLarge,
    RateLimited,
    NotReady,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn missing_field(name: &str) -> Self {
        Self {
            code: ApiErrorCode::MissingField,
            message: format!("Missing required field: {name}"),
            details: json!({"field": name}),
        }
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidQueryParameter,
            message: format!("invalid query parameter: {name}"),
            details: json!({"parameter": name, "value": value}),
        }
    }

    #[must_use]
    pub fn invalid_body(message: &str) -> Self {
        Self {
            code: ApiErrorCode::InvalidBody,
            message: message.to_string(),
            details: json!({}),
        }
    }

    #[must_use]
    pub fn internal(message: &str) -> Self {
        Self {
            code: ApiErrorCode::Internal,
            message: message.to_string(),
            details: json!({}),
        }
    }
}

/// Success envelope: `{"success": true}` merged with the payload object.
///
/// The dashboard clients read `success` and top-level payload keys
/// (`samples`, `credentials`, `logs`, ...), so those stay top-level.
#[must_use]
pub fn success_envelope(payload: Value) -> Value {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(true));
    if let Value::Object(fields) = payload {
        for (k, v) in fields {
            out.insert(k, v);
        }
    }
    Value::Object(out)
}

/// Error envelope: `success:false`, human-readable `error`, plus the typed
/// detail record for clients that want the code.
#[must_use]
pub fn error_envelope(err: &ApiError) -> Value {
    json!({
        "success": false,
        "error": err.message,
        "details": err,
    })
}

pub mod params {
    use super::ApiError;
    use edna_model::{AccessStatus, CredentialKind, SampleStatus};
    use std::collections::BTreeMap;

    pub const SAMPLES_DEFAULT_LIMIT: usize = 10;
    pub const SAMPLES_MAX_LIMIT: usize = 100;
    pub const LOGS_DEFAULT_LIMIT: usize = 100;
    pub const LOGS_MAX_LIMIT: usize = 500;
    pub const TAXONOMY_DEFAULT_LIMIT: usize = 20;
    pub const TAXONOMY_MAX_LIMIT: usize = 100;

    fn parse_limit(
        query: &BTreeMap<String, String>,
        default: usize,
        max: usize,
    ) -> Result<usize, ApiError> {
        match query.get("limit") {
            None => Ok(default),
            Some(raw) => {
                let value = raw
                    .parse::<usize>()
                    .map_err(|_| ApiError::invalid_param("limit", raw))?;
                if value == 0 || value > max {
                    return Err(ApiError::invalid_param("limit", raw));
                }
                Ok(value)
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SampleListParams {
        pub page: usize,
        pub limit: usize,
        pub status: Option<SampleStatus>,
    }

    pub fn parse_sample_list_params(
        query: &BTreeMap<String, String>,
    ) -> Result<SampleListParams, ApiError> {
        let page = match query.get("page") {
            None => 1,
            Some(raw) => {
                let value = raw
                    .parse::<usize>()
                    .map_err(|_| ApiError::invalid_param("page", raw))?;
                if value == 0 {
                    return Err(ApiError::invalid_param("page", raw));
                }
                value
            }
        };
        let limit = parse_limit(query, SAMPLES_DEFAULT_LIMIT, SAMPLES_MAX_LIMIT)?;
        let status = match query.get("status") {
            None => None,
            Some(raw) => Some(
                SampleStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?,
            ),
        };
        Ok(SampleListParams {
            page,
            limit,
            status,
        })
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LogQueryParams {
        pub status: Option<AccessStatus>,
        pub search: Option<String>,
        pub limit: usize,
    }

    pub fn parse_log_query(query: &BTreeMap<String, String>) -> Result<LogQueryParams, ApiError> {
        // `status=all` is the dashboard's "no filter" sentinel.
        let status = match query.get("status").map(String::as_str) {
            None | Some("all") => None,
            Some(raw) => Some(
                AccessStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?,
            ),
        };
        let search = query
            .get("search")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let limit = parse_limit(query, LOGS_DEFAULT_LIMIT, LOGS_MAX_LIMIT)?;
        Ok(LogQueryParams {
            status,
            search,
            limit,
        })
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct TaxonomyQueryParams {
        pub query: Option<String>,
        pub limit: usize,
    }

    pub fn parse_taxonomy_query(
        query: &BTreeMap<String, String>,
    ) -> Result<TaxonomyQueryParams, ApiError> {
        let q = query
            .get("q")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let limit = parse_limit(query, TAXONOMY_DEFAULT_LIMIT, TAXONOMY_MAX_LIMIT)?;
        Ok(TaxonomyQueryParams { query: q, limit })
    }

    pub fn parse_credential_filter(
        query: &BTreeMap<String, String>,
    ) -> Result<Option<CredentialKind>, ApiError> {
        match query.get("type").map(String::as_str) {
            None | Some("all") => Ok(None),
            Some(raw) => CredentialKind::parse(raw)
                .map(Some)
                .map_err(|_| ApiError::invalid_param("type", raw)),
        }
    }
}

#[must_use]
pub fn openapi_v1_spec() -> Value {
    json!({
      "openapi": "3.0.3",
      "info": {
        "title": "EDNA Pipeline API",
        "version": "v1"
      },
      "paths": {
        "/healthz": {"get": {"responses": {"200": {"description": "ok"}}}},
        "/readyz": {"get": {"responses": {"200": {"description": "ready"}, "503": {"description": "not ready"}}}},
        "/metrics": {"get": {"responses": {"200": {"description": "prometheus metrics"}, "404": {"description": "disabled"}}}},
        "/v1/version": {"get": {"responses": {"200": {"description": "service version"}}}},
        "/v1/openapi.json": {"get": {"responses": {"200": {"description": "this document"}}}},
        "/api/samples": {
          "get": {
            "parameters": [
              {"name": "page", "in": "query", "schema": {"type": "integer", "minimum": 1}},
              {"name": "limit", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 100}},
              {"name": "status", "in": "query", "schema": {"type": "string", "enum": ["uploaded", "processing", "analyzed", "failed"]}}
            ],
            "responses": {
              "200": {"description": "sample page with pagination block"},
              "400": {"description": "invalid query", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}}
            }
          },
          "post": {
            "responses": {
              "200": {"description": "stored sample envelope"},
              "400": {"description": "missing required field", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}}
            }
          }
        },
        "/api/upload": {
          "post": {
            "responses": {
              "200": {"description": "per-file processing results plus stored sample"},
              "400": {"description": "file validation failed", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}},
              "413": {"description": "payload too large"}
            }
          }
        },
        "/api/ml-pipeline": {
          "get": {
            "parameters": [
              {"name": "runId", "in": "query", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "run status report"},
              "400": {"description": "runId missing or malformed"},
              "404": {"description": "unknown run"}
            }
          },
          "post": {
            "responses": {
              "200": {"description": "analysis report envelope with runId"},
              "400": {"description": "sampleId missing"}
            }
          }
        },
        "/api/taxonomy": {
          "get": {
            "parameters": [
              {"name": "q", "in": "query", "schema": {"type": "string"}},
              {"name": "limit", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 100}}
            ],
            "responses": {
              "200": {"description": "search results when q present, hierarchy otherwise"},
              "304": {"description": "not modified"}
            }
          }
        },
        "/api/credentials": {
          "get": {
            "parameters": [
              {"name": "type", "in": "query", "schema": {"type": "string", "enum": ["all", "database", "api_key", "token", "certificate"]}}
            ],
            "responses": {
              "200": {"description": "masked credential list"},
              "304": {"description": "not modified"}
            }
          },
          "post": {
            "responses": {
              "200": {"description": "stored masked credential"},
              "400": {"description": "missing field"}
            }
          },
          "delete": {
            "parameters": [
              {"name": "id", "in": "query", "required": true, "schema": {"type": "string"}}
            ],
            "responses": {
              "200": {"description": "deleted"},
              "400": {"description": "id missing"},
              "404": {"description": "unknown credential"}
            }
          }
        },
        "/api/security/logs": {
          "get": {
            "parameters": [
              {"name": "status", "in": "query", "schema": {"type": "string", "enum": ["all", "success", "failed", "warning"]}},
              {"name": "search", "in": "query", "schema": {"type": "string"}},
              {"name": "limit", "in": "query", "schema": {"type": "integer", "minimum": 1, "maximum": 500}}
            ],
            "responses": {
              "200": {"description": "filtered access log list"},
              "400": {"description": "invalid query"}
            }
          },
          "post": {
            "responses": {
              "200": {"description": "event recorded"},
              "400": {"description": "missing field"}
            }
          }
        }
      },
      "components": {
        "schemas": {
          "ApiErrorCode": {
            "type": "string",
            "enum": [
              "MissingField",
              "InvalidQueryParameter",
              "InvalidBody",
              "FileValidationFailed",
              "CredentialNotFound",
              "SampleNotFound",
              "RunNotFound",
              "PayloadTooLarge",
              "RateLimited",
              "NotReady",
              "Internal"
            ]
          },
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"}
            }
          }
        }
      }
    })
}
