use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const SAMPLE_ID_MAX_LEN: usize = 64;

/// Researcher-chosen sample identifier, e.g. `NS_2024_001`.
///
/// Distinct from the server-assigned record id (`SAMPLE_<millis>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct SampleId(String);

impl SampleId {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("sampleId must not be empty".to_string()));
        }
        if s.len() > SAMPLE_ID_MAX_LEN {
            return Err(ValidationError(format!(
                "sampleId exceeds max length {SAMPLE_ID_MAX_LEN}"
            )));
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ValidationError(
                "sampleId must match [A-Za-z0-9_-]+".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for SampleId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sampling station coordinates. Latitude/longitude are validated on parse so
/// no handler ever serializes an impossible position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl GeoLocation {
    pub fn new(name: &str, lat: f64, lng: f64) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError(
                "location.name must not be empty".to_string(),
            ));
        }
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(ValidationError(format!(
                "location.lat out of range [-90, 90]: {lat}"
            )));
        }
        if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
            return Err(ValidationError(format!(
                "location.lng out of range [-180, 180]: {lng}"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            lat,
            lng,
        })
    }

    pub fn validated(self) -> Result<Self, ValidationError> {
        Self::new(&self.name, self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Uploaded,
    Processing,
    Analyzed,
    Failed,
}

impl SampleStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "analyzed" => Ok(Self::Analyzed),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError(format!("unknown sample status: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Processing => "processing",
            Self::Analyzed => "analyzed",
            Self::Failed => "failed",
        }
    }
}

impl Display for SampleStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One collected water sample as presented by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub id: String,
    pub sample_id: SampleId,
    pub collection_date: String,
    pub location: GeoLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salinity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub researcher: Option<String>,
    pub status: SampleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_identified: Option<u64>,
    pub created_at: String,
    pub updated_at: String,
}
