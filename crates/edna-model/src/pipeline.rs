use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

pub const RUN_ID_SUFFIX_LEN: usize = 9;

/// Pipeline run identifier: `ML_<unix-millis>_<9 base36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct RunId(String);

impl RunId {
    pub fn new(unix_millis: u64, suffix: &str) -> Result<Self, ValidationError> {
        if suffix.len() != RUN_ID_SUFFIX_LEN {
            return Err(ValidationError(format!(
                "run id suffix must be exactly {RUN_ID_SUFFIX_LEN} characters"
            )));
        }
        if !suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError(
                "run id suffix must be lowercase base36".to_string(),
            ));
        }
        Ok(Self(format!("ML_{unix_millis}_{suffix}")))
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let rest = input
            .strip_prefix("ML_")
            .ok_or_else(|| ValidationError("run id must start with ML_".to_string()))?;
        let (millis, suffix) = rest
            .split_once('_')
            .ok_or_else(|| ValidationError("run id must be ML_<millis>_<suffix>".to_string()))?;
        if millis.is_empty() || !millis.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError(
                "run id millis segment must be numeric".to_string(),
            ));
        }
        Self::new(millis.parse::<u64>().map_err(|e| {
            ValidationError(format!("run id millis segment out of range: {e}"))
        })?, suffix)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Processing,
    Analyzing,
    Completing,
    Completed,
}

impl RunStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Analyzing => "analyzing",
            Self::Completing => "completing",
            Self::Completed => "completed",
        }
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress is 100 exactly when the run has completed; in-flight runs report
/// a value in 1..=99.
#[must_use]
pub fn normalized_progress(status: RunStatus, raw: u8) -> u8 {
    if status.is_terminal() {
        100
    } else {
        raw.clamp(1, 99)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Comprehensive,
    SequenceOnly,
    DocumentOnly,
}

impl AnalysisKind {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "comprehensive" => Ok(Self::Comprehensive),
            "sequence_only" => Ok(Self::SequenceOnly),
            "document_only" => Ok(Self::DocumentOnly),
            other => Err(ValidationError(format!("unknown analysis type: {other}"))),
        }
    }
}

impl Default for AnalysisKind {
    fn default() -> Self {
        Self::Comprehensive
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSpecies {
    pub name: String,
    pub confidence: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceAnalysis {
    pub total_files: u64,
    pub total_sequences: u64,
    pub processed_sequences: u64,
    pub quality_filtered_sequences: u64,
    pub average_quality_score: f64,
    pub average_sequence_length: f64,
    pub processing_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentAnalysis {
    pub total_documents: u64,
    pub processed_documents: u64,
    pub extracted_species: Vec<ExtractedSpecies>,
    pub extracted_locations: Vec<String>,
    pub methodology_keywords: Vec<String>,
    pub confidence_score: f64,
    pub processing_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiodiversityMetrics {
    pub total_species_identified: u64,
    pub species_list: Vec<String>,
    pub shannon_diversity: f64,
    pub simpson_index: f64,
    pub evenness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomicComposition {
    pub phyla: BTreeMap<String, u64>,
    pub classes: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub overall_confidence: f64,
    pub data_completeness: f64,
    pub analysis_reliability: String,
    pub recommended_actions: Vec<String>,
}

/// Full analysis report returned when a run is started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub analysis_type: AnalysisKind,
    pub sample_id: String,
    pub run_id: RunId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_analysis: Option<SequenceAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_analysis: Option<DocumentAnalysis>,
    pub biodiversity_metrics: BiodiversityMetrics,
    pub taxonomic_composition: TaxonomicComposition,
    pub quality_metrics: QualityMetrics,
    pub processing_steps: Vec<String>,
    pub status: RunStatus,
    pub start_time: String,
    pub estimated_completion_time: String,
}

/// Point-in-time status of a registered run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatusReport {
    pub run_id: RunId,
    pub status: RunStatus,
    pub progress: u8,
    pub start_time: String,
    pub end_time: Option<String>,
    pub current_step: String,
    pub estimated_time_remaining: u64,
    pub message: String,
    pub logs: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_round_trips() {
        let id = RunId::new(1705312225000, "a1b2c3d4e").expect("run id");
        assert_eq!(id.as_str(), "ML_1705312225000_a1b2c3d4e");
        assert_eq!(RunId::parse(id.as_str()).expect("reparse"), id);
    }

    #[test]
    fn run_id_rejects_malformed_inputs() {
        assert!(RunId::parse("RUN_1_abcdefghi").is_err());
        assert!(RunId::parse("ML_abc_abcdefghi").is_err());
        assert!(RunId::parse("ML_1_short").is_err());
        assert!(RunId::new(1, "ABCDEFGHI").is_err());
    }

    #[test]
    fn progress_is_hundred_only_when_completed() {
        assert_eq!(normalized_progress(RunStatus::Completed, 5), 100);
        assert_eq!(normalized_progress(RunStatus::Processing, 0), 1);
        assert_eq!(normalized_progress(RunStatus::Analyzing, 250), 99);
        assert_eq!(normalized_progress(RunStatus::Queued, 40), 40);
    }

    #[test]
    fn analysis_kind_wire_form() {
        assert_eq!(
            AnalysisKind::parse("sequence_only").expect("parse"),
            AnalysisKind::SequenceOnly
        );
        assert!(AnalysisKind::parse("full").is_err());
        assert_eq!(AnalysisKind::default(), AnalysisKind::Comprehensive);
    }
}
