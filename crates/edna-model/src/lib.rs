#![forbid(unsafe_code)]
//! EDNA Pipeline model SSOT.
//!
//! Every record that crosses the wire is defined here, with validation at the
//! edges: identifiers and enums parse before any handler logic runs, and
//! credential secrets are write-only by construction.

mod files;
mod pipeline;
mod sample;
mod taxonomy;
mod vault;

pub use files::{
    document_type_label, extension_of, validate_candidates, DocumentKind, FileClass,
    ProcessedFile, UploadCandidate, DOCUMENT_EXTENSIONS, DOCUMENT_MAX_BYTES,
    SEQUENCE_EXTENSIONS, SEQUENCE_MAX_BYTES,
};
pub use pipeline::{
    normalized_progress, AnalysisKind, BiodiversityMetrics, DocumentAnalysis, ExtractedSpecies,
    QualityMetrics, RunId, RunReport, RunStatus, RunStatusReport, SequenceAnalysis,
    TaxonomicComposition, RUN_ID_SUFFIX_LEN,
};
pub use sample::{
    GeoLocation, SampleId, SampleRecord, SampleStatus, ValidationError, SAMPLE_ID_MAX_LEN,
};
pub use taxonomy::{
    ConservationStatus, KingdomSummary, PhylumSummary, TaxonRecord, TaxonomyHierarchy,
};
pub use vault::{
    sha256_hex, AccessAction, AccessLogEntry, AccessStatus, CredentialKind, CredentialRecord,
    Masked, MASKED_VALUE,
};

pub const CRATE_NAME: &str = "edna-model";
