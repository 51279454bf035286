use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const SEQUENCE_EXTENSIONS: [&str; 7] = [".fasta", ".fa", ".fas", ".fastq", ".fq", ".zip", ".gz"];
pub const DOCUMENT_EXTENSIONS: [&str; 11] = [
    ".pdf", ".doc", ".docx", ".txt", ".csv", ".xlsx", ".xls", ".ppt", ".pptx", ".rtf", ".odt",
];

pub const SEQUENCE_MAX_BYTES: u64 = 500 * 1024 * 1024;
pub const DOCUMENT_MAX_BYTES: u64 = 100 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Sequence,
    Document,
}

impl FileClass {
    #[must_use]
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Sequence => &SEQUENCE_EXTENSIONS,
            Self::Document => &DOCUMENT_EXTENSIONS,
        }
    }

    #[must_use]
    pub fn max_bytes(self) -> u64 {
        match self {
            Self::Sequence => SEQUENCE_MAX_BYTES,
            Self::Document => DOCUMENT_MAX_BYTES,
        }
    }

    #[must_use]
    pub fn allows(self, extension: &str) -> bool {
        self.allowed_extensions().contains(&extension)
    }

    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Document => "document",
        }
    }
}

impl Display for FileClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.noun())
    }
}

/// Lowercased extension including the dot, from the last dot onward.
#[must_use]
pub fn extension_of(filename: &str) -> Option<String> {
    let idx = filename.rfind('.')?;
    if idx == 0 && filename.len() == 1 {
        return None;
    }
    Some(filename[idx..].to_ascii_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    ResearchPaper,
    Document,
    TextFile,
    DataFile,
    Spreadsheet,
    Presentation,
    RichText,
    Unknown,
}

impl DocumentKind {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ResearchPaper => "Research Paper",
            Self::Document => "Document",
            Self::TextFile => "Text File",
            Self::DataFile => "Data File",
            Self::Spreadsheet => "Spreadsheet",
            Self::Presentation => "Presentation",
            Self::RichText => "Rich Text",
            Self::Unknown => "Unknown",
        }
    }
}

/// Display category used by the dashboard for document uploads.
#[must_use]
pub fn document_type_label(filename: &str) -> &'static str {
    let kind = match extension_of(filename).as_deref() {
        Some(".pdf") => DocumentKind::ResearchPaper,
        Some(".doc" | ".docx" | ".odt") => DocumentKind::Document,
        Some(".txt") => DocumentKind::TextFile,
        Some(".csv") => DocumentKind::DataFile,
        Some(".xlsx" | ".xls") => DocumentKind::Spreadsheet,
        Some(".ppt" | ".pptx") => DocumentKind::Presentation,
        Some(".rtf") => DocumentKind::RichText,
        _ => DocumentKind::Unknown,
    };
    kind.label()
}

/// An uploaded file as seen by validation: name and declared size only.
/// Contents are never persisted or parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
    pub class: FileClass,
}

impl UploadCandidate {
    fn violations(&self, out: &mut Vec<String>) {
        let extension_ok = extension_of(&self.name)
            .is_some_and(|ext| self.class.allows(&ext));
        if !extension_ok {
            out.push(format!(
                "Invalid {} file type: {}",
                self.class.noun(),
                self.name
            ));
        }
        if self.size > self.class.max_bytes() {
            out.push(format!(
                "{} file too large: {}",
                capitalize(self.class.noun()),
                self.name
            ));
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Checks every candidate and returns the full violation list, not just the
/// first failure, so the client can fix a whole batch in one pass.
pub fn validate_candidates(candidates: &[UploadCandidate]) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();
    for candidate in candidates {
        candidate.violations(&mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Per-file result echoed back after a (simulated) processing pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub original_name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub class: FileClass,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    pub storage_path: String,
}
