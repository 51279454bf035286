use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConservationStatus {
    #[serde(rename = "Least Concern")]
    LeastConcern,
    #[serde(rename = "Near Threatened")]
    NearThreatened,
    #[serde(rename = "Vulnerable")]
    Vulnerable,
    #[serde(rename = "Endangered")]
    Endangered,
    #[serde(rename = "Critically Endangered")]
    CriticallyEndangered,
}

/// One taxon as served by the browser: full Linnaean rank path plus the
/// platform-local sample count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonRecord {
    pub id: String,
    pub scientific_name: String,
    pub common_name: String,
    pub kingdom: String,
    pub phylum: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub conservation_status: ConservationStatus,
    pub sample_count: u64,
}

impl TaxonRecord {
    /// Case-insensitive substring match over scientific and common name,
    /// mirroring what the search box does.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.scientific_name.to_lowercase().contains(&needle)
            || self.common_name.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhylumSummary {
    pub name: String,
    pub classes: Vec<String>,
    pub species_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KingdomSummary {
    pub name: String,
    pub phyla: Vec<PhylumSummary>,
    pub total_species: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyHierarchy {
    pub kingdoms: Vec<KingdomSummary>,
    pub total_species: u64,
    pub last_updated: String,
}
