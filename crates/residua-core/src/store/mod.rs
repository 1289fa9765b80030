//! Fact-store abstraction
//!
//! The fact store holds the regional knowledge base the pipeline grounds
//! its plans in: crop/residue chemistry, soil retention, regional policy
//! and capacity limits. The store is read-only for the core; ingestion
//! happens once at process start.
//!
//! Matching contract for all three lookups: an exact case-sensitive
//! match wins; when none exists, implementations fall back to a
//! case-insensitive substring match in either direction (stored value
//! contains query, or query contains stored value). Crop lookups return
//! at most 5 records; soil and region lookups return at most one "best
//! record".

use async_trait::async_trait;
use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Crop and residue facts, one record per residue type.
#[derive(Debug, Clone, PartialEq)]
pub struct CropFacts {
    pub crop: String,
    pub residue_type: String,
    pub residue_ratio: Option<f64>,
    pub nutrient_n: Option<f64>,
    pub nutrient_p: Option<f64>,
    pub nutrient_k: Option<f64>,
    pub common_use: Option<String>,
}

/// Soil retention facts.
#[derive(Debug, Clone, PartialEq)]
pub struct SoilFacts {
    pub soil_type: String,
    pub retention_capacity: Option<String>,
}

/// Regional policy and capacity facts, merged from the policy and
/// production-limit sources. Every field is optional: an absent value is
/// meaningful and must be surfaced downstream, never defaulted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionFacts {
    pub region: String,
    pub burning_ban: Option<String>,
    pub compost_subsidy_inr_per_ton: Option<f64>,
    pub biogas_subsidy_pct: Option<f64>,
    pub co2_limit_t_per_ha: Option<f64>,
    pub biogas_production_score: Option<f64>,
    pub biogas_limit_level: Option<String>,
    pub compost_capacity_t_per_day: Option<f64>,
    pub biochar_max_pct: Option<f64>,
    pub biochar_potential_score: Option<f64>,
    pub biochar_limit_pct: Option<f64>,
    pub biochar_level: Option<String>,
}

impl RegionFacts {
    /// Whether the region has any usable biogas capacity signal. Gates
    /// whether a biogas subsidy is worth surfacing at all.
    pub fn has_biogas_capacity(&self) -> bool {
        let has_level = self
            .biogas_limit_level
            .as_deref()
            .is_some_and(|level| !level.is_empty() && level != "None");
        let has_score = self.biogas_production_score.is_some_and(|score| score > 0.0);
        has_level || has_score
    }
}

/// Read-only fact lookups, safe for concurrent use by independent
/// requests.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Crop/residue facts matching the crop identifier, capped at 5.
    async fn crop_facts(&self, crop: &str) -> Result<Vec<CropFacts>, StoreError>;

    /// Best soil record for the soil identifier, if any.
    async fn soil_facts(&self, soil: &str) -> Result<Option<SoilFacts>, StoreError>;

    /// Best merged policy/capacity record for the region, if any.
    async fn region_facts(&self, region: &str) -> Result<Option<RegionFacts>, StoreError>;
}
