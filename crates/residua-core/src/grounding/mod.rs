//! Grounding-document assembly
//!
//! The context aggregator queries the three fact domains independently
//! and merges whatever matched into a single grounding document, the
//! sole factual context handed to the generation stages. A domain with
//! no match contributes nothing; only when all three come back empty is
//! there "no grounding available", which callers must propagate
//! explicitly rather than substituting an empty string.

use std::fmt::Write;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{CropFacts, FactStore, RegionFacts, SoilFacts};

/// The factual context for one allocation request.
///
/// Grouped by subject in a fixed order: crop/residue facts first, then
/// soil, then regional policy and capacities. Built fresh per request
/// and discarded after use.
#[derive(Debug, Clone)]
pub struct GroundingDocument {
    /// The region identifier as queried, used in section headings.
    pub region_query: String,
    pub crop: Vec<CropFacts>,
    pub soil: Option<SoilFacts>,
    pub region: Option<RegionFacts>,
}

impl GroundingDocument {
    /// True when no domain contributed any fact.
    pub fn is_empty(&self) -> bool {
        self.crop.is_empty() && self.soil.is_none() && self.region.is_none()
    }

    /// Number of fact records across all subjects.
    pub fn fact_count(&self) -> usize {
        self.crop.len() + usize::from(self.soil.is_some()) + usize::from(self.region.is_some())
    }

    /// Render the document as flat sectioned text for an oracle
    /// instruction. Absent values are surfaced as "N/A" or "Not
    /// specified in database", never dropped silently.
    pub fn render(&self) -> String {
        let mut doc = String::new();

        if !self.crop.is_empty() {
            doc.push_str("## Crop and Residue Information:\n");
            for facts in &self.crop {
                let _ = writeln!(doc, "- Crop: {}", facts.crop);
                let _ = writeln!(doc, "  - Residue Type: {}", facts.residue_type);
                let _ = writeln!(doc, "  - Residue Ratio: {}", fmt_num(facts.residue_ratio));
                let _ = writeln!(
                    doc,
                    "  - Nutrients (N-P-K %): {}-{}-{}",
                    fmt_num(facts.nutrient_n),
                    fmt_num(facts.nutrient_p),
                    fmt_num(facts.nutrient_k),
                );
                let _ = writeln!(
                    doc,
                    "  - Common Uses: {}",
                    facts.common_use.as_deref().unwrap_or("N/A")
                );
                doc.push('\n');
            }
        }

        if let Some(soil) = &self.soil {
            doc.push_str("## Soil Information:\n");
            let _ = writeln!(doc, "- Soil Type: {}", soil.soil_type);
            let _ = writeln!(
                doc,
                "  - Retention Capacity: {}",
                soil.retention_capacity.as_deref().unwrap_or("N/A")
            );
            doc.push('\n');
        }

        if let Some(region) = &self.region {
            let _ = writeln!(
                doc,
                "## Regional Policy and Limits for {}:",
                self.region_query
            );
            if let Some(ban) = &region.burning_ban {
                let _ = writeln!(doc, "- Burning Ban: {}", ban);
            }
            if let Some(subsidy) = region.compost_subsidy_inr_per_ton {
                let _ = writeln!(doc, "- Compost Subsidy: {} INR per ton", subsidy);
            }
            if let Some(subsidy) = region.biogas_subsidy_pct {
                // Only worth surfacing when the region can actually produce biogas.
                if region.has_biogas_capacity() {
                    let _ = writeln!(doc, "- Biogas Subsidy: {}%", subsidy);
                }
            }
            if let Some(limit) = region.co2_limit_t_per_ha {
                let _ = writeln!(doc, "- CO2 Limit: {} tons per hectare", limit);
            }
            if let Some(limit) = region.biochar_limit_pct {
                let _ = writeln!(doc, "- Biochar Limit: {}%", limit);
            }
            if let Some(level) = usable_level(&region.biogas_limit_level) {
                let _ = writeln!(doc, "- Biogas Production Level: {}", level);
            }
            doc.push('\n');

            self.render_capacities(&mut doc, region);
        }

        doc
    }

    // Capacity ceilings get their own explicit section: these are the
    // values a generation stage is most likely to ignore.
    fn render_capacities(&self, doc: &mut String, region: &RegionFacts) {
        let _ = writeln!(
            doc,
            "## LOCAL CAPACITIES AND DEMAND FOR {} (CRITICAL - USE THESE VALUES):",
            self.region_query
        );
        match region.compost_capacity_t_per_day {
            Some(capacity) => {
                let _ = writeln!(
                    doc,
                    "- LOCAL COMPOSTING FACILITY CAPACITY: {} tons per day",
                    capacity
                );
                let _ = writeln!(
                    doc,
                    "  This means the district can process up to {} tons of compostable material per day.",
                    capacity
                );
                let _ = writeln!(
                    doc,
                    "  When allocating residue for composting, ensure the daily allocation does not exceed {} tons/day.",
                    capacity
                );
            }
            None => {
                doc.push_str("- LOCAL COMPOSTING FACILITY CAPACITY: Not specified in database\n");
            }
        }
        if let Some(level) = usable_level(&region.biogas_limit_level) {
            let _ = writeln!(doc, "- LOCAL BIOGAS PRODUCTION CAPACITY: {} level", level);
        }
        if let Some(limit) = region.biochar_limit_pct {
            let _ = writeln!(
                doc,
                "- LOCAL BIOCHAR PRODUCTION LIMIT: Up to {}% of residue can be allocated to biochar",
                limit
            );
        }
        doc.push('\n');
    }
}

fn fmt_num(value: Option<f64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "N/A".to_string(),
    }
}

fn usable_level(level: &Option<String>) -> Option<&str> {
    level
        .as_deref()
        .filter(|l| !l.is_empty() && *l != "None")
}

/// Collects facts about a crop/region/soil triple into a grounding
/// document.
pub struct ContextAggregator {
    store: Arc<dyn FactStore>,
}

impl ContextAggregator {
    pub fn new(store: Arc<dyn FactStore>) -> Self {
        Self { store }
    }

    /// Query the three fact domains independently and merge the
    /// non-failing results.
    ///
    /// A store error in one domain is logged and treated as "no match";
    /// the other domains still contribute. Returns `None` only when all
    /// three domains came back empty: "no grounding available" is an
    /// observably distinct outcome from a document with zero facts.
    pub async fn gather(&self, crop: &str, region: &str, soil: &str) -> Option<GroundingDocument> {
        let crop_facts = match self.store.crop_facts(crop).await {
            Ok(records) => records,
            Err(e) => {
                warn!(crop, error = %e, "crop fact lookup failed; proceeding without crop facts");
                Vec::new()
            }
        };
        let soil_facts = match self.store.soil_facts(soil).await {
            Ok(record) => record,
            Err(e) => {
                warn!(soil, error = %e, "soil fact lookup failed; proceeding without soil facts");
                None
            }
        };
        let region_facts = match self.store.region_facts(region).await {
            Ok(record) => record,
            Err(e) => {
                warn!(region, error = %e, "region fact lookup failed; proceeding without region facts");
                None
            }
        };

        let document = GroundingDocument {
            region_query: region.to_string(),
            crop: crop_facts,
            soil: soil_facts,
            region: region_facts,
        };

        if document.is_empty() {
            warn!(crop, region, soil, "no grounding available for request");
            return None;
        }

        debug!(
            crop,
            region,
            soil,
            fact_count = document.fact_count(),
            "grounding document assembled"
        );
        Some(document)
    }
}
