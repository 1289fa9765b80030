//! Plan type definitions
//!
//! A `CandidatePlan` is an allocation proposal as produced by a generation
//! stage; it carries no numeric guarantees. A `FinalPlan` is a candidate
//! that has passed the normalizer and satisfies the percentage-sum and
//! tons-consistency invariants.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The four residue disposal pathways.
///
/// Serde names match the oracle wire contract exactly; a response naming
/// any other pathway fails deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pathway {
    Composting,
    Biochar,
    Biogas,
    #[serde(rename = "Feed_or_Storage")]
    FeedOrStorage,
}

impl Pathway {
    /// All pathways, in canonical plan order.
    pub const ALL: [Pathway; 4] = [
        Pathway::Composting,
        Pathway::Biochar,
        Pathway::Biogas,
        Pathway::FeedOrStorage,
    ];

    /// The wire name used in oracle instructions and responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Pathway::Composting => "Composting",
            Pathway::Biochar => "Biochar",
            Pathway::Biogas => "Biogas",
            Pathway::FeedOrStorage => "Feed_or_Storage",
        }
    }
}

impl fmt::Display for Pathway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pathway's share of the total residue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub pathway: Pathway,
    /// Share of the total residue, in percent.
    #[serde(default)]
    pub percentage: f64,
    /// Absolute quantity, in tons. Derived from the percentage after
    /// normalization.
    #[serde(default)]
    pub tons: f64,
    /// Per-entry reasoning from the initial generation stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl AllocationEntry {
    pub fn new(pathway: Pathway, percentage: f64, tons: f64) -> Self {
        Self {
            pathway,
            percentage,
            tons,
            reasoning: None,
        }
    }
}

/// Structured justification attached by the refinement stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Justification {
    #[serde(default)]
    pub sustainability: String,
    #[serde(default)]
    pub local_demand: String,
    #[serde(default)]
    pub co2: String,
}

/// An allocation proposal before normalization.
///
/// Both stage output shapes parse into this one type: the initial stage
/// fills `initial_notes` and `confidence`, the refinement stage fills
/// `justification`, `benefits`, `risks`, `notes` and
/// `detailed_explanation`. All free-text fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidatePlan {
    #[serde(default)]
    pub allocation: Vec<AllocationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<Justification>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub benefits: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub initial_notes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detailed_explanation: String,
    /// Facts the oracle could not ground in the provided context. Always
    /// serialized, since its absence is itself a signal.
    #[serde(default)]
    pub missing_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl CandidatePlan {
    /// Sum of declared percentages across all entries.
    pub fn declared_percentage_sum(&self) -> f64 {
        self.allocation.iter().map(|e| e.percentage).sum()
    }

    /// Whether the given pathway appears in this plan.
    pub fn has_pathway(&self, pathway: Pathway) -> bool {
        self.allocation.iter().any(|e| e.pathway == pathway)
    }
}

/// A candidate plan that has passed normalization.
///
/// Only the normalizer constructs this type; holding one is proof that
/// the numeric invariants hold. Serializes transparently as the inner
/// plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinalPlan(pub(crate) CandidatePlan);

impl FinalPlan {
    /// The normalized plan.
    pub fn plan(&self) -> &CandidatePlan {
        &self.0
    }

    /// Consume the wrapper and take the normalized plan.
    pub fn into_inner(self) -> CandidatePlan {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pathway_wire_names_round_trip() {
        for pathway in Pathway::ALL {
            let encoded = serde_json::to_string(&pathway).expect("serialize pathway");
            assert_eq!(encoded, format!("\"{}\"", pathway.as_str()));
            let decoded: Pathway = serde_json::from_str(&encoded).expect("deserialize pathway");
            assert_eq!(decoded, pathway);
        }
    }

    #[test]
    fn test_unknown_pathway_is_rejected() {
        let result: Result<Pathway, _> = serde_json::from_str("\"Incineration\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_planner_shape_parses_into_candidate_plan() {
        let raw = r#"{
            "allocation": [
                {"pathway": "Composting", "percentage": 40.0, "tons": 3000.0, "reasoning": "high compost subsidy"},
                {"pathway": "Biogas", "percentage": 60.0, "tons": 4500.0, "reasoning": ""}
            ],
            "initial_notes": "grounded in regional capacity",
            "missing_data": "",
            "confidence": 0.8
        }"#;
        let plan: CandidatePlan = serde_json::from_str(raw).expect("parse planner output");
        assert_eq!(plan.allocation.len(), 2);
        assert_eq!(plan.confidence, Some(0.8));
        assert!(plan.justification.is_none());
    }

    #[test]
    fn test_refiner_shape_parses_into_candidate_plan() {
        let raw = r#"{
            "allocation": [
                {"pathway": "Feed_or_Storage", "percentage": 100.0, "tons": 500.0}
            ],
            "justification": {"sustainability": "s", "local_demand": "d", "co2": "c"},
            "benefits": ["fodder supply"],
            "risks": [],
            "notes": "n",
            "detailed_explanation": "",
            "missing_data": "soil retention figure"
        }"#;
        let plan: CandidatePlan = serde_json::from_str(raw).expect("parse refiner output");
        assert_eq!(plan.allocation[0].pathway, Pathway::FeedOrStorage);
        assert_eq!(plan.missing_data, "soil retention figure");
        assert_eq!(plan.benefits, vec!["fodder supply".to_string()]);
    }

    #[test]
    fn test_final_plan_serializes_transparently() {
        let plan = CandidatePlan {
            allocation: vec![AllocationEntry::new(Pathway::Biochar, 100.0, 10.0)],
            ..CandidatePlan::default()
        };
        let wrapped = FinalPlan(plan.clone());
        assert_eq!(
            serde_json::to_value(&wrapped).expect("serialize final plan"),
            serde_json::to_value(&plan).expect("serialize candidate plan"),
        );
    }
}
