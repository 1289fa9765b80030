//! Constraint-enforcing refinement stage.

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use residua_core::grounding::GroundingDocument;
use residua_core::planner::{PlanRefiner, StageError};
use residua_core::types::{AllocationRequest, CandidatePlan, Pathway};

use crate::oracle::{Oracle, OracleRequest};
use crate::{parse, prompts, truncate_for_log, StageConfig, MAX_ORACLE_LOG_CHARS, MAX_PROMPT_LOG_CHARS};

/// Oracle-backed plan refiner.
pub struct LlmPlanRefiner<C: Oracle> {
    oracle: C,
    config: StageConfig,
}

impl<C: Oracle> LlmPlanRefiner<C> {
    pub fn new(oracle: C, config: StageConfig) -> Self {
        Self { oracle, config }
    }
}

#[async_trait]
impl<C: Oracle> PlanRefiner for LlmPlanRefiner<C> {
    async fn refine(
        &self,
        initial: &CandidatePlan,
        request: &AllocationRequest,
        grounding: Option<&GroundingDocument>,
    ) -> Result<CandidatePlan, StageError> {
        let initial_json = serde_json::to_string_pretty(initial)
            .map_err(|e| StageError::Parse(format!("initial plan not serializable: {e}")))?;
        let instruction = prompts::refiner_instruction(&initial_json, request, grounding);
        info!(
            model = %self.config.model,
            crop = %request.crop,
            region = %request.region,
            grounded = grounding.is_some(),
            "refinement request prepared"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                instruction = %truncate_for_log(&instruction, MAX_PROMPT_LOG_CHARS),
                "refiner instruction"
            );
        }

        let raw = self
            .oracle
            .complete(OracleRequest {
                system: prompts::REFINER_SYSTEM.to_string(),
                instruction,
                model: self.config.model.clone(),
                temperature: self.config.temperature,
            })
            .await
            .map_err(|e| StageError::Oracle(e.to_string()))?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                oracle_output = %truncate_for_log(&raw, MAX_ORACLE_LOG_CHARS),
                "refiner raw oracle output"
            );
        }

        let mut refined = parse::parse_candidate(&raw)?;
        drop_foreign_pathways(&mut refined, initial);
        info!(entries = refined.allocation.len(), "refined plan parsed");
        Ok(refined)
    }
}

// The refined plan must not contain pathways absent from the initial
// candidate. The instruction forbids it, but the oracle is not trusted:
// offending entries are dropped and the normalizer rescales the rest.
fn drop_foreign_pathways(refined: &mut CandidatePlan, initial: &CandidatePlan) {
    let allowed: HashSet<Pathway> = initial.allocation.iter().map(|e| e.pathway).collect();
    refined.allocation.retain(|entry| {
        let keep = allowed.contains(&entry.pathway);
        if !keep {
            warn!(
                pathway = %entry.pathway,
                "refiner introduced a pathway absent from the initial plan; dropping entry"
            );
        }
        keep
    });
}
