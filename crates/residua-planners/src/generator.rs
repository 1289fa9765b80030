//! Initial-plan generation stage.

use async_trait::async_trait;
use tracing::{debug, info};

use residua_core::grounding::GroundingDocument;
use residua_core::planner::{CandidateGenerator, StageError};
use residua_core::types::{AllocationRequest, CandidatePlan};

use crate::oracle::{Oracle, OracleRequest};
use crate::{parse, prompts, truncate_for_log, StageConfig, MAX_ORACLE_LOG_CHARS, MAX_PROMPT_LOG_CHARS};

/// Oracle-backed candidate generator.
pub struct LlmCandidateGenerator<C: Oracle> {
    oracle: C,
    config: StageConfig,
}

impl<C: Oracle> LlmCandidateGenerator<C> {
    pub fn new(oracle: C, config: StageConfig) -> Self {
        Self { oracle, config }
    }
}

#[async_trait]
impl<C: Oracle> CandidateGenerator for LlmCandidateGenerator<C> {
    async fn generate(
        &self,
        request: &AllocationRequest,
        grounding: Option<&GroundingDocument>,
    ) -> Result<CandidatePlan, StageError> {
        let instruction = prompts::planner_instruction(request, grounding);
        info!(
            model = %self.config.model,
            crop = %request.crop,
            region = %request.region,
            grounded = grounding.is_some(),
            "candidate generation request prepared"
        );
        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                instruction = %truncate_for_log(&instruction, MAX_PROMPT_LOG_CHARS),
                "planner instruction"
            );
        }

        let raw = self
            .oracle
            .complete(OracleRequest {
                system: prompts::PLANNER_SYSTEM.to_string(),
                instruction,
                model: self.config.model.clone(),
                temperature: self.config.temperature,
            })
            .await
            .map_err(|e| StageError::Oracle(e.to_string()))?;

        if tracing::enabled!(tracing::Level::DEBUG) {
            debug!(
                oracle_output = %truncate_for_log(&raw, MAX_ORACLE_LOG_CHARS),
                "planner raw oracle output"
            );
        }

        let plan = parse::parse_candidate(&raw)?;
        info!(
            entries = plan.allocation.len(),
            confidence = plan.confidence.unwrap_or_default(),
            "candidate plan parsed"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::MockOracle;
    use residua_core::types::Pathway;

    fn request() -> AllocationRequest {
        AllocationRequest {
            crop: "Rice Paddy".to_string(),
            crop_yield: 5000.0,
            residue_tons: 1000.0,
            region: "Thanjavur".to_string(),
            soil: "Alluvial".to_string(),
        }
    }

    #[tokio::test]
    async fn test_generate_parses_strict_json_response() {
        let generator = LlmCandidateGenerator::new(
            MockOracle {
                response: r#"{
                    "allocation": [
                        {"pathway": "Composting", "percentage": 60.0, "tons": 600.0, "reasoning": "subsidy"},
                        {"pathway": "Biogas", "percentage": 40.0, "tons": 400.0, "reasoning": "capacity"}
                    ],
                    "initial_notes": "",
                    "missing_data": "",
                    "confidence": 0.9
                }"#
                .to_string(),
            },
            StageConfig::default(),
        );

        let plan = generator.generate(&request(), None).await.expect("plan");
        assert_eq!(plan.allocation.len(), 2);
        assert_eq!(plan.allocation[0].pathway, Pathway::Composting);
        assert_eq!(plan.confidence, Some(0.9));
    }

    #[tokio::test]
    async fn test_generate_recovers_json_from_prose() {
        let generator = LlmCandidateGenerator::new(
            MockOracle {
                response: "Sure! Here is the plan:\n{\"allocation\": [{\"pathway\": \"Biochar\", \
                           \"percentage\": 100.0, \"tons\": 1000.0}], \"missing_data\": \"\"}\nHope that helps."
                    .to_string(),
            },
            StageConfig::default(),
        );

        let plan = generator.generate(&request(), None).await.expect("plan");
        assert_eq!(plan.allocation[0].pathway, Pathway::Biochar);
    }

    #[tokio::test]
    async fn test_generate_surfaces_parse_failure() {
        let generator = LlmCandidateGenerator::new(
            MockOracle {
                response: "I cannot help with that.".to_string(),
            },
            StageConfig::default(),
        );

        let err = generator.generate(&request(), None).await.unwrap_err();
        assert!(matches!(err, StageError::Parse(_)));
    }
}
