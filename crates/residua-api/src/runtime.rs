//! Runtime wiring: config → fact store → oracle → stages → pipeline.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use residua_config::ResiduaConfig;
use residua_core::pipeline::AllocationPipeline;
use residua_core::planner::{CandidateGenerator, PlanRefiner};
use residua_core::store::FactStore;
use residua_core::types::AllocationRequest;
use residua_planners::{
    GeminiOracle, GeminiOracleConfig, LlmCandidateGenerator, LlmPlanRefiner, Oracle, StageConfig,
};
use residua_stores::{load_tables, InMemoryFactStore};

use crate::{AllocationSubmitRequest, AllocationView, ApiError};

/// The assembled allocation service: construct once at process start,
/// share across request handlers.
pub struct AllocationApi {
    store: Arc<InMemoryFactStore>,
    pipeline: AllocationPipeline,
}

impl AllocationApi {
    /// Build the full service from a loaded configuration. Fails fast:
    /// a missing fact source or API key is a startup error, not a
    /// request-time surprise.
    pub fn from_config(config: &ResiduaConfig) -> Result<Self, ApiError> {
        let tables = load_tables(
            &config.data.crop_csv,
            &config.data.soil_csv,
            &config.data.policy_csv,
            &config.data.capacity_csv,
        )
        .map_err(|e| ApiError::Internal(format!("fact ingestion failed: {e}")))?;
        let store = Arc::new(InMemoryFactStore::new(tables));

        let api_key = std::env::var(&config.planner.api_key_env).map_err(|_| {
            ApiError::Internal(format!(
                "environment variable '{}' is not set",
                config.planner.api_key_env
            ))
        })?;
        let oracle: Arc<dyn Oracle> = Arc::new(
            GeminiOracle::new(GeminiOracleConfig {
                api_key,
                model: config.planner.model.clone(),
                endpoint: config.planner.endpoint.clone(),
                timeout_secs: config.planner.timeout_secs,
            })
            .map_err(|e| ApiError::Internal(format!("oracle client init failed: {e}")))?,
        );

        let stage_config = StageConfig {
            model: config.planner.model.clone(),
            temperature: config.planner.temperature,
        };
        let generator = Arc::new(LlmCandidateGenerator::new(oracle.clone(), stage_config.clone()));
        let refiner = Arc::new(LlmPlanRefiner::new(oracle, stage_config));

        info!(model = %config.planner.model, "allocation service assembled");
        Ok(Self::with_stages(store, generator, refiner))
    }

    /// Assemble the service from explicit collaborators. Used by
    /// `from_config` and by tests that substitute stub stages.
    pub fn with_stages(
        store: Arc<InMemoryFactStore>,
        generator: Arc<dyn CandidateGenerator>,
        refiner: Arc<dyn PlanRefiner>,
    ) -> Self {
        let pipeline = AllocationPipeline::new(store.clone() as Arc<dyn FactStore>, generator, refiner);
        Self { store, pipeline }
    }

    /// Run one allocation request through the pipeline.
    pub async fn allocate(
        &self,
        request: AllocationSubmitRequest,
    ) -> Result<AllocationView, ApiError> {
        validate(&request)?;

        let core_request = AllocationRequest {
            crop: request.crop_type.clone(),
            crop_yield: request.crop_yield,
            residue_tons: request.residue_tons,
            region: request.region.clone(),
            soil: request.soil_type.clone(),
        };

        let plan = self
            .pipeline
            .allocate(&core_request)
            .await
            .map_err(|e| ApiError::Unavailable(format!("could not produce an allocation: {e}")))?;

        Ok(AllocationView {
            plan_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            request,
            plan,
        })
    }

    /// Known crop names, for dropdown population.
    pub fn crop_options(&self) -> Vec<String> {
        self.store.crop_names()
    }

    /// Known soil types, for dropdown population.
    pub fn soil_options(&self) -> Vec<String> {
        self.store.soil_names()
    }

    /// Known region names, for dropdown population.
    pub fn region_options(&self) -> Vec<String> {
        self.store.region_names()
    }
}

fn validate(request: &AllocationSubmitRequest) -> Result<(), ApiError> {
    if request.crop_type.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "crop_type must not be empty".to_string(),
        ));
    }
    if request.region.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "region must not be empty".to_string(),
        ));
    }
    if request.soil_type.trim().is_empty() {
        return Err(ApiError::InvalidArgument(
            "soil_type must not be empty".to_string(),
        ));
    }
    if !request.residue_tons.is_finite() || request.residue_tons <= 0.0 {
        return Err(ApiError::InvalidArgument(
            "residue_tons must be a positive number".to_string(),
        ));
    }
    if !request.crop_yield.is_finite() || request.crop_yield < 0.0 {
        return Err(ApiError::InvalidArgument(
            "crop_yield must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use async_trait::async_trait;
    use residua_core::grounding::GroundingDocument;
    use residua_core::planner::StageError;
    use residua_core::store::{CropFacts, SoilFacts};
    use residua_core::types::{AllocationEntry, CandidatePlan, Pathway};
    use residua_planners::{MockOracle, StageConfig};
    use residua_stores::FactTables;

    fn store() -> Arc<InMemoryFactStore> {
        Arc::new(InMemoryFactStore::new(FactTables {
            crops: vec![CropFacts {
                crop: "Rice Paddy".to_string(),
                residue_type: "Straw".to_string(),
                residue_ratio: Some(1.5),
                nutrient_n: Some(0.6),
                nutrient_p: Some(0.1),
                nutrient_k: Some(1.5),
                common_use: Some("Mulch".to_string()),
            }],
            soils: vec![SoilFacts {
                soil_type: "Alluvial".to_string(),
                retention_capacity: Some("High".to_string()),
            }],
            regions: Vec::new(),
        }))
    }

    fn submit_request() -> AllocationSubmitRequest {
        AllocationSubmitRequest {
            crop_type: "Rice Paddy".to_string(),
            crop_yield: 5000.0,
            residue_tons: 1000.0,
            region: "Thanjavur".to_string(),
            soil_type: "Alluvial".to_string(),
        }
    }

    fn skewed_response() -> String {
        r#"{
            "allocation": [
                {"pathway": "Composting", "percentage": 10.0, "tons": 0.0},
                {"pathway": "Biochar", "percentage": 10.0, "tons": 0.0},
                {"pathway": "Biogas", "percentage": 10.0, "tons": 0.0},
                {"pathway": "Feed_or_Storage", "percentage": 10.0, "tons": 0.0}
            ],
            "missing_data": ""
        }"#
        .to_string()
    }

    fn api_with_canned_oracle(response: String) -> AllocationApi {
        let oracle: Arc<dyn residua_planners::Oracle> = Arc::new(MockOracle { response });
        AllocationApi::with_stages(
            store(),
            Arc::new(LlmCandidateGenerator::new(
                oracle.clone(),
                StageConfig::default(),
            )),
            Arc::new(LlmPlanRefiner::new(oracle, StageConfig::default())),
        )
    }

    #[tokio::test]
    async fn test_allocate_returns_normalized_view() {
        let api = api_with_canned_oracle(skewed_response());
        let view = api.allocate(submit_request()).await.expect("allocation");

        let entries = &view.plan.plan().allocation;
        assert_eq!(entries.len(), 4);
        let sum: f64 = entries.iter().map(|e| e.percentage).sum();
        assert!((sum - 100.0).abs() <= 0.1);
        for entry in entries {
            assert!((entry.tons - entry.percentage / 100.0 * 1000.0).abs() <= 0.01);
        }
        assert!(!view.plan_id.is_empty());
        assert_eq!(view.request.crop_type, "Rice Paddy");
    }

    #[tokio::test]
    async fn test_allocate_rejects_invalid_input() {
        let api = api_with_canned_oracle(skewed_response());

        let mut bad = submit_request();
        bad.residue_tons = 0.0;
        let err = api.allocate(bad).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);

        let mut bad = submit_request();
        bad.crop_type = " ".to_string();
        let err = api.allocate(bad).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_stage_failure_maps_to_unavailable() {
        let api = api_with_canned_oracle("not a plan".to_string());
        let err = api.allocate(submit_request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unavailable);
        assert!(err.to_string().contains("could not produce an allocation"));
        assert!(err.to_string().contains("generation"));
    }

    #[tokio::test]
    async fn test_refinement_failure_is_distinguishable() {
        struct GoodGenerator;

        #[async_trait]
        impl CandidateGenerator for GoodGenerator {
            async fn generate(
                &self,
                _request: &AllocationRequest,
                _grounding: Option<&GroundingDocument>,
            ) -> Result<CandidatePlan, StageError> {
                Ok(CandidatePlan {
                    allocation: vec![AllocationEntry::new(Pathway::Composting, 100.0, 0.0)],
                    ..CandidatePlan::default()
                })
            }
        }

        struct FailingRefiner;

        #[async_trait]
        impl PlanRefiner for FailingRefiner {
            async fn refine(
                &self,
                _initial: &CandidatePlan,
                _request: &AllocationRequest,
                _grounding: Option<&GroundingDocument>,
            ) -> Result<CandidatePlan, StageError> {
                Err(StageError::Oracle("timed out".to_string()))
            }
        }

        let api = AllocationApi::with_stages(
            store(),
            Arc::new(GoodGenerator),
            Arc::new(FailingRefiner),
        );
        let err = api.allocate(submit_request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unavailable);
        assert!(err.to_string().contains("refinement"));
    }

    #[test]
    fn test_dropdown_options_come_from_store() {
        let api = api_with_canned_oracle(skewed_response());
        assert_eq!(api.crop_options(), vec!["Rice Paddy"]);
        assert_eq!(api.soil_options(), vec!["Alluvial"]);
        assert!(api.region_options().is_empty());
    }
}
