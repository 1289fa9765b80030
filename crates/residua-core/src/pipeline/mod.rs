//! Allocation pipeline
//!
//! Wires the aggregator, the two generation stages and the normalizer
//! into the one sequence a request flows through:
//! gather → generate → refine → normalize.
//!
//! Each request is processed independently; the only shared state is
//! the fact store behind its `Arc`. Grounding unavailability is
//! absorbed here (the stages run with an explicit no-grounding marker).
//! A failure in either generation stage aborts the request: an
//! unrefined plan has not been checked against hard constraints and
//! must never be delivered. No retries: the pipeline fails fast and the
//! caller decides whether to resubmit.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::grounding::ContextAggregator;
use crate::normalizer::normalize;
use crate::planner::{CandidateGenerator, PlanRefiner, StageError};
use crate::store::FactStore;
use crate::types::{AllocationRequest, FinalPlan};

/// Pipeline failures surfaced to the caller, each carrying the stage
/// that failed as the distinguishing reason.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("candidate generation failed: {0}")]
    Generation(#[source] StageError),

    #[error("plan refinement failed: {0}")]
    Refinement(#[source] StageError),
}

/// The allocation pipeline for one deployment: construct once, share
/// across requests.
pub struct AllocationPipeline {
    aggregator: ContextAggregator,
    generator: Arc<dyn CandidateGenerator>,
    refiner: Arc<dyn PlanRefiner>,
}

impl AllocationPipeline {
    pub fn new(
        store: Arc<dyn FactStore>,
        generator: Arc<dyn CandidateGenerator>,
        refiner: Arc<dyn PlanRefiner>,
    ) -> Self {
        Self {
            aggregator: ContextAggregator::new(store),
            generator,
            refiner,
        }
    }

    /// Run one request through the full pipeline.
    pub async fn allocate(&self, request: &AllocationRequest) -> Result<FinalPlan, PipelineError> {
        let grounding = self
            .aggregator
            .gather(&request.crop, &request.region, &request.soil)
            .await;
        match &grounding {
            Some(doc) => info!(
                crop = %request.crop,
                region = %request.region,
                fact_count = doc.fact_count(),
                "grounding assembled"
            ),
            None => warn!(
                crop = %request.crop,
                region = %request.region,
                "proceeding without grounding"
            ),
        }

        let initial = self
            .generator
            .generate(request, grounding.as_ref())
            .await
            .map_err(PipelineError::Generation)?;
        info!(
            entries = initial.allocation.len(),
            confidence = initial.confidence.unwrap_or_default(),
            "initial candidate plan received"
        );

        let refined = self
            .refiner
            .refine(&initial, request, grounding.as_ref())
            .await
            .map_err(PipelineError::Refinement)?;
        info!(entries = refined.allocation.len(), "refined plan received");

        Ok(normalize(refined, request.residue_tons))
    }
}
