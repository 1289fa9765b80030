//! Generation-stage abstractions
//!
//! The two generation stages are the only parts of the pipeline backed
//! by an external reasoning oracle:
//! - the candidate generator proposes an initial allocation from the
//!   user inputs and the grounding document;
//! - the plan refiner checks that proposal against hard capacity and
//!   policy constraints and produces the refined candidate.
//!
//! Both are abstracted behind traits so the pipeline can be exercised
//! with deterministic stub stages. Implementations own all prompt
//! construction and response parsing.

use async_trait::async_trait;
use thiserror::Error;

use crate::grounding::GroundingDocument;
use crate::types::{AllocationRequest, CandidatePlan};

/// Stage failure: the oracle call failed, or its response could not be
/// parsed as a structured plan after recovery. A timeout surfaces here
/// as an oracle failure like any other transport error; retry policy
/// belongs to the calling layer, never to a stage.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("oracle call failed: {0}")]
    Oracle(String),

    #[error("could not parse oracle response: {0}")]
    Parse(String),
}

/// Produces the initial allocation proposal.
#[async_trait]
pub trait CandidateGenerator: Send + Sync {
    /// Generate a candidate plan for the request. `grounding` is `None`
    /// when no grounding was available; implementations must pass an
    /// explicit no-grounding marker to the oracle, not an empty string.
    async fn generate(
        &self,
        request: &AllocationRequest,
        grounding: Option<&GroundingDocument>,
    ) -> Result<CandidatePlan, StageError>;
}

/// Refines an initial candidate against capacity and policy constraints.
#[async_trait]
pub trait PlanRefiner: Send + Sync {
    /// Refine the initial candidate. The refined plan must not contain
    /// pathways absent from `initial`.
    async fn refine(
        &self,
        initial: &CandidatePlan,
        request: &AllocationRequest,
        grounding: Option<&GroundingDocument>,
    ) -> Result<CandidatePlan, StageError>;
}
