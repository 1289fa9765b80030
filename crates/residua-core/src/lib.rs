//! # Residua Core
//!
//! Core abstractions and deterministic logic for the Residua allocation
//! pipeline.
//!
//! This crate contains:
//! - Pathway / AllocationEntry / CandidatePlan / FinalPlan definitions
//! - FactStore abstraction and the grounding-document aggregator
//! - CandidateGenerator / PlanRefiner stage abstractions
//! - The allocation normalizer and the request pipeline
//!
//! This crate does NOT care about:
//! - Which oracle backend produces candidate plans
//! - Where fact records are loaded from
//! - How results are transported to a caller

pub mod grounding;
pub mod normalizer;
pub mod pipeline;
pub mod planner;
pub mod store;
pub mod types;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::grounding::{ContextAggregator, GroundingDocument};
    pub use crate::normalizer::normalize;
    pub use crate::pipeline::{AllocationPipeline, PipelineError};
    pub use crate::planner::{CandidateGenerator, PlanRefiner, StageError};
    pub use crate::store::{CropFacts, FactStore, RegionFacts, SoilFacts, StoreError};
    pub use crate::types::{
        AllocationEntry, AllocationRequest, CandidatePlan, FinalPlan, Justification, Pathway,
    };
}

// Re-export key types at crate root
pub use grounding::{ContextAggregator, GroundingDocument};
pub use normalizer::normalize;
pub use pipeline::{AllocationPipeline, PipelineError};
pub use planner::{CandidateGenerator, PlanRefiner, StageError};
pub use store::{FactStore, StoreError};
pub use types::{AllocationEntry, AllocationRequest, CandidatePlan, FinalPlan, Pathway};
