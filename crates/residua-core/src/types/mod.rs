//! Type definitions for allocation requests and plans.

mod plan;
mod request;

pub use plan::{AllocationEntry, CandidatePlan, FinalPlan, Justification, Pathway};
pub use request::AllocationRequest;
