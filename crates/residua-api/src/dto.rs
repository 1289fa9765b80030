use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use residua_core::types::FinalPlan;

/// One allocation request as submitted by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSubmitRequest {
    pub crop_type: String,
    pub crop_yield: f64,
    pub residue_tons: f64,
    pub region: String,
    pub soil_type: String,
}

/// The result envelope returned to callers: the normalized plan plus
/// identifying metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationView {
    pub plan_id: String,
    pub generated_at: DateTime<Utc>,
    pub request: AllocationSubmitRequest,
    pub plan: FinalPlan,
}
