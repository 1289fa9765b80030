use serde::{Deserialize, Serialize};

/// One allocation request: what to allocate and where.
///
/// Owned exclusively by the request that created it; nothing here is
/// shared or mutated across requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Crop identifier, e.g. "Rice Paddy".
    pub crop: String,
    /// Harvested crop yield, in tons.
    pub crop_yield: f64,
    /// Total residue quantity to allocate, in tons.
    pub residue_tons: f64,
    /// Region (district) identifier, e.g. "Thanjavur".
    pub region: String,
    /// Soil type identifier, e.g. "Alluvial".
    pub soil: String,
}
