//! Oracle-response parsing.
//!
//! Oracles are asked for strict JSON but occasionally wrap it in stray
//! prose or markdown fences. The recovery heuristic (take the substring
//! from the first `{` to the last `}` and parse that) is deliberate and
//! fixed: stricter parsing would reject currently-valid output, looser
//! parsing risks accepting garbage.

use residua_core::planner::StageError;
use residua_core::types::CandidatePlan;

/// The JSON object embedded in `text`, if any.
pub(crate) fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse an oracle response into a candidate plan: strict parse first,
/// then brace-substring recovery. Failure after recovery is a stage
/// failure, never silently swallowed.
pub(crate) fn parse_candidate(raw: &str) -> Result<CandidatePlan, StageError> {
    match serde_json::from_str(raw) {
        Ok(plan) => Ok(plan),
        Err(strict_err) => {
            let Some(snippet) = extract_json(raw) else {
                return Err(StageError::Parse(format!(
                    "response contained no JSON object: {strict_err}"
                )));
            };
            serde_json::from_str(snippet).map_err(|recovery_err| {
                StageError::Parse(format!(
                    "response was not valid JSON even after recovery: {recovery_err}"
                ))
            })
        }
    }
}
