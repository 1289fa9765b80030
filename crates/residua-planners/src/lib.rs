//! Generation-stage implementations for Residua.
//!
//! This crate owns everything between the core pipeline and the
//! external reasoning oracle:
//! - the `Oracle` client abstraction and the Gemini implementation
//! - prompt construction for both generation stages
//! - oracle-response parsing, including the JSON recovery heuristic
//!
//! The stages implement the `CandidateGenerator` / `PlanRefiner` traits
//! from `residua-core`, so the pipeline never sees an oracle directly.

mod generator;
mod gemini;
mod oracle;
mod parse;
mod prompts;
mod refiner;

pub use gemini::{GeminiOracle, GeminiOracleConfig};
pub use generator::LlmCandidateGenerator;
pub use oracle::{MockOracle, Oracle, OracleError, OracleRequest};
pub use refiner::LlmPlanRefiner;

pub(crate) const MAX_PROMPT_LOG_CHARS: usize = 4_000;
pub(crate) const MAX_ORACLE_LOG_CHARS: usize = 8_000;

pub(crate) fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

/// Invocation settings shared by both generation stages.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub model: String,
    pub temperature: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            temperature: 0.2,
        }
    }
}
