//! Instruction construction for the two generation stages.
//!
//! Everything an oracle is allowed to rely on is in the instruction
//! text built here: the user inputs, the grounding document (or an
//! explicit no-grounding marker, never a silent empty string), and the
//! numeric rules the normalizer will later enforce anyway.

use std::fmt::Write;

use residua_core::grounding::GroundingDocument;
use residua_core::types::AllocationRequest;

/// Marker substituted for the grounding block when no grounding was
/// available. Deliberately explicit so the oracle cannot mistake a
/// missing knowledge base for an empty one.
pub(crate) const NO_GROUNDING_MARKER: &str = "No knowledge graph context is available for this \
     request. Do not invent capacities, subsidies or limits; state every assumption under \
     \"missing_data\".";

pub(crate) const PLANNER_SYSTEM: &str = "You are the planner stage in an agricultural residue \
     management system. Generate a scientifically accurate, policy-aware, region-specific \
     allocation plan. Your reasoning MUST strictly follow the knowledge graph context you are \
     given. NEVER fabricate facts.";

pub(crate) const REFINER_SYSTEM: &str = "You are the optimizer stage in an agricultural residue \
     management system. Refine the planner's initial allocation plan, strictly using the \
     knowledge graph context you are given. NEVER fabricate missing information.";

fn grounding_block(grounding: Option<&GroundingDocument>) -> String {
    match grounding {
        Some(doc) => doc.render(),
        None => NO_GROUNDING_MARKER.to_string(),
    }
}

fn push_section(buf: &mut String, title: &str) {
    buf.push_str("=========================================================\n");
    buf.push_str(title);
    buf.push('\n');
    buf.push_str("=========================================================\n");
}

/// Build the initial-plan instruction.
pub(crate) fn planner_instruction(
    request: &AllocationRequest,
    grounding: Option<&GroundingDocument>,
) -> String {
    let mut text = String::new();

    push_section(&mut text, "USER INPUT");
    let _ = writeln!(text, "Crop Type      : {}", request.crop);
    let _ = writeln!(text, "Crop Yield     : {}", request.crop_yield);
    let _ = writeln!(text, "Total Residue  : {}", request.residue_tons);
    let _ = writeln!(text, "Soil Type      : {}", request.soil);
    let _ = writeln!(text, "District       : {}", request.region);
    text.push('\n');

    push_section(&mut text, "KNOWLEDGE GRAPH CONTEXT (STRICT TRUTH SOURCE)");
    text.push_str(&grounding_block(grounding));
    text.push('\n');
    text.push_str(
        "ONLY use the facts above for residue ratios, nutrient values, soil retention, \
         biochar/biogas/compost limits, regional subsidies or bans, and local facility capacity.\n\n",
    );

    push_section(&mut text, "TASK REQUIREMENTS");
    text.push_str(
        "1) Allocate the residue across exactly these pathways and no others:\n   \
         Composting, Biochar, Biogas, Feed_or_Storage.\n",
    );
    text.push_str("2) Justify every allocation with facts from the context above.\n");
    text.push_str(
        "3) Any capacity or policy figure you cite must appear literally in the context. \
         If a fact you need is missing, say so under \"missing_data\" instead of assuming.\n",
    );
    text.push_str("4) Output MUST be STRICT JSON in this exact structure:\n\n");
    text.push_str(
        r#"{
  "allocation": [
    {"pathway": "Composting", "percentage": 0.0, "tons": 0.0, "reasoning": ""},
    {"pathway": "Biochar", "percentage": 0.0, "tons": 0.0, "reasoning": ""},
    {"pathway": "Biogas", "percentage": 0.0, "tons": 0.0, "reasoning": ""},
    {"pathway": "Feed_or_Storage", "percentage": 0.0, "tons": 0.0, "reasoning": ""}
  ],
  "initial_notes": "",
  "missing_data": "",
  "confidence": 0.0
}
"#,
    );
    text.push('\n');
    text.push_str("RULES:\n");
    text.push_str("- Percentages MUST sum to 100.\n");
    let _ = writeln!(
        text,
        "- Tons = (percentage / 100) x {}",
        request.residue_tons
    );
    text.push_str("- No markdown, no explanations, only JSON.\n");

    text
}

/// Build the refinement instruction.
pub(crate) fn refiner_instruction(
    initial_plan_json: &str,
    request: &AllocationRequest,
    grounding: Option<&GroundingDocument>,
) -> String {
    let mut text = String::new();

    push_section(&mut text, "USER INPUT");
    let _ = writeln!(text, "Crop Type      : {}", request.crop);
    let _ = writeln!(text, "Residue Amount : {}", request.residue_tons);
    let _ = writeln!(text, "Soil Type      : {}", request.soil);
    let _ = writeln!(text, "District       : {}", request.region);
    text.push('\n');

    push_section(&mut text, "INITIAL PLAN (from planner stage)");
    text.push_str(initial_plan_json);
    text.push_str("\n\n");

    push_section(&mut text, "KNOWLEDGE GRAPH CONTEXT (STRICT SOURCE OF TRUTH)");
    text.push_str(&grounding_block(grounding));
    text.push('\n');
    text.push_str(
        "Use ONLY the above facts for policy constraints, facility capacities, soil \
         limitations, district-level restrictions and residue chemistry.\n\n",
    );

    push_section(&mut text, "OPTIMIZATION RULES");
    text.push_str("1) Percentages MUST sum to EXACTLY 100.\n");
    let _ = writeln!(
        text,
        "2) Tons MUST = (percentage / 100) x {}.",
        request.residue_tons
    );
    text.push_str("3) Respect all capacity limits present in the context.\n");
    text.push_str("4) Do not use pathways absent from the planner's output.\n");
    text.push_str("5) For missing facts, list them clearly under \"missing_data\".\n");
    text.push_str(
        "6) The final plan must improve environmental sustainability, CO2 reduction, soil \
         carbon, regional alignment and feasibility.\n\n",
    );

    push_section(&mut text, "OUTPUT FORMAT (STRICT JSON ONLY)");
    text.push_str(
        r#"{
  "allocation": [
    {"pathway": "Composting", "percentage": 0.0, "tons": 0.0},
    {"pathway": "Biochar", "percentage": 0.0, "tons": 0.0},
    {"pathway": "Biogas", "percentage": 0.0, "tons": 0.0},
    {"pathway": "Feed_or_Storage", "percentage": 0.0, "tons": 0.0}
  ],
  "justification": {
    "sustainability": "",
    "local_demand": "",
    "co2": ""
  },
  "benefits": [],
  "risks": [],
  "notes": "",
  "detailed_explanation": "",
  "missing_data": ""
}
"#,
    );
    text.push('\n');
    text.push_str("Return ONLY valid JSON. No markdown.\n");

    text
}
