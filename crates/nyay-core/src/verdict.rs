use serde_json::{json, Value};

use crate::{
    error::TrialError,
    types::{Verdict, RULING_DEFENSE, RULING_PLAINTIFF},
};

/// Response schema handed to the completion backend for the verdict call.
pub fn verdict_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "ruling": { "type": "string", "enum": [RULING_PLAINTIFF, RULING_DEFENSE] },
            "win_probability_plaintiff": { "type": "number" },
            "win_probability_defense": { "type": "number" },
            "judge_summary": { "type": "string" },
            "key_precedents": { "type": "array", "items": { "type": "string" } },
            "deciding_factor": { "type": "string" },
            "final_order": { "type": "string" }
        },
        "required": [
            "ruling",
            "win_probability_plaintiff",
            "win_probability_defense",
            "judge_summary",
            "key_precedents",
            "deciding_factor",
            "final_order"
        ]
    })
}

/// Strictly parse the Judge's final answer.
///
/// The text must be exactly one JSON object; nothing is salvaged from
/// surrounding prose or code fences. Probabilities must lie in 0..=100 and
/// every prose field must be non-blank. The two probabilities are not
/// required to sum to 100.
pub fn parse_verdict(raw: &str) -> Result<Verdict, TrialError> {
    let malformed = |reason: String| TrialError::MalformedVerdict { reason };

    let mut verdict: Verdict = serde_json::from_str(raw.trim()).map_err(|e| malformed(e.to_string()))?;

    for (field, p) in [
        ("win_probability_plaintiff", verdict.win_probability_plaintiff),
        ("win_probability_defense", verdict.win_probability_defense),
    ] {
        if !p.is_finite() || !(0.0..=100.0).contains(&p) {
            return Err(malformed(format!("{field} out of range: {p}")));
        }
    }

    for (field, text) in [
        ("judge_summary", &verdict.judge_summary),
        ("deciding_factor", &verdict.deciding_factor),
        ("final_order", &verdict.final_order),
    ] {
        if text.trim().is_empty() {
            return Err(malformed(format!("{field} is empty")));
        }
    }

    verdict.key_precedents = std::mem::take(&mut verdict.key_precedents)
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(verdict)
}
