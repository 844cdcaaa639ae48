use crate::{
    script::{RoundSpec, SPEECH_FORMAT_RULES, VERDICT_FORMAT_RULES, VERDICT_INSTRUCTION},
    types::{CaseContext, Transcript},
};

/// Render the case block injected verbatim into every call of a trial.
///
/// Facts longer than `max_chars` characters are cut on a char boundary.
pub fn case_block(case: &CaseContext, max_chars: usize) -> String {
    let facts = truncate_chars(case.description.trim(), max_chars);
    format!(
        "CASE TITLE: {}\nCASE TYPE: {}\nPLAINTIFF: {}\nDEFENSE: {}\nFACTS OF THE CASE:\n{}",
        case.title(),
        case.case_type(),
        case.plaintiff_side(),
        case.defense_side(),
        facts,
    )
}

/// Build the prompt for one argument round.
///
/// Composes the case block, everything said so far, the phase label, the
/// turn instruction and the speech formatting rules, in that order.
pub fn build_round_prompt(case_block: &str, transcript: &Transcript, round: &RoundSpec) -> String {
    let mut s = String::new();
    push_context(&mut s, case_block, transcript);
    s.push_str(&format!("YOUR ROLE NOW: {}\n\n", round.role_label));
    s.push_str(round.instruction);
    s.push_str("\n\n");
    s.push_str(SPEECH_FORMAT_RULES);
    s
}

pub fn build_verdict_prompt(case_block: &str, transcript: &Transcript) -> String {
    let mut s = String::new();
    push_context(&mut s, case_block, transcript);
    s.push_str("YOUR ROLE NOW: PRESIDING JUDGE - FINAL VERDICT\n\n");
    s.push_str(VERDICT_INSTRUCTION);
    s.push_str("\n\n");
    s.push_str(VERDICT_FORMAT_RULES);
    s
}

fn push_context(s: &mut String, case_block: &str, transcript: &Transcript) {
    s.push_str("## Case\n\n");
    s.push_str(case_block);
    s.push_str("\n\n---\n\n## Proceedings so far\n\n");
    s.push_str(&transcript.render());
    s.push_str("\n\n---\n\n");
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
