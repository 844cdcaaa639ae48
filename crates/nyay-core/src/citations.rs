use std::sync::OnceLock;

use regex::Regex;

/// Most citations kept per round.
pub const MAX_CITATIONS: usize = 3;

// Label, a whole-token numbered or roman designator with optional sub-clauses, up to two
// trailing acronyms (BNS, CPC, ...), then an optional "of the <Act>" tail.
const CITATION_PATTERN: &str = r"\b(?:Section|Article|Order|Rule)\s+(?:\d+[A-Za-z]?|[IVXLCDM]+)\b(?:\(\w+\))*(?:\s+[A-Z]{2,}[A-Za-z]*){0,2}(?:\s+of\s+the\s+[A-Z][\w]*(?:\s+[A-Z][\w]*){0,5}(?:,\s*\d{4})?)?";

#[allow(clippy::expect_used)]
fn citation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CITATION_PATTERN).expect("citation pattern compiles"))
}

/// Pull up to [`MAX_CITATIONS`] distinct statute-like references out of a speech,
/// in order of first appearance.
pub fn extract_citations(speech: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in citation_regex().find_iter(speech) {
        let cite = m.as_str().trim().trim_end_matches([',', '.', ';', ':']).to_string();
        if found.iter().any(|c| c == &cite) {
            continue;
        }
        found.push(cite);
        if found.len() == MAX_CITATIONS {
            break;
        }
    }
    found
}

/// Whether `s` starts with one of the recognised citation labels followed by
/// at least one token.
pub fn looks_like_citation(s: &str) -> bool {
    let mut parts = s.splitn(2, char::is_whitespace);
    let label = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default().trim();
    matches!(label, "Section" | "Article" | "Order" | "Rule") && !rest.is_empty()
}
