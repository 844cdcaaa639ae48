use nyay_core::citations::{extract_citations, looks_like_citation, MAX_CITATIONS};

#[test]
fn test_extracts_act_with_year() {
    let cites = extract_citations(
        "My Lord, Section 138 of the Negotiable Instruments Act, 1881. The cheque bounced.",
    );
    assert_eq!(cites, ["Section 138 of the Negotiable Instruments Act, 1881"]);
}

#[test]
fn test_extracts_bare_and_acronym_forms() {
    let cites = extract_citations("Section 103 BNS (formerly Section 302 IPC) and Rule 3 apply.");
    assert_eq!(cites, ["Section 103 BNS", "Section 302 IPC", "Rule 3"]);
}

#[test]
fn test_sub_clauses_are_kept() {
    let cites = extract_citations("Article 19(1)(a) guarantees speech.");
    assert_eq!(cites, ["Article 19(1)(a)"]);
}

#[test]
fn test_duplicates_are_dropped_in_first_seen_order() {
    let cites = extract_citations("Article 21, then Article 14, then Article 21 again.");
    assert_eq!(cites, ["Article 21", "Article 14"]);
}

#[test]
fn test_cap_is_three() {
    let text = "Section 1, Section 2, Section 3, Section 4 and Section 5.";
    let cites = extract_citations(text);
    assert_eq!(cites.len(), MAX_CITATIONS);
    assert_eq!(cites, ["Section 1", "Section 2", "Section 3"]);
}

#[test]
fn test_prose_without_numbers_yields_nothing() {
    assert!(extract_citations("The rule of law and the order of the day.").is_empty());
    assert!(extract_citations("").is_empty());
}

#[test]
fn test_every_extracted_entry_looks_like_a_citation() {
    let text = "Order XXXIX Rule 1 CPC, Section 9 of the Code of Civil Procedure, Article 226.";
    let cites = extract_citations(text);
    assert!(!cites.is_empty());
    assert!(cites.iter().all(|c| looks_like_citation(c)), "{cites:?}");
}

#[test]
fn test_looks_like_citation_rejects_other_labels() {
    assert!(looks_like_citation("Section 5"));
    assert!(!looks_like_citation("Clause 5"));
    assert!(!looks_like_citation("Section"));
}

#[test]
fn test_capitalised_words_after_a_label_are_not_designators() {
    let text = "This Order Dismissing the appeal; the Section Does not apply; Rule Violations abound.";
    assert!(extract_citations(text).is_empty());
}

#[test]
fn test_roman_designator_must_be_a_whole_token() {
    assert_eq!(extract_citations("Order VII Rule 11 applies."), ["Order VII", "Rule 11"]);
    assert!(extract_citations("Order Vacated.").is_empty());
}
