use crate::{trial::TrialStage, types::Speaker};

/// One scripted argument turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSpec {
    pub stage: TrialStage,
    pub speaker: Speaker,
    /// Label shown to the user, e.g. "Opening Argument".
    pub round_type: &'static str,
    /// Phase label given to the model so it knows where the hearing stands.
    pub role_label: &'static str,
    pub instruction: &'static str,
}

/// The five argument rounds, in hearing order.
pub const ROUNDS: [RoundSpec; 5] = [
    RoundSpec {
        stage: TrialStage::Round1,
        speaker: Speaker::Plaintiff,
        round_type: "Opening Argument",
        role_label: "PLAINTIFF COUNSEL - OPENING ARGUMENT",
        instruction: PLAINTIFF_OPENING,
    },
    RoundSpec {
        stage: TrialStage::Round2,
        speaker: Speaker::Defense,
        round_type: "Rebuttal",
        role_label: "DEFENSE COUNSEL - REBUTTAL",
        instruction: DEFENSE_REBUTTAL,
    },
    RoundSpec {
        stage: TrialStage::Round3,
        speaker: Speaker::Judge,
        round_type: "Judicial Observation",
        role_label: "PRESIDING JUDGE - JUDICIAL OBSERVATION",
        instruction: JUDGE_QUESTION,
    },
    RoundSpec {
        stage: TrialStage::Round4,
        speaker: Speaker::Plaintiff,
        round_type: "Response to Court",
        role_label: "PLAINTIFF COUNSEL - RESPONSE TO THE COURT",
        instruction: PLAINTIFF_RESPONSE,
    },
    RoundSpec {
        stage: TrialStage::Round5,
        speaker: Speaker::Defense,
        round_type: "Closing Argument",
        role_label: "DEFENSE COUNSEL - CLOSING ARGUMENT",
        instruction: DEFENSE_CLOSING,
    },
];

/// System instruction for a persona: the shared advocate grounding plus the
/// persona's own brief.
pub fn persona_instruction(speaker: Speaker) -> String {
    let role = match speaker {
        Speaker::Plaintiff => PLAINTIFF_PERSONA,
        Speaker::Defense => DEFENSE_PERSONA,
        Speaker::Judge => JUDGE_PERSONA,
    };
    format!("{LEGAL_GROUNDING}\n\n{role}")
}

// ── Prompt constants ─────────────────────────────────────────────────────

pub const LEGAL_GROUNDING: &str = "You are part of NyayCourt, a simulated Indian courtroom \
built on the NyayNow legal intelligence engine.

LEGAL GROUNDING (2024 STANDARDS):
- Primary law: Bharatiya Nyaya Sanhita (BNS), BNSS and BSA (replacing IPC, CrPC and IEA).
- Prefer BNS 2024 over IPC 1860 unless the facts clearly predate it; when citing a BNS \
section, mention its IPC equivalent in brackets.
- Grounded in the Constitution of India.

RULES OF ENGAGEMENT:
1. Never make a legal claim without a specific Section, Article, Order or Rule citation.
2. If unsure of a provision, say a specific reference is required instead of inventing one.
3. No generic filler. Be sharp, incisive and direct.";

pub const PLAINTIFF_PERSONA: &str = "ROLE: You are Plaintiff Counsel, a seasoned Senior \
Advocate fighting for the plaintiff. You are persuasive, fact-driven and relentless about \
the relief your client deserves.";

pub const DEFENSE_PERSONA: &str = "ROLE: You are Defense Counsel, a formidable Senior \
Advocate for the defendant. You find every gap in the plaintiff's story and you protect \
your client's rights without concession.";

pub const JUDGE_PERSONA: &str = "ROLE: You are the Presiding Judge. You are impartial, \
exacting and economical with words. You test arguments against the statute and binding \
precedent, not against rhetoric.";

pub const PLAINTIFF_OPENING: &str = "Deliver the opening argument for the plaintiff. \
Establish the material facts, set out the legal basis of the claim, and state clearly the \
relief sought from this Court.";

pub const DEFENSE_REBUTTAL: &str = "Rebut the plaintiff's opening argument. Expose its \
factual and legal weaknesses and lay the groundwork for the defense.";

pub const JUDGE_QUESTION: &str = "Interrupt the proceedings. Ask ONE sharp question that \
challenges the weakest point of the plaintiff's argument, and cite the constitutional or \
procedural provision that makes the point matter.";

pub const PLAINTIFF_RESPONSE: &str = "Respond directly to the question the Court just \
asked. Then redirect the Court to the strength of the plaintiff's case, relying on at least \
one precedent.";

pub const DEFENSE_CLOSING: &str = "Deliver the closing argument for the defense. Dismantle \
every argument the plaintiff has made, invoke your client's rights, and make a final plea \
to the Court.";

pub const SPEECH_FORMAT_RULES: &str = "FORMAT RULES:
- Stay in character for the entire speech.
- Cite 1-2 specific statutory provisions or reported cases.
- Keep it to roughly 120-180 words.
- Open with a courtroom honorific (e.g. \"My Lord\", \"Your Honour\", or for the Judge, \"Counsel\").
- Close with a single punchy line.
- Return ONLY the speech. No headings, stage directions or meta-commentary.";

pub const VERDICT_INSTRUCTION: &str = "All arguments have concluded. Deliver the final \
judgment of this Court.
1. Decide which side argued more convincingly on the record above.
2. Apply the relevant law to the facts.
3. Issue the ruling: exactly \"In favor of Plaintiff\" or \"In favor of Defense\".
4. Estimate the win probability for each side as numbers from 0 to 100 that sum to 100.
5. Name 1-2 key precedents that support the ruling.
6. State the single deciding factor and the final order of the Court.";

pub const VERDICT_FORMAT_RULES: &str = "Respond with ONE JSON object and nothing else, with \
exactly these keys: ruling (string), win_probability_plaintiff (number), \
win_probability_defense (number), judge_summary (string), key_precedents (array of \
strings), deciding_factor (string), final_order (string).";
