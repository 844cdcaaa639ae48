use std::fmt;

use serde::{Deserialize, Serialize};

// ── Speakers ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Plaintiff,
    Defense,
    Judge,
}

impl Speaker {
    /// Human-facing name shown next to each round.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Plaintiff => "Plaintiff Counsel",
            Self::Defense => "Defense Counsel",
            Self::Judge => "Presiding Judge",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintiff => "plaintiff",
            Self::Defense => "defense",
            Self::Judge => "judge",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Case input ───────────────────────────────────────────────────────────

pub const DEFAULT_CASE_TITLE: &str = "The Instant Case";
pub const DEFAULT_CASE_TYPE: &str = "General Civil/Criminal Matter";
pub const DEFAULT_PLAINTIFF_SIDE: &str = "The Plaintiff / Petitioner";
pub const DEFAULT_DEFENSE_SIDE: &str = "The Defendant / Respondent";

/// Facts and framing for one trial. Read-only for the whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseContext {
    pub title: Option<String>,
    /// Facts of the case. The only required field.
    pub description: String,
    pub case_type: Option<String>,
    pub plaintiff_side: Option<String>,
    pub defense_side: Option<String>,
}

impl CaseContext {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_case_type(mut self, case_type: impl Into<String>) -> Self {
        self.case_type = Some(case_type.into());
        self
    }

    pub fn with_sides(mut self, plaintiff: impl Into<String>, defense: impl Into<String>) -> Self {
        self.plaintiff_side = Some(plaintiff.into());
        self.defense_side = Some(defense.into());
        self
    }

    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }

    pub fn title(&self) -> &str {
        non_blank(&self.title).unwrap_or(DEFAULT_CASE_TITLE)
    }

    pub fn case_type(&self) -> &str {
        non_blank(&self.case_type).unwrap_or(DEFAULT_CASE_TYPE)
    }

    pub fn plaintiff_side(&self) -> &str {
        non_blank(&self.plaintiff_side).unwrap_or(DEFAULT_PLAINTIFF_SIDE)
    }

    pub fn defense_side(&self) -> &str {
        non_blank(&self.defense_side).unwrap_or(DEFAULT_DEFENSE_SIDE)
    }
}

fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ── Transcript ───────────────────────────────────────────────────────────

pub const EMPTY_TRANSCRIPT: &str = "Court is now in session";

#[derive(Debug, Clone)]
struct TranscriptEntry {
    speaker: Speaker,
    round_type: String,
    speech: String,
}

/// Append-only record of every turn spoken so far in one trial.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push(&mut self, speaker: Speaker, round_type: &str, speech: &str) {
        self.entries.push(TranscriptEntry {
            speaker,
            round_type: round_type.to_string(),
            speech: speech.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render every turn under its labeled header, oldest first.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return EMPTY_TRANSCRIPT.to_string();
        }
        let mut s = String::new();
        for entry in &self.entries {
            if !s.is_empty() {
                s.push_str("\n\n");
            }
            s.push_str(&format!(
                "[{} - {}]\n{}",
                entry.speaker.display_name().to_uppercase(),
                entry.round_type,
                entry.speech.trim()
            ));
        }
        s
    }
}

// ── Trial output ─────────────────────────────────────────────────────────

/// One spoken turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub speaker: Speaker,
    pub name: String,
    #[serde(rename = "type")]
    pub round_type: String,
    pub speech: String,
    /// Citation-like substrings pulled out of `speech`.
    pub sections: Vec<String>,
}

pub const RULING_PLAINTIFF: &str = "In favor of Plaintiff";
pub const RULING_DEFENSE: &str = "In favor of Defense";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ruling {
    Plaintiff,
    Defense,
}

impl Ruling {
    pub fn label(self) -> &'static str {
        match self {
            Self::Plaintiff => RULING_PLAINTIFF,
            Self::Defense => RULING_DEFENSE,
        }
    }
}

impl TryFrom<String> for Ruling {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let v = value.trim();
        if v.eq_ignore_ascii_case(RULING_PLAINTIFF) {
            Ok(Self::Plaintiff)
        } else if v.eq_ignore_ascii_case(RULING_DEFENSE) {
            Ok(Self::Defense)
        } else {
            Err(format!(
                "ruling must be \"{RULING_PLAINTIFF}\" or \"{RULING_DEFENSE}\", got \"{v}\""
            ))
        }
    }
}

impl From<Ruling> for String {
    fn from(r: Ruling) -> Self {
        r.label().to_string()
    }
}

/// Structured judgment produced by the final Judge call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub ruling: Ruling,
    pub win_probability_plaintiff: f64,
    pub win_probability_defense: f64,
    pub judge_summary: String,
    pub key_precedents: Vec<String>,
    pub deciding_factor: String,
    pub final_order: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub case_title: String,
    pub case_type: String,
    pub rounds: Vec<Round>,
    pub verdict: Verdict,
}
