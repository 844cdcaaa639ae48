use std::{fmt, sync::Arc};

use tracing::{error, info};

use crate::{
    agent::{CompletionBackend, CompletionRequest},
    citations::extract_citations,
    error::TrialError,
    prompt::{build_round_prompt, build_verdict_prompt, case_block},
    script::{persona_instruction, RoundSpec, ROUNDS},
    types::{CaseContext, Round, Speaker, Transcript, TrialResult, Verdict},
    verdict::{parse_verdict, verdict_schema},
};

/// Default cap on the facts injected into each prompt.
pub const DEFAULT_MAX_CASE_CHARS: usize = 5000;

/// Where a trial run currently stands.
///
/// Linear: `Round1 → … → Round5 → Verdict → Done`. Any working stage may
/// instead move to `Failed`. Both `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialStage {
    Round1,
    Round2,
    Round3,
    Round4,
    Round5,
    Verdict,
    Done,
    Failed,
}

impl TrialStage {
    pub const FIRST: Self = Self::Round1;

    /// The stage that follows a successful step.
    pub fn next(self) -> Self {
        match self {
            Self::Round1 => Self::Round2,
            Self::Round2 => Self::Round3,
            Self::Round3 => Self::Round4,
            Self::Round4 => Self::Round5,
            Self::Round5 => Self::Verdict,
            Self::Verdict => Self::Done,
            Self::Done => Self::Done,
            Self::Failed => Self::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Round1 => "round_1",
            Self::Round2 => "round_2",
            Self::Round3 => "round_3",
            Self::Round4 => "round_4",
            Self::Round5 => "round_5",
            Self::Verdict => "verdict",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TrialStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state owned by one run. Dropped when the run ends.
#[derive(Default)]
struct TrialState {
    transcript: Transcript,
    rounds: Vec<Round>,
}

/// Move `stage` to `Failed` and hand the error back to the caller.
fn abort(stage: &mut TrialStage, error: TrialError) -> TrialError {
    error!(stage = %stage, "trial aborted: {error}");
    *stage = TrialStage::Failed;
    error
}

/// Drives the scripted hearing against a completion backend.
///
/// Holds no per-run state, so one `Trial` can serve any number of
/// concurrent runs.
pub struct Trial {
    backend: Arc<dyn CompletionBackend>,
    max_case_chars: usize,
}

impl Trial {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            max_case_chars: DEFAULT_MAX_CASE_CHARS,
        }
    }

    pub fn with_max_case_chars(mut self, max_chars: usize) -> Self {
        self.max_case_chars = max_chars;
        self
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Run all five rounds and the verdict. All-or-nothing: the first failed
    /// call aborts the run and no rounds are returned.
    pub async fn run(&self, case: &CaseContext) -> Result<TrialResult, TrialError> {
        if !case.has_description() {
            return Err(TrialError::MissingDescription);
        }

        let block = case_block(case, self.max_case_chars);
        let mut state = TrialState::default();
        let mut stage = TrialStage::FIRST;

        info!(
            backend = %self.backend.name(),
            case_title = %case.title(),
            case_type = %case.case_type(),
            "trial started"
        );

        for round in &ROUNDS {
            debug_assert_eq!(round.stage, stage);
            if let Err(e) = self.argue(round, &block, &mut state).await {
                return Err(abort(&mut stage, e));
            }
            stage = stage.next();
        }

        let verdict = match self.deliver_verdict(&block, &state).await {
            Ok(verdict) => verdict,
            Err(e) => return Err(abort(&mut stage, e)),
        };
        stage = stage.next();

        info!(
            stage = %stage,
            rounds = state.rounds.len(),
            ruling = %verdict.ruling.label(),
            "trial complete"
        );

        Ok(TrialResult {
            case_title: case.title().to_string(),
            case_type: case.case_type().to_string(),
            rounds: state.rounds,
            verdict,
        })
    }

    async fn argue(
        &self,
        round: &RoundSpec,
        block: &str,
        state: &mut TrialState,
    ) -> Result<(), TrialError> {
        let request = CompletionRequest::text(
            build_round_prompt(block, &state.transcript, round),
            persona_instruction(round.speaker),
        );
        let speech = self.call(round.stage, &request).await?.trim().to_string();

        info!(stage = %round.stage, speaker = %round.speaker, speech_len = speech.len(), "round argued");

        state.transcript.push(round.speaker, round.round_type, &speech);
        state.rounds.push(Round {
            speaker: round.speaker,
            name: round.speaker.display_name().to_string(),
            round_type: round.round_type.to_string(),
            sections: extract_citations(&speech),
            speech,
        });
        Ok(())
    }

    async fn deliver_verdict(&self, block: &str, state: &TrialState) -> Result<Verdict, TrialError> {
        let request = CompletionRequest::json(
            build_verdict_prompt(block, &state.transcript),
            persona_instruction(Speaker::Judge),
            verdict_schema(),
        );
        let raw = self.call(TrialStage::Verdict, &request).await?;
        parse_verdict(&raw)
    }

    async fn call(&self, stage: TrialStage, request: &CompletionRequest) -> Result<String, TrialError> {
        info!(stage = %stage, prompt_len = request.prompt.len(), "calling completion backend");
        let output = self
            .backend
            .generate(request)
            .await
            .map_err(|source| TrialError::Generation { stage, source })?;
        info!(stage = %stage, output_len = output.len(), "completion received");
        Ok(output)
    }
}
