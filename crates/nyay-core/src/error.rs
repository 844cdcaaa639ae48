use thiserror::Error;

use crate::trial::TrialStage;

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("case description is required")]
    MissingDescription,

    #[error("completion failed during {stage}: {source:#}")]
    Generation {
        stage: TrialStage,
        #[source]
        source: anyhow::Error,
    },

    #[error("verdict could not be parsed: {reason}")]
    MalformedVerdict { reason: String },
}

impl TrialError {
    /// True when the caller sent bad input, as opposed to an upstream fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MissingDescription)
    }
}
