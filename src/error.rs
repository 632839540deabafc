use crate::round::RoundPhase;
use crate::screen::ScreenId;
use crate::shape::Shape;
use thiserror::Error;

/// Errors raised by the experiment flow.
///
/// The screen variants are wiring mistakes and abort startup; the rest are
/// recoverable and re-prompt the participant without touching session state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    #[error("screen {0} is already registered")]
    DuplicateScreen(ScreenId),

    #[error("screen {0} was never registered")]
    UnknownScreen(ScreenId),

    #[error("missing count for {0}")]
    IncompleteAnswer(Shape),

    #[error("round {0} already has a recorded answer")]
    DuplicateRound(u32),

    #[error("no answer expected in the {0} phase")]
    AnswerOutOfPhase(RoundPhase),

    #[error("participant id must be 5-10 digits, got {0:?}")]
    InvalidParticipantId(String),
}
