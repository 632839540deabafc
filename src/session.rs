use crate::results::RecordLog;
use crate::shape::{Shape, ShapeCounts};
use serde::{Deserialize, Serialize};

/// Practice sessions repeat on demand; real sessions run a fixed number of
/// rounds and are the ones exported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Practice,
    Real,
}

/// One completed presentation-and-answer cycle. Immutable once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub sequence: Vec<Shape>,
    pub correct_counts: ShapeCounts,
    pub user_answer: ShapeCounts,
}

/// All mutable state of one experiment run. Created by
/// `RoundController::begin_session` and replaced wholesale when a new
/// practice or real session starts; writes go through the round controller
/// and the record log only.
#[derive(Debug)]
pub struct SessionState {
    pub participant_id: String,
    pub mode: Mode,
    pub current_round: u32,
    pub log: RecordLog,
}

impl SessionState {
    pub fn new(mode: Mode, participant_id: String) -> Self {
        Self {
            participant_id,
            mode,
            current_round: 0,
            log: RecordLog::default(),
        }
    }

    pub fn completed_rounds(&self) -> u32 {
        self.log.len() as u32
    }
}
