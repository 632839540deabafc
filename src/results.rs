use crate::error::ExperimentError;
use crate::session::{Mode, RoundRecord, SessionState};
use crate::shape::ShapeCounts;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered list of round records for one session. Sole writer of the
/// records; guards against double submission of a round.
#[derive(Debug, Default)]
pub struct RecordLog {
    records: Vec<RoundRecord>,
}

impl RecordLog {
    /// Append in round order. A second record for the same round index is
    /// rejected and the stored record is left untouched.
    pub fn record(&mut self, record: RoundRecord) -> Result<(), ExperimentError> {
        if self.records.iter().any(|r| r.round == record.round) {
            return Err(ExperimentError::DuplicateRound(record.round));
        }
        self.records.push(record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoundRecord> {
        self.records.iter()
    }

    pub fn get(&self, round: u32) -> Option<&RoundRecord> {
        self.records.iter().find(|r| r.round == round)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRound {
    pub round: u32,
    pub user_answers: ShapeCounts,
    pub correct_counts: ShapeCounts,
}

/// The single artifact written on session completion. Field names are
/// camelCase on the wire; downstream analysis tooling reads them that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub participant_id: String,
    pub mode: Mode,
    pub timestamp: String,
    pub rounds: Vec<ExportRound>,
}

impl ExportDocument {
    /// Pure read of the accumulated session state; never mutates it.
    pub fn build(session: &SessionState, completed_at: DateTime<Local>) -> Self {
        Self {
            participant_id: session.participant_id.clone(),
            mode: session.mode,
            timestamp: completed_at.to_rfc3339(),
            rounds: session
                .log
                .iter()
                .map(|r| ExportRound {
                    round: r.round,
                    user_answers: r.user_answer,
                    correct_counts: r.correct_counts,
                })
                .collect(),
        }
    }
}

/// Write the artifact as pretty JSON named
/// `results_<participantId>_<epoch-millis>.json`.
pub fn write_export(
    doc: &ExportDocument,
    dir: &Path,
    epoch_millis: i64,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!(
        "results_{}_{}.json",
        doc.participant_id, epoch_millis
    ));
    let data = serde_json::to_vec_pretty(doc)?;
    fs::write(&path, data)?;
    Ok(path)
}
