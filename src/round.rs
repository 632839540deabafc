use crate::config::{ModeConfig, DEFAULT_REAL_ROUNDS};
use crate::error::ExperimentError;
use crate::generator;
use crate::presenter::{Frame, Presenter, PresenterEvent};
use crate::session::{Mode, RoundRecord, SessionState};
use crate::shape::{AnswerDraft, Shape, ShapeCounts};
use rand::Rng;

/// Phase dimension of one session. Linear within a round; real sessions
/// terminate in `SessionComplete`, practice cycles back through
/// `AwaitingStimulus` until the participant opts into real mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum RoundPhase {
    Idle,
    AwaitingStimulus,
    Presenting,
    AwaitingAnswer,
    RoundComplete,
    SessionComplete,
}

/// Orchestrates one full round: generate, present, collect the answer,
/// record, then decide between another round and session completion. Sole
/// owner of the session state's mutations.
pub struct RoundController {
    session: Option<SessionState>,
    phase: RoundPhase,
    presenter: Option<Presenter>,
    pending: Option<(Vec<Shape>, ShapeCounts)>,
    rounds_target: Option<u32>,
}

impl RoundController {
    pub fn new() -> Self {
        Self {
            session: None,
            phase: RoundPhase::Idle,
            presenter: None,
            pending: None,
            rounds_target: None,
        }
    }

    /// Start a fresh session, discarding any previous one.
    pub fn begin_session(
        &mut self,
        mode: Mode,
        participant_id: &str,
    ) -> Result<(), ExperimentError> {
        validate_participant_id(participant_id)?;
        if let Some(p) = self.presenter.as_mut() {
            p.abort();
        }
        self.session = Some(SessionState::new(mode, participant_id.to_string()));
        self.presenter = None;
        self.pending = None;
        self.rounds_target = None;
        self.phase = RoundPhase::AwaitingStimulus;
        Ok(())
    }

    /// Generate the next round's sequence and begin presenting it. No-op
    /// unless a round may start in the current phase, or when a real
    /// session has already run its full round count.
    pub fn start_round<R: Rng>(&mut self, cfg: &ModeConfig, rng: &mut R) -> bool {
        if !self.can_start_round(cfg) {
            return false;
        }
        let (sequence, counts) = generator::generate(cfg, rng);
        self.begin_round(sequence, counts, cfg);
        true
    }

    /// Begin a round with a pre-built sequence. `start_round` delegates
    /// here; also the entry point for replaying a known sequence.
    pub fn start_round_with_sequence(&mut self, sequence: Vec<Shape>, cfg: &ModeConfig) -> bool {
        if !self.can_start_round(cfg) {
            return false;
        }
        let counts = ShapeCounts::from_sequence(&sequence);
        self.begin_round(sequence, counts, cfg);
        true
    }

    /// Forward elapsed time to the presenter; on completion the session
    /// moves to answer collection.
    pub fn on_tick(&mut self, elapsed_ms: u64) -> Option<PresenterEvent> {
        if self.phase != RoundPhase::Presenting {
            return None;
        }
        let event = self.presenter.as_mut()?.on_tick(elapsed_ms);
        if let Some(PresenterEvent::Done) = event {
            self.phase = RoundPhase::AwaitingAnswer;
        }
        event
    }

    /// Cancel an in-flight presentation. Nothing is recorded and the round
    /// index is released for the next attempt.
    pub fn abort_round(&mut self) {
        if self.phase != RoundPhase::Presenting {
            return;
        }
        if let Some(p) = self.presenter.as_mut() {
            p.abort();
        }
        self.presenter = None;
        self.pending = None;
        if let Some(session) = self.session.as_mut() {
            session.current_round -= 1;
        }
        self.phase = RoundPhase::AwaitingStimulus;
    }

    /// Validate and record the participant's answer, then decide the next
    /// phase. Validation failures leave the phase (and the session) exactly
    /// as they were so the participant can be re-prompted.
    ///
    /// Rejected outright before a presentation has run to completion:
    /// answer collection strictly follows presentation. Submitting again
    /// after a round completed reaches the log's duplicate guard instead.
    pub fn submit_answer(&mut self, draft: &AnswerDraft) -> Result<RoundPhase, ExperimentError> {
        if matches!(
            self.phase,
            RoundPhase::Idle | RoundPhase::AwaitingStimulus | RoundPhase::Presenting
        ) {
            return Err(ExperimentError::AnswerOutOfPhase(self.phase));
        }
        let user_answer = draft.complete()?;

        let session = self.session.as_mut().expect("submit without a session");
        let (sequence, correct_counts) = self
            .pending
            .clone()
            .expect("submit without a presented round");

        session.log.record(RoundRecord {
            round: session.current_round,
            sequence,
            correct_counts,
            user_answer,
        })?;

        self.phase = match session.mode {
            Mode::Practice => RoundPhase::RoundComplete,
            Mode::Real => {
                let target = self.rounds_target.unwrap_or(DEFAULT_REAL_ROUNDS);
                if session.current_round < target {
                    RoundPhase::RoundComplete
                } else {
                    RoundPhase::SessionComplete
                }
            }
        };
        Ok(self.phase)
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn current_round(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.current_round)
    }

    /// Current presentation frame, if a round is being presented.
    pub fn frame(&self) -> Option<Frame> {
        self.presenter.as_ref().and_then(|p| p.frame())
    }

    fn can_start_round(&self, cfg: &ModeConfig) -> bool {
        let session = match &self.session {
            Some(s) => s,
            None => return false,
        };
        if !matches!(
            self.phase,
            RoundPhase::AwaitingStimulus | RoundPhase::RoundComplete
        ) {
            return false;
        }
        match session.mode {
            Mode::Real => session.current_round < cfg.rounds.unwrap_or(DEFAULT_REAL_ROUNDS),
            Mode::Practice => true,
        }
    }

    fn begin_round(&mut self, sequence: Vec<Shape>, counts: ShapeCounts, cfg: &ModeConfig) {
        let session = self.session.as_mut().expect("checked by can_start_round");
        session.current_round += 1;
        self.rounds_target = cfg.rounds;
        self.presenter = Some(Presenter::start(
            sequence.clone(),
            cfg.display_ms,
            cfg.blank_ms,
        ));
        self.pending = Some((sequence, counts));
        self.phase = RoundPhase::Presenting;
    }
}

impl Default for RoundController {
    fn default() -> Self {
        Self::new()
    }
}

/// Participant ids are 5-10 digits, validated at the boundary before any
/// session state is created.
pub fn validate_participant_id(id: &str) -> Result<(), ExperimentError> {
    let ok = (5..=10).contains(&id.len()) && id.chars().all(|c| c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ExperimentError::InvalidParticipantId(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const PID: &str = "12345";

    fn full_answer(counts: ShapeCounts) -> AnswerDraft {
        AnswerDraft {
            square: Some(counts.square),
            triangle: Some(counts.triangle),
            circle: Some(counts.circle),
        }
    }

    /// Drive the presenter to completion with coarse ticks.
    fn present_to_done(ctl: &mut RoundController) {
        for _ in 0..1000 {
            if ctl.on_tick(500).is_some() {
                return;
            }
        }
        panic!("presentation never completed");
    }

    #[test]
    fn test_begin_session_validates_id() {
        let mut ctl = RoundController::new();
        assert_matches!(
            ctl.begin_session(Mode::Practice, "abc"),
            Err(ExperimentError::InvalidParticipantId(_))
        );
        assert_eq!(ctl.phase(), RoundPhase::Idle);

        ctl.begin_session(Mode::Practice, PID).unwrap();
        assert_eq!(ctl.phase(), RoundPhase::AwaitingStimulus);
        assert_eq!(ctl.current_round(), 0);
    }

    #[test]
    fn test_round_lifecycle_practice() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();
        let mut rng = StdRng::seed_from_u64(11);

        ctl.begin_session(Mode::Practice, PID).unwrap();
        assert!(ctl.start_round(&cfg.practice, &mut rng));
        assert_eq!(ctl.phase(), RoundPhase::Presenting);
        assert_eq!(ctl.current_round(), 1);
        assert!(ctl.frame().is_some());

        present_to_done(&mut ctl);
        assert_eq!(ctl.phase(), RoundPhase::AwaitingAnswer);

        let counts = ctl.session().unwrap().log.get(1);
        assert!(counts.is_none(), "nothing recorded before submission");

        let correct = {
            let (_, c) = ctl.pending.clone().unwrap();
            c
        };
        let phase = ctl.submit_answer(&full_answer(correct)).unwrap();
        assert_eq!(phase, RoundPhase::RoundComplete);
        assert_eq!(ctl.session().unwrap().completed_rounds(), 1);
    }

    #[test]
    fn test_known_sequence_end_to_end() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();

        ctl.begin_session(Mode::Real, PID).unwrap();
        let seq = vec![Shape::Circle, Shape::Square, Shape::Circle];
        assert!(ctl.start_round_with_sequence(seq.clone(), &cfg.real));
        present_to_done(&mut ctl);

        let answer = AnswerDraft {
            square: Some(1),
            triangle: Some(0),
            circle: Some(2),
        };
        let phase = ctl.submit_answer(&answer).unwrap();
        assert_eq!(phase, RoundPhase::RoundComplete);

        let record = ctl.session().unwrap().log.get(1).unwrap();
        assert_eq!(record.sequence, seq);
        assert_eq!(record.correct_counts, ShapeCounts::new(1, 0, 2));
        assert_eq!(record.user_answer, record.correct_counts);

        // Round 2 may start and bumps the index.
        let mut rng = StdRng::seed_from_u64(2);
        assert!(ctl.start_round(&cfg.real, &mut rng));
        assert_eq!(ctl.current_round(), 2);
        assert_eq!(ctl.phase(), RoundPhase::Presenting);
    }

    #[test]
    fn test_incomplete_answer_keeps_phase() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();

        ctl.begin_session(Mode::Practice, PID).unwrap();
        ctl.start_round_with_sequence(vec![Shape::Square], &cfg.practice);
        present_to_done(&mut ctl);

        let draft = AnswerDraft {
            square: Some(1),
            triangle: None,
            circle: Some(0),
        };
        assert_matches!(
            ctl.submit_answer(&draft),
            Err(ExperimentError::IncompleteAnswer(Shape::Triangle))
        );
        assert_eq!(ctl.phase(), RoundPhase::AwaitingAnswer);
        assert_eq!(ctl.session().unwrap().completed_rounds(), 0);
    }

    #[test]
    fn test_double_submission_rejected() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();

        ctl.begin_session(Mode::Practice, PID).unwrap();
        ctl.start_round_with_sequence(vec![Shape::Circle, Shape::Circle], &cfg.practice);
        present_to_done(&mut ctl);

        let answer = AnswerDraft {
            square: Some(0),
            triangle: Some(0),
            circle: Some(2),
        };
        ctl.submit_answer(&answer).unwrap();

        let second = AnswerDraft {
            square: Some(9),
            triangle: Some(9),
            circle: Some(9),
        };
        assert_matches!(
            ctl.submit_answer(&second),
            Err(ExperimentError::DuplicateRound(1))
        );
        let record = ctl.session().unwrap().log.get(1).unwrap();
        assert_eq!(record.user_answer, ShapeCounts::new(0, 0, 2));
    }

    #[test]
    fn test_real_session_terminates_after_round_count() {
        let mut cfg = TimingConfig::default();
        cfg.real.rounds = Some(5);
        let mut ctl = RoundController::new();
        let mut rng = StdRng::seed_from_u64(3);

        ctl.begin_session(Mode::Real, PID).unwrap();
        for round in 1..=5u32 {
            assert!(ctl.start_round(&cfg.real, &mut rng));
            present_to_done(&mut ctl);
            let correct = ctl.pending.clone().unwrap().1;
            let phase = ctl.submit_answer(&full_answer(correct)).unwrap();

            if round < 5 {
                assert_eq!(phase, RoundPhase::RoundComplete, "after round {round}");
            } else {
                assert_eq!(phase, RoundPhase::SessionComplete);
            }
        }

        assert_eq!(ctl.session().unwrap().completed_rounds(), 5);
        // A sixth round must not start.
        assert!(!ctl.start_round(&cfg.real, &mut rng));
    }

    #[test]
    fn test_four_rounds_do_not_complete_a_five_round_session() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();
        let mut rng = StdRng::seed_from_u64(8);

        ctl.begin_session(Mode::Real, PID).unwrap();
        for _ in 0..4 {
            ctl.start_round(&cfg.real, &mut rng);
            present_to_done(&mut ctl);
            let correct = ctl.pending.clone().unwrap().1;
            ctl.submit_answer(&full_answer(correct)).unwrap();
        }
        assert_ne!(ctl.phase(), RoundPhase::SessionComplete);
    }

    #[test]
    fn test_abort_releases_round_index_and_records_nothing() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();

        ctl.begin_session(Mode::Practice, PID).unwrap();
        ctl.start_round_with_sequence(vec![Shape::Triangle, Shape::Circle], &cfg.practice);
        ctl.on_tick(100);
        ctl.abort_round();

        assert_eq!(ctl.phase(), RoundPhase::AwaitingStimulus);
        assert_eq!(ctl.current_round(), 0);
        assert!(ctl.session().unwrap().log.is_empty());
        assert_eq!(ctl.frame(), None);
        // The aborted presenter never reports completion.
        assert_eq!(ctl.on_tick(10_000), None);

        // The next attempt reuses the index.
        ctl.start_round_with_sequence(vec![Shape::Square], &cfg.practice);
        assert_eq!(ctl.current_round(), 1);
    }

    #[test]
    fn test_practice_session_can_repeat() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();

        ctl.begin_session(Mode::Practice, PID).unwrap();
        ctl.start_round_with_sequence(vec![Shape::Circle], &cfg.practice);
        present_to_done(&mut ctl);
        let correct = ctl.pending.clone().unwrap().1;
        ctl.submit_answer(&full_answer(correct)).unwrap();
        assert_eq!(ctl.session().unwrap().completed_rounds(), 1);

        // Repeating practice resets the session wholesale.
        ctl.begin_session(Mode::Practice, PID).unwrap();
        assert_eq!(ctl.current_round(), 0);
        assert!(ctl.session().unwrap().log.is_empty());
        assert_eq!(ctl.phase(), RoundPhase::AwaitingStimulus);
    }

    #[test]
    fn test_submit_rejected_before_presentation_completes() {
        let cfg = TimingConfig::default();
        let mut ctl = RoundController::new();
        let complete = AnswerDraft {
            square: Some(1),
            triangle: Some(0),
            circle: Some(0),
        };

        // No session at all.
        assert_matches!(
            ctl.submit_answer(&complete),
            Err(ExperimentError::AnswerOutOfPhase(RoundPhase::Idle))
        );

        ctl.begin_session(Mode::Practice, PID).unwrap();
        assert_matches!(
            ctl.submit_answer(&complete),
            Err(ExperimentError::AnswerOutOfPhase(RoundPhase::AwaitingStimulus))
        );

        // Mid-presentation, before any tick has been delivered.
        ctl.start_round_with_sequence(vec![Shape::Square], &cfg.practice);
        assert_matches!(
            ctl.submit_answer(&complete),
            Err(ExperimentError::AnswerOutOfPhase(RoundPhase::Presenting))
        );
        assert_eq!(ctl.phase(), RoundPhase::Presenting);
        assert!(ctl.session().unwrap().log.is_empty());

        // The presentation still runs to completion and the same answer is
        // then accepted.
        present_to_done(&mut ctl);
        assert_eq!(
            ctl.submit_answer(&complete).unwrap(),
            RoundPhase::RoundComplete
        );
        assert_eq!(ctl.session().unwrap().completed_rounds(), 1);
    }

    #[test]
    fn test_real_session_without_round_count_uses_default() {
        let mut cfg = TimingConfig::default();
        cfg.real.rounds = None;
        let mut ctl = RoundController::new();
        let mut rng = StdRng::seed_from_u64(17);

        ctl.begin_session(Mode::Real, PID).unwrap();
        let mut last = RoundPhase::Idle;
        for _ in 0..DEFAULT_REAL_ROUNDS {
            assert!(ctl.start_round(&cfg.real, &mut rng));
            present_to_done(&mut ctl);
            let correct = ctl.pending.clone().unwrap().1;
            last = ctl.submit_answer(&full_answer(correct)).unwrap();
        }

        assert_eq!(last, RoundPhase::SessionComplete);
        assert!(!ctl.start_round(&cfg.real, &mut rng));
    }

    #[test]
    fn test_validate_participant_id() {
        assert!(validate_participant_id("12345").is_ok());
        assert!(validate_participant_id("1234567890").is_ok());

        assert!(validate_participant_id("1234").is_err());
        assert!(validate_participant_id("12345678901").is_err());
        assert!(validate_participant_id("12a45").is_err());
        assert!(validate_participant_id("").is_err());
        assert!(validate_participant_id("12 45").is_err());
    }
}
