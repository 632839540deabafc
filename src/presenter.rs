use crate::shape::Shape;

/// What the presentation screen should show right now.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frame {
    Shape(Shape),
    Blank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresenterEvent {
    /// The final blank interval has elapsed. Emitted exactly once per run,
    /// never after an abort.
    Done,
}

/// Drives the on/off display cycle for one sequence.
///
/// Each position shows its shape for `display_ms`, then a blank for
/// `blank_ms`, in strict alternation. The presenter is advanced by the app's
/// tick loop: `on_tick` consumes elapsed time, carrying leftover across
/// interval boundaries so no interval is skipped or merged. Tests
/// fast-forward by feeding large elapsed values.
#[derive(Debug)]
pub struct Presenter {
    sequence: Vec<Shape>,
    display_ms: u64,
    blank_ms: u64,
    pos: usize,
    in_blank: bool,
    remaining_ms: u64,
    cancelled: bool,
    finished: bool,
    done_reported: bool,
}

impl Presenter {
    pub fn start(sequence: Vec<Shape>, display_ms: u64, blank_ms: u64) -> Self {
        let finished = sequence.is_empty();
        let remaining_ms = if finished { 0 } else { display_ms };
        Self {
            sequence,
            display_ms,
            blank_ms,
            pos: 0,
            in_blank: false,
            remaining_ms,
            cancelled: false,
            finished,
            done_reported: false,
        }
    }

    /// Advance by `elapsed_ms`. Returns `Done` exactly once, after the last
    /// position's blank interval (immediately for an empty sequence).
    pub fn on_tick(&mut self, mut elapsed_ms: u64) -> Option<PresenterEvent> {
        if self.cancelled {
            return None;
        }
        if self.finished {
            return self.report_done();
        }

        while elapsed_ms >= self.remaining_ms {
            elapsed_ms -= self.remaining_ms;
            self.advance();
            if self.finished {
                return self.report_done();
            }
        }
        self.remaining_ms -= elapsed_ms;
        None
    }

    /// Cancel the run. Pending intervals are dropped and `Done` will never
    /// be emitted from here on.
    pub fn abort(&mut self) {
        self.cancelled = true;
    }

    /// Current frame, or `None` once the run has finished or been aborted.
    pub fn frame(&self) -> Option<Frame> {
        if self.cancelled || self.finished {
            return None;
        }
        Some(if self.in_blank {
            Frame::Blank
        } else {
            Frame::Shape(self.sequence[self.pos])
        })
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn advance(&mut self) {
        if self.in_blank {
            self.pos += 1;
            if self.pos == self.sequence.len() {
                self.finished = true;
            } else {
                self.in_blank = false;
                self.remaining_ms = self.display_ms;
            }
        } else {
            self.in_blank = true;
            self.remaining_ms = self.blank_ms;
        }
    }

    fn report_done(&mut self) -> Option<PresenterEvent> {
        if self.done_reported {
            return None;
        }
        self.done_reported = true;
        Some(PresenterEvent::Done)
    }
}
