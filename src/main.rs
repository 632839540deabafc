pub mod app_dirs;
pub mod config;
pub mod error;
pub mod generator;
pub mod presenter;
pub mod results;
pub mod round;
pub mod runtime;
pub mod screen;
pub mod session;
pub mod shape;
pub mod ui;

use crate::{
    app_dirs::AppDirs,
    config::{ConfigStore, FileConfigStore, TimingConfig},
    error::ExperimentError,
    results::{write_export, ExportDocument},
    round::{validate_participant_id, RoundController, RoundPhase},
    runtime::{AppEvent, CrosstermEventSource, Runner},
    screen::{ScreenDef, ScreenId, ScreenMachine},
    session::Mode,
    shape::{AnswerDraft, Shape},
};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    cell::RefCell,
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    rc::Rc,
    time::Duration,
};

const TICK_RATE_MS: u64 = 50;

/// visual short-term-memory test in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Flashes a randomized sequence of shapes one at a time, then asks how many of each you saw. Runs a repeatable practice phase and a fixed-round real phase, and exports the answers as JSON."
)]
pub struct Cli {
    /// prefill the participant id (5-10 digits, still confirmed on screen)
    #[clap(short = 'p', long)]
    participant: Option<String>,

    /// seed for the stimulus generator, for reproducible sequences
    #[clap(long)]
    seed: Option<u64>,

    /// directory for the exported results file
    #[clap(long)]
    results_dir: Option<PathBuf>,

    /// path to a timing configuration file
    #[clap(long)]
    config: Option<PathBuf>,
}

/// Field order of the answer form, matching the export layout.
pub fn answer_fields() -> [Shape; 3] {
    [Shape::Square, Shape::Triangle, Shape::Circle]
}

/// Editing state for the three count fields on the answer screen.
#[derive(Debug, Default)]
pub struct AnswerForm {
    pub draft: AnswerDraft,
    pub selected: usize,
}

impl AnswerForm {
    pub fn selected_shape(&self) -> Shape {
        answer_fields()[self.selected]
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % answer_fields().len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + answer_fields().len() - 1) % answer_fields().len();
    }

    pub fn push_digit(&mut self, digit: u32) {
        let shape = self.selected_shape();
        let current = self.draft.get(shape).unwrap_or(0);
        let next = current * 10 + digit;
        if next <= 999 {
            self.draft.set(shape, Some(next));
        }
    }

    pub fn backspace(&mut self) {
        let shape = self.selected_shape();
        let next = match self.draft.get(shape) {
            Some(v) if v >= 10 => Some(v / 10),
            _ => None,
        };
        self.draft.set(shape, next);
    }

    pub fn clear(&mut self) {
        self.draft.clear();
        self.selected = 0;
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub screens: ScreenMachine,
    pub controller: RoundController,
    pub answer: Rc<RefCell<AnswerForm>>,
    pub timing: TimingConfig,
    pub id_input: String,
    pub flash: Option<String>,
    pub last_export: Option<PathBuf>,
    pub results_dir: PathBuf,
    rng: StdRng,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self, ExperimentError> {
        let store = match &cli.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        let timing = store.load();

        let rng = match cli.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let results_dir = cli
            .results_dir
            .clone()
            .or_else(AppDirs::results_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let answer = Rc::new(RefCell::new(AnswerForm::default()));
        let mut screens = wire_screens(Rc::clone(&answer))?;
        screens.transition(ScreenId::Welcome)?;

        Ok(Self {
            screens,
            controller: RoundController::new(),
            answer,
            timing,
            id_input: cli.participant.clone().unwrap_or_default(),
            flash: None,
            last_export: None,
            results_dir,
            rng,
        })
    }

    fn current_mode(&self) -> Mode {
        self.controller
            .session()
            .map_or(Mode::Practice, |s| s.mode)
    }

    /// Wiring is validated at startup, so runtime transitions cannot fail.
    fn goto(&mut self, id: ScreenId) {
        self.screens
            .transition(id)
            .expect("screen registered at wiring time");
    }

    /// Advance the presenter by one tick's worth of time; when the last
    /// blank interval elapses, move to answer collection.
    pub fn on_tick(&mut self, elapsed_ms: u64) {
        if self.controller.phase() != RoundPhase::Presenting {
            return;
        }
        if self.controller.on_tick(elapsed_ms).is_some() {
            self.flash = None;
            self.goto(ScreenId::Answer);
        }
    }

    fn start_round(&mut self) {
        let cfg = *self.timing.for_mode(self.current_mode());
        if self.controller.start_round(&cfg, &mut self.rng) {
            self.flash = None;
            self.goto(ScreenId::Presenting);
        }
    }

    fn submit_answer(&mut self) {
        let draft = self.answer.borrow().draft;
        match self.controller.submit_answer(&draft) {
            Ok(RoundPhase::RoundComplete) => match self.current_mode() {
                Mode::Practice => self.goto(ScreenId::PracticeComplete),
                Mode::Real => self.goto(ScreenId::NextRound),
            },
            Ok(RoundPhase::SessionComplete) => {
                self.export_session();
                self.goto(ScreenId::SessionComplete);
            }
            Ok(_) => {}
            // Recoverable input errors re-prompt on the same screen.
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    fn export_session(&mut self) {
        let Some(session) = self.controller.session() else {
            return;
        };
        let completed_at = Local::now();
        let doc = ExportDocument::build(session, completed_at);
        match write_export(&doc, &self.results_dir, completed_at.timestamp_millis()) {
            Ok(path) => {
                self.flash = None;
                self.last_export = Some(path);
            }
            Err(e) => self.flash = Some(format!("export failed: {e}")),
        }
    }

    fn confirm_participant_id(&mut self) {
        match validate_participant_id(&self.id_input) {
            Ok(()) => {
                // Validation is repeated inside begin_session; errors here
                // are impossible but surfaced anyway rather than swallowed.
                if let Err(e) = self.controller.begin_session(Mode::Practice, &self.id_input) {
                    self.flash = Some(e.to_string());
                    return;
                }
                self.flash = None;
                self.goto(ScreenId::PracticeIntro);
            }
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    fn begin_mode(&mut self, mode: Mode, intro: ScreenId) {
        match self.controller.begin_session(mode, &self.id_input) {
            Ok(()) => {
                self.flash = None;
                self.goto(intro);
            }
            Err(e) => self.flash = Some(e.to_string()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        let Some(screen) = self.screens.current() else {
            return Flow::Quit;
        };

        match screen {
            ScreenId::Welcome => match key.code {
                KeyCode::Enter | KeyCode::Char(' ') => self.goto(ScreenId::ParticipantId),
                KeyCode::Esc => return Flow::Quit,
                _ => {}
            },
            ScreenId::ParticipantId => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    if self.id_input.len() < 10 {
                        self.id_input.push(c);
                    }
                }
                KeyCode::Backspace => {
                    self.id_input.pop();
                }
                KeyCode::Enter => self.confirm_participant_id(),
                KeyCode::Esc => return Flow::Quit,
                _ => {}
            },
            ScreenId::PracticeIntro | ScreenId::RealIntro | ScreenId::NextRound => match key.code {
                KeyCode::Char(' ') | KeyCode::Enter => self.start_round(),
                KeyCode::Esc => return Flow::Quit,
                _ => {}
            },
            ScreenId::Presenting => {
                // Esc cancels the run; nothing is recorded for it.
                if key.code == KeyCode::Esc {
                    self.controller.abort_round();
                    let intro = match self.current_mode() {
                        Mode::Practice => ScreenId::PracticeIntro,
                        Mode::Real => ScreenId::RealIntro,
                    };
                    self.goto(intro);
                }
            }
            ScreenId::Answer => match key.code {
                KeyCode::Char(c) if c.is_ascii_digit() => {
                    self.answer
                        .borrow_mut()
                        .push_digit(c.to_digit(10).unwrap_or(0));
                }
                KeyCode::Backspace => self.answer.borrow_mut().backspace(),
                KeyCode::Tab | KeyCode::Right | KeyCode::Down => {
                    self.answer.borrow_mut().select_next()
                }
                KeyCode::BackTab | KeyCode::Left | KeyCode::Up => {
                    self.answer.borrow_mut().select_prev()
                }
                KeyCode::Enter => self.submit_answer(),
                KeyCode::Esc => return Flow::Quit,
                _ => {}
            },
            ScreenId::PracticeComplete => match key.code {
                KeyCode::Char('r') => self.begin_mode(Mode::Practice, ScreenId::PracticeIntro),
                KeyCode::Enter | KeyCode::Char('n') => {
                    self.begin_mode(Mode::Real, ScreenId::RealIntro)
                }
                KeyCode::Esc => return Flow::Quit,
                _ => {}
            },
            ScreenId::SessionComplete => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => return Flow::Quit,
                _ => {}
            },
        }
        Flow::Continue
    }
}

/// Register every screen up front; duplicate or missing registrations abort
/// here, before the terminal enters raw mode.
fn wire_screens(answer: Rc<RefCell<AnswerForm>>) -> Result<ScreenMachine, ExperimentError> {
    let mut screens = ScreenMachine::new();

    screens.register(
        ScreenId::Welcome,
        ScreenDef::new(
            "shapespan",
            vec![
                "A short visual memory test.",
                "Shapes will flash on screen one at a time;",
                "afterwards, report how many of each you saw.",
                "",
                "press enter to begin · esc quits",
            ],
        ),
    )?;
    screens.register(
        ScreenId::ParticipantId,
        ScreenDef::new(
            "Participant",
            vec![
                "Enter your participant id (5-10 digits).",
                "press enter to confirm",
            ],
        ),
    )?;
    screens.register(
        ScreenId::PracticeIntro,
        ScreenDef::new(
            "Practice",
            vec![
                "You'll see a short sequence of shapes.",
                "Each shape shows briefly, followed by a pause.",
                "Count the circles, squares and triangles as they appear.",
                "",
                "press space to start a practice round · esc aborts a run",
            ],
        ),
    )?;
    screens.register(ScreenId::Presenting, ScreenDef::new("", vec![]))?;
    screens.register(
        ScreenId::Answer,
        ScreenDef::new("Answer", vec![]).with_on_enter(move || {
            answer.borrow_mut().clear();
        }),
    )?;
    screens.register(
        ScreenId::PracticeComplete,
        ScreenDef::new(
            "Practice round complete",
            vec![
                "press r to repeat practice",
                "press enter to continue to the real test",
            ],
        ),
    )?;
    screens.register(
        ScreenId::RealIntro,
        ScreenDef::new(
            "Real test",
            vec![
                "The real test uses longer sequences over a fixed number of rounds.",
                "Your answers are recorded and exported when the last round ends.",
                "",
                "press space to start round 1",
            ],
        ),
    )?;
    screens.register(
        ScreenId::NextRound,
        ScreenDef::new("Round complete", vec!["press space to start the next round"]),
    )?;
    screens.register(
        ScreenId::SessionComplete,
        ScreenDef::new(
            "Session complete",
            vec!["thank you for participating", "press esc to exit"],
        ),
    )?;

    Ok(screens)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    // Wiring errors abort before the terminal is touched.
    let mut app = App::new(&cli)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let events = CrosstermEventSource::new();
    let runner = Runner::new(events, Duration::from_millis(TICK_RATE_MS));

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(runner.tick_ms()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if let Flow::Quit = app.handle_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}
