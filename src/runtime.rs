use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app loop. Ticks advance the presenter;
/// keys drive every participant-facing wait.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait AppEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event. Err(Timeout) when it
    /// expires with nothing to deliver.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Production event source: a reader thread pumping crossterm events into a
/// channel, so the loop thread stays the single mutator of app state.
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AppEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Test event source fed from a plain channel, for headless tests.
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl AppEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Advances the application one event at a time, falling back to `Tick`
/// every `tick_interval` so timed presentation keeps moving while no keys
/// arrive.
pub struct Runner<E: AppEventSource> {
    event_source: E,
    tick_interval: Duration,
}

impl<E: AppEventSource> Runner<E> {
    pub fn new(event_source: E, tick_interval: Duration) -> Self {
        Self {
            event_source,
            tick_interval,
        }
    }

    /// The tick quantum in milliseconds; the amount of logical time one
    /// `Tick` represents to the presenter.
    pub fn tick_ms(&self) -> u64 {
        self.tick_interval.as_millis() as u64
    }

    /// Blocks up to the tick interval and returns the next event, or Tick on
    /// timeout.
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.tick_interval) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}
