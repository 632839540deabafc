use crate::error::ExperimentError;
use std::collections::HashMap;

/// The closed set of participant-facing screens. One is visible at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ScreenId {
    Welcome,
    ParticipantId,
    PracticeIntro,
    Presenting,
    Answer,
    PracticeComplete,
    RealIntro,
    NextRound,
    SessionComplete,
}

/// Static content plus an optional on-enter hook, registered once at wiring
/// time. The hook runs exactly once per transition into the screen.
pub struct ScreenDef {
    pub title: &'static str,
    pub instructions: Vec<&'static str>,
    on_enter: Option<Box<dyn FnMut()>>,
}

impl ScreenDef {
    pub fn new(title: &'static str, instructions: Vec<&'static str>) -> Self {
        Self {
            title,
            instructions,
            on_enter: None,
        }
    }

    pub fn with_on_enter(mut self, hook: impl FnMut() + 'static) -> Self {
        self.on_enter = Some(Box::new(hook));
        self
    }
}

/// Memoryless screen switcher: holds the current screen and nothing else.
/// Transitions are driven entirely by the round controller and key handling;
/// there is no transition table because the phase order is linear.
#[derive(Default)]
pub struct ScreenMachine {
    screens: HashMap<ScreenId, ScreenDef>,
    current: Option<ScreenId>,
}

impl ScreenMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a screen before first use. Registering the same id twice is a
    /// wiring bug and aborts startup.
    pub fn register(&mut self, id: ScreenId, def: ScreenDef) -> Result<(), ExperimentError> {
        if self.screens.contains_key(&id) {
            return Err(ExperimentError::DuplicateScreen(id));
        }
        self.screens.insert(id, def);
        Ok(())
    }

    /// Hide the current screen (no-op if none), make `to` current, and run
    /// its on-enter hook once.
    pub fn transition(&mut self, to: ScreenId) -> Result<(), ExperimentError> {
        let def = self
            .screens
            .get_mut(&to)
            .ok_or(ExperimentError::UnknownScreen(to))?;
        self.current = Some(to);
        if let Some(hook) = def.on_enter.as_mut() {
            hook();
        }
        Ok(())
    }

    pub fn current(&self) -> Option<ScreenId> {
        self.current
    }

    pub fn current_def(&self) -> Option<&ScreenDef> {
        self.current.and_then(|id| self.screens.get(&id))
    }
}
