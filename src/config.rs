use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Round count of the real phase when a config file leaves it unset.
pub const DEFAULT_REAL_ROUNDS: u32 = 5;

/// Timing and sizing parameters for one mode. Changing these affects only
/// the generator's length range and the presenter's intervals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModeConfig {
    pub min_shapes: u32,
    pub max_shapes: u32,
    pub display_ms: u64,
    pub blank_ms: u64,
    /// Fixed round count for real mode; practice repeats on demand. A real
    /// session with `None` here runs `DEFAULT_REAL_ROUNDS` rounds.
    pub rounds: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingConfig {
    pub practice: ModeConfig,
    pub real: ModeConfig,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            practice: ModeConfig {
                min_shapes: 5,
                max_shapes: 10,
                display_ms: 1000,
                blank_ms: 500,
                rounds: None,
            },
            real: ModeConfig {
                min_shapes: 15,
                max_shapes: 25,
                display_ms: 1000,
                blank_ms: 500,
                rounds: Some(DEFAULT_REAL_ROUNDS),
            },
        }
    }
}

impl TimingConfig {
    pub fn for_mode(&self, mode: crate::session::Mode) -> &ModeConfig {
        match mode {
            crate::session::Mode::Practice => &self.practice,
            crate::session::Mode::Real => &self.real,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> TimingConfig;
    fn save(&self, cfg: &TimingConfig) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "shapespan") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("shapespan_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> TimingConfig {
        if let Ok(bytes) = fs::read(&self.path) {
            if let Ok(cfg) = serde_json::from_slice::<TimingConfig>(&bytes) {
                return cfg;
            }
        }
        TimingConfig::default()
    }

    fn save(&self, cfg: &TimingConfig) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).unwrap_or_default();
        fs::write(&self.path, data)
    }
}
