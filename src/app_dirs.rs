use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where exported result artifacts land unless overridden on the CLI.
    pub fn results_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let data_dir = PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("shapespan");
            Some(data_dir.join("results"))
        } else {
            ProjectDirs::from("", "", "shapespan")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("results"))
        }
    }
}
