use directories::ProjectDirs;
use std::path::PathBuf;

const APP: &str = "gauntlet";

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// `$HOME/.local/state/gauntlet`, falling back to the platform data dir
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".local").join("state").join(APP))
        } else {
            ProjectDirs::from("", "", APP).map(|proj_dirs| proj_dirs.data_local_dir().to_path_buf())
        }
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("gauntlet.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("gauntlet.log"))
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", APP).map(|proj_dirs| proj_dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_files_share_a_directory() {
        if let (Some(db), Some(log)) = (AppDirs::db_path(), AppDirs::log_path()) {
            assert_eq!(db.parent(), log.parent());
            assert!(db.ends_with("gauntlet.db"));
        }
    }
}
