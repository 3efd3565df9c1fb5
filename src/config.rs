use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_dirs::AppDirs;
use crate::proctor::{ProctoringConfig, ThresholdPolicy};
use crate::round::interview::InterviewConfig;
use crate::session::{DisqualificationPolicy, SessionPolicy};

/// Persisted settings; CLI flags override them per run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub max_attempts: u32,
    pub threshold_policy: ThresholdPolicy,
    pub warning_dismiss_secs: u64,
    pub reentry_delay_ms: u64,
    pub termination_handoff_secs: u64,
    pub silence_window_ms: u64,
    pub retry_delay_ms: u64,
    pub speech_ms_per_word: u64,
    pub interview_max_questions: usize,
    pub auto_submit_on_expiry: bool,
    pub disqualification_policy: DisqualificationPolicy,
    pub dashboard_url: String,
    pub min_width: u16,
    pub min_height: u16,
    pub require_camera: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            threshold_policy: ThresholdPolicy::Replace,
            warning_dismiss_secs: 5,
            reentry_delay_ms: 1000,
            termination_handoff_secs: 3,
            silence_window_ms: 2000,
            retry_delay_ms: 1000,
            speech_ms_per_word: 250,
            interview_max_questions: 5,
            auto_submit_on_expiry: true,
            disqualification_policy: DisqualificationPolicy::Block,
            dashboard_url: "http://localhost:3000".to_string(),
            min_width: 80,
            min_height: 24,
            require_camera: false,
        }
    }
}

impl From<&Config> for ProctoringConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            threshold_policy: cfg.threshold_policy,
            reentry_delay: Duration::from_millis(cfg.reentry_delay_ms),
            warning_dismiss: Duration::from_secs(cfg.warning_dismiss_secs),
            termination_handoff: Duration::from_secs(cfg.termination_handoff_secs),
        }
    }
}

impl From<&Config> for InterviewConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            silence_window: Duration::from_millis(cfg.silence_window_ms),
            retry_delay: Duration::from_millis(cfg.retry_delay_ms),
            max_questions: cfg.interview_max_questions,
            speech_ms_per_word: cfg.speech_ms_per_word,
        }
    }
}

impl From<&Config> for SessionPolicy {
    fn from(cfg: &Config) -> Self {
        Self {
            disqualification: cfg.disqualification_policy,
            auto_submit_on_expiry: cfg.auto_submit_on_expiry,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("gauntlet_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "ignoring unreadable config"
                );
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
