//! Integrity monitoring for a running assessment.
//!
//! [`monitor::ViolationMonitor`] counts raw violations without deciding policy;
//! [`controller::ProctoringController`] owns the fullscreen lifecycle, turns
//! violations into warnings, and ends the attempt once the threshold is hit.

pub mod controller;
pub mod monitor;

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use controller::{ProctoringController, ProctoringEvent, ProctoringPhase, Warning};
pub use monitor::{MonitorOutcome, ViolationMonitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    #[strum(serialize = "left the assessment window")]
    TabHidden,
    #[strum(serialize = "exited fullscreen")]
    FullscreenExit,
    #[strum(serialize = "tried to leave the assessment")]
    UnloadAttempt,
}

/// One detected integrity breach; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    pub kind: ViolationKind,
    pub occurred_at: DateTime<Local>,
    /// 1-based position within the proctoring session
    pub sequence_number: u32,
}

/// Whether the violation that crosses the threshold is also reported as a plain violation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdPolicy {
    #[default]
    Replace,
    Both,
}

/// Integrity-monitoring state for one assessment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProctoringSession {
    pub violation_count: u32,
    pub max_attempts: u32,
    pub terminated: bool,
}

impl ProctoringSession {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            violation_count: 0,
            max_attempts,
            terminated: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProctoringConfig {
    pub max_attempts: u32,
    pub threshold_policy: ThresholdPolicy,
    pub reentry_delay: Duration,
    pub warning_dismiss: Duration,
    pub termination_handoff: Duration,
}

impl Default for ProctoringConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            threshold_policy: ThresholdPolicy::Replace,
            reentry_delay: Duration::from_secs(1),
            warning_dismiss: Duration::from_secs(5),
            termination_handoff: Duration::from_secs(3),
        }
    }
}
