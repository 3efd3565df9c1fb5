//! Round runners: one task per round kind behind a common contract.
//!
//! Every kind implements [`RoundTask`]; [`RoundBody`] closes the set so the
//! session can dispatch without a scattered match on kind tags. [`RoundRunner`]
//! adds the countdown, the completeness gate, and the single-result guarantee.

pub mod coding;
pub mod communication;
pub mod interview;
pub mod quiz;
pub mod written;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::SubmitError;
use crate::hiring::RoundDescriptor;
use crate::round_timer::{RoundTimer, TimerEvent};

pub use coding::CodingRound;
pub use communication::CommunicationRound;
pub use interview::InterviewRound;
pub use quiz::QuizRound;
pub use written::WrittenRound;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundKind {
    #[strum(serialize = "Screening")]
    Screening,
    #[strum(serialize = "Aptitude")]
    Aptitude,
    #[strum(serialize = "Communication")]
    Communication,
    #[strum(serialize = "Coding")]
    Coding,
    #[strum(serialize = "Technical")]
    Technical,
    #[strum(serialize = "Behavioral")]
    Behavioral,
    #[strum(serialize = "System Design")]
    SystemDesign,
    #[strum(serialize = "Interview")]
    Interview,
}

impl RoundKind {
    pub const ALL: [RoundKind; 8] = [
        RoundKind::Screening,
        RoundKind::Aptitude,
        RoundKind::Communication,
        RoundKind::Coding,
        RoundKind::Technical,
        RoundKind::Behavioral,
        RoundKind::SystemDesign,
        RoundKind::Interview,
    ];

    /// Minimum score to qualify
    pub fn pass_threshold(&self) -> u8 {
        match self {
            RoundKind::Screening => 50,
            RoundKind::Aptitude => 60,
            RoundKind::Communication | RoundKind::Coding => 70,
            RoundKind::Technical | RoundKind::Behavioral => 70,
            RoundKind::SystemDesign | RoundKind::Interview => 75,
        }
    }

    /// Stable storage key, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundKind::Screening => "SCREENING",
            RoundKind::Aptitude => "APTITUDE",
            RoundKind::Communication => "COMMUNICATION",
            RoundKind::Coding => "CODING",
            RoundKind::Technical => "TECHNICAL",
            RoundKind::Behavioral => "BEHAVIORAL",
            RoundKind::SystemDesign => "SYSTEM_DESIGN",
            RoundKind::Interview => "INTERVIEW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str().eq_ignore_ascii_case(s))
    }
}

/// Round-kind-specific payload of a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundDetails {
    Quiz {
        correct: usize,
        answered: usize,
        total: usize,
    },
    Coding {
        passed_tests: usize,
        total_tests: usize,
        runs: usize,
    },
    Communication {
        completed_tasks: usize,
        total_tasks: usize,
        accuracy: u8,
    },
    Written {
        answered: usize,
        total: usize,
        keywords_hit: usize,
        keywords_total: usize,
    },
    Interview {
        questions: usize,
        answered: usize,
        ended_early: Option<String>,
        feedback: Option<String>,
    },
}

/// Normalized outcome of one round; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_kind: RoundKind,
    pub score: u8,
    pub qualified: bool,
    pub feedback: String,
    /// Submitted by time-up rather than by the candidate
    pub forced: bool,
    pub details: RoundDetails,
}

impl RoundResult {
    pub fn graded(kind: RoundKind, score: u8, forced: bool, details: RoundDetails) -> Self {
        let score = score.min(100);
        let threshold = kind.pass_threshold();
        let qualified = score >= threshold;
        let feedback = if qualified {
            format!("{kind} round cleared with {score}% (pass mark {threshold}%).")
        } else {
            format!(
                "{kind} round scored {score}%, below the pass mark of {threshold}%. \
                 Review the material and retry."
            )
        };
        Self {
            round_kind: kind,
            score,
            qualified,
            feedback,
            forced,
            details,
        }
    }
}

/// Edits applied to whichever free-text field has focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edit {
    Char(char),
    Backspace,
    Newline,
    Clear,
}

pub fn apply_edit(buffer: &mut String, edit: Edit) {
    match edit {
        Edit::Char(c) => buffer.push(c),
        Edit::Backspace => {
            buffer.pop();
        }
        Edit::Newline => buffer.push('\n'),
        Edit::Clear => buffer.clear(),
    }
}

/// Contract shared by every round kind
pub trait RoundTask {
    fn kind(&self) -> RoundKind;
    /// (inputs filled, inputs required) for the completeness rule
    fn progress(&self) -> (usize, usize);
    fn is_complete(&self) -> bool {
        let (filled, required) = self.progress();
        filled >= required
    }
    /// Final hook before grading, e.g. closing an interview still in progress
    fn finish(&mut self, _forced: bool) {}
    fn grade(&self) -> (u8, RoundDetails);
    /// Drive any round-internal timers
    fn advance(&mut self, _elapsed: Duration) {}
}

/// Closed set of round implementations
pub enum RoundBody {
    Quiz(QuizRound),
    Coding(CodingRound),
    Communication(CommunicationRound),
    Written(WrittenRound),
    Interview(InterviewRound),
}

impl std::fmt::Debug for RoundBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RoundBody").field(&self.task().kind()).finish()
    }
}

impl RoundBody {
    pub fn task(&self) -> &dyn RoundTask {
        match self {
            RoundBody::Quiz(r) => r,
            RoundBody::Coding(r) => r,
            RoundBody::Communication(r) => r,
            RoundBody::Written(r) => r,
            RoundBody::Interview(r) => r,
        }
    }

    pub fn task_mut(&mut self) -> &mut dyn RoundTask {
        match self {
            RoundBody::Quiz(r) => r,
            RoundBody::Coding(r) => r,
            RoundBody::Communication(r) => r,
            RoundBody::Written(r) => r,
            RoundBody::Interview(r) => r,
        }
    }
}

/// Whether and how the round may be submitted right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Blocked { filled: usize, required: usize },
    Ready,
    /// Time is up; submission is unconditional
    TimeUp,
    Submitted,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerEvent {
    Tick { remaining_seconds: u32 },
    TimeUp,
    Completed(RoundResult),
}

/// Hosts one round instance and produces at most one result
#[derive(Debug)]
pub struct RoundRunner {
    descriptor: RoundDescriptor,
    body: RoundBody,
    timer: RoundTimer,
    auto_submit_on_expiry: bool,
    submitted: bool,
}

impl RoundRunner {
    pub fn new(descriptor: RoundDescriptor, body: RoundBody, auto_submit_on_expiry: bool) -> Self {
        let timer = RoundTimer::from_minutes(descriptor.duration_minutes);
        info!(
            sequence = descriptor.sequence,
            kind = %descriptor.kind,
            minutes = descriptor.duration_minutes,
            "round mounted"
        );
        Self {
            descriptor,
            body,
            timer,
            auto_submit_on_expiry,
            submitted: false,
        }
    }

    pub fn descriptor(&self) -> &RoundDescriptor {
        &self.descriptor
    }

    pub fn kind(&self) -> RoundKind {
        self.body.task().kind()
    }

    pub fn timer(&self) -> &RoundTimer {
        &self.timer
    }

    /// Rebinds the countdown, e.g. when resuming with a different allotment
    pub fn set_remaining(&mut self, seconds: u32) {
        if !self.submitted {
            self.timer.reset(seconds);
        }
    }

    pub fn body(&self) -> &RoundBody {
        &self.body
    }

    /// Mutable access for candidate input; closed once the result exists
    pub fn body_mut(&mut self) -> Option<&mut RoundBody> {
        if self.submitted {
            None
        } else {
            Some(&mut self.body)
        }
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn submission(&self) -> Submission {
        if self.submitted {
            return Submission::Submitted;
        }
        if self.timer.is_expired() {
            return Submission::TimeUp;
        }
        let (filled, required) = self.body.task().progress();
        if self.body.task().is_complete() {
            Submission::Ready
        } else {
            Submission::Blocked { filled, required }
        }
    }

    pub fn submit(&mut self) -> Result<RoundResult, SubmitError> {
        match self.submission() {
            Submission::Submitted => Err(SubmitError::AlreadySubmitted),
            Submission::Blocked { filled, required } => {
                Err(SubmitError::Incomplete { filled, required })
            }
            Submission::Ready => Ok(self.complete(false)),
            Submission::TimeUp => Ok(self.complete(true)),
        }
    }

    pub fn advance(&mut self, elapsed: Duration) -> Vec<RunnerEvent> {
        let mut events = Vec::new();
        if self.submitted {
            return events;
        }
        self.body.task_mut().advance(elapsed);
        for e in self.timer.advance(elapsed) {
            match e {
                TimerEvent::Tick { remaining_seconds } => {
                    events.push(RunnerEvent::Tick { remaining_seconds })
                }
                TimerEvent::Expired => {
                    info!(sequence = self.descriptor.sequence, "round time is up");
                    events.push(RunnerEvent::TimeUp);
                    if self.auto_submit_on_expiry {
                        events.push(RunnerEvent::Completed(self.complete(true)));
                    }
                }
            }
        }
        events
    }

    fn complete(&mut self, forced: bool) -> RoundResult {
        self.submitted = true;
        self.timer.stop();
        let task = self.body.task_mut();
        task.finish(forced);
        let (score, details) = task.grade();
        let result = RoundResult::graded(task.kind(), score, forced, details);
        info!(
            sequence = self.descriptor.sequence,
            score = result.score,
            qualified = result.qualified,
            forced,
            "round submitted"
        );
        result
    }
}
