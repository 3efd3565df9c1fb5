use std::time::Duration;

use chrono::Local;
use tracing::{debug, warn};

use crate::error::PlatformError;
use crate::platform::{Platform, PlatformSignal};
use crate::proctor::{ThresholdPolicy, ViolationEvent, ViolationKind};
use crate::timers::{TimerId, Timers};

/// What the monitor reports for a signal; policy is left to the caller
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorOutcome {
    Violation(ViolationEvent),
    ThresholdExceeded(ViolationEvent),
    /// The host should ask the candidate to confirm leaving
    ConfirmNavigation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MonitorState {
    Idle,
    Observing,
    /// Threshold reached: counting continues, reactions do not
    Suspended,
    Stopped,
}

#[derive(Debug, Clone, Copy)]
enum MonitorAction {
    ReenterFullscreen,
}

#[derive(Debug)]
pub struct ViolationMonitor {
    max_attempts: u32,
    policy: ThresholdPolicy,
    reentry_delay: Duration,
    state: MonitorState,
    count: u32,
    timers: Timers<MonitorAction>,
    reentry: Option<TimerId>,
}

impl ViolationMonitor {
    pub fn new(max_attempts: u32, policy: ThresholdPolicy, reentry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            policy,
            reentry_delay,
            state: MonitorState::Idle,
            count: 0,
            timers: Timers::new(),
            reentry: None,
        }
    }

    /// Begins observing. Monitoring is active even if the platform cannot
    /// deliver focus signals; that failure is returned for the caller to surface.
    pub fn start<P: Platform + ?Sized>(&mut self, platform: &mut P) -> Result<(), PlatformError> {
        if matches!(self.state, MonitorState::Observing | MonitorState::Suspended) {
            debug!("violation monitor already started");
            return Ok(());
        }
        self.state = MonitorState::Observing;
        platform.watch_signals()
    }

    /// Unregisters observers and cancels pending re-entry. Safe to call repeatedly.
    pub fn stop<P: Platform + ?Sized>(&mut self, platform: &mut P) {
        if matches!(self.state, MonitorState::Idle | MonitorState::Stopped) {
            return;
        }
        self.cancel_reentry();
        self.timers.clear();
        platform.unwatch_signals();
        self.state = MonitorState::Stopped;
        debug!(violations = self.count, "violation monitor stopped");
    }

    pub fn violation_count(&self) -> u32 {
        self.count
    }

    pub fn is_active(&self) -> bool {
        self.state == MonitorState::Observing
    }

    pub fn is_suspended(&self) -> bool {
        self.state == MonitorState::Suspended
    }

    pub fn reentry_pending(&self) -> bool {
        self.reentry.is_some_and(|id| self.timers.is_pending(id))
    }

    pub fn handle(&mut self, signal: PlatformSignal) -> Vec<MonitorOutcome> {
        let kind = match signal {
            PlatformSignal::VisibilityHidden => ViolationKind::TabHidden,
            PlatformSignal::FullscreenChanged { active: false } => ViolationKind::FullscreenExit,
            PlatformSignal::UnloadAttempt => ViolationKind::UnloadAttempt,
            PlatformSignal::VisibilityVisible
            | PlatformSignal::FullscreenChanged { active: true } => return Vec::new(),
        };

        match self.state {
            MonitorState::Idle | MonitorState::Stopped => return Vec::new(),
            MonitorState::Suspended => {
                self.count += 1;
                debug!(count = self.count, %kind, "violation after threshold");
                return Vec::new();
            }
            MonitorState::Observing => {}
        }

        self.count += 1;
        let event = ViolationEvent {
            kind,
            occurred_at: Local::now(),
            sequence_number: self.count,
        };
        warn!(
            sequence = event.sequence_number,
            max = self.max_attempts,
            %kind,
            "integrity violation"
        );

        let mut outcomes = Vec::new();
        if self.count >= self.max_attempts {
            if self.policy == ThresholdPolicy::Both {
                outcomes.push(MonitorOutcome::Violation(event.clone()));
            }
            outcomes.push(MonitorOutcome::ThresholdExceeded(event));
            self.cancel_reentry();
            self.state = MonitorState::Suspended;
            return outcomes;
        }

        outcomes.push(MonitorOutcome::Violation(event));
        match kind {
            ViolationKind::FullscreenExit => {
                self.cancel_reentry();
                self.reentry = Some(
                    self.timers
                        .schedule(self.reentry_delay, MonitorAction::ReenterFullscreen),
                );
            }
            ViolationKind::UnloadAttempt => outcomes.push(MonitorOutcome::ConfirmNavigation),
            ViolationKind::TabHidden => {}
        }
        outcomes
    }

    /// Runs scheduled re-entry attempts that have come due
    pub fn advance<P: Platform + ?Sized>(&mut self, elapsed: Duration, platform: &mut P) {
        for action in self.timers.advance(elapsed) {
            match action {
                MonitorAction::ReenterFullscreen => {
                    self.reentry = None;
                    if self.state != MonitorState::Observing {
                        continue;
                    }
                    debug!("re-requesting fullscreen");
                    if let Err(e) = platform.request_fullscreen() {
                        warn!(error = %e, "fullscreen re-entry failed");
                    }
                }
            }
        }
    }

    fn cancel_reentry(&mut self) {
        if let Some(id) = self.reentry.take() {
            self.timers.cancel(id);
        }
    }
}
