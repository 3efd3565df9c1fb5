use std::time::Duration;

use tracing::{info, warn};

use crate::platform::{Platform, PlatformSignal};
use crate::proctor::monitor::{MonitorOutcome, ViolationMonitor};
use crate::proctor::{ProctoringConfig, ProctoringSession, ViolationEvent, ViolationKind};
use crate::runtime::AppEvent;
use crate::timers::{TimerId, Timers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProctoringPhase {
    Entering,
    Monitoring,
    Terminated,
}

/// Visible "exit attempt N of M" banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Warning {
    pub attempt: u32,
    pub max_attempts: u32,
    pub kind: ViolationKind,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "You {}. Exit attempt {} of {}",
            self.kind, self.attempt, self.max_attempts
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProctoringEvent {
    FullscreenUnavailable(String),
    SignalsUnavailable(String),
    Warning(Warning),
    WarningDismissed,
    ConfirmNavigation,
    Terminated(ViolationEvent),
    /// The termination notice has been shown long enough; leave the assessment
    HandOffRequested,
}

#[derive(Debug, Clone, Copy)]
enum ControllerAction {
    DismissWarning,
    HandOff,
}

/// Owns fullscreen and violation policy for one assessment screen.
///
/// Dropping the controller runs the same cleanup as `unmount`, so every exit
/// path stops monitoring and leaves fullscreen.
#[derive(Debug)]
pub struct ProctoringController<P: Platform> {
    platform: P,
    config: ProctoringConfig,
    monitor: ViolationMonitor,
    session: ProctoringSession,
    phase: ProctoringPhase,
    warning: Option<Warning>,
    warning_timer: Option<TimerId>,
    timers: Timers<ControllerAction>,
    notice: Option<String>,
    leave_prompt: bool,
    handed_off: bool,
    mounted: bool,
}

impl<P: Platform> ProctoringController<P> {
    pub fn new(platform: P, config: ProctoringConfig) -> Self {
        Self {
            platform,
            monitor: ViolationMonitor::new(
                config.max_attempts,
                config.threshold_policy,
                config.reentry_delay,
            ),
            session: ProctoringSession::new(config.max_attempts.max(1)),
            config,
            phase: ProctoringPhase::Entering,
            warning: None,
            warning_timer: None,
            timers: Timers::new(),
            notice: None,
            leave_prompt: false,
            handed_off: false,
            mounted: false,
        }
    }

    /// Requests fullscreen and starts monitoring. Fullscreen is best-effort.
    pub fn mount(&mut self) -> Vec<ProctoringEvent> {
        let mut events = Vec::new();
        if self.mounted {
            return events;
        }
        self.mounted = true;

        if let Err(e) = self.platform.request_fullscreen() {
            warn!(error = %e, "fullscreen unavailable, continuing without it");
            let message = format!("Fullscreen unavailable: {e}");
            self.notice = Some(message.clone());
            events.push(ProctoringEvent::FullscreenUnavailable(message));
        }
        if let Err(e) = self.monitor.start(&mut self.platform) {
            warn!(error = %e, "focus reporting unavailable");
            events.push(ProctoringEvent::SignalsUnavailable(e.to_string()));
        }
        self.phase = ProctoringPhase::Monitoring;
        info!(max_attempts = self.session.max_attempts, "proctoring started");
        events
    }

    /// Feeds a runtime event through the platform's signal mapping
    pub fn handle_event(&mut self, event: &AppEvent) -> Vec<ProctoringEvent> {
        match self.platform.translate(event) {
            Some(signal) => self.handle_signal(signal),
            None => Vec::new(),
        }
    }

    pub fn handle_signal(&mut self, signal: PlatformSignal) -> Vec<ProctoringEvent> {
        let outcomes = self.monitor.handle(signal);
        self.session.violation_count = self.monitor.violation_count();
        if self.phase != ProctoringPhase::Monitoring {
            return Vec::new();
        }

        let mut events = Vec::new();
        for outcome in outcomes {
            match outcome {
                MonitorOutcome::Violation(v) => {
                    let warning = Warning {
                        attempt: v.sequence_number,
                        max_attempts: self.session.max_attempts,
                        kind: v.kind,
                    };
                    self.show_warning(warning);
                    events.push(ProctoringEvent::Warning(warning));
                }
                MonitorOutcome::ConfirmNavigation => {
                    self.leave_prompt = true;
                    events.push(ProctoringEvent::ConfirmNavigation);
                }
                MonitorOutcome::ThresholdExceeded(v) => {
                    self.terminate();
                    events.push(ProctoringEvent::Terminated(v));
                }
            }
        }
        events
    }

    /// Advances warning dismissal, termination hand-off and fullscreen re-entry
    pub fn advance(&mut self, elapsed: Duration) -> Vec<ProctoringEvent> {
        self.monitor.advance(elapsed, &mut self.platform);

        let mut events = Vec::new();
        for action in self.timers.advance(elapsed) {
            match action {
                ControllerAction::DismissWarning => {
                    self.warning_timer = None;
                    if self.warning.take().is_some() {
                        events.push(ProctoringEvent::WarningDismissed);
                    }
                }
                ControllerAction::HandOff => {
                    if !self.handed_off {
                        self.handed_off = true;
                        info!("handing off after proctoring termination");
                        events.push(ProctoringEvent::HandOffRequested);
                    }
                }
            }
        }
        events
    }

    /// Stops monitoring but keeps fullscreen, for screens still shown after the
    /// assessment is over. `unmount` later releases fullscreen.
    pub fn stand_down(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.monitor.stop(&mut self.platform);
        self.timers.clear();
        self.warning = None;
        self.warning_timer = None;
        info!(
            violations = self.session.violation_count,
            terminated = self.session.terminated,
            "proctoring stopped"
        );
    }

    /// Stops monitoring and leaves fullscreen. Runs on every exit path; idempotent.
    pub fn unmount(&mut self) {
        self.stand_down();
        if self.platform.is_fullscreen() {
            if let Err(e) = self.platform.exit_fullscreen() {
                warn!(error = %e, "failed to leave fullscreen");
            }
        }
    }

    pub fn dismiss_leave_prompt(&mut self) {
        self.leave_prompt = false;
    }

    pub fn phase(&self) -> ProctoringPhase {
        self.phase
    }

    pub fn session(&self) -> &ProctoringSession {
        &self.session
    }

    pub fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn leave_prompt(&self) -> bool {
        self.leave_prompt
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn show_warning(&mut self, warning: Warning) {
        if let Some(id) = self.warning_timer.take() {
            self.timers.cancel(id);
        }
        self.warning = Some(warning);
        self.warning_timer = Some(
            self.timers
                .schedule(self.config.warning_dismiss, ControllerAction::DismissWarning),
        );
    }

    fn terminate(&mut self) {
        self.phase = ProctoringPhase::Terminated;
        self.session.terminated = true;
        self.warning = None;
        self.warning_timer = None;
        self.leave_prompt = false;
        self.timers.clear();
        self.monitor.stop(&mut self.platform);
        self.timers
            .schedule(self.config.termination_handoff, ControllerAction::HandOff);
        warn!(
            violations = self.session.violation_count,
            "proctoring threshold reached, terminating assessment"
        );
    }
}

impl<P: Platform> Drop for ProctoringController<P> {
    fn drop(&mut self) {
        self.unmount();
    }
}
