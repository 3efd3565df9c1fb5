//! Round sequencing for one assessment attempt.
//!
//! [`AssessmentController`] is the only place that moves between rounds. It
//! mounts a [`RoundRunner`] per round, stops accepting input the moment a
//! result exists, and advances only on an explicit action once the
//! hiring-process collaborator has acknowledged the result.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::content::ContentProvider;
use crate::error::{CollaboratorError, SessionError};
use crate::hiring::{HiringProcess, HiringProcessApi, ProcessStatus, RoundDescriptor};
use crate::navigation::{ExitReason, Handoff, Navigator};
use crate::round::{RoundResult, RoundRunner, RunnerEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    RoundActive,
    RoundCompletedAwaitingAdvance,
    AssessmentComplete,
}

/// What `continue` does after a round the candidate did not qualify in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum DisqualificationPolicy {
    /// Only retry or back-to-dashboard are offered
    #[default]
    Block,
    AllowContinue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub disqualification: DisqualificationPolicy,
    pub auto_submit_on_expiry: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            disqualification: DisqualificationPolicy::Block,
            auto_submit_on_expiry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentSession {
    pub hiring_process_id: String,
    /// Sorted by sequence
    pub rounds: Vec<RoundDescriptor>,
    pub round_count: u32,
    pub current_round_index: usize,
    pub lifecycle_state: LifecycleState,
    pub last_result: Option<RoundResult>,
}

impl AssessmentSession {
    pub fn current_round(&self) -> Option<&RoundDescriptor> {
        self.rounds.get(self.current_round_index)
    }

    pub fn rounds_completed(&self) -> u32 {
        let before = self
            .current_round()
            .map(|r| r.sequence.saturating_sub(1))
            .unwrap_or(0);
        match self.lifecycle_state {
            LifecycleState::RoundActive => before,
            LifecycleState::RoundCompletedAwaitingAdvance => before + 1,
            LifecycleState::AssessmentComplete => self.round_count,
        }
        .min(self.round_count)
    }

    /// Completed rounds over configured rounds, derived from current state
    pub fn progress(&self) -> f64 {
        if self.round_count == 0 {
            return 0.0;
        }
        self.rounds_completed() as f64 / self.round_count as f64
    }

    fn on_last_round(&self) -> bool {
        self.current_round()
            .is_some_and(|r| r.sequence >= self.round_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    /// Terminal: round metadata could not be obtained
    NotFound(String),
    Ended(ExitReason),
}

pub struct AssessmentController<H: HiringProcessApi, N: Navigator> {
    hiring: H,
    navigator: N,
    content: Box<dyn ContentProvider>,
    policy: SessionPolicy,
    status: SessionStatus,
    session: Option<AssessmentSession>,
    runner: Option<RoundRunner>,
    handoff: Option<Handoff>,
    last_error: Option<String>,
}

impl<H: HiringProcessApi, N: Navigator> AssessmentController<H, N> {
    pub fn new(
        hiring: H,
        navigator: N,
        content: Box<dyn ContentProvider>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            hiring,
            navigator,
            content,
            policy,
            status: SessionStatus::NotFound("no hiring process loaded".into()),
            session: None,
            runner: None,
            handoff: None,
            last_error: None,
        }
    }

    /// Resume an existing hiring process
    pub fn load(&mut self, process_id: &str) {
        if self.session.is_some() {
            warn!("assessment already loaded");
            return;
        }
        match self.hiring.get_hiring_process(process_id) {
            Ok(process) => self.adopt(process),
            Err(e) => self.not_found(e.to_string()),
        }
    }

    /// Start a new hiring process from an assessment template
    pub fn start(&mut self, process_type: &str, assessment_id: &str) {
        if self.session.is_some() {
            warn!("assessment already loaded");
            return;
        }
        match self.hiring.start_hiring_process(process_type, assessment_id) {
            Ok(process) => self.adopt(process),
            Err(e) => self.not_found(e.to_string()),
        }
    }

    fn not_found(&mut self, reason: String) {
        error!(%reason, "assessment unavailable");
        self.runner = None;
        self.session = None;
        self.status = SessionStatus::NotFound(reason);
    }

    fn adopt(&mut self, process: HiringProcess) {
        let HiringProcess {
            id,
            mut rounds,
            current_round,
            config_snapshot,
            status,
            ..
        } = process;
        rounds.sort_by_key(|r| r.sequence);
        let round_count = config_snapshot.round_count;
        if round_count == 0 || rounds.is_empty() {
            self.not_found(format!("hiring process {id} has no rounds"));
            return;
        }
        if matches!(
            status,
            ProcessStatus::ExitedForCause | ProcessStatus::Abandoned
        ) {
            self.not_found(format!("hiring process {id} is {status}"));
            return;
        }

        if status == ProcessStatus::Completed || current_round > round_count {
            info!(%id, "assessment already complete");
            self.session = Some(AssessmentSession {
                hiring_process_id: id,
                current_round_index: rounds.len() - 1,
                rounds,
                round_count,
                lifecycle_state: LifecycleState::AssessmentComplete,
                last_result: None,
            });
            self.status = SessionStatus::Active;
            return;
        }

        let Some(index) = rounds.iter().position(|r| r.sequence == current_round) else {
            self.not_found(format!(
                "hiring process {id} has no round {current_round}"
            ));
            return;
        };
        let runner = match self.build_runner(&rounds[index]) {
            Ok(runner) => runner,
            Err(e) => {
                self.not_found(e.to_string());
                return;
            }
        };
        info!(%id, round = current_round, of = round_count, "assessment loaded");
        self.session = Some(AssessmentSession {
            hiring_process_id: id,
            rounds,
            round_count,
            current_round_index: index,
            lifecycle_state: LifecycleState::RoundActive,
            last_result: None,
        });
        self.runner = Some(runner);
        self.status = SessionStatus::Active;
    }

    fn build_runner(&self, descriptor: &RoundDescriptor) -> Result<RoundRunner, SessionError> {
        let body = self.content.build_round(descriptor)?;
        Ok(RoundRunner::new(
            descriptor.clone(),
            body,
            self.policy.auto_submit_on_expiry,
        ))
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn session(&self) -> Option<&AssessmentSession> {
        self.session.as_ref()
    }

    pub fn lifecycle(&self) -> Option<LifecycleState> {
        self.session.as_ref().map(|s| s.lifecycle_state)
    }

    pub fn progress(&self) -> f64 {
        self.session.as_ref().map_or(0.0, AssessmentSession::progress)
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn runner(&self) -> Option<&RoundRunner> {
        self.runner.as_ref()
    }

    /// The active round, only while it accepts input
    pub fn runner_mut(&mut self) -> Option<&mut RoundRunner> {
        if self.status != SessionStatus::Active
            || self.lifecycle() != Some(LifecycleState::RoundActive)
        {
            return None;
        }
        self.runner.as_mut()
    }

    pub fn last_result(&self) -> Option<&RoundResult> {
        self.session.as_ref().and_then(|s| s.last_result.as_ref())
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn handoff(&self) -> Option<&Handoff> {
        self.handoff.as_ref()
    }

    pub fn hiring(&self) -> &H {
        &self.hiring
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Whether `continue` is currently offered
    pub fn can_continue(&self) -> bool {
        let awaiting = self.lifecycle() == Some(LifecycleState::RoundCompletedAwaitingAdvance);
        match self.last_result() {
            Some(result) if awaiting => {
                result.qualified
                    || self.policy.disqualification == DisqualificationPolicy::AllowContinue
            }
            _ => false,
        }
    }

    /// Drives the active round's clock and any round-internal timers
    pub fn advance(&mut self, elapsed: Duration) -> Vec<RunnerEvent> {
        let Some(runner) = self.runner_mut() else {
            return Vec::new();
        };
        let events = runner.advance(elapsed);
        for event in &events {
            if let RunnerEvent::Completed(result) = event {
                self.accept_result(result.clone());
            }
        }
        events
    }

    /// Manual submission of the active round
    pub fn submit_round(&mut self) -> Result<RoundResult, SessionError> {
        self.ensure_active()?;
        let runner = self.runner_mut().ok_or(SessionError::NoActiveRound)?;
        let result = runner.submit()?;
        self.accept_result(result.clone());
        Ok(result)
    }

    fn accept_result(&mut self, result: RoundResult) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        info!(
            kind = %result.round_kind,
            score = result.score,
            qualified = result.qualified,
            "round completed"
        );
        session.lifecycle_state = LifecycleState::RoundCompletedAwaitingAdvance;
        session.last_result = Some(result);
        self.runner = None;
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        match self.status {
            SessionStatus::Active => Ok(()),
            SessionStatus::Ended(_) => Err(SessionError::Ended),
            SessionStatus::NotFound(_) => Err(SessionError::NoActiveRound),
        }
    }

    fn awaiting(&self) -> Result<(&AssessmentSession, RoundResult, RoundDescriptor), SessionError> {
        self.ensure_active()?;
        let session = self.session.as_ref().ok_or(SessionError::NoActiveRound)?;
        if session.lifecycle_state != LifecycleState::RoundCompletedAwaitingAdvance {
            return Err(SessionError::NotAwaitingAdvance);
        }
        let result = session
            .last_result
            .clone()
            .ok_or(SessionError::NotAwaitingAdvance)?;
        let current = session
            .current_round()
            .cloned()
            .ok_or(SessionError::NoActiveRound)?;
        Ok((session, result, current))
    }

    /// Persists the result, then moves to the next round or completes the assessment.
    /// On failure nothing changes and the action can be repeated.
    pub fn continue_to_next(&mut self) -> Result<(), SessionError> {
        let (session, result, current) = self.awaiting()?;
        if !result.qualified && self.policy.disqualification == DisqualificationPolicy::Block {
            return Err(SessionError::Disqualified(result.round_kind));
        }
        let id = session.hiring_process_id.clone();

        if session.on_last_round() {
            self.persist(|h| h.complete_assessment(&id, current.sequence, &result))?;
            if let Some(session) = self.session.as_mut() {
                session.lifecycle_state = LifecycleState::AssessmentComplete;
            }
            info!(%id, "assessment complete");
            self.hand_off(ExitReason::Completed);
            return Ok(());
        }

        let next_index = session.current_round_index + 1;
        let next = session
            .rounds
            .get(next_index)
            .filter(|r| r.sequence == current.sequence + 1)
            .cloned()
            .ok_or_else(|| {
                SessionError::Persist(CollaboratorError::Invalid {
                    id: id.clone(),
                    reason: format!("round {} is missing", current.sequence + 1),
                })
            })?;
        let runner = self.build_runner(&next)?;
        self.persist(|h| h.advance_round(&id, current.sequence, &result))?;

        if let Some(session) = self.session.as_mut() {
            session.current_round_index = next_index;
            session.lifecycle_state = LifecycleState::RoundActive;
            session.last_result = None;
        }
        self.runner = Some(runner);
        info!(%id, round = next.sequence, "advanced to next round");
        Ok(())
    }

    fn persist(
        &mut self,
        write: impl FnOnce(&mut H) -> Result<(), CollaboratorError>,
    ) -> Result<(), SessionError> {
        match write(&mut self.hiring) {
            Ok(()) => {
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "could not persist round result");
                self.last_error = Some(e.to_string());
                Err(SessionError::Persist(e))
            }
        }
    }

    /// Mounts a fresh runner for the round just completed
    pub fn retry_round(&mut self) -> Result<(), SessionError> {
        let (_, _, current) = self.awaiting()?;
        let runner = self.build_runner(&current)?;
        if let Some(session) = self.session.as_mut() {
            session.lifecycle_state = LifecycleState::RoundActive;
            session.last_result = None;
        }
        self.runner = Some(runner);
        info!(round = current.sequence, "retrying round");
        Ok(())
    }

    pub fn return_to_dashboard(&mut self) {
        self.terminate(ExitReason::ReturnedToDashboard);
        self.finish_handoff();
    }

    /// Ends the attempt regardless of lifecycle. Navigation happens separately
    /// through [`Self::finish_handoff`].
    pub fn terminate(&mut self, reason: ExitReason) {
        if self.status != SessionStatus::Active || self.handoff.is_some() {
            return;
        }
        warn!(%reason, "assessment ended");
        self.runner = None;
        self.status = SessionStatus::Ended(reason);
        let Some(id) = self.session.as_ref().map(|s| s.hiring_process_id.clone()) else {
            return;
        };
        if let Err(e) = self.hiring.record_exit(&id, reason) {
            error!(error = %e, "could not record exit");
            self.last_error = Some(e.to_string());
        }
    }

    /// Hands off for the reason the attempt ended with. Safe to call repeatedly.
    pub fn finish_handoff(&mut self) {
        let reason = match self.status {
            SessionStatus::Ended(reason) => reason,
            _ if self.lifecycle() == Some(LifecycleState::AssessmentComplete) => {
                ExitReason::Completed
            }
            _ => return,
        };
        self.hand_off(reason);
    }

    fn hand_off(&mut self, reason: ExitReason) {
        if self.handoff.is_some() {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let handoff = Handoff::dashboard(&session.hiring_process_id, reason);
        if let Err(e) = self.navigator.navigate(&handoff) {
            warn!(error = %e, "hand-off navigation failed");
            self.last_error = Some(e.to_string());
        }
        self.handoff = Some(handoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ContentError, SubmitError};
    use crate::hiring::{AssessmentTemplate, MemoryHiringApi, TemplateRound};
    use crate::navigation::RecordingNavigator;
    use crate::round::quiz::Question;
    use crate::round::{QuizRound, RoundBody, RoundKind};
    use assert_matches::assert_matches;
    use chrono::Local;

    /// Every round is a four-question quiz whose correct option is 0
    struct QuizContent;

    impl ContentProvider for QuizContent {
        fn build_round(&self, d: &RoundDescriptor) -> Result<RoundBody, ContentError> {
            let questions = (0..4)
                .map(|i| Question {
                    prompt: format!("{} q{i}", d.name),
                    options: vec!["right".into(), "wrong".into()],
                    answer: 0,
                    topic: None,
                })
                .collect();
            Ok(RoundBody::Quiz(QuizRound::new(d.kind, questions)))
        }
    }

    type Controller = AssessmentController<MemoryHiringApi, RecordingNavigator>;

    fn template() -> AssessmentTemplate {
        let round = |kind: RoundKind| TemplateRound {
            kind,
            name: kind.to_string(),
            duration_minutes: 5,
        };
        AssessmentTemplate {
            id: "three".into(),
            name: "Three rounds".into(),
            description: String::new(),
            rounds: vec![
                round(RoundKind::Screening),
                round(RoundKind::Aptitude),
                round(RoundKind::Technical),
            ],
        }
    }

    fn controller_at(round: u32, policy: SessionPolicy) -> Controller {
        let mut api = MemoryHiringApi::new(vec![template()]);
        let mut process =
            HiringProcess::from_template("hp-1".into(), "practice", &template(), Local::now());
        process.current_round = round;
        api.insert(process);
        let mut c = Controller::new(api, RecordingNavigator::new(), Box::new(QuizContent), policy);
        c.load("hp-1");
        c
    }

    /// Answer `correct` of the four questions correctly and submit
    fn finish_round(c: &mut Controller, correct: usize) -> RoundResult {
        let runner = c.runner_mut().unwrap();
        let Some(RoundBody::Quiz(quiz)) = runner.body_mut() else {
            panic!("expected quiz");
        };
        for i in 0..4 {
            quiz.answer(i, usize::from(i >= correct));
        }
        c.submit_round().unwrap()
    }

    fn sequence(c: &Controller) -> u32 {
        c.session().unwrap().current_round().unwrap().sequence
    }

    #[test]
    fn continue_from_middle_round_activates_next_round() {
        let mut c = controller_at(2, SessionPolicy::default());
        assert_eq!(sequence(&c), 2);
        assert!(finish_round(&mut c, 4).qualified);
        assert_eq!(
            c.lifecycle(),
            Some(LifecycleState::RoundCompletedAwaitingAdvance)
        );

        c.continue_to_next().unwrap();
        assert_eq!(c.lifecycle(), Some(LifecycleState::RoundActive));
        assert_eq!(sequence(&c), 3);
        assert!(c.navigator().handoffs.is_empty());
        assert_eq!(
            c.hiring().get_hiring_process("hp-1").unwrap().current_round,
            3
        );
    }

    #[test]
    fn continue_from_last_round_completes_with_one_handoff() {
        let mut c = controller_at(3, SessionPolicy::default());
        finish_round(&mut c, 4);
        c.continue_to_next().unwrap();
        assert_eq!(c.lifecycle(), Some(LifecycleState::AssessmentComplete));
        assert_eq!(c.navigator().handoffs.len(), 1);
        assert_eq!(c.navigator().handoffs[0].reason, ExitReason::Completed);

        assert_matches!(c.continue_to_next(), Err(SessionError::NotAwaitingAdvance));
        c.finish_handoff();
        c.terminate(ExitReason::ExitedForCause);
        assert_eq!(c.navigator().handoffs.len(), 1);
        assert_eq!(
            c.hiring().get_hiring_process("hp-1").unwrap().status,
            ProcessStatus::Completed
        );
    }

    #[test]
    fn result_closes_round_to_further_input() {
        let mut c = controller_at(1, SessionPolicy::default());
        finish_round(&mut c, 4);
        assert!(c.runner_mut().is_none());
        assert_matches!(c.submit_round(), Err(SessionError::NoActiveRound));
    }

    #[test]
    fn disqualified_candidate_is_blocked_until_retry() {
        let mut c = controller_at(1, SessionPolicy::default());
        let result = finish_round(&mut c, 1);
        assert!(!result.qualified);
        assert!(!c.can_continue());
        assert_matches!(
            c.continue_to_next(),
            Err(SessionError::Disqualified(RoundKind::Screening))
        );
        assert_eq!(sequence(&c), 1);

        c.retry_round().unwrap();
        assert_eq!(c.lifecycle(), Some(LifecycleState::RoundActive));
        assert_eq!(sequence(&c), 1);
        finish_round(&mut c, 3);
        c.continue_to_next().unwrap();
        assert_eq!(sequence(&c), 2);
    }

    #[test]
    fn allow_continue_policy_lets_disqualified_candidate_advance() {
        let policy = SessionPolicy {
            disqualification: DisqualificationPolicy::AllowContinue,
            ..SessionPolicy::default()
        };
        let mut c = controller_at(1, policy);
        finish_round(&mut c, 0);
        assert!(c.can_continue());
        c.continue_to_next().unwrap();
        assert_eq!(sequence(&c), 2);
    }

    #[test]
    fn failed_persistence_leaves_session_awaiting_advance() {
        let mut c = controller_at(2, SessionPolicy::default());
        finish_round(&mut c, 4);
        c.hiring.fail_next_write = Some("backend offline".into());

        assert_matches!(c.continue_to_next(), Err(SessionError::Persist(_)));
        assert_eq!(sequence(&c), 2);
        assert_eq!(
            c.lifecycle(),
            Some(LifecycleState::RoundCompletedAwaitingAdvance)
        );
        assert!(c.last_error().unwrap().contains("offline"));

        c.continue_to_next().unwrap();
        assert_eq!(sequence(&c), 3);
        assert!(c.last_error().is_none());
    }

    #[test]
    fn unknown_process_is_not_found_and_inert() {
        let api = MemoryHiringApi::new(vec![template()]);
        let mut c = Controller::new(
            api,
            RecordingNavigator::new(),
            Box::new(QuizContent),
            SessionPolicy::default(),
        );
        c.load("missing");
        assert_matches!(c.status(), SessionStatus::NotFound(reason) if reason.contains("missing"));
        assert!(c.runner().is_none());
        assert_eq!(c.progress(), 0.0);
        assert!(c.continue_to_next().is_err());
        c.terminate(ExitReason::ExitedForCause);
        c.finish_handoff();
        assert!(c.navigator().handoffs.is_empty());
    }

    #[test]
    fn start_failure_is_not_found() {
        let api = MemoryHiringApi::new(vec![template()]);
        let mut c = Controller::new(
            api,
            RecordingNavigator::new(),
            Box::new(QuizContent),
            SessionPolicy::default(),
        );
        c.start("practice", "no-such-template");
        assert_matches!(c.status(), SessionStatus::NotFound(_));
    }

    #[test]
    fn started_process_begins_at_round_one() {
        let api = MemoryHiringApi::new(vec![template()]);
        let mut c = Controller::new(
            api,
            RecordingNavigator::new(),
            Box::new(QuizContent),
            SessionPolicy::default(),
        );
        c.start("practice", "three");
        assert_eq!(c.status(), &SessionStatus::Active);
        assert_eq!(sequence(&c), 1);
    }

    #[test]
    fn resuming_past_the_last_round_is_complete() {
        let c = controller_at(4, SessionPolicy::default());
        assert_eq!(c.lifecycle(), Some(LifecycleState::AssessmentComplete));
        assert!(c.runner().is_none());
        assert_eq!(c.progress(), 1.0);
    }

    #[test]
    fn progress_follows_every_transition() {
        let mut c = controller_at(1, SessionPolicy::default());
        assert_eq!(c.progress(), 0.0);
        finish_round(&mut c, 4);
        assert!((c.progress() - 1.0 / 3.0).abs() < 1e-9);
        c.continue_to_next().unwrap();
        assert!((c.progress() - 1.0 / 3.0).abs() < 1e-9);
        finish_round(&mut c, 4);
        assert!((c.progress() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn expiry_auto_submits_into_summary() {
        let mut c = controller_at(1, SessionPolicy::default());
        let events = c.advance(Duration::from_secs(5 * 60));
        assert!(events.contains(&RunnerEvent::TimeUp));
        assert_eq!(
            c.lifecycle(),
            Some(LifecycleState::RoundCompletedAwaitingAdvance)
        );
        assert!(c.last_result().unwrap().forced);
        assert!(c.advance(Duration::from_secs(60)).is_empty());
    }

    #[test]
    fn incomplete_round_is_rejected_locally() {
        let mut c = controller_at(1, SessionPolicy::default());
        assert_matches!(
            c.submit_round(),
            Err(SessionError::Submit(SubmitError::Incomplete {
                filled: 0,
                required: 4
            }))
        );
        assert!(c.hiring().results.is_empty());
    }

    #[test]
    fn termination_ends_session_and_hands_off_once() {
        let mut c = controller_at(2, SessionPolicy::default());
        c.terminate(ExitReason::ExitedForCause);
        assert_eq!(c.status(), &SessionStatus::Ended(ExitReason::ExitedForCause));
        assert!(c.runner_mut().is_none());
        assert!(c.navigator().handoffs.is_empty());
        assert_eq!(c.hiring().exits.len(), 1);

        c.finish_handoff();
        c.finish_handoff();
        assert_eq!(c.navigator().handoffs.len(), 1);
        assert_eq!(
            c.navigator().handoffs[0].target,
            "/dashboard?process=hp-1&exit=exited_for_cause"
        );
        assert_matches!(c.submit_round(), Err(SessionError::Ended));
    }

    #[test]
    fn back_to_dashboard_navigates_immediately() {
        let mut c = controller_at(1, SessionPolicy::default());
        finish_round(&mut c, 0);
        c.return_to_dashboard();
        assert_eq!(c.navigator().handoffs.len(), 1);
        assert_eq!(
            c.navigator().handoffs[0].reason,
            ExitReason::ReturnedToDashboard
        );
        assert_eq!(
            c.hiring().get_hiring_process("hp-1").unwrap().status,
            ProcessStatus::InProgress
        );
    }

    #[test]
    fn exited_process_cannot_be_resumed() {
        let mut c = controller_at(2, SessionPolicy::default());
        c.terminate(ExitReason::ExitedForCause);
        let api = std::mem::take(&mut c.hiring);
        let mut again = Controller::new(
            api,
            RecordingNavigator::new(),
            Box::new(QuizContent),
            SessionPolicy::default(),
        );
        again.load("hp-1");
        assert_matches!(
            again.status(),
            SessionStatus::NotFound(reason) if reason.contains("exited for cause")
        );
    }
}
