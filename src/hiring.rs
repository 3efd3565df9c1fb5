//! The hiring-process collaborator: authoritative round order, names and
//! durations, and the destination of advance/complete/exit side effects.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CollaboratorError;
use crate::navigation::ExitReason;
use crate::round::{RoundKind, RoundResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundDescriptor {
    /// 1-based position in the process
    pub sequence: u32,
    pub kind: RoundKind,
    pub name: String,
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    pub round_count: u32,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    #[strum(serialize = "in progress")]
    InProgress,
    #[strum(serialize = "completed")]
    Completed,
    #[strum(serialize = "exited for cause")]
    ExitedForCause,
    #[strum(serialize = "abandoned")]
    Abandoned,
}

impl ProcessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::InProgress => "in_progress",
            ProcessStatus::Completed => "completed",
            ProcessStatus::ExitedForCause => "exited_for_cause",
            ProcessStatus::Abandoned => "abandoned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        [
            ProcessStatus::InProgress,
            ProcessStatus::Completed,
            ProcessStatus::ExitedForCause,
            ProcessStatus::Abandoned,
        ]
        .into_iter()
        .find(|st| st.as_str() == s)
    }

    /// Status a process moves to when the candidate exits for `reason`
    pub fn after_exit(self, reason: ExitReason) -> Self {
        match reason {
            ExitReason::Completed => ProcessStatus::Completed,
            ExitReason::ExitedForCause => ProcessStatus::ExitedForCause,
            ExitReason::Abandoned => ProcessStatus::Abandoned,
            ExitReason::ReturnedToDashboard => self,
        }
    }
}

/// One candidate's multi-round attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiringProcess {
    pub id: String,
    pub process_type: String,
    pub assessment_id: String,
    pub rounds: Vec<RoundDescriptor>,
    /// Sequence number of the round to take next
    pub current_round: u32,
    pub config_snapshot: ConfigSnapshot,
    pub status: ProcessStatus,
    pub started_at: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRound {
    pub kind: RoundKind,
    pub name: String,
    pub duration_minutes: u32,
}

/// A named sequence of rounds a process can be started from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rounds: Vec<TemplateRound>,
}

impl HiringProcess {
    pub fn from_template(
        id: String,
        process_type: &str,
        template: &AssessmentTemplate,
        started_at: DateTime<Local>,
    ) -> Self {
        let rounds: Vec<RoundDescriptor> = template
            .rounds
            .iter()
            .zip(1..)
            .map(|(r, sequence)| RoundDescriptor {
                sequence,
                kind: r.kind,
                name: r.name.clone(),
                duration_minutes: r.duration_minutes,
            })
            .collect();
        Self {
            id,
            process_type: process_type.to_string(),
            assessment_id: template.id.clone(),
            config_snapshot: ConfigSnapshot {
                round_count: rounds.len() as u32,
            },
            rounds,
            current_round: 1,
            status: ProcessStatus::InProgress,
            started_at,
        }
    }

    /// Check that `completed` is the round this process is waiting on
    pub fn expect_current(&self, completed: u32) -> Result<(), CollaboratorError> {
        if self.status != ProcessStatus::InProgress {
            return Err(CollaboratorError::Invalid {
                id: self.id.clone(),
                reason: format!("process is {}", self.status),
            });
        }
        if self.current_round != completed {
            return Err(CollaboratorError::Invalid {
                id: self.id.clone(),
                reason: format!(
                    "round {completed} reported but round {} is current",
                    self.current_round
                ),
            });
        }
        Ok(())
    }
}

pub fn new_process_id() -> String {
    format!(
        "hp-{}-{:04x}",
        Local::now().format("%Y%m%d%H%M%S"),
        rand::random::<u16>()
    )
}

pub fn find_template<'a>(
    catalog: &'a [AssessmentTemplate],
    assessment_id: &str,
) -> Result<&'a AssessmentTemplate, CollaboratorError> {
    catalog
        .iter()
        .find(|t| t.id == assessment_id)
        .ok_or_else(|| CollaboratorError::UnknownAssessment(assessment_id.to_string()))
}

pub trait HiringProcessApi {
    fn get_hiring_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError>;
    fn start_hiring_process(
        &mut self,
        process_type: &str,
        assessment_id: &str,
    ) -> Result<HiringProcess, CollaboratorError>;
    /// Persist `result` for round `completed` and move the process to the next round
    fn advance_round(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError>;
    fn complete_assessment(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError>;
    fn record_exit(&mut self, id: &str, reason: ExitReason) -> Result<(), CollaboratorError>;
}

impl<H: HiringProcessApi + ?Sized> HiringProcessApi for &mut H {
    fn get_hiring_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError> {
        (**self).get_hiring_process(id)
    }
    fn start_hiring_process(
        &mut self,
        process_type: &str,
        assessment_id: &str,
    ) -> Result<HiringProcess, CollaboratorError> {
        (**self).start_hiring_process(process_type, assessment_id)
    }
    fn advance_round(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        (**self).advance_round(id, completed, result)
    }
    fn complete_assessment(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        (**self).complete_assessment(id, completed, result)
    }
    fn record_exit(&mut self, id: &str, reason: ExitReason) -> Result<(), CollaboratorError> {
        (**self).record_exit(id, reason)
    }
}

impl<H: HiringProcessApi + ?Sized> HiringProcessApi for Box<H> {
    fn get_hiring_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError> {
        (**self).get_hiring_process(id)
    }
    fn start_hiring_process(
        &mut self,
        process_type: &str,
        assessment_id: &str,
    ) -> Result<HiringProcess, CollaboratorError> {
        (**self).start_hiring_process(process_type, assessment_id)
    }
    fn advance_round(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        (**self).advance_round(id, completed, result)
    }
    fn complete_assessment(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        (**self).complete_assessment(id, completed, result)
    }
    fn record_exit(&mut self, id: &str, reason: ExitReason) -> Result<(), CollaboratorError> {
        (**self).record_exit(id, reason)
    }
}

/// In-process collaborator, used by tests and `--dry-run`
#[derive(Debug, Default)]
pub struct MemoryHiringApi {
    catalog: Vec<AssessmentTemplate>,
    processes: HashMap<String, HiringProcess>,
    pub results: Vec<(String, u32, RoundResult)>,
    pub exits: Vec<(String, ExitReason)>,
    /// Fail the next write with this message
    pub fail_next_write: Option<String>,
}

impl MemoryHiringApi {
    pub fn new(catalog: Vec<AssessmentTemplate>) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn insert(&mut self, process: HiringProcess) {
        self.processes.insert(process.id.clone(), process);
    }

    fn check_write(&mut self) -> Result<(), CollaboratorError> {
        match self.fail_next_write.take() {
            Some(msg) => Err(CollaboratorError::Unavailable(msg)),
            None => Ok(()),
        }
    }

    fn process_mut(&mut self, id: &str) -> Result<&mut HiringProcess, CollaboratorError> {
        self.processes
            .get_mut(id)
            .ok_or_else(|| CollaboratorError::NotFound(id.to_string()))
    }
}

impl HiringProcessApi for MemoryHiringApi {
    fn get_hiring_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError> {
        self.processes
            .get(id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(id.to_string()))
    }

    fn start_hiring_process(
        &mut self,
        process_type: &str,
        assessment_id: &str,
    ) -> Result<HiringProcess, CollaboratorError> {
        self.check_write()?;
        let template = find_template(&self.catalog, assessment_id)?;
        let process =
            HiringProcess::from_template(new_process_id(), process_type, template, Local::now());
        info!(id = %process.id, assessment = assessment_id, "hiring process started");
        self.insert(process.clone());
        Ok(process)
    }

    fn advance_round(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        self.check_write()?;
        let process = self.process_mut(id)?;
        process.expect_current(completed)?;
        process.current_round = completed + 1;
        self.results.push((id.to_string(), completed, result.clone()));
        Ok(())
    }

    fn complete_assessment(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        self.check_write()?;
        let process = self.process_mut(id)?;
        process.expect_current(completed)?;
        process.current_round = completed + 1;
        process.status = ProcessStatus::Completed;
        self.results.push((id.to_string(), completed, result.clone()));
        Ok(())
    }

    fn record_exit(&mut self, id: &str, reason: ExitReason) -> Result<(), CollaboratorError> {
        self.check_write()?;
        let process = self.process_mut(id)?;
        process.status = process.status.after_exit(reason);
        self.exits.push((id.to_string(), reason));
        Ok(())
    }
}
