//! Local SQLite-backed hiring-process collaborator.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::error::CollaboratorError;
use crate::hiring::{
    find_template, new_process_id, AssessmentTemplate, ConfigSnapshot, HiringProcess,
    HiringProcessApi, ProcessStatus, RoundDescriptor,
};
use crate::navigation::ExitReason;
use crate::round::{RoundKind, RoundResult};

/// One line of `--list`
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSummary {
    pub id: String,
    pub assessment_id: String,
    pub status: ProcessStatus,
    pub current_round: u32,
    pub round_count: u32,
    pub started_at: DateTime<Local>,
}

/// One exported row per stored round result
#[derive(Debug, Serialize)]
struct ResultRow {
    process_id: String,
    assessment_id: String,
    sequence: u32,
    kind: &'static str,
    score: u8,
    qualified: bool,
    forced: bool,
    recorded_at: String,
    details: String,
}

#[derive(Debug)]
pub struct SqliteHiringStore {
    conn: Connection,
    catalog: Vec<AssessmentTemplate>,
}

fn parse_time(idx: usize, value: String) -> rusqlite::Result<DateTime<Local>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn unknown(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, format!("{what} {value}"), rusqlite::types::Type::Text)
}

impl SqliteHiringStore {
    /// Opens the store at the default state path
    pub fn open_default(catalog: Vec<AssessmentTemplate>) -> Result<Self, CollaboratorError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("gauntlet.db"));
        Self::open(&path, catalog)
    }

    pub fn open(path: &Path, catalog: Vec<AssessmentTemplate>) -> Result<Self, CollaboratorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CollaboratorError::Unavailable(format!(
                    "cannot create {}: {e}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened hiring store");
        Self::with_connection(conn, catalog)
    }

    pub fn in_memory(catalog: Vec<AssessmentTemplate>) -> Result<Self, CollaboratorError> {
        Self::with_connection(Connection::open_in_memory()?, catalog)
    }

    fn with_connection(
        conn: Connection,
        catalog: Vec<AssessmentTemplate>,
    ) -> Result<Self, CollaboratorError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS hiring_processes (
                id TEXT PRIMARY KEY,
                process_type TEXT NOT NULL,
                assessment_id TEXT NOT NULL,
                current_round INTEGER NOT NULL,
                round_count INTEGER NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rounds (
                process_id TEXT NOT NULL REFERENCES hiring_processes(id),
                sequence INTEGER NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                PRIMARY KEY (process_id, sequence)
            );
            CREATE TABLE IF NOT EXISTS round_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                process_id TEXT NOT NULL REFERENCES hiring_processes(id),
                sequence INTEGER NOT NULL,
                kind TEXT NOT NULL,
                score INTEGER NOT NULL,
                qualified BOOLEAN NOT NULL,
                forced BOOLEAN NOT NULL,
                feedback TEXT NOT NULL,
                details TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS exits (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                process_id TEXT NOT NULL REFERENCES hiring_processes(id),
                reason TEXT NOT NULL,
                recorded_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_round_results_process ON round_results(process_id);
            "#,
        )?;
        Ok(Self { conn, catalog })
    }

    pub fn catalog(&self) -> &[AssessmentTemplate] {
        &self.catalog
    }

    pub fn list_processes(&self) -> Result<Vec<ProcessSummary>, CollaboratorError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, assessment_id, status, current_round, round_count, started_at
            FROM hiring_processes
            ORDER BY started_at DESC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let status: String = row.get(2)?;
            Ok(ProcessSummary {
                id: row.get(0)?,
                assessment_id: row.get(1)?,
                status: ProcessStatus::parse(&status)
                    .ok_or_else(|| unknown(2, "status", &status))?,
                current_round: row.get(3)?,
                round_count: row.get(4)?,
                started_at: parse_time(5, row.get(5)?)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Writes every stored round result as CSV; returns the number of rows
    pub fn export_results_csv(&self, path: &Path) -> Result<usize, CollaboratorError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.process_id, p.assessment_id, r.sequence, r.kind, r.score,
                   r.qualified, r.forced, r.recorded_at, r.details
            FROM round_results r JOIN hiring_processes p ON p.id = r.process_id
            ORDER BY r.recorded_at, r.sequence
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let kind: String = row.get(3)?;
            Ok(ResultRow {
                process_id: row.get(0)?,
                assessment_id: row.get(1)?,
                sequence: row.get(2)?,
                kind: RoundKind::parse(&kind)
                    .ok_or_else(|| unknown(3, "round kind", &kind))?
                    .as_str(),
                score: row.get(4)?,
                qualified: row.get(5)?,
                forced: row.get(6)?,
                recorded_at: row.get(7)?,
                details: row.get(8)?,
            })
        })?;

        let mut writer = csv::Writer::from_path(path)?;
        let mut count = 0;
        for row in rows {
            writer.serialize(row?)?;
            count += 1;
        }
        writer.flush().map_err(csv::Error::from)?;
        info!(rows = count, path = %path.display(), "exported round results");
        Ok(count)
    }

    fn load_rounds(&self, id: &str) -> Result<Vec<RoundDescriptor>, CollaboratorError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT sequence, kind, name, duration_minutes
            FROM rounds WHERE process_id = ?1
            ORDER BY sequence
            "#,
        )?;
        let rows = stmt.query_map([id], |row| {
            let kind: String = row.get(1)?;
            Ok(RoundDescriptor {
                sequence: row.get(0)?,
                kind: RoundKind::parse(&kind).ok_or_else(|| unknown(1, "round kind", &kind))?,
                name: row.get(2)?,
                duration_minutes: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn load_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError> {
        let header = self
            .conn
            .query_row(
                r#"
                SELECT process_type, assessment_id, current_round, round_count, status, started_at
                FROM hiring_processes WHERE id = ?1
                "#,
                [id],
                |row| {
                    let status: String = row.get(4)?;
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, u32>(3)?,
                        ProcessStatus::parse(&status)
                            .ok_or_else(|| unknown(4, "status", &status))?,
                        parse_time(5, row.get(5)?)?,
                    ))
                },
            )
            .optional()?;
        let Some((process_type, assessment_id, current_round, round_count, status, started_at)) =
            header
        else {
            return Err(CollaboratorError::NotFound(id.to_string()));
        };
        Ok(HiringProcess {
            id: id.to_string(),
            process_type,
            assessment_id,
            rounds: self.load_rounds(id)?,
            current_round,
            config_snapshot: ConfigSnapshot { round_count },
            status,
            started_at,
        })
    }

    /// Stores `result` for round `completed` and moves the process on, atomically
    fn record_result(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
        status: ProcessStatus,
    ) -> Result<(), CollaboratorError> {
        self.load_process(id)?.expect_current(completed)?;
        let details = serde_json::to_string(&result.details)?;
        let now = Local::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO round_results
            (process_id, sequence, kind, score, qualified, forced, feedback, details, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                id,
                completed,
                result.round_kind.as_str(),
                result.score,
                result.qualified,
                result.forced,
                result.feedback,
                details,
                now,
            ],
        )?;
        tx.execute(
            "UPDATE hiring_processes
             SET current_round = ?2, status = ?3, updated_at = ?4
             WHERE id = ?1",
            params![id, completed + 1, status.as_str(), now],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl HiringProcessApi for SqliteHiringStore {
    fn get_hiring_process(&self, id: &str) -> Result<HiringProcess, CollaboratorError> {
        self.load_process(id)
    }

    fn start_hiring_process(
        &mut self,
        process_type: &str,
        assessment_id: &str,
    ) -> Result<HiringProcess, CollaboratorError> {
        let template = find_template(&self.catalog, assessment_id)?;
        let process =
            HiringProcess::from_template(new_process_id(), process_type, template, Local::now());

        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO hiring_processes
            (id, process_type, assessment_id, current_round, round_count, status,
             started_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
            params![
                process.id,
                process.process_type,
                process.assessment_id,
                process.current_round,
                process.config_snapshot.round_count,
                process.status.as_str(),
                process.started_at.to_rfc3339(),
            ],
        )?;
        for round in &process.rounds {
            tx.execute(
                "INSERT INTO rounds (process_id, sequence, kind, name, duration_minutes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    process.id,
                    round.sequence,
                    round.kind.as_str(),
                    round.name,
                    round.duration_minutes,
                ],
            )?;
        }
        tx.commit()?;
        info!(id = %process.id, assessment = assessment_id, "hiring process started");
        Ok(process)
    }

    fn advance_round(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        self.record_result(id, completed, result, ProcessStatus::InProgress)
    }

    fn complete_assessment(
        &mut self,
        id: &str,
        completed: u32,
        result: &RoundResult,
    ) -> Result<(), CollaboratorError> {
        self.record_result(id, completed, result, ProcessStatus::Completed)
    }

    fn record_exit(&mut self, id: &str, reason: ExitReason) -> Result<(), CollaboratorError> {
        let process = self.load_process(id)?;
        let now = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO exits (process_id, reason, recorded_at) VALUES (?1, ?2, ?3)",
            params![id, reason.to_string(), now],
        )?;
        tx.execute(
            "UPDATE hiring_processes SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, process.status.after_exit(reason).as_str(), now],
        )?;
        tx.commit()?;
        Ok(())
    }
}
