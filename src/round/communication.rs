use serde::{Deserialize, Serialize};

use crate::round::{apply_edit, Edit, RoundDetails, RoundKind, RoundTask};
use crate::util::{char_accuracy, clamp_score, mean, percent, word_count};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationTaskKind {
    /// Reproduce the reference passage exactly
    Dictation,
    /// Free response of at least `min_words`
    Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunicationTask {
    pub kind: CommunicationTaskKind,
    pub instruction: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub min_words: usize,
}

impl CommunicationTask {
    pub fn dictation(passage: impl Into<String>) -> Self {
        Self {
            kind: CommunicationTaskKind::Dictation,
            instruction: "Type the passage exactly as shown.".into(),
            reference: passage.into(),
            min_words: 0,
        }
    }

    fn score(&self, response: &str) -> u8 {
        match self.kind {
            CommunicationTaskKind::Dictation => char_accuracy(&self.reference, response),
            CommunicationTaskKind::Response => {
                if self.min_words == 0 {
                    return if response.trim().is_empty() { 0 } else { 100 };
                }
                percent(word_count(response), self.min_words)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommunicationRound {
    tasks: Vec<CommunicationTask>,
    responses: Vec<String>,
    current: usize,
}

impl CommunicationRound {
    pub fn new(tasks: Vec<CommunicationTask>) -> Self {
        let responses = vec![String::new(); tasks.len()];
        Self {
            tasks,
            responses,
            current: 0,
        }
    }

    pub fn tasks(&self) -> &[CommunicationTask] {
        &self.tasks
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_task(&self) -> Option<&CommunicationTask> {
        self.tasks.get(self.current)
    }

    pub fn response(&self, index: usize) -> Option<&str> {
        self.responses.get(index).map(String::as_str)
    }

    pub fn edit(&mut self, edit: Edit) {
        if let Some(buf) = self.responses.get_mut(self.current) {
            apply_edit(buf, edit);
        }
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.tasks.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    fn completed(&self) -> usize {
        self.responses.iter().filter(|r| !r.trim().is_empty()).count()
    }
}

impl RoundTask for CommunicationRound {
    fn kind(&self) -> RoundKind {
        RoundKind::Communication
    }

    fn progress(&self) -> (usize, usize) {
        (self.completed(), self.tasks.len())
    }

    fn grade(&self) -> (u8, RoundDetails) {
        let scores: Vec<f64> = self
            .tasks
            .iter()
            .zip(&self.responses)
            .map(|(t, r)| t.score(r) as f64)
            .collect();
        let score = mean(&scores).map(clamp_score).unwrap_or(0);
        (
            score,
            RoundDetails::Communication {
                completed_tasks: self.completed(),
                total_tasks: self.tasks.len(),
                accuracy: score,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_task(min_words: usize) -> CommunicationTask {
        CommunicationTask {
            kind: CommunicationTaskKind::Response,
            instruction: "Describe your last project.".into(),
            reference: String::new(),
            min_words,
        }
    }

    fn type_text(round: &mut CommunicationRound, text: &str) {
        text.chars().for_each(|c| round.edit(Edit::Char(c)));
    }

    #[test]
    fn dictation_is_scored_by_accuracy() {
        let mut round = CommunicationRound::new(vec![CommunicationTask::dictation("hello")]);
        type_text(&mut round, "help");
        assert_eq!(round.grade().0, 60);
    }

    #[test]
    fn response_is_scored_by_length() {
        let mut round = CommunicationRound::new(vec![response_task(4)]);
        type_text(&mut round, "one two three");
        assert_eq!(round.grade().0, 75);
    }

    #[test]
    fn score_is_mean_of_tasks() {
        let mut round = CommunicationRound::new(vec![
            CommunicationTask::dictation("abcd"),
            response_task(2),
        ]);
        type_text(&mut round, "abcd");
        round.next();
        type_text(&mut round, "one");
        let (score, details) = round.grade();
        assert_eq!(score, 75);
        assert_eq!(
            details,
            RoundDetails::Communication {
                completed_tasks: 2,
                total_tasks: 2,
                accuracy: 75
            }
        );
    }

    #[test]
    fn blank_responses_leave_round_incomplete() {
        let mut round = CommunicationRound::new(vec![response_task(3), response_task(3)]);
        type_text(&mut round, "   ");
        assert_eq!(round.progress(), (0, 2));
        type_text(&mut round, "x");
        round.next();
        type_text(&mut round, "y");
        assert!(round.is_complete());
    }
}
