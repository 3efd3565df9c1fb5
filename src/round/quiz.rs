use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::round::{RoundDetails, RoundKind, RoundTask};
use crate::util::percent;

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub answer: usize,
    #[serde(default)]
    pub topic: Option<String>,
}

/// Multiple-choice round used for screening and aptitude
#[derive(Debug, Clone)]
pub struct QuizRound {
    kind: RoundKind,
    questions: Vec<Question>,
    answers: BTreeMap<usize, usize>,
    current: usize,
}

impl QuizRound {
    pub fn new(kind: RoundKind, questions: Vec<Question>) -> Self {
        Self {
            kind,
            questions,
            answers: BTreeMap::new(),
            current: 0,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(&index).copied()
    }

    /// Records `option` for question `index`; out-of-range picks are ignored
    pub fn answer(&mut self, index: usize, option: usize) -> bool {
        match self.questions.get(index) {
            Some(q) if option < q.options.len() => {
                self.answers.insert(index, option);
                true
            }
            _ => false,
        }
    }

    /// Answers the question under the cursor
    pub fn select(&mut self, option: usize) -> bool {
        self.answer(self.current, option)
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.questions.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn jump(&mut self, index: usize) {
        if index < self.questions.len() {
            self.current = index;
        }
    }

    /// First unanswered question, if any
    pub fn first_unanswered(&self) -> Option<usize> {
        (0..self.questions.len()).find(|i| !self.answers.contains_key(i))
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn correct_count(&self) -> usize {
        self.answers
            .iter()
            .filter(|(i, picked)| self.questions.get(**i).is_some_and(|q| q.answer == **picked))
            .count()
    }
}

impl RoundTask for QuizRound {
    fn kind(&self) -> RoundKind {
        self.kind
    }

    fn progress(&self) -> (usize, usize) {
        (self.answered_count(), self.questions.len())
    }

    fn grade(&self) -> (u8, RoundDetails) {
        let correct = self.correct_count();
        let total = self.questions.len();
        (
            percent(correct, total),
            RoundDetails::Quiz {
                correct,
                answered: self.answered_count(),
                total,
            },
        )
    }
}
