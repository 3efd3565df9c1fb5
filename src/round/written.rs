use serde::{Deserialize, Serialize};

use crate::round::{apply_edit, Edit, RoundDetails, RoundKind, RoundTask};
use crate::util::{clamp_score, mean, word_count};

const KEYWORD_WEIGHT: f64 = 0.7;
const LENGTH_WEIGHT: f64 = 0.3;

/// Open-ended prompt graded by keyword coverage and answer length
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenPrompt {
    pub prompt: String,
    pub keywords: Vec<String>,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
}

fn default_min_words() -> usize {
    40
}

impl WrittenPrompt {
    fn keywords_hit(&self, answer: &str) -> usize {
        let lower = answer.to_lowercase();
        self.keywords
            .iter()
            .filter(|k| lower.contains(&k.to_lowercase()))
            .count()
    }

    fn score(&self, answer: &str) -> f64 {
        if answer.trim().is_empty() {
            return 0.0;
        }
        let coverage = if self.keywords.is_empty() {
            1.0
        } else {
            self.keywords_hit(answer) as f64 / self.keywords.len() as f64
        };
        let length = if self.min_words == 0 {
            1.0
        } else {
            (word_count(answer) as f64 / self.min_words as f64).min(1.0)
        };
        (coverage * KEYWORD_WEIGHT + length * LENGTH_WEIGHT) * 100.0
    }
}

/// Technical, behavioral and system design rounds
#[derive(Debug, Clone)]
pub struct WrittenRound {
    kind: RoundKind,
    prompts: Vec<WrittenPrompt>,
    answers: Vec<String>,
    current: usize,
}

impl WrittenRound {
    pub fn new(kind: RoundKind, prompts: Vec<WrittenPrompt>) -> Self {
        let answers = vec![String::new(); prompts.len()];
        Self {
            kind,
            prompts,
            answers,
            current: 0,
        }
    }

    pub fn prompts(&self) -> &[WrittenPrompt] {
        &self.prompts
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn current_prompt(&self) -> Option<&WrittenPrompt> {
        self.prompts.get(self.current)
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).map(String::as_str)
    }

    pub fn edit(&mut self, edit: Edit) {
        if let Some(buf) = self.answers.get_mut(self.current) {
            apply_edit(buf, edit);
        }
    }

    pub fn next(&mut self) {
        if self.current + 1 < self.prompts.len() {
            self.current += 1;
        }
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn jump(&mut self, index: usize) {
        if index < self.prompts.len() {
            self.current = index;
        }
    }

    fn answered(&self) -> usize {
        self.answers.iter().filter(|a| !a.trim().is_empty()).count()
    }
}

impl RoundTask for WrittenRound {
    fn kind(&self) -> RoundKind {
        self.kind
    }

    fn progress(&self) -> (usize, usize) {
        (self.answered(), self.prompts.len())
    }

    fn grade(&self) -> (u8, RoundDetails) {
        let scores: Vec<f64> = self
            .prompts
            .iter()
            .zip(&self.answers)
            .map(|(p, a)| p.score(a))
            .collect();
        let keywords_hit = self
            .prompts
            .iter()
            .zip(&self.answers)
            .map(|(p, a)| p.keywords_hit(a))
            .sum();
        let keywords_total = self.prompts.iter().map(|p| p.keywords.len()).sum();
        (
            mean(&scores).map(clamp_score).unwrap_or(0),
            RoundDetails::Written {
                answered: self.answered(),
                total: self.prompts.len(),
                keywords_hit,
                keywords_total,
            },
        )
    }
}
