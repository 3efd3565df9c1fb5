//! Question banks and assessment templates shipped inside the binary.

use std::collections::HashMap;

use cgisf_lib::cgisf;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ContentError;
use crate::hiring::{AssessmentTemplate, RoundDescriptor};
use crate::media::TerminalMedia;
use crate::round::coding::{FragmentJudge, Problem};
use crate::round::communication::CommunicationTask;
use crate::round::interview::{InterviewConfig, ScreenVoice, ScriptedInterviewer};
use crate::round::quiz::Question;
use crate::round::written::WrittenPrompt;
use crate::round::{
    CodingRound, CommunicationRound, InterviewRound, QuizRound, RoundBody, RoundKind, WrittenRound,
};

static CONTENT_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/content");

/// Supplies the task set and grading rule for a round
pub trait ContentProvider {
    fn build_round(&self, descriptor: &RoundDescriptor) -> Result<RoundBody, ContentError>;
}

#[derive(Debug, Clone, Deserialize)]
struct QuizBank {
    per_round: usize,
    questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
struct CodingBank {
    per_round: usize,
    problems: Vec<Problem>,
}

#[derive(Debug, Clone, Deserialize)]
struct CommunicationBank {
    dictations: usize,
    per_round: usize,
    tasks: Vec<CommunicationTask>,
}

#[derive(Debug, Clone, Deserialize)]
struct WrittenBank {
    per_round: usize,
    prompts: Vec<WrittenPrompt>,
}

#[derive(Debug, Clone, Deserialize)]
struct InterviewScript {
    greeting: String,
    target_words: usize,
    questions: Vec<String>,
}

fn read_json<T: DeserializeOwned>(file_name: &str) -> Result<T, ContentError> {
    let file = CONTENT_DIR
        .get_file(file_name)
        .ok_or_else(|| ContentError::Missing(file_name.to_string()))?;
    let text = file
        .contents_utf8()
        .ok_or_else(|| ContentError::Missing(format!("{file_name} (not utf-8)")))?;
    serde_json::from_str(text).map_err(|source| ContentError::Malformed {
        file: file_name.to_string(),
        source,
    })
}

fn pick<T: Clone>(items: &[T], count: usize) -> Vec<T> {
    let mut rng = rand::thread_rng();
    items.choose_multiple(&mut rng, count).cloned().collect()
}

/// A random sentence to copy out in the dictation task
pub fn dictation_passage() -> String {
    let rng = &mut rand::thread_rng();
    cgisf(
        rng.gen_range(1..3),
        rng.gen_range(1..3),
        rng.gen_range(1..5),
        rng.gen_bool(0.5),
        rng.gen_range(1..3),
        rng.gen_bool(0.5),
    )
    .trim()
    .to_string()
}

/// Everything under `content/`, parsed once
#[derive(Debug, Clone)]
pub struct BundledContent {
    catalog: Vec<AssessmentTemplate>,
    quizzes: HashMap<RoundKind, QuizBank>,
    coding: CodingBank,
    communication: CommunicationBank,
    written: HashMap<RoundKind, WrittenBank>,
    interview: InterviewScript,
    interview_config: InterviewConfig,
}

impl BundledContent {
    pub fn load(interview_config: InterviewConfig) -> Result<Self, ContentError> {
        let mut quizzes = HashMap::new();
        quizzes.insert(RoundKind::Screening, read_json("screening.json")?);
        quizzes.insert(RoundKind::Aptitude, read_json("aptitude.json")?);

        let mut written = HashMap::new();
        written.insert(RoundKind::Technical, read_json("technical.json")?);
        written.insert(RoundKind::Behavioral, read_json("behavioral.json")?);
        written.insert(RoundKind::SystemDesign, read_json("system_design.json")?);

        Ok(Self {
            catalog: read_json("assessments.json")?,
            quizzes,
            coding: read_json("coding.json")?,
            communication: read_json("communication.json")?,
            written,
            interview: read_json("interview.json")?,
            interview_config,
        })
    }

    pub fn catalog(&self) -> &[AssessmentTemplate] {
        &self.catalog
    }

    fn quiz(&self, kind: RoundKind) -> Result<RoundBody, ContentError> {
        let bank = self
            .quizzes
            .get(&kind)
            .filter(|b| !b.questions.is_empty())
            .ok_or(ContentError::Empty(kind))?;
        Ok(RoundBody::Quiz(QuizRound::new(
            kind,
            pick(&bank.questions, bank.per_round),
        )))
    }

    fn written(&self, kind: RoundKind) -> Result<RoundBody, ContentError> {
        let bank = self
            .written
            .get(&kind)
            .filter(|b| !b.prompts.is_empty())
            .ok_or(ContentError::Empty(kind))?;
        Ok(RoundBody::Written(WrittenRound::new(
            kind,
            pick(&bank.prompts, bank.per_round),
        )))
    }

    fn coding(&self) -> Result<RoundBody, ContentError> {
        if self.coding.problems.is_empty() {
            return Err(ContentError::Empty(RoundKind::Coding));
        }
        Ok(RoundBody::Coding(CodingRound::new(
            pick(&self.coding.problems, self.coding.per_round),
            Box::new(FragmentJudge),
        )))
    }

    fn communication(&self) -> RoundBody {
        let bank = &self.communication;
        let mut tasks: Vec<CommunicationTask> = (0..bank.dictations)
            .map(|_| CommunicationTask::dictation(dictation_passage()))
            .collect();
        tasks.extend(pick(&bank.tasks, bank.per_round));
        RoundBody::Communication(CommunicationRound::new(tasks))
    }

    fn interview(&self) -> Result<RoundBody, ContentError> {
        let script = &self.interview;
        if script.questions.is_empty() {
            return Err(ContentError::Empty(RoundKind::Interview));
        }
        // Opener first, the rest drawn at random
        let mut questions = vec![script.questions[0].clone()];
        let remaining = self.interview_config.max_questions.saturating_sub(1);
        questions.extend(pick(&script.questions[1..], remaining));
        questions.truncate(self.interview_config.max_questions);

        let interviewer =
            ScriptedInterviewer::new(script.greeting.clone(), questions, script.target_words);
        let mut round = InterviewRound::new(
            self.interview_config,
            Box::new(interviewer),
            Box::new(ScreenVoice::new(self.interview_config.speech_ms_per_word)),
            Box::new(TerminalMedia),
        );
        round
            .start()
            .map_err(|_| ContentError::Empty(RoundKind::Interview))?;
        Ok(RoundBody::Interview(round))
    }
}

impl ContentProvider for BundledContent {
    fn build_round(&self, descriptor: &RoundDescriptor) -> Result<RoundBody, ContentError> {
        match descriptor.kind {
            RoundKind::Screening | RoundKind::Aptitude => self.quiz(descriptor.kind),
            RoundKind::Coding => self.coding(),
            RoundKind::Communication => Ok(self.communication()),
            RoundKind::Technical | RoundKind::Behavioral | RoundKind::SystemDesign => {
                self.written(descriptor.kind)
            }
            RoundKind::Interview => self.interview(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::interview::InterviewPhase;
    use crate::round::RoundTask;

    fn content() -> BundledContent {
        BundledContent::load(InterviewConfig::default()).unwrap()
    }

    fn descriptor(kind: RoundKind) -> RoundDescriptor {
        RoundDescriptor {
            sequence: 1,
            kind,
            name: kind.to_string(),
            duration_minutes: 10,
        }
    }

    #[test]
    fn every_round_kind_builds() {
        let content = content();
        for kind in RoundKind::ALL {
            let body = content.build_round(&descriptor(kind)).unwrap();
            assert_eq!(body.task().kind(), kind);
            let (filled, required) = body.task().progress();
            assert!(required > 0, "{kind} has no inputs");
            assert!(filled < required || kind == RoundKind::Interview);
        }
    }

    #[test]
    fn catalog_templates_are_usable() {
        let content = content();
        assert!(content.catalog().iter().any(|t| t.id == "starter"));
        for template in content.catalog() {
            assert!(!template.rounds.is_empty(), "{} has no rounds", template.id);
        }
    }

    #[test]
    fn quiz_answers_point_at_options() {
        for file in ["screening.json", "aptitude.json"] {
            let bank: QuizBank = read_json(file).unwrap();
            assert!(bank.per_round <= bank.questions.len());
            for q in &bank.questions {
                assert!(q.answer < q.options.len(), "{}", q.prompt);
            }
        }
    }

    #[test]
    fn aptitude_round_has_eight_questions() {
        match content().build_round(&descriptor(RoundKind::Aptitude)).unwrap() {
            RoundBody::Quiz(quiz) => assert_eq!(quiz.questions().len(), 8),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn communication_starts_with_dictations() {
        match content()
            .build_round(&descriptor(RoundKind::Communication))
            .unwrap()
        {
            RoundBody::Communication(round) => {
                assert_eq!(round.tasks().len(), 4);
                assert!(!round.tasks()[0].reference.is_empty());
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn interview_is_started_and_capped() {
        let config = InterviewConfig {
            max_questions: 3,
            ..InterviewConfig::default()
        };
        let content = BundledContent::load(config).unwrap();
        match content.build_round(&descriptor(RoundKind::Interview)).unwrap() {
            RoundBody::Interview(round) => assert_eq!(round.phase(), InterviewPhase::Greeting),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_json::<QuizBank>("nope.json").unwrap_err();
        assert!(matches!(err, ContentError::Missing(name) if name == "nope.json"));
    }
}
