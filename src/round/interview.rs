//! Simulated voice interview.
//!
//! The round is a single [`InterviewPhase`] value guarded by a transition
//! table. Speaking, listening and processing are distinct phases, so only one
//! of them can be in progress at a time.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::InterviewError;
use crate::media::{MediaDevices, MediaKind, MediaStream};
use crate::round::{apply_edit, Edit, RoundDetails, RoundKind, RoundTask};
use crate::timers::{TimerId, Timers};
use crate::util::{percent, word_count};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::IntoStaticStr,
)]
pub enum InterviewPhase {
    #[strum(serialize = "not started")]
    NotStarted,
    #[strum(serialize = "greeting")]
    Greeting,
    #[strum(serialize = "asking")]
    AwaitingQuestion,
    #[strum(serialize = "listening")]
    ListeningForAnswer,
    #[strum(serialize = "processing")]
    ProcessingAnswer,
    #[strum(serialize = "ended")]
    Ended,
    #[strum(serialize = "submitted")]
    ResultSubmitted,
}

impl InterviewPhase {
    /// The interviewer's voice is playing
    pub fn is_speaking(&self) -> bool {
        matches!(self, InterviewPhase::Greeting | InterviewPhase::AwaitingQuestion)
    }

    fn can_become(self, to: InterviewPhase) -> bool {
        use InterviewPhase::*;
        matches!(
            (self, to),
            (NotStarted, Greeting)
                | (Greeting, AwaitingQuestion)
                | (AwaitingQuestion, ListeningForAnswer)
                | (ListeningForAnswer, ProcessingAnswer)
                | (ProcessingAnswer, AwaitingQuestion)
                | (
                    NotStarted
                        | Greeting
                        | AwaitingQuestion
                        | ListeningForAnswer
                        | ProcessingAnswer,
                    Ended
                )
                | (Ended, ResultSubmitted)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterviewConfig {
    pub silence_window: Duration,
    pub retry_delay: Duration,
    pub max_questions: usize,
    pub speech_ms_per_word: u64,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            silence_window: Duration::from_secs(2),
            retry_delay: Duration::from_secs(1),
            max_questions: 5,
            speech_ms_per_word: 250,
        }
    }
}

/// Produces the interviewer's side of the conversation
pub trait Interviewer {
    fn greeting(&mut self) -> Result<String, InterviewError>;
    /// `Ok(None)` when there is nothing left to ask
    fn next_question(&mut self, asked: usize) -> Result<Option<String>, InterviewError>;
    fn respond(&mut self, question: &str, answer: &str) -> Result<String, InterviewError>;
    fn score(&self, exchanges: &[Exchange]) -> u8;
}

/// Speech output and recognition
pub trait Voice {
    /// Starts playback and returns how long it lasts
    fn speak(&mut self, text: &str) -> Result<Duration, InterviewError>;
    fn start_listening(&mut self) -> Result<(), InterviewError>;
    fn stop_listening(&mut self);
}

/// Shows utterances on screen for as long as they would take to say
#[derive(Debug, Clone, Copy)]
pub struct ScreenVoice {
    ms_per_word: u64,
}

impl ScreenVoice {
    pub fn new(ms_per_word: u64) -> Self {
        Self { ms_per_word }
    }
}

impl Voice for ScreenVoice {
    fn speak(&mut self, text: &str) -> Result<Duration, InterviewError> {
        let words = word_count(text).max(1) as u64;
        Ok(Duration::from_millis(words * self.ms_per_word))
    }

    fn start_listening(&mut self) -> Result<(), InterviewError> {
        Ok(())
    }

    fn stop_listening(&mut self) {}
}

/// Interviewer reading from a fixed question list
#[derive(Debug, Clone)]
pub struct ScriptedInterviewer {
    greeting: String,
    questions: Vec<String>,
    target_words: usize,
    replies: usize,
}

const ACKNOWLEDGEMENTS: [&str; 3] = [
    "Thanks, that's helpful.",
    "Good, I appreciate the detail.",
    "Understood.",
];

impl ScriptedInterviewer {
    pub fn new(greeting: impl Into<String>, questions: Vec<String>, target_words: usize) -> Self {
        Self {
            greeting: greeting.into(),
            questions,
            target_words: target_words.max(1),
            replies: 0,
        }
    }
}

impl Interviewer for ScriptedInterviewer {
    fn greeting(&mut self) -> Result<String, InterviewError> {
        Ok(self.greeting.clone())
    }

    fn next_question(&mut self, asked: usize) -> Result<Option<String>, InterviewError> {
        Ok(self.questions.get(asked).cloned())
    }

    fn respond(&mut self, _question: &str, answer: &str) -> Result<String, InterviewError> {
        let reply = if word_count(answer) < 5 {
            "Could you expand on answers like that? Let's move on."
        } else {
            ACKNOWLEDGEMENTS[self.replies % ACKNOWLEDGEMENTS.len()]
        };
        self.replies += 1;
        Ok(reply.to_string())
    }

    /// Answer length against the target, averaged over the whole script
    fn score(&self, exchanges: &[Exchange]) -> u8 {
        if self.questions.is_empty() {
            return 0;
        }
        let total: usize = exchanges
            .iter()
            .take(self.questions.len())
            .map(|e| percent(word_count(&e.answer), self.target_words) as usize)
            .sum();
        (total / self.questions.len()).min(100) as u8
    }
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    PlaybackFinished,
    SilenceElapsed,
    RetryListening,
    RetryProcessing,
}

pub struct InterviewRound {
    config: InterviewConfig,
    interviewer: Box<dyn Interviewer>,
    voice: Box<dyn Voice>,
    media: Box<dyn MediaDevices>,
    phase: InterviewPhase,
    timers: Timers<Pending>,
    silence: Option<TimerId>,
    stream: Option<MediaStream>,
    utterance: Option<String>,
    question: Option<String>,
    asked: usize,
    transcript: String,
    pending_answer: Option<String>,
    exchanges: Vec<Exchange>,
    retried: bool,
    error: Option<String>,
    feedback: String,
}

impl std::fmt::Debug for InterviewRound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewRound")
            .field("phase", &self.phase)
            .field("asked", &self.asked)
            .field("exchanges", &self.exchanges.len())
            .finish()
    }
}

impl InterviewRound {
    pub fn new(
        config: InterviewConfig,
        interviewer: Box<dyn Interviewer>,
        voice: Box<dyn Voice>,
        media: Box<dyn MediaDevices>,
    ) -> Self {
        Self {
            config,
            interviewer,
            voice,
            media,
            phase: InterviewPhase::NotStarted,
            timers: Timers::new(),
            silence: None,
            stream: None,
            utterance: None,
            question: None,
            asked: 0,
            transcript: String::new(),
            pending_answer: None,
            exchanges: Vec::new(),
            retried: false,
            error: None,
            feedback: String::new(),
        }
    }

    pub fn phase(&self) -> InterviewPhase {
        self.phase
    }

    /// What the interviewer is saying or last said
    pub fn utterance(&self) -> Option<&str> {
        self.utterance.as_deref()
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn is_recording(&self) -> bool {
        self.stream.is_some()
    }

    fn transition(
        &mut self,
        to: InterviewPhase,
        action: &'static str,
    ) -> Result<(), InterviewError> {
        if !self.phase.can_become(to) {
            return Err(InterviewError::InvalidTransition {
                phase: self.phase.into(),
                action,
            });
        }
        debug!(from = %self.phase, %to, "interview phase");
        self.phase = to;
        Ok(())
    }

    pub fn start(&mut self) -> Result<(), InterviewError> {
        self.transition(InterviewPhase::Greeting, "start the interview")?;
        info!("interview started");
        match self.interviewer.greeting() {
            Ok(text) => self.say(text),
            Err(e) => self.end(Some(e)),
        }
        Ok(())
    }

    /// Candidate input: the answer while listening, feedback once ended
    pub fn edit(&mut self, edit: Edit) -> bool {
        match self.phase {
            InterviewPhase::ListeningForAnswer if self.stream.is_some() => {
                apply_edit(&mut self.transcript, edit);
                self.restart_silence_window();
                true
            }
            InterviewPhase::Ended => {
                apply_edit(&mut self.feedback, edit);
                true
            }
            _ => false,
        }
    }

    /// Manual stop-and-submit of the current answer
    pub fn submit_answer(&mut self) -> Result<(), InterviewError> {
        if self.phase != InterviewPhase::ListeningForAnswer {
            return Err(InterviewError::InvalidTransition {
                phase: self.phase.into(),
                action: "submit an answer",
            });
        }
        if self.transcript.trim().is_empty() {
            return Err(InterviewError::EmptyAnswer);
        }
        self.close_answer()
    }

    /// Failure reported by the speech recognizer while listening
    pub fn recognition_failed(&mut self, message: &str, recoverable: bool) {
        if self.phase != InterviewPhase::ListeningForAnswer {
            return;
        }
        self.cancel_silence_window();
        self.release_microphone();
        if recoverable && !self.retried {
            self.retried = true;
            warn!(error = message, "speech recognition failed, retrying");
            self.timers
                .schedule(self.config.retry_delay, Pending::RetryListening);
        } else {
            self.end(Some(InterviewError::Recognition(message.to_string())));
        }
    }

    /// Candidate ends the interview early
    pub fn end_interview(&mut self) -> Result<(), InterviewError> {
        if matches!(self.phase, InterviewPhase::Ended | InterviewPhase::ResultSubmitted) {
            return Err(InterviewError::InvalidTransition {
                phase: self.phase.into(),
                action: "end the interview",
            });
        }
        self.end(None);
        Ok(())
    }

    pub fn advance(&mut self, elapsed: Duration) {
        for pending in self.timers.advance(elapsed) {
            match pending {
                Pending::PlaybackFinished => match self.phase {
                    InterviewPhase::Greeting => self.ask_next(None),
                    InterviewPhase::AwaitingQuestion => self.begin_listening(),
                    _ => {}
                },
                Pending::SilenceElapsed => {
                    self.silence = None;
                    if self.phase == InterviewPhase::ListeningForAnswer
                        && !self.transcript.trim().is_empty()
                    {
                        debug!("silence window elapsed, submitting answer");
                        if let Err(e) = self.close_answer() {
                            warn!(error = %e, "auto-submit failed");
                        }
                    }
                }
                Pending::RetryListening => {
                    if self.phase == InterviewPhase::ListeningForAnswer {
                        self.open_microphone();
                    }
                }
                Pending::RetryProcessing => {
                    if self.phase == InterviewPhase::ProcessingAnswer {
                        self.process_answer();
                    }
                }
            }
        }
    }

    fn say(&mut self, text: String) {
        let playback = self.voice.speak(&text).unwrap_or_else(|e| {
            warn!(error = %e, "speech playback failed, showing text only");
            Duration::ZERO
        });
        self.utterance = Some(text);
        self.timers.schedule(playback, Pending::PlaybackFinished);
    }

    fn ask_next(&mut self, reply: Option<String>) {
        if let Err(e) = self.transition(InterviewPhase::AwaitingQuestion, "ask a question") {
            warn!(error = %e, "interview out of step");
            return;
        }
        if self.asked >= self.config.max_questions {
            self.conclude(reply);
            return;
        }
        match self.interviewer.next_question(self.asked) {
            Ok(Some(question)) => {
                self.asked += 1;
                let text = match reply {
                    Some(reply) => format!("{reply} {question}"),
                    None => question.clone(),
                };
                self.question = Some(question);
                self.retried = false;
                self.say(text);
            }
            Ok(None) => self.conclude(reply),
            Err(e) => self.end(Some(e)),
        }
    }

    fn conclude(&mut self, reply: Option<String>) {
        let closing = "That concludes the interview. Thank you for your time.";
        self.utterance = Some(match reply {
            Some(reply) => format!("{reply} {closing}"),
            None => closing.to_string(),
        });
        self.end(None);
    }

    fn begin_listening(&mut self) {
        if let Err(e) = self.transition(InterviewPhase::ListeningForAnswer, "start listening") {
            warn!(error = %e, "interview out of step");
            return;
        }
        self.transcript.clear();
        self.open_microphone();
    }

    fn open_microphone(&mut self) {
        match self.media.acquire(MediaKind::Microphone) {
            Ok(stream) => self.stream = Some(stream),
            Err(e) => {
                self.end(Some(InterviewError::Recognition(e.to_string())));
                return;
            }
        }
        if let Err(e) = self.voice.start_listening() {
            let message = e.to_string();
            self.recognition_failed(&message, true);
        }
    }

    fn release_microphone(&mut self) {
        if self.stream.take().is_some() {
            self.voice.stop_listening();
        }
    }

    fn restart_silence_window(&mut self) {
        self.cancel_silence_window();
        self.silence = Some(
            self.timers
                .schedule(self.config.silence_window, Pending::SilenceElapsed),
        );
    }

    fn cancel_silence_window(&mut self) {
        if let Some(id) = self.silence.take() {
            self.timers.cancel(id);
        }
    }

    fn close_answer(&mut self) -> Result<(), InterviewError> {
        self.transition(InterviewPhase::ProcessingAnswer, "process an answer")?;
        self.cancel_silence_window();
        self.release_microphone();
        self.pending_answer = Some(std::mem::take(&mut self.transcript).trim().to_string());
        self.retried = false;
        self.process_answer();
        Ok(())
    }

    fn process_answer(&mut self) {
        let (Some(question), Some(answer)) = (self.question.clone(), self.pending_answer.clone())
        else {
            self.end(None);
            return;
        };
        match self.interviewer.respond(&question, &answer) {
            Ok(reply) => {
                self.pending_answer = None;
                self.exchanges.push(Exchange {
                    question,
                    answer,
                    reply: Some(reply.clone()),
                });
                self.ask_next(Some(reply));
            }
            Err(e) if !self.retried => {
                self.retried = true;
                warn!(error = %e, "interviewer response failed, retrying");
                self.timers
                    .schedule(self.config.retry_delay, Pending::RetryProcessing);
            }
            Err(e) => {
                self.pending_answer = None;
                self.exchanges.push(Exchange {
                    question,
                    answer,
                    reply: None,
                });
                self.end(Some(e));
            }
        }
    }

    fn end(&mut self, error: Option<InterviewError>) {
        if matches!(self.phase, InterviewPhase::Ended | InterviewPhase::ResultSubmitted) {
            return;
        }
        self.timers.clear();
        self.silence = None;
        self.release_microphone();
        if self.phase == InterviewPhase::ListeningForAnswer && !self.transcript.trim().is_empty() {
            if let Some(question) = self.question.clone() {
                self.exchanges.push(Exchange {
                    question,
                    answer: std::mem::take(&mut self.transcript).trim().to_string(),
                    reply: None,
                });
            }
        }
        if let Some(e) = &error {
            warn!(error = %e, "interview ended early");
        }
        self.error = error.map(|e| e.to_string());
        self.phase = InterviewPhase::Ended;
        info!(answered = self.exchanges.len(), "interview ended");
    }
}

impl Drop for InterviewRound {
    fn drop(&mut self) {
        self.timers.clear();
        self.release_microphone();
    }
}

impl RoundTask for InterviewRound {
    fn kind(&self) -> RoundKind {
        RoundKind::Interview
    }

    fn progress(&self) -> (usize, usize) {
        let done = matches!(
            self.phase,
            InterviewPhase::Ended | InterviewPhase::ResultSubmitted
        );
        (usize::from(done), 1)
    }

    fn finish(&mut self, _forced: bool) {
        self.end(None);
        if let Err(e) = self.transition(InterviewPhase::ResultSubmitted, "submit the result") {
            warn!(error = %e, "interview result already submitted");
        }
    }

    fn grade(&self) -> (u8, RoundDetails) {
        let feedback = self.feedback.trim();
        (
            self.interviewer.score(&self.exchanges),
            RoundDetails::Interview {
                questions: self.asked,
                answered: self.exchanges.len(),
                ended_early: self.error.clone(),
                feedback: (!feedback.is_empty()).then(|| feedback.to_string()),
            },
        )
    }

    fn advance(&mut self, elapsed: Duration) {
        InterviewRound::advance(self, elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FakeMedia;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::atomic::Ordering;

    const PLAYBACK: Duration = Duration::from_millis(500);

    #[derive(Default)]
    struct VoiceLog {
        spoken: Vec<String>,
        listening: bool,
        listen_failures: usize,
    }

    #[derive(Clone, Default)]
    struct FakeVoice(Rc<RefCell<VoiceLog>>);

    impl Voice for FakeVoice {
        fn speak(&mut self, text: &str) -> Result<Duration, InterviewError> {
            let mut log = self.0.borrow_mut();
            assert!(!log.listening, "spoke while listening");
            log.spoken.push(text.to_string());
            Ok(PLAYBACK)
        }

        fn start_listening(&mut self) -> Result<(), InterviewError> {
            let mut log = self.0.borrow_mut();
            if log.listen_failures > 0 {
                log.listen_failures -= 1;
                return Err(InterviewError::Recognition("network".into()));
            }
            log.listening = true;
            Ok(())
        }

        fn stop_listening(&mut self) {
            self.0.borrow_mut().listening = false;
        }
    }

    struct FlakyInterviewer {
        inner: ScriptedInterviewer,
        respond_failures: usize,
        question_error_at: Option<usize>,
    }

    impl Interviewer for FlakyInterviewer {
        fn greeting(&mut self) -> Result<String, InterviewError> {
            self.inner.greeting()
        }

        fn next_question(&mut self, asked: usize) -> Result<Option<String>, InterviewError> {
            if self.question_error_at == Some(asked) {
                return Err(InterviewError::Interviewer("service down".into()));
            }
            self.inner.next_question(asked)
        }

        fn respond(&mut self, question: &str, answer: &str) -> Result<String, InterviewError> {
            if self.respond_failures > 0 {
                self.respond_failures -= 1;
                return Err(InterviewError::Interviewer("timeout".into()));
            }
            self.inner.respond(question, answer)
        }

        fn score(&self, exchanges: &[Exchange]) -> u8 {
            self.inner.score(exchanges)
        }
    }

    fn script() -> ScriptedInterviewer {
        ScriptedInterviewer::new(
            "Hello and welcome.",
            vec!["Tell me about yourself.".into(), "Why this role?".into()],
            10,
        )
    }

    struct Harness {
        round: InterviewRound,
        voice: FakeVoice,
        live: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    }

    fn harness(interviewer: Box<dyn Interviewer>) -> Harness {
        let voice = FakeVoice::default();
        let media = FakeMedia::new();
        let live = media.live_streams();
        let round = InterviewRound::new(
            InterviewConfig::default(),
            interviewer,
            Box::new(voice.clone()),
            Box::new(media),
        );
        Harness { round, voice, live }
    }

    fn scripted() -> Harness {
        harness(Box::new(script()))
    }

    fn say(round: &mut InterviewRound, text: &str) {
        for c in text.chars() {
            assert!(round.edit(Edit::Char(c)));
        }
    }

    /// Start and play through the greeting and first question
    fn to_first_answer(h: &mut Harness) {
        h.round.start().unwrap();
        assert_eq!(h.round.phase(), InterviewPhase::Greeting);
        h.round.advance(PLAYBACK);
        assert_eq!(h.round.phase(), InterviewPhase::AwaitingQuestion);
        h.round.advance(PLAYBACK);
        assert_eq!(h.round.phase(), InterviewPhase::ListeningForAnswer);
    }

    #[test]
    fn listening_starts_only_after_playback_finishes() {
        let mut h = scripted();
        h.round.start().unwrap();
        h.round.advance(PLAYBACK);
        h.round.advance(PLAYBACK - Duration::from_millis(1));
        assert_eq!(h.round.phase(), InterviewPhase::AwaitingQuestion);
        assert!(!h.round.edit(Edit::Char('x')));
        assert!(!h.round.is_recording());
        h.round.advance(Duration::from_millis(1));
        assert!(h.round.is_recording());
        assert_eq!(h.round.question(), Some("Tell me about yourself."));
    }

    #[test]
    fn silence_window_auto_submits_answer() {
        let mut h = scripted();
        to_first_answer(&mut h);
        say(&mut h.round, "I build terminal tools");
        h.round.advance(Duration::from_millis(1999));
        assert_eq!(h.round.phase(), InterviewPhase::ListeningForAnswer);
        say(&mut h.round, " in Rust");
        h.round.advance(Duration::from_millis(1999));
        assert_eq!(h.round.phase(), InterviewPhase::ListeningForAnswer);
        h.round.advance(Duration::from_millis(1));
        assert_eq!(h.round.phase(), InterviewPhase::AwaitingQuestion);
        assert_eq!(h.round.exchanges()[0].answer, "I build terminal tools in Rust");
        assert!(!h.voice.0.borrow().listening);
        assert_eq!(h.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn silence_without_speech_does_not_submit() {
        let mut h = scripted();
        to_first_answer(&mut h);
        h.round.advance(Duration::from_secs(10));
        assert_eq!(h.round.phase(), InterviewPhase::ListeningForAnswer);
        assert_eq!(h.round.submit_answer(), Err(InterviewError::EmptyAnswer));
    }

    #[test]
    fn full_interview_reaches_result_submitted() {
        let mut h = scripted();
        to_first_answer(&mut h);
        say(&mut h.round, "one two three four five six seven eight nine ten");
        h.round.submit_answer().unwrap();
        h.round.advance(PLAYBACK);
        say(&mut h.round, "one two three four five");
        h.round.submit_answer().unwrap();
        assert_eq!(h.round.phase(), InterviewPhase::Ended);
        assert!(h.round.utterance().unwrap().contains("concludes"));
        assert!(h.round.is_complete());

        say(&mut h.round, "Nice flow");
        h.round.finish(false);
        assert_eq!(h.round.phase(), InterviewPhase::ResultSubmitted);
        let (score, details) = h.round.grade();
        assert_eq!(score, 75);
        assert_eq!(
            details,
            RoundDetails::Interview {
                questions: 2,
                answered: 2,
                ended_early: None,
                feedback: Some("Nice flow".into())
            }
        );
    }

    #[test]
    fn no_speaking_while_listening() {
        let mut h = scripted();
        to_first_answer(&mut h);
        say(&mut h.round, "answer");
        // FakeVoice asserts that speak is never called while listening
        h.round.submit_answer().unwrap();
        assert_eq!(h.voice.0.borrow().spoken.len(), 2 + 1);
    }

    #[test]
    fn recoverable_recognition_error_retries_once() {
        let mut h = scripted();
        to_first_answer(&mut h);
        say(&mut h.round, "partial");
        h.round.recognition_failed("network", true);
        assert!(!h.round.is_recording());
        assert_eq!(h.round.phase(), InterviewPhase::ListeningForAnswer);
        h.round.advance(Duration::from_secs(1));
        assert!(h.round.is_recording());
        assert_eq!(h.round.transcript(), "partial");

        h.round.recognition_failed("network", true);
        assert_eq!(h.round.phase(), InterviewPhase::Ended);
        assert!(h.round.error().unwrap().contains("network"));
        assert_eq!(h.round.exchanges().len(), 1);
    }

    #[test]
    fn failed_listen_start_is_retried() {
        let mut h = scripted();
        h.voice.0.borrow_mut().listen_failures = 1;
        to_first_answer(&mut h);
        assert!(!h.round.is_recording());
        h.round.advance(Duration::from_secs(1));
        assert!(h.round.is_recording());
        assert!(h.voice.0.borrow().listening);
    }

    #[test]
    fn question_fetch_error_ends_interview_early() {
        let mut h = harness(Box::new(FlakyInterviewer {
            inner: script(),
            respond_failures: 0,
            question_error_at: Some(0),
        }));
        h.round.start().unwrap();
        h.round.advance(PLAYBACK);
        assert_eq!(h.round.phase(), InterviewPhase::Ended);
        assert_matches!(h.round.error(), Some(msg) if msg.contains("service down"));
    }

    #[test]
    fn processing_failure_retries_after_delay() {
        let mut h = harness(Box::new(FlakyInterviewer {
            inner: script(),
            respond_failures: 1,
            question_error_at: None,
        }));
        to_first_answer(&mut h);
        say(&mut h.round, "an answer");
        h.round.submit_answer().unwrap();
        assert_eq!(h.round.phase(), InterviewPhase::ProcessingAnswer);
        assert!(!h.round.edit(Edit::Char('x')));
        h.round.advance(Duration::from_secs(1));
        assert_eq!(h.round.phase(), InterviewPhase::AwaitingQuestion);
        assert_eq!(h.round.exchanges().len(), 1);
    }

    #[test]
    fn repeated_processing_failure_ends_interview() {
        let mut h = harness(Box::new(FlakyInterviewer {
            inner: script(),
            respond_failures: 2,
            question_error_at: None,
        }));
        to_first_answer(&mut h);
        say(&mut h.round, "an answer");
        h.round.submit_answer().unwrap();
        h.round.advance(Duration::from_secs(1));
        assert_eq!(h.round.phase(), InterviewPhase::Ended);
        assert_eq!(h.round.exchanges()[0].reply, None);
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let mut h = scripted();
        assert_matches!(
            h.round.submit_answer(),
            Err(InterviewError::InvalidTransition { phase: "not started", .. })
        );
        h.round.start().unwrap();
        assert_matches!(
            h.round.start(),
            Err(InterviewError::InvalidTransition { phase: "greeting", .. })
        );
        h.round.end_interview().unwrap();
        assert_matches!(
            h.round.end_interview(),
            Err(InterviewError::InvalidTransition { phase: "ended", .. })
        );
    }

    #[test]
    fn phase_labels_match_display() {
        for phase in [
            InterviewPhase::NotStarted,
            InterviewPhase::AwaitingQuestion,
            InterviewPhase::ResultSubmitted,
        ] {
            let label: &'static str = phase.into();
            assert_eq!(label, phase.to_string());
        }
    }

    #[test]
    fn ending_mid_answer_releases_microphone_and_cancels_timers() {
        let mut h = scripted();
        to_first_answer(&mut h);
        say(&mut h.round, "halfway");
        h.round.end_interview().unwrap();
        assert_eq!(h.live.load(Ordering::SeqCst), 0);
        assert!(!h.voice.0.borrow().listening);
        h.round.advance(Duration::from_secs(5));
        assert_eq!(h.round.phase(), InterviewPhase::Ended);
        assert_eq!(h.round.exchanges()[0].answer, "halfway");
    }

    #[test]
    fn dropping_round_releases_microphone() {
        let mut h = scripted();
        to_first_answer(&mut h);
        assert_eq!(h.live.load(Ordering::SeqCst), 1);
        drop(h.round);
        assert_eq!(h.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn max_questions_caps_the_script() {
        let voice = FakeVoice::default();
        let mut round = InterviewRound::new(
            InterviewConfig {
                max_questions: 1,
                ..InterviewConfig::default()
            },
            Box::new(script()),
            Box::new(voice),
            Box::new(FakeMedia::new()),
        );
        round.start().unwrap();
        round.advance(PLAYBACK);
        round.advance(PLAYBACK);
        say(&mut round, "done");
        round.submit_answer().unwrap();
        assert_eq!(round.phase(), InterviewPhase::Ended);
        assert_eq!(round.exchanges().len(), 1);
    }

    #[test]
    fn scripted_score_counts_unasked_questions_as_zero() {
        let s = script();
        let exchanges = vec![Exchange {
            question: "q".into(),
            answer: "one two three four five six seven eight nine ten eleven".into(),
            reply: None,
        }];
        assert_eq!(s.score(&exchanges), 50);
    }
}
