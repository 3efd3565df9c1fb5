pub mod ui;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use gauntlet::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    content::{BundledContent, ContentProvider},
    hiring::{HiringProcessApi, MemoryHiringApi},
    logging,
    media::{MediaDevices, MediaKind, PermissionGate, TerminalMedia},
    navigation::{BrowserNavigator, ExitReason, Navigator},
    platform::{is_quit_key, Platform, TerminalPlatform},
    proctor::{
        ProctoringConfig, ProctoringController, ProctoringEvent, ProctoringPhase,
        ThresholdPolicy,
    },
    round::{
        interview::{InterviewConfig, InterviewPhase},
        Edit, RoundBody, RunnerEvent,
    },
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner, Stopwatch},
    session::{
        AssessmentController, DisqualificationPolicy, LifecycleState, SessionPolicy,
        SessionStatus,
    },
    store::SqliteHiringStore,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};
use time_humanize::{Accuracy, HumanTime, Tense};

use crate::ui::screen::current_screen;

const TICK_RATE_MS: u64 = 100;

/// proctored terminal assessment runner
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs a multi-round hiring assessment full-screen in the terminal. \
                  Leaving the window, shrinking it below the minimum size, or trying to quit \
                  counts as an exit attempt; too many attempts end the assessment."
)]
pub struct Cli {
    /// resume an existing hiring process by id
    #[clap(short = 'p', long, conflicts_with = "assessment")]
    process: Option<String>,

    /// start a new hiring process from a bundled assessment template
    #[clap(short = 'a', long)]
    assessment: Option<String>,

    /// hiring process type recorded with a new process
    #[clap(short = 'k', long, default_value = "practice")]
    kind: String,

    /// list stored hiring processes and exit
    #[clap(long)]
    list: bool,

    /// list bundled assessment templates and exit
    #[clap(long)]
    templates: bool,

    /// write every stored round result to a CSV file and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// keep the hiring process in memory; nothing is written to disk
    #[clap(long)]
    dry_run: bool,

    /// log the dashboard hand-off instead of opening a browser
    #[clap(long)]
    no_browser: bool,

    /// exit attempts allowed before the assessment is terminated
    #[clap(short = 'm', long)]
    max_attempts: Option<u32>,

    /// whether the attempt that hits the limit also shows a warning
    #[clap(long, value_enum)]
    threshold_policy: Option<ThresholdPolicy>,

    /// what continue does after a round that was not passed
    #[clap(long, value_enum)]
    disqualification: Option<DisqualificationPolicy>,

    /// leave rounds open when their time runs out instead of submitting them
    #[clap(long)]
    no_auto_submit: bool,

    /// require a camera before the assessment starts
    #[clap(long)]
    require_camera: bool,

    /// base url the dashboard hand-off opens
    #[clap(long)]
    dashboard_url: Option<String>,

    /// smallest terminal width that still counts as fullscreen
    #[clap(long)]
    min_width: Option<u16>,

    /// smallest terminal height that still counts as fullscreen
    #[clap(long)]
    min_height: Option<u16>,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Folds flag overrides into the stored settings
    fn apply(&self, config: &mut Config) {
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(policy) = self.threshold_policy {
            config.threshold_policy = policy;
        }
        if let Some(policy) = self.disqualification {
            config.disqualification_policy = policy;
        }
        if self.no_auto_submit {
            config.auto_submit_on_expiry = false;
        }
        if self.require_camera {
            config.require_camera = true;
        }
        if let Some(url) = &self.dashboard_url {
            config.dashboard_url = url.clone();
        }
        if let Some(w) = self.min_width {
            config.min_width = w;
        }
        if let Some(h) = self.min_height {
            config.min_height = h;
        }
    }

    fn start(&self) -> Start {
        match &self.process {
            Some(id) => Start::Resume(id.clone()),
            None => Start::New {
                process_type: self.kind.clone(),
                assessment_id: self
                    .assessment
                    .clone()
                    .unwrap_or_else(|| "starter".to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Start {
    Resume(String),
    New {
        process_type: String,
        assessment_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Permission,
    NotFound,
    Round,
    Results,
    Complete,
    Ended,
}

pub type Hiring = Box<dyn HiringProcessApi>;
pub type Nav = Box<dyn Navigator>;

pub struct App {
    pub proctor: ProctoringController<Box<dyn Platform>>,
    pub assessment: AssessmentController<Hiring, Nav>,
    pub gate: PermissionGate,
    media: Box<dyn MediaDevices>,
    start: Start,
    proctoring_live: bool,
    pub flash: Option<String>,
    pub should_quit: bool,
}

impl App {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        start: Start,
        config: &Config,
        platform: Box<dyn Platform>,
        hiring: Hiring,
        navigator: Nav,
        content: Box<dyn ContentProvider>,
        media: Box<dyn MediaDevices>,
    ) -> Self {
        let mut required = vec![MediaKind::Microphone];
        if config.require_camera {
            required.push(MediaKind::Camera);
        }
        Self {
            proctor: ProctoringController::new(platform, ProctoringConfig::from(config)),
            assessment: AssessmentController::new(
                hiring,
                navigator,
                content,
                SessionPolicy::from(config),
            ),
            gate: PermissionGate::new(required),
            media,
            start,
            proctoring_live: false,
            flash: None,
            should_quit: false,
        }
    }

    pub fn state(&self) -> AppState {
        if !self.gate.is_granted() {
            return AppState::Permission;
        }
        match self.assessment.status() {
            SessionStatus::NotFound(_) => AppState::NotFound,
            SessionStatus::Ended(_) => AppState::Ended,
            SessionStatus::Active => match self.assessment.lifecycle() {
                Some(LifecycleState::RoundActive) => AppState::Round,
                Some(LifecycleState::RoundCompletedAwaitingAdvance) => AppState::Results,
                Some(LifecycleState::AssessmentComplete) => AppState::Complete,
                None => AppState::NotFound,
            },
        }
    }

    pub fn proctoring_live(&self) -> bool {
        self.proctoring_live
    }

    /// Checks devices, then opens the assessment and starts proctoring
    pub fn begin(&mut self) {
        if !self.gate.is_granted() {
            self.gate.check(&mut *self.media);
            if !self.gate.is_granted() {
                return;
            }
        }
        if self.assessment.session().is_none() {
            match self.start.clone() {
                Start::Resume(id) => self.assessment.load(&id),
                Start::New {
                    process_type,
                    assessment_id,
                } => self.assessment.start(&process_type, &assessment_id),
            }
        }
        if self.state() == AppState::Round || self.state() == AppState::Results {
            let events = self.proctor.mount();
            self.proctoring_live = true;
            self.apply_proctoring(events);
        }
    }

    /// Advances every virtual clock by the wall time since the last step
    pub fn advance(&mut self, elapsed: Duration) {
        if self.proctoring_live {
            let events = self.proctor.advance(elapsed);
            self.apply_proctoring(events);
        }
        for event in self.assessment.advance(elapsed) {
            match event {
                RunnerEvent::TimeUp => self.flash = Some("Time is up.".to_string()),
                RunnerEvent::Completed(result) if result.forced => {
                    self.flash = Some("Time is up, the round was submitted.".to_string())
                }
                _ => {}
            }
        }
        self.settle();
    }

    pub fn on_event(&mut self, event: &AppEvent) {
        if let AppEvent::Key(key) = event {
            if key.kind == KeyEventKind::Release {
                return;
            }
            if self.proctor.leave_prompt() {
                self.on_leave_prompt_key(key);
                return;
            }
        }
        if self.proctoring_live {
            let events = self.proctor.handle_event(event);
            self.apply_proctoring(events);
        }
        if let AppEvent::Key(key) = event {
            if !(self.proctoring_live && is_quit_key(key)) {
                self.on_key(key);
            }
        }
        self.settle();
    }

    fn apply_proctoring(&mut self, events: Vec<ProctoringEvent>) {
        for event in events {
            match event {
                ProctoringEvent::FullscreenUnavailable(message)
                | ProctoringEvent::SignalsUnavailable(message) => self.flash = Some(message),
                ProctoringEvent::Terminated(_) => {
                    self.assessment.terminate(ExitReason::ExitedForCause)
                }
                ProctoringEvent::HandOffRequested => {
                    self.assessment.finish_handoff();
                    self.leave();
                }
                ProctoringEvent::Warning(_)
                | ProctoringEvent::WarningDismissed
                | ProctoringEvent::ConfirmNavigation => {}
            }
        }
    }

    /// Stops proctoring once there is nothing left to protect. The screen stays
    /// in fullscreen until `leave`, since the final screen is still drawn.
    fn settle(&mut self) {
        if !self.proctoring_live || self.proctor.phase() == ProctoringPhase::Terminated {
            return;
        }
        if self.assessment.handoff().is_some()
            || matches!(self.state(), AppState::Complete | AppState::Ended)
        {
            self.proctor.stand_down();
            self.proctoring_live = false;
        }
    }

    /// Ends the run. Fullscreen is released by the final `unmount` once the
    /// event loop has stopped drawing.
    fn leave(&mut self) {
        self.proctor.stand_down();
        self.proctoring_live = false;
        self.should_quit = true;
    }

    fn on_leave_prompt_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.proctor.dismiss_leave_prompt();
                self.assessment.terminate(ExitReason::Abandoned);
                self.assessment.finish_handoff();
                self.leave();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Enter => {
                self.proctor.dismiss_leave_prompt();
            }
            _ => {}
        }
    }

    fn on_key(&mut self, key: &KeyEvent) {
        match self.state() {
            AppState::Permission => match key.code {
                KeyCode::Char('r') => self.begin(),
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                _ => {}
            },
            AppState::NotFound | AppState::Complete => match key.code {
                KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => self.leave(),
                _ => {}
            },
            AppState::Ended => {
                if self.proctor.phase() != ProctoringPhase::Terminated {
                    self.leave();
                }
            }
            AppState::Results => self.on_results_key(key),
            AppState::Round => self.on_round_key(key),
        }
    }

    fn on_results_key(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Char('c') => {
                self.flash = self.assessment.continue_to_next().err().map(|e| e.to_string());
            }
            KeyCode::Char('r') => {
                self.flash = self.assessment.retry_round().err().map(|e| e.to_string());
            }
            KeyCode::Char('d') => {
                self.assessment.return_to_dashboard();
                self.leave();
            }
            _ => {}
        }
    }

    fn on_round_key(&mut self, key: &KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('s') {
            self.flash = self.assessment.submit_round().err().map(|e| e.to_string());
            return;
        }
        let jump = match key.code {
            KeyCode::Char(c @ '1'..='9') if key.modifiers.contains(KeyModifiers::ALT) => {
                Some(c as usize - '1' as usize)
            }
            _ => None,
        };
        let Some(body) = self
            .assessment
            .runner_mut()
            .and_then(|runner| runner.body_mut())
        else {
            return;
        };

        if let Some(index) = jump {
            match body {
                RoundBody::Quiz(quiz) => quiz.jump(index),
                RoundBody::Written(written) => written.jump(index),
                _ => {}
            }
            return;
        }

        let mut flash = None;
        match body {
            RoundBody::Quiz(quiz) => match key.code {
                KeyCode::Char(c @ '1'..='9') => {
                    quiz.select(c as usize - '1' as usize);
                }
                KeyCode::Right | KeyCode::Down | KeyCode::Tab => quiz.next(),
                KeyCode::Left | KeyCode::Up | KeyCode::BackTab => quiz.previous(),
                KeyCode::Home => {
                    if let Some(i) = quiz.first_unanswered() {
                        quiz.jump(i);
                    }
                }
                _ => {}
            },
            RoundBody::Coding(coding) => match key.code {
                KeyCode::Char('r') if ctrl => {
                    flash = coding
                        .run_tests()
                        .map(|run| format!("{} of {} tests passed", run.passed, run.total));
                }
                KeyCode::Tab => coding.next(),
                KeyCode::BackTab => coding.previous(),
                _ => {
                    if let Some(edit) = edit_for(key) {
                        coding.edit(edit);
                    }
                }
            },
            RoundBody::Communication(comm) => match key.code {
                KeyCode::Tab => comm.next(),
                KeyCode::BackTab => comm.previous(),
                _ => {
                    if let Some(edit) = edit_for(key) {
                        comm.edit(edit);
                    }
                }
            },
            RoundBody::Written(written) => match key.code {
                KeyCode::Tab => written.next(),
                KeyCode::BackTab => written.previous(),
                _ => {
                    if let Some(edit) = edit_for(key) {
                        written.edit(edit);
                    }
                }
            },
            RoundBody::Interview(interview) => match key.code {
                KeyCode::Enter if interview.phase() != InterviewPhase::Ended => {
                    flash = interview.submit_answer().err().map(|e| e.to_string());
                }
                KeyCode::Char('e') if ctrl => {
                    flash = interview.end_interview().err().map(|e| e.to_string());
                }
                _ => {
                    if let Some(edit) = edit_for(key) {
                        interview.edit(edit);
                    }
                }
            },
        }
        self.flash = flash;
    }
}

/// Maps a key to a text edit, leaving control chords to the caller
fn edit_for(key: &KeyEvent) -> Option<Edit> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('u') if ctrl => Some(Edit::Clear),
        KeyCode::Char(_) if ctrl || key.modifiers.contains(KeyModifiers::ALT) => None,
        KeyCode::Char(c) => Some(Edit::Char(c)),
        KeyCode::Backspace => Some(Edit::Backspace),
        KeyCode::Enter => Some(Edit::Newline),
        _ => None,
    }
}

fn print_templates(content: &BundledContent) {
    for template in content.catalog() {
        let rounds = template.rounds.iter().map(|r| r.kind).join(", ");
        println!("{:<16} {} ({rounds})", template.id, template.name);
    }
}

fn print_processes(store: &SqliteHiringStore) -> Result<(), Box<dyn Error>> {
    let processes = store.list_processes()?;
    if processes.is_empty() {
        println!("no hiring processes yet");
        return Ok(());
    }
    let now = Local::now();
    for p in processes {
        let age = (now - p.started_at).num_seconds().max(0);
        let started = HumanTime::from_seconds(age).to_text_en(Accuracy::Rough, Tense::Past);
        println!(
            "{}  {:<14} round {}/{}  {:<16} started {}",
            p.id,
            p.assessment_id,
            p.current_round.min(p.round_count),
            p.round_count,
            p.status.to_string(),
            started
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);
    if cli.save_config {
        config_store.save(&config)?;
        println!("settings saved to {}", config_store.path().display());
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&path, "info") {
            eprintln!("logging disabled: {e}");
        }
    }

    let content = BundledContent::load(InterviewConfig::from(&config))?;
    let catalog = content.catalog().to_vec();

    if cli.templates {
        print_templates(&content);
        return Ok(());
    }
    if cli.list || cli.export.is_some() {
        let store = SqliteHiringStore::open_default(catalog)?;
        if cli.list {
            print_processes(&store)?;
        }
        if let Some(path) = &cli.export {
            let rows = store.export_results_csv(path)?;
            println!("exported {rows} round results to {}", path.display());
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let hiring: Hiring = if cli.dry_run {
        Box::new(MemoryHiringApi::new(catalog))
    } else {
        Box::new(SqliteHiringStore::open_default(catalog)?)
    };
    let navigator: Nav = if cli.no_browser {
        Box::new(BrowserNavigator::disabled(&config.dashboard_url))
    } else {
        Box::new(BrowserNavigator::new(&config.dashboard_url))
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(
        cli.start(),
        &config,
        Box::new(TerminalPlatform::new(config.min_width, config.min_height)),
        hiring,
        navigator,
        Box::new(content),
        Box::new(TerminalMedia),
    );
    let res = start_tui(&mut terminal, &mut app);
    app.proctor.unmount();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(handoff) = app.assessment.handoff() {
        println!("{} ({})", handoff.target, handoff.reason);
    }
    if let Some(e) = app.assessment.last_error() {
        eprintln!("{e}");
    }

    res
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut stopwatch = Stopwatch::start();

    app.begin();
    loop {
        terminal.draw(|f| ui(app, f))?;
        if app.should_quit {
            break;
        }
        let event = runner.step();
        app.advance(stopwatch.lap());
        app.on_event(&event);
    }

    Ok(())
}

fn ui(app: &mut App, f: &mut Frame) {
    let screen = current_screen(&app.state());
    screen.render(app, f);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gauntlet::{
        hiring::{AssessmentTemplate, TemplateRound},
        media::FakeMedia,
        navigation::RecordingNavigator,
        platform::FakePlatform,
        round::RoundKind,
    };

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> AppEvent {
        AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn catalog() -> Vec<AssessmentTemplate> {
        vec![AssessmentTemplate {
            id: "quiz-pair".into(),
            name: "Two screenings".into(),
            description: String::new(),
            rounds: vec![
                TemplateRound {
                    kind: RoundKind::Screening,
                    name: "Screening".into(),
                    duration_minutes: 10,
                },
                TemplateRound {
                    kind: RoundKind::Screening,
                    name: "Screening again".into(),
                    duration_minutes: 10,
                },
            ],
        }]
    }

    fn test_app(config: &Config, media: FakeMedia) -> App {
        let content = BundledContent::load(InterviewConfig::from(config)).unwrap();
        App::new(
            Start::New {
                process_type: "practice".into(),
                assessment_id: "quiz-pair".into(),
            },
            config,
            Box::new(FakePlatform::new()),
            Box::new(MemoryHiringApi::new(catalog())),
            Box::new(RecordingNavigator::new()),
            Box::new(content),
            Box::new(media),
        )
    }

    fn answer_all(app: &mut App) {
        let n = match app.assessment.runner().map(|r| r.body()) {
            Some(RoundBody::Quiz(quiz)) => quiz.questions().len(),
            other => panic!("expected a quiz, got {other:?}"),
        };
        for _ in 0..n {
            app.on_event(&key(KeyCode::Char('1')));
            app.on_event(&key(KeyCode::Right));
        }
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["gauntlet"]);
        assert_eq!(cli.process, None);
        assert_eq!(cli.kind, "practice");
        assert!(!cli.dry_run);
        assert_eq!(
            cli.start(),
            Start::New {
                process_type: "practice".into(),
                assessment_id: "starter".into()
            }
        );
    }

    #[test]
    fn test_cli_resume_conflicts_with_assessment() {
        let cli = Cli::parse_from(["gauntlet", "-p", "hp-1"]);
        assert_eq!(cli.start(), Start::Resume("hp-1".into()));
        assert!(Cli::try_parse_from(["gauntlet", "-p", "hp-1", "-a", "starter"]).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from([
            "gauntlet",
            "-m",
            "5",
            "--threshold-policy",
            "both",
            "--disqualification",
            "allow-continue",
            "--no-auto-submit",
            "--min-width",
            "100",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.threshold_policy, ThresholdPolicy::Both);
        assert_eq!(
            config.disqualification_policy,
            DisqualificationPolicy::AllowContinue
        );
        assert!(!config.auto_submit_on_expiry);
        assert_eq!(config.min_width, 100);
        assert_eq!(config.min_height, 24);
    }

    #[test]
    fn test_denied_camera_keeps_permission_screen() {
        let config = Config {
            require_camera: true,
            ..Config::default()
        };
        let mut app = test_app(&config, FakeMedia::denying(MediaKind::Camera));
        app.begin();
        assert_eq!(app.state(), AppState::Permission);
        assert!(app.assessment.session().is_none());
        assert!(!app.proctoring_live());

        app.on_event(&key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_begin_starts_round_and_proctoring() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        assert_eq!(app.state(), AppState::Round);
        assert!(app.proctoring_live());
        assert_eq!(app.proctor.phase(), ProctoringPhase::Monitoring);
    }

    #[test]
    fn test_incomplete_submit_is_flashed() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        app.on_event(&ctrl('s'));
        assert_eq!(app.state(), AppState::Round);
        assert!(app.flash.is_some());
    }

    #[test]
    fn test_quit_key_prompts_instead_of_quitting() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        app.on_event(&key(KeyCode::Esc));
        assert!(!app.should_quit);
        assert!(app.proctor.leave_prompt());
        assert_eq!(app.proctor.session().violation_count, 1);

        app.on_event(&key(KeyCode::Char('n')));
        assert!(!app.proctor.leave_prompt());
        assert_eq!(app.state(), AppState::Round);
    }

    #[test]
    fn test_confirming_leave_abandons_and_hands_off() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        app.on_event(&key(KeyCode::Esc));
        app.on_event(&key(KeyCode::Char('y')));
        assert!(app.should_quit);
        assert!(!app.proctoring_live());
        assert_eq!(
            app.assessment.handoff().map(|h| h.reason),
            Some(ExitReason::Abandoned)
        );
    }

    #[test]
    fn test_repeated_focus_loss_terminates_after_handoff_delay() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        for _ in 0..3 {
            app.on_event(&AppEvent::FocusLost);
            app.on_event(&AppEvent::FocusGained);
        }
        assert_eq!(app.proctor.phase(), ProctoringPhase::Terminated);
        assert_eq!(app.state(), AppState::Ended);
        assert!(app.assessment.handoff().is_none());
        assert!(!app.should_quit);

        app.on_event(&key(KeyCode::Char('q')));
        assert!(!app.should_quit);

        app.advance(Duration::from_secs(3));
        assert!(app.should_quit);
        assert_eq!(
            app.assessment.handoff().map(|h| h.reason),
            Some(ExitReason::ExitedForCause)
        );
    }

    #[test]
    fn test_submitted_round_shows_results() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        answer_all(&mut app);
        app.on_event(&ctrl('s'));
        assert_eq!(app.state(), AppState::Results);
        assert!(app.assessment.last_result().is_some());
        assert!(app.proctoring_live());
    }

    #[test]
    fn test_complete_screen_stays_fullscreen_until_quit() {
        let config = Config {
            disqualification_policy: DisqualificationPolicy::AllowContinue,
            ..Config::default()
        };
        let mut app = test_app(&config, FakeMedia::new());
        app.begin();
        for _ in 0..2 {
            answer_all(&mut app);
            app.on_event(&ctrl('s'));
            assert_eq!(app.state(), AppState::Results);
            app.on_event(&key(KeyCode::Enter));
        }
        assert_eq!(app.state(), AppState::Complete);
        assert!(!app.should_quit);
        assert!(!app.proctoring_live());
        assert!(app.proctor.platform().is_fullscreen());

        app.on_event(&AppEvent::FocusLost);
        assert_eq!(app.proctor.session().violation_count, 0);

        app.on_event(&key(KeyCode::Char('q')));
        assert!(app.should_quit);
        assert!(app.proctor.platform().is_fullscreen());

        app.proctor.unmount();
        assert!(!app.proctor.platform().is_fullscreen());
    }

    #[test]
    fn test_dashboard_from_results_hands_off() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        answer_all(&mut app);
        app.on_event(&ctrl('s'));
        app.on_event(&key(KeyCode::Char('d')));
        assert!(app.should_quit);
        assert_eq!(
            app.assessment.handoff().map(|h| h.reason),
            Some(ExitReason::ReturnedToDashboard)
        );
    }

    #[test]
    fn test_time_up_submits_round() {
        let mut app = test_app(&Config::default(), FakeMedia::new());
        app.begin();
        app.advance(Duration::from_secs(10 * 60));
        assert_eq!(app.state(), AppState::Results);
        assert_eq!(app.assessment.last_result().map(|r| r.forced), Some(true));
        assert!(app.flash.is_some());
    }

    #[test]
    fn test_edit_for_keys() {
        let plain = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(edit_for(&plain), Some(Edit::Char('x')));
        let clear = KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL);
        assert_eq!(edit_for(&clear), Some(Edit::Clear));
        let chord = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(edit_for(&chord), None);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(edit_for(&enter), Some(Edit::Newline));
    }
}
