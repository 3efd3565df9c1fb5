use gauntlet::round::RoundBody;
use ratatui::{buffer::Buffer, layout::Rect, Frame};

use crate::{
    ui::{
        render_complete, render_ended, render_not_found, render_permission, render_results,
        render_round,
    },
    App, AppState,
};

pub type Hint = (&'static str, &'static str);

/// A UI Screen boundary: draws the body between the shared header and footer
pub trait Screen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer);
    /// Key hints shown in the footer
    fn hints(&self, _app: &App) -> Vec<Hint> {
        Vec::new()
    }
    fn render(&self, app: &mut App, f: &mut Frame) {
        f.render_widget(&*app, f.area());
    }
}

pub struct PermissionScreen;

impl Screen for PermissionScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_permission(app, area, buf);
    }

    fn hints(&self, _app: &App) -> Vec<Hint> {
        vec![("r", "check again"), ("q", "quit")]
    }
}

pub struct NotFoundScreen;

impl Screen for NotFoundScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_not_found(app, area, buf);
    }

    fn hints(&self, _app: &App) -> Vec<Hint> {
        vec![("q", "quit")]
    }
}

/// The active round; hints follow the round kind
pub struct RoundScreen;

impl Screen for RoundScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_round(app, area, buf);
    }

    fn hints(&self, app: &App) -> Vec<Hint> {
        let mut hints = match app.assessment.runner().map(|r| r.body()) {
            Some(RoundBody::Quiz(_)) => vec![
                ("1-9", "answer"),
                ("←/→", "move"),
                ("alt+1-9", "jump"),
                ("home", "first unanswered"),
            ],
            Some(RoundBody::Coding(_)) => vec![("tab", "next problem"), ("ctrl+r", "run tests")],
            Some(RoundBody::Written(_)) => vec![("tab", "next prompt"), ("ctrl+u", "clear")],
            Some(RoundBody::Communication(_)) => vec![("tab", "next task"), ("ctrl+u", "clear")],
            Some(RoundBody::Interview(_)) => vec![("enter", "answer"), ("ctrl+e", "end interview")],
            None => Vec::new(),
        };
        hints.push(("ctrl+s", "submit"));
        hints.push(("esc", "leave"));
        hints
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_results(app, area, buf);
    }

    fn hints(&self, app: &App) -> Vec<Hint> {
        let mut hints = Vec::new();
        if app.assessment.can_continue() {
            hints.push(("enter", "continue"));
        }
        hints.push(("r", "retry round"));
        hints.push(("d", "dashboard"));
        hints.push(("esc", "leave"));
        hints
    }
}

pub struct CompleteScreen;

impl Screen for CompleteScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_complete(app, area, buf);
    }

    fn hints(&self, _app: &App) -> Vec<Hint> {
        vec![("q", "quit")]
    }
}

pub struct EndedScreen;

impl Screen for EndedScreen {
    fn render_body(&self, app: &App, area: Rect, buf: &mut Buffer) {
        render_ended(app, area, buf);
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Permission => Box::new(PermissionScreen),
        AppState::NotFound => Box::new(NotFoundScreen),
        AppState::Round => Box::new(RoundScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Complete => Box::new(CompleteScreen),
        AppState::Ended => Box::new(EndedScreen),
    }
}
