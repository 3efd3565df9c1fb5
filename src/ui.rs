pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use gauntlet::{
    media::PermissionState,
    navigation::ExitReason,
    proctor::ProctoringPhase,
    round::{
        communication::CommunicationTaskKind, interview::InterviewPhase, CodingRound,
        CommunicationRound, InterviewRound, QuizRound, RoundBody, RoundDetails, WrittenRound,
    },
    round_timer::{format_clock, Urgency},
    session::SessionStatus,
    util::word_count,
};

use crate::{ui::screen::current_screen, App};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;
const CURSOR: &str = "▏";

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints(
                [
                    Constraint::Length(2), // title + progress
                    Constraint::Length(2), // proctoring banner
                    Constraint::Min(1),
                    Constraint::Length(2), // flash + key hints
                ]
                .as_ref(),
            )
            .split(area);

        let screen = current_screen(&self.state());
        render_header(self, chunks[0], buf);
        render_banner(self, chunks[1], buf);
        screen.render_body(self, chunks[2], buf);
        render_footer(self, &screen.hints(self), chunks[3], buf);

        if self.proctor.leave_prompt() {
            render_leave_prompt(self, area, buf);
        }
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(area);

    let mut title = vec![Span::styled("gauntlet", bold())];
    if let Some(runner) = app.assessment.runner() {
        let round = runner.descriptor();
        let total = app.assessment.session().map(|s| s.round_count).unwrap_or(0);
        title.push(Span::raw(format!(
            "  Round {} of {}: {}",
            round.sequence, total, round.name
        )));

        let timer = runner.timer();
        let style = match timer.urgency() {
            Urgency::Normal => bold(),
            Urgency::Warning => bold().fg(Color::Yellow),
            Urgency::Critical => bold().fg(Color::Red),
        };
        Paragraph::new(Span::styled(format_clock(timer.remaining_seconds()), style))
            .alignment(Alignment::Right)
            .render(rows[0], buf);
    }
    Paragraph::new(Line::from(title)).render(rows[0], buf);

    if let Some(session) = app.assessment.session() {
        Gauge::default()
            .gauge_style(Style::default().fg(Color::Green))
            .ratio(app.assessment.progress().clamp(0.0, 1.0))
            .label(format!(
                "{} of {} rounds",
                session.rounds_completed(),
                session.round_count
            ))
            .render(rows[1], buf);
    }
}

fn render_banner(app: &App, area: Rect, buf: &mut Buffer) {
    let line = if let Some(warning) = app.proctor.warning() {
        Line::from(Span::styled(
            format!(" {warning} "),
            bold().fg(Color::Black).bg(Color::Yellow),
        ))
    } else if let Some(notice) = app.proctor.notice() {
        Line::from(Span::styled(notice, dim()))
    } else {
        return;
    };
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(area, buf);
}

fn render_footer(app: &App, hints: &[(&str, &str)], area: Rect, buf: &mut Buffer) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)].as_ref())
        .split(area);

    if let Some(flash) = &app.flash {
        Paragraph::new(Span::styled(flash.as_str(), Style::default().fg(Color::Yellow)))
            .alignment(Alignment::Center)
            .render(rows[0], buf);
    }
    let help = hints
        .iter()
        .map(|(key, action)| format!("{key} {action}"))
        .join("  ·  ");
    Paragraph::new(Span::styled(help, dim()))
        .alignment(Alignment::Center)
        .render(rows[1], buf);
}

fn render_leave_prompt(app: &App, area: Rect, buf: &mut Buffer) {
    let session = app.proctor.session();
    let lines = [
        "Leave the assessment?".to_string(),
        format!(
            "That was exit attempt {} of {}.",
            session.violation_count, session.max_attempts
        ),
        "Leaving now ends this attempt.".to_string(),
        "y leave  ·  n stay".to_string(),
    ];
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 6;
    let popup = centered(area, width, lines.len() as u16 + 2);

    let text = lines
        .iter()
        .enumerate()
        .map(|(i, l)| match i {
            0 => Line::from(Span::styled(l.as_str(), bold())),
            _ => Line::from(l.as_str()),
        })
        .collect::<Vec<_>>();
    Clear.render(popup, buf);
    Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(bold().fg(Color::Red)),
        )
        .render(popup, buf);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Renders `lines` in the vertical middle of `area`
fn render_centered(lines: Vec<Line>, area: Rect, buf: &mut Buffer) {
    let top = area.height.saturating_sub(lines.len() as u16) / 2;
    let inner = Rect {
        y: area.y + top,
        height: area.height - top,
        ..area
    };
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(inner, buf);
}

/// Rows scrolled off the top so the end of `text` stays visible
fn overflow(text: &str, width: u16, height: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let rows: usize = text
        .split('\n')
        .map(|line| line.width().max(1).div_ceil(width as usize))
        .sum();
    rows.saturating_sub(height as usize) as u16
}

fn render_text_box(title: String, text: &str, area: Rect, buf: &mut Buffer) {
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    block.render(area, buf);

    let content = format!("{text}{CURSOR}");
    let scroll = overflow(&content, inner.width, inner.height);
    Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .render(inner, buf);
}

fn split_rows(area: Rect, constraints: &[Constraint]) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area)
        .to_vec()
}

pub(crate) fn render_permission(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = match app.gate.state() {
        PermissionState::Unchecked => vec![
            Line::from(Span::styled("Checking devices", bold())),
            Line::from("Making sure your microphone can be opened."),
        ],
        PermissionState::Denied(reason) => vec![
            Line::from(Span::styled("Device check failed", bold().fg(Color::Red))),
            Line::default(),
            Line::from(reason.as_str()),
            Line::default(),
            Line::from(Span::styled(
                "Fix the device and press r to check again.",
                dim(),
            )),
        ],
        PermissionState::Granted => vec![Line::from(Span::styled(
            "Devices ready",
            bold().fg(Color::Green),
        ))],
    };
    render_centered(lines, area, buf);
}

pub(crate) fn render_not_found(app: &App, area: Rect, buf: &mut Buffer) {
    let reason = match app.assessment.status() {
        SessionStatus::NotFound(reason) => reason.as_str(),
        _ => "",
    };
    render_centered(
        vec![
            Line::from(Span::styled("Assessment not found", bold().fg(Color::Red))),
            Line::default(),
            Line::from(reason),
        ],
        area,
        buf,
    );
}

pub(crate) fn render_round(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(runner) = app.assessment.runner() else {
        return;
    };
    match runner.body() {
        RoundBody::Quiz(quiz) => render_quiz(quiz, area, buf),
        RoundBody::Coding(coding) => render_coding(coding, area, buf),
        RoundBody::Communication(comm) => render_communication(comm, area, buf),
        RoundBody::Written(written) => render_written(written, area, buf),
        RoundBody::Interview(interview) => render_interview(interview, area, buf),
    }
}

fn render_quiz(quiz: &QuizRound, area: Rect, buf: &mut Buffer) {
    let Some(question) = quiz.current_question() else {
        return;
    };
    let index = quiz.current();
    let total = quiz.questions().len();
    let chosen = quiz.answer_for(index);

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Question {} of {}", index + 1, total),
            dim(),
        )),
        Line::default(),
        Line::from(Span::styled(question.prompt.as_str(), bold())),
        Line::default(),
    ];
    for (i, option) in question.options.iter().enumerate() {
        let (marker, style) = if chosen == Some(i) {
            ("●", bold().fg(Color::Cyan))
        } else {
            ("○", Style::default())
        };
        lines.push(Line::from(Span::styled(
            format!("  {} {marker} {option}", i + 1),
            style,
        )));
    }
    lines.push(Line::default());

    let strip = (0..total)
        .map(|i| {
            let mut style = if quiz.answer_for(i).is_some() {
                Style::default().fg(Color::Green)
            } else {
                dim()
            };
            if i == index {
                style = style.add_modifier(Modifier::REVERSED);
            }
            Span::styled(format!(" {} ", i + 1), style)
        })
        .collect::<Vec<_>>();
    lines.push(Line::from(strip));
    lines.push(Line::from(Span::styled(
        format!("{} of {total} answered", quiz.answered_count()),
        dim(),
    )));

    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .render(area, buf);
}

fn render_coding(coding: &CodingRound, area: Rect, buf: &mut Buffer) {
    let Some(problem) = coding.current_problem() else {
        return;
    };
    let index = coding.current();
    let rows = split_rows(
        area,
        &[
            Constraint::Percentage(35),
            Constraint::Min(3),
            Constraint::Length(2),
        ],
    );

    Paragraph::new(vec![
        Line::from(Span::styled(
            format!(
                "Problem {} of {}: {}",
                index + 1,
                coding.problems().len(),
                problem.title
            ),
            bold(),
        )),
        Line::default(),
        Line::from(problem.statement.as_str()),
    ])
    .wrap(Wrap { trim: true })
    .render(rows[0], buf);

    render_text_box(
        " Solution ".to_string(),
        coding.code(index).unwrap_or_default(),
        rows[1],
        buf,
    );

    let status = match coding.last_run(index) {
        None => Line::from(Span::styled("Tests not run yet.", dim())),
        Some(run) if run.all_passed() => Line::from(Span::styled(
            format!("All {} tests pass.", run.total),
            bold().fg(Color::Green),
        )),
        Some(run) => Line::from(vec![
            Span::styled(
                format!("{} of {} tests pass. ", run.passed, run.total),
                bold().fg(Color::Red),
            ),
            Span::raw(format!("Failing: {}", run.failures.join(", "))),
        ]),
    };
    Paragraph::new(status)
        .wrap(Wrap { trim: true })
        .render(rows[2], buf);
}

fn render_communication(comm: &CommunicationRound, area: Rect, buf: &mut Buffer) {
    let Some(task) = comm.current_task() else {
        return;
    };
    let index = comm.current();
    let mut header = vec![
        Line::from(Span::styled(
            format!("Task {} of {}", index + 1, comm.tasks().len()),
            dim(),
        )),
        Line::from(Span::styled(task.instruction.as_str(), bold())),
    ];
    let response = comm.response(index).unwrap_or_default();
    let title = match task.kind {
        CommunicationTaskKind::Dictation => {
            header.push(Line::default());
            header.push(Line::from(Span::styled(
                task.reference.as_str(),
                Style::default().fg(Color::Cyan),
            )));
            " Your transcription ".to_string()
        }
        CommunicationTaskKind::Response => {
            format!(" Response ({}/{} words) ", word_count(response), task.min_words)
        }
    };

    let rows = split_rows(area, &[Constraint::Percentage(40), Constraint::Min(3)]);
    Paragraph::new(header)
        .wrap(Wrap { trim: true })
        .render(rows[0], buf);
    render_text_box(title, response, rows[1], buf);
}

fn render_written(written: &WrittenRound, area: Rect, buf: &mut Buffer) {
    let Some(prompt) = written.current_prompt() else {
        return;
    };
    let index = written.current();
    let answer = written.answer(index).unwrap_or_default();
    let rows = split_rows(area, &[Constraint::Length(4), Constraint::Min(3)]);

    Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Prompt {} of {}", index + 1, written.prompts().len()),
            dim(),
        )),
        Line::from(Span::styled(prompt.prompt.as_str(), bold())),
    ])
    .wrap(Wrap { trim: true })
    .render(rows[0], buf);

    render_text_box(
        format!(
            " Answer ({}/{} words) ",
            word_count(answer),
            prompt.min_words
        ),
        answer,
        rows[1],
        buf,
    );
}

fn render_interview(interview: &InterviewRound, area: Rect, buf: &mut Buffer) {
    let rows = split_rows(
        area,
        &[
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(1),
        ],
    );

    let said = interview
        .utterance()
        .or(interview.question())
        .unwrap_or_default();
    let voice_style = if interview.phase().is_speaking() {
        bold().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Paragraph::new(vec![
        Line::from(Span::styled("Interviewer", dim())),
        Line::from(Span::styled(said, voice_style)),
    ])
    .wrap(Wrap { trim: true })
    .render(rows[0], buf);

    if interview.phase() == InterviewPhase::Ended {
        render_text_box(
            " Feedback for the interviewer (optional) ".to_string(),
            interview.feedback(),
            rows[1],
            buf,
        );
    } else {
        render_text_box(
            " Your answer ".to_string(),
            interview.transcript(),
            rows[1],
            buf,
        );
    }

    let mut status = vec![Span::styled(interview.phase().to_string(), dim())];
    if interview.is_recording() {
        status.push(Span::styled("  ● recording", bold().fg(Color::Red)));
    }
    status.push(Span::styled(
        format!("  {} answered", interview.exchanges().len()),
        dim(),
    ));
    if let Some(error) = interview.error() {
        status.push(Span::styled(
            format!("  {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    Paragraph::new(Line::from(status)).render(rows[2], buf);
}

fn detail_lines(details: &RoundDetails) -> Vec<String> {
    match details {
        RoundDetails::Quiz {
            correct,
            answered,
            total,
        } => vec![format!(
            "{correct} of {total} correct, {answered} answered"
        )],
        RoundDetails::Coding {
            passed_tests,
            total_tests,
            runs,
        } => vec![format!(
            "{passed_tests} of {total_tests} tests passing after {runs} test runs"
        )],
        RoundDetails::Communication {
            completed_tasks,
            total_tasks,
            accuracy,
        } => vec![format!(
            "{completed_tasks} of {total_tasks} tasks completed, {accuracy}% transcription accuracy"
        )],
        RoundDetails::Written {
            answered,
            total,
            keywords_hit,
            keywords_total,
        } => vec![
            format!("{answered} of {total} prompts answered"),
            format!("{keywords_hit} of {keywords_total} key points covered"),
        ],
        RoundDetails::Interview {
            questions,
            answered,
            ended_early,
            feedback,
        } => {
            let mut lines = vec![format!("{answered} of {questions} questions answered")];
            if let Some(reason) = ended_early {
                lines.push(format!("Ended early: {reason}"));
            }
            if let Some(feedback) = feedback {
                lines.push(format!("Your feedback: {feedback}"));
            }
            lines
        }
    }
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(result) = app.assessment.last_result() else {
        return;
    };
    let verdict = if result.qualified {
        Span::styled("Qualified", bold().fg(Color::Green))
    } else {
        Span::styled("Not qualified", bold().fg(Color::Red))
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("{} round", result.round_kind), bold())),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{}%", result.score), bold()),
            Span::styled(
                format!("  pass mark {}%  ", result.round_kind.pass_threshold()),
                dim(),
            ),
            verdict,
        ]),
    ];
    if result.forced {
        lines.push(Line::from(Span::styled(
            "Submitted automatically when time ran out.",
            dim(),
        )));
    }
    lines.push(Line::default());
    lines.push(Line::from(result.feedback.as_str()));
    lines.push(Line::default());
    lines.extend(detail_lines(&result.details).into_iter().map(Line::from));

    if let Some(error) = app.assessment.last_error() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            format!("Could not save the result: {error}"),
            Style::default().fg(Color::Red),
        )));
    }
    render_centered(lines, area, buf);
}

pub(crate) fn render_complete(app: &App, area: Rect, buf: &mut Buffer) {
    let rounds = app
        .assessment
        .session()
        .map(|s| s.round_count)
        .unwrap_or_default();
    let mut lines = vec![
        Line::from(Span::styled(
            "Assessment complete",
            bold().fg(Color::Green),
        )),
        Line::default(),
        Line::from(format!("All {rounds} rounds are done.")),
    ];
    if let Some(handoff) = app.assessment.handoff() {
        lines.push(Line::from(Span::styled(
            format!("Continue at {}", handoff.target),
            dim(),
        )));
    }
    render_centered(lines, area, buf);
}

pub(crate) fn render_ended(app: &App, area: Rect, buf: &mut Buffer) {
    let lines = if app.proctor.phase() == ProctoringPhase::Terminated {
        let session = app.proctor.session();
        vec![
            Line::from(Span::styled(
                "Assessment terminated",
                bold().fg(Color::Red),
            )),
            Line::default(),
            Line::from(format!(
                "Too many exit attempts ({} of {}).",
                session.violation_count.min(session.max_attempts),
                session.max_attempts
            )),
            Line::from(Span::styled("Returning to the dashboard...", dim())),
        ]
    } else {
        let reason = match app.assessment.status() {
            SessionStatus::Ended(ExitReason::ReturnedToDashboard) => {
                "You returned to the dashboard."
            }
            SessionStatus::Ended(ExitReason::Abandoned) => "You left the assessment.",
            _ => "This attempt is over.",
        };
        vec![
            Line::from(Span::styled("Assessment ended", bold())),
            Line::default(),
            Line::from(reason),
        ]
    };
    render_centered(lines, area, buf);
}
