//! Terminal realisation of the fullscreen, visibility, and navigation
//! capabilities the proctoring core depends on.
//!
//! "Fullscreen" is the alternate screen at or above a minimum size. Shrinking
//! the window below that size counts as leaving fullscreen; losing terminal
//! focus counts as the page being hidden; quit keys count as an unload attempt.

use std::io;

use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::error::PlatformError;
use crate::runtime::AppEvent;

/// Raw integrity-relevant signal, before any policy is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformSignal {
    VisibilityHidden,
    VisibilityVisible,
    FullscreenChanged { active: bool },
    UnloadAttempt,
}

/// Capabilities the proctoring subsystem needs from its host
pub trait Platform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError>;
    fn exit_fullscreen(&mut self) -> Result<(), PlatformError>;
    fn is_fullscreen(&self) -> bool;
    /// Start delivering focus/fullscreen signals
    fn watch_signals(&mut self) -> Result<(), PlatformError>;
    fn unwatch_signals(&mut self);
    /// Map a runtime event to an integrity signal, if it is one
    fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal>;
}

impl<P: Platform + ?Sized> Platform for &mut P {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        (**self).request_fullscreen()
    }
    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        (**self).exit_fullscreen()
    }
    fn is_fullscreen(&self) -> bool {
        (**self).is_fullscreen()
    }
    fn watch_signals(&mut self) -> Result<(), PlatformError> {
        (**self).watch_signals()
    }
    fn unwatch_signals(&mut self) {
        (**self).unwatch_signals()
    }
    fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal> {
        (**self).translate(event)
    }
}

impl<P: Platform + ?Sized> Platform for Box<P> {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        (**self).request_fullscreen()
    }
    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        (**self).exit_fullscreen()
    }
    fn is_fullscreen(&self) -> bool {
        (**self).is_fullscreen()
    }
    fn watch_signals(&mut self) -> Result<(), PlatformError> {
        (**self).watch_signals()
    }
    fn unwatch_signals(&mut self) {
        (**self).unwatch_signals()
    }
    fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal> {
        (**self).translate(event)
    }
}

/// Returns true for the keys that try to leave the assessment
pub fn is_quit_key(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
}

/// Stateful mapping from runtime events to platform signals
#[derive(Debug, Clone)]
pub struct SignalTranslator {
    min_width: u16,
    min_height: u16,
    size_ok: bool,
}

impl SignalTranslator {
    pub fn new(min_width: u16, min_height: u16, initial: (u16, u16)) -> Self {
        Self {
            min_width,
            min_height,
            size_ok: initial.0 >= min_width && initial.1 >= min_height,
        }
    }

    pub fn size_ok(&self) -> bool {
        self.size_ok
    }

    pub fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal> {
        match event {
            AppEvent::FocusLost => Some(PlatformSignal::VisibilityHidden),
            AppEvent::FocusGained => Some(PlatformSignal::VisibilityVisible),
            AppEvent::Resize(w, h) => {
                let ok = *w >= self.min_width && *h >= self.min_height;
                if ok == self.size_ok {
                    return None;
                }
                self.size_ok = ok;
                Some(PlatformSignal::FullscreenChanged { active: ok })
            }
            AppEvent::Key(key) if is_quit_key(key) => Some(PlatformSignal::UnloadAttempt),
            _ => None,
        }
    }
}

/// Platform backed by the controlling terminal
#[derive(Debug)]
pub struct TerminalPlatform {
    translator: SignalTranslator,
    alternate: bool,
    watching: bool,
}

impl TerminalPlatform {
    pub fn new(min_width: u16, min_height: u16) -> Self {
        let size = terminal::size().unwrap_or((0, 0));
        Self {
            translator: SignalTranslator::new(min_width, min_height, size),
            alternate: false,
            watching: false,
        }
    }
}

impl Platform for TerminalPlatform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        if !self.alternate {
            execute!(io::stdout(), EnterAlternateScreen)?;
            self.alternate = true;
        }
        if !self.translator.size_ok() {
            let (w, h) = terminal::size()?;
            return Err(PlatformError::Unsupported {
                capability: "fullscreen",
                reason: format!(
                    "terminal is {w}x{h}, at least {}x{} is required",
                    self.translator.min_width, self.translator.min_height
                ),
            });
        }
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        if self.alternate {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate = false;
        }
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.alternate
    }

    fn watch_signals(&mut self) -> Result<(), PlatformError> {
        if !self.watching {
            execute!(io::stdout(), EnableFocusChange)?;
            self.watching = true;
        }
        Ok(())
    }

    fn unwatch_signals(&mut self) {
        if self.watching {
            if let Err(e) = execute!(io::stdout(), DisableFocusChange) {
                tracing::warn!(error = %e, "failed to disable focus reporting");
            }
            self.watching = false;
        }
    }

    fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal> {
        self.translator.translate(event)
    }
}

/// In-memory platform for headless runs and tests
#[derive(Debug, Default)]
pub struct FakePlatform {
    pub fullscreen: bool,
    pub deny_fullscreen: bool,
    pub watching: bool,
    pub fullscreen_requests: u32,
    pub exit_requests: u32,
    pub unwatch_calls: u32,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// A platform that refuses fullscreen, like a browser without the API
    pub fn denying() -> Self {
        Self {
            deny_fullscreen: true,
            ..Self::default()
        }
    }
}

impl Platform for FakePlatform {
    fn request_fullscreen(&mut self) -> Result<(), PlatformError> {
        self.fullscreen_requests += 1;
        if self.deny_fullscreen {
            return Err(PlatformError::PermissionDenied {
                capability: "fullscreen",
            });
        }
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), PlatformError> {
        self.exit_requests += 1;
        self.fullscreen = false;
        Ok(())
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn watch_signals(&mut self) -> Result<(), PlatformError> {
        self.watching = true;
        Ok(())
    }

    fn unwatch_signals(&mut self) {
        if self.watching {
            self.unwatch_calls += 1;
        }
        self.watching = false;
    }

    fn translate(&mut self, event: &AppEvent) -> Option<PlatformSignal> {
        match event {
            AppEvent::FocusLost => Some(PlatformSignal::VisibilityHidden),
            AppEvent::FocusGained => Some(PlatformSignal::VisibilityVisible),
            AppEvent::Key(key) if is_quit_key(key) => Some(PlatformSignal::UnloadAttempt),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, modifiers))
    }

    #[test]
    fn focus_events_map_to_visibility() {
        let mut t = SignalTranslator::new(80, 24, (100, 40));
        assert_eq!(
            t.translate(&AppEvent::FocusLost),
            Some(PlatformSignal::VisibilityHidden)
        );
        assert_eq!(
            t.translate(&AppEvent::FocusGained),
            Some(PlatformSignal::VisibilityVisible)
        );
    }

    #[test]
    fn resize_reports_only_threshold_crossings() {
        let mut t = SignalTranslator::new(80, 24, (100, 40));
        assert_eq!(t.translate(&AppEvent::Resize(90, 30)), None);
        assert_eq!(
            t.translate(&AppEvent::Resize(60, 30)),
            Some(PlatformSignal::FullscreenChanged { active: false })
        );
        assert_eq!(t.translate(&AppEvent::Resize(50, 20)), None);
        assert_eq!(
            t.translate(&AppEvent::Resize(80, 24)),
            Some(PlatformSignal::FullscreenChanged { active: true })
        );
    }

    #[test]
    fn quit_keys_are_unload_attempts() {
        let mut t = SignalTranslator::new(80, 24, (100, 40));
        assert_eq!(
            t.translate(&key(KeyCode::Esc, KeyModifiers::NONE)),
            Some(PlatformSignal::UnloadAttempt)
        );
        assert_eq!(
            t.translate(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(PlatformSignal::UnloadAttempt)
        );
        assert_eq!(t.translate(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(t.translate(&AppEvent::Tick), None);
    }

    #[test]
    fn small_initial_terminal_is_not_fullscreen() {
        let t = SignalTranslator::new(80, 24, (70, 24));
        assert!(!t.size_ok());
    }

    #[test]
    fn fake_platform_counts_requests() {
        let mut p = FakePlatform::denying();
        assert!(p.request_fullscreen().is_err());
        assert_eq!(p.fullscreen_requests, 1);
        assert!(!p.is_fullscreen());
    }
}
