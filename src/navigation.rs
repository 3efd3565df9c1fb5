use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webbrowser::Browser;

use crate::error::NavigationError;

/// Why the candidate left the assessment screen
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    #[strum(serialize = "completed")]
    Completed,
    #[strum(serialize = "exited_for_cause")]
    ExitedForCause,
    #[strum(serialize = "returned_to_dashboard")]
    ReturnedToDashboard,
    #[strum(serialize = "abandoned")]
    Abandoned,
}

/// Where to send the candidate once the assessment screen closes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub target: String,
    pub reason: ExitReason,
}

impl Handoff {
    pub fn dashboard(process_id: &str, reason: ExitReason) -> Self {
        Self {
            target: format!("/dashboard?process={process_id}&exit={reason}"),
            reason,
        }
    }
}

pub trait Navigator {
    fn navigate(&mut self, handoff: &Handoff) -> Result<(), NavigationError>;
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn navigate(&mut self, handoff: &Handoff) -> Result<(), NavigationError> {
        (**self).navigate(handoff)
    }
}

impl<N: Navigator + ?Sized> Navigator for Box<N> {
    fn navigate(&mut self, handoff: &Handoff) -> Result<(), NavigationError> {
        (**self).navigate(handoff)
    }
}

/// Opens the dashboard route in the system browser
#[derive(Debug, Clone)]
pub struct BrowserNavigator {
    base_url: String,
    enabled: bool,
}

impl BrowserNavigator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            enabled: true,
        }
    }

    /// Log the hand-off without opening anything
    pub fn disabled(base_url: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(base_url)
        }
    }

    pub fn url_for(&self, handoff: &Handoff) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), handoff.target)
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&mut self, handoff: &Handoff) -> Result<(), NavigationError> {
        let url = self.url_for(handoff);
        info!(%url, reason = %handoff.reason, "handing off");
        if !self.enabled {
            return Ok(());
        }
        if !Browser::is_available() {
            warn!(%url, "no browser available for hand-off");
            return Err(NavigationError::NoBrowser(url));
        }
        webbrowser::open(&url).map_err(|source| NavigationError::Open {
            target: url,
            source,
        })
    }
}

/// Keeps every hand-off it receives
#[derive(Debug, Default, Clone)]
pub struct RecordingNavigator {
    pub handoffs: Vec<Handoff>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, handoff: &Handoff) -> Result<(), NavigationError> {
        self.handoffs.push(handoff.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_route_carries_reason() {
        let h = Handoff::dashboard("hp-1", ExitReason::ExitedForCause);
        assert_eq!(h.target, "/dashboard?process=hp-1&exit=exited_for_cause");
    }

    #[test]
    fn url_joins_base_and_target() {
        let nav = BrowserNavigator::disabled("https://example.test/");
        let h = Handoff::dashboard("hp-2", ExitReason::Completed);
        assert_eq!(
            nav.url_for(&h),
            "https://example.test/dashboard?process=hp-2&exit=completed"
        );
    }

    #[test]
    fn disabled_navigator_succeeds_without_browser() {
        let mut nav = BrowserNavigator::disabled("http://localhost");
        assert!(nav
            .navigate(&Handoff::dashboard("x", ExitReason::Abandoned))
            .is_ok());
    }

    #[test]
    fn recording_navigator_keeps_order() {
        let mut nav = RecordingNavigator::new();
        nav.navigate(&Handoff::dashboard("a", ExitReason::Completed))
            .unwrap();
        nav.navigate(&Handoff::dashboard("b", ExitReason::Abandoned))
            .unwrap();
        assert_eq!(nav.handoffs.len(), 2);
        assert_eq!(nav.handoffs[1].reason, ExitReason::Abandoned);
    }
}
