//! Camera and microphone access as scoped acquisitions.
//!
//! A [`MediaStream`] is released when dropped, so a stream can never outlive
//! the operation that opened it, including on early returns.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::PlatformError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::IntoStaticStr,
)]
pub enum MediaKind {
    #[strum(serialize = "camera")]
    Camera,
    #[strum(serialize = "microphone")]
    Microphone,
}

/// A live device stream; released on drop
pub struct MediaStream {
    kind: MediaKind,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl MediaStream {
    pub fn new(kind: MediaKind, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            kind,
            release: Some(Box::new(release)),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("kind", &self.kind)
            .field("live", &self.release.is_some())
            .finish()
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            debug!(kind = %self.kind, "media stream released");
            release();
        }
    }
}

pub trait MediaDevices {
    fn acquire(&mut self, kind: MediaKind) -> Result<MediaStream, PlatformError>;
}

/// Terminal host: the keyboard stands in for the microphone, there is no camera
#[derive(Debug, Default, Clone)]
pub struct TerminalMedia;

impl MediaDevices for TerminalMedia {
    fn acquire(&mut self, kind: MediaKind) -> Result<MediaStream, PlatformError> {
        match kind {
            MediaKind::Microphone => Ok(MediaStream::new(kind, || {})),
            MediaKind::Camera => Err(PlatformError::Unsupported {
                capability: kind.into(),
                reason: "terminals have no camera capture".into(),
            }),
        }
    }
}

/// Devices that count live streams, for tests
#[derive(Debug, Default, Clone)]
pub struct FakeMedia {
    pub denied: Vec<MediaKind>,
    pub acquisitions: usize,
    live: Arc<AtomicUsize>,
}

impl FakeMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denying(kind: MediaKind) -> Self {
        Self {
            denied: vec![kind],
            ..Self::default()
        }
    }

    /// Handle observing how many streams are currently open
    pub fn live_streams(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.live)
    }
}

impl MediaDevices for FakeMedia {
    fn acquire(&mut self, kind: MediaKind) -> Result<MediaStream, PlatformError> {
        if self.denied.contains(&kind) {
            return Err(PlatformError::PermissionDenied {
                capability: kind.into(),
            });
        }
        self.acquisitions += 1;
        self.live.fetch_add(1, Ordering::SeqCst);
        let live = Arc::clone(&self.live);
        Ok(MediaStream::new(kind, move || {
            live.fetch_sub(1, Ordering::SeqCst);
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    Unchecked,
    Granted,
    Denied(String),
}

/// Blocks the assessment until required devices are confirmed usable
#[derive(Debug, Clone)]
pub struct PermissionGate {
    required: Vec<MediaKind>,
    state: PermissionState,
}

impl PermissionGate {
    pub fn new(required: Vec<MediaKind>) -> Self {
        let state = if required.is_empty() {
            PermissionState::Granted
        } else {
            PermissionState::Unchecked
        };
        Self { required, state }
    }

    pub fn state(&self) -> &PermissionState {
        &self.state
    }

    pub fn is_granted(&self) -> bool {
        self.state == PermissionState::Granted
    }

    /// Opens each required device once and releases it immediately. Can be
    /// called again after a denial.
    pub fn check<M: MediaDevices + ?Sized>(&mut self, devices: &mut M) -> &PermissionState {
        for kind in &self.required {
            match devices.acquire(*kind) {
                Ok(stream) => drop(stream),
                Err(e) => {
                    warn!(%kind, error = %e, "media permission check failed");
                    self.state = PermissionState::Denied(e.to_string());
                    return &self.state;
                }
            }
        }
        self.state = PermissionState::Granted;
        &self.state
    }
}
