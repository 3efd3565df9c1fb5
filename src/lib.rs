// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod content;
pub mod error;
pub mod hiring;
pub mod logging;
pub mod media;
pub mod navigation;
pub mod platform;
pub mod proctor;
pub mod round;
pub mod round_timer;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timers;
pub mod util;
