// Pandorust - find files by glob and reclaim space from build output directories
//
// This is the library crate containing the page controllers, the view loader and
// the backend contract. The binary crate (main.rs) opens the window.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;
pub mod ui;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::Metrics;
pub use models::{AppSettings, CleanserState, Preferences, QuickFindState};
pub use services::{Backend, BackendError, ProcessBackend};
pub use state::{StateManager, TrackedState};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Directory holding `pandorust.yaml` and `preferences.yaml`, relative to the working directory
pub const DATA_DIR: &str = "Pandorust Data";
