//! Pandorust - desktop front-end
//!
//! # Overview
//!
//! This binary wires the library together and opens the main window:
//! - Settings ([`ConfigManager`]): `Pandorust Data/pandorust.yaml` + `PANDORUST_*` variables
//! - Logging infrastructure (daily file rotation, optional stderr output)
//! - Tokio async runtime (2 worker threads for backend subprocesses and the page session)
//! - The [`ProcessBackend`] that scans, cleans, searches and reveals on our behalf
//! - Slint GUI ([`GuiController`]) with both pages behind the view loader
//!
//! # Threading Model
//!
//! - **Main thread**: Runs the Slint event loop (GUI rendering, user input)
//! - **Tokio workers**: The page session, render subscriptions and backend calls
//! - **Bridge thread**: Forwards UI updates from tokio into the Slint event loop
//!
//! # Execution Flow
//!
//! 1. Load settings and preferences from `Pandorust Data/`
//! 2. Initialize logging → `<logging.dir>/<logging.prefix>.<date>`
//! 3. Create the tokio runtime and the backend
//! 4. Create GuiController and run the window until it is closed
//! 5. Wait for outstanding requests, log the session summary
//! 6. Shutdown the tokio runtime with a 5s timeout

use anyhow::{Context, Result};
use pandorust::ui::{GuiController, templates};
use pandorust::{APP_NAME, ConfigManager, DATA_DIR, Metrics, ProcessBackend, VERSION};
use std::sync::Arc;

/// Tokio worker threads; backend calls are the only work they do
const WORKER_THREADS: usize = 2;

fn main() -> Result<()> {
    let config_manager = ConfigManager::new(DATA_DIR)?;
    let settings = config_manager.load_settings()?;

    // Held for the whole session; dropping it stops the file writer
    let _log_guard = pandorust::logging::setup_logging(&settings.logging)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let preferences = config_manager.load_preferences().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable preferences: {:#}", e);
        Default::default()
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(WORKER_THREADS)
        .thread_name("pandorust-worker")
        .build()
        .context("Failed to build tokio runtime")?;

    tracing::info!("Tokio runtime initialized with {} worker threads", WORKER_THREADS);

    let metrics = Arc::new(Metrics::new());
    let backend = Arc::new(ProcessBackend::from_settings(&settings.backend));
    tracing::info!("Backend command: {}", settings.backend.program);

    let gui_controller = GuiController::new(
        config_manager,
        preferences,
        backend,
        Arc::clone(&metrics),
        templates(settings.assets_dir.clone()),
        runtime.handle().clone(),
    )?;

    tracing::info!("GUI controller initialized, launching window");

    // Blocks until the window is closed and the session has settled
    let result = gui_controller.run();

    tracing::info!("GUI closed, shutting down");
    runtime.shutdown_timeout(std::time::Duration::from_secs(5));

    metrics.log_summary();
    tracing::info!("Application shutdown complete");

    result.map_err(|e| {
        tracing::error!("GUI error: {}", e);
        anyhow::anyhow!("GUI error: {}", e)
    })
}
