// GUI Controller - wires the Slint window to the page session
//
// Slint callbacks are turned into UiEvents and sent to the Session, which runs
// on the tokio runtime and answers through the EventLoopBridge. Closing the
// window ends the session; outstanding backend requests are awaited first.

use crate::config::ConfigManager;
use crate::metrics::Metrics;
use crate::models::{Preferences, ProjectType};
use crate::services::Backend;
use crate::ui::bridge::EventLoopBridge;
use crate::ui::loader::Templates;
use crate::ui::session::{Session, UiEvent, build_router};
use crate::ui::window::WindowSurface;
use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// Include the generated Slint code
slint::include_modules!();

/// Owns the window, the bridge and the running page session
///
/// # Example
/// ```ignore
/// let controller = GuiController::new(config, preferences, backend, metrics, templates, runtime.handle().clone())?;
/// controller.run()?; // Blocks until the window is closed and the session has finished
/// ```
pub struct GuiController {
    /// The Slint UI window
    ui: MainWindow,

    /// Event loop bridge for coordinating between tokio and Slint
    _bridge: EventLoopBridge<MainWindow>,

    /// UI events for the session
    events: mpsc::UnboundedSender<UiEvent>,

    /// The session task; joined after the window closes
    session: JoinHandle<()>,

    tokio_handle: tokio::runtime::Handle,
}

impl GuiController {
    pub fn new(
        config: ConfigManager,
        preferences: Preferences,
        backend: Arc<dyn Backend>,
        metrics: Arc<Metrics>,
        templates: Templates,
        tokio_handle: tokio::runtime::Handle,
    ) -> Result<Self> {
        let ui = MainWindow::new().context("Failed to create Slint UI")?;
        let bridge = EventLoopBridge::new(&ui, tokio_handle.clone());
        let (events, events_rx) = mpsc::unbounded_channel();

        Self::setup_callbacks(&ui, &events);

        let router = build_router(
            WindowSurface::new(bridge.clone_handle()),
            backend,
            Arc::clone(&metrics),
            templates,
            tokio_handle.clone(),
        );
        let session = Session::new(router, config, preferences, metrics, tokio_handle.clone());
        let session = tokio_handle.spawn(session.run(events_rx));

        tracing::info!("GUI controller initialized");

        Ok(Self {
            ui,
            _bridge: bridge,
            events,
            session,
            tokio_handle,
        })
    }

    /// Run the GUI, then wait for the session to finish its outstanding requests
    pub fn run(self) -> Result<(), slint::PlatformError> {
        tracing::info!("Starting GUI event loop");
        let result = self.ui.run();

        tracing::info!("Window closed; finishing the page session");
        if self.events.send(UiEvent::Close).is_err() {
            tracing::debug!("Page session had already stopped");
        }
        if let Err(e) = self.tokio_handle.block_on(self.session) {
            tracing::error!("Page session task failed: {}", e);
        }

        result
    }

    fn setup_callbacks(ui: &MainWindow, events: &mpsc::UnboundedSender<UiEvent>) {
        let tx = events.clone();
        ui.on_navigate(move |route| emit(&tx, UiEvent::Navigate(route.to_string())));

        let tx = events.clone();
        ui.on_toggle_theme(move || emit(&tx, UiEvent::ToggleTheme));

        Self::setup_quick_find_callbacks(ui, events);
        Self::setup_cleanser_callbacks(ui, events);

        ui.window().on_close_requested(|| {
            tracing::info!("Close requested - allowing window to close");
            slint::CloseRequestResponse::HideWindow
        });

        tracing::debug!("UI callbacks configured");
    }

    fn setup_quick_find_callbacks(ui: &MainWindow, events: &mpsc::UnboundedSender<UiEvent>) {
        let model = ui.global::<QuickFindModel>();

        let tx = events.clone();
        model.on_root_path_edited(move |text| emit(&tx, UiEvent::RootPathEdited(text.to_string())));

        let tx = events.clone();
        model.on_pattern_edited(move |text| emit(&tx, UiEvent::PatternEdited(text.to_string())));

        let tx = events.clone();
        model.on_search(move |root_path, pattern| {
            emit(
                &tx,
                UiEvent::Search {
                    root_path: root_path.to_string(),
                    pattern: pattern.to_string(),
                },
            )
        });

        let tx = events.clone();
        model.on_reset(move || emit(&tx, UiEvent::Reset));

        let tx = events.clone();
        model.on_reveal(move |index| emit_index(&tx, index, UiEvent::Reveal));

        let ui_weak = ui.as_weak();
        let tx = events.clone();
        model.on_browse(move || {
            let Some(path) = show_folder_picker("Choose a directory to search") else {
                return;
            };
            if let Some(ui) = ui_weak.upgrade() {
                ui.global::<QuickFindModel>().set_root_path(path.as_str().into());
            }
            emit(&tx, UiEvent::RootPathEdited(path.into_string()));
        });
    }

    fn setup_cleanser_callbacks(ui: &MainWindow, events: &mpsc::UnboundedSender<UiEvent>) {
        let model = ui.global::<CleanserModel>();

        let tx = events.clone();
        model.on_root_path_edited(move |text| emit(&tx, UiEvent::RootPathEdited(text.to_string())));

        let tx = events.clone();
        model.on_project_type_selected(move |value| {
            emit(&tx, UiEvent::ProjectTypeSelected(parse_project_type(&value)))
        });

        let tx = events.clone();
        model.on_scan(move |root_path, project_type| {
            emit(
                &tx,
                UiEvent::Scan {
                    root_path: root_path.to_string(),
                    project_type: parse_project_type(&project_type),
                },
            )
        });

        let tx = events.clone();
        model.on_reset(move || emit(&tx, UiEvent::Reset));

        let tx = events.clone();
        model.on_toggle(move |index| emit_index(&tx, index, UiEvent::Toggle));

        let tx = events.clone();
        model.on_select_all(move |selected| emit(&tx, UiEvent::SelectAll(selected)));

        let tx = events.clone();
        model.on_clean(move || emit(&tx, UiEvent::Clean));

        let tx = events.clone();
        model.on_confirm(move || emit(&tx, UiEvent::Confirm));

        let tx = events.clone();
        model.on_cancel(move || emit(&tx, UiEvent::Cancel));

        let tx = events.clone();
        model.on_reveal(move |index| emit_index(&tx, index, UiEvent::Reveal));

        let ui_weak = ui.as_weak();
        let tx = events.clone();
        model.on_browse(move || {
            let Some(path) = show_folder_picker("Choose a directory to scan") else {
                return;
            };
            if let Some(ui) = ui_weak.upgrade() {
                ui.global::<CleanserModel>().set_root_path(path.as_str().into());
            }
            emit(&tx, UiEvent::RootPathEdited(path.into_string()));
        });
    }
}

fn emit(events: &mpsc::UnboundedSender<UiEvent>, event: UiEvent) {
    if events.send(event).is_err() {
        tracing::warn!("Page session has stopped; UI event dropped");
    }
}

/// Forward a list position from Slint, which uses signed ints
fn emit_index(events: &mpsc::UnboundedSender<UiEvent>, index: i32, event: fn(usize) -> UiEvent) {
    match usize::try_from(index) {
        Ok(index) => emit(events, event(index)),
        Err(_) => tracing::warn!("Ignoring negative list index {}", index),
    }
}

/// Project type from the combo box; unknown values fall back to "any"
pub fn parse_project_type(value: &str) -> ProjectType {
    value.parse().unwrap_or_else(|e| {
        tracing::warn!("{}; scanning for any project type", e);
        ProjectType::Any
    })
}

/// Show a native folder picker
///
/// Returns None if cancelled or if the folder is not valid UTF-8.
fn show_folder_picker(title: &str) -> Option<Utf8PathBuf> {
    use rfd::FileDialog;

    FileDialog::new().set_title(title).pick_folder().and_then(|path| {
        Utf8PathBuf::try_from(path)
            .map_err(|e| {
                tracing::error!("Failed to convert path to UTF-8: {}", e);
                e
            })
            .ok()
    })
}
