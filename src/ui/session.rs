// Page session - consumes UI events, drives the router and the mounted page
//
// The session runs on the tokio runtime and never touches the window directly:
// everything visible goes through a FrontEnd (the loader's Surface plus theme,
// notices and page renderers). The Slint window is one FrontEnd; tests use a
// recording double.

use crate::config::ConfigManager;
use crate::metrics::Metrics;
use crate::models::{
    CleanserChange, CleanserState, Preferences, ProjectType, QuickFindChange, QuickFindState,
    Summary, Theme,
};
use crate::services::Backend;
use crate::ui::bridge::{ActionSet, PageBridge};
use crate::ui::loader::{PageSession, Router, Surface, Templates};
use crate::ui::pages::{ActionOutcome, ConfirmTicket, ProjectCleanser, QuickFind};
use camino::Utf8PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

pub const QUICK_FIND_ROUTE: &str = "/quick-find";
pub const PROJECT_CLEANSER_ROUTE: &str = "/project-cleanser";

/// Markup locator of the quick-find page
pub const QUICK_FIND_TEMPLATE: &str = "pages/quick-find/template.txt";

/// Markup locator of the project cleanser page
pub const PROJECT_CLEANSER_TEMPLATE: &str = "pages/project-cleanser/template.txt";

/// Notice for a confirm or cancel whose confirmation was already closed
pub const STALE_CONFIRMATION: &str = "That confirmation is no longer open.";

pub const NOTHING_TO_CONFIRM: &str = "Nothing to confirm.";
pub const NOTHING_TO_CANCEL: &str = "Nothing to cancel.";
pub const EMPTY_SELECTION: &str = "Select at least one directory first.";
pub const CLEAN_ALREADY_PENDING: &str = "A clean is already pending.";
pub const BUSY: &str = "Busy; try again when the current request finishes.";
pub const NOT_ON_THIS_PAGE: &str = "That action is not available on this page.";
pub const THEME_NOT_SAVED: &str = "Could not save the theme preference.";

/// What the user did, as reported by the window.
///
/// Row and match indices are 0-based positions in the rendered lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Navigate(String),
    RootPathEdited(String),
    PatternEdited(String),
    ProjectTypeSelected(ProjectType),
    Search { root_path: String, pattern: String },
    Scan { root_path: String, project_type: ProjectType },
    Toggle(usize),
    SelectAll(bool),
    Clean,
    Confirm,
    Cancel,
    Reveal(usize),
    Reset,
    ToggleTheme,
    Close,
}

/// Turns page change events into visible output.
pub trait PageRenderer: Clone + Send + Sync + 'static {
    fn quick_find(&self, change: &QuickFindChange, state: &QuickFindState);

    fn cleanser(&self, change: &CleanserChange, state: &CleanserState);
}

/// Everything the session needs from a window.
pub trait FrontEnd: Surface + 'static {
    type Renderer: PageRenderer;

    fn renderer(&self) -> Self::Renderer;

    fn apply_theme(&mut self, theme: Theme);

    /// Show a message that belongs to the session rather than a page.
    /// An empty summary hides it.
    fn notify(&mut self, notice: &Summary);
}

/// The mounted page together with its render subscription.
pub enum ActivePage {
    QuickFind {
        page: QuickFind,
        bridge: PageBridge,
    },
    ProjectCleanser {
        page: ProjectCleanser,
        bridge: PageBridge,
        /// Ticket of the confirmation currently shown, if any
        ticket: Option<ConfirmTicket>,
    },
}

impl ActivePage {
    fn mount_quick_find<R: PageRenderer>(page: QuickFind, renderer: R, handle: tokio::runtime::Handle) -> Self {
        let state = page.state().clone();
        let snapshot = state.snapshot();
        for change in quick_find_full_render(&snapshot) {
            renderer.quick_find(&change, &snapshot);
        }

        let bridge = PageBridge::new(page.state(), handle, move |change| {
            renderer.quick_find(&change, &state.snapshot());
        });
        ActivePage::QuickFind { page, bridge }
    }

    fn mount_project_cleanser<R: PageRenderer>(
        page: ProjectCleanser,
        renderer: R,
        handle: tokio::runtime::Handle,
    ) -> Self {
        let state = page.state().clone();
        let snapshot = state.snapshot();
        for change in cleanser_full_render(&snapshot) {
            renderer.cleanser(&change, &snapshot);
        }

        let bridge = PageBridge::new(page.state(), handle, move |change| {
            renderer.cleanser(&change, &state.snapshot());
        });
        ActivePage::ProjectCleanser {
            page,
            bridge,
            ticket: None,
        }
    }

    fn bridge_mut(&mut self) -> &mut PageBridge {
        match self {
            ActivePage::QuickFind { bridge, .. } => bridge,
            ActivePage::ProjectCleanser { bridge, .. } => bridge,
        }
    }
}

impl PageSession for ActivePage {
    fn unmount(&mut self) {
        self.bridge_mut().shutdown();
    }
}

/// Every change needed to draw a freshly mounted quick-find page
fn quick_find_full_render(state: &QuickFindState) -> Vec<QuickFindChange> {
    vec![
        QuickFindChange::InputsChanged {
            root_path: state.root_path.clone(),
            pattern: state.pattern.clone(),
        },
        QuickFindChange::ResultsChanged {
            count: state.matches.len(),
            note: state.results_note.clone(),
        },
        QuickFindChange::SummaryChanged(state.summary.clone()),
        QuickFindChange::ControlsChanged(state.controls.clone()),
    ]
}

/// Every change needed to draw a freshly mounted cleanser page
fn cleanser_full_render(state: &CleanserState) -> Vec<CleanserChange> {
    let mut changes = vec![
        CleanserChange::InputsChanged {
            root_path: state.root_path.clone(),
            project_type: state.project_type,
        },
        CleanserChange::PhaseChanged {
            scan: state.scan_phase,
            clean: state.clean_phase,
        },
        CleanserChange::RowsChanged {
            count: state.rows.len(),
        },
        CleanserChange::SelectionChanged {
            selected: state.selected.len(),
            total: state.rows.len(),
            summary: state.selection_summary.clone(),
        },
        CleanserChange::SummaryChanged(state.summary.clone()),
        CleanserChange::ControlsChanged(state.controls.clone()),
    ];
    changes.push(match &state.dialog {
        Some(message) => CleanserChange::ConfirmationOpened {
            message: message.clone(),
        },
        None => CleanserChange::ConfirmationClosed,
    });
    changes
}

/// Built-in page markup, overridable from `assets_dir`
pub fn templates(assets_dir: Option<Utf8PathBuf>) -> Templates {
    Templates::new()
        .with(
            QUICK_FIND_TEMPLATE,
            include_str!("../../assets/pages/quick-find/template.txt"),
        )
        .with(
            PROJECT_CLEANSER_TEMPLATE,
            include_str!("../../assets/pages/project-cleanser/template.txt"),
        )
        .with_override_dir(assets_dir)
}

/// Register both pages and the default redirect.
pub fn build_router<F: FrontEnd>(
    front_end: F,
    backend: Arc<dyn Backend>,
    metrics: Arc<Metrics>,
    templates: Templates,
    handle: tokio::runtime::Handle,
) -> Router<ActivePage, F, Templates> {
    let renderer = front_end.renderer();

    let quick_find = {
        let backend = Arc::clone(&backend);
        let metrics = Arc::clone(&metrics);
        let renderer = renderer.clone();
        let handle = handle.clone();
        move || {
            let page = QuickFind::init(Arc::clone(&backend), Arc::clone(&metrics));
            ActivePage::mount_quick_find(page, renderer.clone(), handle.clone())
        }
    };

    let project_cleanser = move || {
        let page = ProjectCleanser::init(Arc::clone(&backend), Arc::clone(&metrics));
        ActivePage::mount_project_cleanser(page, renderer.clone(), handle.clone())
    };

    Router::new(front_end, templates)
        .route(QUICK_FIND_ROUTE, QUICK_FIND_TEMPLATE, "quick-find", quick_find)
        .route(
            PROJECT_CLEANSER_ROUTE,
            PROJECT_CLEANSER_TEMPLATE,
            "project-cleanser",
            project_cleanser,
        )
        .redirect("/", QUICK_FIND_ROUTE)
}

/// One run of the application: the router, the saved theme and every
/// backend action started while it lasts.
pub struct Session<F: FrontEnd> {
    router: Router<ActivePage, F, Templates>,
    config: ConfigManager,
    preferences: Preferences,
    metrics: Arc<Metrics>,
    actions: ActionSet,
    notice_shown: bool,
}

impl<F: FrontEnd> Session<F> {
    pub fn new(
        router: Router<ActivePage, F, Templates>,
        config: ConfigManager,
        preferences: Preferences,
        metrics: Arc<Metrics>,
        handle: tokio::runtime::Handle,
    ) -> Self {
        Self {
            router,
            config,
            preferences,
            metrics,
            actions: ActionSet::new(handle),
            notice_shown: false,
        }
    }

    pub fn router(&self) -> &Router<ActivePage, F, Templates> {
        &self.router
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Backend actions that have not finished yet, on any page
    pub fn outstanding_actions(&mut self) -> usize {
        self.actions.outstanding()
    }

    /// Apply the saved theme, show the default page and handle `events` until
    /// [`UiEvent::Close`] or until every sender is gone.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<UiEvent>) {
        self.start().await;

        while let Some(event) = events.recv().await {
            if !self.handle(event).await {
                break;
            }
        }

        self.finish().await;
    }

    /// Apply the saved theme and mount the default route.
    pub async fn start(&mut self) {
        let theme = self.preferences.theme;
        self.router.surface_mut().apply_theme(theme);
        if let Some(notice) = self.navigate("/").await {
            self.show_notice(notice);
        }
    }

    /// Wait for every outstanding action, including those started by pages
    /// that are no longer mounted, then unmount.
    pub async fn finish(&mut self) {
        let outstanding = self.actions.outstanding();
        if outstanding > 0 {
            tracing::info!("Waiting for {} outstanding requests", outstanding);
            self.actions.settle().await;
        }
        // Let the renderer drain the events of the last settled action
        tokio::task::yield_now().await;
        self.router.unmount();
        tracing::info!("Page session ended");
    }

    /// Handle one event. Returns false when the session should end.
    pub async fn handle(&mut self, event: UiEvent) -> bool {
        tracing::debug!("UI event: {:?}", event);
        self.clear_notice();

        let notice = match event {
            UiEvent::Close => return false,
            UiEvent::Navigate(route) => self.navigate(&route).await,
            UiEvent::ToggleTheme => self.toggle_theme(),
            other => self.page_event(other),
        };
        if let Some(notice) = notice {
            self.show_notice(notice);
        }
        true
    }

    async fn navigate(&mut self, route: &str) -> Option<Summary> {
        match self.router.navigate(route).await {
            Ok(_) => {
                self.metrics.record_navigation();
                None
            }
            Err(e) => {
                tracing::warn!("Navigation to {} failed: {}", route, e);
                Some(Summary::error(e.to_string()))
            }
        }
    }

    fn toggle_theme(&mut self) -> Option<Summary> {
        self.preferences.theme = self.preferences.theme.toggled();
        let theme = self.preferences.theme;
        self.router.surface_mut().apply_theme(theme);
        tracing::info!("Switched to the {} theme", theme.as_str());

        match self.config.save_preferences(&self.preferences) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to save preferences: {:#}", e);
                Some(Summary::error(THEME_NOT_SAVED))
            }
        }
    }

    fn page_event(&mut self, event: UiEvent) -> Option<Summary> {
        match self.router.active_page_mut() {
            Some(ActivePage::QuickFind { page, .. }) => quick_find_event(page, &mut self.actions, event),
            Some(ActivePage::ProjectCleanser { page, ticket, .. }) => {
                cleanser_event(page, ticket, &mut self.actions, event)
            }
            None => Some(Summary::error("No page is mounted.")),
        }
    }

    fn show_notice(&mut self, notice: Summary) {
        self.router.surface_mut().notify(&notice);
        self.notice_shown = true;
    }

    fn clear_notice(&mut self) {
        if std::mem::take(&mut self.notice_shown) {
            self.router.surface_mut().notify(&Summary::default());
        }
    }
}

fn quick_find_event(page: &QuickFind, actions: &mut ActionSet, event: UiEvent) -> Option<Summary> {
    match event {
        UiEvent::RootPathEdited(root_path) => page.set_root_path(root_path),
        UiEvent::PatternEdited(pattern) => page.set_pattern(pattern),
        UiEvent::Search { root_path, pattern } => {
            let session = page.clone();
            actions.spawn(async move {
                session.search(&root_path, &pattern).await;
            });
        }
        UiEvent::Reveal(index) => match page.state().read(|s| s.matches.get(index).cloned()) {
            Some(path) => {
                let session = page.clone();
                actions.spawn(async move {
                    session.reveal(&path).await;
                });
            }
            None => return Some(Summary::error(format!("There is no result {}.", index + 1))),
        },
        UiEvent::Reset => {
            if !page.reset() {
                return Some(Summary::neutral(BUSY));
            }
        }
        _ => return Some(Summary::error(NOT_ON_THIS_PAGE)),
    }
    None
}

fn cleanser_event(
    page: &ProjectCleanser,
    ticket: &mut Option<ConfirmTicket>,
    actions: &mut ActionSet,
    event: UiEvent,
) -> Option<Summary> {
    match event {
        UiEvent::RootPathEdited(root_path) => page.set_root_path(root_path),
        UiEvent::ProjectTypeSelected(project_type) => page.set_project_type(project_type),
        UiEvent::Scan {
            root_path,
            project_type,
        } => {
            let session = page.clone();
            actions.spawn(async move {
                session.scan(&root_path, project_type).await;
            });
        }
        UiEvent::Toggle(index) => match page.state().read(|s| s.rows.get(index).map(|r| r.path.clone())) {
            Some(path) => {
                if !page.toggle_selection(&path) {
                    tracing::debug!("Selection change ignored for {}", path);
                }
            }
            None => return Some(Summary::error(format!("There is no row {}.", index + 1))),
        },
        UiEvent::SelectAll(selected) => {
            if !page.select_all(selected) {
                tracing::debug!("Select-all ignored while cleaning");
            }
        }
        UiEvent::Clean => match page.request_clean() {
            Some(issued) => *ticket = Some(issued),
            None if page.state().read(|s| s.selected.is_empty()) => {
                return Some(Summary::neutral(EMPTY_SELECTION));
            }
            None => return Some(Summary::neutral(CLEAN_ALREADY_PENDING)),
        },
        UiEvent::Confirm => match ticket.take() {
            Some(issued) if page.is_open(&issued) => {
                let session = page.clone();
                actions.spawn(async move {
                    session.confirm(issued).await;
                });
            }
            Some(_) => return Some(Summary::neutral(STALE_CONFIRMATION)),
            None => return Some(Summary::neutral(NOTHING_TO_CONFIRM)),
        },
        UiEvent::Cancel => match ticket.take() {
            Some(issued) => {
                if page.cancel(issued) == ActionOutcome::Ignored {
                    return Some(Summary::neutral(STALE_CONFIRMATION));
                }
            }
            None => return Some(Summary::neutral(NOTHING_TO_CANCEL)),
        },
        UiEvent::Reveal(index) => match page.state().read(|s| s.rows.get(index).map(|r| r.path.clone())) {
            Some(path) => {
                let session = page.clone();
                actions.spawn(async move {
                    session.reveal(&path).await;
                });
            }
            None => return Some(Summary::error(format!("There is no row {}.", index + 1))),
        },
        UiEvent::Reset => {
            if !page.reset() {
                return Some(Summary::neutral(BUSY));
            }
        }
        _ => return Some(Summary::error(NOT_ON_THIS_PAGE)),
    }
    None
}
