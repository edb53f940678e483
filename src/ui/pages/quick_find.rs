// Quick Find page - glob search under a root directory

use crate::metrics::Metrics;
use crate::models::{QuickFindRequest, QuickFindState, Summary};
use crate::services::{Backend, format_elapsed};
use crate::state::StateManager;
use crate::ui::pages::{ActionOutcome, ReleaseOnDrop, TRANSPORT_FAILURE_MESSAGE, reveal_with};
use std::sync::Arc;

/// Summary for a search missing either input.
pub const EMPTY_INPUT_MESSAGE: &str = "Error: the search path and glob pattern must not be empty.";

/// Summary while a search is outstanding.
pub const SEARCHING_MESSAGE: &str = "Searching, please wait...";

/// Result-area note for a successful search without matches.
pub const NO_MATCHES_NOTE: &str = "No files found.";

/// Controller of the quick-find page. Clones share the same page session.
#[derive(Clone)]
pub struct QuickFind {
    state: StateManager<QuickFindState>,
    backend: Arc<dyn Backend>,
    metrics: Arc<Metrics>,
}

impl QuickFind {
    pub fn init(backend: Arc<dyn Backend>, metrics: Arc<Metrics>) -> Self {
        tracing::info!("Quick find page initialized");
        Self {
            state: StateManager::new(),
            backend,
            metrics,
        }
    }

    pub fn state(&self) -> &StateManager<QuickFindState> {
        &self.state
    }

    pub fn snapshot(&self) -> QuickFindState {
        self.state.snapshot()
    }

    pub fn set_root_path(&self, root_path: impl Into<String>) {
        let root_path = root_path.into();
        self.state.update(|s| s.root_path = root_path);
    }

    pub fn set_pattern(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        self.state.update(|s| s.pattern = pattern);
    }

    /// Clear both inputs and the results. Ignored while a search is outstanding.
    pub fn reset(&self) -> bool {
        let (done, _) = self.state.transact(|s| {
            if !s.controls.reset_enabled {
                return false;
            }
            s.reset();
            true
        });
        done
    }

    /// Search `root_path` for files matching `pattern`.
    pub async fn search(&self, root_path: &str, pattern: &str) -> ActionOutcome {
        let root_path = root_path.trim().to_string();
        let pattern = pattern.trim().to_string();

        let (gate, _) = self.state.transact(|s| {
            if !s.controls.search_enabled {
                return Err(ActionOutcome::Ignored);
            }
            s.root_path = root_path.clone();
            s.pattern = pattern.clone();
            if root_path.is_empty() || pattern.is_empty() {
                s.matches.clear();
                s.results_note = None;
                s.summary = Summary::error(EMPTY_INPUT_MESSAGE);
                return Err(ActionOutcome::Rejected);
            }

            s.clear_results();
            s.summary = Summary::neutral(SEARCHING_MESSAGE);
            s.controls.search_enabled = false;
            s.controls.reset_enabled = false;
            Ok(())
        });
        if let Err(outcome) = gate {
            return outcome;
        }

        let _release = ReleaseOnDrop::new(&self.state, |s: &mut QuickFindState| {
            s.controls.search_enabled = true;
            s.controls.reset_enabled = true;
        });
        self.metrics.record_search();
        tracing::info!("Searching {} for {}", root_path, pattern);

        let request = QuickFindRequest {
            root_path,
            glob_pattern: pattern,
        };

        match self.backend.quick_find(request).await {
            Ok(response) if response.is_success() => {
                let data = response.data.unwrap_or_default();
                tracing::info!("Search found {} matches", data.count);
                self.state.update(|s| {
                    s.summary = Summary::success(format!(
                        "Search finished: found {} matches in {}.",
                        data.count,
                        format_elapsed(data.elapsed_millis)
                    ));
                    s.results_note = data.matches.is_empty().then(|| NO_MATCHES_NOTE.to_string());
                    s.matches = data.matches;
                });
                ActionOutcome::Completed
            }
            Ok(response) => {
                let message = format!("Search failed: {}", response.error_message());
                tracing::warn!("{}", message);
                self.state.update(|s| s.summary = Summary::error(message));
                ActionOutcome::Failed
            }
            Err(e) => {
                tracing::error!("Search request failed: {}", e);
                self.state.update(|s| {
                    s.summary = Summary::error(TRANSPORT_FAILURE_MESSAGE);
                    s.results_note = Some(e.to_string());
                });
                ActionOutcome::Failed
            }
        }
    }

    /// Show one match in the file manager.
    pub async fn reveal(&self, path: &str) -> ActionOutcome {
        reveal_with(&*self.backend, &self.metrics, path, |summary| {
            self.state.update(|s| s.summary = summary);
        })
        .await
    }
}
