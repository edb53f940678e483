// Project Cleanser page - the scan, select and clean workflow
//
// Scan lifecycle:  Idle -> Scanning -> (Scanned | ScanFailed) -> Idle (on reset)
// Clean lifecycle: NoPendingConfirm -> ConfirmPending -> Cleaning -> NoPendingConfirm
//
// Scanning and cleaning never overlap: a scan disables itself and reset, a
// clean disables scan and reset, and a scan start discards any pending
// confirmation.

use crate::metrics::Metrics;
use crate::models::{
    CleanPhase, CleanserState, PendingConfirmation, ProjectType, RowRecord, ScanPhase,
    ScanRequest, Summary,
};
use crate::services::{Backend, format_elapsed};
use crate::state::StateManager;
use crate::ui::pages::{ActionOutcome, ReleaseOnDrop, TRANSPORT_FAILURE_MESSAGE, reveal_with};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Summary for a scan requested without a directory.
pub const EMPTY_ROOT_MESSAGE: &str = "Error: choose a directory to scan first.";

/// Summary while a scan is outstanding.
pub const SCANNING_MESSAGE: &str = "Scanning, please wait...";

/// Stands in for an occupied-size aggregate the backend left out.
pub const OCCUPIED_PLACEHOLDER: &str = "n/a";

/// Proof that the user was shown a specific confirmation.
///
/// Issued by [`ProjectCleanser::request_clean`] and consumed by either
/// [`confirm`](ProjectCleanser::confirm) or [`cancel`](ProjectCleanser::cancel).
/// A ticket whose confirmation has since been resolved or discarded does nothing.
#[derive(Debug, PartialEq, Eq)]
pub struct ConfirmTicket {
    id: u64,
}

impl ConfirmTicket {
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Controller of the project cleanser page.
///
/// Clones share the same page session, so an action can be moved into a task
/// while the front-end keeps issuing commands against the same state.
#[derive(Clone)]
pub struct ProjectCleanser {
    state: StateManager<CleanserState>,
    backend: Arc<dyn Backend>,
    metrics: Arc<Metrics>,
    next_ticket: Arc<AtomicU64>,
}

impl ProjectCleanser {
    /// Page entry point, called once per mount with fresh state.
    pub fn init(backend: Arc<dyn Backend>, metrics: Arc<Metrics>) -> Self {
        tracing::info!("Project cleanser page initialized");
        Self {
            state: StateManager::new(),
            backend,
            metrics,
            next_ticket: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn state(&self) -> &StateManager<CleanserState> {
        &self.state
    }

    pub fn snapshot(&self) -> CleanserState {
        self.state.snapshot()
    }

    pub fn set_root_path(&self, root_path: impl Into<String>) {
        let root_path = root_path.into();
        self.state.update(|s| s.root_path = root_path);
    }

    pub fn set_project_type(&self, project_type: ProjectType) {
        self.state.update(|s| s.project_type = project_type);
    }

    /// Clear inputs, results, selection and any open confirmation.
    ///
    /// Ignored (returns false) while a scan or clean is outstanding.
    pub fn reset(&self) -> bool {
        let (done, _) = self.state.transact(|s| {
            if !s.controls.reset_enabled {
                return false;
            }
            s.reset();
            true
        });
        if done {
            tracing::info!("Project cleanser reset");
        } else {
            tracing::debug!("Reset ignored while a request is outstanding");
        }
        done
    }

    /// Scan `root_path` for reclaimable directories of `project_type`.
    ///
    /// An empty (or blank) path is rejected without a backend call. A scan
    /// requested while another is outstanding is ignored.
    pub async fn scan(&self, root_path: &str, project_type: ProjectType) -> ActionOutcome {
        let root_path = root_path.trim().to_string();

        let (gate, _) = self.state.transact(|s| {
            if !s.controls.scan_enabled {
                return Err(ActionOutcome::Ignored);
            }
            s.root_path = root_path.clone();
            s.project_type = project_type;
            if root_path.is_empty() {
                s.summary = Summary::error(EMPTY_ROOT_MESSAGE);
                return Err(ActionOutcome::Rejected);
            }

            s.clear_results();
            s.scan_phase = ScanPhase::Scanning;
            s.controls.scan_enabled = false;
            s.controls.reset_enabled = false;
            s.summary = Summary::neutral(SCANNING_MESSAGE);
            Ok(())
        });
        if let Err(outcome) = gate {
            tracing::debug!("Scan not dispatched: {:?}", outcome);
            return outcome;
        }

        let _release = ReleaseOnDrop::new(&self.state, release_after_scan);
        self.metrics.record_scan_started();
        tracing::info!("Scanning {} for {} projects", root_path, project_type);

        let request = ScanRequest {
            root_path,
            project_type,
        };

        match self.backend.scan(request).await {
            Ok(response) if response.is_success() => match response.data {
                Some(data) => {
                    let count = data.rows.len();
                    let elapsed = format_elapsed(data.elapsed_millis);
                    let text = if count == 0 {
                        format!("Scan finished in {}: no reclaimable directories found.", elapsed)
                    } else {
                        format!(
                            "Scan finished in {}: found {} reclaimable directories occupying {}.",
                            elapsed,
                            count,
                            occupied_or_placeholder(data.occupied_summary.as_deref())
                        )
                    };

                    self.state.update(|s| {
                        s.replace_rows(data.rows);
                        s.scan_phase = ScanPhase::Scanned;
                        s.summary = Summary::success(text);
                    });
                    tracing::info!("Scan found {} directories", count);
                    ActionOutcome::Completed
                }
                None => self.scan_failed("Scan failed: the backend returned no data.".to_string()),
            },
            Ok(response) => {
                let message = format!("Scan failed: {}", response.error_message());
                tracing::warn!("{}", message);
                self.scan_failed(message)
            }
            Err(e) => {
                tracing::error!("Scan request failed: {}", e);
                self.scan_failed(TRANSPORT_FAILURE_MESSAGE.to_string())
            }
        }
    }

    fn scan_failed(&self, message: String) -> ActionOutcome {
        self.metrics.record_scan_failed();
        self.state.update(|s| {
            s.clear_results();
            s.scan_phase = ScanPhase::ScanFailed;
            s.summary = Summary::error(message);
        });
        ActionOutcome::Failed
    }

    /// Flip one row's selected flag.
    ///
    /// Unknown paths are ignored, and so is every selection change while a
    /// clean is in flight.
    pub fn toggle_selection(&self, path: &str) -> bool {
        let (toggled, _) = self.state.transact(|s| {
            if s.is_cleaning() || !s.rows.iter().any(|row| row.path == path) {
                return false;
            }
            if !s.selected.remove(path) {
                s.selected.insert(path.to_string());
            }
            s.recompute_selection();
            true
        });
        toggled
    }

    /// Select or deselect every rendered row. Ignored while a clean is in flight.
    pub fn select_all(&self, selected: bool) -> bool {
        let (applied, _) = self.state.transact(|s| {
            if s.is_cleaning() {
                return false;
            }
            if selected {
                s.selected = s.rows.iter().map(|row| row.path.clone()).collect();
            } else {
                s.selected.clear();
            }
            s.recompute_selection();
            true
        });
        applied
    }

    /// Freeze the current selection and open the confirmation.
    ///
    /// Returns `None` without opening anything when the selection is empty, a
    /// clean is in flight, or a confirmation is already open.
    pub fn request_clean(&self) -> Option<ConfirmTicket> {
        let id = self.next_ticket.fetch_add(1, Ordering::Relaxed);

        let (opened, _) = self.state.transact(|s| {
            if s.selected.is_empty() || s.is_cleaning() || s.pending.is_some() {
                return false;
            }
            let targets: Vec<RowRecord> = s.selected_rows().cloned().collect();
            let message = format!(
                "Are you sure you want to permanently delete these {} items?",
                targets.len()
            );

            s.pending = Some(PendingConfirmation { id, targets });
            s.dialog = Some(message);
            s.clean_phase = CleanPhase::ConfirmPending;
            true
        });

        if opened {
            tracing::info!("Clean confirmation opened");
            Some(ConfirmTicket { id })
        } else {
            tracing::debug!("Clean request ignored");
            None
        }
    }

    /// Whether `ticket` still names the open confirmation.
    pub fn is_open(&self, ticket: &ConfirmTicket) -> bool {
        self.state
            .read(|s| matches!(&s.pending, Some(pending) if pending.id == ticket.id))
    }

    /// Close the confirmation without deleting anything.
    pub fn cancel(&self, ticket: ConfirmTicket) -> ActionOutcome {
        let (cancelled, _) = self.state.transact(|s| {
            if !matches!(&s.pending, Some(pending) if pending.id == ticket.id) {
                return false;
            }
            s.pending = None;
            s.dialog = None;
            s.clean_phase = CleanPhase::NoPendingConfirm;
            true
        });

        if cancelled {
            tracing::info!("Clean cancelled");
            ActionOutcome::Completed
        } else {
            tracing::debug!("Stale cancel ignored (ticket {})", ticket.id);
            ActionOutcome::Ignored
        }
    }

    /// Close the confirmation and delete the frozen targets.
    pub async fn confirm(&self, ticket: ConfirmTicket) -> ActionOutcome {
        let (taken, _) = self.state.transact(|s| {
            let pending = match s.pending.take() {
                Some(pending) if pending.id == ticket.id => pending,
                other => {
                    s.pending = other;
                    return None;
                }
            };
            s.dialog = None;
            s.clean_phase = CleanPhase::Cleaning;
            s.controls.scan_enabled = false;
            s.controls.reset_enabled = false;
            s.recompute_selection();
            Some(pending.targets)
        });

        let Some(targets) = taken else {
            tracing::debug!("Stale confirm ignored (ticket {})", ticket.id);
            return ActionOutcome::Ignored;
        };

        let _release = ReleaseOnDrop::new(&self.state, release_after_clean);
        let paths: BTreeSet<String> = targets.iter().map(|row| row.path.clone()).collect();
        let bytes: u64 = targets.iter().map(|row| row.total_bytes).sum();
        let count = targets.len();
        tracing::info!("Cleaning {} directories", count);

        match self.backend.clean(targets).await {
            Ok(response) if response.is_success() => {
                let occupied = occupied_or_placeholder(
                    response
                        .data
                        .as_ref()
                        .and_then(|data| data.occupied_summary.as_deref()),
                )
                .to_string();

                self.state.update(|s| {
                    s.remove_paths(&paths);
                    s.summary = Summary::success(format!(
                        "Deleted {} directories. {} remaining, occupying {}.",
                        count,
                        s.rows.len(),
                        occupied
                    ));
                });
                self.metrics.record_clean(count, bytes);
                tracing::info!("Cleaned {} directories", count);
                ActionOutcome::Completed
            }
            Ok(response) => {
                let message = format!("Clean failed: {}", response.error_message());
                tracing::warn!("{}", message);
                self.clean_failed(message)
            }
            Err(e) => {
                tracing::error!("Clean request failed: {}", e);
                self.clean_failed(TRANSPORT_FAILURE_MESSAGE.to_string())
            }
        }
    }

    fn clean_failed(&self, message: String) -> ActionOutcome {
        self.metrics.record_clean_failed();
        self.state.update(|s| s.summary = Summary::error(message));
        ActionOutcome::Failed
    }

    /// Ask the backend to show `path` in the file manager.
    ///
    /// Failure only touches the summary; rows and selection stay as they are.
    pub async fn reveal(&self, path: &str) -> ActionOutcome {
        reveal_with(&*self.backend, &self.metrics, path, |summary| {
            self.state.update(|s| s.summary = summary);
        })
        .await
    }
}

fn occupied_or_placeholder(occupied: Option<&str>) -> &str {
    match occupied {
        Some(text) if !text.trim().is_empty() => text,
        _ => OCCUPIED_PLACEHOLDER,
    }
}

fn release_after_scan(s: &mut CleanserState) {
    if s.scan_phase == ScanPhase::Scanning {
        s.scan_phase = ScanPhase::Idle;
    }
    s.controls.scan_enabled = !s.is_cleaning();
    s.controls.reset_enabled = !s.is_cleaning();
}

fn release_after_clean(s: &mut CleanserState) {
    if s.is_cleaning() {
        s.clean_phase = CleanPhase::NoPendingConfirm;
    }
    s.controls.scan_enabled = s.scan_phase != ScanPhase::Scanning;
    s.controls.reset_enabled = s.scan_phase != ScanPhase::Scanning;
    s.recompute_selection();
}
