use crate::models::{ProjectType, RowRecord};
use crate::services::format::format_bytes;
use crate::state::TrackedState;
use std::collections::BTreeSet;

/// Summary shown before anything has been scanned.
pub const INITIAL_SUMMARY: &str = "Choose a directory and start a scan.";

/// Clean button label with nothing in flight.
pub const CLEAN_LABEL: &str = "Clean selected";

/// Clean button label while a delete request is outstanding.
pub const CLEANING_LABEL: &str = "Cleaning...";

/// Colour signal of the summary line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tone {
    /// Initial text and in-progress messages
    #[default]
    Neutral,
    Success,
    Error,
}

/// The single channel for success and failure messages.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Summary {
    pub text: String,
    pub tone: Tone,
}

impl Summary {
    pub fn neutral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Neutral,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScanPhase {
    #[default]
    Idle,
    Scanning,
    Scanned,
    ScanFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CleanPhase {
    #[default]
    NoPendingConfirm,
    ConfirmPending,
    Cleaning,
}

/// A frozen "delete these rows" request awaiting the user's answer.
///
/// `targets` are full records because the delete call carries records, not
/// bare paths. `id` ties the confirm/cancel handlers to this instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingConfirmation {
    pub id: u64,
    pub targets: Vec<RowRecord>,
}

/// Enabled/checked/label state of every page affordance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanserControls {
    pub scan_enabled: bool,
    pub reset_enabled: bool,
    pub clean_enabled: bool,
    pub clean_label: String,
    pub select_all_checked: bool,
}

impl Default for CleanserControls {
    fn default() -> Self {
        Self {
            scan_enabled: true,
            reset_enabled: true,
            clean_enabled: false,
            clean_label: CLEAN_LABEL.to_string(),
            select_all_checked: false,
        }
    }
}

/// View-model of the project cleanser page.
///
/// Owned by one [`StateManager`](crate::state::StateManager) per mounted page.
/// `selected` always holds a subset of the paths in `rows`; every mutation of
/// either goes through [`recompute_selection`](Self::recompute_selection).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanserState {
    // Inputs
    pub root_path: String,
    pub project_type: ProjectType,

    // Results
    pub rows: Vec<RowRecord>,
    pub selected: BTreeSet<String>,

    // Workflow
    pub scan_phase: ScanPhase,
    pub clean_phase: CleanPhase,
    pub pending: Option<PendingConfirmation>,
    pub dialog: Option<String>,

    // Presentation
    pub summary: Summary,
    pub selection_summary: String,
    pub controls: CleanserControls,
}

impl Default for CleanserState {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            project_type: ProjectType::Any,
            rows: Vec::new(),
            selected: BTreeSet::new(),
            scan_phase: ScanPhase::Idle,
            clean_phase: CleanPhase::NoPendingConfirm,
            pending: None,
            dialog: None,
            summary: Summary::neutral(INITIAL_SUMMARY),
            selection_summary: String::new(),
            controls: CleanserControls::default(),
        }
    }
}

impl CleanserState {
    /// Selected rows in display order
    pub fn selected_rows(&self) -> impl Iterator<Item = &RowRecord> {
        self.rows
            .iter()
            .filter(|row| self.selected.contains(&row.path))
    }

    /// Exact byte total of the selection
    pub fn selected_bytes(&self) -> u64 {
        self.selected_rows().map(|row| row.total_bytes).sum()
    }

    pub fn is_cleaning(&self) -> bool {
        self.clean_phase == CleanPhase::Cleaning
    }

    /// Re-derive everything that depends on the selection.
    ///
    /// Drops selected paths that are no longer rendered, then refreshes the
    /// selection summary, the clean button and the select-all checkbox.
    pub fn recompute_selection(&mut self) {
        let rendered: BTreeSet<&str> = self.rows.iter().map(|row| row.path.as_str()).collect();
        self.selected.retain(|path| rendered.contains(path.as_str()));

        let count = self.selected.len();
        if count == 0 {
            self.selection_summary.clear();
        } else {
            self.selection_summary = format!(
                "{} selected, about {} can be reclaimed.",
                count,
                format_bytes(self.selected_bytes())
            );
        }

        if self.is_cleaning() {
            self.controls.clean_enabled = false;
            self.controls.clean_label = CLEANING_LABEL.to_string();
        } else if count == 0 {
            self.controls.clean_enabled = false;
            self.controls.clean_label = CLEAN_LABEL.to_string();
        } else {
            self.controls.clean_enabled = true;
            self.controls.clean_label = format!("{} ({})", CLEAN_LABEL, count);
        }

        self.controls.select_all_checked = !self.rows.is_empty() && count == self.rows.len();
    }

    /// Replace the result set wholesale; the selection starts empty.
    pub fn replace_rows(&mut self, rows: Vec<RowRecord>) {
        self.rows = rows;
        self.selected.clear();
        self.recompute_selection();
    }

    /// Remove exactly the given paths from the result set.
    pub fn remove_paths(&mut self, paths: &BTreeSet<String>) {
        self.rows.retain(|row| !paths.contains(&row.path));
        self.recompute_selection();
    }

    /// Empty results, selection and any open confirmation.
    pub fn clear_results(&mut self) {
        self.rows.clear();
        self.selected.clear();
        self.pending = None;
        self.dialog = None;
        if self.clean_phase == CleanPhase::ConfirmPending {
            self.clean_phase = CleanPhase::NoPendingConfirm;
        }
        self.recompute_selection();
    }

    /// Back to the freshly mounted page.
    pub fn reset(&mut self) {
        self.root_path.clear();
        self.project_type = ProjectType::Any;
        self.clear_results();
        self.scan_phase = ScanPhase::Idle;
        self.summary = Summary::neutral(INITIAL_SUMMARY);
    }
}

/// Change events emitted by the cleanser page's state manager
#[derive(Clone, Debug, PartialEq)]
pub enum CleanserChange {
    InputsChanged {
        root_path: String,
        project_type: ProjectType,
    },

    /// The rendered row list changed
    RowsChanged { count: usize },

    SelectionChanged {
        selected: usize,
        total: usize,
        summary: String,
    },

    SummaryChanged(Summary),

    ControlsChanged(CleanserControls),

    ConfirmationOpened { message: String },

    ConfirmationClosed,

    PhaseChanged { scan: ScanPhase, clean: CleanPhase },
}

impl TrackedState for CleanserState {
    type Change = CleanserChange;

    fn detect_changes(old: &Self, new: &Self) -> Vec<CleanserChange> {
        let mut changes = Vec::new();

        if old.root_path != new.root_path || old.project_type != new.project_type {
            changes.push(CleanserChange::InputsChanged {
                root_path: new.root_path.clone(),
                project_type: new.project_type,
            });
        }

        if old.scan_phase != new.scan_phase || old.clean_phase != new.clean_phase {
            changes.push(CleanserChange::PhaseChanged {
                scan: new.scan_phase,
                clean: new.clean_phase,
            });
        }

        if old.rows != new.rows {
            changes.push(CleanserChange::RowsChanged {
                count: new.rows.len(),
            });
        }

        if old.selected != new.selected || old.selection_summary != new.selection_summary {
            changes.push(CleanserChange::SelectionChanged {
                selected: new.selected.len(),
                total: new.rows.len(),
                summary: new.selection_summary.clone(),
            });
        }

        if old.summary != new.summary {
            changes.push(CleanserChange::SummaryChanged(new.summary.clone()));
        }

        if old.controls != new.controls {
            changes.push(CleanserChange::ControlsChanged(new.controls.clone()));
        }

        match (&old.dialog, &new.dialog) {
            (None, Some(message)) => changes.push(CleanserChange::ConfirmationOpened {
                message: message.clone(),
            }),
            (Some(_), None) => changes.push(CleanserChange::ConfirmationClosed),
            _ => {}
        }

        changes
    }
}
