use crate::models::cleanser::Summary;
use crate::state::TrackedState;

/// Summary shown before the first search.
pub const QUICK_FIND_PROMPT: &str = "Enter a directory and a glob pattern to search.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickFindControls {
    pub search_enabled: bool,
    pub reset_enabled: bool,
}

impl Default for QuickFindControls {
    fn default() -> Self {
        Self {
            search_enabled: true,
            reset_enabled: true,
        }
    }
}

/// View-model of the quick-find page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickFindState {
    pub root_path: String,
    pub pattern: String,

    /// Matched file paths, in backend order
    pub matches: Vec<String>,

    /// Text shown in the result area instead of matches
    /// ("no files found", or the detail of a transport failure)
    pub results_note: Option<String>,

    pub summary: Summary,
    pub controls: QuickFindControls,
}

impl Default for QuickFindState {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            pattern: String::new(),
            matches: Vec::new(),
            results_note: None,
            summary: Summary::neutral(QUICK_FIND_PROMPT),
            controls: QuickFindControls::default(),
        }
    }
}

impl QuickFindState {
    pub fn clear_results(&mut self) {
        self.matches.clear();
        self.results_note = None;
        self.summary = Summary::neutral(QUICK_FIND_PROMPT);
    }

    pub fn reset(&mut self) {
        self.root_path.clear();
        self.pattern.clear();
        self.clear_results();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum QuickFindChange {
    InputsChanged { root_path: String, pattern: String },
    ResultsChanged { count: usize, note: Option<String> },
    SummaryChanged(Summary),
    ControlsChanged(QuickFindControls),
}

impl TrackedState for QuickFindState {
    type Change = QuickFindChange;

    fn detect_changes(old: &Self, new: &Self) -> Vec<QuickFindChange> {
        let mut changes = Vec::new();

        if old.root_path != new.root_path || old.pattern != new.pattern {
            changes.push(QuickFindChange::InputsChanged {
                root_path: new.root_path.clone(),
                pattern: new.pattern.clone(),
            });
        }

        if old.matches != new.matches || old.results_note != new.results_note {
            changes.push(QuickFindChange::ResultsChanged {
                count: new.matches.len(),
                note: new.results_note.clone(),
            });
        }

        if old.summary != new.summary {
            changes.push(QuickFindChange::SummaryChanged(new.summary.clone()));
        }

        if old.controls != new.controls {
            changes.push(QuickFindChange::ControlsChanged(new.controls.clone()));
        }

        changes
    }
}
