//! Page controllers, one per route.
//!
//! A controller is created by the [`Router`](crate::ui::loader::Router) each time
//! its route is mounted and owns a fresh [`StateManager`] for that session. Every
//! backend call follows the same discipline: flip the affordances off inside one
//! [`StateManager::transact`] step, hold a [`ReleaseOnDrop`] guard across the
//! call, and let the guard turn them back on however the call settles.

pub mod project_cleanser;
pub mod quick_find;

pub use project_cleanser::{ConfirmTicket, ProjectCleanser};
pub use quick_find::QuickFind;

use crate::metrics::Metrics;
use crate::models::Summary;
use crate::services::Backend;
use crate::state::{StateManager, TrackedState};

/// Summary shown when a backend call could not be completed at all.
pub const TRANSPORT_FAILURE_MESSAGE: &str =
    "Something went wrong talking to the backend. Check the log for details.";

/// How a user-triggered action ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend call succeeded and the page shows its result
    Completed,

    /// Local validation failed; no backend call was made
    Rejected,

    /// The affordance was disabled or the ticket was stale; nothing happened
    Ignored,

    /// Logical or transport failure, reported in the summary
    Failed,
}

/// Runs `release` against the page state when dropped.
///
/// Held across a backend call so disabled affordances come back on every exit
/// path, including a task that is dropped mid-call.
pub(crate) struct ReleaseOnDrop<S: TrackedState> {
    state: StateManager<S>,
    release: fn(&mut S),
}

impl<S: TrackedState> ReleaseOnDrop<S> {
    pub(crate) fn new(state: &StateManager<S>, release: fn(&mut S)) -> Self {
        Self {
            state: state.clone(),
            release,
        }
    }
}

impl<S: TrackedState> Drop for ReleaseOnDrop<S> {
    fn drop(&mut self) {
        self.state.update(self.release);
    }
}

/// Reveal `path` in the file manager, reporting failure through `report`.
pub(crate) async fn reveal_with<F>(
    backend: &dyn Backend,
    metrics: &Metrics,
    path: &str,
    report: F,
) -> ActionOutcome
where
    F: FnOnce(Summary),
{
    tracing::debug!("Revealing {}", path);
    let failure = match backend.reveal_in_folder(path.to_string()).await {
        Ok(response) if response.is_success() => return ActionOutcome::Completed,
        Ok(response) => response.error_message().to_string(),
        Err(e) => e.to_string(),
    };

    tracing::warn!("Could not reveal {}: {}", path, failure);
    metrics.record_reveal_failed();
    report(Summary::error(format!(
        "Could not reveal {} in the file manager.",
        path
    )));
    ActionOutcome::Failed
}
