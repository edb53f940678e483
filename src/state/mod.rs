// State management module
//
// This module provides the StateManager which wraps a page's state with thread-safe access
// using Arc<RwLock<T>> and emits change events for rendering.

use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// Capacity of the change broadcast channel. Slow renderers lag rather than block.
const CHANGE_CHANNEL_CAPACITY: usize = 100;

/// State that can describe its own mutations as change events.
///
/// Implemented by each page's view-model so one [`StateManager`] serves every page.
pub trait TrackedState: Clone + Default + Send + Sync + 'static {
    /// Event emitted to subscribers when part of the state changes
    type Change: Clone + Debug + Send + 'static;

    /// Compare two states and list what changed, in render order
    fn detect_changes(old: &Self, new: &Self) -> Vec<Self::Change>;
}

/// Thread-safe state manager with event emission
///
/// This is the central state component of a mounted page. It:
/// - Provides thread-safe access to the page state via `Arc<RwLock<T>>`
/// - Detects state changes and emits [`TrackedState::Change`] events
/// - Lets callers run check-and-set transitions atomically ([`transact()`](Self::transact))
/// - Supports subscribing to state changes via tokio broadcast channels
///
/// Clones share the same state and channel.
pub struct StateManager<S: TrackedState> {
    state: Arc<RwLock<S>>,
    state_tx: broadcast::Sender<S::Change>,
}

impl<S: TrackedState> StateManager<S> {
    /// Create a new StateManager holding `S::default()`
    pub fn new() -> Self {
        Self::with_state(S::default())
    }

    /// Create a new StateManager holding `initial`
    pub fn with_state(initial: S) -> Self {
        let (state_tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(initial)),
            state_tx,
        }
    }

    /// Get a read-only snapshot of the current state
    ///
    /// This clones the entire state, so it's safe to use without holding locks.
    /// For checking individual fields, consider using `read()` with a closure.
    pub fn snapshot(&self) -> S {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Execute a function with read access to the state
    ///
    /// # Example
    /// ```ignore
    /// let busy = state_manager.read(|state| !state.controls.scan_enabled);
    /// ```
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    /// Update the state and emit change events
    ///
    /// Returns the events that were emitted.
    pub fn update<F>(&self, update_fn: F) -> Vec<S::Change>
    where
        F: FnOnce(&mut S),
    {
        self.transact(update_fn).1
    }

    /// Run a transition under the write lock and emit the resulting events
    ///
    /// The closure's return value is handed back alongside the events, which makes
    /// "check a guard, then flip it" a single atomic step.
    pub fn transact<F, R>(&self, transition: F) -> (R, Vec<S::Change>)
    where
        F: FnOnce(&mut S) -> R,
    {
        let (result, changes) = {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            let old_state = state.clone();
            let result = transition(&mut state);
            let changes = S::detect_changes(&old_state, &state);
            (result, changes)
        };

        for change in &changes {
            // Ignore send errors - it's OK if no one is listening
            let _ = self.state_tx.send(change.clone());
        }

        (result, changes)
    }

    /// Subscribe to state change events
    ///
    /// Returns a receiver that will get notified of all future state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<S::Change> {
        self.state_tx.subscribe()
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.state_tx.receiver_count()
    }
}

impl<S: TrackedState> Default for StateManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TrackedState> Clone for StateManager<S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            state_tx: self.state_tx.clone(),
        }
    }
}
