// Bridges between the tokio runtime, the page sessions and the Slint event loop
//
// - EventLoopBridge: UI updates from tokio tasks, marshalled onto Slint's
//   event loop thread via upgrade_in_event_loop
// - PageBridge: forwards a mounted page's state changes to its renderer
// - ActionSet: every backend action spawned during a session, so shutdown can
//   wait for all of them, whichever page started them

use crate::state::{StateManager, TrackedState};
use slint::{ComponentHandle, Weak};
use std::future::Future;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

/// Boxed UI update, run on the Slint event loop thread
type UiUpdate<T> = Box<dyn FnOnce(&T) + Send>;

/// Coordinates between the tokio runtime and the Slint event loop
///
/// # Example
/// ```ignore
/// let ui = MainWindow::new()?;
/// let bridge = EventLoopBridge::new(&ui, runtime.handle().clone());
///
/// let handle = bridge.clone_handle();
/// runtime.spawn(async move {
///     handle.update_ui(|ui| ui.set_page_title("Quick find".into()));
/// });
/// ```
pub struct EventLoopBridge<T: ComponentHandle> {
    /// Weak reference to the UI component to prevent circular references
    ui_weak: Weak<T>,

    /// Handle to the tokio runtime for spawning async tasks
    tokio_handle: tokio::runtime::Handle,

    /// Bounded to 100 updates so a stalled window cannot grow memory without limit
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
}

impl<T: ComponentHandle + 'static> EventLoopBridge<T> {
    /// Start the handler thread that forwards queued updates to the event loop.
    ///
    /// The thread ends when every sender is gone or the event loop refuses an
    /// update.
    pub fn new(ui: &T, tokio_handle: tokio::runtime::Handle) -> Self {
        let ui_weak = ui.as_weak();
        let (ui_update_tx, mut ui_update_rx) = mpsc::channel::<UiUpdate<T>>(100);

        let ui_weak_clone = ui_weak.clone();
        std::thread::spawn(move || {
            tracing::debug!("EventLoopBridge handler thread started");

            while let Some(update_fn) = ui_update_rx.blocking_recv() {
                let result = ui_weak_clone.upgrade_in_event_loop(move |ui| {
                    update_fn(&ui);
                });

                if let Err(e) = result {
                    tracing::warn!("Failed to queue UI update to event loop: {:?}", e);
                    break;
                }
            }

            tracing::debug!("EventLoopBridge handler thread terminated");
        });

        Self {
            ui_weak,
            tokio_handle,
            ui_update_tx,
        }
    }

    /// Schedule a UI update from any thread
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        send_update(&self.ui_update_tx, Box::new(update));
    }

    /// Lightweight cloneable handle for callbacks, surfaces and renderers
    pub fn clone_handle(&self) -> EventLoopBridgeHandle<T> {
        EventLoopBridgeHandle {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}

fn send_update<T>(tx: &mpsc::Sender<UiUpdate<T>>, update: UiUpdate<T>) {
    match tx.try_send(update) {
        Ok(_) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!("UI update channel full - skipping update to prevent backpressure");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::warn!("Failed to send UI update - handler thread has stopped");
        }
    }
}

/// Cloneable counterpart of [`EventLoopBridge`]
pub struct EventLoopBridgeHandle<T: ComponentHandle> {
    ui_weak: Weak<T>,
    tokio_handle: tokio::runtime::Handle,
    ui_update_tx: mpsc::Sender<UiUpdate<T>>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T: ComponentHandle> Clone for EventLoopBridgeHandle<T> {
    fn clone(&self) -> Self {
        Self {
            ui_weak: self.ui_weak.clone(),
            tokio_handle: self.tokio_handle.clone(),
            ui_update_tx: self.ui_update_tx.clone(),
        }
    }
}

impl<T: ComponentHandle + 'static> EventLoopBridgeHandle<T> {
    /// See [`EventLoopBridge::update_ui`]
    pub fn update_ui<F>(&self, update: F)
    where
        F: FnOnce(&T) + Send + 'static,
    {
        send_update(&self.ui_update_tx, Box::new(update));
    }

    /// Whether updates can still reach the window
    pub fn is_connected(&self) -> bool {
        !self.ui_update_tx.is_closed()
    }

    pub fn tokio_handle(&self) -> &tokio::runtime::Handle {
        &self.tokio_handle
    }

    pub fn ui_weak(&self) -> &Weak<T> {
        &self.ui_weak
    }
}

/// Render subscription for one mounted page
///
/// # Example
/// ```ignore
/// let page = QuickFind::init(backend, metrics);
/// let bridge = PageBridge::new(page.state(), handle, move |change| render(&change));
/// ```
pub struct PageBridge {
    /// Task draining the page's change events into the renderer
    render_task: Option<JoinHandle<()>>,
}

impl PageBridge {
    /// Subscribe `render` to every change event of `state`.
    ///
    /// Events are delivered in emission order. If the renderer falls more than
    /// the channel capacity behind, the skipped events are logged and dropped.
    pub fn new<S, F>(state: &StateManager<S>, tokio_handle: tokio::runtime::Handle, mut render: F) -> Self
    where
        S: TrackedState,
        F: FnMut(S::Change) + Send + 'static,
    {
        let mut rx = state.subscribe();
        let render_task = tokio_handle.spawn(async move {
            tracing::debug!("Render subscription started");
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        tracing::trace!("State change received: {:?}", change);
                        render(change);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Renderer lagged behind, skipped {} change events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            tracing::debug!("Render subscription terminated");
        });

        Self {
            render_task: Some(render_task),
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.render_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    /// Stop rendering. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
            tracing::debug!("Render subscription aborted");
        }
    }
}

impl Drop for PageBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Backend actions spawned during a session.
///
/// Owned by the session rather than by a page, so navigating away never
/// detaches an outstanding clean: [`settle`](Self::settle) waits for every
/// action spawned since the session began.
pub struct ActionSet {
    tokio_handle: tokio::runtime::Handle,
    tasks: JoinSet<()>,
}

impl ActionSet {
    pub fn new(tokio_handle: tokio::runtime::Handle) -> Self {
        Self {
            tokio_handle,
            tasks: JoinSet::new(),
        }
    }

    /// Run an action on the runtime without waiting for it.
    pub fn spawn<Fut>(&mut self, action: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.reap();
        self.tasks.spawn_on(action, &self.tokio_handle);
    }

    /// Number of actions that have not finished yet
    pub fn outstanding(&mut self) -> usize {
        self.reap();
        self.tasks.len()
    }

    /// Wait for every spawned action to finish
    pub async fn settle(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join(result);
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join(result);
        }
    }
}

impl Drop for ActionSet {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            tracing::warn!("Dropping {} unsettled page actions", self.tasks.len());
        }
    }
}

fn log_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        tracing::error!("Page action failed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{QuickFindChange, QuickFindState};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    async fn let_tasks_run() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_changes_reach_renderer_in_order() {
        let state: StateManager<QuickFindState> = StateManager::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _bridge = PageBridge::new(&state, tokio::runtime::Handle::current(), move |change| {
            sink.lock().unwrap().push(change);
        });

        state.update(|s| s.root_path = "/src".to_string());
        state.update(|s| s.matches.push("/src/lib.rs".to_string()));
        let_tasks_run().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(matches!(seen[0], QuickFindChange::InputsChanged { .. }));
        assert!(matches!(seen[1], QuickFindChange::ResultsChanged { count: 1, .. }));
    }

    #[tokio::test]
    async fn test_shutdown_stops_rendering() {
        let state: StateManager<QuickFindState> = StateManager::new();
        let renders = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&renders);
        let mut bridge = PageBridge::new(&state, tokio::runtime::Handle::current(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let_tasks_run().await;
        assert!(bridge.is_rendering());

        bridge.shutdown();
        bridge.shutdown();
        state.update(|s| s.pattern = "*.rs".to_string());
        let_tasks_run().await;

        assert!(!bridge.is_rendering());
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_settle_waits_for_every_action() {
        let mut actions = ActionSet::new(tokio::runtime::Handle::current());
        let done = Arc::new(AtomicUsize::new(0));

        for delay in [30u64, 5, 60] {
            let flag = Arc::clone(&done);
            actions.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                flag.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(actions.outstanding(), 3);

        actions.settle().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(actions.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_finished_actions_are_reaped() {
        let mut actions = ActionSet::new(tokio::runtime::Handle::current());
        actions.spawn(async {});
        let_tasks_run().await;

        assert_eq!(actions.outstanding(), 0);
    }

    #[tokio::test]
    async fn test_panicking_action_does_not_stop_settle() {
        let mut actions = ActionSet::new(tokio::runtime::Handle::current());
        let done = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&done);

        actions.spawn(async { panic!("backend double exploded") });
        actions.spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            flag.fetch_add(1, Ordering::SeqCst);
        });
        actions.settle().await;

        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
