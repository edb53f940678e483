//! Integration tests for the project cleanser workflow
//!
//! These tests drive ProjectCleanser through its public API against backend
//! doubles and verify that:
//! - Scan results replace the row list and start unselected
//! - The confirmation gates every delete and is consumed exactly once
//! - A successful clean removes exactly the requested paths
//! - Affordances come back after every kind of failure
//! - Overlapping scans are ignored rather than queued

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::always;
use pandorust::models::cleanser::{CLEAN_LABEL, INITIAL_SUMMARY};
use pandorust::models::{
    CleanPhase, CleanserState, ProjectType, QuickFindRequest, QuickFindResponse, RowRecord,
    RpcResponse, ScanPhase, ScanRequest, ScanResponse, Summary, Tone,
};
use pandorust::ui::pages::project_cleanser::EMPTY_ROOT_MESSAGE;
use pandorust::ui::pages::{ActionOutcome, ProjectCleanser, TRANSPORT_FAILURE_MESSAGE};
use pandorust::{Backend, BackendError, Metrics};
use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use tokio::time::{Duration, timeout};

mock! {
    pub Backend {}

    #[async_trait]
    impl Backend for Backend {
        async fn scan(&self, request: ScanRequest) -> Result<RpcResponse<ScanResponse>, BackendError>;
        async fn clean(&self, targets: Vec<RowRecord>) -> Result<RpcResponse<ScanResponse>, BackendError>;
        async fn reveal_in_folder(&self, path: String) -> Result<RpcResponse<()>, BackendError>;
        async fn quick_find(&self, request: QuickFindRequest) -> Result<RpcResponse<QuickFindResponse>, BackendError>;
    }
}

fn cargo_target() -> RowRecord {
    RowRecord {
        path: "/tmp/proj/target".to_string(),
        occupied: "1.25 GB".to_string(),
        category: "Cargo".to_string(),
        updated_at: "2025-07-20".to_string(),
        total_bytes: 1_342_177_280,
    }
}

fn row(path: &str, total_bytes: u64) -> RowRecord {
    RowRecord {
        path: path.to_string(),
        occupied: pandorust::services::format_bytes(total_bytes),
        category: "Maven".to_string(),
        updated_at: "2023-02-11".to_string(),
        total_bytes,
    }
}

fn scan_response(rows: Vec<RowRecord>, occupied: &str) -> RpcResponse<ScanResponse> {
    RpcResponse::ok(ScanResponse {
        count: rows.len(),
        rows,
        occupied_summary: Some(occupied.to_string()),
        elapsed_millis: 1234,
    })
}

fn page(backend: MockBackend) -> ProjectCleanser {
    ProjectCleanser::init(Arc::new(backend), Arc::new(Metrics::new()))
}

#[tokio::test]
async fn test_scan_select_confirm_clean_scenario() {
    let mut backend = MockBackend::new();
    backend
        .expect_scan()
        .withf(|request| request.root_path == "/tmp/proj" && request.project_type == ProjectType::Any)
        .times(1)
        .returning(|_| Ok(scan_response(vec![cargo_target()], "1.25 GB")));
    backend
        .expect_clean()
        .withf(|targets| targets == &vec![cargo_target()])
        .times(1)
        .returning(|_| Ok(scan_response(vec![], "0 Bytes")));
    let page = page(backend);

    // Scan: one row, nothing selected, clean disabled
    assert_eq!(page.scan("/tmp/proj", ProjectType::Any).await, ActionOutcome::Completed);
    let state = page.snapshot();
    assert_eq!(state.rows, vec![cargo_target()]);
    assert!(state.selected.is_empty());
    assert!(state.summary.text.contains("found 1 reclaimable"));
    assert!(state.summary.text.contains("1.234 s"));
    assert!(!state.controls.clean_enabled);

    // Select the row: clean becomes available
    page.toggle_selection("/tmp/proj/target");
    let state = page.snapshot();
    assert!(state.controls.clean_enabled);
    assert!(state.controls.select_all_checked);
    assert_eq!(state.selection_summary, "1 selected, about 1.25 GB can be reclaimed.");

    // Request clean: confirmation names the count
    let ticket = page.request_clean().expect("confirmation should open");
    let state = page.snapshot();
    assert_eq!(state.clean_phase, CleanPhase::ConfirmPending);
    assert!(state.dialog.as_deref().unwrap().contains(" 1 "));

    // Confirm: clean call carries the full record, table empties
    assert_eq!(page.confirm(ticket).await, ActionOutcome::Completed);
    let state = page.snapshot();
    assert!(state.rows.is_empty());
    assert!(state.selection_summary.is_empty());
    assert_eq!(state.summary.tone, Tone::Success);
    assert!(state.summary.text.contains("0 remaining"));
    assert_eq!(state.controls.clean_label, CLEAN_LABEL);
    assert!(!state.controls.clean_enabled);
    assert_eq!(state.clean_phase, CleanPhase::NoPendingConfirm);
}

#[tokio::test]
async fn test_empty_root_never_reaches_backend() {
    let mut backend = MockBackend::new();
    backend.expect_scan().never();
    let page = page(backend);

    assert_eq!(page.scan("", ProjectType::Cargo).await, ActionOutcome::Rejected);

    let state = page.snapshot();
    assert_eq!(state.summary, Summary::error(EMPTY_ROOT_MESSAGE));
    assert!(state.rows.is_empty());
}

#[tokio::test]
async fn test_transport_failure_during_scan() {
    let mut backend = MockBackend::new();
    backend.expect_scan().with(always()).times(1).returning(|_| {
        Err(BackendError::Spawn {
            program: "pandorust-backend".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    });
    let page = page(backend);

    assert_eq!(page.scan("/tmp/proj", ProjectType::Any).await, ActionOutcome::Failed);

    let state = page.snapshot();
    assert_eq!(state.summary, Summary::error(TRANSPORT_FAILURE_MESSAGE));
    assert!(state.rows.is_empty());
    assert_eq!(state.scan_phase, ScanPhase::ScanFailed);
    assert!(state.controls.scan_enabled);
    assert!(state.controls.reset_enabled);
}

#[tokio::test]
async fn test_cancel_never_calls_backend() {
    let mut backend = MockBackend::new();
    backend
        .expect_scan()
        .returning(|_| Ok(scan_response(vec![row("/a", 1), row("/b", 2)], "3 Bytes")));
    backend.expect_clean().never();
    let page = page(backend);
    page.scan("/", ProjectType::Any).await;
    page.select_all(true);

    let ticket = page.request_clean().unwrap();
    assert_eq!(page.cancel(ticket), ActionOutcome::Completed);

    let state = page.snapshot();
    assert_eq!(state.rows.len(), 2);
    assert_eq!(state.selected.len(), 2);
    assert!(state.dialog.is_none());
    assert_eq!(state.clean_phase, CleanPhase::NoPendingConfirm);
}

#[tokio::test]
async fn test_clean_keeps_rows_outside_request() {
    let mut backend = MockBackend::new();
    backend.expect_scan().returning(|_| {
        Ok(scan_response(
            vec![row("/a", 100), row("/b", 200), row("/c", 300)],
            "600 Bytes",
        ))
    });
    // Backend reports a different remainder; the page trusts its own request
    backend
        .expect_clean()
        .returning(|_| Ok(scan_response(vec![row("/zzz", 1)], "400 Bytes")));
    let page = page(backend);
    page.scan("/", ProjectType::Any).await;
    page.toggle_selection("/b");

    let ticket = page.request_clean().unwrap();
    page.confirm(ticket).await;

    let paths: Vec<String> = page.snapshot().rows.into_iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["/a".to_string(), "/c".to_string()]);
    assert!(page.snapshot().summary.text.contains("occupying 400 Bytes"));
}

#[tokio::test]
async fn test_reset_restores_initial_page() {
    let mut backend = MockBackend::new();
    backend
        .expect_scan()
        .returning(|_| Ok(scan_response(vec![row("/a", 1)], "1 Bytes")));
    let page = page(backend);
    page.scan("/", ProjectType::Maven).await;
    page.select_all(true);

    assert!(page.reset());

    let state = page.snapshot();
    assert_eq!(state.summary, Summary::neutral(INITIAL_SUMMARY));
    assert!(state.root_path.is_empty());
    assert_eq!(state.project_type, ProjectType::Any);
    assert!(state.rows.is_empty());
    assert!(!state.controls.clean_enabled);
    assert!(!state.controls.select_all_checked);
}

/// Backend whose scan and clean calls park until released.
struct GatedBackend {
    entered: Notify,
    release: Notify,
    scans: AtomicUsize,
    cleans: AtomicUsize,
}

impl GatedBackend {
    fn new() -> Self {
        Self {
            entered: Notify::new(),
            release: Notify::new(),
            scans: AtomicUsize::new(0),
            cleans: AtomicUsize::new(0),
        }
    }

    async fn wait_until_called(&self) {
        timeout(Duration::from_secs(1), self.entered.notified())
            .await
            .expect("backend was never called");
    }
}

#[async_trait]
impl Backend for GatedBackend {
    async fn scan(&self, _request: ScanRequest) -> Result<RpcResponse<ScanResponse>, BackendError> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(scan_response(vec![row("/a", 10), row("/b", 20)], "30 Bytes"))
    }

    async fn clean(&self, _targets: Vec<RowRecord>) -> Result<RpcResponse<ScanResponse>, BackendError> {
        self.cleans.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Err(BackendError::Exited {
            code: None,
            stderr: "killed".to_string(),
        })
    }

    async fn reveal_in_folder(&self, _path: String) -> Result<RpcResponse<()>, BackendError> {
        Ok(RpcResponse::ok(()))
    }

    async fn quick_find(
        &self,
        _request: QuickFindRequest,
    ) -> Result<RpcResponse<QuickFindResponse>, BackendError> {
        Ok(RpcResponse::ok(QuickFindResponse::default()))
    }
}

#[tokio::test]
async fn test_overlapping_scan_is_ignored() {
    let backend = Arc::new(GatedBackend::new());
    let page = ProjectCleanser::init(backend.clone(), Arc::new(Metrics::new()));

    let first = tokio::spawn({
        let page = page.clone();
        async move { page.scan("/", ProjectType::Any).await }
    });
    backend.wait_until_called().await;

    let state = page.snapshot();
    assert_eq!(state.scan_phase, ScanPhase::Scanning);
    assert!(!state.controls.scan_enabled);
    assert!(!state.controls.reset_enabled);
    assert_eq!(page.scan("/", ProjectType::Any).await, ActionOutcome::Ignored);
    assert!(!page.reset());

    backend.release.notify_one();
    assert_eq!(first.await.unwrap(), ActionOutcome::Completed);

    assert_eq!(backend.scans.load(Ordering::SeqCst), 1);
    let state = page.snapshot();
    assert_eq!(state.rows.len(), 2);
    assert!(state.controls.scan_enabled);
    assert!(state.controls.reset_enabled);
}

#[tokio::test]
async fn test_cleaning_disables_scan_and_shows_progress_label() {
    let backend = Arc::new(GatedBackend::new());
    let page = ProjectCleanser::init(backend.clone(), Arc::new(Metrics::new()));

    let scan = tokio::spawn({
        let page = page.clone();
        async move { page.scan("/", ProjectType::Any).await }
    });
    backend.wait_until_called().await;
    backend.release.notify_one();
    scan.await.unwrap();

    page.toggle_selection("/a");
    let ticket = page.request_clean().unwrap();
    let clean = tokio::spawn({
        let page = page.clone();
        async move { page.confirm(ticket).await }
    });
    backend.wait_until_called().await;

    let state = page.snapshot();
    assert_eq!(state.clean_phase, CleanPhase::Cleaning);
    assert!(!state.controls.clean_enabled);
    assert_eq!(state.controls.clean_label, "Cleaning...");
    assert!(!state.controls.scan_enabled);
    assert!(page.request_clean().is_none());

    backend.release.notify_one();
    assert_eq!(clean.await.unwrap(), ActionOutcome::Failed);

    let state = page.snapshot();
    assert_eq!(backend.cleans.load(Ordering::SeqCst), 1);
    assert_eq!(state.rows.len(), 2);
    assert_eq!(state.summary, Summary::error(TRANSPORT_FAILURE_MESSAGE));
    assert!(state.controls.clean_enabled);
    assert_eq!(state.controls.clean_label, "Clean selected (1)");
    assert!(state.controls.scan_enabled);
}

#[tokio::test]
async fn test_selection_changes_ignored_during_clean() {
    let backend = Arc::new(GatedBackend::new());
    let page = ProjectCleanser::init(backend.clone(), Arc::new(Metrics::new()));

    let scan = tokio::spawn({
        let page = page.clone();
        async move { page.scan("/", ProjectType::Any).await }
    });
    backend.wait_until_called().await;
    backend.release.notify_one();
    scan.await.unwrap();

    page.toggle_selection("/a");
    let ticket = page.request_clean().unwrap();
    let clean = tokio::spawn({
        let page = page.clone();
        async move { page.confirm(ticket).await }
    });
    backend.wait_until_called().await;

    assert!(!page.toggle_selection("/b"));
    assert!(!page.toggle_selection("/a"));
    assert!(!page.select_all(true));
    let state = page.snapshot();
    assert_eq!(state.selected.len(), 1);
    assert_eq!(state.controls.clean_label, "Cleaning...");

    backend.release.notify_one();
    assert_eq!(clean.await.unwrap(), ActionOutcome::Failed);

    // The clean failed, so the frozen selection is the one that survives
    let state = page.snapshot();
    assert_eq!(state.selected.len(), 1);
    assert!(state.selected.contains("/a"));
    assert_eq!(state.controls.clean_label, "Clean selected (1)");
    assert!(page.toggle_selection("/b"));
}

#[tokio::test]
async fn test_dropped_scan_still_releases_controls() {
    let backend = Arc::new(GatedBackend::new());
    let page = ProjectCleanser::init(backend.clone(), Arc::new(Metrics::new()));

    let scan = tokio::spawn({
        let page = page.clone();
        async move { page.scan("/", ProjectType::Any).await }
    });
    backend.wait_until_called().await;
    scan.abort();
    let _ = scan.await;

    let state = page.snapshot();
    assert!(state.controls.scan_enabled);
    assert!(state.controls.reset_enabled);
    assert_eq!(state.scan_phase, ScanPhase::Idle);
}

fn rows_strategy() -> impl Strategy<Value = Vec<RowRecord>> {
    prop::collection::vec(0u64..(1 << 40), 0..12).prop_map(|sizes| {
        sizes
            .into_iter()
            .enumerate()
            .map(|(i, bytes)| row(&format!("/p/{}", i), bytes))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_select_all_tracks_selection(rows in rows_strategy(), toggles in prop::collection::vec(0usize..12, 0..30)) {
        let mut state = CleanserState::default();
        state.replace_rows(rows);

        for index in toggles {
            if let Some(path) = state.rows.get(index).map(|r| r.path.clone()) {
                if !state.selected.remove(&path) {
                    state.selected.insert(path);
                }
                state.recompute_selection();
            }

            let count = state.selected.len();
            prop_assert_eq!(
                state.controls.select_all_checked,
                count > 0 && count == state.rows.len()
            );
            prop_assert_eq!(state.controls.clean_enabled, count > 0);
            let expected: u64 = state
                .rows
                .iter()
                .filter(|r| state.selected.contains(&r.path))
                .map(|r| r.total_bytes)
                .sum();
            prop_assert_eq!(state.selected_bytes(), expected);
        }
    }

    #[test]
    fn prop_remove_paths_leaves_exact_difference(rows in rows_strategy(), picks in prop::collection::vec(any::<bool>(), 12)) {
        let mut state = CleanserState::default();
        state.replace_rows(rows.clone());
        let removed: std::collections::BTreeSet<String> = rows
            .iter()
            .zip(picks.iter())
            .filter(|(_, pick)| **pick)
            .map(|(r, _)| r.path.clone())
            .collect();

        state.remove_paths(&removed);

        let expected: Vec<RowRecord> = rows.into_iter().filter(|r| !removed.contains(&r.path)).collect();
        prop_assert_eq!(state.rows, expected);
    }
}
