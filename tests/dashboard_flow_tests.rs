//! End-to-end event flow tests over a scripted backend.
//!
//! Drives the controller the way the frame loop does and asserts on the
//! events that come out of the channel: poller sequencing, scenario
//! triggers built from session defaults, the epoch-tagged thresholds
//! fetch, and the dual-domain save where the server write fails but the
//! local commit still lands.

use abusewatch::api::ApiBackend;
use abusewatch::config::AppConfig;
use abusewatch::error::ApiError;
use abusewatch::models::{
    BlocklistEntry, DefenseThresholds, MetricsSnapshot, ScenarioDefaults, SimType,
    SimulateRequest, StatusReply,
};
use abusewatch::ui::controller::{DashController, DashEvent};
use abusewatch::ui::reconciler::{SaveOutcome, ScenarioField, SettingsReconciler};
use futures::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Default)]
struct ScriptState {
    stats_calls: AtomicU64,
    simulate_requests: Mutex<Vec<SimulateRequest>>,
    saved_thresholds: Mutex<Vec<DefenseThresholds>>,
    fail_simulate: AtomicBool,
    fail_save: AtomicBool,
}

/// Backend whose responses are driven by the test.
#[derive(Clone, Default)]
struct ScriptedBackend {
    state: Arc<ScriptState>,
}

impl ScriptedBackend {
    fn new() -> Self {
        Self::default()
    }
}

impl ApiBackend for ScriptedBackend {
    fn get_stats(&self) -> BoxFuture<'static, Result<MetricsSnapshot, ApiError>> {
        let state = self.state.clone();
        Box::pin(async move {
            let call = state.stats_calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(MetricsSnapshot {
                labels: vec![1_700_000_000],
                attempts: vec![call],
                failures: vec![0],
                suspicions: vec![0],
                blocks: vec![0],
                recent: Vec::new(),
            })
        })
    }

    fn get_blocklist(&self) -> BoxFuture<'static, Result<Vec<BlocklistEntry>, ApiError>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn get_defense_thresholds(&self) -> BoxFuture<'static, Result<DefenseThresholds, ApiError>> {
        Box::pin(async move {
            Ok(DefenseThresholds {
                brute_threshold: 8,
                ..DefenseThresholds::default()
            })
        })
    }

    fn set_defense_thresholds(
        &self,
        thresholds: DefenseThresholds,
    ) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        let state = self.state.clone();
        Box::pin(async move {
            if state.fail_save.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    code: 500,
                    body: "write rejected".to_string(),
                });
            }
            state.saved_thresholds.lock().unwrap().push(thresholds);
            Ok(StatusReply {
                status: "ok".to_string(),
            })
        })
    }

    fn simulate(
        &self,
        request: SimulateRequest,
    ) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        let state = self.state.clone();
        Box::pin(async move {
            if state.fail_simulate.load(Ordering::SeqCst) {
                return Err(ApiError::Transport("connection refused".to_string()));
            }
            state.simulate_requests.lock().unwrap().push(request);
            Ok(StatusReply {
                status: "started".to_string(),
            })
        })
    }

    fn reset(&self) -> BoxFuture<'static, Result<StatusReply, ApiError>> {
        Box::pin(async move {
            Ok(StatusReply {
                status: "reset".to_string(),
            })
        })
    }
}

fn test_config() -> AppConfig {
    AppConfig {
        base_url: "http://scripted".to_string(),
        stats_poll_ms: 1000,
        blocklist_poll_ms: 1000,
        request_timeout_ms: 5000,
    }
}

async fn next_event(rx: &mut mpsc::Receiver<DashEvent>) -> DashEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test(start_paused = true)]
async fn test_pollers_publish_strictly_increasing_sequences() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    let mut controller = DashController::new(Arc::new(backend), test_config(), tx);
    controller.start_pollers();

    let mut snapshot_seqs = Vec::new();
    // First ticks fire immediately; advancing covers two more intervals.
    tokio::time::advance(Duration::from_millis(2100)).await;
    while snapshot_seqs.len() < 3 {
        if let DashEvent::Snapshot(seq, _) = next_event(&mut rx).await {
            snapshot_seqs.push(seq);
        }
    }

    assert!(
        snapshot_seqs.windows(2).all(|w| w[0] < w[1]),
        "snapshot sequences must be strictly increasing: {:?}",
        snapshot_seqs
    );

    controller.stop_pollers();
}

#[tokio::test(start_paused = true)]
async fn test_no_snapshot_events_after_stop() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    let mut controller = DashController::new(Arc::new(backend), test_config(), tx);
    controller.start_pollers();

    tokio::time::advance(Duration::from_millis(10)).await;
    // Drain whatever the first ticks produced.
    while rx.try_recv().is_ok() {}

    controller.stop_pollers();
    tokio::time::advance(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;

    assert!(rx.try_recv().is_err(), "stopped pollers must stay silent");
}

#[tokio::test(start_paused = true)]
async fn test_scenario_trigger_uses_committed_session_defaults() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    let state = backend.state.clone();
    let controller = DashController::new(Arc::new(backend), test_config(), tx);

    let mut custom = ScenarioDefaults::default();
    custom.get_mut(SimType::Bruteforce).workers = 12;
    custom.get_mut(SimType::Bruteforce).iterations = 99;
    controller.commit_scenario_defaults(custom).unwrap();

    controller.trigger_scenario(SimType::Bruteforce);
    match next_event(&mut rx).await {
        DashEvent::ScenarioStarted(kind) => assert_eq!(kind, SimType::Bruteforce),
        other => panic!("expected ScenarioStarted, got {:?}", other),
    }

    let requests = state.simulate_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sim_type, SimType::Bruteforce);
    assert_eq!(requests[0].workers, 12);
    assert_eq!(requests[0].iterations, 99);
}

#[tokio::test(start_paused = true)]
async fn test_scenario_failure_reports_kind_and_error() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    backend.state.fail_simulate.store(true, Ordering::SeqCst);
    let controller = DashController::new(Arc::new(backend), test_config(), tx);

    controller.trigger_scenario(SimType::Geohop);
    match next_event(&mut rx).await {
        DashEvent::ScenarioFailed(kind, err) => {
            assert_eq!(kind, SimType::Geohop);
            assert!(matches!(err, ApiError::Transport(_)));
        }
        other => panic!("expected ScenarioFailed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_thresholds_fetch_carries_open_token() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    let controller = DashController::new(Arc::new(backend), test_config(), tx);

    controller.fetch_defense_thresholds(7);
    match next_event(&mut rx).await {
        DashEvent::DefenseLoaded(token, Ok(thresholds)) => {
            assert_eq!(token, 7);
            assert_eq!(thresholds.brute_threshold, 8);
        }
        other => panic!("expected DefenseLoaded, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_reset_completes_with_success() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    let controller = DashController::new(Arc::new(backend), test_config(), tx);

    controller.trigger_reset();
    match next_event(&mut rx).await {
        DashEvent::ResetComplete(result) => assert!(result.is_ok()),
        other => panic!("expected ResetComplete, got {:?}", other),
    }
}

/// Full settings save where the server-side write fails but the local
/// scenario commit succeeds: the panel closes, the session defaults
/// change, and the write failure comes back as a `DefenseSaved` error
/// for the next panel open to display.
#[tokio::test(start_paused = true)]
async fn test_partial_save_commits_scenarios_despite_write_failure() {
    let (tx, mut rx) = mpsc::channel(64);
    let backend = ScriptedBackend::new();
    backend.state.fail_save.store(true, Ordering::SeqCst);
    let controller = DashController::new(Arc::new(backend), test_config(), tx);

    let mut reconciler = SettingsReconciler::default();
    let session = controller.scenario_defaults_snapshot().unwrap();
    let token = reconciler.open(&session);

    controller.fetch_defense_thresholds(token);
    if let DashEvent::DefenseLoaded(token, result) = next_event(&mut rx).await {
        assert!(reconciler.apply_defense_fetch(token, result));
    } else {
        panic!("expected DefenseLoaded first");
    }

    reconciler.edit_scenario(SimType::Credstuff, ScenarioField::Workers, "8");

    let outcome =
        reconciler.save_all(|scenarios| controller.commit_scenario_defaults(scenarios));
    let defense = match outcome {
        SaveOutcome::Committed { defense } => defense,
        other => panic!("expected committed outcome, got {:?}", other),
    };
    assert!(!reconciler.is_open(), "panel closes on local commit success");
    assert_eq!(
        controller
            .scenario_defaults_snapshot()
            .unwrap()
            .get(SimType::Credstuff)
            .workers,
        8
    );

    controller.save_defense_thresholds(defense);
    match next_event(&mut rx).await {
        DashEvent::DefenseSaved(Err(ApiError::Status { code, .. })) => assert_eq!(code, 500),
        other => panic!("expected failed DefenseSaved, got {:?}", other),
    }
}
