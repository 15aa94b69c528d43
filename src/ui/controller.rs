//! DashController: Central UI orchestrator for AbuseWatch
//!
//! Owns the backend handle, the session-resident scenario defaults, the
//! event channel the UI drains, and the lifecycle of the two pollers.
//! Every network call runs on a tokio task and reports back exclusively
//! through `DashEvent`s; the UI thread never blocks on I/O.

use crate::api::ApiBackend;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::log_collector::LogLine;
use crate::models::{
    BlocklistEntry, DefenseThresholds, MetricsSnapshot, ScenarioDefaults, SimType,
    SimulateRequest,
};
use crate::poll::Poller;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Discrete events emitted by background tasks and drained by the UI
/// update pass.
#[derive(Clone, Debug)]
pub enum DashEvent {
    /// A metrics snapshot accepted by the stats poller (tick sequence, value).
    Snapshot(u64, MetricsSnapshot),
    /// A blocklist accepted by the blocklist poller.
    Blocklist(u64, Vec<BlocklistEntry>),
    /// Result of the thresholds fetch started by a settings `open()`;
    /// the token ties it to that open's epoch.
    DefenseLoaded(u64, Result<DefenseThresholds, ApiError>),
    /// Result of the best-effort defense thresholds write.
    DefenseSaved(Result<(), ApiError>),
    ScenarioStarted(SimType),
    ScenarioFailed(SimType, ApiError),
    ResetComplete(Result<(), ApiError>),
    /// A log line forwarded from the log collector.
    Log(LogLine),
}

/// Central state manager for the dashboard.
pub struct DashController {
    /// Backend abstraction (scripted in tests).
    pub api: Arc<dyn ApiBackend>,
    /// Session-resident scenario generation defaults. Mutated only by a
    /// completed settings save; read by scenario triggers and panel open.
    pub scenario_defaults: Arc<std::sync::RwLock<ScenarioDefaults>>,
    /// Channel for dashboard events.
    pub events_tx: mpsc::Sender<DashEvent>,
    config: AppConfig,
    stats_poller: Option<Poller>,
    blocklist_poller: Option<Poller>,
}

impl DashController {
    pub fn new(
        api: Arc<dyn ApiBackend>,
        config: AppConfig,
        events_tx: mpsc::Sender<DashEvent>,
    ) -> Self {
        Self {
            api,
            scenario_defaults: Arc::new(std::sync::RwLock::new(ScenarioDefaults::default())),
            events_tx,
            config,
            stats_poller: None,
            blocklist_poller: None,
        }
    }

    /// Start (or restart) both pollers: metrics and blocklist, each on its
    /// own independent cadence.
    pub fn start_pollers(&mut self) {
        self.stop_pollers();
        self.stats_poller = Some(self.spawn_stats_poller());
        self.blocklist_poller = Some(self.spawn_blocklist_poller());
    }

    /// Stop both pollers. After this returns no snapshot or blocklist
    /// event will be published, even for reads still in flight.
    pub fn stop_pollers(&mut self) {
        if let Some(mut poller) = self.stats_poller.take() {
            poller.stop();
        }
        if let Some(mut poller) = self.blocklist_poller.take() {
            poller.stop();
        }
    }

    /// Restart only the metrics poller; its first tick fetches
    /// immediately. Used after a reset to refresh without waiting out the
    /// interval.
    pub fn restart_stats_poller(&mut self) {
        if let Some(mut poller) = self.stats_poller.take() {
            poller.stop();
        }
        self.stats_poller = Some(self.spawn_stats_poller());
    }

    fn spawn_stats_poller(&self) -> Poller {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        Poller::start(
            "stats",
            self.config.stats_poll_interval(),
            move || api.get_stats(),
            move |seq, snapshot| {
                let _ = tx.try_send(DashEvent::Snapshot(seq, snapshot));
            },
        )
    }

    fn spawn_blocklist_poller(&self) -> Poller {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        Poller::start(
            "blocklist",
            self.config.blocklist_poll_interval(),
            move || api.get_blocklist(),
            move |seq, entries| {
                let _ = tx.try_send(DashEvent::Blocklist(seq, entries));
            },
        )
    }

    /// Read-copy of the session scenario defaults (panel open, triggers).
    pub fn scenario_defaults_snapshot(&self) -> Result<ScenarioDefaults, String> {
        self.scenario_defaults
            .read()
            .map(|defaults| *defaults)
            .map_err(|e| format!("Failed to read scenario defaults: {}", e))
    }

    /// Install saved scenario defaults into session state. Local and
    /// normally infallible; a poisoned lock is the exceptional case the
    /// save flow treats as a scenario commit failure.
    pub fn commit_scenario_defaults(&self, defaults: ScenarioDefaults) -> Result<(), String> {
        self.scenario_defaults
            .write()
            .map(|mut session| *session = defaults)
            .map_err(|e| format!("Failed to commit scenario defaults: {}", e))
    }

    /// Start the thresholds fetch for a settings panel open; the result
    /// comes back as `DefenseLoaded` carrying the open-epoch token.
    pub fn fetch_defense_thresholds(&self, token: u64) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.get_defense_thresholds().await;
            let _ = tx.send(DashEvent::DefenseLoaded(token, result)).await;
        });
    }

    /// Dispatch the best-effort defense thresholds write.
    pub fn save_defense_thresholds(&self, thresholds: DefenseThresholds) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.set_defense_thresholds(thresholds).await.map(|_| ());
            if let Err(ref e) = result {
                log::warn!("[Settings] Defense thresholds write failed: {}", e);
            }
            let _ = tx.send(DashEvent::DefenseSaved(result)).await;
        });
    }

    /// Trigger a synthetic traffic scenario with the session defaults for
    /// its kind.
    pub fn trigger_scenario(&self, kind: SimType) {
        let defaults = match self.scenario_defaults_snapshot() {
            Ok(defaults) => defaults,
            Err(e) => {
                log::error!("[Scenario] {}", e);
                return;
            }
        };
        let request = SimulateRequest::from_defaults(kind, &defaults);
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let event = match api.simulate(request).await {
                Ok(_) => DashEvent::ScenarioStarted(kind),
                Err(e) => {
                    log::warn!("[Scenario] {} trigger failed: {}", kind, e);
                    DashEvent::ScenarioFailed(kind, e)
                }
            };
            let _ = tx.send(event).await;
        });
    }

    /// Reset all backend state. On success the UI restarts the stats
    /// poller for an immediate refresh.
    pub fn trigger_reset(&self) {
        let api = self.api.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let result = api.reset().await.map(|_| ());
            if let Err(ref e) = result {
                log::warn!("[Reset] Failed: {}", e);
            }
            let _ = tx.send(DashEvent::ResetComplete(result)).await;
        });
    }
}

impl Drop for DashController {
    fn drop(&mut self) {
        self.stop_pollers();
    }
}
