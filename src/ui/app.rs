/// Main App Orchestrator and UI State Management
///
/// Central application state and the eframe::App implementation for the
/// egui frontend. Drains the dashboard event channel once per frame,
/// applies accepted values to the read model, and delegates rendering to
/// the view modules.

use crate::log_collector::LogLine;
use crate::models::{BlocklistEntry, MetricsSnapshot};
use crate::ui::controller::{DashController, DashEvent};
use crate::ui::reconciler::{SaveOutcome, SettingsReconciler};
use crate::ui::timeline::TimelineRenderer;
use eframe::egui;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

const MAX_LOG_LINES: usize = 500;

/// Transient UI state - state that doesn't persist across sessions
pub struct UIState {
    /// Dirty flag: set when data changes, cleared after render.
    /// Used for adaptive repainting instead of fixed-frequency repaints.
    pub needs_repaint: bool,

    /// Last repaint time (for idle-based fallback repaints)
    pub last_repaint_time: Instant,

    /// Current metrics read model; replaced wholesale by each accepted
    /// snapshot, never partially updated (no tearing).
    pub snapshot: MetricsSnapshot,

    /// Sequence number of the last applied snapshot
    pub last_snapshot_seq: u64,

    /// Current blocklist read model
    pub blocklist: Vec<BlocklistEntry>,

    /// Sequence number of the last applied blocklist
    pub last_blocklist_seq: u64,

    /// Settings draft state machine
    pub reconciler: SettingsReconciler,

    /// Settings panel text buffers
    pub settings_ui_state: super::settings::SettingsUIState,

    /// Rolling feed of forwarded log lines
    pub log_feed: VecDeque<LogLine>,

    /// Error message to display (if any)
    pub error_message: Option<String>,

    /// Success message to display (if any)
    pub success_message: Option<String>,

    /// Informational message (scenario trigger feedback)
    pub info_message: Option<String>,
}

impl Default for UIState {
    fn default() -> Self {
        Self {
            needs_repaint: true,
            last_repaint_time: Instant::now(),
            snapshot: MetricsSnapshot::default(),
            last_snapshot_seq: 0,
            blocklist: Vec::new(),
            last_blocklist_seq: 0,
            reconciler: SettingsReconciler::default(),
            settings_ui_state: super::settings::SettingsUIState::default(),
            log_feed: VecDeque::with_capacity(MAX_LOG_LINES),
            error_message: None,
            success_message: None,
            info_message: None,
        }
    }
}

/// Main Application UI Structure
pub struct AppUI {
    /// Persistent application state (session defaults, pollers, backend)
    pub controller: Arc<RwLock<DashController>>,

    /// Transient UI state
    pub ui_state: UIState,

    /// Timeline renderer owning the persistent chart object
    pub timeline: TimelineRenderer,

    /// Channel receiver for dashboard events
    pub events_rx: Option<tokio::sync::mpsc::Receiver<DashEvent>>,
}

impl AppUI {
    /// Create a new AppUI instance. The chart is constructed exactly once
    /// here, seeded with the empty default snapshot.
    pub fn new(
        controller: Arc<RwLock<DashController>>,
        events_rx: Option<tokio::sync::mpsc::Receiver<DashEvent>>,
    ) -> Self {
        let ui_state = UIState::default();
        let timeline = TimelineRenderer::new(&ui_state.snapshot);
        Self {
            controller,
            ui_state,
            timeline,
            events_rx,
        }
    }

    /// Process all pending dashboard events from the channel.
    /// Sets the dirty flag when data changes (adaptive repaint trigger).
    fn process_events(&mut self) {
        let Some(ref mut rx) = self.events_rx else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            match event {
                DashEvent::Snapshot(seq, snapshot) => {
                    // The poller publish gate already enforces monotone
                    // sequence order; arrival order over the channel
                    // preserves it.
                    self.ui_state.last_snapshot_seq = seq;
                    self.timeline.on_snapshot(&snapshot);
                    self.ui_state.snapshot = snapshot;
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::Blocklist(seq, entries) => {
                    self.ui_state.last_blocklist_seq = seq;
                    self.ui_state.blocklist = entries;
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::DefenseLoaded(token, result) => {
                    let applied = self.ui_state.reconciler.apply_defense_fetch(token, result);
                    if applied {
                        if let Some(draft) = self.ui_state.reconciler.draft() {
                            self.ui_state
                                .settings_ui_state
                                .load_defense_from_draft(draft);
                        }
                    } else {
                        log::debug!("[UI] Dropped stale thresholds fetch (token {})", token);
                    }
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::DefenseSaved(result) => {
                    if let Err(e) = result {
                        self.ui_state
                            .reconciler
                            .record_defense_save_error(e.user_message());
                        self.ui_state.error_message =
                            Some(format!("Defense thresholds not saved: {}", e.user_message()));
                    }
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::ScenarioStarted(kind) => {
                    self.ui_state.info_message = Some(format!("{} scenario started", kind));
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::ScenarioFailed(kind, e) => {
                    self.ui_state.error_message =
                        Some(format!("{} scenario failed: {}", kind, e.user_message()));
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::ResetComplete(result) => {
                    match result {
                        Ok(()) => {
                            self.ui_state.success_message =
                                Some("Backend state reset".to_string());
                            // Immediate refresh instead of waiting out the
                            // poll interval.
                            if let Ok(mut controller) = self.controller.try_write() {
                                controller.restart_stats_poller();
                            }
                        }
                        Err(e) => {
                            self.ui_state.error_message =
                                Some(format!("Reset failed: {}", e.user_message()));
                        }
                    }
                    self.ui_state.needs_repaint = true;
                }
                DashEvent::Log(line) => {
                    self.ui_state.log_feed.push_back(line);
                    while self.ui_state.log_feed.len() > MAX_LOG_LINES {
                        self.ui_state.log_feed.pop_front();
                    }
                    self.ui_state.needs_repaint = true;
                }
            }
        }
    }

    /// Render the header: title, reset control and the settings cog.
    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("AbuseWatch");
                ui.separator();
                ui.label("Login Abuse Tracker");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("⚙ Settings").clicked() {
                        self.toggle_settings_panel();
                    }
                    if ui.button("Reset").clicked() {
                        if let Ok(controller) = self.controller.try_read() {
                            controller.trigger_reset();
                        }
                    }
                });
            });
        });
    }

    /// Open the settings panel (or close it when already open, matching
    /// the original cog toggle). Opening copies the session scenario
    /// defaults into the draft and starts the epoch-tagged thresholds
    /// fetch.
    fn toggle_settings_panel(&mut self) {
        if self.ui_state.reconciler.is_open() {
            self.ui_state.reconciler.cancel();
            return;
        }
        if let Ok(controller) = self.controller.try_read() {
            match controller.scenario_defaults_snapshot() {
                Ok(defaults) => {
                    let token = self.ui_state.reconciler.open(&defaults);
                    if let Some(draft) = self.ui_state.reconciler.draft() {
                        self.ui_state.settings_ui_state.load_from_draft(draft);
                    }
                    controller.fetch_defense_thresholds(token);
                }
                Err(e) => {
                    self.ui_state.error_message = Some(e);
                }
            }
        }
    }

    /// Save both settings domains: dispatch the server write for the
    /// defense thresholds and commit the scenario defaults into session
    /// state. The panel closes unless the local commit failed.
    fn save_settings(&mut self) {
        let Ok(controller) = self.controller.try_read() else {
            return;
        };
        let outcome = self
            .ui_state
            .reconciler
            .save_all(|scenarios| controller.commit_scenario_defaults(scenarios));
        match outcome {
            SaveOutcome::Committed { defense } => {
                controller.save_defense_thresholds(defense);
            }
            SaveOutcome::CommitFailed { defense } => {
                // Best-effort server write still happens; both errors stay
                // visible in the open panel.
                controller.save_defense_thresholds(defense);
                self.ui_state.error_message =
                    Some("Scenario defaults could not be committed".to_string());
            }
            SaveOutcome::NotOpen => {}
        }
    }

    /// Render transient messages (errors, success, info)
    fn render_messages(&mut self, ctx: &egui::Context) {
        if let Some(msg) = self.ui_state.error_message.clone() {
            egui::TopBottomPanel::top("error_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        egui::Color32::from_rgb(255, 100, 100),
                        format!("Error: {}", msg),
                    );
                    if ui.button("Dismiss").clicked() {
                        self.ui_state.error_message = None;
                    }
                });
            });
        }

        if let Some(msg) = self.ui_state.success_message.clone() {
            egui::TopBottomPanel::top("success_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::from_rgb(100, 255, 100), msg);
                    if ui.button("Dismiss").clicked() {
                        self.ui_state.success_message = None;
                    }
                });
            });
        }

        if let Some(msg) = self.ui_state.info_message.clone() {
            egui::TopBottomPanel::top("info_panel").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::from_rgb(100, 150, 255), msg);
                    if ui.button("Dismiss").clicked() {
                        self.ui_state.info_message = None;
                    }
                });
            });
        }
    }

    /// Render the central content: controls row, summary cards, timeline
    /// and the two feeds.
    fn render_content(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            if let Ok(controller) = self.controller.try_read() {
                super::controls::render_controls(ui, &controller);
            }
            ui.separator();
            super::cards::render_cards(ui, &self.ui_state.snapshot);
            ui.separator();
            self.timeline.show(ui);
            ui.separator();
            ui.columns(2, |columns| {
                super::feeds::render_recent_feed(&mut columns[0], &self.ui_state.snapshot.recent);
                super::feeds::render_blocklist_feed(&mut columns[1], &self.ui_state.blocklist);
            });
        });
    }

    fn render_settings_panel(&mut self, ctx: &egui::Context) {
        let action = super::settings::render_settings(
            ctx,
            &mut self.ui_state.settings_ui_state,
            &mut self.ui_state.reconciler,
        );
        match action {
            super::settings::SettingsAction::Save => self.save_settings(),
            super::settings::SettingsAction::None => {}
        }
    }
}

impl eframe::App for AppUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process all pending async events (sets needs_repaint on change)
        self.process_events();

        // ADAPTIVE REPAINTING: immediate repaint on data change, fallback
        // repaint on idle timeout. The pollers tick at one second, so the
        // fallback keeps the view moving even without event traffic.
        const IDLE_REPAINT_INTERVAL_MS: u64 = 500;
        let elapsed_since_last_repaint = self.ui_state.last_repaint_time.elapsed();

        if self.ui_state.needs_repaint {
            ctx.request_repaint();
            self.ui_state.needs_repaint = false;
            self.ui_state.last_repaint_time = Instant::now();
        } else if elapsed_since_last_repaint.as_millis() > IDLE_REPAINT_INTERVAL_MS as u128 {
            ctx.request_repaint_after(std::time::Duration::from_millis(IDLE_REPAINT_INTERVAL_MS));
            self.ui_state.last_repaint_time = Instant::now();
        }

        self.render_header(ctx);
        self.render_messages(ctx);
        self.render_content(ctx);
        self.render_settings_panel(ctx);
    }
}
