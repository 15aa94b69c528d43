/// Settings panel rendering.
///
/// Text-buffer backed form over the `SettingsReconciler` draft. Each edit
/// box owns a String buffer; changed buffers are pushed through the
/// reconciler's coercion on every frame the text differs, so the draft
/// always holds the coerced numeric value while the buffer keeps whatever
/// the user typed.

use crate::models::SimType;
use crate::ui::reconciler::{DefenseField, ScenarioField, SettingsDraft, SettingsReconciler};
use eframe::egui;

/// Outcome of a settings frame that the app has to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsAction {
    None,
    Save,
}

/// Text buffers for one scenario's parameter row.
#[derive(Debug, Clone, Default)]
pub struct ScenarioBuffers {
    pub delay: String,
    pub iterations: String,
    pub failure_rate: String,
    pub workers: String,
}

/// String buffers backing the settings panel text edits.
#[derive(Debug, Clone, Default)]
pub struct SettingsUIState {
    pub brute_threshold: String,
    pub brute_window: String,
    pub geohop_threshold: String,
    pub cred_threshold: String,
    pub cred_window: String,
    /// One buffer set per scenario, aligned with `SimType::ALL`.
    pub scenarios: [ScenarioBuffers; 4],
}

impl SettingsUIState {
    /// Reload every buffer from the current draft. Panel open only: a
    /// later thresholds fetch must not clobber scenario text the user is
    /// in the middle of typing.
    pub fn load_from_draft(&mut self, draft: &SettingsDraft) {
        self.load_defense_from_draft(draft);
        for (i, kind) in SimType::ALL.iter().enumerate() {
            let params = draft.scenarios.get(*kind);
            self.scenarios[i] = ScenarioBuffers {
                delay: params.delay.to_string(),
                iterations: params.iterations.to_string(),
                failure_rate: params.failure_rate.to_string(),
                workers: params.workers.to_string(),
            };
        }
    }

    /// Reload only the five defense buffers, for when the epoch-tagged
    /// thresholds fetch lands while the panel is already open.
    pub fn load_defense_from_draft(&mut self, draft: &SettingsDraft) {
        self.brute_threshold = draft.defense.brute_threshold.to_string();
        self.brute_window = draft.defense.brute_window.to_string();
        self.geohop_threshold = draft.defense.geohop_threshold.to_string();
        self.cred_threshold = draft.defense.cred_threshold.to_string();
        self.cred_window = draft.defense.cred_window.to_string();
    }
}

fn defense_row(
    ui: &mut egui::Ui,
    label: &str,
    buffer: &mut String,
    field: DefenseField,
    reconciler: &mut SettingsReconciler,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        let response = ui.add(egui::TextEdit::singleline(buffer).desired_width(80.0));
        if response.changed() {
            reconciler.edit_defense(field, buffer);
        }
    });
}

fn scenario_row(
    ui: &mut egui::Ui,
    kind: SimType,
    buffers: &mut ScenarioBuffers,
    reconciler: &mut SettingsReconciler,
) {
    ui.label(egui::RichText::new(kind.to_string()).strong());
    egui::Grid::new(format!("scenario_grid_{}", kind.wire_name()))
        .num_columns(4)
        .show(ui, |ui| {
            ui.label("Delay (s)");
            if ui
                .add(egui::TextEdit::singleline(&mut buffers.delay).desired_width(60.0))
                .changed()
            {
                reconciler.edit_scenario(kind, ScenarioField::Delay, &buffers.delay);
            }
            ui.label("Iterations");
            if ui
                .add(egui::TextEdit::singleline(&mut buffers.iterations).desired_width(60.0))
                .changed()
            {
                reconciler.edit_scenario(kind, ScenarioField::Iterations, &buffers.iterations);
            }
            ui.end_row();
            ui.label("Failure rate");
            if ui
                .add(egui::TextEdit::singleline(&mut buffers.failure_rate).desired_width(60.0))
                .changed()
            {
                reconciler.edit_scenario(kind, ScenarioField::FailureRate, &buffers.failure_rate);
            }
            ui.label("Workers");
            if ui
                .add(egui::TextEdit::singleline(&mut buffers.workers).desired_width(60.0))
                .changed()
            {
                reconciler.edit_scenario(kind, ScenarioField::Workers, &buffers.workers);
            }
            ui.end_row();
        });
}

/// Render the settings window when the panel is open.
///
/// Cancel, the close button and a click outside the window all dismiss
/// without committing. Save is returned to the caller, which owns the
/// dual-domain save dispatch.
pub fn render_settings(
    ctx: &egui::Context,
    state: &mut SettingsUIState,
    reconciler: &mut SettingsReconciler,
) -> SettingsAction {
    if !reconciler.is_open() {
        return SettingsAction::None;
    }

    let mut action = SettingsAction::None;
    let mut window_open = true;
    let mut cancel_clicked = false;

    let response = egui::Window::new("Settings")
        .open(&mut window_open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(egui::RichText::new("Defense thresholds").strong());
            if let Some(err) = reconciler.defense_error() {
                ui.colored_label(egui::Color32::from_rgb(255, 100, 100), err.to_string());
            }
            defense_row(
                ui,
                "Brute-force threshold",
                &mut state.brute_threshold,
                DefenseField::BruteThreshold,
                reconciler,
            );
            defense_row(
                ui,
                "Brute-force window (s)",
                &mut state.brute_window,
                DefenseField::BruteWindow,
                reconciler,
            );
            defense_row(
                ui,
                "Geo-hop threshold",
                &mut state.geohop_threshold,
                DefenseField::GeohopThreshold,
                reconciler,
            );
            defense_row(
                ui,
                "Cred-stuffing threshold",
                &mut state.cred_threshold,
                DefenseField::CredThreshold,
                reconciler,
            );
            defense_row(
                ui,
                "Cred-stuffing window (s)",
                &mut state.cred_window,
                DefenseField::CredWindow,
                reconciler,
            );

            ui.separator();
            ui.label(egui::RichText::new("Scenario defaults").strong());
            if let Some(err) = reconciler.scenario_error() {
                ui.colored_label(egui::Color32::from_rgb(255, 100, 100), err.to_string());
            }
            for (i, kind) in SimType::ALL.iter().enumerate() {
                scenario_row(ui, *kind, &mut state.scenarios[i], reconciler);
            }

            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    action = SettingsAction::Save;
                }
                if ui.button("Cancel").clicked() {
                    cancel_clicked = true;
                }
            });
        });

    // Dismiss on the window's close button, the Cancel button, or a click
    // anywhere outside the window.
    let clicked_outside = response
        .map(|r| r.response.clicked_elsewhere())
        .unwrap_or(false);
    if (!window_open || cancel_clicked || clicked_outside) && action == SettingsAction::None {
        reconciler.cancel();
    }

    action
}
