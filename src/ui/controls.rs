/// Scenario trigger buttons.
///
/// One button per simulation scenario. Each click dispatches a simulate
/// request built from the session's scenario defaults; the request runs
/// on the runtime, so a slow backend never stalls the frame.

use crate::models::SimType;
use crate::ui::controller::DashController;
use eframe::egui;

pub fn render_controls(ui: &mut egui::Ui, controller: &DashController) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new("Scenarios:").strong());
        for kind in SimType::ALL {
            if ui.button(kind.to_string()).clicked() {
                controller.trigger_scenario(kind);
            }
        }
    });
}
