/// Summary stat cards.
///
/// Four totals summed over the snapshot's bucket series, mirroring the
/// headline numbers above the timeline. Sums are recomputed per frame
/// from the current read model; the snapshot is small enough that this
/// is cheaper than caching.

use crate::models::MetricsSnapshot;
use eframe::egui;

fn card(ui: &mut egui::Ui, title: &str, value: u64, color: egui::Color32) {
    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new(title).small());
                ui.label(egui::RichText::new(value.to_string()).size(22.0).color(color));
            });
        });
}

/// Headline totals in card order: attempts, failures, suspicious, blocked.
fn series_totals(snapshot: &MetricsSnapshot) -> [u64; 4] {
    [
        snapshot.attempts.iter().sum(),
        snapshot.failures.iter().sum(),
        snapshot.suspicions.iter().sum(),
        snapshot.blocks.iter().sum(),
    ]
}

pub fn render_cards(ui: &mut egui::Ui, snapshot: &MetricsSnapshot) {
    let [attempts, failures, suspicions, blocks] = series_totals(snapshot);

    ui.horizontal(|ui| {
        card(ui, "Attempts", attempts, egui::Color32::from_rgb(54, 162, 235));
        card(ui, "Failures", failures, egui::Color32::from_rgb(255, 99, 132));
        card(ui, "Suspicious", suspicions, egui::Color32::from_rgb(255, 206, 86));
        card(ui, "Blocked", blocks, egui::Color32::from_rgb(153, 102, 255));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_totals_sum_series() {
        let snapshot = MetricsSnapshot {
            labels: vec![0, 60, 120],
            attempts: vec![1, 2, 3],
            failures: vec![0, 1, 0],
            suspicions: vec![0, 0, 2],
            blocks: vec![1, 0, 0],
            recent: Vec::new(),
        };
        assert_eq!(series_totals(&snapshot), [6, 1, 2, 1]);
    }

    #[test]
    fn test_card_totals_of_empty_snapshot_are_zero() {
        assert_eq!(series_totals(&MetricsSnapshot::default()), [0, 0, 0, 0]);
    }
}
