/// Recent-activity and blocklist feeds.
///
/// The recent feed shows at most the first twenty attempts in the order
/// received; the backend already sends most-recent-first. Highlight
/// precedence when both flags are set: blocked wins over suspicious.

use crate::models::{AttemptEvent, AttemptResult, BlocklistEntry};
use chrono::TimeZone;
use eframe::egui;

const RECENT_FEED_LIMIT: usize = 20;

const COLOR_BLOCKED: egui::Color32 = egui::Color32::from_rgb(153, 102, 255);
const COLOR_SUSPICIOUS: egui::Color32 = egui::Color32::from_rgb(255, 206, 86);
const COLOR_FAILURE: egui::Color32 = egui::Color32::from_rgb(255, 99, 132);
const COLOR_SUCCESS: egui::Color32 = egui::Color32::from_rgb(100, 255, 100);

/// Highlight color for one attempt row, if any.
fn row_marker(event: &AttemptEvent) -> Option<(egui::Color32, &'static str)> {
    if event.is_blocked {
        Some((COLOR_BLOCKED, "BLOCKED"))
    } else if event.is_suspicious {
        Some((COLOR_SUSPICIOUS, "SUSPICIOUS"))
    } else {
        None
    }
}

/// The slice of events the feed displays: the first twenty, received
/// order preserved.
fn feed_window(recent: &[AttemptEvent]) -> &[AttemptEvent] {
    &recent[..recent.len().min(RECENT_FEED_LIMIT)]
}

fn format_event_time(timestamp: i64) -> String {
    match chrono::Local.timestamp_opt(timestamp, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => timestamp.to_string(),
    }
}

pub fn render_recent_feed(ui: &mut egui::Ui, recent: &[AttemptEvent]) {
    ui.label(egui::RichText::new("Recent Activity").strong());
    egui::ScrollArea::vertical()
        .id_source("recent_feed")
        .max_height(220.0)
        .show(ui, |ui| {
            if recent.is_empty() {
                ui.label(egui::RichText::new("No attempts yet").weak());
                return;
            }
            for event in feed_window(recent) {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new(format_event_time(event.timestamp))
                            .monospace()
                            .weak(),
                    );
                    ui.label(format!("{} ({})", event.ip, event.geo));
                    ui.label(egui::RichText::new(&event.user).weak());
                    ui.label(egui::RichText::new(format!("[{}]", event.sim_type)).small());
                    let result_color = match event.result {
                        AttemptResult::Success => COLOR_SUCCESS,
                        AttemptResult::Failure => COLOR_FAILURE,
                    };
                    ui.colored_label(result_color, format!("{:?}", event.result));
                    if let Some((color, tag)) = row_marker(event) {
                        ui.colored_label(color, tag);
                    }
                });
            }
        });
}

pub fn render_blocklist_feed(ui: &mut egui::Ui, blocklist: &[BlocklistEntry]) {
    ui.label(egui::RichText::new("Blocklist").strong());
    egui::ScrollArea::vertical()
        .id_source("blocklist_feed")
        .max_height(220.0)
        .show(ui, |ui| {
            if blocklist.is_empty() {
                ui.label(egui::RichText::new("Nothing blocked").weak());
                return;
            }
            for entry in blocklist {
                ui.horizontal(|ui| {
                    ui.colored_label(COLOR_BLOCKED, entry.kind.to_string());
                    ui.label(egui::RichText::new(&entry.value).monospace());
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SimType;

    fn event(blocked: bool, suspicious: bool) -> AttemptEvent {
        AttemptEvent {
            timestamp: 1_700_000_000,
            ip: "10.0.0.1".to_string(),
            geo: "US".to_string(),
            user: "alice".to_string(),
            sim_type: SimType::Normal,
            result: AttemptResult::Failure,
            is_suspicious: suspicious,
            is_blocked: blocked,
        }
    }

    #[test]
    fn test_blocked_marker_wins_over_suspicious() {
        let both = event(true, true);
        let (_, tag) = row_marker(&both).unwrap();
        assert_eq!(tag, "BLOCKED");
    }

    #[test]
    fn test_suspicious_marker_when_not_blocked() {
        let sus = event(false, true);
        let (_, tag) = row_marker(&sus).unwrap();
        assert_eq!(tag, "SUSPICIOUS");
    }

    #[test]
    fn test_plain_row_has_no_marker() {
        assert!(row_marker(&event(false, false)).is_none());
    }

    #[test]
    fn test_feed_window_keeps_first_twenty_in_received_order() {
        // Most-recent-first wire order: index 0 is the newest attempt.
        let recent: Vec<AttemptEvent> = (0..25)
            .map(|i| AttemptEvent {
                ip: format!("10.0.0.{}", i),
                ..event(false, false)
            })
            .collect();

        let window = feed_window(&recent);
        assert_eq!(window.len(), RECENT_FEED_LIMIT);
        assert_eq!(window[0].ip, "10.0.0.0", "newest attempt stays first");
        assert_eq!(window[19].ip, "10.0.0.19");
        assert!(
            !window.iter().any(|e| e.ip == "10.0.0.24"),
            "overflow drops the oldest entries, never the newest"
        );
    }

    #[test]
    fn test_feed_window_passes_short_input_through() {
        let recent: Vec<AttemptEvent> = (0..3)
            .map(|i| AttemptEvent {
                ip: format!("10.0.0.{}", i),
                ..event(false, false)
            })
            .collect();

        let window = feed_window(&recent);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].ip, "10.0.0.0");
        assert_eq!(window[2].ip, "10.0.0.2");
    }
}
