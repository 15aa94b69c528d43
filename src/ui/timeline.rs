//! Timeline Renderer
//!
//! Owns one persistent `TrafficChart` for the lifetime of the view. New
//! snapshots mutate the chart's label and series buffers in place and
//! request a single redraw with a short transition; the chart object is
//! never recreated per tick (a full rebuild would flicker). Teardown
//! unsubscribes from snapshot publication first and then releases the
//! chart exactly once, so data mutation after teardown cannot happen.

use crate::models::MetricsSnapshot;
use eframe::egui;
use std::time::Duration;

/// Redraw transition length, matching the chart's visual update cadence.
pub const REDRAW_TRANSITION: Duration = Duration::from_millis(300);

const SERIES_COLORS: [egui::Color32; 4] = [
    egui::Color32::from_rgb(0x88, 0x88, 0x88), // attempts
    egui::Color32::from_rgb(0xe7, 0x4c, 0x3c), // failures
    egui::Color32::from_rgb(0xf1, 0xc4, 0x0f), // suspicions
    egui::Color32::from_rgb(0x34, 0x98, 0xdb), // blocks
];

const SERIES_NAMES: [&str; 4] = ["Attempts", "Failures", "Suspicions", "Blocks"];

/// The mutable chart object: label buffer plus four index-aligned series
/// buffers. Created once, mutated in place, destroyed once.
pub struct TrafficChart {
    labels: Vec<i64>,
    attempts: Vec<u64>,
    failures: Vec<u64>,
    suspicions: Vec<u64>,
    blocks: Vec<u64>,
    pending_transition: Option<Duration>,
    destroyed: bool,
}

impl TrafficChart {
    /// Create the chart, seeded with whatever snapshot is available at
    /// construction time (possibly the empty default).
    pub fn new(seed: &MetricsSnapshot) -> Self {
        let mut chart = Self {
            labels: Vec::new(),
            attempts: Vec::new(),
            failures: Vec::new(),
            suspicions: Vec::new(),
            blocks: Vec::new(),
            pending_transition: None,
            destroyed: false,
        };
        chart.set_data(seed);
        chart
    }

    /// Replace the buffered data in place, reusing allocations.
    pub fn set_data(&mut self, snapshot: &MetricsSnapshot) {
        debug_assert!(!self.destroyed, "set_data on destroyed chart");
        self.labels.clear();
        self.labels.extend_from_slice(&snapshot.labels);
        self.attempts.clear();
        self.attempts.extend_from_slice(&snapshot.attempts);
        self.failures.clear();
        self.failures.extend_from_slice(&snapshot.failures);
        self.suspicions.clear();
        self.suspicions.extend_from_slice(&snapshot.suspicions);
        self.blocks.clear();
        self.blocks.extend_from_slice(&snapshot.blocks);
    }

    /// Queue one redraw with the given transition; consumed by the next
    /// paint pass.
    pub fn request_redraw(&mut self, transition: Duration) {
        self.pending_transition = Some(transition);
    }

    pub fn take_redraw(&mut self) -> Option<Duration> {
        self.pending_transition.take()
    }

    /// Release the chart. Idempotence is not expected of callers; the
    /// renderer guarantees a single call.
    pub fn destroy(&mut self) {
        debug_assert!(!self.destroyed, "chart destroyed twice");
        self.destroyed = true;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Number of sample points that can be drawn: the shortest buffer wins
    /// so an inconsistent backend degrades instead of panicking.
    pub fn point_count(&self) -> usize {
        self.labels
            .len()
            .min(self.attempts.len())
            .min(self.failures.len())
            .min(self.suspicions.len())
            .min(self.blocks.len())
    }

    pub fn label_capacity(&self) -> usize {
        self.labels.capacity()
    }

    /// Paint the chart with the egui painter.
    pub fn paint(&self, ui: &mut egui::Ui) {
        let height = 220.0;
        let (response, painter) = ui.allocate_painter(
            egui::Vec2::new(ui.available_width(), height),
            egui::Sense::hover(),
        );
        let rect = response.rect.shrink(8.0);

        painter.rect_filled(response.rect, 4.0, egui::Color32::from_gray(24));

        let n = self.point_count();
        if n < 2 {
            painter.text(
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "(Waiting for data)",
                egui::FontId::proportional(13.0),
                egui::Color32::from_gray(120),
            );
            return;
        }

        let series: [&Vec<u64>; 4] = [&self.attempts, &self.failures, &self.suspicions, &self.blocks];
        let y_max = series
            .iter()
            .flat_map(|s| s[..n].iter())
            .copied()
            .max()
            .unwrap_or(0)
            .max(1) as f32;

        let x_step = rect.width() / (n - 1) as f32;
        for (values, color) in series.iter().zip(SERIES_COLORS) {
            let points: Vec<egui::Pos2> = values[..n]
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    egui::pos2(
                        rect.min.x + i as f32 * x_step,
                        rect.max.y - (v as f32 / y_max) * rect.height(),
                    )
                })
                .collect();
            for segment in points.windows(2) {
                painter.line_segment(
                    [segment[0], segment[1]],
                    egui::Stroke::new(1.5, color),
                );
            }
        }

        // First and last bucket timestamps as x-axis anchors.
        if let (Some(&first), Some(&last)) = (self.labels.first(), self.labels.get(n - 1)) {
            painter.text(
                egui::pos2(rect.min.x, rect.max.y + 2.0),
                egui::Align2::LEFT_TOP,
                format_bucket_time(first),
                egui::FontId::monospace(10.0),
                egui::Color32::from_gray(140),
            );
            painter.text(
                egui::pos2(rect.max.x, rect.max.y + 2.0),
                egui::Align2::RIGHT_TOP,
                format_bucket_time(last),
                egui::FontId::monospace(10.0),
                egui::Color32::from_gray(140),
            );
        }
    }
}

/// Format an epoch-seconds bucket label as local HH:MM:SS.
pub fn format_bucket_time(epoch_secs: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_opt(epoch_secs, 0) {
        chrono::LocalResult::Single(dt) => dt.format("%H:%M:%S").to_string(),
        _ => epoch_secs.to_string(),
    }
}

/// Binds the chart to snapshot publication. The chart exists from
/// construction until `teardown`; the subscription flag is cleared before
/// the chart is released.
pub struct TimelineRenderer {
    chart: Option<TrafficChart>,
    subscribed: bool,
}

impl TimelineRenderer {
    pub fn new(seed: &MetricsSnapshot) -> Self {
        Self {
            chart: Some(TrafficChart::new(seed)),
            subscribed: true,
        }
    }

    /// Apply one published snapshot: in-place dataset mutation plus one
    /// redraw request. No-op once unsubscribed.
    pub fn on_snapshot(&mut self, snapshot: &MetricsSnapshot) {
        if !self.subscribed {
            return;
        }
        if let Some(chart) = self.chart.as_mut() {
            chart.set_data(snapshot);
            chart.request_redraw(REDRAW_TRANSITION);
        }
    }

    /// Unsubscribe, then release the chart exactly once.
    pub fn teardown(&mut self) {
        self.subscribed = false;
        if let Some(mut chart) = self.chart.take() {
            chart.destroy();
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    pub fn chart(&self) -> Option<&TrafficChart> {
        self.chart.as_ref()
    }

    /// Render pass: paint and consume any pending redraw request, keeping
    /// the repaint window open for the transition length.
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading("Live Login Traffic");
        ui.horizontal(|ui| {
            for (name, color) in SERIES_NAMES.iter().zip(SERIES_COLORS) {
                ui.colored_label(color, *name);
            }
        });
        if let Some(chart) = self.chart.as_mut() {
            chart.paint(ui);
            if let Some(transition) = chart.take_redraw() {
                ui.ctx().request_repaint_after(transition);
            }
        }
    }
}

impl Drop for TimelineRenderer {
    fn drop(&mut self) {
        if self.chart.is_some() {
            self.teardown();
        }
    }
}
