//! Decoupled logging pipeline for the dashboard.
//!
//! Bridges the `log` crate facade to two sinks: stderr (always written) and
//! a non-blocking UI channel the event loop drains into the on-screen log
//! feed. A congested UI channel never blocks or loses the stderr copy.

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

/// A log line with metadata for UI display.
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    /// Wall-clock timestamp, HH:MM:SS.mmm.
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }
}

/// Logger that mirrors every record to stderr and forwards it to the UI.
pub struct LogCollector {
    ui_tx: tokio::sync::mpsc::Sender<LogLine>,
    max_level: LevelFilter,
}

impl LogCollector {
    pub fn new(ui_tx: tokio::sync::mpsc::Sender<LogLine>, max_level: LevelFilter) -> Self {
        Self { ui_tx, max_level }
    }

    /// Register this collector as the global logger for the `log` crate.
    pub fn install(self) -> Result<(), log::SetLoggerError> {
        let max_level = self.max_level;
        log::set_boxed_logger(Box::new(self)).map(|()| log::set_max_level(max_level))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = LogLine::new(record.level(), record.args().to_string());
        eprintln!("[{}] [{}] {}", line.timestamp, line.level, line.message);

        // Non-blocking: a full UI channel drops the UI copy, never the
        // stderr copy.
        let _ = self.ui_tx.try_send(line);
    }

    fn flush(&self) {}
}
