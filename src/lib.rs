//! AbuseWatch dashboard core.
//!
//! Desktop frontend for a login-abuse tracking backend: polls live
//! metrics and blocklist state over HTTP, reconciles a dual-domain
//! settings draft (server-side defense thresholds plus client-resident
//! scenario defaults), and renders an egui timeline of attempt buckets.
//!
//! The system is organized into functional modules:
//! - **error**: API and configuration error types
//! - **models**: Wire types shared with the backend
//! - **config**: Settings file loading and poll cadence
//! - **api**: HTTP client and the backend trait seam
//! - **poll**: Fixed-cadence pollers with stale-response rejection
//! - **ui**: Controller, reconciler, timeline and Egui views
//! - **log_collector**: Channel-backed logger feeding the UI log feed

pub mod api;
pub mod config;
pub mod error;
pub mod log_collector;
pub mod models;
pub mod poll;
pub mod ui;

// Re-export the log crate for macro usage
pub use log;

pub use error::{ApiError, ConfigError, Result};
pub use log_collector::{LogCollector, LogLine};
