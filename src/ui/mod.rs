//! UI Module - egui integration and DashController
//!
//! Handles the interface between the async backend plumbing and the egui
//! frontend: the controller and event channel, the live views (timeline,
//! cards, feeds, controls) and the settings panel over the reconciler.

pub mod app;
pub mod cards;
pub mod controller;
pub mod controls;
pub mod feeds;
pub mod reconciler;
pub mod settings;
pub mod timeline;

pub use app::{AppUI, UIState};
pub use controller::{DashController, DashEvent};
pub use reconciler::{SettingsReconciler, SettingsDraft};
pub use timeline::TimelineRenderer;
