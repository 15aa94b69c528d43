//! Backend API module - typed HTTP contract against the detection engine.

pub mod client;

pub use client::{ApiBackend, ApiClient};
