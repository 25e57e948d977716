//! Engine performance calculator service
//!
//! Serves the calculator form backend over HTTP, next to health and
//! Prometheus endpoints.

pub mod api;
pub mod config;
