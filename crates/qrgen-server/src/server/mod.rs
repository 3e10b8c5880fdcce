//! Server internals: configuration, telemetry, and the HTTP service.

pub mod config;
pub mod service;
pub mod telemetry;
