//! HTTP service implementation.
//!
//! Contains the request handlers and router wiring for the two routes the
//! service exposes (`/generate`, `/health`).
//!
//! ## Structure
//!
//! - [`handler`] - HTTP handlers and shared request state.

pub mod handler;
