//! Buildwatch - CI Build Log Streaming Backend
//!
//! This crate serves a CI dashboard: it relays the upstream job listing
//! and streams live build console logs over WebSocket, one ordered
//! session per connection.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
