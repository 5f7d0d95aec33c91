//! Adapters - concrete implementations of the ports.
//!
//! `jenkins` talks to a real CI controller, `memory` backs the tests, and
//! `http` exposes the dashboard-facing API.

pub mod http;
pub mod jenkins;
pub mod memory;
