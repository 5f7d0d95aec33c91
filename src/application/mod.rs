//! Application layer: orchestrates domain logic over the ports.

pub mod streaming;
