//! HTTP and WebSocket adapters for the dashboard-facing API.

pub mod dto;
pub mod handlers;
pub mod routes;
pub mod ws;

pub use handlers::AppState;
pub use routes::api_router;
