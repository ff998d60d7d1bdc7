//! Request handlers for different server endpoints

pub mod routes;
pub mod websocket;

// Re-export the entry points
pub use routes::{category_from_query, routes};
pub use websocket::handle_overlay_client;
