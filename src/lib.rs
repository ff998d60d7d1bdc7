//! Overlay Relay - a local WebSocket relay for browser overlays
//!
//! This library accepts overlay viewers that subscribe to a category
//! (chat, notifications, emote wall) and fans typed events out to them
//! without letting one slow viewer hold up the rest.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;
pub mod listener;
pub mod security;

// Re-export main components
pub use config::*;
pub use constants::*;
