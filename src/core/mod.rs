//! Core functionality for the overlay relay

pub mod broadcaster;
pub mod category;
pub mod connection;
pub mod envelope;
pub mod registry;
pub mod serializer;
pub mod server;

// Re-export main components for convenience
pub use broadcaster::{BroadcastStats, Broadcaster};
pub use category::Category;
pub use connection::{Connection, ConnectionId, ConnectionState};
pub use envelope::{ChatMessage, Emote, Envelope, GenericEnvelope, Notification};
pub use registry::{ClientRegistry, SharedRegistry};
pub use serializer::{Payload, Serializer, WireFormat};
pub use server::{RelayServer, SharedRelayServer};
