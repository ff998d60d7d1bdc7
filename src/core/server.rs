//! Relay server that owns the registry, the broadcaster and the shutdown signal

use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use warp::ws::Message as WsMessage;

use crate::config::ServerConfig;
use crate::core::broadcaster::{BroadcastStats, Broadcaster};
use crate::core::category::Category;
use crate::core::connection::Connection;
use crate::core::envelope::{ChatMessage, Emote, Envelope, Notification};
use crate::core::registry::{ClientRegistry, SharedRegistry};
use crate::core::serializer::Serializer;
use crate::security::xss::{is_safe_url, sanitize_color, user_span};

/// Producer-facing relay. Its lifecycle belongs to whoever created it; there
/// is no process-wide instance.
pub struct RelayServer {
    config: ServerConfig,
    registry: SharedRegistry,
    broadcaster: Broadcaster,
    shutdown: CancellationToken,
}

impl RelayServer {
    pub fn new(config: ServerConfig) -> Self {
        let registry: SharedRegistry =
            Arc::new(ClientRegistry::with_limit(config.max_connections));
        let broadcaster = Broadcaster::new(
            registry.clone(),
            Serializer::new(config.wire_format),
            config.send_timeout,
        );

        Self {
            config,
            registry,
            broadcaster,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn serializer(&self) -> &Serializer {
        self.broadcaster.serializer()
    }

    /// Root token; every connection holds a child of it
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Create a connection tied to this server's shutdown signal
    pub fn new_connection(
        &self,
        category: Category,
        sender: mpsc::Sender<WsMessage>,
    ) -> Connection {
        Connection::new(category, sender, &self.shutdown)
    }

    /// Send a chat line to every chat overlay
    pub async fn send_chat(&self, user: &str, message: &str, user_color: &str) -> BroadcastStats {
        let color = sanitize_color(user_color);
        let chat = ChatMessage::new(user_span(user, &color), color, message.to_string())
            .with_duration(self.config.message_duration_ms);
        self.broadcast(chat).await
    }

    /// Send an alert to every notification overlay
    pub async fn send_notification(
        &self,
        user: &str,
        title: &str,
        message: &str,
        user_color: &str,
    ) -> BroadcastStats {
        let notification = Notification::new(
            format!("{} {}", user_span(user, user_color), title),
            message.to_string(),
        )
        .with_duration(self.config.notification_duration_ms);
        self.broadcast(notification).await
    }

    /// Throw `count` copies of an emote onto the emote wall
    pub async fn send_emote(&self, url: &str, count: i32) -> BroadcastStats {
        if !is_safe_url(url) || count <= 0 {
            warn!("Dropping emote {:?} x{}", url, count);
            return BroadcastStats::default();
        }
        self.broadcast(Emote::new(url.to_string(), count)).await
    }

    /// Broadcast to the category the envelope belongs to
    pub async fn broadcast(&self, envelope: impl Into<Envelope>) -> BroadcastStats {
        let envelope = envelope.into();
        self.broadcaster
            .broadcast(envelope.category(), &envelope)
            .await
    }

    /// Broadcast with an explicit category
    pub async fn broadcast_to(&self, category: Category, envelope: &Envelope) -> BroadcastStats {
        self.broadcaster.broadcast(category, envelope).await
    }

    /// Number of open connections listening to `category`
    pub fn client_count(&self, category: Category) -> usize {
        self.registry.count(category).unwrap_or_else(|e| {
            error!("Failed to count {} clients: {}", category, e);
            0
        })
    }

    /// Get connection count
    pub fn connection_count(&self) -> usize {
        self.registry.len().unwrap_or_else(|e| {
            error!("Failed to count connections: {}", e);
            0
        })
    }

    /// Signal shutdown and close every registered connection. Returns the
    /// number of connections that were open.
    pub fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        match self.registry.drain() {
            Ok(drained) => {
                info!("Shutdown closed {} overlay connections", drained.len());
                drained.len()
            }
            Err(e) => {
                error!("Failed to drain registry during shutdown: {}", e);
                0
            }
        }
    }
}

// Shared reference to the relay server
pub type SharedRelayServer = Arc<RelayServer>;
