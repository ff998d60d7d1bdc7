//! Category fan-out
//!
//! A broadcast serializes once, snapshots the registry, then sends the
//! same payload to every recipient concurrently. Each send is bounded by
//! the send timeout, and a failure only drops the connection that failed.

use futures_util::future::join_all;
use log::{debug, error, trace, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::category::Category;
use crate::core::connection::Connection;
use crate::core::envelope::Envelope;
use crate::core::registry::SharedRegistry;
use crate::core::serializer::{Payload, Serializer};
use crate::error::RelayError;

/// Outcome of one delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    /// Connection was already going away
    Skipped,
    /// Connection failed and was dropped
    Failed,
}

/// Statistics for broadcast operations
#[derive(Debug, Default, Clone)]
pub struct BroadcastStats {
    pub total_recipients: usize,
    pub sent_count: usize,
    pub skipped_count: usize,
    pub failed_count: usize,
    pub duration: Duration,
}

impl BroadcastStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_recipients == 0 {
            1.0
        } else {
            self.sent_count as f64 / self.total_recipients as f64
        }
    }
}

pub struct Broadcaster {
    registry: SharedRegistry,
    serializer: Serializer,
    send_timeout: Duration,
}

impl Broadcaster {
    pub fn new(registry: SharedRegistry, serializer: Serializer, send_timeout: Duration) -> Self {
        Self {
            registry,
            serializer,
            send_timeout,
        }
    }

    pub fn serializer(&self) -> &Serializer {
        &self.serializer
    }

    /// Deliver `envelope` to every open connection subscribed to `category`.
    /// Never fails from the caller's side; partial delivery shows up only in
    /// the returned stats.
    pub async fn broadcast(&self, category: Category, envelope: &Envelope) -> BroadcastStats {
        if envelope.category() != category {
            warn!(
                "Refusing to broadcast a {} envelope to {} subscribers",
                envelope.category(),
                category
            );
            return BroadcastStats::default();
        }

        let payload = match self.serializer.encode(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize {} envelope: {}", category, e);
                return BroadcastStats::default();
            }
        };

        self.broadcast_raw(category, payload).await
    }

    /// Deliver an already serialized payload
    pub async fn broadcast_raw(&self, category: Category, payload: Payload) -> BroadcastStats {
        let start = Instant::now();

        let recipients = match self.registry.snapshot(category) {
            Ok(recipients) => recipients,
            Err(e) => {
                error!("Failed to snapshot {} subscribers: {}", category, e);
                return BroadcastStats::default();
            }
        };

        let total_recipients = recipients.len();
        let deliveries = recipients
            .into_iter()
            .map(|connection| self.deliver(connection, payload.clone()));
        let outcomes = join_all(deliveries).await;

        let mut stats = BroadcastStats {
            total_recipients,
            ..BroadcastStats::default()
        };
        for outcome in outcomes {
            match outcome {
                Delivery::Sent => stats.sent_count += 1,
                Delivery::Skipped => stats.skipped_count += 1,
                Delivery::Failed => stats.failed_count += 1,
            }
        }
        stats.duration = start.elapsed();

        debug!(
            "Broadcast to {}: {}/{} delivered ({:.0}%), {} skipped, {} dropped in {:?}",
            category,
            stats.sent_count,
            stats.total_recipients,
            stats.success_rate() * 100.0,
            stats.skipped_count,
            stats.failed_count,
            stats.duration
        );
        stats
    }

    async fn deliver(&self, connection: Arc<Connection>, payload: Payload) -> Delivery {
        if !connection.is_open() {
            trace!("Skipping client {}, not open", connection.id);
            return Delivery::Skipped;
        }

        match connection.send(payload, self.send_timeout).await {
            Ok(()) => Delivery::Sent,
            Err(RelayError::ConnectionClosed) => Delivery::Skipped,
            Err(e) => {
                warn!(
                    "Dropping {} client {}: {}",
                    connection.category, connection.id, e
                );
                if let Err(e) = self.registry.remove(&connection.id) {
                    error!("Failed to remove client {}: {}", connection.id, e);
                }
                connection.begin_close();
                Delivery::Failed
            }
        }
    }
}
