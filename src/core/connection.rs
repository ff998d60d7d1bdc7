//! WebSocket connection management
//! Handles the lifecycle of overlay client connections

use chrono::{DateTime, Utc};
use log::trace;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use warp::ws::Message;

use crate::core::category::Category;
use crate::core::serializer::Payload;
use crate::error::{RelayError, Result};

pub type ConnectionId = Uuid;

/// Lifecycle of a connection. States only move forward; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum ConnectionState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Open,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// One overlay viewer bound to a single category
pub struct Connection {
    pub id: ConnectionId,
    pub category: Category,
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<Message>,
    state: AtomicU8,
    cancel: CancellationToken,
}

impl Connection {
    /// Create a connection in the `Connecting` state. Its cancellation token
    /// is a child of `parent`, so cancelling the parent closes it too.
    pub fn new(
        category: Category,
        sender: mpsc::Sender<Message>,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            connected_at: Utc::now(),
            sender,
            state: AtomicU8::new(ConnectionState::Connecting as u8),
            cancel: parent.child_token(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// `Connecting -> Open`. Returns false if the connection already left
    /// `Connecting`.
    pub fn mark_open(&self) -> bool {
        self.state
            .compare_exchange(
                ConnectionState::Connecting as u8,
                ConnectionState::Open as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Closing` and wake every task working on this connection.
    /// Returns true only for the call that performed the transition.
    pub fn begin_close(&self) -> bool {
        let transitioned = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < ConnectionState::Closing as u8)
                    .then_some(ConnectionState::Closing as u8)
            })
            .is_ok();
        self.cancel.cancel();
        transitioned
    }

    pub fn mark_closed(&self) {
        self.state.store(ConnectionState::Closed as u8, Ordering::Release);
        self.cancel.cancel();
    }

    /// Token fired when this connection must stop
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Queue a text frame for this connection's writer. Waits at most
    /// `timeout` for room in the queue.
    pub async fn send(&self, payload: Payload, timeout: Duration) -> Result<()> {
        if !self.is_open() {
            return Err(RelayError::ConnectionClosed);
        }

        let message = Message::text(&*payload);
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RelayError::ConnectionClosed),
            result = self.sender.send_timeout(message, timeout) => match result {
                Ok(()) => {
                    trace!("Queued {} bytes for client {}", payload.len(), self.id);
                    Ok(())
                }
                Err(SendTimeoutError::Timeout(_)) => Err(RelayError::SendTimeout),
                Err(SendTimeoutError::Closed(_)) => Err(RelayError::ConnectionClosed),
            },
        }
    }

    /// Calculate the connection duration
    pub fn connection_duration(&self) -> chrono::Duration {
        Utc::now() - self.connected_at
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("state", &self.state())
            .finish()
    }
}
