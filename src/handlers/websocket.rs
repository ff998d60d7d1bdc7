use futures_util::sink::SinkExt;
use futures_util::stream::{SplitSink, SplitStream, StreamExt};
use log::{debug, error, info, trace, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use warp::ws::{Message, WebSocket};

use crate::core::category::Category;
use crate::core::connection::ConnectionId;
use crate::core::server::SharedRelayServer;
use crate::error::RelayError;

// Handle an upgraded overlay connection for its whole lifetime
pub async fn handle_overlay_client(ws: WebSocket, category: Category, server: SharedRelayServer) {
    let (ws_tx, mut ws_rx) = ws.split();
    let (tx, rx) = mpsc::channel(server.config().outbound_queue);

    let connection = Arc::new(server.new_connection(category, tx));
    let client_id = connection.id;
    let cancel = connection.cancellation_token();

    // Spawn a task to forward queued frames to the WebSocket
    let writer = tokio::task::spawn(write_loop(
        ws_tx,
        rx,
        cancel.clone(),
        server.config().send_timeout,
        client_id,
    ));

    let registered = match server.registry().add(connection.clone()) {
        Ok(true) => {
            info!("Overlay client connected: {} ({})", client_id, category);
            info!(
                "Current {} connections: {}",
                category,
                server.client_count(category)
            );
            true
        }
        Ok(false) => {
            warn!("Client {} could not be opened", client_id);
            false
        }
        Err(RelayError::ConnectionError(reason)) => {
            warn!("Refused client {}: {}", client_id, reason);
            false
        }
        Err(e) => {
            error!("Failed to register client {}: {}", client_id, e);
            false
        }
    };

    if registered {
        receive_loop(&mut ws_rx, &cancel, client_id).await;
    }

    // Client disconnected
    connection.begin_close();
    if let Err(e) = server.registry().remove(&client_id) {
        error!("Error unregistering client {}: {}", client_id, e);
    }
    if let Err(e) = writer.await {
        error!("Writer task for client {} failed: {}", client_id, e);
    }
    connection.mark_closed();

    info!(
        "Overlay client disconnected: {} after {}s",
        client_id,
        connection.connection_duration().num_seconds()
    );
    info!(
        "Current {} connections: {}",
        category,
        server.client_count(category)
    );
}

// Inbound frames are only read to notice a close or a transport error
async fn receive_loop(
    ws_rx: &mut SplitStream<WebSocket>,
    cancel: &CancellationToken,
    client_id: ConnectionId,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Client {} cancelled", client_id);
                break;
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(msg)) if msg.is_close() => {
                    debug!("Client {} sent close frame", client_id);
                    break;
                }
                Some(Ok(msg)) => {
                    trace!("Ignoring {} byte frame from client {}", msg.as_bytes().len(), client_id);
                }
                Some(Err(e)) => {
                    warn!("WebSocket error from client {}: {}", client_id, e);
                    break;
                }
                None => break,
            },
        }
    }
}

// Frames for one connection are written in queue order by this task alone
async fn write_loop(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<Message>,
    cancel: CancellationToken,
    send_timeout: Duration,
    client_id: ConnectionId,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => None,
            next = rx.recv() => next,
        };
        let Some(message) = next else { break };

        tokio::select! {
            _ = cancel.cancelled() => break,
            result = ws_tx.send(message) => {
                if let Err(e) = result {
                    warn!("Failed to send WebSocket message to {}: {}", client_id, e);
                    cancel.cancel();
                    break;
                }
            }
        }
    }

    // A stalled peer must not hold the close forever
    match tokio::time::timeout(send_timeout, ws_tx.close()).await {
        Ok(Ok(())) => trace!("Closed socket for client {}", client_id),
        Ok(Err(e)) => debug!("Error closing socket for client {}: {}", client_id, e),
        Err(_) => debug!("Timed out closing socket for client {}", client_id),
    }
}
