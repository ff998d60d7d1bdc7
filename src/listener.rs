//! Binds the dispatcher to a socket and owns the accept loop's lifetime

use log::{error, info};
use std::net::SocketAddr;
use tokio::task::JoinHandle;

use crate::core::server::SharedRelayServer;
use crate::error::{RelayError, Result};
use crate::handlers::routes::routes;

/// Running listener. Dropping the handle leaves the server running; call
/// [`ServerHandle::stop`] to shut it down.
pub struct ServerHandle {
    local_addr: SocketAddr,
    server: SharedRelayServer,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Address actually bound, useful when the configured port is 0
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn server(&self) -> &SharedRelayServer {
        &self.server
    }

    /// Fire the shutdown signal and wait for the accept loop to finish.
    /// Returns the number of overlay connections that were closed.
    pub async fn stop(self) -> usize {
        let closed = self.server.shutdown();
        if let Err(e) = self.task.await {
            error!("Listener task failed: {}", e);
        }
        info!("Overlay relay on {} stopped", self.local_addr);
        closed
    }
}

/// Bind `host:port` from the server's configuration and start accepting
pub async fn serve(server: SharedRelayServer) -> Result<ServerHandle> {
    let addr = resolve(&server.config().bind_address()).await?;
    let shutdown = server.shutdown_token();

    let (local_addr, running) = warp::serve(routes(server.clone()))
        .try_bind_with_graceful_shutdown(addr, async move { shutdown.cancelled().await })
        .map_err(|e| RelayError::SystemError(format!("Failed to bind {}: {}", addr, e)))?;

    info!("Starting overlay relay on {}", local_addr);
    let task = tokio::spawn(running);

    Ok(ServerHandle {
        local_addr,
        server,
        task,
    })
}

// Accept literal addresses directly, fall back to DNS for names like `localhost`
async fn resolve(address: &str) -> Result<SocketAddr> {
    if let Ok(addr) = address.parse() {
        return Ok(addr);
    }

    tokio::net::lookup_host(address)
        .await
        .map_err(|e| RelayError::ConfigError(format!("Failed to resolve {}: {}", address, e)))?
        .next()
        .ok_or_else(|| RelayError::ConfigError(format!("No address found for {}", address)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_literal_and_localhost() {
        let addr = resolve("127.0.0.1:23399").await.unwrap();
        assert_eq!(addr.port(), 23399);

        let addr = resolve("localhost:0").await.unwrap();
        assert!(addr.ip().is_loopback());
    }

    #[tokio::test]
    async fn test_resolve_rejects_garbage() {
        assert!(resolve("not an address").await.is_err());
    }
}
