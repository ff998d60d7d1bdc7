// Integration test for the overlay relay over real sockets
// Starts the listener on an ephemeral port and talks to it with tokio-tungstenite

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use overlay_relay::config::ServerConfig;
use overlay_relay::core::{Category, RelayServer};
use overlay_relay::listener::{self, ServerHandle};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> ServerHandle {
    let server = Arc::new(RelayServer::new(ServerConfig::for_testing()));
    match listener::serve(server).await {
        Ok(handle) => handle,
        Err(e) => panic!("Failed to start test server: {}", e),
    }
}

async fn connect(handle: &ServerHandle, category: &str) -> Client {
    let url = format!("ws://{}/ws?type={}", handle.local_addr(), category);
    let (ws_stream, _) = match tokio::time::timeout(Duration::from_secs(5), connect_async(url)).await {
        Ok(Ok(ws)) => ws,
        Ok(Err(e)) => panic!("Failed to establish WebSocket connection: {}", e),
        Err(_) => panic!("WebSocket connection timeout after 5 seconds"),
    };
    ws_stream
}

async fn wait_for_count(handle: &ServerHandle, category: Category, expected: usize) {
    let server = handle.server().clone();
    let waited = tokio::time::timeout(Duration::from_secs(2), async move {
        while server.client_count(category) != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "registry never reached {} {} clients", expected, category);
}

async fn next_json(client: &mut Client) -> Value {
    let msg = match tokio::time::timeout(Duration::from_secs(2), client.next()).await {
        Ok(Some(Ok(msg))) => msg,
        Ok(Some(Err(e))) => panic!("Error receiving message: {}", e),
        Ok(None) => panic!("Connection closed unexpectedly"),
        Err(_) => panic!("Timeout waiting for broadcast"),
    };
    assert!(msg.is_text(), "Expected text frame, got {:?}", msg);
    serde_json::from_str(&msg.into_text().unwrap()).unwrap()
}

#[tokio::test]
async fn test_broadcast_reaches_every_subscriber_of_the_category() {
    let handle = start_server().await;

    let mut chat_a = connect(&handle, "chat").await;
    let mut chat_b = connect(&handle, "CHAT").await;
    let mut alerts = connect(&handle, "notification").await;
    wait_for_count(&handle, Category::Chat, 2).await;
    wait_for_count(&handle, Category::Notification, 1).await;

    let stats = handle.server().send_chat("alice", "hello", "#a970ff").await;
    assert_eq!(stats.total_recipients, 2);
    assert_eq!(stats.sent_count, 2);

    for client in [&mut chat_a, &mut chat_b] {
        let value = next_json(client).await;
        assert_eq!(value["content"], "hello");
        assert_eq!(value["duration"], 5000);
    }

    handle
        .server()
        .send_notification("bob", "subscribed", "tier 1", "#00ff00")
        .await;
    let value = next_json(&mut alerts).await;
    assert_eq!(value["content"], "tier 1");
    assert_eq!(value["duration"], 9000);

    handle.stop().await;
}

#[tokio::test]
async fn test_bogus_category_gets_400() {
    let handle = start_server().await;
    let url = format!("ws://{}/ws?type=bogus", handle.local_addr());

    match connect_async(url).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
            assert_eq!(response.status().as_u16(), 400);
        }
        Err(e) => panic!("Unexpected error: {}", e),
        Ok(_) => panic!("Upgrade with an unknown category must fail"),
    }
    assert_eq!(handle.server().connection_count(), 0);

    handle.stop().await;
}

#[tokio::test]
async fn test_disconnected_client_is_removed_before_next_broadcast() {
    let handle = start_server().await;

    let mut leaving = connect(&handle, "chat").await;
    let mut staying = connect(&handle, "chat").await;
    wait_for_count(&handle, Category::Chat, 2).await;

    if let Err(e) = leaving.close(None).await {
        println!("Warning: Failed to close WebSocket connection gracefully: {}", e);
    }
    wait_for_count(&handle, Category::Chat, 1).await;

    let stats = handle.server().send_chat("carol", "still here?", "#ffffff").await;
    assert_eq!(stats.total_recipients, 1);
    assert_eq!(stats.sent_count, 1);
    assert_eq!(next_json(&mut staying).await["content"], "still here?");

    // Anything the viewer sends is ignored
    staying
        .send(Message::Text("ignored".to_string()))
        .await
        .unwrap();
    assert_eq!(handle.server().client_count(Category::Chat), 1);

    handle.stop().await;
}

#[tokio::test]
async fn test_stop_closes_open_sockets() {
    let handle = start_server().await;
    let mut client = connect(&handle, "emotewall").await;
    wait_for_count(&handle, Category::EmoteWall, 1).await;

    assert_eq!(handle.stop().await, 1);

    // The server sends a close frame, then the stream ends
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(frame) = client.next().await {
            match frame {
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket stayed open after shutdown");
}

#[tokio::test]
async fn test_server_health_endpoint() {
    let handle = start_server().await;

    let client = reqwest::Client::new();
    let response = match client
        .get(format!("http://{}/health", handle.local_addr()))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => panic!("Failed to send request to health endpoint: {}", e),
    };

    assert!(
        response.status().is_success(),
        "Health endpoint returned non-success status"
    );
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK", "Health endpoint response should be 'OK'");

    handle.stop().await;
}
