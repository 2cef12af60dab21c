//! The local platform control API over real HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use voxel_session_server::config::SessionConfig;
use voxel_session_server::control;
use voxel_session_server::lifecycle::{LifecycleController, LifecycleState};
use voxel_session_server::platform::LocalPlatform;

type ServerHandle = tokio::task::JoinHandle<anyhow::Result<()>>;

async fn start_server() -> (SocketAddr, Arc<LifecycleController>, ServerHandle) {
    let platform = Arc::new(LocalPlatform::new());
    let controller = Arc::new(LifecycleController::new(platform, SessionConfig::default()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(control::serve(Arc::clone(&controller), listener));
    (addr, controller, handle)
}

/// Minimal HTTP/1.1 client: returns the status code and body.
async fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&str>) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let body = body.unwrap_or("");
    let req = format!(
        "{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\
         Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8(raw).unwrap();
    let status: u16 = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_owned())
        .unwrap_or_default();
    (status, body)
}

#[tokio::test]
async fn health_endpoint() {
    let (addr, _, _) = start_server().await;
    let (status, body) = request(addr, "GET", "/health", None).await;
    assert_eq!(status, 200);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["healthy"], true);
}

#[tokio::test]
async fn start_status_terminate() {
    let (addr, controller, server) = start_server().await;

    let descriptor = r#"{"sessionId":"S1","gameProperties":[{"key":"gameMode","value":"arena"}]}"#;
    let (status, body) = request(addr, "POST", "/session", Some(descriptor)).await;
    assert_eq!(status, 200);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["activated"], true);
    assert_eq!(value["sessionId"], "S1");

    let (status, _) = request(addr, "POST", "/session", Some(r#"{"sessionId":"S2"}"#)).await;
    assert_eq!(status, 409);

    let (status, body) = request(addr, "GET", "/status", None).await;
    assert_eq!(status, 200);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["state"], "Active");
    assert_eq!(value["session_id"], "S1");
    assert_eq!(value["game_mode"], "arena");
    assert_eq!(value["metrics"]["sessions_started"], 1);

    let (status, body) = request(addr, "POST", "/terminate", None).await;
    assert_eq!(status, 200);
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value["terminated"], true);

    assert_eq!(controller.state(), LifecycleState::Idle);
    // Terminate requests shutdown, which stops the server gracefully.
    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn malformed_descriptor_is_client_error() {
    let (addr, controller, _) = start_server().await;
    let (status, _) = request(addr, "POST", "/session", Some(r#"{"gameMode":"x"}"#)).await;
    assert!((400..500).contains(&status), "got {status}");
    assert_eq!(controller.state(), LifecycleState::Idle);
}
