// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Test server utilities and end-to-end receiver tests.
//!
//! Provides a TestServer that runs on a random port against a temporary
//! ledger.

#![cfg(test)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::server;
use crate::state::ServerState;

/// A test server that runs on a random port and can be controlled.
pub struct TestServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    state: ServerState,
    /// Keep the temp directory alive for the lifetime of the test server.
    _temp_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a new test server on a random available port.
    pub async fn start() -> Self {
        let temp_dir = tempfile::tempdir().unwrap();
        let state = ServerState::new(temp_dir.path()).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let state_clone = state.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = server::serve(listener, state_clone) => {
                    if let Err(e) = result {
                        eprintln!("Test server error: {}", e);
                    }
                }
                _ = shutdown_rx => {}
            }
        });

        TestServer { addr, shutdown_tx, state, _temp_dir: temp_dir }
    }

    /// Get the WebSocket URL for connecting to this server.
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Get access to the server state for verification.
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Shutdown the test server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use shamba_core::protocol::{ClientMessage, ReceiptStatus, ServerMessage};
    use shamba_core::Registration;
    use tokio::time::{timeout, Duration};
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message;

    type Client = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    fn registration(national_id: &str) -> Registration {
        Registration {
            full_name: "Muthoni Njeri".to_string(),
            national_id: national_id.to_string(),
            phone_number: "+254711222333".to_string(),
            county: "Nyeri".to_string(),
            ward: "Mukurwe-ini".to_string(),
            crop: "tea".to_string(),
            acreage: 0.5,
            premium_kes: 300,
        }
    }

    async fn connect(server: &TestServer) -> Client {
        connect_async(server.ws_url()).await.unwrap().0
    }

    /// Sends one message and waits for the next text answer.
    async fn request(ws: &mut Client, msg: ClientMessage) -> ServerMessage {
        ws.send(Message::Text(msg.to_json().unwrap().into())).await.unwrap();
        read_answer(ws).await
    }

    async fn read_answer(ws: &mut Client) -> ServerMessage {
        match timeout(Duration::from_secs(5), ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => ServerMessage::from_json(&text).unwrap(),
            Ok(other) => panic!("Expected text answer, got {:?}", other),
            Err(_) => panic!("Timeout waiting for answer"),
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        let answer = request(&mut ws, ClientMessage::ping(42)).await;
        assert_eq!(answer, ServerMessage::pong(42));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_submit_is_accepted_and_stored() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        let answer = request(&mut ws, ClientMessage::submit(7, registration("30111222"))).await;
        assert_eq!(answer, ServerMessage::receipt(7, ReceiptStatus::Accepted));
        assert_eq!(server.state().registration_count().await, 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_resubmission_gets_duplicate_receipt() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        request(&mut ws, ClientMessage::submit(1, registration("30111222"))).await;

        // A retry after a lost answer arrives on a fresh connection.
        let mut retry = connect(&server).await;
        let answer = request(&mut retry, ClientMessage::submit(1, registration("30111222"))).await;
        match answer {
            ServerMessage::Receipt { request_id, status, message } => {
                assert_eq!(request_id, 1);
                assert_eq!(status, ReceiptStatus::Duplicate);
                assert!(message.unwrap().contains("30111222"));
            }
            other => panic!("Expected duplicate receipt, got {:?}", other),
        }
        assert_eq!(server.state().registration_count().await, 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_invalid_registration_is_rejected() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        let mut bad = registration("30111222");
        bad.phone_number = "12".to_string();
        let answer = request(&mut ws, ClientMessage::submit(3, bad)).await;

        match answer {
            ServerMessage::Rejected { request_id, message } => {
                assert_eq!(request_id, 3);
                assert!(message.contains("phoneNumber"));
            }
            other => panic!("Expected rejection, got {:?}", other),
        }
        assert_eq!(server.state().registration_count().await, 0);

        server.shutdown();
    }

    #[tokio::test]
    async fn test_unparseable_frame_gets_error() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        ws.send(Message::Text("{\"type\":\"launch\"}".into())).await.unwrap();
        let answer = read_answer(&mut ws).await;
        assert!(matches!(answer, ServerMessage::Error { .. }));

        // The connection stays usable.
        let answer = request(&mut ws, ClientMessage::ping(1)).await;
        assert_eq!(answer, ServerMessage::pong(1));

        server.shutdown();
    }

    #[tokio::test]
    async fn test_answers_follow_submission_order() {
        let server = TestServer::start().await;
        let mut ws = connect(&server).await;

        for (id, national_id) in [(10, "1"), (11, "2"), (12, "1")] {
            let msg = ClientMessage::submit(id, registration(&format!("3011122{national_id}")));
            ws.send(Message::Text(msg.to_json().unwrap().into())).await.unwrap();
        }

        let mut statuses = Vec::new();
        for _ in 0..3 {
            match read_answer(&mut ws).await {
                ServerMessage::Receipt { request_id, status, .. } => statuses.push((request_id, status)),
                other => panic!("Expected receipt, got {:?}", other),
            }
        }
        assert_eq!(
            statuses,
            vec![
                (10, ReceiptStatus::Accepted),
                (11, ReceiptStatus::Accepted),
                (12, ReceiptStatus::Duplicate),
            ]
        );

        server.shutdown();
    }
}
