// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Remote submission.
//!
//! [`Submitter`] is the seam between the sync manager and the backend:
//! - [`WebSocketSubmitter`] talks to `shamba-remote` in production
//! - tests script their own implementations

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use shamba_core::protocol::{ClientMessage, ReceiptStatus, ServerMessage};
use shamba_core::Registration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for submission transport failures.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed before an answer arrived.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// The server reported an error not tied to this request.
    #[error("server error: {0}")]
    Server(String),
}

/// Result type for submissions.
pub type SubmitResult<T> = Result<T, SubmitError>;

/// The backend's answer to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    /// True if the backend holds the record, now or from an earlier attempt.
    pub success: bool,
    pub message: Option<String>,
}

impl SubmitResponse {
    pub fn accepted() -> Self {
        SubmitResponse { success: true, message: None }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        SubmitResponse { success: false, message: Some(message.into()) }
    }
}

/// Delivers one payload to the backend.
///
/// Delivery is at-least-once: the manager may resubmit a payload whose
/// earlier attempt timed out, so the backend must deduplicate.
pub trait Submitter<P>: Send + Sync {
    fn submit<'a>(
        &'a self,
        payload: &'a P,
    ) -> Pin<Box<dyn Future<Output = SubmitResult<SubmitResponse>> + Send + 'a>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket submitter using tokio-tungstenite.
///
/// Connects lazily on the first submission and keeps the connection for
/// later ones. A connection is dropped on any transport error, or when a
/// submission is cancelled mid-flight, and re-established on the next call.
pub struct WebSocketSubmitter {
    url: String,
    ws: Mutex<Option<WsStream>>,
    next_request_id: AtomicU64,
}

impl WebSocketSubmitter {
    pub fn new(url: impl Into<String>) -> Self {
        WebSocketSubmitter { url: url.into(), ws: Mutex::new(None), next_request_id: AtomicU64::new(1) }
    }

    /// The backend URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Closes the connection, if any.
    pub async fn disconnect(&self) {
        if let Some(mut ws) = self.ws.lock().await.take() {
            let _ = ws.close(None).await;
        }
    }

    async fn connect(&self) -> SubmitResult<WsStream> {
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| SubmitError::ConnectionFailed(e.to_string()))?;
        tracing::debug!(url = %self.url, "connected to backend");
        Ok(ws)
    }

    async fn submit_registration(&self, registration: &Registration) -> SubmitResult<SubmitResponse> {
        let mut slot = self.ws.lock().await;

        // Held outside the slot while in flight, so a cancelled submission
        // drops the connection instead of leaving a half-read exchange.
        let mut ws = match slot.take() {
            Some(ws) => ws,
            None => self.connect().await?,
        };

        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let response = exchange(&mut ws, request_id, registration).await?;
        *slot = Some(ws);
        Ok(response)
    }
}

impl Submitter<Registration> for WebSocketSubmitter {
    fn submit<'a>(
        &'a self,
        payload: &'a Registration,
    ) -> Pin<Box<dyn Future<Output = SubmitResult<SubmitResponse>> + Send + 'a>> {
        Box::pin(self.submit_registration(payload))
    }
}

/// Sends one submit and waits for the answer carrying its request id.
async fn exchange(
    ws: &mut WsStream,
    request_id: u64,
    registration: &Registration,
) -> SubmitResult<SubmitResponse> {
    let json = ClientMessage::submit(request_id, registration.clone())
        .to_json()
        .map_err(|e| SubmitError::SerializationError(e.to_string()))?;

    ws.send(Message::Text(json.into())).await.map_err(|e| SubmitError::SendFailed(e.to_string()))?;

    loop {
        let text = match ws.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => return Err(SubmitError::ConnectionClosed),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(SubmitError::ReceiveFailed(e.to_string())),
        };

        let msg = ServerMessage::from_json(&text)
            .map_err(|e| SubmitError::SerializationError(e.to_string()))?;

        if msg.request_id().is_some_and(|id| id != request_id) {
            tracing::debug!(?msg, "ignoring answer to another request");
            continue;
        }

        match msg {
            ServerMessage::Receipt { status, message, .. } => {
                if status == ReceiptStatus::Duplicate {
                    tracing::info!(national_id = %registration.national_id, "backend already had this registration");
                }
                return Ok(SubmitResponse { success: true, message });
            }
            ServerMessage::Rejected { message, .. } => return Ok(SubmitResponse::rejected(message)),
            ServerMessage::Error { message } => return Err(SubmitError::Server(message)),
            ServerMessage::Pong { .. } => tracing::debug!("ignoring pong"),
        }
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
