// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between the registration client and the
//! receiver.
//!
//! The protocol is request/response:
//! - Client sends one `submit` per queued registration and waits for the
//!   answer carrying the same `request_id`
//! - Server answers every submit with exactly one `receipt` or `rejected`
//!
//! A `duplicate` receipt means the receiver already holds a registration
//! with the same national identifier. Clients treat it as delivered, which
//! is what lets them retry after an ambiguous timeout without creating a
//! second record.

use serde::{Deserialize, Serialize};

use crate::registration::Registration;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Deliver one registration.
    Submit {
        /// Client-chosen correlation id echoed in the answer.
        request_id: u64,
        registration: Registration,
    },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Outcome of an accepted submit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    /// Stored as a new registration.
    Accepted,
    /// A registration with the same natural key was already stored.
    Duplicate,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The registration is stored (now or previously).
    Receipt {
        request_id: u64,
        status: ReceiptStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The registration was refused and will not be stored as sent.
    Rejected { request_id: u64, message: String },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error not tied to a request, e.g. an unparseable frame.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Submit message.
    pub fn submit(request_id: u64, registration: Registration) -> Self {
        ClientMessage::Submit { request_id, registration }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Receipt message.
    pub fn receipt(request_id: u64, status: ReceiptStatus) -> Self {
        ServerMessage::Receipt { request_id, status, message: None }
    }

    /// Creates a Rejected message.
    pub fn rejected(request_id: u64, message: impl Into<String>) -> Self {
        ServerMessage::Rejected { request_id, message: message.into() }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// Returns the correlation id for answers to a submit.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Receipt { request_id, .. } | ServerMessage::Rejected { request_id, .. } => {
                Some(*request_id)
            }
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
