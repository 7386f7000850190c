//! WebSocket Message Types
//!
//! Gateway envelope `{op, d, s, t}` and opcodes.

use serde::{Deserialize, Serialize};

use crate::application::dto::RealtimeEvent;

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Event dispatch (server -> client)
    Dispatch = 0,
    /// Heartbeat (client -> server)
    Heartbeat = 1,
    /// Send a chat message (client -> server)
    SendMessage = 2,
    /// Typing indicator (client -> server)
    Typing = 3,
    /// Enter or leave a game (client -> server)
    ActivityUpdate = 4,
    /// Hello (server -> client)
    Hello = 10,
    /// Heartbeat ACK (server -> client)
    HeartbeatAck = 11,
}

impl OpCode {
    /// Client opcodes the gateway accepts.
    pub fn from_client(op: u64) -> Option<Self> {
        match op {
            1 => Some(Self::Heartbeat),
            2 => Some(Self::SendMessage),
            3 => Some(Self::Typing),
            4 => Some(Self::ActivityUpdate),
            _ => None,
        }
    }
}

/// Incoming gateway message
#[derive(Debug, Deserialize)]
pub struct GatewayReceive {
    pub op: u64,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
}

/// Outgoing gateway message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewaySend {
    pub op: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<serde_json::Value>,
    /// Per-session sequence, set on dispatches by the writer task
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewaySend {
    pub fn hello(heartbeat_interval: u64) -> Self {
        Self {
            op: OpCode::Hello as u8,
            d: Some(serde_json::json!(HelloPayload { heartbeat_interval })),
            s: None,
            t: None,
        }
    }

    pub fn heartbeat_ack() -> Self {
        Self {
            op: OpCode::HeartbeatAck as u8,
            d: None,
            s: None,
            t: None,
        }
    }

    /// Dispatch (op 0) without its sequence number.
    pub fn dispatch(event: &RealtimeEvent) -> Self {
        Self {
            op: OpCode::Dispatch as u8,
            d: Some(event.payload()),
            s: None,
            t: Some(event.name().to_string()),
        }
    }

    pub fn is_dispatch(&self) -> bool {
        self.op == OpCode::Dispatch as u8
    }
}

/// Hello payload (op 10)
#[derive(Debug, Serialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}
