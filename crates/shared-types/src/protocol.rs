//! # Wire Protocol
//!
//! Logical message shapes exchanged with the sync server. Frames are JSON text.
//!
//! ```text
//! ClientToServer: { op: "subscribe"|"unsubscribe"|"heartbeat", channel?: string, ts }
//! ServerToClient: { type: string, channel: string, payload: object, ts, sequence? }
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::entities::{EntityId, EntityKind};
use crate::errors::ProtocolError;
use crate::Timestamp;

/// A named topic identifying which entity updates a subscriber wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Channel(String);

impl Channel {
    /// Wrap an arbitrary channel name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Progress channel of one repair ticket, e.g. `repair:42`.
    #[must_use]
    pub fn repair(repair_id: impl fmt::Display) -> Self {
        Self(format!("repair:{repair_id}"))
    }

    /// Notification feed of one user.
    #[must_use]
    pub fn notifications(user_id: impl fmt::Display) -> Self {
        Self(format!("notifications:{user_id}"))
    }

    /// Photo gallery of one repair ticket.
    #[must_use]
    pub fn photos(repair_id: impl fmt::Display) -> Self {
        Self(format!("photos:{repair_id}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Channel {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Channel {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

/// Operation requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientOp {
    Subscribe,
    Unsubscribe,
    Heartbeat,
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub op: ClientOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    pub ts: Timestamp,
}

impl ClientMessage {
    #[must_use]
    pub fn subscribe(channel: Channel, ts: Timestamp) -> Self {
        Self {
            op: ClientOp::Subscribe,
            channel: Some(channel),
            ts,
        }
    }

    #[must_use]
    pub fn unsubscribe(channel: Channel, ts: Timestamp) -> Self {
        Self {
            op: ClientOp::Unsubscribe,
            channel: Some(channel),
            ts,
        }
    }

    #[must_use]
    pub fn heartbeat(ts: Timestamp) -> Self {
        Self {
            op: ClientOp::Heartbeat,
            channel: None,
            ts,
        }
    }

    /// Serialize to a text frame.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

/// Classified inbound message type.
///
/// Types this client does not know parse as `Unknown` so that server-side
/// additions are dropped and counted rather than failing the frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageType {
    RepairProgress,
    RepairPhoto,
    Notification,
    EntityDeleted,
    HeartbeatAck,
    Unknown(String),
}

impl MessageType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::RepairProgress => "repair_progress",
            Self::RepairPhoto => "repair_photo",
            Self::Notification => "notification",
            Self::EntityDeleted => "entity_deleted",
            Self::HeartbeatAck => "heartbeat_ack",
            Self::Unknown(name) => name,
        }
    }

    /// Entity kind carried by an upsert message of this type.
    #[must_use]
    pub fn entity_kind(&self) -> Option<EntityKind> {
        match self {
            Self::RepairProgress => Some(EntityKind::RepairProgress),
            Self::RepairPhoto => Some(EntityKind::Photo),
            Self::Notification => Some(EntityKind::Notification),
            _ => None,
        }
    }

    /// Upsert message type for an entity kind.
    #[must_use]
    pub fn for_kind(kind: EntityKind) -> Self {
        match kind {
            EntityKind::RepairProgress => Self::RepairProgress,
            EntityKind::Photo => Self::RepairPhoto,
            EntityKind::Notification => Self::Notification,
        }
    }
}

impl From<String> for MessageType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "repair_progress" => Self::RepairProgress,
            "repair_photo" => Self::RepairPhoto,
            "notification" => Self::Notification,
            "entity_deleted" => Self::EntityDeleted,
            "heartbeat_ack" => Self::HeartbeatAck,
            _ => Self::Unknown(name),
        }
    }
}

impl From<&str> for MessageType {
    fn from(name: &str) -> Self {
        Self::from(name.to_string())
    }
}

impl From<MessageType> for String {
    fn from(message_type: MessageType) -> Self {
        message_type.as_str().to_string()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed server frame. Consumed once by the router and never retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub channel: Channel,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub ts: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
}

impl InboundMessage {
    /// Parse a text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Decode the payload into a typed value.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| ProtocolError::InvalidPayload {
            message_type: self.message_type.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize back to a text frame (used by test servers and tooling).
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

/// Payload of an `entity_deleted` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDeleted {
    pub kind: EntityKind,
    pub id: EntityId,
}
