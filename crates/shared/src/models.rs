//! Data models shared by the trigger engine and the operator API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// A declarative rule deciding whether an incoming event should fire a
/// downstream action.
///
/// Triggers are authored by operators, stored in the remote trigger store
/// as YAML documents and mirrored in memory by the trigger engine. A
/// trigger with `enabled = false` never matches any event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Trigger {
    /// Unique within a namespace
    #[validate(length(min = 1, message = "id must not be empty"))]
    pub id: String,
    pub name: String,
    /// Partition key grouping related triggers
    #[validate(length(min = 1, message = "namespace must not be empty"))]
    pub namespace: String,
    pub object_type: String,
    pub event_type: String,
    /// Boolean expression evaluated against the event, e.g.
    /// `event.event_type == "user.created" && event.payload.after.role == "admin"`.
    /// When empty, matching falls back to equality checks on
    /// `event_type` / `namespace` / `object_type` where an empty trigger
    /// field matches everything on that dimension.
    pub criteria: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub enabled: bool,
}

/// An occurrence to be tested against triggers.
///
/// Events are immutable value objects created by the producer of the
/// occurrence; the matching engine only reads them. Field names follow the
/// wire representation, which is also the shape the criteria language sees
/// under the `event` root variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "event_id")]
    pub id: String,
    pub event_type: String,
    pub event_version: String,
    pub namespace: String,
    pub object_type: String,
    pub object_id: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub context: EventContext,
    pub payload: Payload,
    /// Delivery provenance stamped by the ingesting consumer
    pub nats_meta: StreamMeta,
}

/// Who (or what) caused the event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
}

/// Request correlation metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    pub request_id: String,
    pub trace_id: String,
}

/// Object state before and after the change, as arbitrary JSON trees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub before: Map<String, Value>,
    #[serde(default)]
    pub after: Map<String, Value>,
}

/// Provenance of the delivery stream the event arrived on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMeta {
    pub stream: String,
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
}
