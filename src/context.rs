//! # Invocation Context
//!
//! The context handed to every handler as its first argument. Actors only read
//! `message.content`, the raw untyped field mapping delivered by the transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Inbound message addressed to an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMessage {
    /// Unique identifier for this message
    pub id: Uuid,

    /// Sending actor, if the message originated from one
    pub src: Option<String>,

    /// Destination actor name
    pub dst: String,

    /// Raw field values, validated by the destination actor
    pub content: Map<String, Value>,

    pub created_at: DateTime<Utc>,
}

impl ActorMessage {
    /// New message for `dst` with the given content
    pub fn new(dst: impl Into<String>, content: Map<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            src: None,
            dst: dst.into(),
            content,
            created_at: Utc::now(),
        }
    }

    /// Build a message from a JSON value; non-object values produce empty content
    pub fn from_json(dst: impl Into<String>, content: Value) -> Self {
        let content = match content {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(dst, content)
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }
}

/// Invocation context carrying the inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorContext {
    pub message: ActorMessage,
}

impl ActorContext {
    pub fn new(message: ActorMessage) -> Self {
        Self { message }
    }

    /// Content of the inbound message
    pub fn content(&self) -> &Map<String, Value> {
        &self.message.content
    }
}

impl From<ActorMessage> for ActorContext {
    fn from(message: ActorMessage) -> Self {
        Self::new(message)
    }
}
