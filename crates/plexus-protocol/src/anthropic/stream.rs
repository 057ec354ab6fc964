use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::anthropic::types::Usage;

/// Anthropic multiplexes several logical event shapes under one `event:`
/// name space (`message_start`, `content_block_delta`, `message_stop`, ...);
/// each is its own struct here, paired with the SSE `event:` field when
/// written to the wire by the stream wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagesStreamEvent {
    MessageStart { message: MessageStartPayload },
    ContentBlockStart { index: i64, content_block: JsonValue },
    ContentBlockDelta { index: i64, delta: ContentDelta },
    ContentBlockStop { index: i64 },
    MessageDelta { delta: MessageDeltaPayload, usage: Usage },
    MessageStop,
    Ping,
}

impl MessagesStreamEvent {
    /// The `event:` line name used alongside this payload's `data:` line.
    pub fn event_name(&self) -> &'static str {
        match self {
            MessagesStreamEvent::MessageStart { .. } => "message_start",
            MessagesStreamEvent::ContentBlockStart { .. } => "content_block_start",
            MessagesStreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            MessagesStreamEvent::ContentBlockStop { .. } => "content_block_stop",
            MessagesStreamEvent::MessageDelta { .. } => "message_delta",
            MessagesStreamEvent::MessageStop => "message_stop",
            MessagesStreamEvent::Ping => "ping",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageStartPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    pub model: String,
    pub content: Vec<JsonValue>,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeltaPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
}
