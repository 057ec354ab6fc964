use serde::{Deserialize, Serialize};

use crate::anthropic::types::{AnthropicMessage, ToolDefinition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequestBody {
    pub model: String,
    pub messages: Vec<AnthropicMessage>,
    /// Anthropic keeps the system prompt outside `messages`; the converter
    /// folds it back into a synthetic system-role `UnifiedMessage`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub max_tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
}
