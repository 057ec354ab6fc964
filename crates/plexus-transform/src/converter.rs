use plexus_protocol::anthropic::types::{AnthropicRole, MessageBody};
use plexus_protocol::anthropic::MessagesRequestBody;
use plexus_protocol::openai::types::ChatRole;
use plexus_protocol::openai::ChatCompletionRequestBody;
use plexus_protocol::{
    ContentPart, MessageContent, SamplingParams, UnifiedMessage, UnifiedRequest, UnifiedRole,
};

/// Converts an OpenAI-shaped request body into the unified internal shape.
/// Total on well-typed input: unsupported fields become `warnings`, never a
/// conversion failure.
pub fn from_openai(body: &ChatCompletionRequestBody) -> UnifiedRequest {
    let mut warnings = Vec::new();

    let messages = body
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::System | ChatRole::Developer => UnifiedRole::System,
                ChatRole::User => UnifiedRole::User,
                ChatRole::Assistant => UnifiedRole::Assistant,
                ChatRole::Tool => UnifiedRole::Tool,
            };
            let content = match &m.content {
                Some(serde_json::Value::String(s)) => MessageContent::Text(s.clone()),
                Some(other) => MessageContent::Text(other.to_string()),
                None => MessageContent::Text(String::new()),
            };
            UnifiedMessage {
                role,
                content,
                tool_call_id: m.tool_call_id.clone(),
                tool_calls: m
                    .tool_calls
                    .iter()
                    .map(|tc| plexus_protocol::ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: serde_json::from_str(&tc.function.arguments)
                            .unwrap_or(serde_json::Value::Null),
                    })
                    .collect(),
            }
        })
        .collect();

    if body.max_tokens.is_some() && body.max_completion_tokens.is_some() {
        warnings.push("both max_tokens and max_completion_tokens set; using max_completion_tokens".to_owned());
    }

    let max_output_tokens = body.max_completion_tokens.or(body.max_tokens);

    let stop = match &body.stop {
        Some(plexus_protocol::openai::types::StopConfiguration::Single(s)) => Some(vec![s.clone()]),
        Some(plexus_protocol::openai::types::StopConfiguration::Many(v)) => Some(v.clone()),
        None => None,
    };

    UnifiedRequest {
        model: body.model.clone(),
        messages,
        tools: body.tools.as_ref().map(|tools| {
            tools
                .iter()
                .map(|t| plexus_protocol::ToolDefinition {
                    name: t.function.name.clone(),
                    description: t.function.description.clone(),
                    parameters: t.function.parameters.clone().unwrap_or(serde_json::Value::Null),
                })
                .collect()
        }),
        tool_choice: body.tool_choice.as_ref().map(|tc| match tc {
            plexus_protocol::openai::types::ToolChoiceOption::Mode(m) => {
                plexus_protocol::ToolChoice::Mode(m.clone())
            }
            plexus_protocol::openai::types::ToolChoiceOption::Named { function, .. } => {
                plexus_protocol::ToolChoice::Named { name: function.name.clone() }
            }
        }),
        sampling: SamplingParams {
            temperature: body.temperature,
            top_p: body.top_p,
            top_k: None,
            presence_penalty: body.presence_penalty,
            frequency_penalty: body.frequency_penalty,
            seed: body.seed,
            max_output_tokens,
            stop,
        },
        stream: body.stream.unwrap_or(false),
        metadata: Default::default(),
        warnings,
    }
}

/// Converts an Anthropic messages request body into the unified shape,
/// folding the top-level `system` field back into a synthetic system-role
/// message the way every other provider expects it.
pub fn from_anthropic(body: &MessagesRequestBody) -> UnifiedRequest {
    let mut warnings = Vec::new();
    let mut messages = Vec::new();

    if let Some(system) = &body.system {
        messages.push(UnifiedMessage {
            role: UnifiedRole::System,
            content: MessageContent::Text(system.clone()),
            tool_call_id: None,
            tool_calls: Vec::new(),
        });
    }

    for m in &body.messages {
        let role = match m.role {
            AnthropicRole::User => UnifiedRole::User,
            AnthropicRole::Assistant => UnifiedRole::Assistant,
        };
        let content = match &m.content {
            MessageBody::Text(s) => MessageContent::Text(s.clone()),
            MessageBody::Blocks(blocks) => MessageContent::Parts(
                blocks
                    .iter()
                    .map(|b| match b {
                        plexus_protocol::anthropic::types::ContentBlock::Text { text } => {
                            ContentPart::Text { text: text.clone() }
                        }
                        plexus_protocol::anthropic::types::ContentBlock::ToolUse { id, name, input } => {
                            ContentPart::ToolUse { id: id.clone(), name: name.clone(), input: input.clone() }
                        }
                        plexus_protocol::anthropic::types::ContentBlock::ToolResult { tool_use_id, content } => {
                            ContentPart::ToolResult { tool_use_id: tool_use_id.clone(), content: content.clone() }
                        }
                    })
                    .collect(),
            ),
        };
        messages.push(UnifiedMessage { role, content, tool_call_id: None, tool_calls: Vec::new() });
    }

    if body.top_k.is_some() {
        warnings.push("top_k is not representable on every target provider".to_owned());
    }

    UnifiedRequest {
        model: body.model.clone(),
        messages,
        tools: body.tools.as_ref().map(|tools| {
            tools
                .iter()
                .map(|t| plexus_protocol::ToolDefinition {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.input_schema.clone(),
                })
                .collect()
        }),
        tool_choice: None,
        sampling: SamplingParams {
            temperature: body.temperature,
            top_p: body.top_p,
            top_k: body.top_k,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
            max_output_tokens: Some(body.max_tokens),
            stop: body.stop_sequences.clone(),
        },
        stream: body.stream.unwrap_or(false),
        metadata: Default::default(),
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_protocol::openai::types::ChatMessage;

    #[test]
    fn empty_messages_round_trip_without_panicking() {
        let body = ChatCompletionRequestBody {
            messages: vec![],
            model: "fast".into(),
            stream: None,
            temperature: None,
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
            max_tokens: None,
            max_completion_tokens: None,
            stop: None,
            tools: None,
            tool_choice: None,
            user: None,
        };
        let unified = from_openai(&body);
        assert!(unified.messages.is_empty());
    }

    #[test]
    fn system_prompt_is_folded_into_messages() {
        let body = MessagesRequestBody {
            model: "fast".into(),
            messages: vec![],
            system: Some("be nice".into()),
            max_tokens: 100,
            temperature: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            stream: None,
            tools: None,
        };
        let unified = from_anthropic(&body);
        assert_eq!(unified.messages.len(), 1);
        assert_eq!(unified.messages[0].role, UnifiedRole::System);
    }

    #[test]
    fn basic_user_message_converts() {
        let body = ChatCompletionRequestBody {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: Some(serde_json::Value::String("hi".into())),
                name: None,
                tool_call_id: None,
                tool_calls: vec![],
            }],
            model: "fast".into(),
            stream: None,
            temperature: None,
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
            max_tokens: None,
            max_completion_tokens: None,
            stop: None,
            tools: None,
            tool_choice: None,
            user: None,
        };
        let unified = from_openai(&body);
        assert_eq!(unified.messages[0].content.as_text(), "hi");
    }
}
