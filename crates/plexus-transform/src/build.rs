use plexus_config::ProviderType;
use plexus_protocol::{MessageContent, UnifiedRequest, UnifiedRole};
use serde_json::{json, Value as JsonValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetApiType {
    OpenaiChat,
    AnthropicMessages,
}

pub struct ProviderRequest {
    pub endpoint: String,
    pub body: JsonValue,
}

/// Builds the provider-native request body and picks the endpoint path for
/// the given provider type. OpenAI, OpenRouter, and arbitrary
/// OpenAI-compatible endpoints all speak the same chat-completions shape;
/// only Anthropic needs its own body shape.
pub fn build_provider_request(unified: &UnifiedRequest, provider_type: ProviderType) -> ProviderRequest {
    match provider_type {
        ProviderType::Anthropic => build_anthropic(unified),
        ProviderType::Openai | ProviderType::Openrouter | ProviderType::OpenaiCompatible => {
            build_openai_chat(unified)
        }
    }
}

fn build_openai_chat(unified: &UnifiedRequest) -> ProviderRequest {
    let messages: Vec<JsonValue> = unified
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                UnifiedRole::System => "system",
                UnifiedRole::User => "user",
                UnifiedRole::Assistant => "assistant",
                UnifiedRole::Tool => "tool",
            };
            json!({ "role": role, "content": m.content.as_text() })
        })
        .collect();

    let mut body = json!({
        "model": unified.model,
        "messages": messages,
        "stream": unified.stream,
    });
    let obj = body.as_object_mut().unwrap();
    if let Some(t) = unified.sampling.temperature {
        obj.insert("temperature".into(), json!(t));
    }
    if let Some(p) = unified.sampling.top_p {
        obj.insert("top_p".into(), json!(p));
    }
    if let Some(tokens) = unified.sampling.max_output_tokens {
        obj.insert("max_tokens".into(), json!(tokens));
    }
    if let Some(stop) = &unified.sampling.stop {
        obj.insert("stop".into(), json!(stop));
    }
    if let Some(tools) = &unified.tools {
        obj.insert(
            "tools".into(),
            json!(
                tools
                    .iter()
                    .map(|t| json!({
                        "type": "function",
                        "function": { "name": t.name, "description": t.description, "parameters": t.parameters },
                    }))
                    .collect::<Vec<_>>()
            ),
        );
    }

    ProviderRequest { endpoint: "/v1/chat/completions".to_owned(), body }
}

fn build_anthropic(unified: &UnifiedRequest) -> ProviderRequest {
    let mut system = None;
    let mut messages = Vec::new();
    for m in &unified.messages {
        match m.role {
            UnifiedRole::System => system = Some(m.content.as_text()),
            UnifiedRole::User => messages.push(json!({ "role": "user", "content": m.content.as_text() })),
            UnifiedRole::Assistant => messages.push(json!({ "role": "assistant", "content": m.content.as_text() })),
            UnifiedRole::Tool => {
                if let MessageContent::Text(text) = &m.content {
                    messages.push(json!({
                        "role": "user",
                        "content": [{ "type": "tool_result", "tool_use_id": m.tool_call_id, "content": text }],
                    }));
                }
            }
        }
    }

    let mut body = json!({
        "model": unified.model,
        "messages": messages,
        "max_tokens": unified.sampling.max_output_tokens.unwrap_or(4096),
        "stream": unified.stream,
    });
    let obj = body.as_object_mut().unwrap();
    if let Some(system) = system {
        obj.insert("system".into(), json!(system));
    }
    if let Some(t) = unified.sampling.temperature {
        obj.insert("temperature".into(), json!(t));
    }
    if let Some(stop) = &unified.sampling.stop {
        obj.insert("stop_sequences".into(), json!(stop));
    }

    let endpoint = if unified.stream { "/v1/messages?beta=true" } else { "/v1/messages" };
    ProviderRequest { endpoint: endpoint.to_owned(), body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_protocol::{SamplingParams, UnifiedMessage};

    fn sample_request() -> UnifiedRequest {
        UnifiedRequest {
            model: "fast".into(),
            messages: vec![UnifiedMessage {
                role: UnifiedRole::User,
                content: MessageContent::Text("hi".into()),
                tool_call_id: None,
                tool_calls: vec![],
            }],
            tools: None,
            tool_choice: None,
            sampling: SamplingParams::default(),
            stream: false,
            metadata: Default::default(),
            warnings: vec![],
        }
    }

    #[test]
    fn anthropic_build_moves_system_message_out_of_messages() {
        let mut req = sample_request();
        req.messages.insert(
            0,
            UnifiedMessage {
                role: UnifiedRole::System,
                content: MessageContent::Text("be nice".into()),
                tool_call_id: None,
                tool_calls: vec![],
            },
        );
        let built = build_provider_request(&req, ProviderType::Anthropic);
        assert_eq!(built.body["system"], json!("be nice"));
        assert_eq!(built.body["messages"].as_array().unwrap().len(), 1);
    }
}
