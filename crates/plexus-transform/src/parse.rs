use plexus_config::ProviderType;
use plexus_protocol::{FinishReason, UnifiedResponse, UnifiedUsage};
use serde_json::Value as JsonValue;

pub fn parse_provider_response(body: &JsonValue, provider_type: ProviderType) -> UnifiedResponse {
    match provider_type {
        ProviderType::Anthropic => parse_anthropic(body),
        ProviderType::Openai | ProviderType::Openrouter | ProviderType::OpenaiCompatible => {
            parse_openai_chat(body)
        }
    }
}

fn parse_openai_chat(body: &JsonValue) -> UnifiedResponse {
    let choice = &body["choices"][0];
    let content = choice["message"]["content"].as_str().unwrap_or_default().to_owned();
    let finish_reason = match choice["finish_reason"].as_str() {
        Some("length") => FinishReason::Length,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    };
    let usage = &body["usage"];
    UnifiedResponse {
        content,
        tool_calls: Vec::new(),
        usage: UnifiedUsage {
            input_tokens: usage["prompt_tokens"].as_i64().unwrap_or(0),
            output_tokens: usage["completion_tokens"].as_i64().unwrap_or(0),
            cached_tokens: usage["prompt_tokens_details"]["cached_tokens"].as_i64(),
            reasoning_tokens: usage["completion_tokens_details"]["reasoning_tokens"].as_i64(),
            total_tokens: usage["total_tokens"].as_i64().unwrap_or(0),
        },
        finish_reason,
    }
}

fn parse_anthropic(body: &JsonValue) -> UnifiedResponse {
    let content = body["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    let finish_reason = match body["stop_reason"].as_str() {
        Some("max_tokens") => FinishReason::Length,
        Some("tool_use") => FinishReason::ToolCalls,
        _ => FinishReason::Stop,
    };
    let usage = &body["usage"];
    let input = usage["input_tokens"].as_i64().unwrap_or(0);
    let output = usage["output_tokens"].as_i64().unwrap_or(0);
    UnifiedResponse {
        content,
        tool_calls: Vec::new(),
        usage: UnifiedUsage {
            input_tokens: input,
            output_tokens: output,
            cached_tokens: usage["cache_read_input_tokens"].as_i64(),
            reasoning_tokens: None,
            total_tokens: input + output,
        },
        finish_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_openai_usage_and_content() {
        let body = json!({
            "choices": [{ "message": { "content": "hi" }, "finish_reason": "stop" }],
            "usage": { "prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5 },
        });
        let parsed = parse_openai_chat(&body);
        assert_eq!(parsed.content, "hi");
        assert_eq!(parsed.usage.total_tokens, 5);
    }

    #[test]
    fn parses_anthropic_content_blocks() {
        let body = json!({
            "content": [{ "type": "text", "text": "hi" }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 7, "output_tokens": 4 },
        });
        let parsed = parse_anthropic(&body);
        assert_eq!(parsed.content, "hi");
        assert_eq!(parsed.usage.total_tokens, 11);
    }
}
