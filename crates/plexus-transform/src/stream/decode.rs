use plexus_protocol::{FinishReason, UnifiedUsage};
use serde_json::Value as JsonValue;

/// A single decoded provider chunk, independent of wire shape.
#[derive(Debug, Clone, Default)]
pub struct RawChunk {
    pub id: Option<String>,
    pub model: Option<String>,
    pub created: Option<i64>,
    pub delta_text: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<UnifiedUsage>,
}

/// Decodes one `data:` payload (already isolated from the `[DONE]`/`null`
/// sentinels, which the sanitizer handles itself) into a `RawChunk`.
/// Implementations never see malformed JSON survive past `decode` — an
/// unparseable line decodes to `None` and is dropped.
pub trait ChunkDecoder: Send + Sync {
    fn decode(&self, data: &str) -> Option<RawChunk>;
}

/// OpenAI chat-completions streaming chunk shape.
pub struct OpenAiChunkDecoder;

impl ChunkDecoder for OpenAiChunkDecoder {
    fn decode(&self, data: &str) -> Option<RawChunk> {
        let value: JsonValue = serde_json::from_str(data).ok()?;
        let choice = &value["choices"][0];
        let delta_text = choice["delta"]["content"].as_str().unwrap_or_default().to_owned();
        let finish_reason = match choice["finish_reason"].as_str() {
            Some("stop") => Some(FinishReason::Stop),
            Some("length") => Some(FinishReason::Length),
            Some("tool_calls") => Some(FinishReason::ToolCalls),
            Some("content_filter") => Some(FinishReason::ContentFilter),
            _ => None,
        };
        let usage = if value["usage"].is_object() {
            Some(UnifiedUsage {
                input_tokens: value["usage"]["prompt_tokens"].as_i64().unwrap_or(0),
                output_tokens: value["usage"]["completion_tokens"].as_i64().unwrap_or(0),
                cached_tokens: value["usage"]["prompt_tokens_details"]["cached_tokens"].as_i64(),
                reasoning_tokens: value["usage"]["completion_tokens_details"]["reasoning_tokens"].as_i64(),
                total_tokens: value["usage"]["total_tokens"].as_i64().unwrap_or(0),
            })
        } else {
            None
        };

        Some(RawChunk {
            id: value["id"].as_str().map(String::from),
            model: value["model"].as_str().map(String::from),
            created: value["created"].as_i64(),
            delta_text,
            finish_reason,
            usage,
        })
    }
}

/// Gemini-family streaming shape, optionally wrapped in the "Antigravity"
/// envelope `{"response": <geminiChunk>}`, which is unwrapped transparently.
/// `thoughtsTokenCount` maps to `reasoningTokens`.
pub struct GeminiEnvelopeDecoder;

impl ChunkDecoder for GeminiEnvelopeDecoder {
    fn decode(&self, data: &str) -> Option<RawChunk> {
        let outer: JsonValue = serde_json::from_str(data).ok()?;
        let value = if outer.get("response").is_some() { &outer["response"] } else { &outer };

        let candidate = &value["candidates"][0];
        let delta_text = candidate["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts.iter().filter_map(|p| p["text"].as_str()).collect::<Vec<_>>().join("")
            })
            .unwrap_or_default();

        let finish_reason = match candidate["finishReason"].as_str() {
            Some("STOP") => Some(FinishReason::Stop),
            Some("MAX_TOKENS") => Some(FinishReason::Length),
            Some(_) => Some(FinishReason::Stop),
            None => None,
        };

        let usage_meta = &value["usageMetadata"];
        let usage = if usage_meta.is_object() {
            let prompt = usage_meta["promptTokenCount"].as_i64().unwrap_or(0);
            let candidates = usage_meta["candidatesTokenCount"].as_i64().unwrap_or(0);
            let total = usage_meta["totalTokenCount"].as_i64().unwrap_or(prompt + candidates);
            Some(UnifiedUsage {
                input_tokens: prompt,
                output_tokens: candidates,
                cached_tokens: None,
                reasoning_tokens: usage_meta["thoughtsTokenCount"].as_i64(),
                total_tokens: total,
            })
        } else {
            None
        };

        Some(RawChunk {
            id: None,
            model: value["modelVersion"].as_str().map(String::from),
            created: None,
            delta_text,
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_envelope_maps_thoughts_token_count_to_reasoning_tokens() {
        let decoder = GeminiEnvelopeDecoder;
        let data = serde_json::json!({
            "response": {
                "candidates": [{ "content": { "parts": [{ "text": "hi" }] }, "finishReason": "STOP" }],
                "usageMetadata": {
                    "thoughtsTokenCount": 789,
                    "candidatesTokenCount": 1405,
                    "promptTokenCount": 7,
                    "totalTokenCount": 2201,
                },
            }
        })
        .to_string();

        let chunk = decoder.decode(&data).unwrap();
        let usage = chunk.usage.unwrap();
        assert_eq!(usage.reasoning_tokens, Some(789));
        assert_eq!(usage.output_tokens, 1405);
        assert_eq!(usage.input_tokens, 7);
        assert_eq!(usage.total_tokens, 2201);
    }
}
