use plexus_protocol::openai::stream::{ChatCompletionChunk, ChunkChoice};
use plexus_protocol::openai::types::{Delta, Usage};
use plexus_protocol::UnifiedChunk;

/// Renders a `UnifiedChunk` as the OpenAI `data: {...}` line clients expect
/// on `/v1/chat/completions`. Returns the full SSE frame, including the
/// trailing blank line.
pub fn render_openai_sse(chunk: &UnifiedChunk) -> String {
    let rendered = ChatCompletionChunk {
        id: chunk.id.clone().unwrap_or_default(),
        object: "chat.completion.chunk".to_owned(),
        created: chunk.created.unwrap_or(0),
        model: chunk.model.clone().unwrap_or_default(),
        choices: vec![ChunkChoice {
            index: 0,
            delta: Delta { role: None, content: Some(chunk.delta.clone()), tool_calls: vec![] },
            finish_reason: chunk.finish_reason.map(|f| finish_reason_str(f).to_owned()),
        }],
        usage: chunk.usage.map(|u| Usage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.total_tokens,
            completion_tokens_details: u.reasoning_tokens.map(|r| {
                plexus_protocol::openai::types::CompletionTokensDetails { reasoning_tokens: Some(r) }
            }),
            prompt_tokens_details: u.cached_tokens.map(|c| {
                plexus_protocol::openai::types::PromptTokensDetails { cached_tokens: Some(c) }
            }),
        }),
    };
    format!("data: {}\n\n", rendered.to_sse_data())
}

pub fn render_done_marker() -> &'static str {
    "data: [DONE]\n\n"
}

fn finish_reason_str(reason: plexus_protocol::FinishReason) -> &'static str {
    use plexus_protocol::FinishReason::*;
    match reason {
        Stop => "stop",
        Length => "length",
        ToolCalls => "tool_calls",
        ContentFilter => "content_filter",
        Error => "stop",
    }
}

/// Renders a `UnifiedChunk` as an Anthropic `event:`/`data:` SSE frame.
/// Anthropic multiplexes several event kinds; this renders the
/// `content_block_delta` shape, which is the only one the sanitizer pipeline
/// produces incrementally (the bracketing `message_start`/`message_stop`
/// events are emitted by the caller once per stream, not per chunk).
pub fn render_anthropic_sse(chunk: &UnifiedChunk) -> String {
    use plexus_protocol::anthropic::stream::{ContentDelta, MessagesStreamEvent};

    let event = MessagesStreamEvent::ContentBlockDelta {
        index: 0,
        delta: ContentDelta::TextDelta { text: chunk.delta.clone() },
    };
    let data = serde_json::to_string(&event).unwrap_or_default();
    format!("event: {}\ndata: {}\n\n", event.event_name(), data)
}
