//! Wire formats for the client-facing APIs, the unified internal request and
//! response shapes, and the SSE line parser shared by every stream adapter.

pub mod anthropic;
pub mod openai;
pub mod sse;
pub mod unified;

pub use sse::{SseEvent, SseParser};
pub use unified::{
    ContentPart, FinishReason, MessageContent, SamplingParams, ToolCall, ToolChoice,
    ToolDefinition, UnifiedChunk, UnifiedMessage, UnifiedRequest, UnifiedResponse, UnifiedRole,
    UnifiedUsage,
};
