pub mod decode;
pub mod render;
pub mod sanitizer;

use plexus_config::ProviderType;

pub use decode::{ChunkDecoder, GeminiEnvelopeDecoder, OpenAiChunkDecoder, RawChunk};
pub use sanitizer::{SanitizeOutput, StreamSanitizer};

/// A provider stream is either OpenAI-chunk-shaped or the Gemini/Antigravity
/// envelope shape; Anthropic's own SSE event names are handled upstream of
/// this module since they carry structural events (`message_start`, ...)
/// the OpenAI-style sanitizer pipeline doesn't model.
pub enum WireShape {
    OpenAiChunks,
    GeminiEnvelope,
}

pub fn wire_shape_for(provider_type: ProviderType) -> WireShape {
    match provider_type {
        ProviderType::Openai | ProviderType::Openrouter | ProviderType::OpenaiCompatible => {
            WireShape::OpenAiChunks
        }
        ProviderType::Anthropic => WireShape::OpenAiChunks,
    }
}
