use plexus_protocol::{FinishReason, UnifiedChunk};
use plexus_protocol::sse::SseParser;

use crate::stream::decode::ChunkDecoder;

/// Outcome of feeding one batch of provider bytes through the sanitizer.
pub struct SanitizeOutput {
    pub chunks: Vec<UnifiedChunk>,
    /// Once true, no further bytes should be read from the upstream
    /// response: either `[DONE]` was observed or a `data: null` rewrite
    /// synthesized the terminal chunk.
    pub done: bool,
}

/// Sits between the raw provider byte stream and `StreamTap`. Line-splits on
/// `\n`/`\r\n` (via `SseParser`), rewrites `data: null` into a synthetic stop
/// chunk followed by `[DONE]`, and tracks the most recently seen
/// `id`/`model`/`created` so that synthetic chunk is faithful to the stream
/// it is ending.
pub struct StreamSanitizer<D: ChunkDecoder> {
    parser: SseParser,
    decoder: D,
    last_id: Option<String>,
    last_model: Option<String>,
    last_created: Option<i64>,
    done: bool,
}

impl<D: ChunkDecoder> StreamSanitizer<D> {
    pub fn new(decoder: D) -> Self {
        Self {
            parser: SseParser::new(),
            decoder,
            last_id: None,
            last_model: None,
            last_created: None,
            done: false,
        }
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) -> SanitizeOutput {
        let text = String::from_utf8_lossy(bytes);
        let events = self.parser.push_str(&text);
        self.process(events)
    }

    pub fn finish(&mut self) -> SanitizeOutput {
        let events = self.parser.finish();
        self.process(events)
    }

    fn process(&mut self, events: Vec<plexus_protocol::SseEvent>) -> SanitizeOutput {
        let mut chunks = Vec::new();

        for event in events {
            if self.done {
                break;
            }

            let data = event.data.trim();
            if data == "[DONE]" {
                self.done = true;
                break;
            }
            if data == "null" {
                chunks.push(UnifiedChunk {
                    delta: String::new(),
                    tool_call_deltas: Vec::new(),
                    finish_reason: Some(FinishReason::Stop),
                    usage: None,
                    id: self.last_id.clone(),
                    model: self.last_model.clone(),
                    created: self.last_created,
                });
                self.done = true;
                break;
            }

            let Some(raw) = self.decoder.decode(data) else {
                continue;
            };

            if raw.id.is_some() {
                self.last_id = raw.id.clone();
            }
            if raw.model.is_some() {
                self.last_model = raw.model.clone();
            }
            if raw.created.is_some() {
                self.last_created = raw.created;
            }

            chunks.push(UnifiedChunk {
                delta: raw.delta_text,
                tool_call_deltas: Vec::new(),
                finish_reason: raw.finish_reason,
                usage: raw.usage,
                id: self.last_id.clone(),
                model: self.last_model.clone(),
                created: self.last_created,
            });
        }

        SanitizeOutput { chunks, done: self.done }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::decode::OpenAiChunkDecoder;

    #[test]
    fn data_null_rewrites_to_synthetic_stop_chunk_and_terminates() {
        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let first = sanitizer.push_bytes(
            b"data: {\"id\":\"X\",\"model\":\"m\",\"created\":1,\"choices\":[{\"delta\":{\"content\":\"hi\"}}]}\n\n",
        );
        assert_eq!(first.chunks.len(), 1);
        assert_eq!(first.chunks[0].delta, "hi");
        assert!(!first.done);

        let second = sanitizer.push_bytes(b"data: null\n\n");
        assert_eq!(second.chunks.len(), 1);
        let stop = &second.chunks[0];
        assert_eq!(stop.finish_reason, Some(FinishReason::Stop));
        assert_eq!(stop.id.as_deref(), Some("X"));
        assert_eq!(stop.model.as_deref(), Some("m"));
        assert_eq!(stop.created, Some(1));
        assert!(second.done);
    }

    #[test]
    fn done_marker_terminates_without_emitting_a_content_chunk() {
        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let output = sanitizer.push_bytes(b"data: [DONE]\n\n");
        assert!(output.chunks.is_empty());
        assert!(output.done);
    }

    #[test]
    fn stream_of_only_done_yields_zero_content_chunks() {
        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let output = sanitizer.push_bytes(b"data: [DONE]\n\n");
        assert_eq!(output.chunks.len(), 0);
    }

    #[test]
    fn byte_exact_passthrough_when_stream_is_well_formed() {
        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let output = sanitizer.push_bytes(
            b"data: {\"id\":\"X\",\"model\":\"m\",\"created\":1,\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\n\ndata: {\"id\":\"X\",\"model\":\"m\",\"created\":1,\"choices\":[{\"delta\":{\"content\":\"b\"}}]}\n\n",
        );
        let joined: String = output.chunks.iter().map(|c| c.delta.clone()).collect();
        assert_eq!(joined, "ab");
    }
}
