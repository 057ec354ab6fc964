use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use plexus_protocol::anthropic::stream::{ContentDelta, MessageDeltaPayload, MessageStartPayload, MessagesStreamEvent};
use plexus_protocol::anthropic::types::Usage as AnthropicUsage;
use plexus_protocol::{FinishReason, UnifiedUsage};
use plexus_provider::ProviderError;
use plexus_stream::TapCause;
use plexus_transform::stream::render::{render_done_marker, render_openai_sse};
use plexus_transform::stream::{OpenAiChunkDecoder, StreamSanitizer};
use plexus_usage::TraceStatus;
use tokio::sync::{mpsc, oneshot};

/// How the render loop stopped consuming the tapped provider stream.
/// Distinguishes "we intentionally stopped because the decoder signaled
/// completion" from "the real client went away", since both look the same
/// from the tap's point of view (its downstream receiver just stops being
/// read).
enum LoopEnd {
    /// The client-facing channel's `send` failed: the HTTP client
    /// disconnected mid-stream.
    ClientCancelled,
    /// The sanitizer observed a provider-native completion marker.
    NormalDone,
    /// The tapped stream ran out on its own (upstream ended or errored).
    StreamEnded,
}

/// Usage, time-to-first-byte, and outcome for a finished stream, handed back
/// once the render loop stops.
pub struct RenderedFinal {
    pub usage: Option<UnifiedUsage>,
    pub provider_ttft_ms: Option<u64>,
    pub status: TraceStatus,
}

/// Result of sanitizing and rendering a provider stream into client-facing
/// SSE bytes: the byte channel the HTTP body reads from, and the final
/// outcome once the provider stream ends or the client disconnects.
pub struct RenderedStream {
    pub rx: mpsc::Receiver<Bytes>,
    pub done: oneshot::Receiver<RenderedFinal>,
}

fn derive_status(loop_end: LoopEnd, tap_cause: Option<TapCause>) -> TraceStatus {
    match loop_end {
        LoopEnd::ClientCancelled => TraceStatus::ClientCancelled,
        LoopEnd::NormalDone => TraceStatus::Ok,
        LoopEnd::StreamEnded => match tap_cause {
            Some(TapCause::UpstreamError) => TraceStatus::UpstreamError,
            Some(TapCause::ClientCancelled) => TraceStatus::ClientCancelled,
            Some(TapCause::Completed) | None => TraceStatus::Ok,
        },
    }
}

fn derive_ttft_ms(first_token_unix_ms: Option<i64>, started_at_unix_ms: i64) -> Option<u64> {
    first_token_unix_ms.map(|first| first.saturating_sub(started_at_unix_ms).max(0) as u64)
}

/// Decodes an OpenAI-chunk-shaped provider stream and re-renders it as the
/// `/v1/chat/completions` SSE the client expects, regardless of which
/// provider actually produced the bytes.
pub fn spawn_openai_sse<S>(upstream: S, started_at_unix_ms: i64) -> RenderedStream
where
    S: Stream<Item = Result<Bytes, ProviderError>> + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let tapped = upstream.map(|item| item.map_err(|err| err.to_string()));
        let (mut tap_rx, tap_done) =
            plexus_stream::spawn(tapped, plexus_stream::TapConfig::default(), started_at_unix_ms);

        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let mut last_usage = None;
        let mut loop_end = LoopEnd::StreamEnded;

        'outer: while let Some(bytes) = tap_rx.recv().await {
            let out = sanitizer.push_bytes(&bytes);
            for chunk in &out.chunks {
                if chunk.usage.is_some() {
                    last_usage = chunk.usage;
                }
                if tx.send(Bytes::from(render_openai_sse(chunk))).await.is_err() {
                    loop_end = LoopEnd::ClientCancelled;
                    break 'outer;
                }
            }
            if out.done {
                loop_end = LoopEnd::NormalDone;
                break;
            }
        }

        if !matches!(loop_end, LoopEnd::ClientCancelled) {
            let out = sanitizer.finish();
            for chunk in &out.chunks {
                if chunk.usage.is_some() {
                    last_usage = chunk.usage;
                }
                let _ = tx.send(Bytes::from(render_openai_sse(chunk))).await;
            }
            let _ = tx.send(Bytes::from_static(render_done_marker().as_bytes())).await;
        }

        let tap_final = tap_done.await.ok();
        let status = derive_status(loop_end, tap_final.as_ref().map(|f| f.cause));
        let provider_ttft_ms = derive_ttft_ms(
            tap_final.as_ref().and_then(|f| f.provider_first_token_unix_ms),
            started_at_unix_ms,
        );

        let _ = done_tx.send(RenderedFinal { usage: last_usage, provider_ttft_ms, status });
    });

    RenderedStream { rx, done: done_rx }
}

/// Same sanitize/render job as [`spawn_openai_sse`], but brackets the
/// content deltas in the Anthropic `message_start` / `message_delta` /
/// `message_stop` event sequence clients of `/v1/messages` expect.
pub fn spawn_anthropic_sse<S>(
    upstream: S,
    model: String,
    message_id: String,
    started_at_unix_ms: i64,
) -> RenderedStream
where
    S: Stream<Item = Result<Bytes, ProviderError>> + Send + Unpin + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    let (done_tx, done_rx) = oneshot::channel();

    tokio::spawn(async move {
        let start = MessagesStreamEvent::MessageStart {
            message: MessageStartPayload {
                id: message_id,
                kind: "message".to_owned(),
                role: "assistant".to_owned(),
                model,
                content: Vec::new(),
                usage: AnthropicUsage::default(),
            },
        };
        if tx.send(sse_frame(&start)).await.is_err() {
            let _ = done_tx.send(RenderedFinal {
                usage: None,
                provider_ttft_ms: None,
                status: TraceStatus::ClientCancelled,
            });
            return;
        }
        let block_start = MessagesStreamEvent::ContentBlockStart {
            index: 0,
            content_block: serde_json::json!({ "type": "text", "text": "" }),
        };
        if tx.send(sse_frame(&block_start)).await.is_err() {
            let _ = done_tx.send(RenderedFinal {
                usage: None,
                provider_ttft_ms: None,
                status: TraceStatus::ClientCancelled,
            });
            return;
        }

        let tapped = upstream.map(|item| item.map_err(|err| err.to_string()));
        let (mut tap_rx, tap_done) =
            plexus_stream::spawn(tapped, plexus_stream::TapConfig::default(), started_at_unix_ms);

        let mut sanitizer = StreamSanitizer::new(OpenAiChunkDecoder);
        let mut last_usage: Option<UnifiedUsage> = None;
        let mut finish_reason = None;
        let mut loop_end = LoopEnd::StreamEnded;

        'outer: while let Some(bytes) = tap_rx.recv().await {
            let out = sanitizer.push_bytes(&bytes);
            for chunk in &out.chunks {
                if chunk.usage.is_some() {
                    last_usage = chunk.usage;
                }
                if chunk.finish_reason.is_some() {
                    finish_reason = chunk.finish_reason;
                }
                if !chunk.delta.is_empty() {
                    let event = MessagesStreamEvent::ContentBlockDelta {
                        index: 0,
                        delta: ContentDelta::TextDelta { text: chunk.delta.clone() },
                    };
                    if tx.send(sse_frame(&event)).await.is_err() {
                        loop_end = LoopEnd::ClientCancelled;
                        break 'outer;
                    }
                }
            }
            if out.done {
                loop_end = LoopEnd::NormalDone;
                break;
            }
        }

        if !matches!(loop_end, LoopEnd::ClientCancelled) {
            let out = sanitizer.finish();
            for chunk in &out.chunks {
                if chunk.usage.is_some() {
                    last_usage = chunk.usage;
                }
                if chunk.finish_reason.is_some() {
                    finish_reason = chunk.finish_reason;
                }
            }

            let block_stop = MessagesStreamEvent::ContentBlockStop { index: 0 };
            let _ = tx.send(sse_frame(&block_stop)).await;

            let usage = last_usage.unwrap_or_default();
            let delta = MessagesStreamEvent::MessageDelta {
                delta: MessageDeltaPayload { stop_reason: Some(anthropic_stop_reason(finish_reason)) },
                usage: AnthropicUsage {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                    cache_creation_input_tokens: None,
                    cache_read_input_tokens: usage.cached_tokens,
                },
            };
            let _ = tx.send(sse_frame(&delta)).await;
            let _ = tx.send(sse_frame(&MessagesStreamEvent::MessageStop)).await;
        }

        let tap_final = tap_done.await.ok();
        let status = derive_status(loop_end, tap_final.as_ref().map(|f| f.cause));
        let provider_ttft_ms = derive_ttft_ms(
            tap_final.as_ref().and_then(|f| f.provider_first_token_unix_ms),
            started_at_unix_ms,
        );

        let _ = done_tx.send(RenderedFinal { usage: last_usage, provider_ttft_ms, status });
    });

    RenderedStream { rx, done: done_rx }
}

fn sse_frame(event: &MessagesStreamEvent) -> Bytes {
    let data = serde_json::to_string(event).unwrap_or_default();
    Bytes::from(format!("event: {}\ndata: {}\n\n", event.event_name(), data))
}

fn anthropic_stop_reason(reason: Option<FinishReason>) -> String {
    match reason {
        Some(FinishReason::Length) => "max_tokens",
        Some(FinishReason::ToolCalls) => "tool_use",
        _ => "end_turn",
    }
    .to_owned()
}
