use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone, Copy)]
pub struct TapConfig {
    /// Hard cap on the accumulated-text buffer; on overflow the buffer
    /// ring-rolls (oldest bytes dropped) and `truncated` is set.
    pub max_buffer_bytes: usize,
    pub channel_capacity: usize,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self { max_buffer_bytes: 8 * 1024 * 1024, channel_capacity: 256 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapCause {
    Completed,
    ClientCancelled,
    UpstreamError,
}

#[derive(Debug, Clone)]
pub struct TapFinal {
    pub accumulated_text: String,
    pub truncated: bool,
    /// Write-once: set on the first non-empty chunk observed from the
    /// provider side, never overwritten afterward.
    pub provider_first_token_unix_ms: Option<i64>,
    pub cause: TapCause,
}

/// Spawns a task that reads `upstream` to completion (or cancellation),
/// forwarding every byte to the returned receiver in order while
/// accumulating a bounded text buffer for `UsageRecorder`. Nothing is read
/// from `upstream` until this task starts running, and the caller cannot
/// observe a byte before the client-facing receiver does.
pub fn spawn<S>(
    mut upstream: S,
    config: TapConfig,
    start_unix_ms: i64,
) -> (mpsc::Receiver<Bytes>, oneshot::Receiver<TapFinal>)
where
    S: Stream<Item = Result<Bytes, String>> + Send + Unpin + 'static,
{
    let (client_tx, client_rx) = mpsc::channel(config.channel_capacity);
    let (final_tx, final_rx) = oneshot::channel();

    tokio::spawn(async move {
        let mut accumulated = String::new();
        let mut truncated = false;
        let mut first_token_ms = None;
        let mut cause = TapCause::Completed;

        while let Some(next) = upstream.next().await {
            let chunk = match next {
                Ok(bytes) => bytes,
                Err(_) => {
                    cause = TapCause::UpstreamError;
                    break;
                }
            };

            if client_tx.send(chunk.clone()).await.is_err() {
                cause = TapCause::ClientCancelled;
                break;
            }

            if !chunk.is_empty() {
                if first_token_ms.is_none() {
                    first_token_ms = Some(plexus_common::now_ms());
                }
                let text = String::from_utf8_lossy(&chunk);
                accumulated.push_str(&text);
                if accumulated.len() > config.max_buffer_bytes {
                    let overflow = accumulated.len() - config.max_buffer_bytes;
                    accumulated.drain(..overflow);
                    truncated = true;
                }
            }
        }

        let _ = start_unix_ms;
        let _ = final_tx.send(TapFinal {
            accumulated_text: accumulated,
            truncated,
            provider_first_token_unix_ms: first_token_ms,
            cause,
        });
    });

    (client_rx, final_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[tokio::test]
    async fn forwards_every_chunk_in_order() {
        let chunks: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from_static(b"a")), Ok(Bytes::from_static(b"b"))];
        let (mut rx, done) = spawn(stream::iter(chunks), TapConfig::default(), 0);

        let mut received = Vec::new();
        while let Some(chunk) = rx.recv().await {
            received.push(chunk);
        }
        assert_eq!(received, vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")]);

        let result = done.await.unwrap();
        assert_eq!(result.accumulated_text, "ab");
        assert_eq!(result.cause, TapCause::Completed);
    }

    #[tokio::test]
    async fn first_token_timestamp_is_write_once() {
        let chunks: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from_static(b"a")), Ok(Bytes::from_static(b"b"))];
        let (mut rx, done) = spawn(stream::iter(chunks), TapConfig::default(), 0);
        while rx.recv().await.is_some() {}
        let result = done.await.unwrap();
        assert!(result.provider_first_token_unix_ms.is_some());
    }

    #[tokio::test]
    async fn client_drop_marks_cancelled() {
        let chunks: Vec<Result<Bytes, String>> = vec![
            Ok(Bytes::from_static(b"a")),
            Ok(Bytes::from_static(b"b")),
            Ok(Bytes::from_static(b"c")),
        ];
        let (rx, done) = spawn(stream::iter(chunks), TapConfig { channel_capacity: 0, ..Default::default() }, 0);
        drop(rx);
        let result = done.await.unwrap();
        assert_eq!(result.cause, TapCause::ClientCancelled);
    }

    #[tokio::test]
    async fn overflow_truncates_and_sets_flag() {
        let big = Bytes::from(vec![b'x'; 100]);
        let chunks: Vec<Result<Bytes, String>> = vec![Ok(big)];
        let (mut rx, done) =
            spawn(stream::iter(chunks), TapConfig { max_buffer_bytes: 10, channel_capacity: 4 }, 0);
        while rx.recv().await.is_some() {}
        let result = done.await.unwrap();
        assert!(result.truncated);
        assert_eq!(result.accumulated_text.len(), 10);
    }
}
