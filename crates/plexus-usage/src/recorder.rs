use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self as tokio_time, MissedTickBehavior};
use tracing::warn;

use crate::store::UsageStore;
use crate::trace::{TraceEntry, TraceStatus};

#[derive(Debug, Clone)]
pub struct RecorderConfig {
    pub channel_capacity: usize,
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self { channel_capacity: 4096, batch_size: 100, flush_interval: Duration::from_millis(200) }
    }
}

/// Bounded holding area between `record` and the writer task. On overflow,
/// the oldest entry whose status isn't `Ok` is evicted to make room first —
/// a success record already sitting in the queue, or the success record
/// currently being admitted, is never the one dropped unless the queue is
/// entirely full of successes already.
struct Queue {
    entries: Mutex<VecDeque<TraceEntry>>,
    capacity: usize,
}

impl Queue {
    fn new(capacity: usize) -> Self {
        Self { entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))), capacity }
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns `false` when `entry` itself had to be dropped instead of
    /// admitted.
    fn push(&self, entry: TraceEntry) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() < self.capacity {
            entries.push_back(entry);
            return true;
        }
        if let Some(pos) = entries.iter().position(|e| e.status != TraceStatus::Ok) {
            entries.remove(pos);
            entries.push_back(entry);
            return true;
        }
        if entry.status != TraceStatus::Ok {
            return false;
        }
        entries.pop_front();
        entries.push_back(entry);
        true
    }

    fn drain(&self, limit: Option<usize>) -> Vec<TraceEntry> {
        let mut entries = self.entries.lock().unwrap();
        let n = limit.unwrap_or(entries.len()).min(entries.len());
        entries.drain(..n).collect()
    }
}

/// Fans completed traces out to every configured store in one background
/// task, batching writes so recording a trace never waits on disk or any
/// other I/O. `record` is fire-and-forget: a full queue evicts an older
/// error record to make room, or drops the incoming trace if nothing safe
/// to evict remains.
pub struct UsageRecorder {
    queue: Arc<Queue>,
    wake_tx: mpsc::Sender<()>,
    _handle: JoinHandle<()>,
}

impl UsageRecorder {
    pub fn spawn(stores: Vec<Arc<dyn UsageStore>>, config: RecorderConfig) -> Self {
        let queue = Arc::new(Queue::new(config.channel_capacity));
        let (wake_tx, wake_rx) = mpsc::channel(1);
        let handle =
            tokio::spawn(writer_loop(stores, queue.clone(), wake_rx, config.batch_size, config.flush_interval));
        Self { queue, wake_tx, _handle: handle }
    }

    pub fn record(&self, entry: TraceEntry) {
        let status = entry.status;
        if !self.queue.push(entry) {
            warn!(?status, "usage recorder queue full, dropping trace");
            return;
        }
        let _ = self.wake_tx.try_send(());
    }
}

async fn writer_loop(
    stores: Vec<Arc<dyn UsageStore>>,
    queue: Arc<Queue>,
    mut wake_rx: mpsc::Receiver<()>,
    batch_size: usize,
    flush_interval: Duration,
) {
    let mut ticker = tokio_time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            woken = wake_rx.recv() => {
                match woken {
                    Some(()) => {
                        if queue.len() >= batch_size {
                            let mut buffer = queue.drain(Some(batch_size));
                            flush(&stores, &mut buffer);
                        }
                    }
                    None => {
                        let mut buffer = queue.drain(None);
                        if !buffer.is_empty() {
                            flush(&stores, &mut buffer);
                        }
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let mut buffer = queue.drain(None);
                if !buffer.is_empty() {
                    flush(&stores, &mut buffer);
                }
            }
        }
    }
}

fn flush(stores: &[Arc<dyn UsageStore>], buffer: &mut Vec<TraceEntry>) {
    for store in stores {
        if let Err(err) = store.write_batch(buffer) {
            warn!(%err, "usage store write failed");
        }
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryUsageStore;
    use crate::trace::TraceStatus;
    use plexus_common::{AliasId, ProviderId, RequestId};

    fn sample(id: &str) -> TraceEntry {
        TraceEntry {
            request_id: RequestId::from(id),
            alias_id: AliasId::from("alias-1"),
            provider_id: ProviderId::from("prov-1"),
            model: "gpt-test".to_owned(),
            started_at_unix_ms: 0,
            duration_ms: 50,
            provider_ttft_ms: Some(10),
            input_tokens: 1,
            output_tokens: 1,
            reasoning_tokens: 0,
            total_tokens: 2,
            tokens_per_second: None,
            cost_usd: None,
            status: TraceStatus::Ok,
            error_message: None,
        }
    }

    fn sample_with_status(id: &str, status: TraceStatus) -> TraceEntry {
        TraceEntry { status, ..sample(id) }
    }

    #[tokio::test]
    async fn batched_entries_reach_the_store_on_the_timer() {
        let store: Arc<InMemoryUsageStore> = Arc::new(InMemoryUsageStore::new(10));
        let recorder = UsageRecorder::spawn(
            vec![store.clone() as Arc<dyn UsageStore>],
            RecorderConfig { channel_capacity: 16, batch_size: 100, flush_interval: Duration::from_millis(20) },
        );

        recorder.record(sample("req-1"));
        recorder.record(sample("req-2"));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn batch_size_threshold_flushes_without_waiting_for_the_timer() {
        let store: Arc<InMemoryUsageStore> = Arc::new(InMemoryUsageStore::new(10));
        let recorder = UsageRecorder::spawn(
            vec![store.clone() as Arc<dyn UsageStore>],
            RecorderConfig { channel_capacity: 16, batch_size: 2, flush_interval: Duration::from_secs(60) },
        );

        recorder.record(sample("req-1"));
        recorder.record(sample("req-2"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn overflow_evicts_the_oldest_error_before_a_success() {
        let queue = Queue::new(2);
        assert!(queue.push(sample_with_status("req-1", TraceStatus::UpstreamError)));
        assert!(queue.push(sample_with_status("req-2", TraceStatus::Ok)));
        assert!(queue.push(sample_with_status("req-3", TraceStatus::Ok)));

        let drained = queue.drain(None);
        let ids: Vec<_> = drained.iter().map(|e| e.request_id.as_str().to_owned()).collect();
        assert_eq!(ids, vec!["req-2", "req-3"]);
    }

    #[test]
    fn overflow_drops_the_incoming_error_when_queue_is_full_of_successes() {
        let queue = Queue::new(1);
        assert!(queue.push(sample_with_status("req-1", TraceStatus::Ok)));
        assert!(!queue.push(sample_with_status("req-2", TraceStatus::UpstreamError)));

        let drained = queue.drain(None);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].request_id.as_str(), "req-1");
    }
}
