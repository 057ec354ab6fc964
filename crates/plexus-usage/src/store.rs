use std::collections::VecDeque;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::trace::TraceEntry;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A sink a batch of traces is handed to. Implementations never block the
/// caller of `UsageRecorder::record` — they are only ever driven from the
/// recorder's own background task.
pub trait UsageStore: Send + Sync {
    fn write_batch(&self, batch: &[TraceEntry]) -> Result<(), StoreError>;
}

/// Keeps the most recent `capacity` traces in memory, oldest evicted first.
/// Backs `GET /v0/management/performance`.
pub struct InMemoryUsageStore {
    capacity: usize,
    entries: Mutex<VecDeque<TraceEntry>>,
}

impl InMemoryUsageStore {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: Mutex::new(VecDeque::with_capacity(capacity)) }
    }

    pub fn recent(&self, limit: usize) -> Vec<TraceEntry> {
        let entries = self.entries.lock().unwrap();
        entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    /// Drops every entry `predicate` matches, returning how many were removed.
    /// Backs the admin performance endpoint's per-model clear.
    pub fn retain_not_matching(&self, predicate: impl Fn(&TraceEntry) -> bool) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|entry| !predicate(entry));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UsageStore for InMemoryUsageStore {
    fn write_batch(&self, batch: &[TraceEntry]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap();
        for entry in batch {
            if entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(entry.clone());
        }
        Ok(())
    }
}

/// Appends one JSON object per line to a file, flushing after every batch.
/// Intended as the durable side of the dual-write; the in-memory store
/// remains the fast path for the admin performance endpoint.
pub struct JsonlUsageStore {
    path: PathBuf,
}

impl JsonlUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UsageStore for JsonlUsageStore {
    fn write_batch(&self, batch: &[TraceEntry]) -> Result<(), StoreError> {
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&self.path)?;
        for entry in batch {
            let line = serde_json::to_string(entry)?;
            writeln!(file, "{line}")?;
        }
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plexus_common::{AliasId, ProviderId, RequestId};

    fn sample() -> TraceEntry {
        TraceEntry {
            request_id: RequestId::from("req-1"),
            alias_id: AliasId::from("alias-1"),
            provider_id: ProviderId::from("prov-1"),
            model: "gpt-test".to_owned(),
            started_at_unix_ms: 0,
            duration_ms: 100,
            provider_ttft_ms: Some(20),
            input_tokens: 10,
            output_tokens: 5,
            reasoning_tokens: 0,
            total_tokens: 15,
            tokens_per_second: TraceEntry::tokens_per_second(100, 5),
            cost_usd: None,
            status: crate::trace::TraceStatus::Ok,
            error_message: None,
        }
    }

    #[test]
    fn in_memory_store_evicts_oldest_beyond_capacity() {
        let store = InMemoryUsageStore::new(2);
        for _ in 0..3 {
            store.write_batch(&[sample()]).unwrap();
        }
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn jsonl_store_appends_one_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces.jsonl");
        let store = JsonlUsageStore::new(&path);
        store.write_batch(&[sample(), sample()]).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
