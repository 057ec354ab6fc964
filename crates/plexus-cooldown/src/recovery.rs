use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::time::Instant;

use plexus_common::ProviderId;
use tokio::sync::Notify;

/// A min-heap of pending cooldown expiries plus a `Notify` the background
/// recovery task waits on; pushing a new (sooner) deadline wakes it early.
/// This is a proactive best-effort nudge only — `is_on_cooldown` always
/// double-checks wall-clock, so correctness never depends on this task
/// running on time.
pub struct RecoveryQueue {
    heap: Mutex<BinaryHeap<Reverse<(Instant, ProviderId)>>>,
    notify: Notify,
}

impl RecoveryQueue {
    pub fn new() -> Self {
        Self { heap: Mutex::new(BinaryHeap::new()), notify: Notify::new() }
    }

    pub fn push(&self, until: Instant, provider_id: ProviderId) {
        self.heap.lock().unwrap().push(Reverse((until, provider_id)));
        self.notify.notify_one();
    }

    /// Pops every entry whose deadline has passed as of `now`.
    pub fn pop_due(&self, now: Instant) -> Vec<ProviderId> {
        let mut heap = self.heap.lock().unwrap();
        let mut due = Vec::new();
        while let Some(Reverse((until, _))) = heap.peek() {
            if *until > now {
                break;
            }
            let Reverse((_, provider_id)) = heap.pop().unwrap();
            due.push(provider_id);
        }
        due
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.heap.lock().unwrap().peek().map(|Reverse((until, _))| *until)
    }

    pub async fn wait_for_push(&self) {
        self.notify.notified().await;
    }
}

impl Default for RecoveryQueue {
    fn default() -> Self {
        Self::new()
    }
}
