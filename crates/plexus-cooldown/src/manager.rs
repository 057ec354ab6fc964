use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use plexus_common::ProviderId;

use crate::reason::{resolve_duration, CooldownReason};
use crate::recovery::RecoveryQueue;
use crate::state::{CooldownStatus, ProviderCooldown};

#[derive(Debug, Clone, Copy)]
pub struct CooldownQuery {
    pub on_cooldown: bool,
    pub remaining_seconds: u64,
}

/// Per-provider failure-to-cooldown state machine. Cheap mutex acquisition
/// only (expected microsecond-scale); one background task
/// proactively recovers expired entries.
pub struct CooldownManager {
    entries: RwLock<HashMap<ProviderId, ProviderCooldown>>,
    queue: Arc<RecoveryQueue>,
}

impl CooldownManager {
    pub fn new() -> Arc<Self> {
        let manager = Arc::new(Self { entries: RwLock::new(HashMap::new()), queue: Arc::new(RecoveryQueue::new()) });
        manager.clone().spawn_recovery_task();
        manager
    }

    fn spawn_recovery_task(self: Arc<Self>) {
        let queue = self.queue.clone();
        let manager = self;
        tokio::spawn(async move {
            loop {
                let now = Instant::now();
                let due = queue.pop_due(now);
                for provider_id in due {
                    manager.maybe_free(&provider_id, now);
                }

                let sleep = match queue.next_deadline() {
                    Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                    None => Duration::from_secs(3600),
                };

                tokio::select! {
                    _ = tokio::time::sleep(sleep) => {}
                    _ = queue.wait_for_push() => {}
                }
            }
        });
    }

    fn maybe_free(&self, provider_id: &ProviderId, now: Instant) {
        let mut entries = self.entries.write().unwrap();
        if let Some(entry) = entries.get_mut(provider_id) {
            if !entry.is_active(now) {
                entry.status = CooldownStatus::Free;
            }
        }
    }

    pub fn record_failure(
        &self,
        provider_id: &ProviderId,
        reason: CooldownReason,
        http_status: Option<u16>,
        retry_after: Option<Duration>,
        message: Option<String>,
    ) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(provider_id.clone()).or_default();

        let consecutive = if entry.last_reason == Some(reason) { entry.consecutive_failures } else { 0 };
        let duration = resolve_duration(reason, consecutive, retry_after);
        let until = now + duration;

        entry.status = CooldownStatus::Active { until, reason, http_status, message };
        entry.consecutive_failures = consecutive.saturating_add(1);
        entry.last_reason = Some(reason);
        drop(entries);

        tracing::warn!(%provider_id, ?reason, duration_secs = duration.as_secs(), "provider entered cooldown");
        self.queue.push(until, provider_id.clone());
    }

    pub fn record_success(&self, provider_id: &ProviderId) {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(provider_id.clone()).or_default();
        entry.status = CooldownStatus::Free;
        entry.consecutive_failures = 0;
        entry.last_reason = None;
    }

    pub fn is_on_cooldown(&self, provider_id: &ProviderId, now: Instant) -> CooldownQuery {
        let entries = self.entries.read().unwrap();
        match entries.get(provider_id) {
            Some(entry) if entry.is_active(now) => {
                let remaining = entry.remaining(now).unwrap_or_default();
                CooldownQuery { on_cooldown: true, remaining_seconds: remaining.as_secs() }
            }
            _ => CooldownQuery { on_cooldown: false, remaining_seconds: 0 },
        }
    }

    /// Pure filter: returns the subset of `candidates` whose provider is
    /// currently Free. Used by Router; never mutates state.
    pub fn filter(&self, candidates: &[ProviderId], now: Instant) -> Vec<ProviderId> {
        let entries = self.entries.read().unwrap();
        candidates
            .iter()
            .filter(|id| !entries.get(*id).is_some_and(|e| e.is_active(now)))
            .cloned()
            .collect()
    }

    pub fn record_manual(&self, provider_id: &ProviderId, message: Option<String>) {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.entry(provider_id.clone()).or_default();
        entry.status = CooldownStatus::Active {
            until: Instant::now() + Duration::from_secs(u64::MAX / 2),
            reason: CooldownReason::Manual,
            http_status: None,
            message,
        };
    }

    pub fn clear(&self, provider_id: &ProviderId) {
        self.record_success(provider_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filter_excludes_cooled_down_provider() {
        let manager = CooldownManager::new();
        let p1: ProviderId = "p1".into();
        let p2: ProviderId = "p2".into();
        manager.record_failure(&p1, CooldownReason::RateLimit, Some(429), Some(Duration::from_secs(30)), None);

        let now = Instant::now();
        let filtered = manager.filter(&[p1.clone(), p2.clone()], now);
        assert_eq!(filtered, vec![p2]);
    }

    #[tokio::test]
    async fn record_success_clears_cooldown() {
        let manager = CooldownManager::new();
        let p1: ProviderId = "p1".into();
        manager.record_failure(&p1, CooldownReason::Timeout, None, None, None);
        manager.record_success(&p1);
        let query = manager.is_on_cooldown(&p1, Instant::now());
        assert!(!query.on_cooldown);
    }

    #[tokio::test]
    async fn consecutive_timeouts_double_up_to_cap() {
        let manager = CooldownManager::new();
        let p1: ProviderId = "p1".into();
        manager.record_failure(&p1, CooldownReason::Timeout, None, None, None);
        let first = manager.is_on_cooldown(&p1, Instant::now()).remaining_seconds;
        manager.record_failure(&p1, CooldownReason::Timeout, None, None, None);
        let second = manager.is_on_cooldown(&p1, Instant::now()).remaining_seconds;
        assert!(second > first);
    }

    #[tokio::test]
    async fn remaining_seconds_is_monotonic_without_intervening_success() {
        let manager = CooldownManager::new();
        let p1: ProviderId = "p1".into();
        manager.record_failure(&p1, CooldownReason::ServerError, None, None, None);
        let t0 = Instant::now();
        let first = manager.is_on_cooldown(&p1, t0).remaining_seconds;
        let second = manager.is_on_cooldown(&p1, t0 + Duration::from_secs(5)).remaining_seconds;
        assert!(second <= first);
    }
}
