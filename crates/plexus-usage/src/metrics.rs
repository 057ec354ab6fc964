use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use plexus_common::ProviderId;

use crate::trace::{TraceEntry, TraceStatus};

const HISTOGRAM_CAPACITY: usize = 1024;

/// Rolling totals for one `(providerId, model)` pair.
#[derive(Debug, Clone, Default)]
pub struct PerKeyStats {
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration_ms: u64,
    pub total_ttft_ms: u64,
    pub ttft_samples: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
}

impl PerKeyStats {
    /// `None` when no request against this key has carried a priced usage
    /// figure, matching the "cost omitted rather than guessed" stance for
    /// unpriced models.
    pub fn cost_per_1m(&self) -> Option<f64> {
        if self.total_tokens == 0 || self.total_cost_usd == 0.0 {
            return None;
        }
        Some(self.total_cost_usd / (self.total_tokens as f64 / 1_000_000.0))
    }

    pub fn avg_ttft_ms(&self) -> Option<f64> {
        if self.ttft_samples == 0 {
            return None;
        }
        Some(self.total_ttft_ms as f64 / self.ttft_samples as f64)
    }
}

/// Plain atomic counters plus a bounded sample ring for latency, exposed as
/// Prometheus text format under `GET /metrics`. No metrics crate is pulled
/// in; this is a handful of counters and a fixed-size ring, not worth a
/// dependency.
#[derive(Default)]
pub struct MetricsCollector {
    requests_total: AtomicU64,
    requests_failed_total: AtomicU64,
    requests_cancelled_total: AtomicU64,
    input_tokens_total: AtomicU64,
    output_tokens_total: AtomicU64,
    reasoning_tokens_total: AtomicU64,
    duration_samples_ms: Mutex<Vec<u64>>,
    ttft_samples_ms: Mutex<Vec<u64>>,
    per_key: Mutex<HashMap<(ProviderId, String), PerKeyStats>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, entry: &TraceEntry) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        match entry.status {
            TraceStatus::Ok => {}
            TraceStatus::UpstreamError => {
                self.requests_failed_total.fetch_add(1, Ordering::Relaxed);
            }
            TraceStatus::ClientCancelled => {
                self.requests_cancelled_total.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.input_tokens_total.fetch_add(entry.input_tokens, Ordering::Relaxed);
        self.output_tokens_total.fetch_add(entry.output_tokens, Ordering::Relaxed);
        self.reasoning_tokens_total.fetch_add(entry.reasoning_tokens, Ordering::Relaxed);

        push_bounded(&self.duration_samples_ms, entry.duration_ms);
        if let Some(ttft) = entry.provider_ttft_ms {
            push_bounded(&self.ttft_samples_ms, ttft);
        }

        let mut per_key = self.per_key.lock().unwrap();
        let stats = per_key.entry((entry.provider_id.clone(), entry.model.clone())).or_default();
        stats.requests += 1;
        match entry.status {
            TraceStatus::Ok => stats.successes += 1,
            TraceStatus::UpstreamError | TraceStatus::ClientCancelled => stats.failures += 1,
        }
        stats.total_duration_ms += entry.duration_ms;
        if let Some(ttft) = entry.provider_ttft_ms {
            stats.total_ttft_ms += ttft;
            stats.ttft_samples += 1;
        }
        stats.total_tokens += entry.total_tokens;
        if let Some(cost) = entry.cost_usd {
            stats.total_cost_usd += cost;
        }
    }

    /// Snapshot of every `(providerId, model)` pair observed so far, for the
    /// admin performance endpoint.
    pub fn per_key_snapshot(&self) -> HashMap<(ProviderId, String), PerKeyStats> {
        self.per_key.lock().unwrap().clone()
    }

    pub fn render_prometheus(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# TYPE plexus_requests_total counter");
        let _ = writeln!(out, "plexus_requests_total {}", self.requests_total.load(Ordering::Relaxed));
        let _ = writeln!(out, "# TYPE plexus_requests_failed_total counter");
        let _ = writeln!(out, "plexus_requests_failed_total {}", self.requests_failed_total.load(Ordering::Relaxed));
        let _ = writeln!(out, "# TYPE plexus_requests_cancelled_total counter");
        let _ = writeln!(
            out,
            "plexus_requests_cancelled_total {}",
            self.requests_cancelled_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(out, "# TYPE plexus_input_tokens_total counter");
        let _ = writeln!(out, "plexus_input_tokens_total {}", self.input_tokens_total.load(Ordering::Relaxed));
        let _ = writeln!(out, "# TYPE plexus_output_tokens_total counter");
        let _ = writeln!(out, "plexus_output_tokens_total {}", self.output_tokens_total.load(Ordering::Relaxed));
        let _ = writeln!(out, "# TYPE plexus_reasoning_tokens_total counter");
        let _ = writeln!(
            out,
            "plexus_reasoning_tokens_total {}",
            self.reasoning_tokens_total.load(Ordering::Relaxed)
        );

        render_summary(&mut out, "plexus_request_duration_ms", &self.duration_samples_ms);
        render_summary(&mut out, "plexus_provider_ttft_ms", &self.ttft_samples_ms);
        render_per_key(&mut out, &self.per_key);
        out
    }
}

fn push_bounded(samples: &Mutex<Vec<u64>>, value: u64) {
    let mut samples = samples.lock().unwrap();
    if samples.len() >= HISTOGRAM_CAPACITY {
        samples.remove(0);
    }
    samples.push(value);
}

fn render_summary(out: &mut String, name: &str, samples: &Mutex<Vec<u64>>) {
    let samples = samples.lock().unwrap();
    let _ = writeln!(out, "# TYPE {name} summary");
    if samples.is_empty() {
        let _ = writeln!(out, "{name}_count 0");
        return;
    }
    let sum: u64 = samples.iter().sum();
    let count = samples.len() as u64;
    let mut sorted = samples.clone();
    sorted.sort_unstable();
    for (quantile, label) in [(0.5, "0.5"), (0.9, "0.9"), (0.99, "0.99")] {
        let idx = ((sorted.len() - 1) as f64 * quantile).round() as usize;
        let _ = writeln!(out, "{name}{{quantile=\"{label}\"}} {}", sorted[idx]);
    }
    let _ = writeln!(out, "{name}_sum {sum}");
    let _ = writeln!(out, "{name}_count {count}");
}

fn render_per_key(out: &mut String, per_key: &Mutex<HashMap<(ProviderId, String), PerKeyStats>>) {
    let per_key = per_key.lock().unwrap();
    let _ = writeln!(out, "# TYPE plexus_provider_model_requests_total counter");
    let _ = writeln!(out, "# TYPE plexus_provider_model_cost_usd_total counter");
    for ((provider_id, model), stats) in per_key.iter() {
        let _ = writeln!(
            out,
            "plexus_provider_model_requests_total{{provider=\"{provider_id}\",model=\"{model}\"}} {}",
            stats.requests
        );
        let _ = writeln!(
            out,
            "plexus_provider_model_cost_usd_total{{provider=\"{provider_id}\",model=\"{model}\"}} {}",
            stats.total_cost_usd
        );
    }
}

/// Per-provider request counts, used by the admin performance endpoint
/// alongside the raw trace list.
pub fn tally_by_provider(entries: &[TraceEntry]) -> HashMap<String, u64> {
    let mut tally = HashMap::new();
    for entry in entries {
        *tally.entry(entry.provider_id.to_string()).or_insert(0) += 1;
    }
    tally
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
            duration_ms: 42,
            provider_ttft_ms: Some(7),
            input_tokens: 3,
            output_tokens: 4,
            reasoning_tokens: 0,
            total_tokens: 7,
            tokens_per_second: None,
            cost_usd: Some(0.5),
            status: TraceStatus::Ok,
            error_message: None,
        }
    }

    #[test]
    fn render_prometheus_includes_observed_counters() {
        let collector = MetricsCollector::new();
        collector.observe(&sample());
        let text = collector.render_prometheus();
        assert!(text.contains("plexus_requests_total 1"));
        assert!(text.contains("plexus_output_tokens_total 4"));
    }

    #[test]
    fn failed_status_increments_failure_counter_not_success() {
        let collector = MetricsCollector::new();
        let mut entry = sample();
        entry.status = TraceStatus::UpstreamError;
        collector.observe(&entry);
        let text = collector.render_prometheus();
        assert!(text.contains("plexus_requests_failed_total 1"));
    }

    #[test]
    fn per_key_breakdown_tracks_cost_and_success_counts() {
        let collector = MetricsCollector::new();
        collector.observe(&sample());
        let mut failed = sample();
        failed.status = TraceStatus::UpstreamError;
        failed.cost_usd = None;
        collector.observe(&failed);

        let snapshot = collector.per_key_snapshot();
        let stats = snapshot.get(&(ProviderId::from("prov-1"), "gpt-test".to_owned())).unwrap();
        assert_eq!(stats.requests, 2);
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 1);
        assert!((stats.total_cost_usd - 0.5).abs() < 1e-9);
        assert!(stats.cost_per_1m().is_some());
    }

    #[test]
    fn distinct_models_on_the_same_provider_are_tracked_separately() {
        let collector = MetricsCollector::new();
        collector.observe(&sample());
        let mut other_model = sample();
        other_model.model = "gpt-other".to_owned();
        collector.observe(&other_model);

        let snapshot = collector.per_key_snapshot();
        assert_eq!(snapshot.len(), 2);
    }
}
