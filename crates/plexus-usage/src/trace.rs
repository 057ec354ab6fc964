use plexus_common::{AliasId, ProviderId, RequestId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Ok,
    UpstreamError,
    ClientCancelled,
}

/// One completed (or aborted) request, ready to hand to a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub request_id: RequestId,
    pub alias_id: AliasId,
    pub provider_id: ProviderId,
    pub model: String,
    pub started_at_unix_ms: i64,
    pub duration_ms: u64,
    /// Time from request start to the first provider byte. Always
    /// `<= duration_ms` when present.
    pub provider_ttft_ms: Option<u64>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub reasoning_tokens: u64,
    pub total_tokens: u64,
    pub tokens_per_second: Option<f64>,
    pub cost_usd: Option<f64>,
    pub status: TraceStatus,
    pub error_message: Option<String>,
}

impl TraceEntry {
    pub fn tokens_per_second(duration_ms: u64, output_tokens: u64) -> Option<f64> {
        if duration_ms == 0 || output_tokens == 0 {
            return None;
        }
        Some(output_tokens as f64 / (duration_ms as f64 / 1000.0))
    }
}
