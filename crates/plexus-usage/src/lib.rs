//! Turns a completed request into a priced trace, batches it to whatever
//! stores are configured, and keeps the running Prometheus-style counters.

mod cost;
mod metrics;
mod recorder;
mod store;
mod trace;

pub use cost::CostCalculator;
pub use metrics::{tally_by_provider, MetricsCollector, PerKeyStats};
pub use recorder::{RecorderConfig, UsageRecorder};
pub use store::{InMemoryUsageStore, JsonlUsageStore, StoreError, UsageStore};
pub use trace::{TraceEntry, TraceStatus};
