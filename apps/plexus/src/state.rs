use std::sync::Arc;

use plexus_config::ConfigStore;
use plexus_cooldown::CooldownManager;
use plexus_provider::ProviderInvoker;
use plexus_quota::QuotaTracker;
use plexus_router::Router;
use plexus_usage::{InMemoryUsageStore, MetricsCollector, UsageRecorder};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
    pub cooldowns: Arc<CooldownManager>,
    pub quotas: Arc<QuotaTracker>,
    pub router: Arc<Router>,
    pub invoker: Arc<ProviderInvoker>,
    pub usage_recorder: Arc<UsageRecorder>,
    pub usage_store: Arc<InMemoryUsageStore>,
    pub metrics: Arc<MetricsCollector>,
}
