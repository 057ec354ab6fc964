use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router as AxumRouter;
use clap::Parser;
use plexus_common::CheckerId;
use plexus_config::{ConfigDocument, ConfigStore, QuotaCheckerConfig};
use plexus_cooldown::CooldownManager;
use plexus_provider::ProviderInvoker;
use plexus_quota::QuotaTracker;
use plexus_router::Router as PlexusRouter;
use plexus_usage::{InMemoryUsageStore, JsonlUsageStore, MetricsCollector, RecorderConfig, UsageRecorder, UsageStore};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod cli;
mod error;
mod handlers;
mod state;
mod stream_pipeline;
mod validate;

use cli::Cli;
use state::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);
const PERFORMANCE_HISTORY_CAPACITY: usize = 10_000;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = cli.log_level.clone().unwrap_or_else(|| "info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_new(&log_level).unwrap_or_else(|_| "info".into()))
        .init();

    let raw_yaml = tokio::fs::read_to_string(&cli.config)
        .await
        .with_context(|| format!("reading config file {}", cli.config.display()))?;
    let mut doc: ConfigDocument = serde_yaml::from_str(&raw_yaml).context("parsing config yaml")?;
    if let Some(port) = cli.port {
        doc.port = port;
    }
    if let Some(level) = cli.log_level.clone() {
        doc.log_level = level;
    }

    let config = Arc::new(ConfigStore::new(cli.config.clone(), doc.clone()).context("loading config store")?);
    let port = config.current().port;

    let cooldowns = CooldownManager::new();
    let quotas = Arc::new(QuotaTracker::new());
    declare_quota_windows(&quotas, &doc);

    let router = Arc::new(PlexusRouter::new());
    let invoker = Arc::new(ProviderInvoker::new());

    let usage_store = Arc::new(InMemoryUsageStore::new(PERFORMANCE_HISTORY_CAPACITY));
    let mut stores: Vec<Arc<dyn UsageStore>> = vec![usage_store.clone()];
    if let Some(path) = cli.usage_log.clone() {
        stores.push(Arc::new(JsonlUsageStore::new(path)));
    }
    let usage_recorder = Arc::new(UsageRecorder::spawn(stores, RecorderConfig::default()));
    let metrics = Arc::new(MetricsCollector::new());

    let state = AppState {
        config: config.clone(),
        cooldowns,
        quotas,
        router,
        invoker,
        usage_recorder,
        usage_store,
        metrics,
    };

    let client_routes = AxumRouter::new()
        .route("/v1/chat/completions", post(handlers::chat::chat_completions))
        .route("/v1/messages", post(handlers::messages::messages))
        .route("/v1/models", get(handlers::models::list_models))
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .route("/metrics", get(handlers::health::metrics));

    let admin_routes = AxumRouter::new()
        .route("/config", get(handlers::admin::get_config).post(handlers::admin::put_config))
        .route("/config/status", get(handlers::admin::config_status))
        .route("/config/reload", post(handlers::admin::reload_config))
        .route("/events", get(handlers::admin::events))
        .route(
            "/management/performance",
            get(handlers::admin::get_performance).delete(handlers::admin::delete_performance),
        )
        .route("/management/quotas", get(handlers::admin::list_quotas))
        .layer(middleware::from_fn_with_state(state.clone(), handlers::admin::require_admin_key));

    let app = client_routes
        .nest("/v0", admin_routes)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(TimeoutLayer::new(REQUEST_TIMEOUT)));

    let bind = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind).await.with_context(|| format!("binding {bind}"))?;
    info!(%bind, "plexus listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Best-effort quota-window declaration from the config's `quotas` map.
/// `Generic` checkers declare windows through a `limits` array shaped
/// `[{"window": "daily", "limit": 1000.0}, ...]`; anything else (including
/// `Minimax`, which relies on an external usage poller) is skipped and left
/// for `QuotaTracker::observe_usage` to populate lazily.
fn declare_quota_windows(quotas: &QuotaTracker, doc: &ConfigDocument) {
    for (provider_id, checker) in &doc.quotas {
        let QuotaCheckerConfig::Generic { options } = checker else { continue };
        let Some(limits) = options.get("limits").and_then(|v| v.as_array()) else { continue };

        let checker_id: CheckerId = provider_id.as_str().into();
        for entry in limits {
            let Some(window_name) = entry.get("window").and_then(|v| v.as_str()) else { continue };
            let Some(limit) = entry.get("limit").and_then(|v| v.as_f64()) else { continue };
            let Some(window) = parse_window_kind(window_name) else {
                tracing::warn!(provider = %provider_id, window = %window_name, "unknown quota window kind, skipping");
                continue;
            };
            quotas.declare(&checker_id, window, limit);
        }
    }
}

fn parse_window_kind(name: &str) -> Option<plexus_common::WindowKind> {
    use plexus_common::WindowKind::*;
    match name {
        "five_hour" => Some(FiveHour),
        "daily" => Some(Daily),
        "weekly" => Some(Weekly),
        "monthly" => Some(Monthly),
        "tool_calls" => Some(ToolCalls),
        "search" => Some(Search),
        "subscription" => Some(Subscription),
        _ => None,
    }
}
