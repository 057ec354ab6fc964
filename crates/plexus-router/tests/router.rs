use std::collections::HashMap;
use std::time::Duration;

use plexus_config::{AdminConfig, AliasTarget, ConfigDocument, ModelAlias, ProviderRecord, ProviderType, SelectorKind};
use plexus_cooldown::{CooldownManager, CooldownReason};
use plexus_common::Secret;
use plexus_quota::QuotaTracker;
use plexus_router::{Router, RouterError};

fn provider(id: &str) -> ProviderRecord {
    ProviderRecord {
        id: id.into(),
        kind: ProviderType::Openai,
        base_url: None,
        api_key: Secret::new("key"),
        headers: HashMap::new(),
        quota_checker_ref: None,
    }
}

fn snapshot_with(alias_name: &str, targets: Vec<AliasTarget>, providers: Vec<ProviderRecord>) -> plexus_config::ConfigSnapshot {
    let mut provider_map = HashMap::new();
    for p in providers {
        provider_map.insert(p.id.clone(), p);
    }
    let mut models = HashMap::new();
    models.insert(
        alias_name.into(),
        ModelAlias { alias_id: alias_name.into(), targets, selector: SelectorKind::Random, pricing: Default::default() },
    );
    let doc = ConfigDocument {
        providers: provider_map,
        models,
        keys: HashMap::new(),
        admin: AdminConfig { api_key: Secret::new("admin") },
        quotas: HashMap::new(),
        port: 8080,
        log_level: "info".into(),
    };
    plexus_config::ConfigSnapshot::from_document(doc, 1, "deadbeef".into())
}

#[tokio::test]
async fn happy_path_resolves_the_only_target() {
    let snapshot = snapshot_with(
        "fast",
        vec![AliasTarget { provider_id: "p1".into(), canonical_slug: "m1".into() }],
        vec![provider("p1")],
    );
    let cooldowns = CooldownManager::new();
    let quotas = QuotaTracker::new();
    let router = Router::new();

    let decision = router.resolve(&snapshot, &cooldowns, &quotas, &"fast".into(), 1).unwrap();
    assert_eq!(decision.provider_id.as_str(), "p1");
}

#[tokio::test]
async fn cooldown_avoidance_always_picks_the_free_provider() {
    let snapshot = snapshot_with(
        "multi",
        vec![
            AliasTarget { provider_id: "p1".into(), canonical_slug: "m1".into() },
            AliasTarget { provider_id: "p2".into(), canonical_slug: "m2".into() },
        ],
        vec![provider("p1"), provider("p2")],
    );
    let cooldowns = CooldownManager::new();
    let quotas = QuotaTracker::new();
    let router = Router::new();

    cooldowns.record_failure(&"p1".into(), CooldownReason::RateLimit, Some(429), Some(Duration::from_secs(30)), None);

    for seed in 0..10u64 {
        let decision = router.resolve(&snapshot, &cooldowns, &quotas, &"multi".into(), seed).unwrap();
        assert_eq!(decision.provider_id.as_str(), "p2");
    }
}

#[tokio::test]
async fn all_providers_cooled_down_surfaces_minimum_retry_after() {
    let snapshot = snapshot_with(
        "multi",
        vec![
            AliasTarget { provider_id: "p1".into(), canonical_slug: "m1".into() },
            AliasTarget { provider_id: "p2".into(), canonical_slug: "m2".into() },
        ],
        vec![provider("p1"), provider("p2")],
    );
    let cooldowns = CooldownManager::new();
    let quotas = QuotaTracker::new();
    let router = Router::new();

    cooldowns.record_failure(&"p1".into(), CooldownReason::RateLimit, Some(429), Some(Duration::from_secs(30)), None);
    cooldowns.record_failure(&"p2".into(), CooldownReason::RateLimit, Some(429), Some(Duration::from_secs(45)), None);

    let err = router.resolve(&snapshot, &cooldowns, &quotas, &"multi".into(), 0).unwrap_err();
    match err {
        RouterError::AllProvidersCooledDown { retry_after_seconds, .. } => {
            assert!(retry_after_seconds <= 30);
        }
        other => panic!("expected AllProvidersCooledDown, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_alias_is_model_not_found() {
    let snapshot = snapshot_with("fast", vec![], vec![]);
    let cooldowns = CooldownManager::new();
    let quotas = QuotaTracker::new();
    let router = Router::new();

    let err = router.resolve(&snapshot, &cooldowns, &quotas, &"missing".into(), 0).unwrap_err();
    assert!(matches!(err, RouterError::ModelNotFound(_)));
}
