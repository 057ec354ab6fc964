use std::time::Instant;

use plexus_common::AliasId;
use plexus_cooldown::CooldownManager;
use plexus_config::{AliasTarget, ConfigSnapshot};
use plexus_quota::{Admission, QuotaTracker};

use crate::error::RouterError;
use crate::route::RouteDecision;
use crate::selector::SelectorRegistry;

pub struct Router {
    selectors: SelectorRegistry,
}

impl Router {
    pub fn new() -> Self {
        Self { selectors: SelectorRegistry::new() }
    }

    /// `RouteDecision` resolution: look up the alias,
    /// narrow by cooldown then quota, and hand the remainder to the
    /// declared selector.
    pub fn resolve(
        &self,
        snapshot: &ConfigSnapshot,
        cooldowns: &CooldownManager,
        quotas: &QuotaTracker,
        alias_id: &AliasId,
        seed: u64,
    ) -> Result<RouteDecision, RouterError> {
        let alias = snapshot.alias(alias_id).ok_or_else(|| RouterError::ModelNotFound(alias_id.clone()))?;

        let now = Instant::now();
        let provider_ids: Vec<_> = alias.targets.iter().map(|t| t.provider_id.clone()).collect();
        let free_providers = cooldowns.filter(&provider_ids, now);

        let mut filtered: Vec<AliasTarget> =
            alias.targets.iter().filter(|t| free_providers.contains(&t.provider_id)).cloned().collect();

        if filtered.is_empty() {
            let retry_after_seconds = provider_ids
                .iter()
                .map(|id| cooldowns.is_on_cooldown(id, now).remaining_seconds)
                .min()
                .unwrap_or(0);
            return Err(RouterError::AllProvidersCooledDown { alias: alias_id.clone(), retry_after_seconds });
        }

        filtered.retain(|target| {
            let Some(provider) = snapshot.provider(&target.provider_id) else {
                return true;
            };
            let Some(checker_ref) = &provider.quota_checker_ref else {
                return true;
            };
            !matches!(quotas.admit(&checker_ref.as_str().into()), Admission::Deny)
        });

        if filtered.is_empty() {
            return Err(RouterError::QuotaExhausted(alias_id.clone()));
        }

        let selector = self.selectors.get(alias.selector);
        let picked = selector.select(&filtered, seed)?;

        let provider = snapshot
            .provider(&picked.provider_id)
            .cloned()
            .expect("target provider must exist in a validated snapshot");

        Ok(RouteDecision { provider_id: picked.provider_id, canonical_slug: picked.canonical_slug, provider })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
