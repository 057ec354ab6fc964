use plexus_config::AliasTarget;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::error::RouterError;

/// A selector picks exactly one candidate from an already-filtered list. It
/// is a pure function: no I/O, no shared state.
pub trait Selector: Send + Sync {
    fn select(&self, candidates: &[AliasTarget], seed: u64) -> Result<AliasTarget, RouterError>;
}

/// Uniform random choice, seedable so tests can assert determinism.
pub struct RandomSelector;

impl Selector for RandomSelector {
    fn select(&self, candidates: &[AliasTarget], seed: u64) -> Result<AliasTarget, RouterError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let index = rng.random_range(0..candidates.len());
        Ok(candidates[index].clone())
    }
}

/// Declared but not implemented; Router treats invoking these as a
/// configuration error rather than silently falling back to random.
pub struct UnimplementedSelector(pub &'static str);

impl Selector for UnimplementedSelector {
    fn select(&self, _candidates: &[AliasTarget], _seed: u64) -> Result<AliasTarget, RouterError> {
        Err(RouterError::UnimplementedSelector(self.0.to_owned()))
    }
}

/// Keyed registry of selector implementations, grounded in the same
/// `type → impl` table pattern used for provider dispatch.
pub struct SelectorRegistry {
    random: RandomSelector,
    cost: UnimplementedSelector,
    latency: UnimplementedSelector,
    usage: UnimplementedSelector,
}

impl SelectorRegistry {
    pub fn new() -> Self {
        Self {
            random: RandomSelector,
            cost: UnimplementedSelector("cost"),
            latency: UnimplementedSelector("latency"),
            usage: UnimplementedSelector("usage"),
        }
    }

    pub fn get(&self, kind: plexus_config::SelectorKind) -> &dyn Selector {
        use plexus_config::SelectorKind::*;
        match kind {
            Random => &self.random,
            Cost => &self.cost,
            Latency => &self.latency,
            Usage => &self.usage,
        }
    }
}

impl Default for SelectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<AliasTarget> {
        vec![
            AliasTarget { provider_id: "p1".into(), canonical_slug: "m1".into() },
            AliasTarget { provider_id: "p2".into(), canonical_slug: "m2".into() },
        ]
    }

    #[test]
    fn random_selector_is_deterministic_for_a_seed() {
        let selector = RandomSelector;
        let first = selector.select(&targets(), 42).unwrap();
        let second = selector.select(&targets(), 42).unwrap();
        assert_eq!(first.provider_id, second.provider_id);
    }

    #[test]
    fn random_selector_always_returns_a_member_of_the_list() {
        let selector = RandomSelector;
        for seed in 0..50u64 {
            let picked = selector.select(&targets(), seed).unwrap();
            assert!(targets().iter().any(|t| t.provider_id == picked.provider_id));
        }
    }

    #[test]
    fn unimplemented_selectors_error_instead_of_falling_back() {
        let registry = SelectorRegistry::new();
        let err = registry.get(plexus_config::SelectorKind::Cost).select(&targets(), 1);
        assert!(err.is_err());
    }
}
