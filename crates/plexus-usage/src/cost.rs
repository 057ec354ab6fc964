use plexus_config::PricingOverride;

/// Falls back to a flat per-million-token default when an alias declares no
/// override for a given field, then to "unknown" (reported as `None`) when
/// neither source has a figure.
const DEFAULT_INPUT_PER_1M: f64 = 0.0;
const DEFAULT_OUTPUT_PER_1M: f64 = 0.0;

pub struct CostCalculator;

impl CostCalculator {
    /// Returns `None` when the alias has no pricing override at all and no
    /// provider default applies, matching the "cost omitted rather
    /// than guessed" stance for unpriced models.
    pub fn estimate(
        pricing: &PricingOverride,
        input_tokens: u64,
        output_tokens: u64,
        cached_tokens: u64,
        reasoning_tokens: u64,
    ) -> Option<f64> {
        let has_any_override = pricing.input_per_1m.is_some()
            || pricing.output_per_1m.is_some()
            || pricing.cached_per_1m.is_some()
            || pricing.reasoning_per_1m.is_some();
        if !has_any_override {
            return None;
        }

        let input_rate = pricing.input_per_1m.unwrap_or(DEFAULT_INPUT_PER_1M);
        let output_rate = pricing.output_per_1m.unwrap_or(DEFAULT_OUTPUT_PER_1M);
        let cached_rate = pricing.cached_per_1m.unwrap_or(input_rate);
        let reasoning_rate = pricing.reasoning_per_1m.unwrap_or(output_rate);

        let billable_input = input_tokens.saturating_sub(cached_tokens);
        let cost = (billable_input as f64 / 1_000_000.0) * input_rate
            + (cached_tokens as f64 / 1_000_000.0) * cached_rate
            + (output_tokens as f64 / 1_000_000.0) * output_rate
            + (reasoning_tokens as f64 / 1_000_000.0) * reasoning_rate;
        Some(cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpriced_alias_returns_none() {
        let pricing = PricingOverride::default();
        assert_eq!(CostCalculator::estimate(&pricing, 1000, 1000, 0, 0), None);
    }

    #[test]
    fn priced_alias_computes_weighted_cost() {
        let pricing = PricingOverride {
            input_per_1m: Some(1.0),
            output_per_1m: Some(2.0),
            cached_per_1m: None,
            reasoning_per_1m: None,
        };
        let cost = CostCalculator::estimate(&pricing, 1_000_000, 1_000_000, 0, 0).unwrap();
        assert!((cost - 3.0).abs() < 1e-9);
    }

    #[test]
    fn cached_tokens_are_billed_at_the_cached_rate() {
        let pricing = PricingOverride {
            input_per_1m: Some(10.0),
            output_per_1m: Some(0.0),
            cached_per_1m: Some(1.0),
            reasoning_per_1m: None,
        };
        let cost = CostCalculator::estimate(&pricing, 1_000_000, 0, 1_000_000, 0).unwrap();
        assert!((cost - 1.0).abs() < 1e-9);
    }
}
