use plexus_common::ProviderId;
use plexus_config::ProviderRecord;

#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub provider_id: ProviderId,
    pub canonical_slug: String,
    pub provider: ProviderRecord,
}
