//! Immutable configuration snapshots, atomic on-disk reload, and the
//! `config_change` event feed consumed by the admin SSE endpoint.

mod error;
mod events;
mod snapshot;
mod store;
mod types;
mod validate;

pub use error::ConfigError;
pub use events::{ConfigChangeEvent, EventHub, EventSink};
pub use snapshot::ConfigSnapshot;
pub use store::{ConfigStore, ReplaceOptions, ReplaceOutcome};
pub use types::{
    AdminConfig, AliasTarget, ApiKeyRecord, ConfigDocument, ModelAlias, PricingOverride,
    ProviderRecord, ProviderType, QuotaCheckerConfig, SelectorKind,
};
pub use validate::validate;
