use std::collections::HashMap;

use plexus_common::{AliasId, ProviderId};

use crate::types::{ConfigDocument, ModelAlias, ProviderRecord};

/// An immutable, published view of the routing configuration. Once created
/// it never changes; `ConfigStore::replace` always constructs a new one.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub providers: HashMap<ProviderId, ProviderRecord>,
    pub models: HashMap<AliasId, ModelAlias>,
    pub admin_key: plexus_common::Secret,
    pub port: u16,
    pub log_level: String,
    pub version: u64,
    pub loaded_at: i64,
    pub checksum: String,
}

impl ConfigSnapshot {
    pub fn from_document(doc: ConfigDocument, version: u64, checksum: String) -> Self {
        Self {
            providers: doc.providers,
            models: doc.models,
            admin_key: doc.admin.api_key,
            port: doc.port,
            log_level: doc.log_level,
            version,
            loaded_at: plexus_common::now_ms(),
            checksum,
        }
    }

    pub fn provider(&self, id: &ProviderId) -> Option<&ProviderRecord> {
        self.providers.get(id)
    }

    pub fn alias(&self, id: &AliasId) -> Option<&ModelAlias> {
        self.models.get(id)
    }
}
