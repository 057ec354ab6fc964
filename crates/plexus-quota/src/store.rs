use async_trait::async_trait;
use plexus_common::CheckerId;
use serde::{Deserialize, Serialize};

/// `{keyName, quotaName, limitType, currentUsage, lastUpdated, windowStart?}`
/// persistence contract. Writes are idempotent upserts keyed
/// by `keyName`; reads at startup restore tracker state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaStateRow {
    pub key_name: String,
    pub quota_name: String,
    pub limit_type: String,
    pub current_usage: f64,
    pub last_updated: i64,
    pub window_start: Option<i64>,
}

#[async_trait]
pub trait QuotaStateStore: Send + Sync {
    async fn load_all(&self) -> anyhow::Result<Vec<QuotaStateRow>>;
    async fn upsert(&self, row: QuotaStateRow) -> anyhow::Result<()>;
}

/// Default no-op store: quota state lives only in memory for the life of the
/// process. `apps/plexus` may wire a persistent implementation.
pub struct NullQuotaStateStore;

#[async_trait]
impl QuotaStateStore for NullQuotaStateStore {
    async fn load_all(&self) -> anyhow::Result<Vec<QuotaStateRow>> {
        Ok(Vec::new())
    }

    async fn upsert(&self, _row: QuotaStateRow) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn checker_key(checker_id: &CheckerId) -> String {
    checker_id.as_str().to_owned()
}
