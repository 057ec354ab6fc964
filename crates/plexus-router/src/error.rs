use plexus_common::AliasId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("model not found: {0}")]
    ModelNotFound(AliasId),
    #[error("all providers cooled down for alias {alias}, retry after {retry_after_seconds}s")]
    AllProvidersCooledDown { alias: AliasId, retry_after_seconds: u64 },
    #[error("quota exhausted for alias {0}")]
    QuotaExhausted(AliasId),
    #[error("selector '{0}' is not implemented")]
    UnimplementedSelector(String),
}
