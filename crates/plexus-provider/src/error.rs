use plexus_cooldown::CooldownReason;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("upstream http error {status}: {message}")]
    Http { status: u16, message: String, retry_after: Option<std::time::Duration> },
    #[error("upstream transport error: {0}")]
    Transport(String),
    #[error("upstream response could not be decoded: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classification feeding `CooldownManager::record_failure`.
    /// `404` is never classified — it bubbles up as a
    /// plain application error rather than cooling down a provider.
    pub fn classify(&self) -> Option<(CooldownReason, Option<u16>, Option<std::time::Duration>)> {
        match self {
            ProviderError::Http { status, retry_after, .. } => {
                CooldownReason::from_http_status(*status).map(|r| (r, Some(*status), *retry_after))
            }
            ProviderError::Transport(_) => Some((CooldownReason::from_transport_error(), None, None)),
            ProviderError::Decode(_) => None,
        }
    }
}
