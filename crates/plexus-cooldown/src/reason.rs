use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownReason {
    RateLimit,
    AuthError,
    Timeout,
    ServerError,
    ConnectionError,
    Manual,
}

impl CooldownReason {
    /// Classifies an HTTP status into the reason that gates provider
    /// selection. `404` never starts a cooldown.
    pub fn from_http_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 => Some(CooldownReason::AuthError),
            408 => Some(CooldownReason::Timeout),
            429 => Some(CooldownReason::RateLimit),
            500..=599 => Some(CooldownReason::ServerError),
            _ => None,
        }
    }

    pub fn from_transport_error() -> Self {
        CooldownReason::ConnectionError
    }

    pub fn base_duration(self) -> Duration {
        match self {
            CooldownReason::RateLimit => Duration::from_secs(30),
            CooldownReason::AuthError => Duration::from_secs(15 * 60),
            CooldownReason::Timeout => Duration::from_secs(60),
            CooldownReason::ServerError => Duration::from_secs(60),
            CooldownReason::ConnectionError => Duration::from_secs(30),
            CooldownReason::Manual => Duration::MAX,
        }
    }

    /// Upper bound the doubling backoff saturates at; `None` means the
    /// reason does not use exponential backoff at all.
    pub fn max_duration(self) -> Option<Duration> {
        match self {
            CooldownReason::RateLimit => Some(Duration::from_secs(3600)),
            CooldownReason::AuthError => None,
            CooldownReason::Timeout => Some(Duration::from_secs(10 * 60)),
            CooldownReason::ServerError => Some(Duration::from_secs(10 * 60)),
            CooldownReason::ConnectionError => Some(Duration::from_secs(5 * 60)),
            CooldownReason::Manual => None,
        }
    }

    /// Whether consecutive failures of this reason double the duration.
    pub fn doubles(self) -> bool {
        matches!(
            self,
            CooldownReason::Timeout | CooldownReason::ServerError | CooldownReason::ConnectionError
        )
    }
}

/// Computes the duration for the Nth consecutive failure (n starts at 0) of
/// a given reason, honoring an explicit `retry_after` hint for rate limits.
pub fn resolve_duration(reason: CooldownReason, consecutive: u32, retry_after: Option<Duration>) -> Duration {
    let base = match reason {
        CooldownReason::RateLimit => {
            let floor = retry_after.unwrap_or(Duration::ZERO).max(Duration::from_secs(30));
            return floor.min(reason.max_duration().unwrap_or(Duration::MAX));
        }
        other => other.base_duration(),
    };

    if !reason.doubles() {
        return base;
    }

    let factor = 1u32.checked_shl(consecutive).unwrap_or(u32::MAX);
    let scaled = base.saturating_mul(factor);
    match reason.max_duration() {
        Some(max) => scaled.min(max),
        None => scaled,
    }
}
