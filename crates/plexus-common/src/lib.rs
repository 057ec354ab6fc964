//! Scalar types and small helpers shared by every other `plexus-*` crate.

mod ids;
mod secret;
mod window;

pub use ids::{AliasId, CheckerId, ProviderId, RequestId};
pub use secret::Secret;
pub use window::WindowKind;

/// Current time as Unix milliseconds, the wire representation used by every
/// timestamped field in the external API.
pub fn now_ms() -> i64 {
    time::OffsetDateTime::now_utc().unix_timestamp() * 1000
        + i64::from(time::OffsetDateTime::now_utc().millisecond())
}
