//! Windowed usage counters per quota checker and an admission gate the
//! router consults for providers that declare one.

mod store;
mod tracker;
mod window;

pub use store::{checker_key, NullQuotaStateStore, QuotaStateRow, QuotaStateStore};
pub use tracker::{Admission, QuotaTracker};
pub use window::QuotaWindow;
