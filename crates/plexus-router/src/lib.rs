//! Alias resolution: look up a `ModelAlias`, narrow its targets by cooldown
//! then quota state, and hand the remainder to the declared selector.

mod error;
mod route;
mod router;
mod selector;

pub use error::RouterError;
pub use route::RouteDecision;
pub use router::Router;
pub use selector::{RandomSelector, Selector, SelectorRegistry, UnimplementedSelector};
