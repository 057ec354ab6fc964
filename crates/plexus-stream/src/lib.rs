//! Forks a provider byte stream into a client-facing stream and an
//! accumulated-text record for the usage recorder, without either side
//! holding up the other.

mod tap;

pub use tap::{spawn, TapCause, TapConfig, TapFinal};
