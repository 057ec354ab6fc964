use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Quota window classification shared by `plexus-quota` and anything that
/// needs to reason about window boundaries (admin snapshot rendering, tests).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    FiveHour,
    Daily,
    Weekly,
    Monthly,
    ToolCalls,
    Search,
    Subscription,
}

impl WindowKind {
    /// The reset period for this window, or `None` for windows that never
    /// reset on their own (the informational `subscription` balance).
    pub fn duration(self) -> Option<Duration> {
        match self {
            WindowKind::FiveHour => Some(Duration::from_secs(5 * 3600)),
            WindowKind::Daily | WindowKind::ToolCalls | WindowKind::Search => {
                Some(Duration::from_secs(24 * 3600))
            }
            WindowKind::Weekly => Some(Duration::from_secs(7 * 24 * 3600)),
            WindowKind::Monthly => Some(Duration::from_secs(30 * 24 * 3600)),
            WindowKind::Subscription => None,
        }
    }

    /// `subscription` windows are informational only and never gate admission.
    pub fn is_admission_gate(self) -> bool {
        !matches!(self, WindowKind::Subscription)
    }
}
