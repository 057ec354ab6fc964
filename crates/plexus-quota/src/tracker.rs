use std::collections::HashMap;
use std::sync::RwLock;

use plexus_common::{CheckerId, WindowKind};

use crate::window::QuotaWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny,
}

/// Per-`(checkerId, windowType)` usage counters. Mutex acquisition only;
/// contention is expected to stay microsecond-scale.
pub struct QuotaTracker {
    windows: RwLock<HashMap<(CheckerId, WindowKind), QuotaWindow>>,
}

impl QuotaTracker {
    pub fn new() -> Self {
        Self { windows: RwLock::new(HashMap::new()) }
    }

    /// Declares (or updates the limit of) a window a checker tracks. Called
    /// once at config load time per declared window.
    pub fn declare(&self, checker_id: &CheckerId, window_type: WindowKind, limit: f64) {
        let mut windows = self.windows.write().unwrap();
        windows
            .entry((checker_id.clone(), window_type))
            .and_modify(|w| w.limit = limit)
            .or_insert_with(|| QuotaWindow::new(window_type, limit));
    }

    pub fn observe_usage(&self, checker_id: &CheckerId, window_type: WindowKind, delta: f64) {
        let mut windows = self.windows.write().unwrap();
        if let Some(window) = windows.get_mut(&(checker_id.clone(), window_type)) {
            window.observe(delta);
        }
    }

    pub fn snapshot(&self, checker_id: &CheckerId) -> Vec<QuotaWindow> {
        let windows = self.windows.read().unwrap();
        windows
            .iter()
            .filter(|((id, _), _)| id == checker_id)
            .map(|(_, window)| window.clone())
            .collect()
    }

    /// Deny if any admission-gating window for this checker is exhausted.
    pub fn admit(&self, checker_id: &CheckerId) -> Admission {
        let windows = self.windows.read().unwrap();
        let exhausted = windows
            .iter()
            .filter(|((id, _), _)| id == checker_id)
            .any(|(_, window)| window.is_exhausted());
        if exhausted { Admission::Deny } else { Admission::Allow }
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_until_limit_reached() {
        let tracker = QuotaTracker::new();
        let checker: CheckerId = "p1".into();
        tracker.declare(&checker, WindowKind::Daily, 10.0);
        assert_eq!(tracker.admit(&checker), Admission::Allow);

        tracker.observe_usage(&checker, WindowKind::Daily, 10.0);
        assert_eq!(tracker.admit(&checker), Admission::Deny);
    }

    #[test]
    fn subscription_window_never_gates_admission() {
        let tracker = QuotaTracker::new();
        let checker: CheckerId = "p1".into();
        tracker.declare(&checker, WindowKind::Subscription, 1.0);
        tracker.observe_usage(&checker, WindowKind::Subscription, 100.0);
        assert_eq!(tracker.admit(&checker), Admission::Allow);
    }
}
