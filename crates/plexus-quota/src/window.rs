use plexus_common::WindowKind;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaWindow {
    pub window_type: WindowKind,
    pub current_usage: f64,
    pub limit: f64,
    pub window_start_unix_ms: Option<i64>,
    pub last_updated_unix_ms: i64,
}

impl QuotaWindow {
    pub fn new(window_type: WindowKind, limit: f64) -> Self {
        Self {
            window_type,
            current_usage: 0.0,
            limit,
            window_start_unix_ms: Some(now_ms()),
            last_updated_unix_ms: now_ms(),
        }
    }

    pub fn utilization_percent(&self) -> f64 {
        if self.limit <= 0.0 {
            return 0.0;
        }
        100.0 * self.current_usage / self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.window_type.is_admission_gate() && self.current_usage >= self.limit
    }

    /// Advances usage, resetting the window first if its duration has
    /// elapsed since `window_start`.
    pub fn observe(&mut self, delta: f64) {
        self.maybe_reset();
        self.current_usage += delta;
        self.last_updated_unix_ms = now_ms();
    }

    fn maybe_reset(&mut self) {
        let Some(duration) = self.window_type.duration() else {
            return;
        };
        let Some(start) = self.window_start_unix_ms else {
            self.window_start_unix_ms = Some(now_ms());
            return;
        };
        let elapsed_ms = now_ms() - start;
        if elapsed_ms >= duration.as_millis() as i64 {
            self.current_usage = 0.0;
            self.window_start_unix_ms = Some(now_ms());
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as i64
}
