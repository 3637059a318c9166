//! # Cooldown alert gate

use std::time::{Duration, Instant};

/// Decides whether confirmed motion becomes an emitted alert.
///
/// The gate is the sole owner of `last_alert`; the eligibility check and the
/// timestamp update happen in one call, so two evaluations inside the same
/// cooldown window can never both fire.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlertGate {
    last_alert: Option<Instant>,
}

impl AlertGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set: fires iff `confirmed` and the cooldown has elapsed
    /// since the previous fire (or there was none).
    pub fn try_fire(&mut self, now: Instant, confirmed: bool, cooldown: Duration) -> bool {
        if !confirmed {
            return false;
        }
        match self.last_alert {
            Some(prev) if now.duration_since(prev) < cooldown => false,
            _ => {
                self.last_alert = Some(now);
                true
            }
        }
    }
}
