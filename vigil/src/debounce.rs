//! # Continuous-frame debouncer
//!
//! Single-frame noise (lighting flicker, compression artifacts) is common at
//! low thresholds; requiring N consecutive positive verdicts trades a little
//! latency for a lot of precision.

/// Counts consecutive positive motion verdicts.
#[derive(Clone, Copy, Debug, Default)]
pub struct Debouncer {
    consecutive: u32,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one verdict; returns whether motion is confirmed.
    ///
    /// `required` is compared fresh on every call, so a configuration change
    /// applies to future comparisons without reinterpreting the running
    /// count.
    pub fn update(&mut self, detected: bool, required: u32) -> bool {
        if detected {
            self.consecutive += 1;
        } else {
            self.consecutive = 0;
        }
        self.consecutive >= required
    }

    /// Current run length of positive verdicts.
    pub fn count(&self) -> u32 {
        self.consecutive
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn n_minus_one_positives_never_confirm() {
        for n in 1..=6u32 {
            let mut d = Debouncer::new();
            for _ in 0..n - 1 {
                assert!(!d.update(true, n));
            }
            assert!(!d.update(false, n));
            assert_eq!(d.count(), 0);
        }
    }

    #[test]
    fn n_consecutive_positives_confirm() {
        for n in 1..=6u32 {
            let mut d = Debouncer::new();
            for i in 1..=n {
                assert_eq!(d.update(true, n), i == n);
            }
        }
    }

    #[test]
    fn threshold_change_applies_to_future_updates_only() {
        let mut d = Debouncer::new();
        d.update(true, 5);
        d.update(true, 5);
        // Lowering the requirement mid-run confirms with the existing count.
        assert!(d.update(true, 3));
    }

    #[test]
    fn reset_clears_partial_count() {
        let mut d = Debouncer::new();
        d.update(true, 3);
        d.update(true, 3);
        d.reset();
        assert!(!d.update(true, 3));
    }
}
