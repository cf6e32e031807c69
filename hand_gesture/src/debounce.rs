//! Hold/cooldown debouncer.
//!
//! A label must be observed continuously for `hold` before it fires, and
//! two fires are always separated by more than `cooldown`.  Both rules are
//! independent.  Time is passed in explicitly as an offset from some fixed
//! origin, so the state machine is fully deterministic.

use std::time::Duration;

use crate::classify::Gesture;

/// Debounce thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HoldConfig {
    /// Minimum continuous observation before a label may fire.
    pub hold:     Duration,
    /// Minimum gap between two fires (exclusive).
    pub cooldown: Duration,
}

impl Default for HoldConfig {
    fn default() -> Self {
        HoldConfig {
            hold:     Duration::from_millis(300),
            cooldown: Duration::from_millis(1000),
        }
    }
}

impl HoldConfig {
    /// Negative and NaN inputs become zero; values too large for a
    /// `Duration` saturate.
    pub fn from_secs(hold: f64, cooldown: f64) -> Self {
        HoldConfig {
            hold:     secs(hold),
            cooldown: secs(cooldown),
        }
    }
}

fn secs(s: f64) -> Duration {
    Duration::try_from_secs_f64(s.max(0.0)).unwrap_or(Duration::MAX)
}

/// Per-session debounce state.
#[derive(Clone, Debug)]
pub struct Debouncer {
    config:      HoldConfig,
    last_label:  Option<Gesture>,
    label_start: Duration,
    last_fire:   Option<Duration>,
}

impl Debouncer {
    pub fn new(config: HoldConfig) -> Self {
        Debouncer {
            config,
            last_label:  None,
            label_start: Duration::ZERO,
            last_fire:   None,
        }
    }

    /// The label currently being held, if any.
    pub fn held(&self) -> Option<Gesture> { self.last_label }

    /// Feed one observation.  Returns `true` when `label` fires.
    ///
    /// A `None` observation breaks any hold in progress but can never fire.
    pub fn update(&mut self, label: Option<Gesture>, now: Duration) -> bool {
        if label != self.last_label {
            self.last_label  = label;
            self.label_start = now;
            return false;
        }
        if label.is_none() {
            return false;
        }

        let held_long_enough = now.saturating_sub(self.label_start) >= self.config.hold;
        let cooled_down = match self.last_fire {
            Some(t) => now.saturating_sub(t) > self.config.cooldown,
            None    => true,
        };

        if held_long_enough && cooled_down {
            self.last_fire = Some(now);
            true
        } else {
            false
        }
    }

    /// Forget the held label and the last fire time.
    pub fn reset(&mut self) {
        self.last_label  = None;
        self.label_start = Duration::ZERO;
        self.last_fire   = None;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const FIST: Option<Gesture> = Some(Gesture::Fist);
    const PALM: Option<Gesture> = Some(Gesture::OpenPalm);

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    fn debouncer() -> Debouncer { Debouncer::new(HoldConfig::default()) }

    #[test]
    fn fist_hold_and_cooldown_scenario() {
        let mut d = debouncer();
        assert!(!d.update(FIST, ms(0)));
        assert!(!d.update(FIST, ms(100)));
        assert!( d.update(FIST, ms(350)));   // held 0.35 >= 0.3
        assert!(!d.update(FIST, ms(900)));   // 0.55 since last fire
        assert!( d.update(FIST, ms(1400)));  // 1.05 since last fire
    }

    #[test]
    fn first_observation_never_fires() {
        let mut d = Debouncer::new(HoldConfig { hold: Duration::ZERO, cooldown: Duration::ZERO });
        assert!(!d.update(PALM, ms(5000)));
        assert!( d.update(PALM, ms(5000)));
    }

    #[test]
    fn never_fires_before_hold() {
        let mut d = debouncer();
        for t in (0..300).step_by(10) {
            assert!(!d.update(PALM, ms(t)), "fired at {}ms", t);
        }
        assert!(d.update(PALM, ms(300)));
    }

    #[test]
    fn at_most_one_fire_per_cooldown_window() {
        let mut d = debouncer();
        let fires: Vec<u64> = (0..=3000u64)
            .step_by(10)
            .filter(|&t| d.update(FIST, ms(t)))
            .collect();
        assert_eq!(fires, vec![300, 1310, 2320]);
        for pair in fires.windows(2) {
            assert!(pair[1] - pair[0] > 1000);
        }
    }

    #[test]
    fn cooldown_is_exclusive() {
        let mut d = debouncer();
        d.update(FIST, ms(0));
        assert!( d.update(FIST, ms(300)));
        assert!(!d.update(FIST, ms(1300)));  // exactly the cooldown
        assert!( d.update(FIST, ms(1301)));
    }

    #[test]
    fn label_switch_resets_hold() {
        let mut d = debouncer();
        d.update(FIST, ms(0));
        assert!(!d.update(FIST, ms(290)));
        d.update(PALM, ms(295));
        d.update(FIST, ms(300));
        // prior 0.29s of progress is not inherited
        assert!(!d.update(FIST, ms(590)));
        assert!( d.update(FIST, ms(600)));
    }

    #[test]
    fn none_breaks_hold_and_never_fires() {
        let mut d = debouncer();
        d.update(FIST, ms(0));
        d.update(None, ms(200));
        for t in [200, 600, 2000, 5000] {
            assert!(!d.update(None, ms(t)));
        }
        d.update(FIST, ms(5100));
        assert!(!d.update(FIST, ms(5300)));
        assert!( d.update(FIST, ms(5400)));
    }

    #[test]
    fn cooldown_spans_label_changes() {
        let mut d = debouncer();
        d.update(FIST, ms(0));
        assert!(d.update(FIST, ms(300)));
        d.update(PALM, ms(400));
        // palm held long enough but still inside fist's cooldown
        assert!(!d.update(PALM, ms(800)));
        assert!( d.update(PALM, ms(1350)));
    }

    #[test]
    fn reset_clears_cooldown() {
        let mut d = debouncer();
        d.update(FIST, ms(0));
        assert!(d.update(FIST, ms(300)));
        d.reset();
        assert_eq!(d.held(), None);
        d.update(FIST, ms(400));
        assert!(d.update(FIST, ms(700)));
    }

    #[test]
    fn config_from_secs() {
        let cfg = HoldConfig::from_secs(0.5, 2.0);
        assert_eq!(cfg.hold, ms(500));
        assert_eq!(cfg.cooldown, ms(2000));
        assert_eq!(HoldConfig::from_secs(-1.0, 0.0).hold, Duration::ZERO);
        assert_eq!(HoldConfig::from_secs(f64::NAN, 0.0).hold, Duration::ZERO);
        assert_eq!(HoldConfig::from_secs(1e30, f64::INFINITY).hold, Duration::MAX);
        assert_eq!(HoldConfig::from_secs(0.0, f64::INFINITY).cooldown, Duration::MAX);
    }
}
