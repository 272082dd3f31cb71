//! Tolerance bands and the pure classification of a press offset.

/// Inclusive half-width of the Perfect band, in seconds.
pub const PERFECT: f64 = 0.050;
/// Inclusive half-width of the Good band, in seconds.
pub const GOOD: f64 = 0.100;
/// Outer acceptance band; anything outside is Early or Late.
pub const WINDOW: f64 = 0.150;
/// Presses earlier than this relative to the armed cue are noise.
pub const EARLY_REJECT: f64 = 0.300;
/// How long after a cue is due before it resolves as a Miss.
pub const MISS_GRACE: f64 = 0.500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Outcome {
    Perfect,
    Good,
    #[strum(serialize = "OK")]
    Ok,
    #[strum(serialize = "EARLY")]
    Early,
    #[strum(serialize = "LATE")]
    Late,
    #[strum(serialize = "MISS")]
    Miss,
}

impl Outcome {
    pub const ALL: [Outcome; 6] = [
        Outcome::Perfect,
        Outcome::Good,
        Outcome::Ok,
        Outcome::Early,
        Outcome::Late,
        Outcome::Miss,
    ];

    /// Feedback colour class. A miss is shown like a late press.
    pub fn band(&self) -> Band {
        match self {
            Outcome::Perfect | Outcome::Good | Outcome::Ok => Band::Success,
            Outcome::Early => Band::Early,
            Outcome::Late | Outcome::Miss => Band::Late,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.band() == Band::Success
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Band {
    Success,
    Early,
    Late,
}

/// Classify `diff = press_time - target_time`.
///
/// Returns `None` when the press lands before `-EARLY_REJECT`; such presses
/// must not consume the cue. Everything else maps to exactly one outcome.
pub fn classify(diff: f64) -> Option<Outcome> {
    if diff < -EARLY_REJECT {
        return None;
    }

    let abs = diff.abs();
    let outcome = if abs <= PERFECT {
        Outcome::Perfect
    } else if abs <= GOOD {
        Outcome::Good
    } else if abs <= WINDOW {
        Outcome::Ok
    } else if diff < -WINDOW {
        Outcome::Early
    } else {
        Outcome::Late
    };

    Some(outcome)
}

/// Signed offset in whole milliseconds, rounded to nearest.
pub fn offset_ms(diff: f64) -> i64 {
    (diff * 1000.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_edges_are_inclusive() {
        assert_eq!(classify(0.050), Some(Outcome::Perfect));
        assert_eq!(classify(-0.050), Some(Outcome::Perfect));
        assert_eq!(classify(0.100), Some(Outcome::Good));
        assert_eq!(classify(-0.100), Some(Outcome::Good));
        assert_eq!(classify(0.150), Some(Outcome::Ok));
        assert_eq!(classify(-0.150), Some(Outcome::Ok));
    }

    #[test]
    fn test_just_outside_window() {
        assert_eq!(classify(0.150000001), Some(Outcome::Late));
        assert_eq!(classify(-0.150000001), Some(Outcome::Early));
    }

    #[test]
    fn test_early_reject_is_strict() {
        assert_eq!(classify(-0.300), Some(Outcome::Early));
        assert_eq!(classify(-0.300000001), None);
        assert_eq!(classify(-5.0), None);
    }

    #[test]
    fn test_late_is_unbounded() {
        assert_eq!(classify(0.4), Some(Outcome::Late));
        assert_eq!(classify(12.0), Some(Outcome::Late));
    }

    #[test]
    fn test_every_reachable_diff_has_one_outcome() {
        // Sweep the processed range in 1ms steps; classify is a function so
        // exactly one branch fires, we just check it never rejects.
        for step in -300..=1000 {
            let diff = step as f64 / 1000.0;
            assert!(classify(diff).is_some(), "diff {diff} was rejected");
        }
    }

    #[test]
    fn test_band_mapping() {
        assert_eq!(Outcome::Perfect.band(), Band::Success);
        assert_eq!(Outcome::Good.band(), Band::Success);
        assert_eq!(Outcome::Ok.band(), Band::Success);
        assert_eq!(Outcome::Early.band(), Band::Early);
        assert_eq!(Outcome::Late.band(), Band::Late);
        assert_eq!(Outcome::Miss.band(), Band::Late);
        assert!(Outcome::Ok.is_hit());
        assert!(!Outcome::Miss.is_hit());
        assert_eq!(Band::Success.to_string(), "success");
    }

    #[test]
    fn test_offset_rounding() {
        assert_eq!(offset_ms(0.030), 30);
        assert_eq!(offset_ms(0.1304), 130);
        assert_eq!(offset_ms(-0.2006), -201);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::Ok.to_string(), "OK");
        assert_eq!(Outcome::Miss.to_string(), "MISS");
        assert_eq!(Outcome::Perfect.to_string(), "Perfect");
    }
}
