//! Expectation intervals on the relative time axis

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    earliest: f64,
    latest: f64,
}

impl Interval {
    /// Closed interval `[earliest, latest]`
    ///
    /// # Panics
    ///
    /// If `earliest > latest` or either bound is not finite.
    pub fn between(earliest: f64, latest: f64) -> Self {
        assert!(
            earliest.is_finite() && latest.is_finite(),
            "interval bounds must be finite: [{earliest}, {latest}]"
        );
        assert!(earliest <= latest, "interval start {earliest} is after its end {latest}");
        Self { earliest, latest }
    }

    /// Single point in time
    pub fn at(t: f64) -> Self {
        Self::between(t, t)
    }

    pub fn earliest(&self) -> f64 {
        self.earliest
    }

    pub fn latest(&self) -> f64 {
        self.latest
    }

    /// Whether `t` lies in the interval widened by `tolerance` on both ends
    pub fn contains(&self, t: f64, tolerance: f64) -> bool {
        t >= self.earliest - tolerance && t <= self.latest + tolerance
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}, {:.3}]", self.earliest, self.latest)
    }
}
