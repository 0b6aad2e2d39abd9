//! Generic simulation time, per Design Note "Real vs integer time".
//!
//! `rts_core::rmrcs` is written once against this trait and instantiated at
//! `i64` for the WCET-only variant (`main_wcet_only.c`) and at `f64` for the
//! actual-time variant (`main_actual_time.c`); only the handful of methods
//! below differ between the two.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// The feasibility epsilon from §4.4/§6: `ε = 0.001`, reused here as the
/// floating-point instantiation of [`SimTime::EPSILON`].
pub const EPSILON: f64 = 0.001;

pub trait SimTime:
    Copy
    + Clone
    + Debug
    + Display
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + AddAssign
    + SubAssign
    + Serialize
    + DeserializeOwned
    + 'static
{
    const ZERO: Self;
    /// Completion/over-execution threshold: a job with `remaining <= EPSILON`
    /// is considered complete (§4.4 step 2, §8 "Per-job accounting").
    const EPSILON: Self;

    /// Build a time value from an integer tick count (a release or deadline).
    fn from_ticks(ticks: i64) -> Self;
    /// Build the `remaining` of a job's first release, which always runs its
    /// full WCET (§4.3 "Inputs").
    fn from_wcet(wcet: i64) -> Self;
    /// Build the `remaining` of a later release: `actual` for the real-valued
    /// variant, `wcet` (rounded) for the integer variant, which has no
    /// separate concept of observed execution time.
    fn from_actual(actual: f64, wcet: i64) -> Self;

    fn abs(self) -> Self;
    fn as_f64(self) -> f64;

    /// Whether two boundary times should be treated as touching for the
    /// schedule-merge pass (§4.3 "Post-processing"). Exact equality for the
    /// integer variant; within [`EPSILON`](SimTime::EPSILON) for the
    /// real-valued variant.
    fn touches(self, other: Self) -> bool;

    /// Midpoint of `[lo, hi]` for the oracle's binary search (§4.4).
    fn midpoint(lo: Self, hi: Self) -> Self;

    /// Whether `[lo, hi]` is narrow enough to stop the binary search:
    /// one integer tick for the WCET-only variant, `EPSILON` for the
    /// actual-time variant.
    fn search_done(lo: Self, hi: Self) -> bool;

    /// Render a value the way the schedule grammar in §6 wants it:
    /// bare integer for the WCET-only variant, one decimal place
    /// (`%.1f`) for the actual-time variant.
    fn format_time(self) -> String;
}

impl SimTime for i64 {
    const ZERO: Self = 0;
    const EPSILON: Self = 0;

    fn from_ticks(ticks: i64) -> Self {
        ticks
    }

    fn from_wcet(wcet: i64) -> Self {
        wcet
    }

    fn from_actual(_actual: f64, wcet: i64) -> Self {
        wcet
    }

    fn abs(self) -> Self {
        i64::abs(self)
    }

    fn as_f64(self) -> f64 {
        self as f64
    }

    fn touches(self, other: Self) -> bool {
        self == other
    }

    fn midpoint(lo: Self, hi: Self) -> Self {
        lo + (hi - lo) / 2
    }

    fn search_done(lo: Self, hi: Self) -> bool {
        hi - lo <= 1
    }

    fn format_time(self) -> String {
        self.to_string()
    }
}

impl SimTime for f64 {
    const ZERO: Self = 0.0;
    const EPSILON: Self = EPSILON;

    fn from_ticks(ticks: i64) -> Self {
        ticks as f64
    }

    fn from_wcet(wcet: i64) -> Self {
        wcet as f64
    }

    fn from_actual(actual: f64, _wcet: i64) -> Self {
        actual
    }

    fn abs(self) -> Self {
        f64::abs(self)
    }

    fn as_f64(self) -> f64 {
        self
    }

    fn touches(self, other: Self) -> bool {
        (self - other).abs() < EPSILON
    }

    fn midpoint(lo: Self, hi: Self) -> Self {
        lo + (hi - lo) / 2.0
    }

    fn search_done(lo: Self, hi: Self) -> bool {
        hi - lo < EPSILON
    }

    fn format_time(self) -> String {
        format!("{:.1}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_time_touches_only_on_exact_equality() {
        assert!(SimTime::touches(4i64, 4i64));
        assert!(!SimTime::touches(4i64, 5i64));
    }

    #[test]
    fn real_time_touches_within_epsilon() {
        assert!(SimTime::touches(4.0f64, 4.0005f64));
        assert!(!SimTime::touches(4.0f64, 4.01f64));
    }

    #[test]
    fn integer_search_terminates_on_unit_interval() {
        assert!(i64::search_done(3, 4));
        assert!(!i64::search_done(3, 5));
        assert_eq!(i64::midpoint(3, 7), 5);
    }

    #[test]
    fn real_search_terminates_within_epsilon() {
        assert!(f64::search_done(3.0, 3.0005));
        assert!(!f64::search_done(3.0, 3.01));
        assert!((f64::midpoint(3.0, 7.0) - 5.0).abs() < EPSILON);
    }
}
