//! Logical time: points, spans, domains and the wall clock.
//!
//! The time manager is generic over [`SimTime`], an opaque totally
//! ordered point in time with an associated span type. [`Millis`] and
//! [`MillisSpan`] are the stock implementation at 1 ms resolution.

use std::fmt;
use std::ops::Add;

use crate::error::ClockError;

// ── SimTime ────────────────────────────────────────────────────────

/// A point in logical simulation time.
///
/// Implementations must be totally ordered and cheap to copy. The only
/// arithmetic the time manager needs is "this time plus a span", which
/// must saturate at the top of the representable range instead of
/// wrapping.
pub trait SimTime: Copy + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Non-negative duration type used for lookaheads.
    type Span: Copy + fmt::Debug + Send + Sync + 'static;

    /// The time `span` after `self`, saturating at the maximum value.
    fn after(self, span: Self::Span) -> Self;
}

// ── TimeDomain ─────────────────────────────────────────────────────

/// The zero time and the largest time a simulation can reach.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeDomain<T> {
    /// Time at which every simulation starts.
    pub zero: T,
    /// Upper bound on representable time.
    pub max: T,
}

impl<T: SimTime> TimeDomain<T> {
    /// Build a domain from its bounds.
    pub fn new(zero: T, max: T) -> Self {
        Self { zero, max }
    }

    /// Whether `time` lies within `[zero, max]`.
    pub fn contains(&self, time: T) -> bool {
        self.zero <= time && time <= self.max
    }
}

// ── WallClock ──────────────────────────────────────────────────────

/// The authoritative current simulation time.
///
/// Only moves forward: [`advance_to`](WallClock::advance_to) rejects
/// any time earlier than the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WallClock<T> {
    time: T,
}

impl<T: SimTime> WallClock<T> {
    /// Create a clock reading `time`.
    pub fn new(time: T) -> Self {
        Self { time }
    }

    /// Current reading.
    pub fn time(&self) -> T {
        self.time
    }

    /// Move the clock to `next`.
    ///
    /// Returns [`ClockError::Regression`] and leaves the clock untouched
    /// if `next` is earlier than the current reading.
    pub fn advance_to(&mut self, next: T) -> Result<(), ClockError<T>> {
        if next < self.time {
            return Err(ClockError::Regression {
                current: self.time,
                requested: next,
            });
        }
        self.time = next;
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for WallClock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WallClock={}", self.time)
    }
}

// ── Millisecond implementation ─────────────────────────────────────

/// A point in time measured in whole milliseconds since simulation start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Millis(u64);

/// A duration measured in whole milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MillisSpan(u64);

impl Millis {
    /// Simulation start.
    pub const ZERO: Self = Self(0);
    /// Largest representable time.
    pub const MAX: Self = Self(u64::MAX);
    /// The full millisecond domain `[ZERO, MAX]`.
    pub const DOMAIN: TimeDomain<Self> = TimeDomain {
        zero: Self::ZERO,
        max: Self::MAX,
    };

    /// Time from a millisecond count.
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms)
    }

    /// Time from a second count, saturating on overflow.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Milliseconds since simulation start.
    pub const fn as_ms(self) -> u64 {
        self.0
    }
}

impl MillisSpan {
    /// Span from a millisecond count.
    pub const fn from_ms(ms: u64) -> Self {
        Self(ms)
    }

    /// Span from a second count, saturating on overflow.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs.saturating_mul(1000))
    }

    /// Length in milliseconds.
    pub const fn as_ms(self) -> u64 {
        self.0
    }
}

impl Add<MillisSpan> for Millis {
    type Output = Millis;

    fn add(self, span: MillisSpan) -> Millis {
        Millis(self.0.saturating_add(span.0))
    }
}

impl SimTime for Millis {
    type Span = MillisSpan;

    fn after(self, span: MillisSpan) -> Self {
        self + span
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl fmt::Display for MillisSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
