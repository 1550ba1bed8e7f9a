use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Trait for monotonic clock implementations used by token buckets.
///
/// Implementations must provide monotonic time that never goes backwards.
/// The time is measured in whole milliseconds.
pub trait Clock {
    /// Returns the current time in milliseconds since an arbitrary epoch.
    fn now(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> u64 {
        (**self).now()
    }
}

fn duration_to_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Standard clock implementation using [`std::time::Instant`].
///
/// The epoch is the moment the clock was created.
///
/// # Examples
///
/// ```rust
/// use tokenwell::{TokenBucket, Limit, StdClock};
/// use std::num::NonZeroU64;
///
/// let limit = Limit::per_second(NonZeroU64::new(100).unwrap());
/// let clock = StdClock::default();
/// let bucket = TokenBucket::with_clock(limit, clock);
/// ```
#[derive(Clone)]
pub struct StdClock {
    origin: std::time::Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now(&self) -> u64 {
        duration_to_millis(self.origin.elapsed())
    }
}

/// High-precision clock implementation using the `quanta` crate.
///
/// Requires the "quanta" feature to be enabled.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "quanta")]
/// # {
/// use tokenwell::{TokenBucket, Limit, QuantaClock};
/// use std::num::NonZeroU64;
///
/// let limit = Limit::per_second(NonZeroU64::new(100).unwrap());
/// let clock = QuantaClock::default();
/// let bucket = TokenBucket::with_clock(limit, clock);
/// # }
/// ```
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct QuantaClock {
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for QuantaClock {
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl QuantaClock {
    /// Creates a new `QuantaClock` from a `quanta::Clock` instance.
    pub fn new(clock: quanta::Clock) -> Self {
        let origin = clock.now();
        Self { origin }
    }
}

#[cfg(feature = "quanta")]
impl Clock for QuantaClock {
    fn now(&self) -> u64 {
        duration_to_millis(self.origin.elapsed())
    }
}

/// Clock that reads quanta's coarse, upkeep-driven time.
///
/// Reading it is a single atomic load, at the cost of precision bounded by
/// how often quanta's upkeep thread runs. With millisecond refill intervals the
/// upkeep period should be well below one millisecond.
///
/// **Important**: quanta's upkeep thread must be running, including for a
/// `FastClock::default()`. Without it the clock never moves and a bucket
/// using it never refills.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "quanta")]
/// # {
/// use tokenwell::{TokenBucket, Limit, FastClock};
/// use std::num::NonZeroU64;
/// use std::time::Duration;
///
/// let clock = quanta::Clock::new();
/// let _upkeep = quanta::Upkeep::new_with_clock(Duration::from_micros(100), clock.clone())
///     .start()
///     .unwrap();
/// let limit = Limit::per_second(NonZeroU64::new(1000).unwrap());
/// let bucket = TokenBucket::with_clock(limit, FastClock::new(clock));
/// # }
/// ```
#[cfg(feature = "quanta")]
#[derive(Clone)]
pub struct FastClock {
    clock: quanta::Clock,
    origin: quanta::Instant,
}

#[cfg(feature = "quanta")]
impl Default for FastClock {
    /// A `FastClock` over a fresh `quanta::Clock`. The upkeep thread still
    /// has to be started separately.
    fn default() -> Self {
        Self::new(quanta::Clock::new())
    }
}

#[cfg(feature = "quanta")]
impl FastClock {
    /// Creates a new `FastClock` from a `quanta::Clock` instance.
    ///
    /// **Important**: Ensure the clock's upkeep thread is running, otherwise
    /// the token bucket will not observe clock changes and never refill.
    pub fn new(clock: quanta::Clock) -> Self {
        let origin = clock.recent();
        Self { clock, origin }
    }
}

#[cfg(feature = "quanta")]
impl Clock for FastClock {
    fn now(&self) -> u64 {
        duration_to_millis(self.clock.recent().saturating_duration_since(self.origin))
    }
}

/// Clock following [`tokio::time::Instant`], so it honours
/// `tokio::time::pause` and `tokio::time::advance`. Requires the "tokio" feature.
///
/// # Examples
///
/// ```rust
/// # #[cfg(feature = "tokio")]
/// # {
/// use tokenwell::{TokenBucket, Limit, TokioClock};
/// use std::num::NonZeroU64;
///
/// let limit = Limit::per_second(NonZeroU64::new(100).unwrap());
/// let clock = TokioClock::default();
/// let bucket = TokenBucket::with_clock(limit, clock);
/// # }
/// ```
#[cfg(feature = "tokio")]
#[derive(Clone)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

#[cfg(feature = "tokio")]
impl Default for TokioClock {
    fn default() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

#[cfg(feature = "tokio")]
impl Clock for TokioClock {
    fn now(&self) -> u64 {
        duration_to_millis(self.origin.elapsed())
    }
}

/// Manual clock implementation for testing and simulation.
///
/// Time only moves when told to, which makes refill behaviour deterministic
/// without sleeping. The clock is thread-safe and is typically shared with the
/// bucket through an [`Arc`] or a reference.
///
/// # Examples
///
/// ```rust
/// use tokenwell::{TokenBucket, Limit, ManualClock};
/// use std::sync::Arc;
///
/// let limit = Limit::new(2, 1, 1000).unwrap();
/// let clock = Arc::new(ManualClock::new(0));
/// let bucket = TokenBucket::with_clock(limit, Arc::clone(&clock));
///
/// assert!(bucket.is_request_allowed(2));
/// assert!(!bucket.is_request_allowed(1));
///
/// // one full interval later a token is back
/// clock.advance(1000);
/// assert!(bucket.is_request_allowed(1));
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a new manual clock starting at `now` milliseconds.
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    /// Sets the current time. Moving it backwards is allowed, buckets treat
    /// that as no time having passed.
    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::Release);
    }

    /// Advances the current time by `delta` milliseconds, stopping at `u64::MAX`.
    pub fn advance(&self, delta: u64) {
        let _ = self
            .now
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |now| {
                Some(now.saturating_add(delta))
            });
    }

    /// Advances the current time by `delta`, truncated to whole milliseconds.
    pub fn advance_by(&self, delta: Duration) {
        self.advance(duration_to_millis(delta));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
