use std::num::NonZeroU64;
use std::time::Duration;

use crate::error::InvalidConfiguration;

const MILLIS_PER_SECOND: NonZeroU64 = NonZeroU64::new(1_000).unwrap();
const MILLIS_PER_MINUTE: NonZeroU64 = NonZeroU64::new(60_000).unwrap();

/// Capacity and refill schedule of a token bucket.
///
/// Every `refill_interval_millis` milliseconds the bucket gains `refill_tokens`
/// tokens, never holding more than `capacity`. Partial intervals add nothing
/// until they complete.
///
/// # Examples
///
/// ```rust
/// use tokenwell::Limit;
/// use std::num::NonZeroU64;
///
/// // 5 tokens every second, up to 20 stored
/// let limit = Limit::new(20, 5, 1000).unwrap();
/// assert_eq!(limit.capacity(), 20);
///
/// // 100 tokens per second, burst of 100
/// let limit = Limit::per_second(NonZeroU64::new(100).unwrap());
/// assert_eq!(limit.refill_interval_millis(), 1000);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    capacity: NonZeroU64,
    refill_tokens: NonZeroU64,
    refill_interval: NonZeroU64,
}

impl std::fmt::Debug for Limit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Limit(capacity={}, refill={} per {}ms)",
            self.capacity, self.refill_tokens, self.refill_interval
        )
    }
}

impl Limit {
    /// Creates a limit, rejecting any zero parameter.
    ///
    /// # Errors
    ///
    /// [`InvalidConfiguration`] naming the first parameter that is zero.
    pub const fn new(
        capacity: u64,
        refill_tokens: u64,
        refill_interval_millis: u64,
    ) -> Result<Self, InvalidConfiguration> {
        let Some(capacity) = NonZeroU64::new(capacity) else {
            return Err(InvalidConfiguration::ZeroCapacity);
        };
        let Some(refill_tokens) = NonZeroU64::new(refill_tokens) else {
            return Err(InvalidConfiguration::ZeroRefillTokens);
        };
        let Some(refill_interval) = NonZeroU64::new(refill_interval_millis) else {
            return Err(InvalidConfiguration::ZeroRefillInterval);
        };
        Ok(Self::from_nonzero(capacity, refill_tokens, refill_interval))
    }

    /// Creates a limit from parameters that are already known to be non-zero.
    pub const fn from_nonzero(
        capacity: NonZeroU64,
        refill_tokens: NonZeroU64,
        refill_interval_millis: NonZeroU64,
    ) -> Self {
        Self {
            capacity,
            refill_tokens,
            refill_interval: refill_interval_millis,
        }
    }

    /// `rate` tokens added once per second; the capacity equals the rate.
    ///
    /// ```rust
    /// use tokenwell::Limit;
    /// use std::num::NonZeroU64;
    ///
    /// let limit = Limit::per_second(NonZeroU64::new(10).unwrap());
    /// assert_eq!(limit.capacity(), 10);
    /// assert_eq!(limit.refill_tokens(), 10);
    /// ```
    pub const fn per_second(rate: NonZeroU64) -> Self {
        Self::from_nonzero(rate, rate, MILLIS_PER_SECOND)
    }

    /// `rate` tokens added once per minute; the capacity equals the rate.
    pub const fn per_minute(rate: NonZeroU64) -> Self {
        Self::from_nonzero(rate, rate, MILLIS_PER_MINUTE)
    }

    /// Replaces the capacity, keeping the refill schedule.
    ///
    /// ```rust
    /// use tokenwell::Limit;
    /// use std::num::NonZeroU64;
    ///
    /// let limit = Limit::per_second(NonZeroU64::new(10).unwrap())
    ///     .with_capacity(NonZeroU64::new(100).unwrap());
    /// assert_eq!(limit.capacity(), 100);
    /// assert_eq!(limit.refill_tokens(), 10);
    /// ```
    pub const fn with_capacity(mut self, capacity: NonZeroU64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Maximum number of tokens the bucket can hold.
    pub const fn capacity(&self) -> u64 {
        self.capacity.get()
    }

    /// Tokens added per completed interval.
    pub const fn refill_tokens(&self) -> u64 {
        self.refill_tokens.get()
    }

    /// Length of one refill interval in milliseconds.
    pub const fn refill_interval_millis(&self) -> u64 {
        self.refill_interval.get()
    }

    /// Length of one refill interval.
    pub const fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.refill_interval.get())
    }
}
