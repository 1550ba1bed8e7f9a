use tracing::{debug, trace};

use crate::error::{Denied, ExceededCapacity, InvalidConfiguration, RateLimited};
use crate::storage::mutex::SyncStorage;
use crate::storage::{Acquisition, BucketState, Refill, StateStorage, TokenBucketStorage};
use crate::{Clock, Limit, StdClock};

/// A token bucket rate limiter with configurable storage and clock implementations.
///
/// The bucket starts full. Every completed refill interval adds a fixed number
/// of tokens, up to the capacity, and each admitted request takes the tokens it
/// asked for. Refills happen lazily on every call, inside the same critical
/// section as the admission decision.
///
/// # Type Parameters
///
/// - `S`: Storage strategy (default: [`SyncStorage`] for concurrent access)
/// - `C`: Clock implementation (default: [`StdClock`])
///
/// # Examples
///
/// ```rust
/// use tokenwell::TokenBucket;
///
/// // 20 tokens, 5 more every second
/// let bucket = TokenBucket::new(20, 5, 1000).unwrap();
///
/// assert!(bucket.is_request_allowed(20));
/// assert!(!bucket.is_request_allowed(1));
/// ```
#[derive(Clone)]
pub struct TokenBucket<S = SyncStorage, C = StdClock> {
    bucket: TokenBucketStorage<S>,
    clock: C,
    limit: Limit,
}

impl TokenBucket<SyncStorage, StdClock> {
    /// Creates a full bucket using the standard clock.
    ///
    /// # Errors
    ///
    /// [`InvalidConfiguration`] if any of the parameters is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tokenwell::{InvalidConfiguration, TokenBucket};
    ///
    /// assert!(TokenBucket::new(20, 5, 1000).is_ok());
    /// assert_eq!(
    ///     Some(InvalidConfiguration::ZeroRefillInterval),
    ///     TokenBucket::new(20, 5, 0).err()
    /// );
    /// ```
    pub fn new(
        capacity: u64,
        refill_tokens: u64,
        refill_interval_millis: u64,
    ) -> Result<Self, InvalidConfiguration> {
        let limit = Limit::new(capacity, refill_tokens, refill_interval_millis)?;
        Ok(Self::from_limit(limit))
    }

    /// Creates a full bucket for an already validated [`Limit`].
    pub fn from_limit(limit: Limit) -> Self {
        Self::from_parts(limit, StdClock::default())
    }
}

impl<C: Clock> TokenBucket<SyncStorage, C> {
    /// Creates a new token bucket with a custom clock implementation.
    ///
    /// Use this when you need a specific timing source, such as `FastClock`
    /// for high-performance scenarios or [`ManualClock`](crate::ManualClock) for testing.
    pub fn with_clock(limit: Limit, clock: C) -> Self {
        Self::from_parts(limit, clock)
    }
}

impl<S: StateStorage, C: Clock> TokenBucket<S, C> {
    /// Creates a token bucket from custom storage and clock implementations.
    ///
    /// The bucket starts full and its first refill interval starts now.
    pub fn from_parts(limit: Limit, clock: C) -> Self {
        let now = clock.now();
        debug!(?limit, now, "created token bucket");
        Self {
            bucket: TokenBucketStorage::new(S::new(BucketState::full(&limit, now))),
            clock,
            limit,
        }
    }

    /// Decides whether a request for `tokens_requested` tokens is admitted.
    ///
    /// Tokens are debited only when the whole amount is available. A request
    /// for more than the capacity is always denied. A request for zero tokens
    /// is always admitted. Denial is a normal outcome and leaves the token
    /// count untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tokenwell::TokenBucket;
    ///
    /// let bucket = TokenBucket::new(20, 5, 1000).unwrap();
    /// for _ in 0..4 {
    ///     assert!(bucket.is_request_allowed(5));
    /// }
    /// assert!(!bucket.is_request_allowed(5));
    /// ```
    pub fn is_request_allowed(&self, tokens_requested: u64) -> bool {
        self.try_acquire(tokens_requested).is_ok()
    }

    /// Convenience method equivalent to `is_request_allowed(1)`.
    pub fn is_request_allowed_one(&self) -> bool {
        self.is_request_allowed(1)
    }

    /// Like [`is_request_allowed`](Self::is_request_allowed), but explains a denial.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The tokens were taken
    /// * `Err(Denied::RateLimited)` - Not enough tokens yet, with a retry hint
    /// * `Err(Denied::ExceededCapacity)` - The request can never be satisfied
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tokenwell::{Denied, TokenBucket};
    ///
    /// let bucket = TokenBucket::new(20, 5, 1000).unwrap();
    /// assert!(bucket.try_acquire(20).is_ok());
    ///
    /// match bucket.try_acquire(5) {
    ///     Ok(()) => unreachable!("bucket is empty"),
    ///     Err(Denied::RateLimited(rate_limited)) => {
    ///         println!("retry in {:?}", rate_limited.earliest_retry_after());
    ///     }
    ///     Err(Denied::ExceededCapacity(_)) => unreachable!("5 fits in 20"),
    /// }
    /// ```
    pub fn try_acquire(&self, tokens: u64) -> Result<(), Denied> {
        let (refill, acquisition) = self.bucket.acquire(&self.limit, &self.clock, tokens);
        log_refill(refill);
        match acquisition {
            Acquisition::Acquired => Ok(()),
            Acquisition::Insufficient {
                available,
                retry_after,
            } => {
                trace!(
                    requested = tokens,
                    available,
                    retry_after_ms = retry_after,
                    "request denied"
                );
                Err(RateLimited {
                    earliest_retry_millis: retry_after,
                }
                .into())
            }
            Acquisition::ExceedsCapacity => {
                trace!(
                    requested = tokens,
                    capacity = self.limit.capacity(),
                    "request denied, larger than capacity"
                );
                Err(ExceededCapacity {
                    requested: tokens,
                    capacity: self.limit.capacity(),
                }
                .into())
            }
        }
    }

    /// Convenience method equivalent to `try_acquire(1)`.
    pub fn try_acquire_one(&self) -> Result<(), Denied> {
        self.try_acquire(1)
    }

    /// Returns unused tokens to the bucket, e.g. from a cancelled request.
    ///
    /// The bucket never holds more than its capacity; the refill schedule is
    /// not affected.
    pub fn add_tokens(&self, tokens: u64) {
        let available = self.bucket.return_tokens(&self.limit, tokens);
        trace!(returned = tokens, available, "returned tokens to bucket");
    }

    /// Number of tokens available for immediate consumption.
    pub fn available(&self) -> u64 {
        self.snapshot().tokens()
    }

    /// Current state of the bucket, after crediting any completed intervals.
    pub fn snapshot(&self) -> BucketState {
        let (refill, state) = self.bucket.balance(&self.limit, &self.clock);
        log_refill(refill);
        state
    }

    /// Returns a reference to the rate limit configuration.
    pub fn limit(&self) -> &Limit {
        &self.limit
    }

    /// Maximum number of tokens the bucket can hold.
    pub fn capacity(&self) -> u64 {
        self.limit.capacity()
    }
}

impl<S: StateStorage, C> std::fmt::Debug for TokenBucket<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenBucket")
            .field("limit", &self.limit)
            .field("state", &self.bucket.load())
            .finish()
    }
}

fn log_refill(refill: Refill) {
    match refill {
        Refill::Idle => {}
        Refill::Added {
            intervals,
            available,
        } => trace!(intervals, available, "refilled token bucket"),
        Refill::ClockBehind { behind } => debug!(
            behind_ms = behind,
            "clock is behind the last refill, skipping refill"
        ),
    }
}
