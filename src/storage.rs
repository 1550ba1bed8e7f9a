pub mod local;
pub mod mutex;

use likely_stable::unlikely;

use crate::{Clock, Limit};

/// Mutable part of a token bucket: the token count and the timestamp of the
/// last refill, in the bucket clock's milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketState {
    tokens: u64,
    last_refill: u64,
}

impl BucketState {
    /// A bucket holding its full capacity, last refilled at `now`.
    pub const fn full(limit: &Limit, now: u64) -> Self {
        Self {
            tokens: limit.capacity(),
            last_refill: now,
        }
    }

    /// Tokens currently available.
    pub const fn tokens(&self) -> u64 {
        self.tokens
    }

    /// Timestamp of the end of the last whole refill interval.
    pub const fn last_refill(&self) -> u64 {
        self.last_refill
    }

    /// Credits the whole intervals elapsed since `last_refill`.
    ///
    /// `last_refill` moves forward by exactly the credited intervals so the
    /// remainder keeps counting towards the next one.
    pub(crate) fn refill(&mut self, limit: &Limit, now: u64) -> Refill {
        let Some(elapsed) = now.checked_sub(self.last_refill) else {
            return Refill::ClockBehind {
                behind: self.last_refill - now,
            };
        };
        let interval = limit.refill_interval_millis();
        let intervals = elapsed / interval;
        if intervals == 0 {
            return Refill::Idle;
        }
        let added = intervals.saturating_mul(limit.refill_tokens());
        self.tokens = self.tokens.saturating_add(added).min(limit.capacity());
        // intervals * interval <= elapsed, cannot overflow
        self.last_refill += intervals * interval;
        Refill::Added {
            intervals,
            available: self.tokens,
        }
    }

    /// Debits `requested` tokens if they are all available.
    pub(crate) fn acquire(&mut self, limit: &Limit, now: u64, requested: u64) -> Acquisition {
        if unlikely(requested > limit.capacity()) {
            return Acquisition::ExceedsCapacity;
        }
        if self.tokens >= requested {
            self.tokens -= requested;
            Acquisition::Acquired
        } else {
            Acquisition::Insufficient {
                available: self.tokens,
                retry_after: self.millis_until(limit, now, requested),
            }
        }
    }

    /// Milliseconds from `now` until the bucket holds `target` tokens, if
    /// nothing else consumes in the meantime.
    fn millis_until(&self, limit: &Limit, now: u64, target: u64) -> u64 {
        let deficit = target.saturating_sub(self.tokens);
        if deficit == 0 {
            return 0;
        }
        let intervals = deficit.div_ceil(limit.refill_tokens());
        let ready_at = self
            .last_refill
            .saturating_add(intervals.saturating_mul(limit.refill_interval_millis()));
        ready_at.saturating_sub(now)
    }

    pub(crate) fn return_tokens(&mut self, limit: &Limit, tokens: u64) -> u64 {
        self.tokens = self.tokens.saturating_add(tokens).min(limit.capacity());
        self.tokens
    }
}

/// What a refill step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Refill {
    /// Less than one interval elapsed.
    Idle,
    Added { intervals: u64, available: u64 },
    /// The clock reported a time before `last_refill`; nothing changed.
    ClockBehind { behind: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Acquisition {
    Acquired,
    Insufficient { available: u64, retry_after: u64 },
    ExceedsCapacity,
}

/// Storage policy abstraction used by [`TokenBucket`](crate::TokenBucket).
///
/// `update` must run the closure with exclusive access to the state; that is
/// what makes refill-then-debit a single step for concurrent callers.
pub trait StateStorage {
    /// Create a new storage holding the provided state.
    fn new(initial: BucketState) -> Self;
    /// Copy out the current state.
    fn load(&self) -> BucketState;
    /// Run `f` with exclusive access to the state.
    fn update<R>(&self, f: impl FnOnce(&mut BucketState) -> R) -> R;
}

/// Primitive token bucket operating on a storage policy. Every operation reads
/// the clock inside the storage's critical section, so refills are applied in
/// clock order.
#[derive(Debug, Clone)]
pub(crate) struct TokenBucketStorage<S> {
    inner: S,
}

impl<S: StateStorage> TokenBucketStorage<S> {
    pub fn new(storage: S) -> Self {
        Self { inner: storage }
    }

    /// Refill, then try to take `requested` tokens.
    pub fn acquire<C: Clock>(
        &self,
        limit: &Limit,
        clock: &C,
        requested: u64,
    ) -> (Refill, Acquisition) {
        self.inner.update(|state| {
            let now = clock.now();
            let refill = state.refill(limit, now);
            (refill, state.acquire(limit, now, requested))
        })
    }

    /// Refill and return the resulting state.
    pub fn balance<C: Clock>(&self, limit: &Limit, clock: &C) -> (Refill, BucketState) {
        self.inner.update(|state| {
            let refill = state.refill(limit, clock.now());
            (refill, *state)
        })
    }

    /// Put tokens back, capped at capacity. Returns the new token count.
    pub fn return_tokens(&self, limit: &Limit, tokens: u64) -> u64 {
        self.inner.update(|state| state.return_tokens(limit, tokens))
    }

    /// State as last written, without refilling.
    pub fn load(&self) -> BucketState {
        self.inner.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> Limit {
        Limit::new(20, 5, 1000).unwrap()
    }

    fn drained(last_refill: u64) -> BucketState {
        BucketState {
            tokens: 0,
            last_refill,
        }
    }

    #[test]
    fn refill_within_interval_is_idle() {
        let mut state = drained(0);
        assert_eq!(Refill::Idle, state.refill(&limit(), 999));
        assert_eq!(drained(0), state);
    }

    #[test]
    fn refill_credits_whole_intervals_only() {
        let mut state = drained(0);
        assert_eq!(
            Refill::Added {
                intervals: 2,
                available: 10
            },
            state.refill(&limit(), 2999)
        );
        assert_eq!(10, state.tokens());
        // 999ms of the elapsed time are carried over
        assert_eq!(2000, state.last_refill());
        assert_eq!(
            Refill::Added {
                intervals: 1,
                available: 15
            },
            state.refill(&limit(), 3000)
        );
        assert_eq!(3000, state.last_refill());
    }

    #[test]
    fn refill_caps_at_capacity_and_keeps_remainder() {
        let mut state = BucketState::full(&limit(), 0);
        state.refill(&limit(), 7500);
        assert_eq!(20, state.tokens());
        assert_eq!(7000, state.last_refill());
    }

    #[test]
    fn refill_survives_huge_gaps() {
        let limit = Limit::new(u64::MAX, u64::MAX, 1).unwrap();
        let mut state = drained(0);
        state.refill(&limit, u64::MAX);
        assert_eq!(u64::MAX, state.tokens());
        assert_eq!(u64::MAX, state.last_refill());
    }

    #[test]
    fn refill_ignores_clock_going_back() {
        let mut state = drained(5000);
        assert_eq!(
            Refill::ClockBehind { behind: 4000 },
            state.refill(&limit(), 1000)
        );
        assert_eq!(drained(5000), state);
    }

    #[test]
    fn acquire_and_retry_estimate() {
        let limit = limit();
        let mut state = drained(0);
        // 7 tokens missing at 5 per interval: two intervals, the first one is 300ms in
        assert_eq!(
            Acquisition::Insufficient {
                available: 0,
                retry_after: 1700
            },
            state.acquire(&limit, 300, 7)
        );
        assert_eq!(0, state.tokens());
        assert_eq!(Acquisition::ExceedsCapacity, state.acquire(&limit, 300, 21));

        let mut state = BucketState::full(&limit, 0);
        assert_eq!(Acquisition::Acquired, state.acquire(&limit, 0, 20));
        assert_eq!(0, state.tokens());
    }

    #[test]
    fn returned_tokens_are_capped() {
        let limit = limit();
        let mut state = drained(0);
        assert_eq!(8, state.return_tokens(&limit, 8));
        assert_eq!(20, state.return_tokens(&limit, 100));
        assert_eq!(0, state.last_refill());
    }
}
