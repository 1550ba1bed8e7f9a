use std::time::Duration;

/// A [`Limit`](crate::Limit) was built from a zero parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConfiguration {
    #[error("bucket capacity must be at least one token")]
    ZeroCapacity,
    #[error("refill amount must be at least one token")]
    ZeroRefillTokens,
    #[error("refill interval must be at least one millisecond")]
    ZeroRefillInterval,
}

/// Not enough tokens right now. Carries an estimate of when the request could
/// succeed if nothing else drains the bucket in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limited; suggested nap duration is {earliest_retry_millis}ms")]
pub struct RateLimited {
    pub(crate) earliest_retry_millis: u64,
}

impl RateLimited {
    /// The suggested duration to wait before retrying.
    pub fn earliest_retry_after(&self) -> Duration {
        Duration::from_millis(self.earliest_retry_millis)
    }

    /// The suggested duration to wait before retrying in milliseconds.
    pub fn earliest_retry_after_millis(&self) -> u64 {
        self.earliest_retry_millis
    }
}

/// The requested amount of tokens can never be granted because it is larger
/// than the bucket capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("requested {requested} tokens but the bucket only holds {capacity}")]
pub struct ExceededCapacity {
    pub requested: u64,
    pub capacity: u64,
}

/// Why [`TokenBucket::try_acquire`](crate::TokenBucket::try_acquire) refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error(transparent)]
    RateLimited(#[from] RateLimited),
    #[error(transparent)]
    ExceededCapacity(#[from] ExceededCapacity),
}

impl Denied {
    /// The retry hint, if waiting can help at all.
    pub fn earliest_retry_after(&self) -> Option<Duration> {
        match self {
            Denied::RateLimited(rl) => Some(rl.earliest_retry_after()),
            Denied::ExceededCapacity(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_rate_limited() {
        let rl = RateLimited {
            earliest_retry_millis: 1500,
        };
        assert_eq!(
            "rate limited; suggested nap duration is 1500ms",
            rl.to_string()
        );
        assert_eq!(Duration::from_millis(1500), rl.earliest_retry_after());
    }

    #[test]
    fn display_exceeded_capacity() {
        let err = ExceededCapacity {
            requested: 21,
            capacity: 20,
        };
        assert_eq!(
            "requested 21 tokens but the bucket only holds 20",
            err.to_string()
        );
    }

    #[test]
    fn denied_is_transparent() {
        let denied: Denied = ExceededCapacity {
            requested: 3,
            capacity: 2,
        }
        .into();
        assert_eq!(
            "requested 3 tokens but the bucket only holds 2",
            denied.to_string()
        );
        assert_eq!(None, denied.earliest_retry_after());

        let denied: Denied = RateLimited {
            earliest_retry_millis: 10,
        }
        .into();
        assert_eq!(Some(Duration::from_millis(10)), denied.earliest_retry_after());
    }

    #[test]
    fn display_invalid_configuration() {
        assert_eq!(
            "refill interval must be at least one millisecond",
            InvalidConfiguration::ZeroRefillInterval.to_string()
        );
    }
}
