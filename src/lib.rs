#![doc = include_str!("../README.md")]
//!
//! # Core Components
//!
//! - [`TokenBucket`] - The token bucket with pluggable storage and clock
//! - [`Limit`] - Capacity and refill schedule
//! - [`Clock`] trait and implementations for time sources
//! - Storage implementations for different concurrency needs
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tokenwell::{Limit, ManualClock, TokenBucket};
//!
//! // 20 tokens, 5 more every 1000ms
//! let limit = Limit::new(20, 5, 1000).unwrap();
//! let clock = Arc::new(ManualClock::new(0));
//! let bucket = TokenBucket::with_clock(limit, Arc::clone(&clock));
//!
//! for _ in 0..20 {
//!     assert!(bucket.is_request_allowed(1));
//! }
//! assert!(!bucket.is_request_allowed(1));
//!
//! clock.advance(2000);
//! assert!(bucket.is_request_allowed(1));
//! ```

mod bucket;
mod clock;
mod error;
mod limit;
mod storage;

pub use bucket::TokenBucket;
#[cfg(feature = "tokio")]
pub use clock::TokioClock;
pub use clock::{Clock, ManualClock, StdClock};
#[cfg(feature = "quanta")]
pub use clock::{FastClock, QuantaClock};
pub use error::*;
pub use limit::Limit;

pub use storage::{
    BucketState, StateStorage, local::LocalStorage, mutex::SharedStorage, mutex::SyncStorage,
};
