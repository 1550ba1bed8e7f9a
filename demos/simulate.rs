//! Simulated API traffic against a few bucket configurations.
//!
//! Run with `RUST_LOG=tokenwell=trace` to see refills and denials.

use std::sync::Arc;

use tokenwell::{Denied, Limit, ManualClock, TokenBucket};
use tracing_subscriber::EnvFilter;

type Bucket = TokenBucket<tokenwell::SyncStorage, Arc<ManualClock>>;

fn bucket(
    capacity: u64,
    refill_tokens: u64,
    refill_interval_millis: u64,
) -> (Arc<ManualClock>, Bucket) {
    let clock = Arc::new(ManualClock::default());
    let limit = Limit::new(capacity, refill_tokens, refill_interval_millis)
        .expect("demo limits are valid");
    (Arc::clone(&clock), TokenBucket::with_clock(limit, clock))
}

/// Sends `calls` one-token requests, `gap_millis` apart.
fn simulate_calls(clock: &ManualClock, tb: &Bucket, calls: usize, gap_millis: u64) {
    let (mut allowed, mut denied) = (0, 0);
    for i in 0..calls {
        match tb.try_acquire_one() {
            Ok(()) => {
                println!("request {}: allowed", i + 1);
                allowed += 1;
            }
            Err(Denied::RateLimited(rl)) => {
                println!(
                    "request {}: denied, retry in {:?}",
                    i + 1,
                    rl.earliest_retry_after()
                );
                denied += 1;
            }
            Err(err) => {
                println!("request {}: denied, {err}", i + 1);
                denied += 1;
            }
        }
        clock.advance(gap_millis);
    }
    println!("allowed: {allowed}, denied: {denied}");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("scenario 1: 5 requests per second, back to back");
    let (clock, tb) = bucket(5, 5, 1000);
    simulate_calls(&clock, &tb, 10, 0);

    println!("\nscenario 2: bursts of 10, 5 tokens per second sustained");
    let (clock, tb) = bucket(10, 5, 1000);
    simulate_calls(&clock, &tb, 15, 0);

    println!("\nscenario 3: 1 token per second, one request per second");
    let (clock, tb) = bucket(5, 1, 1000);
    for second in 0..10 {
        let outcome = if tb.is_request_allowed(1) { "allowed" } else { "denied" };
        println!("second {second}: {outcome}, tokens left: {}", tb.available());
        clock.advance(1000);
    }

    println!("\nscenario 4: 200 requests 50ms apart against 10/s with a burst of 100");
    let (clock, tb) = bucket(100, 1, 100);
    simulate_calls(&clock, &tb, 200, 50);

    println!("\nscenario 5: growing requests against 2 tokens per second, capacity 10");
    let (clock, tb) = bucket(10, 2, 1000);
    for tokens in 1..=5 {
        if tb.is_request_allowed(tokens) {
            println!("took {tokens} tokens, left: {}", tb.available());
        } else {
            println!("could not take {tokens} tokens, available: {}", tb.available());
        }
        clock.advance(1000);
    }

    println!("\nscenario 6: requests larger than the bucket");
    let (clock, tb) = bucket(3, 1, 1000);
    tb.add_tokens(1);
    simulate_calls(&clock, &tb, 1, 0);
    match tb.try_acquire(4) {
        Ok(()) => println!("4 tokens granted"),
        Err(err) => println!("4 tokens refused: {err}"),
    }
}
