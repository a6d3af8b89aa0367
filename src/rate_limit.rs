//! Best-effort, in-process sliding-window rate limiting.
//!
//! Requests are counted per `(client, minute-bucket)` pair. The limiter is
//! a single-instance guard against abuse, not a correctness-critical quota:
//! there is no persistence across restarts and no cross-process sharing.
//!
//! Time is injected by the caller, so tests can drive the clock
//! deterministically.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::warn;

/// Counts requests per client per one-minute bucket and admits or rejects.
pub struct RateLimiter {
    /// `(client_id, bucket_label)` → request count for that minute.
    counts: DashMap<(String, String), u32>,

    /// Requests admitted per client per bucket before rejection.
    max_per_minute: u32,
}

impl RateLimiter {
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            counts: DashMap::new(),
            max_per_minute,
        }
    }

    /// Record one request from `client_id` at `now` and report whether it
    /// is admitted.
    ///
    /// The first request a client makes in a new bucket evicts that
    /// client's counters from older buckets, a bounded, per-client
    /// cleanup rather than a global sweep. Admission fails once the
    /// post-increment count exceeds the configured threshold.
    pub fn admit(&self, client_id: &str, now: DateTime<Utc>) -> bool {
        let bucket = bucket_label(now);
        let key = (client_id.to_string(), bucket.clone());

        let count = {
            let mut entry = self.counts.entry(key).or_insert(0);
            *entry += 1;
            *entry
        };

        if count == 1 {
            // New bucket for this client: drop its stale buckets. The
            // entry guard above is released before retain takes shard
            // locks.
            self.counts
                .retain(|(client, b), _| client != client_id || *b == bucket);
        }

        if count > self.max_per_minute {
            warn!(client = client_id, count, "rate limit exceeded");
            return false;
        }
        true
    }

    /// Number of live counter entries. Exposed for tests.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.counts.len()
    }
}

/// Minute-resolution bucket label, e.g. `2026-08-06 14:03`.
fn bucket_label(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 14, 3, secs).unwrap()
    }

    fn next_minute() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 6, 14, 4, 0).unwrap()
    }

    #[test]
    fn test_bucket_label_minute_resolution() {
        assert_eq!(bucket_label(at(0)), "2026-08-06 14:03");
        assert_eq!(bucket_label(at(59)), "2026-08-06 14:03");
        assert_eq!(bucket_label(next_minute()), "2026-08-06 14:04");
    }

    #[test]
    fn test_admits_up_to_threshold_then_rejects() {
        let limiter = RateLimiter::new(3);
        for i in 0..3 {
            assert!(limiter.admit("1.2.3.4", at(i)), "request {} should pass", i + 1);
        }
        assert!(!limiter.admit("1.2.3.4", at(30)));
        assert!(!limiter.admit("1.2.3.4", at(59)));
    }

    #[test]
    fn test_new_bucket_resets_saturated_client() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.admit("client", at(0)));
        assert!(limiter.admit("client", at(1)));
        assert!(!limiter.admit("client", at(2)));

        // First request of the next minute succeeds again.
        assert!(limiter.admit("client", next_minute()));
    }

    #[test]
    fn test_stale_buckets_evicted_on_rollover() {
        let limiter = RateLimiter::new(10);
        limiter.admit("client", at(0));
        assert_eq!(limiter.len(), 1);

        limiter.admit("client", next_minute());
        // The 14:03 entry is gone, only 14:04 remains.
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_eviction_spares_other_clients() {
        let limiter = RateLimiter::new(10);
        limiter.admit("alpha", at(0));
        limiter.admit("beta", at(0));
        limiter.admit("alpha", next_minute());

        // alpha's old bucket was dropped; beta's untouched.
        assert_eq!(limiter.len(), 2);
        assert!(limiter.admit("beta", at(30)));
    }

    #[test]
    fn test_clients_are_counted_independently() {
        let limiter = RateLimiter::new(1);
        assert!(limiter.admit("alpha", at(0)));
        assert!(limiter.admit("beta", at(0)));
        assert!(!limiter.admit("alpha", at(1)));
        assert!(!limiter.admit("beta", at(1)));
    }
}
