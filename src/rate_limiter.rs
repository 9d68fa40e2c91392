use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::{ApiError, Result};

/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: u64 },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

/// Fixed-window state for one (route, client) pair.
#[derive(Debug)]
struct ClientBucket {
    count: u32,
    window_start: Instant,
}

/// Fixed-window request counter keyed by route scope and client address.
///
/// Each key's window is anchored to its own first request, not to a global
/// clock tick. State is process-local; separate instances keep separate
/// budgets.
#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: Arc<Mutex<HashMap<(String, IpAddr), ClientBucket>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            buckets: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn limit(&self) -> u32 {
        self.max_requests
    }

    /// Human-readable policy text for error descriptions.
    pub fn describe(&self) -> String {
        format!("{} per {} seconds", self.max_requests, self.window.as_secs())
    }

    /// Record one request for `client` against `scope` and decide whether it
    /// may proceed.
    pub fn check(&self, scope: &str, client: IpAddr) -> Result<Decision> {
        self.check_at(scope, client, Instant::now())
    }

    fn check_at(&self, scope: &str, client: IpAddr, now: Instant) -> Result<Decision> {
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock poisoned".to_string()))?;

        let bucket = buckets
            .entry((scope.to_string(), client))
            .or_insert(ClientBucket {
                count: 0,
                window_start: now,
            });

        if now.duration_since(bucket.window_start) >= self.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        bucket.count += 1;

        if bucket.count > self.max_requests {
            let remaining_window = self
                .window
                .saturating_sub(now.duration_since(bucket.window_start));
            Ok(Decision::Denied {
                retry_after: remaining_window.as_secs_f64().ceil() as u64,
            })
        } else {
            Ok(Decision::Allowed {
                remaining: self.max_requests - bucket.count,
            })
        }
    }

    /// Drop buckets whose window has expired. Correctness never depends on
    /// this; it only bounds memory growth from one-off clients.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock poisoned".to_string()))?;

        let initial_count = buckets.len();
        buckets.retain(|_, bucket| now.duration_since(bucket.window_start) < self.window);

        Ok(initial_count - buckets.len())
    }

    pub fn tracked_buckets(&self) -> Result<usize> {
        let buckets = self
            .buckets
            .lock()
            .map_err(|_| ApiError::Internal("rate limiter lock poisoned".to_string()))?;
        Ok(buckets.len())
    }
}
