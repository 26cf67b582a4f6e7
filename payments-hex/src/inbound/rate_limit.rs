//! Rate limiting middleware using Governor.
//!
//! Implements per-client rate limiting with a token bucket algorithm.
//! Clients identify themselves with the `X-Client-Id` header. The header is
//! caller-supplied, so the set of tracked clients is bounded: idle buckets
//! are pruned, and once `max_clients` are tracked, unseen ids share a single
//! overflow bucket.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::json;
use std::{
    num::NonZeroU32,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Default cap on distinct client ids tracked at once.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// How often idle buckets are dropped.
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

const ANONYMOUS: &str = "anonymous";
const OVERFLOW: &str = "overflow";

/// One client's bucket and when it was last used.
struct ClientBucket {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    last_seen_ms: AtomicU64,
}

/// Rate limiter state shared across requests.
pub struct RateLimiterState {
    /// Per-client rate limiters
    clients: DashMap<String, ClientBucket>,
    /// Default quota for new clients
    quota: Quota,
    /// A bucket idle this long has fully refilled
    idle_after: Duration,
    max_clients: usize,
    epoch: Instant,
}

impl Default for RateLimiterState {
    fn default() -> Self {
        Self::per_minute(100)
    }
}

impl RateLimiterState {
    /// Allows `requests` per minute per client, all of them as a burst.
    /// Zero is treated as one.
    pub fn per_minute(requests: u32) -> Self {
        let requests = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self::new(Quota::per_minute(requests), DEFAULT_MAX_CLIENTS)
    }

    pub fn new(quota: Quota, max_clients: usize) -> Self {
        let idle_after = quota.replenish_interval() * quota.burst_size().get();
        Self {
            clients: DashMap::new(),
            quota,
            idle_after,
            max_clients: max_clients.max(1),
            epoch: Instant::now(),
        }
    }

    /// Checks if a request should be rate limited.
    /// Returns true if the request is allowed, false if rate limited.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> bool {
        let now_ms = self.millis(now);

        if let Some(bucket) = self.clients.get(key) {
            bucket.last_seen_ms.store(now_ms, Ordering::Relaxed);
            return bucket.limiter.check().is_ok();
        }

        if self.clients.len() >= self.max_clients {
            self.prune_at(now);
        }
        let key = if self.clients.len() >= self.max_clients {
            tracing::warn!(tracked = self.clients.len(), "Client cap reached, using overflow bucket");
            OVERFLOW
        } else {
            key
        };

        let bucket = self
            .clients
            .entry(key.to_string())
            .or_insert_with(|| ClientBucket {
                limiter: RateLimiter::direct(self.quota),
                last_seen_ms: AtomicU64::new(now_ms),
            });
        bucket.last_seen_ms.store(now_ms, Ordering::Relaxed);
        bucket.limiter.check().is_ok()
    }

    /// Drops buckets idle long enough to have fully refilled; they are
    /// indistinguishable from new ones.
    pub fn prune(&self) {
        self.prune_at(Instant::now());
    }

    pub fn prune_at(&self, now: Instant) {
        let now_ms = self.millis(now);
        let idle_ms = self.idle_after.as_millis() as u64;
        self.clients.retain(|_, bucket| {
            now_ms.saturating_sub(bucket.last_seen_ms.load(Ordering::Relaxed)) < idle_ms
        });
    }

    /// Number of client buckets currently held.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    fn millis(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.epoch).as_millis() as u64
    }
}

/// Prunes idle buckets every [`PRUNE_INTERVAL`] until the limiter is dropped.
pub fn spawn_pruner(limiter: &Arc<RateLimiterState>) -> tokio::task::JoinHandle<()> {
    let weak = Arc::downgrade(limiter);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PRUNE_INTERVAL);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let Some(limiter) = weak.upgrade() else { break };
            limiter.prune();
            tracing::debug!(tracked = limiter.tracked_clients(), "Pruned idle rate limit buckets");
        }
    })
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    // Liveness probes are never throttled
    if request.uri().path() == "/ping" {
        return next.run(request).await;
    }

    let key = request
        .headers()
        .get(CLIENT_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(ANONYMOUS)
        .to_string();

    if !limiter.check(&key) {
        tracing::warn!(client_id = %key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "error": "Rate limit exceeded. Please try again later.",
                "code": StatusCode::TOO_MANY_REQUESTS.as_u16(),
                "retry_after_seconds": 60
            })),
        )
            .into_response();
    }

    next.run(request).await
}
