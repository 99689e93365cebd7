//! Per-client request quota keyed by client identifier.
//!
//! Each client gets a GCRA quota from `governor`: bursts of up to
//! `max_requests`, refilled evenly across the window. State is
//! process-local. The keyed store is bounded at `max_clients`; when it is
//! full after dropping replenished clients, further requests share a single
//! overflow quota until space frees up.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::StateInformationMiddleware;
use governor::state::keyed::DashMapStateStore;
use governor::state::{InMemoryState, NotKeyed};
use governor::{NotUntil, Quota};

/// Default number of requests allowed per window.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Default upper bound on tracked clients.
pub const DEFAULT_MAX_CLIENTS: usize = 10_000;

/// Shortest replenish interval governor accepts.
const MIN_INTERVAL: Duration = Duration::from_nanos(1);

type KeyedLimiter<C> =
    governor::RateLimiter<String, DashMapStateStore<String>, C, StateInformationMiddleware>;
type OverflowLimiter<C> =
    governor::RateLimiter<NotKeyed, InMemoryState, C, StateInformationMiddleware>;

/// Outcome of a single [`RateLimiter::check`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Allowed: time until the full burst is available again.
    /// Rejected: time until the next request would be accepted.
    pub reset_in: Duration,
}

pub struct RateLimiter<C: Clock = DefaultClock> {
    clients: KeyedLimiter<C>,
    overflow: OverflowLimiter<C>,
    clock: C,
    max_requests: u32,
    interval: Duration,
    max_clients: usize,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration, max_clients: usize) -> Self {
        Self::with_clock(max_requests, window, max_clients, DefaultClock::default())
    }
}

impl<C: Clock + Clone> RateLimiter<C> {
    /// Build a limiter driven by `clock`.
    pub fn with_clock(max_requests: u32, window: Duration, max_clients: usize, clock: C) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let interval = (window / burst.get()).max(MIN_INTERVAL);
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            clients: governor::RateLimiter::dashmap_with_clock(quota, clock.clone())
                .with_middleware::<StateInformationMiddleware>(),
            overflow: governor::RateLimiter::direct_with_clock(quota, clock.clone())
                .with_middleware::<StateInformationMiddleware>(),
            clock,
            max_requests: burst.get(),
            interval,
            max_clients: max_clients.max(1),
        }
    }

    /// Record one request from `client` and decide whether it may proceed.
    pub fn check(&self, client: &str) -> RateDecision {
        let outcome = if self.has_room() {
            self.clients.check_key(&client.to_string())
        } else {
            self.overflow.check()
        };

        match outcome {
            Ok(snapshot) => {
                let remaining = snapshot.remaining_burst_capacity().min(self.max_requests);
                let reset_in = self.interval * (self.max_requests - remaining);
                self.decision(true, remaining, reset_in)
            }
            Err(not_until) => self.decision(false, 0, self.wait_time(&not_until)),
        }
    }

    /// Drop every client whose quota has fully replenished. Returns the
    /// number removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.clients.len();
        self.clients.retain_recent();
        self.clients.shrink_to_fit();
        before.saturating_sub(self.clients.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    fn has_room(&self) -> bool {
        if self.clients.len() < self.max_clients {
            return true;
        }
        self.clients.retain_recent();
        self.clients.len() < self.max_clients
    }

    fn wait_time(&self, not_until: &NotUntil<C::Instant>) -> Duration {
        not_until.wait_time_from(self.clock.now())
    }

    fn decision(&self, allowed: bool, remaining: u32, reset_in: Duration) -> RateDecision {
        RateDecision {
            allowed,
            limit: self.max_requests,
            remaining,
            reset_in,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW, DEFAULT_MAX_CLIENTS)
    }
}
