//! Per-client request throttling with escalating temporary blocks.
//!
//! The counter map lives in the injected [`RateLimiter`] held by `AppState`,
//! not in a module-level global, so a multi-instance deployment can swap in a
//! shared implementation. A sweeper task evicts expired entries periodically.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::AppError;

#[derive(Clone, Copy, Debug)]
pub struct Quota {
    pub max_requests: u32,
    pub window: Duration,
    pub block: Duration,
}

/// 3 orders per minute, then a 30 minute block.
pub const ORDER_QUOTA: Quota = Quota {
    max_requests: 3,
    window: Duration::from_secs(60),
    block: Duration::from_secs(30 * 60),
};

/// 5 contact messages per minute, then a 15 minute block.
pub const CONTACT_QUOTA: Quota = Quota {
    max_requests: 5,
    window: Duration::from_secs(60),
    block: Duration::from_secs(15 * 60),
};

pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug)]
struct Entry {
    count: u32,
    reset_at: Instant,
    blocked_until: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: DashMap<String, Entry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one request for `key` (e.g. `order:1.2.3.4`) and rejects it if
    /// the quota is exhausted. Exceeding the window count starts a block that
    /// outlives the window.
    pub fn check(&self, key: &str, quota: Quota) -> Result<(), AppError> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            count: 0,
            reset_at: now + quota.window,
            blocked_until: None,
        });

        if let Some(until) = entry.blocked_until {
            if now < until {
                return Err(rate_limited(until - now));
            }
            entry.blocked_until = None;
            entry.count = 0;
            entry.reset_at = now + quota.window;
        }

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + quota.window;
        }

        if entry.count >= quota.max_requests {
            let until = now + quota.block;
            entry.blocked_until = Some(until);
            return Err(rate_limited(quota.block));
        }

        entry.count += 1;
        Ok(())
    }

    /// Drops entries whose window and block have both expired.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| {
            now <= entry.reset_at || entry.blocked_until.is_some_and(|until| now < until)
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn rate_limited(retry_after: Duration) -> AppError {
    AppError::RateLimited {
        retry_after_secs: retry_after.as_secs().max(1),
    }
}

/// Evicts stale counters on a fixed interval for the lifetime of the process.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            limiter.sweep();
        }
    })
}
