//! Sliding-window admission control for outbound calls.
//!
//! One limiter exists per remote collaborator (hosting API, assistant
//! service) so exhausting one never blocks the other. The limiter never
//! waits: a refused call is reported to the caller immediately.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Source of the current instant, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock backed [`Clock`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Ceiling and window of a limiter.
///
/// The window is written as `window_secs` and may be fractional
/// (`window_secs = 0.5`); it keeps sub-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum number of admitted calls inside one window
    pub max_calls: usize,
    #[serde(rename = "window_secs", with = "window_secs")]
    window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self { max_calls, window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// A zero window would evict every entry on each check and admit
    /// everything, so it is refused.
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(Error::InvalidRequest {
                message: "rate limit window must be longer than zero".to_string(),
            });
        }
        Ok(())
    }
}

mod window_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(window: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if window.subsec_nanos() == 0 {
            serializer.serialize_u64(window.as_secs())
        } else {
            serializer.serialize_f64(window.as_secs_f64())
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }
}

/// Log-based sliding-window rate limiter.
///
/// Admission check and recording happen under one lock so concurrent
/// callers can never both take the last slot.
pub struct RateLimiter {
    name: String,
    max_calls: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    log: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Self {
        Self::with_clock(name, config, Arc::new(SystemClock))
    }

    pub fn with_clock(name: impl Into<String>, config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            name: name.into(),
            max_calls: config.max_calls,
            window: config.window(),
            clock,
            log: Mutex::new(VecDeque::with_capacity(config.max_calls)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a new call may proceed now, recording it if so.
    pub fn admit(&self) -> bool {
        let now = self.clock.now();
        let mut log = self.log.lock();
        self.evict_expired(&mut log, now);

        if log.len() < self.max_calls {
            log.push_back(now);
            true
        } else {
            false
        }
    }

    /// Like [`admit`](Self::admit), but returns a `RateLimited` error carrying
    /// the wait hint when refused.
    pub fn try_admit(&self) -> Result<()> {
        if self.admit() {
            Ok(())
        } else {
            let retry_after = self.time_until_next_slot();
            tracing::debug!(limiter = %self.name, ?retry_after, "call refused by rate limiter");
            Err(Error::RateLimited { retry_after })
        }
    }

    /// Time until a call would be admitted; zero when a slot is free now.
    pub fn time_until_next_slot(&self) -> Duration {
        let now = self.clock.now();
        let mut log = self.log.lock();
        self.evict_expired(&mut log, now);

        if log.len() < self.max_calls {
            return Duration::ZERO;
        }
        // The slot frees when the entry that brings us under the ceiling expires
        let blocking = log.len() - self.max_calls;
        log.get(blocking)
            .map(|oldest| (*oldest + self.window).saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Number of calls currently counted against the window.
    pub fn in_window(&self) -> usize {
        let now = self.clock.now();
        let mut log = self.log.lock();
        self.evict_expired(&mut log, now);
        log.len()
    }

    fn evict_expired(&self, log: &mut VecDeque<Instant>, now: Instant) {
        while let Some(oldest) = log.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("name", &self.name)
            .field("max_calls", &self.max_calls)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}
