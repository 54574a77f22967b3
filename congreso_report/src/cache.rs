use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use log::debug;

use crate::config::SourceError;

/// How long the record count stays valid.
pub const DEFAULT_COUNT_TTL: Duration = Duration::from_secs(60 * 60);

/// Source of the current time for the cache.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut e = self.elapsed.lock().unwrap_or_else(|p| p.into_inner());
        *e += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let e = self.elapsed.lock().unwrap_or_else(|p| p.into_inner());
        self.start + *e
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct CachedCount {
    value: u64,
    expires_at: Instant,
}

/// A single cached count with a fixed time to live.
///
/// Concurrent refreshes may both hit the source; the last write wins. The
/// entry is replaced as a whole, never partially updated.
pub struct CountCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CachedCount>>,
}

impl CountCache {
    pub fn new(ttl: Duration) -> CountCache {
        CountCache::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> CountCache {
        CountCache {
            ttl,
            clock,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value while it is fresh, otherwise calls
    /// `compute` and stores its result.
    ///
    /// A failing `compute` leaves the previous entry untouched.
    pub fn get_or_refresh<F>(&self, compute: F) -> Result<u64, SourceError>
    where
        F: FnOnce() -> Result<u64, SourceError>,
    {
        let now = self.clock.now();
        {
            let entry = self.entry.read().unwrap_or_else(|p| p.into_inner());
            if let Some(c) = *entry {
                if c.expires_at > now {
                    debug!("CountCache: hit {}", c.value);
                    return Ok(c.value);
                }
            }
        }
        let value = compute()?;
        debug!("CountCache: refreshed to {}", value);
        let mut entry = self.entry.write().unwrap_or_else(|p| p.into_inner());
        *entry = Some(CachedCount {
            value,
            expires_at: now + self.ttl,
        });
        Ok(value)
    }
}

impl Default for CountCache {
    fn default() -> Self {
        CountCache::new(DEFAULT_COUNT_TTL)
    }
}

impl std::fmt::Debug for CountCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountCache")
            .field("ttl", &self.ttl)
            .field("entry", &self.entry)
            .finish()
    }
}
