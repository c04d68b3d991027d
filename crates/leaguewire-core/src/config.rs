//! Configuration for the event distributor.
//!
//! All values have working defaults; deployments override them through
//! `LEAGUEWIRE_*` environment variables. The poll interval is clamped to
//! its documented bounds wherever the config is loaded from the
//! environment.

use std::env;
use std::time::Duration;

use leaguewire_channels::DEFAULT_RETENTION;

use crate::error::DistributeError;

/// Lower bound of the fallback poll interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Upper bound of the fallback poll interval.
pub const MAX_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Complete distributor configuration.
#[derive(Debug, Clone)]
pub struct DistributorConfig {
    /// NATS server URL (e.g. `nats://localhost:4222`).
    pub nats_url: String,
    /// Shared store URL (e.g. `redis://localhost:6379`).
    pub store_url: String,
    /// How often the fallback feed is polled.
    pub poll_interval: Duration,
    /// Fixed delay between watch retries after a channel fault.
    pub watch_retry_delay: Duration,
    /// Startup delay for the wildcard watcher. Wildcard watches are the
    /// expensive ones and must not race transport initialization.
    pub wildcard_start_delay: Duration,
    /// Retention bound of the fallback feed.
    pub fallback_retention: usize,
    /// Lifetime of a durable copy no process ever dispatches.
    pub durable_ttl: Duration,
    /// Capacity of the per-process recent-id dedup window.
    pub dedup_window: usize,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            nats_url: String::from("nats://localhost:4222"),
            store_url: String::from("redis://localhost:6379"),
            poll_interval: Duration::from_secs(5),
            watch_retry_delay: Duration::from_secs(5),
            wildcard_start_delay: Duration::from_secs(1),
            fallback_retention: DEFAULT_RETENTION,
            durable_ttl: Duration::from_secs(300),
            dedup_window: 256,
        }
    }
}

impl DistributorConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables (defaults apply when absent):
    /// - `LEAGUEWIRE_NATS_URL` -- NATS server connection string
    /// - `LEAGUEWIRE_STORE_URL` -- shared store connection string
    /// - `LEAGUEWIRE_POLL_INTERVAL_SECS` -- fallback poll interval
    /// - `LEAGUEWIRE_WATCH_RETRY_SECS` -- watch retry delay
    /// - `LEAGUEWIRE_WILDCARD_DELAY_MS` -- wildcard watcher startup delay
    /// - `LEAGUEWIRE_FALLBACK_RETENTION` -- fallback feed bound
    /// - `LEAGUEWIRE_DURABLE_TTL_SECS` -- durable copy lifetime
    /// - `LEAGUEWIRE_DEDUP_WINDOW` -- recent-id window capacity
    ///
    /// # Errors
    ///
    /// Returns [`DistributeError::Config`] when a present variable fails
    /// to parse.
    pub fn from_env() -> Result<Self, DistributeError> {
        let mut config = Self::default();
        if let Ok(url) = env::var("LEAGUEWIRE_NATS_URL") {
            config.nats_url = url;
        }
        if let Ok(url) = env::var("LEAGUEWIRE_STORE_URL") {
            config.store_url = url;
        }
        if let Some(secs) = optional_u64("LEAGUEWIRE_POLL_INTERVAL_SECS")? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = optional_u64("LEAGUEWIRE_WATCH_RETRY_SECS")? {
            config.watch_retry_delay = Duration::from_secs(secs);
        }
        if let Some(millis) = optional_u64("LEAGUEWIRE_WILDCARD_DELAY_MS")? {
            config.wildcard_start_delay = Duration::from_millis(millis);
        }
        if let Some(bound) = optional_u64("LEAGUEWIRE_FALLBACK_RETENTION")? {
            config.fallback_retention = usize::try_from(bound).unwrap_or(usize::MAX).max(1);
        }
        if let Some(secs) = optional_u64("LEAGUEWIRE_DURABLE_TTL_SECS")? {
            config.durable_ttl = Duration::from_secs(secs);
        }
        if let Some(window) = optional_u64("LEAGUEWIRE_DEDUP_WINDOW")? {
            config.dedup_window = usize::try_from(window).unwrap_or(usize::MAX).max(1);
        }
        Ok(config.clamped())
    }

    /// Clamp the poll interval into its documented bounds.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.poll_interval = self.poll_interval.clamp(MIN_POLL_INTERVAL, MAX_POLL_INTERVAL);
        self
    }
}

/// Read an optional integer environment variable.
fn optional_u64(name: &str) -> Result<Option<u64>, DistributeError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|e| DistributeError::Config(format!("{name} is not a valid integer: {e}"))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(DistributeError::Config(format!("{name}: {e}"))),
    }
}
