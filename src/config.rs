//! Container configuration.
//!
//! All knobs recognized by the eviction engine, with the defaults the
//! original deployment uses. Construction-time validation lives here;
//! [`TinyLfuContainer::new`](crate::policy::tiny_lfu::TinyLfuContainer::new)
//! and `set_config` both reject out-of-range `tiny_size_percent` and
//! `window_to_cache_size_ratio` values with a
//! [`ConfigError`](crate::error::ConfigError). The other ranges below
//! describe the meaningful domain but are not enforced.
//!
//! | Field                          | Range     | Default | Effect                                  |
//! |--------------------------------|-----------|---------|-----------------------------------------|
//! | `default_lru_refresh_time`     | seconds   | 60      | Promotion throttle baseline             |
//! | `lru_refresh_ratio`            | ≥ 0.0     | 0.0     | Refresh time as a ratio of tail age     |
//! | `update_on_write`              | bool      | false   | Writes drive promotion                  |
//! | `update_on_read`               | bool      | true    | Reads drive promotion                   |
//! | `try_lock_update`              | bool      | false   | Non-blocking lock in `record_access`    |
//! | `window_to_cache_size_ratio`   | [2, 128]  | 32      | Decay window as a multiple of capacity  |
//! | `tiny_size_percent`            | [1, 50]   | 1       | Tiny segment share of the population    |
//! | `mm_reconfigure_interval_secs` | seconds   | 0 (off) | Refresh-time recomputation cadence      |
//! | `newcomer_wins_on_tie`         | bool      | true    | Tie-break for tail admission            |
//! | `protection_freq`              | count     | 3       | Sketch count needed to enter Protected  |
//! | `protection_segment_size_pct`  | (0, 100]  | 80      | Protected share of the main cache       |

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a [`TinyLfuContainer`](crate::policy::tiny_lfu::TinyLfuContainer).
///
/// # Example
///
/// ```
/// use wtinylfu::config::TinyLfuConfig;
///
/// let config = TinyLfuConfig {
///     tiny_size_percent: 5,
///     update_on_write: true,
///     ..TinyLfuConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TinyLfuConfig {
    /// Threshold in seconds compared against a node's update time to decide
    /// whether an access may move the node in its list. A node is promoted
    /// at most once per refresh interval regardless of how many accesses it
    /// gets; the default of 60s keeps contention on the container lock down.
    pub default_lru_refresh_time: u32,

    /// Ratio of refresh time to the Protected tail age. When reconfiguration
    /// is enabled, `tail_age * ratio` replaces the default refresh time
    /// whenever it is larger. `0.0` leaves the refresh time fixed.
    pub lru_refresh_ratio: f64,

    /// Whether write accesses drive promotion. When `false`, writes never
    /// move the node to the head of its list.
    pub update_on_write: bool,

    /// Whether read accesses drive promotion.
    pub update_on_read: bool,

    /// Use a non-blocking lock attempt in `record_access`. On contention the
    /// promotion opportunity is dropped and the call reports `false`.
    pub try_lock_update: bool,

    /// Multiplier for the decay window given the sized-for capacity. Counts
    /// are halved after `capacity * ratio` promotion-driving accesses.
    pub window_to_cache_size_ratio: usize,

    /// Tiny segment size as a percentage of the whole population.
    pub tiny_size_percent: usize,

    /// Minimum interval between refresh-time recomputations. `0` disables
    /// reconfiguration entirely.
    pub mm_reconfigure_interval_secs: u32,

    /// If `true`, a Tiny-tail node whose frequency ties the Probation tail
    /// wins admission. Good default; undesirable for strict scan patterns
    /// where every key is seen exactly once.
    pub newcomer_wins_on_tie: bool,

    /// Minimum sketch count for a Probation node to be promoted into the
    /// Protected segment.
    pub protection_freq: u32,

    /// Protected segment size as a percentage of the main cache
    /// (Probation + Protected).
    pub protection_segment_size_pct: usize,
}

impl Default for TinyLfuConfig {
    fn default() -> Self {
        Self {
            default_lru_refresh_time: 60,
            lru_refresh_ratio: 0.0,
            update_on_write: false,
            update_on_read: true,
            try_lock_update: false,
            window_to_cache_size_ratio: 32,
            tiny_size_percent: 1,
            mm_reconfigure_interval_secs: 0,
            newcomer_wins_on_tie: true,
            protection_freq: 3,
            protection_segment_size_pct: 80,
        }
    }
}

impl TinyLfuConfig {
    /// Validates the tiny-size and window-ratio ranges; other options are
    /// accepted as given.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tiny_size_percent < 1 || self.tiny_size_percent > 50 {
            return Err(ConfigError::new(format!(
                "invalid tiny cache size {}%: must be between 1% and 50% of the total size",
                self.tiny_size_percent
            )));
        }
        if self.window_to_cache_size_ratio < 2 || self.window_to_cache_size_ratio > 128 {
            return Err(ConfigError::new(format!(
                "invalid window to cache size ratio {}: must be between 2 and 128",
                self.window_to_cache_size_ratio
            )));
        }
        Ok(())
    }
}
