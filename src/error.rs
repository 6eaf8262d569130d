//! Error types for the wtinylfu engine.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when container configuration parameters are
//!   invalid (tiny percentage or window ratio out of range), both at
//!   construction and from `set_config`.
//! - [`InvariantError`]: Returned by the debug/test-only `check_invariants`
//!   method on the container when segment bookkeeping is inconsistent.
//!
//! ## Example Usage
//!
//! ```
//! use wtinylfu::config::TinyLfuConfig;
//! use wtinylfu::error::ConfigError;
//! use wtinylfu::policy::tiny_lfu::TinyLfuContainer;
//!
//! // Fallible constructor for user-configurable parameters
//! let ok: Result<TinyLfuContainer, ConfigError> =
//!     TinyLfuContainer::new(TinyLfuConfig::default());
//! assert!(ok.is_ok());
//!
//! // Out-of-range tiny size is caught without panicking
//! let bad = TinyLfuContainer::new(TinyLfuConfig {
//!     tiny_size_percent: 75,
//!     ..TinyLfuConfig::default()
//! });
//! assert!(bad.is_err());
//! ```

use std::fmt;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when container configuration parameters are invalid.
///
/// Produced by [`TinyLfuContainer::new`](crate::policy::tiny_lfu::TinyLfuContainer::new),
/// [`set_config`](crate::policy::tiny_lfu::TinyLfuContainer::set_config), and
/// snapshot restoration. Carries a human-readable description of which
/// parameter failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal segment invariants are violated.
///
/// Produced by the debug-only `check_invariants` method on
/// [`TinyLfuContainer`](crate::policy::tiny_lfu::TinyLfuContainer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
