//! Serialized container state.
//!
//! A snapshot carries the configuration, the effective refresh time, and the
//! topology of the three segment lists (head→tail). The frequency sketch is
//! deliberately not persisted: on restore it is reinitialized empty and
//! grows back as the host re-registers nodes, the same trade the original
//! implementation makes.
//!
//! Serialization must happen with no concurrent reader or writer; mutating
//! the container afterwards leaves the snapshot describing a stale state.

use serde::{Deserialize, Serialize};

use crate::config::TinyLfuConfig;

/// One node's entry in a serialized segment list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    /// The node's key bytes; the identifier the host rebinds on restore.
    pub key: Vec<u8>,
    /// Seconds since epoch of the node's last list movement.
    pub update_time: u32,
    /// Whether the node had been accessed since insertion.
    pub accessed: bool,
}

/// Serialized form of a [`TinyLfuContainer`](crate::policy::tiny_lfu::TinyLfuContainer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSnapshot {
    /// Configuration at snapshot time.
    pub config: TinyLfuConfig,
    /// Effective refresh time, which may differ from the configured default
    /// when reconfiguration has been adjusting it.
    pub lru_refresh_time: u32,
    /// Tiny segment, head→tail.
    pub tiny: Vec<SnapshotNode>,
    /// Probation segment, head→tail.
    pub probation: Vec<SnapshotNode>,
    /// Protected segment, head→tail.
    pub protected: Vec<SnapshotNode>,
}

impl ContainerSnapshot {
    /// Total number of nodes across the three lists.
    pub fn len(&self) -> usize {
        self.tiny.len() + self.probation.len() + self.protected.len()
    }

    /// Returns `true` if the snapshot holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
