//! Stat records exported to the host.

/// Point-in-time container statistics.
///
/// The four access counters at the bottom are reserved: this policy does not
/// track per-queue access counts, but downstream stat consumers expect the
/// fields, so they are emitted as zeros.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ContainerStat {
    /// Number of nodes in the container.
    pub size: usize,
    /// Update time of the tail of the eviction-order concatenation:
    /// Tiny tail, else Probation tail, else Protected tail. Zero when empty.
    pub tail_update_time: u32,
    /// Effective promotion refresh time in seconds.
    pub lru_refresh_time: u32,
    /// Reserved, always zero.
    pub num_hot_accesses: u64,
    /// Reserved, always zero.
    pub num_cold_accesses: u64,
    /// Reserved, always zero.
    pub num_warm_accesses: u64,
    /// Reserved, always zero.
    pub num_tail_accesses: u64,
}

/// Age statistics over the Protected segment.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionAgeStat {
    /// Seconds since the Protected tail was last touched; zero when empty.
    pub oldest_element_age: u32,
    /// Age of the element `projection` positions in from the tail. Falls
    /// back to the oldest age when the projection runs off the list.
    pub projected_age: u32,
    /// Number of nodes in the Protected segment.
    pub size: usize,
}
