//! W-TinyLFU eviction container.
//!
//! Implements the W-TinyLFU cache eviction policy: a small Tiny window in
//! front of a Segmented-LRU main cache, arbitrated by a Count-Min frequency
//! sketch. Entries start in Tiny, graduate into Probation, and are promoted
//! into Protected once their estimated frequency clears a threshold. The
//! sketch is periodically halved so frequency estimates weigh recent
//! accesses over stale history.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                       TinyLfuContainer Layout                            │
//! │                                                                          │
//! │   TINY (≈1%)              PROBATION                PROTECTED (≈80% of    │
//! │   ┌───────────┐           ┌───────────────┐        ┌────── main) ──────┐ │
//! │   │ MRU   LRU │  tiny     │ MRU       LRU │ freq > │ MRU           LRU │ │
//! │   │  ▼     ▼  │  over     │  ▼         ▼  │ thresh │  ▼             ▼  │ │
//! │   │ [new]◄►[.]│ ─quota──► │ [..] ◄──► [.] │ ─────► │ [hot] ◄──► [cold] │ │
//! │   └───────────┘           └───────────────┘        └───────┬───────────┘ │
//! │         ▲                        ▲    ▲                    │             │
//! │         └── tail swap when ──────┘    └── demotion to tail ┘             │
//! │             tiny tail outranks            when over quota                │
//! │             probation tail                                               │
//! │                                                                          │
//! │   CountMinSketch: increment on every promotion-driving access,           │
//! │   halved each time the window counter reaches capacity × ratio.          │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! A single container-wide `parking_lot::Mutex` protects the three lists,
//! the sketch, the window counter, and the configuration. The effective
//! refresh time and the next reconfiguration deadline are relaxed atomics so
//! stat readers can observe them without the lock; every other field is only
//! touched under the lock. The eviction iterator holds the lock for its
//! lifetime, so at most one can exist at a time and calling any other
//! container method from the same thread while one is live will deadlock.
//!
//! ## Example
//!
//! ```
//! use wtinylfu::config::TinyLfuConfig;
//! use wtinylfu::node::AccessMode;
//! use wtinylfu::policy::tiny_lfu::TinyLfuContainer;
//!
//! let container = TinyLfuContainer::new(TinyLfuConfig::default()).unwrap();
//!
//! let id = container.create_node(b"user:42");
//! assert!(container.add(id));
//! assert!(container.record_access(id, AccessMode::Read));
//!
//! // Pick an eviction victim; the host then destroys its item.
//! let victim = container.with_eviction_iterator(|it| it.remove_current());
//! assert_eq!(victim, Some(id));
//! assert!(container.destroy_node(id));
//! ```

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, trace};
use parking_lot::{Mutex, MutexGuard};

use crate::config::TinyLfuConfig;
use crate::ds::{CountMinSketch, DList};
use crate::error::{ConfigError, InvariantError};
use crate::node::{AccessMode, NodeArena, NodeId};
use crate::snapshot::{ContainerSnapshot, SnapshotNode};
use crate::stats::{ContainerStat, EvictionAgeStat};

/// Sketch sizing floor when the host gives no capacity estimate.
const DEFAULT_CAPACITY: usize = 100;

/// Error tolerance for the frequency counters; the counter count is roughly
/// the decay window divided by this.
const ERROR_THRESHOLD: usize = 5;

/// Upper bound on the effective refresh time, in seconds.
const LRU_REFRESH_TIME_CAP: u32 = 900;

/// The segment a node currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// The admission window; all inserts land here.
    Tiny,
    /// Unproven main-cache entries.
    Probation,
    /// Frequently reused main-cache entries.
    Protected,
}

impl SegmentKind {
    const ALL: [SegmentKind; 3] = [
        SegmentKind::Tiny,
        SegmentKind::Probation,
        SegmentKind::Protected,
    ];

    fn index(self) -> usize {
        match self {
            SegmentKind::Tiny => 0,
            SegmentKind::Probation => 1,
            SegmentKind::Protected => 2,
        }
    }
}

fn now_secs() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}

fn tiny_quota(tiny_pct: usize, capacity: usize) -> usize {
    // The window is a share of the sized-for capacity, not the live
    // population; the quota only moves when the sketch capacity grows.
    tiny_pct * capacity / 100
}

/// All state guarded by the container lock.
#[derive(Debug)]
struct ContainerState {
    nodes: NodeArena,
    /// Segment lists indexed by `SegmentKind::index`.
    lists: [DList; 3],
    sketch: CountMinSketch,
    /// Promotion-driving accesses since the last decay or resize.
    window_size: u64,
    /// Window size at which the sketch is halved.
    max_window_size: u64,
    /// Population the sketch is currently sized for.
    capacity: usize,
    /// The sketch is never sized below this.
    capacity_floor: usize,
    config: TinyLfuConfig,
}

impl ContainerState {
    fn population(&self) -> usize {
        self.lists.iter().map(DList::len).sum()
    }

    fn list(&self, seg: SegmentKind) -> &DList {
        &self.lists[seg.index()]
    }

    fn link_at_head(&mut self, seg: SegmentKind, id: NodeId) {
        self.lists[seg.index()].link_at_head(&mut self.nodes, id);
    }

    fn link_at_tail(&mut self, seg: SegmentKind, id: NodeId) {
        self.lists[seg.index()].link_at_tail(&mut self.nodes, id);
    }

    fn unlink(&mut self, seg: SegmentKind, id: NodeId) {
        self.lists[seg.index()].unlink(&mut self.nodes, id);
    }

    fn move_to_head(&mut self, seg: SegmentKind, id: NodeId) {
        self.lists[seg.index()].move_to_head(&mut self.nodes, id);
    }

    /// Segment implied by a linked node's flag bits.
    fn segment_of(&self, id: NodeId) -> Option<SegmentKind> {
        let record = self.nodes.get(id)?;
        if !record.is_linked() {
            return None;
        }
        Some(if record.is_tiny() {
            SegmentKind::Tiny
        } else if record.is_probation() {
            SegmentKind::Probation
        } else {
            SegmentKind::Protected
        })
    }

    /// Whether the newcomer's estimated frequency beats the incumbent's.
    /// The tie-break knob is the only thing separating hit-biased from
    /// scan-robust behaviour.
    fn admit(&self, newcomer: NodeId, incumbent: NodeId) -> bool {
        let newcomer_freq = self
            .nodes
            .get(newcomer)
            .map_or(0, |r| self.sketch.count(r.key_hash));
        let incumbent_freq = self
            .nodes
            .get(incumbent)
            .map_or(0, |r| self.sketch.count(r.key_hash));
        if self.config.newcomer_wins_on_tie {
            newcomer_freq >= incumbent_freq
        } else {
            newcomer_freq > incumbent_freq
        }
    }

    /// Records one promotion-driving access in the sketch, halving all
    /// counts when the decay window fills. Keeps items that were hot but
    /// went cold from looking hot forever.
    fn bump_frequency(&mut self, hash: u64) {
        self.sketch.increment(hash);
        self.window_size += 1;
        if self.window_size == self.max_window_size {
            self.window_size >>= 1;
            self.sketch.decay();
        }
    }

    /// Re-sizes the sketch once the population doubles past what it was
    /// sized for. Counters and the window restart from zero; the sketch is
    /// never shrunk.
    fn maybe_grow(&mut self) {
        let population = self.population();
        if 2 * self.capacity > population {
            return;
        }

        self.capacity = population.max(self.capacity_floor);
        self.window_size = 0;
        self.max_window_size = (self.capacity * self.config.window_to_cache_size_ratio) as u64;

        let min_width = (std::f64::consts::E * self.max_window_size as f64
            / ERROR_THRESHOLD as f64)
            .ceil() as usize;
        self.sketch = CountMinSketch::new(min_width);
        debug!(
            "sized frequency sketch for {} nodes ({} bytes)",
            self.capacity,
            self.sketch.byte_size()
        );
    }

    /// Swaps the Tiny and Probation tails when the Tiny tail has earned
    /// admission; otherwise relocates the Probation tail to its head so a
    /// high-frequency holdout cannot block Tiny promotions indefinitely.
    fn maybe_swap_tails(&mut self) {
        let Some(probation_tail) = self.list(SegmentKind::Probation).tail() else {
            return;
        };
        let Some(tiny_tail) = self.list(SegmentKind::Tiny).tail() else {
            return;
        };

        if self.admit(tiny_tail, probation_tail) {
            self.unlink(SegmentKind::Tiny, tiny_tail);
            self.link_at_head(SegmentKind::Probation, tiny_tail);
            if let Some(record) = self.nodes.get_mut(tiny_tail) {
                record.set_tiny(false);
                record.set_probation(true);
            }

            self.unlink(SegmentKind::Probation, probation_tail);
            self.link_at_tail(SegmentKind::Tiny, probation_tail);
            if let Some(record) = self.nodes.get_mut(probation_tail) {
                record.set_probation(false);
                record.set_tiny(true);
            }
        } else {
            self.move_to_head(SegmentKind::Probation, probation_tail);
        }
    }

    /// Demotes Protected tails into the Probation tail until Protected fits
    /// its share of the main cache. Demoting to the tail keeps demoted items
    /// from evicting fresh Probation arrivals; a lone Protected node is
    /// never demoted.
    fn enforce_protected_cap(&mut self) {
        let total =
            self.list(SegmentKind::Probation).len() + self.list(SegmentKind::Protected).len();
        let cap = (self.config.protection_segment_size_pct * total / 100).max(1);
        while self.list(SegmentKind::Protected).len() > cap {
            let Some(tail) = self.list(SegmentKind::Protected).tail() else {
                break;
            };
            self.unlink(SegmentKind::Protected, tail);
            self.link_at_tail(SegmentKind::Probation, tail);
            if let Some(record) = self.nodes.get_mut(tail) {
                record.set_probation(true);
            }
        }
    }

    /// Unlinks a node from whichever list its bits imply and clears its
    /// segment, accessed, and membership bits. Sketch counts are left alone;
    /// they only ever decay globally.
    fn remove_node(&mut self, id: NodeId) {
        let Some(seg) = self.segment_of(id) else {
            return;
        };
        self.unlink(seg, id);
        if let Some(record) = self.nodes.get_mut(id) {
            record.set_tiny(false);
            record.set_probation(false);
            record.set_accessed(false);
            record.set_linked(false);
        }
    }

    fn snapshot_list(&self, seg: SegmentKind) -> Vec<SnapshotNode> {
        self.list(seg)
            .ids(&self.nodes)
            .into_iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|record| SnapshotNode {
                key: record.key.to_vec(),
                update_time: record.update_time,
                accessed: record.is_accessed(),
            })
            .collect()
    }

    fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut linked_seen = 0usize;
        for seg in SegmentKind::ALL {
            let list = self.list(seg);
            let mut current = list.head();
            let mut count = 0usize;
            while let Some(id) = current {
                let record = self
                    .nodes
                    .get(id)
                    .ok_or_else(|| InvariantError::new("linked node missing from arena"))?;
                if !record.is_linked() {
                    return Err(InvariantError::new("linked node lacks membership bit"));
                }
                if record.is_tiny() && record.is_probation() {
                    return Err(InvariantError::new("node marked both tiny and probation"));
                }
                let implied = if record.is_tiny() {
                    SegmentKind::Tiny
                } else if record.is_probation() {
                    SegmentKind::Probation
                } else {
                    SegmentKind::Protected
                };
                if implied != seg {
                    return Err(InvariantError::new(format!(
                        "node flags imply {:?} but it is linked in {:?}",
                        implied, seg
                    )));
                }
                count += 1;
                if count > list.len() {
                    return Err(InvariantError::new("cycle in segment list"));
                }
                current = self.nodes.get(id).and_then(|r| r.next);
            }
            if count != list.len() {
                return Err(InvariantError::new(format!(
                    "{:?} length {} does not match walked count {}",
                    seg,
                    list.len(),
                    count
                )));
            }
            linked_seen += count;
        }

        let linked_records = self.nodes.iter().filter(|(_, r)| r.is_linked()).count();
        if linked_records != linked_seen {
            return Err(InvariantError::new(
                "membership bits disagree with list membership",
            ));
        }
        if self.sketch.width() & (self.sketch.width() - 1) != 0 {
            return Err(InvariantError::new("sketch width is not a power of two"));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    fn debug_validate(&self) {
        for seg in SegmentKind::ALL {
            self.list(seg).debug_validate(&self.nodes);
        }
        if let Err(err) = self.check_invariants() {
            panic!("container invariant violated: {err}");
        }
    }
}

/// W-TinyLFU eviction container.
///
/// Tracks externally owned cache items across three segment lists and a
/// frequency sketch. Hosts register nodes with [`create_node`](Self::create_node)
/// and drive the policy through [`add`](Self::add), [`record_access`](Self::record_access),
/// [`remove`](Self::remove), [`replace`](Self::replace), and the eviction
/// iterator. See the module docs for the algorithm.
#[derive(Debug)]
pub struct TinyLfuContainer {
    inner: Mutex<ContainerState>,
    /// Effective refresh time; stored under the lock, read relaxed.
    lru_refresh_time: AtomicU32,
    /// Next reconfiguration deadline; `u32::MAX` when disabled.
    next_reconfigure_time: AtomicU32,
    /// Copy of `config.try_lock_update`, needed before the lock is taken.
    try_lock_update: AtomicBool,
}

impl TinyLfuContainer {
    /// Creates a container with the default sketch sizing floor of 100
    /// nodes.
    pub fn new(config: TinyLfuConfig) -> Result<Self, ConfigError> {
        Self::with_capacity(config, DEFAULT_CAPACITY)
    }

    /// Creates a container sized for roughly `capacity` nodes. The sketch
    /// still grows as the population does; the estimate only sets the floor.
    pub fn with_capacity(config: TinyLfuConfig, capacity: usize) -> Result<Self, ConfigError> {
        config.validate()?;

        let reconfigure_interval = config.mm_reconfigure_interval_secs;
        let refresh = config.default_lru_refresh_time;
        let try_lock = config.try_lock_update;

        let mut state = ContainerState {
            nodes: NodeArena::new(),
            lists: [DList::new(), DList::new(), DList::new()],
            sketch: CountMinSketch::new(1),
            window_size: 0,
            max_window_size: 0,
            capacity: 0,
            capacity_floor: capacity.max(1),
            config,
        };
        state.maybe_grow();

        Ok(Self {
            inner: Mutex::new(state),
            lru_refresh_time: AtomicU32::new(refresh),
            next_reconfigure_time: AtomicU32::new(next_reconfigure_deadline(
                reconfigure_interval,
            )),
            try_lock_update: AtomicBool::new(try_lock),
        })
    }

    /// Registers a node for the given key. The node starts outside the
    /// container; `add` links it.
    pub fn create_node(&self, key: &[u8]) -> NodeId {
        self.inner.lock().nodes.insert(key)
    }

    /// Releases a registered node. Returns `false` if the node is still
    /// linked (remove it first) or the id is stale.
    pub fn destroy_node(&self, id: NodeId) -> bool {
        let mut state = self.inner.lock();
        match state.nodes.get(id) {
            Some(record) if !record.is_linked() => state.nodes.remove(id).is_some(),
            _ => false,
        }
    }

    /// Adds a node to the container at the head of Tiny.
    ///
    /// Returns `true` on insertion, `false` if the node is already present
    /// (state unchanged). Inserting may push the Tiny tail into Probation,
    /// or swap the Tiny and Probation tails when the Tiny tail has the
    /// higher estimated frequency.
    pub fn add(&self, id: NodeId) -> bool {
        let now = now_secs();
        let mut guard = self.inner.lock();
        let state = &mut *guard;

        let hash = match state.nodes.get(id) {
            Some(record) if !record.is_linked() => record.key_hash,
            _ => return false,
        };

        state.link_at_head(SegmentKind::Tiny, id);
        if let Some(record) = state.nodes.get_mut(id) {
            record.set_tiny(true);
            record.set_probation(false);
            record.set_accessed(false);
            record.set_linked(true);
        }
        state.bump_frequency(hash);

        let quota = tiny_quota(state.config.tiny_size_percent, state.capacity);
        if state.list(SegmentKind::Tiny).len() > quota {
            // Tiny is full: unconditionally graduate its tail.
            if let Some(tail) = state.list(SegmentKind::Tiny).tail() {
                state.unlink(SegmentKind::Tiny, tail);
                state.link_at_head(SegmentKind::Probation, tail);
                if let Some(record) = state.nodes.get_mut(tail) {
                    record.set_tiny(false);
                    record.set_probation(true);
                }
            }
        } else {
            state.maybe_swap_tails();
        }

        state.maybe_grow();
        if let Some(record) = state.nodes.get_mut(id) {
            record.update_time = now;
        }

        #[cfg(debug_assertions)]
        state.debug_validate();
        true
    }

    /// Removes a node from the container, clearing its segment and
    /// membership bits. Returns `false` if the node was not present.
    pub fn remove(&self, id: NodeId) -> bool {
        let mut guard = self.inner.lock();
        let state = &mut *guard;
        match state.nodes.get(id) {
            Some(record) if record.is_linked() => {}
            _ => return false,
        }
        state.remove_node(id);

        #[cfg(debug_assertions)]
        state.debug_validate();
        true
    }

    /// Replaces `old` with `new` at the same list position, carrying over
    /// the update time, accessed bit, and segment bits.
    ///
    /// Returns `false` if `old` is not in the container, or `new` already
    /// is (or carries stale segment bits).
    pub fn replace(&self, old: NodeId, new: NodeId) -> bool {
        let mut guard = self.inner.lock();
        let state = &mut *guard;

        let (seg, update_time, accessed) = match state.nodes.get(old) {
            Some(record) if record.is_linked() => (
                match state.segment_of(old) {
                    Some(seg) => seg,
                    None => return false,
                },
                record.update_time,
                record.is_accessed(),
            ),
            _ => return false,
        };
        match state.nodes.get(new) {
            Some(record)
                if !record.is_tiny() && !record.is_probation() && !record.is_linked() => {}
            _ => return false,
        }

        state.lists[seg.index()].replace(&mut state.nodes, old, new);
        if let Some(record) = state.nodes.get_mut(new) {
            record.set_linked(true);
            record.set_tiny(seg == SegmentKind::Tiny);
            record.set_probation(seg == SegmentKind::Probation);
            record.set_accessed(accessed);
            record.update_time = update_time;
        }
        if let Some(record) = state.nodes.get_mut(old) {
            record.set_linked(false);
            record.set_tiny(false);
            record.set_probation(false);
        }

        #[cfg(debug_assertions)]
        state.debug_validate();
        true
    }

    /// Records an access, possibly moving the node to the head of its list
    /// and promoting it from Probation to Protected.
    ///
    /// The access only drives movement when the node's refresh interval has
    /// elapsed or the node has never been accessed; throttled accesses do
    /// not touch the sketch either. With `try_lock_update` set, contention
    /// on the container lock drops the promotion opportunity.
    ///
    /// Returns `true` if the node was moved.
    pub fn record_access(&self, id: NodeId, mode: AccessMode) -> bool {
        let now = now_secs();
        let mut guard = if self.try_lock_update.load(Ordering::Relaxed) {
            match self.inner.try_lock() {
                Some(guard) => guard,
                None => return false,
            }
        } else {
            self.inner.lock()
        };
        let state = &mut *guard;

        let drives = match mode {
            AccessMode::Read => state.config.update_on_read,
            AccessMode::Write => state.config.update_on_write,
        };
        if !drives {
            return false;
        }

        let (hash, seg) = match state.nodes.get(id) {
            Some(record) if record.is_linked() => {
                let refresh = self.lru_refresh_time.load(Ordering::Relaxed);
                if now < record.update_time.saturating_add(refresh) && record.is_accessed() {
                    return false;
                }
                let seg = match state.segment_of(id) {
                    Some(seg) => seg,
                    None => return false,
                };
                (record.key_hash, seg)
            }
            _ => return false,
        };

        self.reconfigure(state, now);

        if let Some(record) = state.nodes.get_mut(id) {
            record.set_accessed(true);
        }
        state.move_to_head(seg, id);

        if seg == SegmentKind::Probation && state.sketch.count(hash) > state.config.protection_freq
        {
            state.unlink(SegmentKind::Probation, id);
            state.link_at_head(SegmentKind::Protected, id);
            if let Some(record) = state.nodes.get_mut(id) {
                record.set_probation(false);
            }
            state.enforce_protected_cap();
            trace!("promoted probation node into protected");
        }

        if let Some(record) = state.nodes.get_mut(id) {
            record.update_time = now;
        }
        state.bump_frequency(hash);
        true
    }

    /// Recomputes the effective refresh time from the Protected tail age.
    /// Runs at most once per configured interval; disabled intervals park
    /// the deadline at `u32::MAX`.
    fn reconfigure(&self, state: &mut ContainerState, now: u32) {
        if now < self.next_reconfigure_time.load(Ordering::Relaxed) {
            return;
        }
        self.next_reconfigure_time.store(
            now.saturating_add(state.config.mm_reconfigure_interval_secs),
            Ordering::Relaxed,
        );

        let oldest_age = state
            .list(SegmentKind::Protected)
            .tail()
            .and_then(|id| state.nodes.get(id))
            .map_or(0, |record| now.saturating_sub(record.update_time));
        let scaled = (oldest_age as f64 * state.config.lru_refresh_ratio) as u32;
        let refresh = state
            .config
            .default_lru_refresh_time
            .max(scaled)
            .min(LRU_REFRESH_TIME_CAP);

        self.lru_refresh_time.store(refresh, Ordering::Relaxed);
        debug!("reconfigured lru refresh time to {}s (tail age {}s)", refresh, oldest_age);
    }

    /// Acquires the container lock and returns the eviction iterator,
    /// positioned over the coldest candidates of all three segments.
    ///
    /// The iterator holds the lock for its lifetime: at most one exists per
    /// container, and other container calls from the same thread will
    /// deadlock until it is dropped.
    pub fn eviction_iterator(&self) -> EvictionIterator<'_> {
        let guard = self.inner.lock();
        let cursors = [
            guard.list(SegmentKind::Tiny).tail(),
            guard.list(SegmentKind::Probation).tail(),
            guard.list(SegmentKind::Protected).tail(),
        ];
        EvictionIterator { guard, cursors }
    }

    /// Runs `f` with the eviction iterator. The callback must not re-enter
    /// the container.
    pub fn with_eviction_iterator<R>(&self, f: impl FnOnce(&mut EvictionIterator<'_>) -> R) -> R {
        let mut it = self.eviction_iterator();
        f(&mut it)
    }

    /// Runs `f` under the container lock. The callback must not re-enter
    /// the container.
    pub fn with_container_lock<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.lock();
        f()
    }

    /// Number of nodes in the container.
    pub fn len(&self) -> usize {
        self.inner.lock().population()
    }

    /// Returns `true` if the container holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Byte size of the sketch's counter array.
    pub fn counter_size(&self) -> usize {
        self.inner.lock().sketch.byte_size()
    }

    /// The segment a node currently occupies, or `None` if it is not in the
    /// container.
    pub fn segment_of(&self, id: NodeId) -> Option<SegmentKind> {
        self.inner.lock().segment_of(id)
    }

    /// The key a node was registered with, or `None` for a stale id.
    pub fn key_of(&self, id: NodeId) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .nodes
            .get(id)
            .map(|record| record.key.to_vec())
    }

    /// Point-in-time container statistics. Reserved fields are zero.
    pub fn stats(&self) -> ContainerStat {
        let state = self.inner.lock();
        let tail = SegmentKind::ALL
            .iter()
            .find_map(|seg| state.list(*seg).tail())
            .and_then(|id| state.nodes.get(id))
            .map_or(0, |record| record.update_time);
        ContainerStat {
            size: state.population(),
            tail_update_time: tail,
            lru_refresh_time: self.lru_refresh_time.load(Ordering::Relaxed),
            ..ContainerStat::default()
        }
    }

    /// Age statistics over the Protected segment. `projection` is how many
    /// tail positions to skip when computing the projected age.
    pub fn eviction_age_stat(&self, projection: u64) -> EvictionAgeStat {
        let state = self.inner.lock();
        let now = now_secs();
        let list = state.list(SegmentKind::Protected);

        let age_of = |id: NodeId| {
            state
                .nodes
                .get(id)
                .map_or(0, |record| now.saturating_sub(record.update_time))
        };

        let mut cursor = list.tail();
        let oldest_element_age = cursor.map_or(0, age_of);
        let mut seen = 0u64;
        while seen < projection {
            match cursor {
                Some(id) => cursor = DList::prev(&state.nodes, id),
                None => break,
            }
            seen += 1;
        }
        let projected_age = cursor.map_or(oldest_element_age, age_of);

        EvictionAgeStat {
            oldest_element_age,
            projected_age,
            size: list.len(),
        }
    }

    /// The current configuration.
    pub fn config(&self) -> TinyLfuConfig {
        self.inner.lock().config.clone()
    }

    /// Replaces the configuration after validating it. Resets the effective
    /// refresh time to the new default and re-arms the reconfiguration
    /// deadline.
    pub fn set_config(&self, config: TinyLfuConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut state = self.inner.lock();
        self.lru_refresh_time
            .store(config.default_lru_refresh_time, Ordering::Relaxed);
        self.next_reconfigure_time.store(
            next_reconfigure_deadline(config.mm_reconfigure_interval_secs),
            Ordering::Relaxed,
        );
        self.try_lock_update
            .store(config.try_lock_update, Ordering::Relaxed);
        state.config = config;
        Ok(())
    }

    /// Serializes the configuration and list topology. The sketch is not
    /// part of the snapshot; a restored container starts with a cold one.
    ///
    /// Snapshotting must not race with writers; the snapshot describes the
    /// container only as long as it is not mutated afterwards.
    pub fn save_state(&self) -> ContainerSnapshot {
        let state = self.inner.lock();
        ContainerSnapshot {
            config: state.config.clone(),
            lru_refresh_time: self.lru_refresh_time.load(Ordering::Relaxed),
            tiny: state.snapshot_list(SegmentKind::Tiny),
            probation: state.snapshot_list(SegmentKind::Probation),
            protected: state.snapshot_list(SegmentKind::Protected),
        }
    }

    /// Rebuilds a container from a snapshot.
    ///
    /// Returns the container and the new node ids in snapshot order (Tiny,
    /// Probation, Protected, each head→tail) so the host can rebind its
    /// index. The sketch starts empty and is sized for the restored
    /// population.
    pub fn from_snapshot(
        snapshot: &ContainerSnapshot,
    ) -> Result<(Self, Vec<NodeId>), ConfigError> {
        snapshot.config.validate()?;

        let mut state = ContainerState {
            nodes: NodeArena::new(),
            lists: [DList::new(), DList::new(), DList::new()],
            sketch: CountMinSketch::new(1),
            window_size: 0,
            max_window_size: 0,
            capacity: 0,
            capacity_floor: DEFAULT_CAPACITY,
            config: snapshot.config.clone(),
        };

        let mut ids = Vec::with_capacity(snapshot.len());
        let segments = [
            (SegmentKind::Tiny, &snapshot.tiny),
            (SegmentKind::Probation, &snapshot.probation),
            (SegmentKind::Protected, &snapshot.protected),
        ];
        for (seg, entries) in segments {
            for entry in entries.iter() {
                let id = state.nodes.insert(&entry.key);
                state.link_at_tail(seg, id);
                if let Some(record) = state.nodes.get_mut(id) {
                    record.set_linked(true);
                    record.set_tiny(seg == SegmentKind::Tiny);
                    record.set_probation(seg == SegmentKind::Probation);
                    record.set_accessed(entry.accessed);
                    record.update_time = entry.update_time;
                }
                ids.push(id);
            }
        }
        state.maybe_grow();

        let reconfigure_interval = state.config.mm_reconfigure_interval_secs;
        let try_lock = state.config.try_lock_update;
        let container = Self {
            inner: Mutex::new(state),
            lru_refresh_time: AtomicU32::new(snapshot.lru_refresh_time),
            next_reconfigure_time: AtomicU32::new(next_reconfigure_deadline(
                reconfigure_interval,
            )),
            try_lock_update: AtomicBool::new(try_lock),
        };
        Ok((container, ids))
    }

    /// Validates segment bookkeeping: flag bits match list membership, list
    /// lengths are consistent, and the sketch width is a power of two.
    /// Diagnostic; O(n).
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}

fn next_reconfigure_deadline(interval_secs: u32) -> u32 {
    if interval_secs == 0 {
        u32::MAX
    } else {
        now_secs().saturating_add(interval_secs)
    }
}

/// Lock-holding cursor over eviction candidates, coldest first.
///
/// Tracks one reverse cursor per segment, each starting at its list's tail.
/// The current victim is the candidate whose estimated frequency loses the
/// pairwise admission comparisons: Tiny vs Probation first, the loser
/// against the Protected cursor. Obtained from
/// [`TinyLfuContainer::eviction_iterator`]; dropping it releases the lock.
pub struct EvictionIterator<'a> {
    guard: MutexGuard<'a, ContainerState>,
    /// Reverse cursors indexed by `SegmentKind::index`; `None` = exhausted.
    cursors: [Option<NodeId>; 3],
}

impl EvictionIterator<'_> {
    fn candidate(&self) -> Option<(SegmentKind, NodeId)> {
        let tiny = self.cursors[SegmentKind::Tiny.index()];
        let probation = self.cursors[SegmentKind::Probation.index()];
        let protected = self.cursors[SegmentKind::Protected.index()];

        let first = match (tiny, probation) {
            (Some(t), Some(p)) => {
                if self.guard.admit(t, p) {
                    (SegmentKind::Probation, p)
                } else {
                    (SegmentKind::Tiny, t)
                }
            }
            (Some(t), None) => (SegmentKind::Tiny, t),
            (None, Some(p)) => (SegmentKind::Probation, p),
            (None, None) => return protected.map(|m| (SegmentKind::Protected, m)),
        };

        match protected {
            Some(m) if self.guard.admit(first.1, m) => Some((SegmentKind::Protected, m)),
            _ => Some(first),
        }
    }

    /// The current victim candidate, or `None` when all segments are
    /// exhausted.
    pub fn current(&self) -> Option<NodeId> {
        self.candidate().map(|(_, id)| id)
    }

    /// The current candidate's key.
    pub fn current_key(&self) -> Option<&[u8]> {
        let id = self.current()?;
        self.guard.nodes.get(id).map(|record| record.key.as_ref())
    }

    /// The segment the current candidate lives in.
    pub fn current_segment(&self) -> Option<SegmentKind> {
        self.candidate().map(|(seg, _)| seg)
    }

    /// Steps past the current candidate without removing it.
    pub fn advance(&mut self) {
        if let Some((seg, id)) = self.candidate() {
            self.cursors[seg.index()] = DList::prev(&self.guard.nodes, id);
        }
    }

    /// Removes the current candidate from the container and advances.
    ///
    /// Returns the removed node's id; the host still owns the node and must
    /// `destroy_node` (or re-`add`) it.
    pub fn remove_current(&mut self) -> Option<NodeId> {
        let (seg, id) = self.candidate()?;
        self.cursors[seg.index()] = DList::prev(&self.guard.nodes, id);
        self.guard.remove_node(id);
        Some(id)
    }

    /// Rewinds all cursors to their list tails.
    pub fn reset_to_begin(&mut self) {
        self.cursors = [
            self.guard.list(SegmentKind::Tiny).tail(),
            self.guard.list(SegmentKind::Probation).tail(),
            self.guard.list(SegmentKind::Protected).tail(),
        ];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(config: TinyLfuConfig) -> TinyLfuContainer {
        TinyLfuContainer::new(config).unwrap()
    }

    fn add_node(c: &TinyLfuContainer, key: &[u8]) -> NodeId {
        let id = c.create_node(key);
        assert!(c.add(id));
        id
    }

    /// Links a node directly into `seg` at the head, bypassing admission.
    fn force_link(c: &TinyLfuContainer, seg: SegmentKind, key: &[u8]) -> NodeId {
        let id = c.create_node(key);
        let mut state = c.inner.lock();
        state.link_at_head(seg, id);
        if let Some(record) = state.nodes.get_mut(id) {
            record.set_linked(true);
            record.set_tiny(seg == SegmentKind::Tiny);
            record.set_probation(seg == SegmentKind::Probation);
        }
        id
    }

    fn set_count(c: &TinyLfuContainer, id: NodeId, count: u32) {
        let mut state = c.inner.lock();
        let state = &mut *state;
        let hash = state.nodes.get(id).unwrap().key_hash;
        for _ in 0..count {
            state.sketch.increment(hash);
        }
    }

    fn segment_ids(c: &TinyLfuContainer, seg: SegmentKind) -> Vec<NodeId> {
        let state = c.inner.lock();
        state.list(seg).ids(&state.nodes)
    }

    #[test]
    fn add_links_into_tiny_or_overflows_to_probation() {
        // At 50% tiny share a single node stays in the window.
        let c = container(TinyLfuConfig {
            tiny_size_percent: 50,
            ..TinyLfuConfig::default()
        });
        let a = add_node(&c, b"a");
        assert_eq!(c.segment_of(a), Some(SegmentKind::Tiny));

        // 1% of a 10-node capacity floors to a zero-width window, so
        // inserts graduate straight into probation.
        let c = TinyLfuContainer::with_capacity(TinyLfuConfig::default(), 10).unwrap();
        let b = add_node(&c, b"b");
        assert_eq!(c.segment_of(b), Some(SegmentKind::Probation));
        assert_eq!(c.len(), 1);
        c.check_invariants().unwrap();
    }

    #[test]
    fn add_is_idempotent() {
        let c = container(TinyLfuConfig::default());
        let a = add_node(&c, b"a");
        assert!(!c.add(a));
        assert_eq!(c.len(), 1);

        // A stale id is rejected outright.
        let ghost = c.create_node(b"ghost");
        assert!(c.destroy_node(ghost));
        assert!(!c.add(ghost));
    }

    #[test]
    fn remove_clears_membership_and_flags() {
        let c = container(TinyLfuConfig::default());
        let a = add_node(&c, b"a");
        assert!(c.remove(a));
        assert_eq!(c.segment_of(a), None);
        assert_eq!(c.len(), 0);

        // Second removal reports absence without mutating.
        assert!(!c.remove(a));

        let state = c.inner.lock();
        let record = state.nodes.get(a).unwrap();
        assert!(!record.is_linked());
        assert!(!record.is_tiny());
        assert!(!record.is_probation());
        assert!(!record.is_accessed());
    }

    #[test]
    fn destroy_refuses_linked_node() {
        let c = container(TinyLfuConfig::default());
        let a = add_node(&c, b"a");
        assert!(!c.destroy_node(a));
        assert!(c.remove(a));
        assert!(c.destroy_node(a));
        assert!(!c.destroy_node(a));
    }

    #[test]
    fn readd_after_remove_succeeds() {
        let c = container(TinyLfuConfig::default());
        let a = add_node(&c, b"a");
        assert!(c.remove(a));
        assert!(c.add(a));
        assert_eq!(c.len(), 1);
        c.check_invariants().unwrap();
    }

    #[test]
    fn tiny_overflow_graduates_tail() {
        // 50% of a 2-node capacity leaves a one-slot window, so the second
        // insert pushes the tiny tail into the probation head.
        let config = TinyLfuConfig {
            tiny_size_percent: 50,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 2).unwrap();
        let a = add_node(&c, b"a");
        assert_eq!(c.segment_of(a), Some(SegmentKind::Tiny));
        let b = add_node(&c, b"b");
        assert_eq!(c.segment_of(a), Some(SegmentKind::Probation));
        assert_eq!(c.segment_of(b), Some(SegmentKind::Tiny));
        c.check_invariants().unwrap();
    }

    #[test]
    fn swap_on_add_exchanges_tails() {
        // 50% of a 4-node capacity gives a two-slot window, so adding C
        // lands inside the quota and the tail comparison runs.
        let config = TinyLfuConfig {
            tiny_size_percent: 50,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 4).unwrap();
        let a = force_link(&c, SegmentKind::Tiny, b"a");
        let b = force_link(&c, SegmentKind::Probation, b"b");
        set_count(&c, a, 4);
        set_count(&c, b, 1);

        // freq(A) > freq(B): the tails swap, A to probation head, B to
        // tiny tail.
        let cc = add_node(&c, b"c");
        assert_eq!(c.segment_of(a), Some(SegmentKind::Probation));
        assert_eq!(c.segment_of(b), Some(SegmentKind::Tiny));
        assert_eq!(segment_ids(&c, SegmentKind::Probation).first(), Some(&a));
        assert_eq!(segment_ids(&c, SegmentKind::Tiny), vec![cc, b]);
        c.check_invariants().unwrap();
    }

    #[test]
    fn losing_swap_relocates_probation_tail() {
        let c = container(TinyLfuConfig::default());
        let tiny = force_link(&c, SegmentKind::Tiny, b"tiny");
        let i2 = force_link(&c, SegmentKind::Probation, b"i2");
        let i1 = force_link(&c, SegmentKind::Probation, b"i1");
        assert_eq!(segment_ids(&c, SegmentKind::Probation), vec![i1, i2]);

        set_count(&c, tiny, 1);
        set_count(&c, i2, 5);
        c.inner.lock().maybe_swap_tails();

        // No swap, but the hot probation tail is nudged to the head so it
        // cannot block tiny promotions forever.
        assert_eq!(c.segment_of(tiny), Some(SegmentKind::Tiny));
        assert_eq!(segment_ids(&c, SegmentKind::Probation), vec![i2, i1]);
    }

    #[test]
    fn promotion_after_threshold_reads() {
        let config = TinyLfuConfig {
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 10).unwrap();
        let k = add_node(&c, b"k");
        assert_eq!(c.segment_of(k), Some(SegmentKind::Probation));

        // Counts run 1..=4 across the accesses; the promotion check uses
        // the count before the access's own increment, so the fourth read
        // is the first to see count > 3.
        for _ in 0..3 {
            assert!(c.record_access(k, AccessMode::Read));
            assert_eq!(c.segment_of(k), Some(SegmentKind::Probation));
        }
        assert!(c.record_access(k, AccessMode::Read));
        assert_eq!(c.segment_of(k), Some(SegmentKind::Protected));
        c.check_invariants().unwrap();
    }

    #[test]
    fn write_access_ignored_unless_configured() {
        let c = container(TinyLfuConfig {
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        });
        let k = add_node(&c, b"k");
        assert!(!c.record_access(k, AccessMode::Write));

        c.set_config(TinyLfuConfig {
            default_lru_refresh_time: 0,
            update_on_write: true,
            update_on_read: false,
            ..TinyLfuConfig::default()
        })
        .unwrap();
        assert!(c.record_access(k, AccessMode::Write));
        assert!(!c.record_access(k, AccessMode::Read));
    }

    #[test]
    fn refresh_time_throttles_repeat_access() {
        let c = container(TinyLfuConfig::default());
        let k = add_node(&c, b"k");

        // First access drives because the node has never been accessed.
        assert!(c.record_access(k, AccessMode::Read));
        // Second access lands inside the 60s refresh window.
        assert!(!c.record_access(k, AccessMode::Read));

        // Throttled accesses leave the sketch untouched.
        let state = c.inner.lock();
        let hash = state.nodes.get(k).unwrap().key_hash;
        assert_eq!(state.sketch.count(hash), 2); // one from add, one from the driving access
    }

    #[test]
    fn record_access_rejects_absent_node() {
        let c = container(TinyLfuConfig {
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        });
        let k = c.create_node(b"k");
        assert!(!c.record_access(k, AccessMode::Read));
        assert!(c.add(k));
        assert!(c.remove(k));
        assert!(!c.record_access(k, AccessMode::Read));
    }

    #[test]
    fn protected_cap_demotes_to_probation_tail() {
        let c = container(TinyLfuConfig::default());
        let q = force_link(&c, SegmentKind::Probation, b"q");
        let mut protected = Vec::new();
        for i in 0..5u8 {
            protected.push(force_link(&c, SegmentKind::Protected, &[b'p', i]));
        }

        // total = 6, cap = 80% of 6 = 4; one demotion expected.
        let oldest = segment_ids(&c, SegmentKind::Protected)[4];
        c.inner.lock().enforce_protected_cap();

        assert_eq!(segment_ids(&c, SegmentKind::Protected).len(), 4);
        let probation = segment_ids(&c, SegmentKind::Probation);
        assert_eq!(probation, vec![q, oldest]);
        assert_eq!(c.segment_of(oldest), Some(SegmentKind::Probation));
        c.check_invariants().unwrap();
    }

    #[test]
    fn lone_protected_node_survives_promotion() {
        let config = TinyLfuConfig {
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 10).unwrap();
        let k = add_node(&c, b"k");
        for _ in 0..4 {
            c.record_access(k, AccessMode::Read);
        }
        // cap floors to zero with a single main-cache node; the promotion
        // must still stick.
        assert_eq!(c.segment_of(k), Some(SegmentKind::Protected));
    }

    #[test]
    fn decay_halves_counts_at_window_boundary() {
        let config = TinyLfuConfig {
            window_to_cache_size_ratio: 2,
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 4).unwrap();
        let k = add_node(&c, b"k");

        // add() was driving access #1; seven reads bring the window to its
        // max of 8 (capacity 4 × ratio 2) and trigger the decay.
        for _ in 0..7 {
            assert!(c.record_access(k, AccessMode::Read));
        }

        let state = c.inner.lock();
        assert_eq!(state.max_window_size, 8);
        assert_eq!(state.window_size, 4);
        let hash = state.nodes.get(k).unwrap().key_hash;
        assert_eq!(state.sketch.count(hash), 4);
    }

    #[test]
    fn sketch_grows_and_resets_when_population_doubles() {
        let config = TinyLfuConfig {
            default_lru_refresh_time: 0,
            ..TinyLfuConfig::default()
        };
        let c = TinyLfuContainer::with_capacity(config, 4).unwrap();
        // capacity 4 → window 128 → width = next_pow2(⌈e·128/5⌉ = 70) = 128
        assert_eq!(c.counter_size(), 4 * 128);

        let first = add_node(&c, b"k0");
        for i in 1..8u8 {
            add_node(&c, &[b'k', i]);
        }

        // Population reached 2× the sized-for capacity: counters restart.
        let state = c.inner.lock();
        assert_eq!(state.capacity, 8);
        assert_eq!(state.window_size, 0);
        let hash = state.nodes.get(first).unwrap().key_hash;
        assert_eq!(state.sketch.count(hash), 0);
    }

    #[test]
    fn replace_carries_position_time_and_flags() {
        let c = container(TinyLfuConfig::default());
        let a = force_link(&c, SegmentKind::Probation, b"a");
        let b = force_link(&c, SegmentKind::Probation, b"b");
        let cc = force_link(&c, SegmentKind::Probation, b"c");
        {
            let mut state = c.inner.lock();
            let record = state.nodes.get_mut(b).unwrap();
            record.update_time = 1234;
            record.set_accessed(true);
        }

        let fresh = c.create_node(b"fresh");
        assert!(c.replace(b, fresh));

        assert_eq!(segment_ids(&c, SegmentKind::Probation), vec![cc, fresh, a]);
        assert_eq!(c.segment_of(b), None);
        assert_eq!(c.segment_of(fresh), Some(SegmentKind::Probation));
        let state = c.inner.lock();
        let record = state.nodes.get(fresh).unwrap();
        assert_eq!(record.update_time, 1234);
        assert!(record.is_accessed());
        assert!(!state.nodes.get(b).unwrap().is_linked());
    }

    #[test]
    fn replace_rejects_bad_operands() {
        let c = container(TinyLfuConfig::default());
        let a = add_node(&c, b"a");
        let b = add_node(&c, b"b");
        let fresh = c.create_node(b"fresh");

        // new already in container
        assert!(!c.replace(a, b));
        // old not in container
        let out = c.create_node(b"out");
        assert!(!c.replace(out, fresh));
        // replacing with itself
        assert!(!c.replace(a, a));
        c.check_invariants().unwrap();
    }

    #[test]
    fn eviction_order_prefers_lowest_frequency_tail() {
        let c = container(TinyLfuConfig::default());
        let t1 = force_link(&c, SegmentKind::Tiny, b"t1");
        let p2 = force_link(&c, SegmentKind::Probation, b"p2");
        let _p1 = force_link(&c, SegmentKind::Probation, b"p1");
        let m2 = force_link(&c, SegmentKind::Protected, b"m2");
        let m1 = force_link(&c, SegmentKind::Protected, b"m1");

        set_count(&c, t1, 1);
        set_count(&c, p2, 5);
        set_count(&c, m1, 5);
        // m2 stays at zero: the coldest tail in the container.

        let mut it = c.eviction_iterator();
        assert_eq!(it.remove_current(), Some(m2));
        assert_eq!(it.current(), Some(t1));
        assert_eq!(it.current_segment(), Some(SegmentKind::Tiny));
        assert_eq!(it.remove_current(), Some(t1));
        drop(it);

        assert_eq!(c.segment_of(m2), None);
        assert_eq!(c.segment_of(t1), None);
        c.check_invariants().unwrap();
    }

    #[test]
    fn newcomer_loses_on_tie_when_configured() {
        let c = container(TinyLfuConfig {
            newcomer_wins_on_tie: false,
            ..TinyLfuConfig::default()
        });
        let newcomer = force_link(&c, SegmentKind::Tiny, b"newcomer");
        let incumbent = force_link(&c, SegmentKind::Probation, b"incumbent");
        set_count(&c, newcomer, 2);
        set_count(&c, incumbent, 2);

        // Tie: the incumbent keeps its segment.
        c.inner.lock().maybe_swap_tails();
        assert_eq!(c.segment_of(newcomer), Some(SegmentKind::Tiny));
        assert_eq!(c.segment_of(incumbent), Some(SegmentKind::Probation));

        // And the iterator offers the newcomer first.
        let mut it = c.eviction_iterator();
        assert_eq!(it.current(), Some(newcomer));
        it.advance();
        assert_eq!(it.current(), Some(incumbent));
        it.advance();
        assert_eq!(it.current(), None);
    }

    #[test]
    fn iterator_walks_all_segments_and_resets() {
        let c = container(TinyLfuConfig::default());
        let t = force_link(&c, SegmentKind::Tiny, b"t");
        let p = force_link(&c, SegmentKind::Probation, b"p");
        let m = force_link(&c, SegmentKind::Protected, b"m");

        let mut it = c.eviction_iterator();
        let mut seen = Vec::new();
        while let Some(id) = it.current() {
            seen.push(id);
            it.advance();
        }
        assert_eq!(seen.len(), 3);
        for id in [t, p, m] {
            assert!(seen.contains(&id));
        }

        it.reset_to_begin();
        assert!(it.current().is_some());
        assert_eq!(it.current_key().map(<[u8]>::to_vec).unwrap().len(), 1);
    }

    #[test]
    fn empty_container_iterator_is_exhausted() {
        let c = container(TinyLfuConfig::default());
        let mut it = c.eviction_iterator();
        assert_eq!(it.current(), None);
        assert_eq!(it.remove_current(), None);
        it.advance();
        assert_eq!(it.current(), None);
    }

    #[test]
    fn reconfigure_tracks_protected_tail_age() {
        let c = container(TinyLfuConfig {
            default_lru_refresh_time: 60,
            lru_refresh_ratio: 0.5,
            mm_reconfigure_interval_secs: 10,
            ..TinyLfuConfig::default()
        });
        let k = force_link(&c, SegmentKind::Protected, b"k");
        let now = now_secs();
        {
            let mut state = c.inner.lock();
            state.nodes.get_mut(k).unwrap().update_time = now - 300;
        }
        c.next_reconfigure_time.store(0, Ordering::Relaxed);

        assert!(c.record_access(k, AccessMode::Read));

        // max(default 60, ~300 × 0.5) = ~150, with slack for clock ticks
        let refresh = c.lru_refresh_time.load(Ordering::Relaxed);
        assert!((150..=151).contains(&refresh), "refresh was {refresh}");
        let deadline = c.next_reconfigure_time.load(Ordering::Relaxed);
        assert!((10..=12).contains(&deadline.saturating_sub(now)));
    }

    #[test]
    fn reconfigure_caps_refresh_time() {
        let c = container(TinyLfuConfig {
            lru_refresh_ratio: 1.0,
            mm_reconfigure_interval_secs: 10,
            ..TinyLfuConfig::default()
        });
        let k = force_link(&c, SegmentKind::Protected, b"k");
        {
            let mut state = c.inner.lock();
            state.nodes.get_mut(k).unwrap().update_time = now_secs().saturating_sub(10_000);
        }
        c.next_reconfigure_time.store(0, Ordering::Relaxed);

        assert!(c.record_access(k, AccessMode::Read));
        assert_eq!(c.lru_refresh_time.load(Ordering::Relaxed), LRU_REFRESH_TIME_CAP);
    }

    #[test]
    fn reconfigure_disabled_with_zero_interval() {
        let c = container(TinyLfuConfig::default());
        assert_eq!(
            c.next_reconfigure_time.load(Ordering::Relaxed),
            u32::MAX
        );
    }

    #[test]
    fn stats_report_size_tail_and_refresh() {
        let c = container(TinyLfuConfig {
            tiny_size_percent: 50,
            ..TinyLfuConfig::default()
        });
        let stats = c.stats();
        assert_eq!(stats.size, 0);
        assert_eq!(stats.tail_update_time, 0);
        assert_eq!(stats.lru_refresh_time, 60);

        let a = add_node(&c, b"a");
        {
            let mut state = c.inner.lock();
            state.nodes.get_mut(a).unwrap().update_time = 7777;
        }
        let stats = c.stats();
        assert_eq!(stats.size, 1);
        // `a` sits in tiny, the first list in eviction-concatenation order.
        assert_eq!(stats.tail_update_time, 7777);
        assert_eq!(stats.num_hot_accesses, 0);
        assert_eq!(stats.num_cold_accesses, 0);
        assert_eq!(stats.num_warm_accesses, 0);
        assert_eq!(stats.num_tail_accesses, 0);
    }

    #[test]
    fn eviction_age_stat_projects_into_protected() {
        let c = container(TinyLfuConfig::default());
        let now = now_secs();
        // head→tail: newest..oldest with ages 100, 200, 300.
        let oldest = force_link(&c, SegmentKind::Protected, b"oldest");
        let middle = force_link(&c, SegmentKind::Protected, b"middle");
        let newest = force_link(&c, SegmentKind::Protected, b"newest");
        {
            let mut state = c.inner.lock();
            state.nodes.get_mut(oldest).unwrap().update_time = now - 300;
            state.nodes.get_mut(middle).unwrap().update_time = now - 200;
            state.nodes.get_mut(newest).unwrap().update_time = now - 100;
        }

        let stat = c.eviction_age_stat(0);
        assert_eq!(stat.size, 3);
        assert!((300..=302).contains(&stat.oldest_element_age));
        assert_eq!(stat.projected_age, stat.oldest_element_age);

        let stat = c.eviction_age_stat(1);
        assert!((200..=202).contains(&stat.projected_age));

        // Projection past the end falls back to the oldest age.
        let stat = c.eviction_age_stat(10);
        assert_eq!(stat.projected_age, stat.oldest_element_age);
    }

    #[test]
    fn set_config_rejects_invalid_and_applies_valid() {
        let c = container(TinyLfuConfig::default());
        assert!(c
            .set_config(TinyLfuConfig {
                window_to_cache_size_ratio: 1,
                ..TinyLfuConfig::default()
            })
            .is_err());

        let update = TinyLfuConfig {
            default_lru_refresh_time: 5,
            try_lock_update: true,
            ..TinyLfuConfig::default()
        };
        c.set_config(update.clone()).unwrap();
        assert_eq!(c.config(), update);
        assert_eq!(c.lru_refresh_time.load(Ordering::Relaxed), 5);
        assert!(c.try_lock_update.load(Ordering::Relaxed));
    }

    #[test]
    fn counter_size_matches_sketch() {
        let c = container(TinyLfuConfig::default());
        assert_eq!(c.counter_size(), c.inner.lock().sketch.byte_size());
    }
}
