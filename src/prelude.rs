pub use crate::config::TinyLfuConfig;
pub use crate::ds::CountMinSketch;
pub use crate::error::{ConfigError, InvariantError};
pub use crate::node::{AccessMode, NodeId};
pub use crate::policy::tiny_lfu::{EvictionIterator, SegmentKind, TinyLfuContainer};
pub use crate::snapshot::{ContainerSnapshot, SnapshotNode};
pub use crate::stats::{ContainerStat, EvictionAgeStat};
