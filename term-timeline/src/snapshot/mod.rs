//! Cluster snapshot helpers: summary table probing, node identity and
//! whole-file grep.

pub mod grep;
pub mod node;
pub mod probe;
pub mod source;

pub use grep::{grep_count, grep_file, grep_lines};
pub use node::{Edition, NodeAttributeTable, NodeAttributes};
pub use probe::{ColumnProbe, DEFAULT_IGNORE_SYMBOL};
pub use source::{InMemorySnapshot, SnapshotSource};
