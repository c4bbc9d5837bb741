//! Access to a parsed cluster snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Stanza the node list is taken from.
pub const SERVICE_STANZA: &str = "service";

/// Read-only view of a cluster snapshot file.
///
/// Parsing the snapshot format belongs to the implementor; the node table
/// only asks for node names, summary tables and single statistics.
pub trait SnapshotSource {
    /// Names of the nodes present in the snapshot.
    fn node_names(&self) -> Vec<String>;

    /// Text of the summary table for `stanza`, if present.
    fn summary(&self, stanza: &str) -> Option<String>;

    /// One statistic of one node.
    fn statistic(&self, stanza: &str, node: &str, key: &str) -> Option<String>;
}

type Section = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

/// [`SnapshotSource`] backed by maps, loadable from JSON.
///
/// `config` and `statistics` are keyed stanza → node → key; `summary` maps a
/// stanza to its table text.
///
/// # Examples
///
/// ```rust
/// use term_timeline::snapshot::{InMemorySnapshot, SnapshotSource};
///
/// let snapshot = InMemorySnapshot::new()
///     .with_config("service", "node1:3000", "proto-fd-max", "15000")
///     .with_statistic("service", "node1:3000", "paxos_principal", "BB9");
/// assert_eq!(snapshot.node_names(), vec!["node1:3000".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemorySnapshot {
    #[serde(default)]
    config: Section,
    #[serde(default)]
    statistics: Section,
    #[serde(default)]
    summary: BTreeMap<String, String>,
}

impl InMemorySnapshot {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON form produced by `serde_json::to_string`.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| TimelineError::parse(format!("invalid snapshot JSON: {e}")))
    }

    /// Adds a configuration value.
    pub fn with_config(
        mut self,
        stanza: impl Into<String>,
        node: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        insert(&mut self.config, stanza.into(), node.into(), key.into(), value.into());
        self
    }

    /// Adds a statistic.
    pub fn with_statistic(
        mut self,
        stanza: impl Into<String>,
        node: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        insert(&mut self.statistics, stanza.into(), node.into(), key.into(), value.into());
        self
    }

    /// Sets the summary table text of a stanza.
    pub fn with_summary(mut self, stanza: impl Into<String>, text: impl Into<String>) -> Self {
        self.summary.insert(stanza.into(), text.into());
        self
    }
}

fn insert(section: &mut Section, stanza: String, node: String, key: String, value: String) {
    section
        .entry(stanza)
        .or_default()
        .entry(node)
        .or_default()
        .insert(key, value);
}

impl SnapshotSource for InMemorySnapshot {
    /// Nodes of the `service` configuration, else of the `service`
    /// statistics.
    fn node_names(&self) -> Vec<String> {
        [&self.config, &self.statistics]
            .into_iter()
            .find_map(|section| section.get(SERVICE_STANZA))
            .map(|nodes| nodes.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn summary(&self, stanza: &str) -> Option<String> {
        self.summary.get(stanza).cloned()
    }

    fn statistic(&self, stanza: &str, node: &str, key: &str) -> Option<String> {
        self.statistics.get(stanza)?.get(node)?.get(key).cloned()
    }
}
