//! Per-node identity read from a cluster snapshot.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::probe::ColumnProbe;
use super::source::{SnapshotSource, SERVICE_STANZA};

const NETWORK_STANZA: &str = "network";
const XDR_STANZA: &str = "xdr";
const PRINCIPAL_STAT: &str = "paxos_principal";
/// Marker some summaries put in front of the principal's node id.
const PRINCIPAL_MARKER: char = '*';
/// Width node ids are zero-padded to before comparison.
const NODE_ID_WIDTH: usize = 16;

/// Server edition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edition {
    /// Enterprise build.
    Enterprise,
    /// Community build.
    Community,
}

impl Edition {
    /// Parses `enterprise`/`true` and `community`/`false`, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "enterprise" | "true" => Some(Edition::Enterprise),
            "community" | "false" => Some(Edition::Community),
            _ => None,
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Enterprise => write!(f, "Enterprise"),
            Edition::Community => write!(f, "Community"),
        }
    }
}

/// What the snapshot says about one node. `None` means not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributes {
    pub name: String,
    pub node_id: Option<String>,
    pub ip: Option<String>,
    pub xdr_build: Option<String>,
    pub server_build: Option<String>,
    pub edition: Option<Edition>,
}

impl NodeAttributes {
    fn new(name: String) -> Self {
        Self {
            name,
            node_id: None,
            ip: None,
            xdr_build: None,
            server_build: None,
            edition: None,
        }
    }

    fn set_node_id(&mut self, id: &str) {
        self.node_id = Some(id.strip_prefix(PRINCIPAL_MARKER).unwrap_or(id).to_string());
    }

    fn set_server_build(&mut self, build: &str) {
        if let Some(rest) = build.strip_prefix("E-") {
            self.server_build = Some(rest.to_string());
            self.edition = Some(Edition::Enterprise);
        } else if let Some(rest) = build.strip_prefix("C-") {
            self.server_build = Some(rest.to_string());
            self.edition = Some(Edition::Community);
        } else {
            self.server_build = Some(build.to_string());
        }
    }
}

/// Node attributes for every node of a snapshot, keyed by node name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAttributeTable {
    nodes: BTreeMap<String, NodeAttributes>,
}

impl NodeAttributeTable {
    /// Reads node ids, addresses, builds and editions from `source`.
    ///
    /// Each attribute comes from the first stanza whose summary yields any
    /// value; missing attributes stay `None`.
    pub fn bootstrap(source: &dyn SnapshotSource) -> Self {
        let mut table = Self {
            nodes: source
                .node_names()
                .into_iter()
                .map(|name| (name.clone(), NodeAttributes::new(name)))
                .collect(),
        };

        let ids = table.probe_stanzas(source, &[SERVICE_STANZA, NETWORK_STANZA], &["Node"], &["Node", "Id"]);
        if ids.is_empty() && table.nodes.len() == 1 {
            for node in table.nodes.values_mut() {
                if let Some(id) = source.statistic(SERVICE_STANZA, &node.name, PRINCIPAL_STAT) {
                    node.set_node_id(&id);
                }
            }
        } else {
            table.apply(ids, NodeAttributes::set_node_id);
        }

        let ips = table.probe_stanzas(source, &[SERVICE_STANZA, NETWORK_STANZA], &["Node", "Ip"], &["Ip"]);
        table.apply(ips, |node, ip| node.ip = Some(ip.to_string()));

        let xdr = table.probe_stanzas(source, &[XDR_STANZA], &["Node", "Build"], &["Build"]);
        table.apply(xdr, |node, build| node.xdr_build = Some(build.to_string()));

        let builds = table.probe_stanzas(source, &[SERVICE_STANZA, NETWORK_STANZA], &["Node", "Build"], &["Build"]);
        table.apply(builds, NodeAttributes::set_server_build);

        let editions = table.probe_stanzas(source, &[NETWORK_STANZA], &["Node", "Enterprise"], &["Enterprise"]);
        table.apply(editions, |node, value| node.edition = Edition::parse(value));

        debug!(nodes = table.nodes.len(), "bootstrapped node attributes");
        table
    }

    fn probe_stanzas(
        &self,
        source: &dyn SnapshotSource,
        stanzas: &[&str],
        header: &[&str],
        wanted: &[&str],
    ) -> BTreeMap<String, String> {
        let probe = ColumnProbe::new(header.iter().copied(), wanted.iter().copied());
        stanzas
            .iter()
            .filter_map(|stanza| source.summary(stanza))
            .map(|text| probe.probe(&text, |node| self.nodes.contains_key(node)))
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }

    fn apply(&mut self, values: BTreeMap<String, String>, set: impl Fn(&mut NodeAttributes, &str)) {
        for (name, value) in values {
            if value.is_empty() {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&name) {
                set(node, &value);
            }
        }
    }

    /// Attributes of `name`.
    pub fn get(&self, name: &str) -> Option<&NodeAttributes> {
        self.nodes.get(name)
    }

    /// All nodes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeAttributes> {
        self.nodes.values()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the snapshot listed no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node id expected to be the cluster principal: the greatest id
    /// once ids are zero-padded to a common width.
    ///
    /// `None` when the table is empty or any node id is unknown.
    pub fn expected_principal(&self) -> Option<String> {
        self.nodes
            .values()
            .map(|node| node.node_id.as_deref())
            .collect::<Option<Vec<&str>>>()?
            .into_iter()
            .max_by_key(|id| format!("{id:0>width$}", width = NODE_ID_WIDTH))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::InMemorySnapshot;

    const SERVICE_SUMMARY: &str = "\
Node          Node              Ip         Build     Migrations
.               Id               .            .               .
n1:3000       *BB9040011AC4202  10.0.0.1   E-5.2.0   0
n2:3000       BB9030011AC4202   10.0.0.2   E-5.2.0   0
n3:3000       BB9A              10.0.0.3   E-5.2.0   0
";

    const XDR_SUMMARY: &str = "\
Node          Build   Lag
n1:3000       5.2.0   0
";

    const NETWORK_SUMMARY: &str = "\
Node          Enterprise
n2:3000       false
";

    fn snapshot() -> InMemorySnapshot {
        ["n1:3000", "n2:3000", "n3:3000"]
            .into_iter()
            .fold(InMemorySnapshot::new(), |s, node| s.with_config("service", node, "port", "3000"))
            .with_summary("service", SERVICE_SUMMARY)
            .with_summary("xdr", XDR_SUMMARY)
            .with_summary("network", NETWORK_SUMMARY)
    }

    #[test]
    fn test_bootstrap_reads_all_attributes() {
        let table = NodeAttributeTable::bootstrap(&snapshot());
        assert_eq!(table.len(), 3);

        let n1 = table.get("n1:3000").unwrap();
        assert_eq!(n1.node_id.as_deref(), Some("BB9040011AC4202"));
        assert_eq!(n1.ip.as_deref(), Some("10.0.0.1"));
        assert_eq!(n1.xdr_build.as_deref(), Some("5.2.0"));
        assert_eq!(n1.server_build.as_deref(), Some("5.2.0"));
        assert_eq!(n1.edition, Some(Edition::Enterprise));

        // The network stanza overrides the edition implied by the build.
        let n2 = table.get("n2:3000").unwrap();
        assert_eq!(n2.edition, Some(Edition::Community));
        assert_eq!(n2.xdr_build, None);
    }

    #[test]
    fn test_expected_principal_compares_padded_ids() {
        let table = NodeAttributeTable::bootstrap(&snapshot());
        // "BB9A" pads to "000000000000BB9A", which sorts below the others.
        assert_eq!(table.expected_principal().as_deref(), Some("BB9040011AC4202"));
    }

    #[test]
    fn test_single_node_falls_back_to_principal_statistic() {
        let snapshot = InMemorySnapshot::new()
            .with_statistic("service", "solo:3000", "paxos_principal", "*A1B2");
        let table = NodeAttributeTable::bootstrap(&snapshot);
        assert_eq!(table.get("solo:3000").unwrap().node_id.as_deref(), Some("A1B2"));
        assert_eq!(table.expected_principal().as_deref(), Some("A1B2"));
    }

    #[test]
    fn test_unknown_id_means_unknown_principal() {
        let snapshot = InMemorySnapshot::new()
            .with_config("service", "a:3000", "port", "3000")
            .with_config("service", "b:3000", "port", "3000");
        let table = NodeAttributeTable::bootstrap(&snapshot);
        assert!(table.iter().all(|node| node.node_id.is_none()));
        assert_eq!(table.expected_principal(), None);
    }

    #[test]
    fn test_edition_parse() {
        assert_eq!(Edition::parse("TRUE"), Some(Edition::Enterprise));
        assert_eq!(Edition::parse("community"), Some(Edition::Community));
        assert_eq!(Edition::parse("N/E"), None);
        assert_eq!(Edition::Enterprise.to_string(), "Enterprise");
    }
}
