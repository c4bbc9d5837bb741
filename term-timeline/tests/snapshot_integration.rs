//! Node attribute bootstrap from a JSON cluster snapshot.

use term_timeline::scan::{LineFilter, TermMode};
use term_timeline::snapshot::{
    grep_count, ColumnProbe, Edition, InMemorySnapshot, NodeAttributeTable,
};

const SNAPSHOT_JSON: &str = r#"{
  "config": {
    "service": {
      "10.0.0.1:3000": {"proto-fd-max": "15000"},
      "10.0.0.2:3000": {"proto-fd-max": "15000"}
    }
  },
  "statistics": {
    "service": {
      "10.0.0.1:3000": {"paxos_principal": "BB9020011AC4202"},
      "10.0.0.2:3000": {"paxos_principal": "BB9020011AC4202"}
    }
  },
  "summary": {
    "network": "Node            Node               Ip          Build     Enterprise\n.                 Id                .              .              .\n10.0.0.1:3000   *BB9020011AC4202   10.0.0.1    4.9.0.3   true\n10.0.0.2:3000   BB9010011AC4202    10.0.0.2    4.9.0.3   false\n",
    "xdr": "Node            Build\n10.0.0.2:3000   4.9.0.1\n"
  }
}"#;

#[test]
fn test_bootstrap_from_json_snapshot() {
    let snapshot = InMemorySnapshot::from_json(SNAPSHOT_JSON).unwrap();
    let table = NodeAttributeTable::bootstrap(&snapshot);
    assert_eq!(table.len(), 2);

    // No service summary, so every attribute comes from the network stanza.
    let first = table.get("10.0.0.1:3000").unwrap();
    assert_eq!(first.node_id.as_deref(), Some("BB9020011AC4202"));
    assert_eq!(first.server_build.as_deref(), Some("4.9.0.3"));
    assert_eq!(first.edition, Some(Edition::Enterprise));
    assert_eq!(first.xdr_build, None);

    let second = table.get("10.0.0.2:3000").unwrap();
    assert_eq!(second.ip.as_deref(), Some("10.0.0.2"));
    assert_eq!(second.xdr_build.as_deref(), Some("4.9.0.1"));
    assert_eq!(second.edition, Some(Edition::Community));

    assert_eq!(table.expected_principal().as_deref(), Some("BB9020011AC4202"));
}

#[test]
fn test_wrapped_header_with_missing_row() {
    let summary = "\
Node            Cluster    Node               Build\n\
.               Size       Id                 .\n\
a:3000          2          A1                 5.0\n";
    let probe = ColumnProbe::new(["Node", "Build"], ["Node", "Id"]);
    let ids = probe.probe(summary, |node| node == "a:3000" || node == "b:3000");
    assert_eq!(ids.len(), 1);
    assert_eq!(ids["a:3000"], "A1");
    assert!(!ids.contains_key("b:3000"));
}

#[test]
fn test_snapshot_grep_counts_config_lines() {
    let text = "service.proto-fd-max 15000\nnamespace.test.replication-factor 2\n";
    let filter = LineFilter::literal(["SERVICE", "namespace"], TermMode::Or, None, false);
    assert_eq!(grep_count(text.as_bytes(), &filter).unwrap(), 2);
}
