//! Column lookup in fixed-width summary tables.
//!
//! Summary stanzas are whitespace-aligned tables whose header may wrap over
//! several lines:
//!
//! ```text
//! Node              Node                 Ip                    Build
//! .                   Id                  .                        .
//! node1.local:3000  *BB9040011AC4202     10.0.0.1:3000        5.2.0.7
//! ```
//!
//! The wanted column is the token index carrying each wanted label on
//! consecutive header lines (`Node` on the first, `Id` on the second).

use std::collections::BTreeMap;

/// Default first token of divider rows.
pub const DEFAULT_IGNORE_SYMBOL: &str = ".";

/// Locates one column of a summary table and reads it per node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProbe {
    header_labels: Vec<String>,
    wanted: Vec<String>,
    ignore_symbol: String,
}

impl ColumnProbe {
    /// `header_labels` identify the header line by substring containment;
    /// `wanted` holds one label per header line, top to bottom.
    pub fn new<H, W>(header_labels: H, wanted: W) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        Self {
            header_labels: header_labels.into_iter().map(Into::into).collect(),
            wanted: wanted.into_iter().map(Into::into).collect(),
            ignore_symbol: DEFAULT_IGNORE_SYMBOL.to_string(),
        }
    }

    /// Overrides the divider-row symbol.
    pub fn with_ignore_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.ignore_symbol = symbol.into();
        self
    }

    /// Finds the column index and the line number where data rows begin.
    ///
    /// `None` when the header never completes or the surviving index set is
    /// empty or ambiguous.
    pub fn locate(&self, text: &str) -> Option<(usize, usize)> {
        if self.wanted.is_empty() {
            return None;
        }
        let mut indices: Option<Vec<usize>> = None;
        let mut next_label = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            let in_header = next_label > 0;
            if !in_header && !self.header_labels.iter().all(|label| line.contains(label.as_str())) {
                continue;
            }
            let label = &self.wanted[next_label];
            let hits: Vec<usize> = line
                .split_whitespace()
                .enumerate()
                .filter(|(_, token)| *token == label.as_str())
                .map(|(i, _)| i)
                .collect();
            indices = Some(match indices {
                None => hits,
                Some(prev) => prev.into_iter().filter(|i| hits.contains(i)).collect(),
            });
            next_label += 1;
            if next_label == self.wanted.len() {
                return match indices.as_deref() {
                    Some([index]) => Some((*index, line_no + 1)),
                    _ => None,
                };
            }
        }
        None
    }

    /// Reads the located column for every row whose first token satisfies
    /// `is_known`. Divider rows and rows too short for the column are
    /// skipped.
    pub fn probe(&self, text: &str, is_known: impl Fn(&str) -> bool) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        let Some((index, data_from)) = self.locate(text) else {
            return values;
        };
        for line in text.lines().skip(data_from) {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(node) = tokens.first() else {
                continue;
            };
            if *node == self.ignore_symbol || !is_known(node) {
                continue;
            }
            if let Some(value) = tokens.get(index) {
                values.insert((*node).to_string(), (*value).to_string());
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "\
~~~~~~~~~~~~~~~~~~~~~~~~~Service Information~~~~~~~~~~~~~~~~~~~~~~~~~
Node                Node              Ip      Build    Cluster
.                     Id               .          .       Size
node1.local:3000    *BB9040011AC4202  10.0.0.1  E-5.2.0  3
node2.local:3000    BB9030011AC4202   10.0.0.2  C-5.1.0  3
.                   .                 .         .        .
node9.local:3000    BB9010011AC4202   10.0.0.9  5.0.0    3
";

    fn known(node: &str) -> bool {
        node.starts_with("node1") || node.starts_with("node2")
    }

    #[test]
    fn test_wrapped_header_resolves_single_index() {
        let probe = ColumnProbe::new(["Node", "Build"], ["Node", "Id"]);
        // "Node" hits columns 0 and 1, "Id" only column 1.
        assert_eq!(probe.locate(SUMMARY), Some((1, 3)));
        let ids = probe.probe(SUMMARY, known);
        assert_eq!(ids.len(), 2);
        assert_eq!(ids["node1.local:3000"], "*BB9040011AC4202");
        assert_eq!(ids["node2.local:3000"], "BB9030011AC4202");
    }

    #[test]
    fn test_single_line_header() {
        let probe = ColumnProbe::new(["Node", "Ip"], ["Ip"]);
        let ips = probe.probe(SUMMARY, known);
        assert_eq!(ips["node2.local:3000"], "10.0.0.2");
    }

    #[test]
    fn test_unknown_and_missing_nodes_are_absent() {
        let probe = ColumnProbe::new(["Node", "Build"], ["Build"]);
        let builds = probe.probe(SUMMARY, |node| node.starts_with("node1") || node.starts_with("node3"));
        assert_eq!(builds.len(), 1);
        assert!(!builds.contains_key("node3.local:3000"));
        assert!(!builds.contains_key("node9.local:3000"));
    }

    #[test]
    fn test_ambiguous_column_is_empty() {
        let probe = ColumnProbe::new(["Node", "Build"], ["Node"]);
        assert_eq!(probe.locate(SUMMARY), None);
        assert!(probe.probe(SUMMARY, known).is_empty());
    }

    #[test]
    fn test_empty_intersection_is_empty() {
        let probe = ColumnProbe::new(["Node", "Build"], ["Ip", "Id"]);
        assert!(probe.probe(SUMMARY, known).is_empty());
    }

    #[test]
    fn test_missing_header_is_empty() {
        let probe = ColumnProbe::new(["Namespace"], ["Objects"]);
        assert!(probe.probe(SUMMARY, known).is_empty());
    }

    #[test]
    fn test_custom_divider_symbol() {
        let dashed = "Node      Ip\n-         -\nn1:3000   10.0.0.1\n";
        let probe = ColumnProbe::new(["Node", "Ip"], ["Ip"]);
        assert!(probe.probe(dashed, |_| true).contains_key("-"));

        let ips = probe.with_ignore_symbol("-").probe(dashed, |_| true);
        assert_eq!(ips.into_iter().collect::<Vec<_>>(), vec![("n1:3000".to_string(), "10.0.0.1".to_string())]);
    }
}
