//! Counters for the lines a scan silently drops.

use serde::{Deserialize, Serialize};

/// Tallies of skip and lock-in decisions made during a scan.
///
/// None of these influence results; they exist so tests and callers can see
/// why lines did not show up. Reset by every `configure`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanDiagnostics {
    /// Lines handed out by the block reader or grep fast path.
    pub lines_read: u64,
    /// Lines whose timestamp could not be parsed.
    pub lines_without_timestamp: u64,
    /// Lines earlier than the requested range.
    pub lines_before_range: u64,
    /// Lines rejected by the term filter.
    pub lines_filtered: u64,
    /// Lines rejected by the ignore substring.
    pub lines_ignored: u64,
    /// Blocks read from the file.
    pub blocks_read: u64,
    /// Blocks dropped because the joined text failed the filter.
    pub blocks_skipped: u64,
    /// Blocks cut down to their trailing line to bound latency.
    pub forced_block_returns: u64,
    /// One-line rewinds after reading past an explicit range end.
    pub rewinds: u64,
    /// Matching lines seen before any counter shape matched.
    pub counter_lines_unmatched: u64,
    /// Lines matching the locked counter shape whose numbers did not parse.
    pub counter_lines_unparsed: u64,
}
