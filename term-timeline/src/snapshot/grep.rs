//! Whole-file grep over snapshot files.
//!
//! Unlike server logs, snapshot files carry no per-line timestamps, so there
//! is no window or slicing: every line is tested once with a literal
//! [`LineFilter`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{ErrorContext, Result};
use crate::scan::LineFilter;

/// Concatenates every accepted line, terminators included.
pub fn grep_lines<B: BufRead>(input: B, filter: &LineFilter) -> Result<String> {
    let mut out = String::new();
    for_each_match(input, filter, |line| out.push_str(line))?;
    Ok(out)
}

/// Counts accepted lines.
pub fn grep_count<B: BufRead>(input: B, filter: &LineFilter) -> Result<u64> {
    let mut count = 0u64;
    for_each_match(input, filter, |_| count += 1)?;
    Ok(count)
}

/// [`grep_lines`] over the file at `path`.
pub fn grep_file(path: impl AsRef<Path>, filter: &LineFilter) -> Result<String> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening snapshot {}", path.display()))?;
    grep_lines(BufReader::new(file), filter)
}

fn for_each_match<B: BufRead>(mut input: B, filter: &LineFilter, mut on_match: impl FnMut(&str)) -> Result<()> {
    let mut buf = Vec::with_capacity(256);
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        if filter.accepts(&line) {
            on_match(&line);
        }
    }
}
