//! Recognition of numeric counters embedded next to a search term.
//!
//! Server logs print counters in a handful of layouts. For a term `ops`:
//!
//! | Shape        | Example                   | Values      |
//! |--------------|---------------------------|-------------|
//! | `Single`     | `ops 42`                  | `[42]`      |
//! | `CommaList`  | `ops (12, 0, 7)`          | `[12, 0, 7]`|
//! | `PairBefore` | `1200(35) ops`            | `[1200, 35]`|
//! | `OpenGroup`  | `ops (42 total`           | `[42]`      |
//!
//! The first line matching any shape locks that shape for the rest of the
//! scan; later lines are only tested against the locked shape.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Layout of an embedded counter, in match priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterShape {
    /// `<term> N`
    Single,
    /// `<term> (N, N, ...)`
    CommaList,
    /// `N(N) <term>`
    PairBefore,
    /// `<term> (N` without a closing parenthesis
    OpenGroup,
}

impl CounterShape {
    /// All shapes in priority order.
    pub const ALL: [CounterShape; 4] = [
        CounterShape::Single,
        CounterShape::CommaList,
        CounterShape::PairBefore,
        CounterShape::OpenGroup,
    ];

    fn pattern(self, term: &str) -> String {
        match self {
            CounterShape::Single => format!(r"{term} ([0-9]+)"),
            CounterShape::CommaList => format!(r"{term} \(([0-9,\s]+)\)"),
            CounterShape::PairBefore => format!(r"([0-9]+)\(([0-9]+)\) {term}"),
            CounterShape::OpenGroup => format!(r"{term} \(([0-9]+)"),
        }
    }
}

/// Counter values parsed from one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSample {
    /// Shape that produced the values.
    pub shape: CounterShape,
    /// Parsed integers in line order.
    pub values: Vec<i64>,
}

/// Outcome of testing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The line carried a counter.
    Sample(CounterSample),
    /// No shape (or not the locked shape) matched.
    NoMatch,
    /// The locked shape matched but a number did not parse.
    Unparsable,
}

/// Per-scan counter parser with shape lock-in.
#[derive(Debug, Clone)]
pub struct CounterExtractor {
    patterns: Vec<(CounterShape, Regex)>,
    locked: Option<CounterShape>,
}

impl CounterExtractor {
    /// Builds the four shape patterns around `term`.
    ///
    /// A case-sensitive scan treats the term literally; a case-insensitive
    /// scan embeds it as a pattern, matching how the line filter treats it.
    pub fn new(term: &str, case_sensitive: bool) -> Result<Self> {
        let embedded = if case_sensitive {
            regex::escape(term)
        } else {
            term.to_string()
        };
        let patterns = CounterShape::ALL
            .iter()
            .map(|shape| {
                RegexBuilder::new(&shape.pattern(&embedded))
                    .case_insensitive(!case_sensitive)
                    .build()
                    .map(|re| (*shape, re))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            locked: None,
        })
    }

    /// The shape fixed by the first matching line, if any.
    pub fn locked_shape(&self) -> Option<CounterShape> {
        self.locked
    }

    /// Tests `line`, locking the shape on the first hit.
    pub fn extract(&mut self, line: &str) -> Extraction {
        match self.locked {
            Some(shape) => self.extract_with(shape, line),
            None => {
                let hit = self
                    .patterns
                    .iter()
                    .find(|(_, re)| re.is_match(line))
                    .map(|(shape, _)| *shape);
                match hit {
                    Some(shape) => {
                        self.locked = Some(shape);
                        self.extract_with(shape, line)
                    }
                    None => Extraction::NoMatch,
                }
            }
        }
    }

    fn extract_with(&self, shape: CounterShape, line: &str) -> Extraction {
        let Some((_, re)) = self.patterns.iter().find(|(s, _)| *s == shape) else {
            return Extraction::NoMatch;
        };
        let Some(caps) = re.captures(line) else {
            return Extraction::NoMatch;
        };
        let parsed: Option<Vec<i64>> = match shape {
            CounterShape::PairBefore => caps
                .iter()
                .skip(1)
                .map(|m| m.and_then(|m| m.as_str().parse().ok()))
                .collect(),
            _ => caps.get(1).and_then(|m| {
                m.as_str()
                    .split(',')
                    .map(|part| part.trim().parse().ok())
                    .collect()
            }),
        };
        match parsed {
            Some(values) => Extraction::Sample(CounterSample { shape, values }),
            None => Extraction::Unparsable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(extraction: Extraction) -> CounterSample {
        match extraction {
            Extraction::Sample(sample) => sample,
            other => panic!("expected sample, got {other:?}"),
        }
    }

    #[test]
    fn test_each_shape() {
        let cases = [
            ("stat_read_reqs 42 more", CounterShape::Single, vec![42]),
            ("stat_read_reqs (12, 0, 7) more", CounterShape::CommaList, vec![12, 0, 7]),
            ("1200(35) stat_read_reqs", CounterShape::PairBefore, vec![1200, 35]),
            ("stat_read_reqs (42 total", CounterShape::OpenGroup, vec![42]),
        ];
        for (line, shape, values) in cases {
            let mut extractor = CounterExtractor::new("stat_read_reqs", true).unwrap();
            let got = sample(extractor.extract(line));
            assert_eq!(got.shape, shape, "line: {line}");
            assert_eq!(got.values, values, "line: {line}");
            assert_eq!(extractor.locked_shape(), Some(shape));
        }
    }

    #[test]
    fn test_comma_list_lock_is_not_switched_by_bare_int() {
        let mut extractor = CounterExtractor::new("hist", true).unwrap();
        assert_eq!(sample(extractor.extract("hist (1,2,3)")).values, vec![1, 2, 3]);
        assert_eq!(extractor.extract("hist 99"), Extraction::NoMatch);
        assert_eq!(extractor.locked_shape(), Some(CounterShape::CommaList));
        assert_eq!(sample(extractor.extract("hist (4, 5, 6)")).values, vec![4, 5, 6]);
    }

    #[test]
    fn test_no_lock_before_first_match() {
        let mut extractor = CounterExtractor::new("ops", true).unwrap();
        assert_eq!(extractor.extract("nothing here"), Extraction::NoMatch);
        assert_eq!(extractor.locked_shape(), None);
    }

    #[test]
    fn test_literal_term_is_escaped() {
        let mut extractor = CounterExtractor::new("reqs(total)", true).unwrap();
        assert_eq!(sample(extractor.extract("reqs(total) 7")).values, vec![7]);
    }

    #[test]
    fn test_case_insensitive_term() {
        let mut extractor = CounterExtractor::new("OPS", false).unwrap();
        assert_eq!(sample(extractor.extract("ops 5")).values, vec![5]);
    }

    #[test]
    fn test_malformed_list_is_unparsable() {
        let mut extractor = CounterExtractor::new("hist", true).unwrap();
        extractor.extract("hist (1,2)");
        assert_eq!(extractor.extract("hist (1,,2)"), Extraction::Unparsable);
    }
}
