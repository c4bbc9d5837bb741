//! Term and ignore-substring matching.

use regex::{Regex, RegexBuilder};

use super::config::{ScanConfig, TermMode};
use crate::error::Result;

#[derive(Debug, Clone)]
enum Terms {
    /// Case-sensitive substring containment.
    Literal(Vec<String>),
    /// Substring containment on lower-cased text; terms stored lower-cased.
    Folded(Vec<String>),
    /// Case-insensitive regular expressions.
    Patterns(Vec<Regex>),
}

/// Decides whether a line (or a joined block of lines) is wanted.
///
/// A filter without terms matches everything; the ignore substring is always
/// tested case-sensitively against the original text.
#[derive(Debug, Clone)]
pub struct LineFilter {
    terms: Terms,
    mode: TermMode,
    ignore: Option<String>,
}

impl LineFilter {
    /// Filter used by the scanner: literal containment when case sensitive,
    /// case-insensitive regex otherwise.
    ///
    /// Patterns are multi-line so anchors behave the same on a single line
    /// and on a newline-joined block.
    pub fn from_config(config: &ScanConfig) -> Result<Self> {
        let terms = if config.case_sensitive() {
            Terms::Literal(config.terms().to_vec())
        } else {
            Terms::Patterns(
                config
                    .terms()
                    .iter()
                    .map(|t| {
                        RegexBuilder::new(t)
                            .case_insensitive(true)
                            .multi_line(true)
                            .build()
                    })
                    .collect::<std::result::Result<_, _>>()?,
            )
        };
        Ok(Self {
            terms,
            mode: config.mode(),
            ignore: config.ignore().map(str::to_string),
        })
    }

    /// Plain substring filter; `case_sensitive == false` lower-cases both
    /// sides instead of compiling patterns.
    pub fn literal<I, S>(terms: I, mode: TermMode, ignore: Option<&str>, case_sensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let terms = if case_sensitive {
            Terms::Literal(terms)
        } else {
            Terms::Folded(terms.into_iter().map(|t| t.to_lowercase()).collect())
        };
        Self {
            terms,
            mode,
            ignore: ignore.filter(|s| !s.is_empty()).map(str::to_string),
        }
    }

    /// Whether any term is configured.
    pub fn has_terms(&self) -> bool {
        match &self.terms {
            Terms::Literal(t) | Terms::Folded(t) => !t.is_empty(),
            Terms::Patterns(p) => !p.is_empty(),
        }
    }

    /// Applies the AND/OR term test only.
    pub fn matches_terms(&self, text: &str) -> bool {
        if !self.has_terms() {
            return true;
        }
        match &self.terms {
            Terms::Literal(terms) => self.combine(terms.iter().map(|t| text.contains(t.as_str()))),
            Terms::Folded(terms) => {
                let folded = text.to_lowercase();
                self.combine(terms.iter().map(|t| folded.contains(t.as_str())))
            }
            Terms::Patterns(patterns) => self.combine(patterns.iter().map(|p| p.is_match(text))),
        }
    }

    /// Whether the ignore substring occurs in `text`.
    pub fn is_ignored(&self, text: &str) -> bool {
        self.ignore
            .as_deref()
            .is_some_and(|ignore| text.contains(ignore))
    }

    /// Term test followed by ignore exclusion.
    pub fn accepts(&self, line: &str) -> bool {
        self.matches_terms(line) && !self.is_ignored(line)
    }

    fn combine(&self, mut hits: impl Iterator<Item = bool>) -> bool {
        match self.mode {
            TermMode::And => hits.all(|hit| hit),
            TermMode::Or => hits.any(|hit| hit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(terms: &[&str], mode: TermMode, case_sensitive: bool) -> ScanConfig {
        ScanConfig::builder()
            .terms(terms.iter().copied())
            .mode(mode)
            .case_sensitive(case_sensitive)
            .ignore("skip-me")
            .build()
            .unwrap()
    }

    #[test]
    fn test_or_and_modes() {
        let or = LineFilter::from_config(&config(&["alpha", "beta"], TermMode::Or, true)).unwrap();
        assert!(or.accepts("x alpha y"));
        assert!(or.accepts("beta"));
        assert!(!or.accepts("gamma"));

        let and = LineFilter::from_config(&config(&["alpha", "beta"], TermMode::And, true)).unwrap();
        assert!(and.accepts("alpha and beta"));
        assert!(!and.accepts("alpha only"));
    }

    #[test]
    fn test_case_insensitive_uses_regex() {
        let filter = LineFilter::from_config(&config(&["migr.te"], TermMode::Or, false)).unwrap();
        assert!(filter.accepts("MIGRATE started"));
        assert!(!filter.accepts("migr"));

        let literal = LineFilter::from_config(&config(&["migr.te"], TermMode::Or, true)).unwrap();
        assert!(!literal.accepts("migrate"));
        assert!(literal.accepts("migr.te"));
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let bad = config(&["(unclosed"], TermMode::Or, false);
        assert!(LineFilter::from_config(&bad).is_err());
    }

    #[test]
    fn test_ignore_wins_over_match() {
        let filter = LineFilter::from_config(&config(&["alpha"], TermMode::Or, true)).unwrap();
        assert!(filter.matches_terms("alpha skip-me"));
        assert!(!filter.accepts("alpha skip-me"));
    }

    #[test]
    fn test_folded_literal() {
        let filter = LineFilter::literal(["Node"], TermMode::Or, Some("Ignore"), false);
        assert!(filter.accepts("NODE summary"));
        // The ignore substring is matched against the original casing.
        assert!(filter.accepts("node ignore"));
        assert!(!filter.accepts("node Ignore"));
    }

    #[test]
    fn test_no_terms_matches_everything() {
        let filter = LineFilter::literal(Vec::<String>::new(), TermMode::And, None, true);
        assert!(!filter.has_terms());
        assert!(filter.accepts("anything at all"));
    }
}
