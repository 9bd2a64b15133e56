//! Author string comparison
//!
//! Authorship citations drift between providers: abbreviated surnames
//! ("L." vs "Linnaeus"), accents, bracket conventions and "and"/"&"
//! variation. The comparator here is deliberately lenient: two citations
//! are equivalent when, token by token, one is an abbreviation of the other.
//!
//! Constructed once and shared by reference; it holds no mutable state.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Abbreviation-aware equivalence test for authorship citations.
#[derive(Debug, Default, Clone)]
pub struct AuthorComparator;

impl AuthorComparator {
    pub fn new() -> Self {
        AuthorComparator
    }

    /// True when the two citations plausibly name the same authors.
    ///
    /// Logic: both are tokenized to folded surname fragments; the citations
    /// match when they have the same token count and each token pair is
    /// equal or one is a leading abbreviation of the other.
    pub fn same(&self, a: &str, b: &str) -> bool {
        let ta = tokenize(a);
        let tb = tokenize(b);
        if ta.is_empty() || tb.is_empty() || ta.len() != tb.len() {
            return ta == tb && !ta.is_empty();
        }
        ta.iter().zip(tb.iter()).all(|(x, y)| token_match(x, y))
    }

    /// Optional-aware variant: two absent citations are equivalent, an
    /// absent citation never matches a present one.
    pub fn same_opt(&self, a: Option<&str>, b: Option<&str>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.same(a, b),
            _ => false,
        }
    }
}

fn token_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    // An abbreviation needs at least one letter of overlap
    !short.is_empty() && long.starts_with(short)
}

/// Fold a citation to comparable surname tokens: accents stripped,
/// lowercased, punctuation removed, connective words dropped.
fn tokenize(citation: &str) -> Vec<String> {
    citation
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_lowercase())
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|t| !matches!(*t, "and" | "ex" | "in" | "et" | "al"))
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        let c = AuthorComparator::new();
        assert!(c.same("Bentham", "Bentham"));
        assert!(!c.same("Bentham", "Maiden"));
    }

    #[test]
    fn test_abbreviation() {
        let c = AuthorComparator::new();
        assert!(c.same("L.", "Linnaeus"));
        assert!(c.same("Benth.", "Bentham"));
        assert!(!c.same("Benth.", "L."));
    }

    #[test]
    fn test_connectives_and_accents() {
        let c = AuthorComparator::new();
        assert!(c.same("S\u{00E9}rsic & Cocucci", "Sersic and Cocucci"));
        assert!(c.same("Maiden ex Benth.", "Maiden & Bentham"));
    }

    #[test]
    fn test_optional() {
        let c = AuthorComparator::new();
        assert!(c.same_opt(None, None));
        assert!(!c.same_opt(Some("L."), None));
        assert!(c.same_opt(Some("L."), Some("Linnaeus")));
    }
}
