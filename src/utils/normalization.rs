//! Scientific name cleanup
//!
//! Derives three progressively more aggressive forms of a raw name:
//! 1. `name`: whitespace collapsed, otherwise untouched
//! 2. `normalised`: NFKC-normalized with typographic punctuation folded to ASCII
//! 3. `basic`: NFD-decomposed, accents stripped, non-ASCII dropped
//!
//! All forms are computed on first use and cached; the type is cheap to
//! construct for names that are never inspected beyond the collapsed form.

use std::sync::OnceLock;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A scientific name with cached cleaned-up renderings.
///
/// Pure over its input: any Unicode string produces a best-effort output,
/// never an error.
#[derive(Debug)]
pub struct CleanedName {
    source: String,
    name: OnceLock<String>,
    normalised: OnceLock<String>,
    basic: OnceLock<String>,
}

impl CleanedName {
    pub fn new(source: &str) -> Self {
        CleanedName {
            source: source.to_string(),
            name: OnceLock::new(),
            normalised: OnceLock::new(),
            basic: OnceLock::new(),
        }
    }

    /// The original string as supplied.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whitespace-collapsed form of the source.
    pub fn name(&self) -> &str {
        self.name.get_or_init(|| normalise_spaces(&self.source))
    }

    /// NFKC-normalized form with typographic punctuation folded to ASCII.
    pub fn normalised(&self) -> &str {
        self.normalised.get_or_init(|| {
            normalise_spaces(&translate_punctuation(
                &self.source.nfkc().collect::<String>(),
            ))
        })
    }

    /// Fully decomposed ASCII-only form: accents stripped, remaining
    /// non-ASCII characters dropped.
    pub fn basic(&self) -> &str {
        self.basic.get_or_init(|| {
            let translated = translate_punctuation(&self.source);
            let ascii: String = translated
                .nfd()
                .filter(|c| !is_combining_mark(*c))
                .filter(|c| c.is_ascii())
                .collect();
            normalise_spaces(&ascii)
        })
    }

    /// True if the normalised form differs from the collapsed name.
    pub fn has_normalised(&self) -> bool {
        self.name() != self.normalised()
    }

    /// True if the basic form differs from the normalised form.
    pub fn has_basic(&self) -> bool {
        self.normalised() != self.basic()
    }
}

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalise_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Fold typographic punctuation and common ligatures to ASCII equivalents.
///
/// The multiplication sign becomes a spaced "x" so hybrid markers survive
/// the ASCII reduction as a separate token.
pub fn translate_punctuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '\u{00B4}'
            | '\u{0060}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{00D7}' => out.push_str(" x "),
            '\u{00C6}' => out.push_str("AE"),
            '\u{00E6}' => out.push_str("ae"),
            '\u{0152}' => out.push_str("OE"),
            '\u{0153}' => out.push_str("oe"),
            '\u{00DF}' => out.push_str("ss"),
            '\u{00D8}' => out.push('O'),
            '\u{00F8}' => out.push('o'),
            '\u{0110}' => out.push('D'),
            '\u{0111}' => out.push('d'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalise_spaces() {
        assert_eq!(normalise_spaces("  Acacia   dealbata "), "Acacia dealbata");
        assert_eq!(normalise_spaces("Acacia\tdealbata\n"), "Acacia dealbata");
        assert_eq!(normalise_spaces(""), "");
    }

    #[test]
    fn test_name_collapses_whitespace_only() {
        let n = CleanedName::new("  Acacia   dealbata ");
        assert_eq!(n.name(), "Acacia dealbata");
        assert_eq!(n.source(), "  Acacia   dealbata ");
    }

    #[test]
    fn test_normalised_folds_punctuation() {
        let n = CleanedName::new("Acacia \u{2018}Clair de Lune\u{2019}");
        assert_eq!(n.normalised(), "Acacia 'Clair de Lune'");
        assert!(n.has_normalised());
    }

    #[test]
    fn test_basic_strips_accents() {
        let n = CleanedName::new("M\u{00FC}hlenbergia");
        assert_eq!(n.basic(), "Muhlenbergia");
        let n = CleanedName::new("S\u{00E9}rsic & Cocucci");
        assert_eq!(n.basic(), "Sersic & Cocucci");
    }

    #[test]
    fn test_multiplication_sign_becomes_hybrid_marker() {
        let n = CleanedName::new("Cupressus \u{00D7} leylandii");
        assert_eq!(n.basic(), "Cupressus x leylandii");
    }

    #[test]
    fn test_ligatures() {
        let n = CleanedName::new("L\u{0153}lia");
        assert_eq!(n.basic(), "Loelia");
    }

    #[test]
    fn test_plain_ascii_unchanged() {
        let n = CleanedName::new("Macropus rufus");
        assert_eq!(n.name(), "Macropus rufus");
        assert!(!n.has_normalised());
        assert!(!n.has_basic());
    }
}
