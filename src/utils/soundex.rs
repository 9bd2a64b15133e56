//! Phonetic keys for fuzzy name matching
//!
//! Folds a scientific name into a sound-alike token so that common
//! transcription variants (ae/e, oe/i, doubled letters, k/c confusion,
//! latinised suffix drift) land on the same search key. The first word of a
//! name is treated as a genus word, later words as species epithets; species
//! epithets additionally have their gender suffix normalized.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Position of a word within a scientific name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpithetKind {
    Genus,
    Species,
}

/// Substitutions applied only at the start of a word.
const LEADING_PAIRS: &[(&str, &str)] = &[
    ("AE", "E"),
    ("CN", "N"),
    ("CT", "T"),
    ("CZ", "C"),
    ("DJ", "J"),
    ("EA", "E"),
    ("EU", "U"),
    ("GN", "N"),
    ("KN", "N"),
    ("MC", "MAC"),
    ("MN", "N"),
    ("OE", "E"),
    ("QU", "Q"),
    ("PS", "S"),
    ("PT", "T"),
    ("TS", "S"),
    ("WR", "R"),
    ("X", "Z"),
];

/// Identification qualifiers that carry no phonetic information.
const MARKER_WORDS: &[&str] = &["CF", "AFF", "SP", "SPP", "SUBSP", "VAR", "INDET", "UNDET"];

/// Phonetic key for a whole name: word-by-word transform, space-joined.
/// Qualifier tokens (cf., aff., sp., ...) are dropped.
pub fn soundex(name: &str) -> String {
    let mut words = Vec::new();
    for (i, word) in name.split_whitespace().enumerate() {
        let kind = if i == 0 { EpithetKind::Genus } else { EpithetKind::Species };
        let treated = treat_word(word, kind);
        if !treated.is_empty() {
            words.push(treated);
        }
    }
    words.join(" ")
}

/// Phonetic key for a single word.
///
/// Logic: uppercase and strip accents, drop qualifier tokens, apply the
/// leading-pair substitution, fold the body (vowel classes merged, K/Z to C,
/// H dropped) keeping the first letter intact, collapse doubled letters,
/// and for species epithets normalize an IS/IM/AS suffix to A.
pub fn treat_word(word: &str, kind: EpithetKind) -> String {
    let upper: String = word
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(|c| c.to_uppercase())
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if upper.is_empty() || MARKER_WORDS.contains(&upper.as_str()) {
        return String::new();
    }

    let mut w = upper;
    for (from, to) in LEADING_PAIRS {
        if w.starts_with(from) {
            w = format!("{}{}", to, &w[from.len()..]);
            break;
        }
    }

    let mut folded = String::with_capacity(w.len());
    let chars: Vec<char> = w.chars().collect();
    folded.push(chars[0]);
    let mut i = 1;
    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair = match (chars[i], chars[i + 1]) {
                ('A', 'E') => Some('I'),
                ('I', 'A') => Some('A'),
                ('O', 'E') => Some('I'),
                ('O', 'I') => Some('A'),
                ('S', 'C') => Some('S'),
                _ => None,
            };
            if let Some(c) = pair {
                folded.push(c);
                i += 2;
                continue;
            }
        }
        match chars[i] {
            'E' => folded.push('I'),
            'O' => folded.push('A'),
            'U' => folded.push('I'),
            'Y' => folded.push('I'),
            'K' => folded.push('C'),
            'Z' => folded.push('C'),
            'H' => {}
            c => folded.push(c),
        }
        i += 1;
    }

    let mut collapsed = String::with_capacity(folded.len());
    let mut last = None;
    for c in folded.chars() {
        if last != Some(c) {
            collapsed.push(c);
        }
        last = Some(c);
    }

    if kind == EpithetKind::Species
        && (collapsed.ends_with("IS") || collapsed.ends_with("IM") || collapsed.ends_with("AS"))
    {
        collapsed.truncate(collapsed.len() - 2);
        collapsed.push('A');
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcription_variants_collide() {
        assert_eq!(
            treat_word("Phoenix", EpithetKind::Genus),
            treat_word("Phenix", EpithetKind::Genus)
        );
        assert_eq!(
            treat_word("Bactrocera", EpithetKind::Genus),
            treat_word("Baktrocera", EpithetKind::Genus)
        );
    }

    #[test]
    fn test_doubled_letters_collapse() {
        assert_eq!(
            soundex("Litoria gracilenta"),
            soundex("Litoria gracillenta")
        );
    }

    #[test]
    fn test_species_suffix_normalized() {
        assert_eq!(
            treat_word("rufus", EpithetKind::Species),
            treat_word("rufis", EpithetKind::Species)
        );
    }

    #[test]
    fn test_suffix_left_alone_for_genus() {
        assert_ne!(
            treat_word("Apis", EpithetKind::Genus),
            treat_word("Apa", EpithetKind::Genus)
        );
    }

    #[test]
    fn test_marker_words_dropped() {
        assert_eq!(soundex("Acacia sp. dealbata"), soundex("Acacia dealbata"));
        assert_eq!(treat_word("cf.", EpithetKind::Species), "");
    }

    #[test]
    fn test_leading_substitutions() {
        assert_eq!(
            treat_word("Gnathifera", EpithetKind::Genus),
            treat_word("Nathifera", EpithetKind::Genus)
        );
        assert_eq!(
            treat_word("Xanthorrhoea", EpithetKind::Genus),
            treat_word("Zanthorrhoea", EpithetKind::Genus)
        );
    }

    #[test]
    fn test_accents_folded_before_encoding() {
        assert_eq!(
            treat_word("M\u{00FC}hlenbergia", EpithetKind::Genus),
            treat_word("Muhlenbergia", EpithetKind::Genus)
        );
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(soundex("Macropus rufus"), soundex("Macropus rufus"));
    }
}
