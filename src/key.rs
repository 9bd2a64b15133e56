//! Canonical name keys
//!
//! A `NameKey` is the deduplication unit of the whole index: two provider
//! records with equal keys are assertions about the same nomenclatural
//! entity. `NameAnalyser` derives the key from a raw name plus code, folding
//! away punctuation, authorship embedded in the name string, and rank-marker
//! noise, and classifying the name type from lexical markers.
//!
//! Analysis is deterministic: byte-identical logical inputs always produce
//! equal keys.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::rank::RankType;
use crate::utils::normalization::{normalise_spaces, CleanedName};

/// Nomenclatural code governing a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NomenclaturalCode {
    Botanical,
    Zoological,
    Bacterial,
    Virus,
    Any,
}

/// Lexical category of a name, inferred from markers in the string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameType {
    Scientific,
    Virus,
    Hybrid,
    Cultivar,
    Doubtful,
    Placeholder,
    NoName,
}

impl NameType {
    pub fn label(self) -> &'static str {
        match self {
            NameType::Scientific => "scientific",
            NameType::Virus => "virus",
            NameType::Hybrid => "hybrid",
            NameType::Cultivar => "cultivar",
            NameType::Doubtful => "doubtful",
            NameType::Placeholder => "placeholder",
            NameType::NoName => "noname",
        }
    }
}

/// Additional markers attached to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameFlag {
    /// Infraspecific epithet repeats the specific epithet (no authorship).
    Autonym,
    /// The governing code had to be guessed.
    AmbiguousNomenclaturalCode,
}

/// Canonical, comparable key for a scientific name.
///
/// Authorship is `None` whenever it is absent; an empty string never
/// appears here, so "unspecified" and "explicitly cleared" stay distinct
/// from any real citation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameKey {
    pub code: NomenclaturalCode,
    pub scientific_name: String,
    pub authorship: Option<String>,
    pub name_type: NameType,
    pub rank: RankType,
    #[serde(default)]
    pub flags: BTreeSet<NameFlag>,
}

/// Derives `NameKey`s from raw names. All patterns are compiled once at
/// construction; analysis itself cannot fail.
#[derive(Debug)]
pub struct NameAnalyser {
    virus: Regex,
    placeholder: Regex,
    doubtful: Regex,
    cultivar: Regex,
    hybrid: Regex,
    annotation: Regex,
    subgenus: Regex,
    rank_marker: Regex,
    year_residue: Regex,
    non_name: Regex,
    alpha: Regex,
}

impl NameAnalyser {
    pub fn new() -> Result<Self> {
        Ok(NameAnalyser {
            virus: compile(r"(?i)\b(virus|viroid|phage|prion|satellite)\b")?,
            placeholder: compile(r"(?i)\b(incertae\s+sedis|species\s+inquirenda|unplaced)\b")?,
            doubtful: compile(r"(?i)\b(undet|indet|aff|cf)\.?(\s|$)")?,
            cultivar: compile(r"'[^']+'")?,
            hybrid: compile(r"(?i)(^x\s)|(\sx\s)")?,
            annotation: compile(r"\[[^\]]*\]")?,
            subgenus: compile(r"\([^)]*\)")?,
            rank_marker: compile(r"(?i)\b(sp|spp|subsp|ssp|var|subvar|f|forma|cv|sect)\.")?,
            year_residue: compile(r",?\s*\d{4}\s*$")?,
            non_name: compile(r#"[^A-Za-z0-9'" \-]"#)?,
            alpha: compile(r"[A-Za-z]")?,
        })
    }

    /// Derive the canonical key for a name.
    ///
    /// Rank inference is not performed here: the rank must be supplied or
    /// the key is left unranked.
    pub fn analyse(
        &self,
        code: NomenclaturalCode,
        name: &str,
        authorship: Option<&str>,
        rank: Option<RankType>,
    ) -> NameKey {
        let rank = rank.unwrap_or(RankType::Unranked);

        let cleaned = CleanedName::new(name);
        let mut working = self.annotation.replace_all(cleaned.basic(), " ").into_owned();

        let authorship = authorship
            .map(|a| {
                let basic = CleanedName::new(a).basic().replace(" and ", " & ");
                normalise_spaces(&basic)
            })
            .filter(|a| !a.is_empty());

        // Authorship repeated inside the name string is noise for the key
        if let Some(author) = authorship.as_deref() {
            if let Some(pos) = working.find(author) {
                working.replace_range(pos..pos + author.len(), " ");
                working = self.year_residue.replace(&working, "").into_owned();
            }
        }

        let name_type = self.classify(code, &working);

        let canonical = match name_type {
            NameType::Virus => normalise_spaces(&working).to_uppercase(),
            _ => {
                let no_subgenus = self.subgenus.replace_all(&working, " ");
                let no_markers = self.rank_marker.replace_all(&no_subgenus, " ");
                let plain = self.non_name.replace_all(&no_markers, " ");
                normalise_spaces(&plain).to_uppercase()
            }
        };

        let mut flags = BTreeSet::new();
        if is_autonym(&canonical) {
            flags.insert(NameFlag::Autonym);
        }
        if code == NomenclaturalCode::Any {
            flags.insert(NameFlag::AmbiguousNomenclaturalCode);
        }

        NameKey {
            code,
            scientific_name: canonical,
            authorship,
            name_type,
            rank,
            flags,
        }
    }

    /// Classification precedence mirrors how unambiguous each marker is:
    /// virus and placeholder markers dominate, lexical oddities next, a
    /// plain latinate string is scientific.
    fn classify(&self, code: NomenclaturalCode, name: &str) -> NameType {
        if code == NomenclaturalCode::Virus || self.virus.is_match(name) {
            return NameType::Virus;
        }
        if self.placeholder.is_match(name) {
            return NameType::Placeholder;
        }
        if !self.alpha.is_match(name) {
            return NameType::NoName;
        }
        if self.hybrid.is_match(name) {
            return NameType::Hybrid;
        }
        if self.cultivar.is_match(name) {
            return NameType::Cultivar;
        }
        if self.doubtful.is_match(name) {
            return NameType::Doubtful;
        }
        NameType::Scientific
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("compiling name pattern {pattern}"))
}

/// An autonym repeats its specific epithet as the infraspecific epithet.
fn is_autonym(canonical: &str) -> bool {
    let words: Vec<&str> = canonical.split(' ').collect();
    words.len() >= 3 && words[words.len() - 1] == words[words.len() - 2]
}
