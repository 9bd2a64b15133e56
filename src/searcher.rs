//! Name matching
//!
//! The read path over a committed index: resolve an incoming name (with an
//! optional rank and partial classification) to the single best taxon
//! concept. The cascade tries progressively looser searches and stops at
//! the first stage with a hit:
//! 1. direct canonical-name match
//! 2. alternate-names match, after updating the rank from any marker token
//!    embedded in the name
//! 3. phonetic-key match (fuzzy queries only, classification dropped)
//! 4. cleaned canonical form, recursing into a direct match
//!
//! A genus-rank hit triggers homonym validation against the secondary
//! reference index.

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use strsim::levenshtein;
use tracing::debug;

use crate::error::MatchError;
use crate::homonym::{HomonymResolution, HomonymResolver};
use crate::instance::LinnaeanClassification;
use crate::key::{NameAnalyser, NomenclaturalCode};
use crate::rank::RankType;
use crate::store::{fields, BoolQuery, Document, MemoryStore};
use crate::utils::normalization::normalise_spaces;
use crate::utils::soundex::soundex;

const RESULT_LIMIT: usize = 20;
/// Kingdom names this far apart still count as the same kingdom.
const KINGDOM_MAX_DISTANCE: usize = 3;
const KINGDOM_MAX_LENGTH_DIFF: usize = 3;

/// How a match was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Direct,
    Alternate,
    Phonetic,
    Canonical,
    HigherRank,
}

/// A candidate carried inside a failure, enough for caller-side
/// disambiguation.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub lsid: String,
    pub scientific_name: String,
    pub rank: Option<RankType>,
    pub kingdom: Option<String>,
    pub accepted_lsid: Option<String>,
    pub priority: i32,
}

impl std::fmt::Display for MatchCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.scientific_name, self.lsid)
    }
}

/// A successful resolution.
#[derive(Debug, Clone, Serialize)]
pub struct NameSearchResult {
    pub lsid: String,
    pub scientific_name: String,
    pub rank: Option<RankType>,
    /// Set when the match is a synonym of this accepted concept.
    pub accepted_lsid: Option<String>,
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub priority: i32,
    pub classification: LinnaeanClassification,
    pub match_type: MatchType,
    /// True when the match came from a cleaned form of the input name.
    pub cleaned: bool,
}

/// Read-only matcher over a committed index, with an optional secondary
/// reference index for homonym detection. Queries take `&self` throughout
/// and may run concurrently.
pub struct NameSearcher {
    index: MemoryStore,
    reference: Option<MemoryStore>,
    analyser: NameAnalyser,
    spp_marker: Regex,
    rank_marker: Regex,
    doubtful_marker: Regex,
}

impl NameSearcher {
    pub fn new(index: MemoryStore, reference: Option<MemoryStore>) -> Result<Self> {
        Ok(NameSearcher {
            index,
            reference,
            analyser: NameAnalyser::new()?,
            spp_marker: Regex::new(r"(?i)\bspp\.?(\s|$)")?,
            rank_marker: Regex::new(r"(?i)\b(subsp|ssp|var|subvar|f|forma|cv)\.")?,
            doubtful_marker: Regex::new(r"(?i)\b(AFF|CF|UNDET|INDET)\b")?,
        })
    }

    /// Resolve a bare name.
    pub fn search_by_name(&self, name: &str) -> Result<Option<NameSearchResult>, MatchError> {
        self.search(name, None, None, false)
    }

    /// Resolve a name at a known rank.
    pub fn search_by_name_rank(
        &self,
        name: &str,
        rank: RankType,
    ) -> Result<Option<NameSearchResult>, MatchError> {
        self.search(name, None, Some(rank), false)
    }

    /// Full cascade: name, optional classification hint, optional rank,
    /// optional fuzzy (phonetic) stage.
    pub fn search(
        &self,
        name: &str,
        classification: Option<&LinnaeanClassification>,
        rank: Option<RankType>,
        fuzzy: bool,
    ) -> Result<Option<NameSearchResult>, MatchError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(MatchError::Generic("no scientific name supplied".into()));
        }
        if self.spp_marker.is_match(trimmed) {
            return Err(MatchError::SpeciesPlural);
        }
        let key = self
            .analyser
            .analyse(NomenclaturalCode::Any, trimmed, None, rank);
        let canonical = key.scientific_name;
        if canonical.is_empty() {
            return Err(MatchError::Generic(format!(
                "no usable name in {trimmed:?}"
            )));
        }

        if let Some(result) = self.perform(
            fields::NAME,
            &canonical,
            rank,
            classification,
            true,
            MatchType::Direct,
            false,
        )? {
            return Ok(Some(result));
        }

        // A rank marker embedded in the name is more reliable than the
        // caller's hint
        let rank = self.embedded_rank(trimmed).or(rank);
        if let Some(result) = self.perform(
            fields::NAMES,
            &canonical,
            rank,
            classification,
            true,
            MatchType::Alternate,
            false,
        )? {
            return Ok(Some(result));
        }

        if fuzzy {
            let phonetic = soundex(&canonical);
            if !phonetic.is_empty() {
                // Phonetic collisions are unreliable evidence, so no
                // classification narrowing and no homonym check here
                if let Some(result) = self.perform(
                    fields::SEARCHABLE_NAME,
                    &phonetic,
                    rank,
                    None,
                    false,
                    MatchType::Phonetic,
                    false,
                )? {
                    return Ok(Some(result));
                }
            }
        }

        let cleaned = normalise_spaces(&self.doubtful_marker.replace_all(&canonical, " "));
        if !cleaned.is_empty() && cleaned != canonical {
            debug!(input = %canonical, cleaned = %cleaned, "retrying with cleaned name");
            if let Some(result) = self.perform(
                fields::NAME,
                &cleaned,
                rank,
                classification,
                true,
                MatchType::Canonical,
                true,
            )? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Resolve from a classification alone: search the name at its lowest
    /// recorded rank, and with `recursive` walk up the major ranks until
    /// something matches.
    pub fn search_by_classification(
        &self,
        classification: &LinnaeanClassification,
        recursive: bool,
    ) -> Result<Option<NameSearchResult>, MatchError> {
        let Some(mut rank) = classification.lowest_rank() else {
            return Err(MatchError::Generic("empty classification supplied".into()));
        };
        let name = classification.get(rank).unwrap_or_default();
        if let Some(result) = self.search(name, Some(classification), Some(rank), false)? {
            return Ok(Some(result));
        }
        if !recursive {
            return Ok(None);
        }
        while let Some(higher) = rank.higher_major() {
            rank = higher;
            let Some(name) = classification.get(rank) else {
                continue;
            };
            if let Some(mut result) = self.search(name, Some(classification), Some(rank), false)? {
                result.match_type = MatchType::HigherRank;
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Direct lookup by identifier.
    pub fn search_by_id(&self, lsid: &str) -> Option<NameSearchResult> {
        self.index
            .first(fields::LSID, lsid)
            .map(|doc| result_from_doc(doc, MatchType::Direct, false))
    }

    /// One search stage: MUST on the term (and rank when hinted), SHOULD on
    /// the classification, excluded and homonym checks on the results.
    #[allow(clippy::too_many_arguments)]
    fn perform(
        &self,
        field: &str,
        value: &str,
        rank: Option<RankType>,
        classification: Option<&LinnaeanClassification>,
        check_homonym: bool,
        match_type: MatchType,
        cleaned: bool,
    ) -> Result<Option<NameSearchResult>, MatchError> {
        let mut query = BoolQuery::new().must(field, value);
        if let Some(rank) = rank {
            query = query.must(fields::RANK, rank.label());
        }
        if let Some(cl) = classification {
            if let Some(kingdom) = cl.kingdom.as_deref() {
                query = query.should(fields::KINGDOM, &kingdom.to_uppercase());
            }
            if let Some(genus) = cl.genus.as_deref() {
                query = query.should(fields::GENUS, &genus.to_uppercase());
            }
        }
        let hits = self.index.search(&query, RESULT_LIMIT);
        if hits.is_empty() {
            return Ok(None);
        }
        let docs: Vec<&Document> = hits.iter().map(|h| h.doc).collect();

        let (excluded, included): (Vec<&Document>, Vec<&Document>) = docs
            .into_iter()
            .partition(|d| d.get(fields::STATUS) == Some("excluded"));
        if !excluded.is_empty() {
            return Err(MatchError::Excluded {
                excluded: Box::new(candidate_from_doc(excluded[0])),
                alternative: included.first().map(|d| Box::new(candidate_from_doc(d))),
            });
        }

        let mut docs = included;
        let top_is_genus = docs
            .first()
            .and_then(|d| d.get_i32(fields::RANK_ID))
            .map(|id| id == RankType::Genus.id())
            .unwrap_or(false);
        if check_homonym && top_is_genus {
            docs = self.validate_homonyms(docs, value, classification)?;
        }
        Ok(docs
            .first()
            .map(|doc| result_from_doc(doc, match_type, cleaned)))
    }

    /// Genus-rank hits need a homonym check: if the reference index knows
    /// the genus under several classifications, the hint must pin one down,
    /// and candidates are filtered to the hint's kingdom (allowing small
    /// spelling drift). Synonym candidates have no kingdom of their own and
    /// resolve it through the reference index.
    fn validate_homonyms<'d>(
        &self,
        docs: Vec<&'d Document>,
        genus: &str,
        classification: Option<&LinnaeanClassification>,
    ) -> Result<Vec<&'d Document>, MatchError> {
        let Some(reference) = &self.reference else {
            return Ok(docs);
        };
        let resolver = HomonymResolver::new(reference);
        let mut resolving = classification.cloned().unwrap_or_default();
        resolving.genus = Some(genus.to_string());

        match resolver.resolve(&resolving) {
            HomonymResolution::Unambiguous => Ok(docs),
            HomonymResolution::ResolvedAt(_) => {
                let Some(hint_kingdom) = resolving.kingdom.as_deref() else {
                    return Ok(docs);
                };
                let filtered: Vec<&Document> = docs
                    .iter()
                    .filter(|doc| {
                        let kingdom = doc
                            .get(fields::KINGDOM)
                            .map(|k| k.to_string())
                            .or_else(|| {
                                doc.has(fields::ACCEPTED_LSID)
                                    .then(|| resolver.kingdom_for_genus(genus))
                                    .flatten()
                            });
                        kingdom
                            .map(|k| kingdoms_close(&k, hint_kingdom))
                            .unwrap_or(false)
                    })
                    .copied()
                    .collect();
                if filtered.is_empty() {
                    Err(MatchError::Homonym {
                        candidates: docs.iter().map(|d| candidate_from_doc(d)).collect(),
                    })
                } else {
                    Ok(filtered)
                }
            }
            HomonymResolution::Unresolved => Err(MatchError::Homonym {
                candidates: docs.iter().map(|d| candidate_from_doc(d)).collect(),
            }),
        }
    }

    /// Rank marker token embedded in the name, e.g. "var." or "subsp.".
    fn embedded_rank(&self, name: &str) -> Option<RankType> {
        self.rank_marker
            .captures(name)
            .and_then(|c| c.get(1))
            .and_then(|m| RankType::from_name(&format!("{}.", m.as_str().to_lowercase())))
    }
}

/// Kingdom names match when equal or within a small edit distance.
fn kingdoms_close(a: &str, b: &str) -> bool {
    let a = a.to_uppercase();
    let b = b.to_uppercase();
    if a == b {
        return true;
    }
    let diff = a.len().abs_diff(b.len());
    diff <= KINGDOM_MAX_LENGTH_DIFF && levenshtein(&a, &b) <= KINGDOM_MAX_DISTANCE
}

fn candidate_from_doc(doc: &Document) -> MatchCandidate {
    MatchCandidate {
        lsid: doc.get(fields::LSID).unwrap_or_default().to_string(),
        scientific_name: doc.get(fields::NAME).unwrap_or_default().to_string(),
        rank: doc.get(fields::RANK).and_then(RankType::from_name),
        kingdom: doc.get(fields::KINGDOM).map(|k| k.to_string()),
        accepted_lsid: doc.get(fields::ACCEPTED_LSID).map(|a| a.to_string()),
        priority: doc.get_i32(fields::PRIORITY).unwrap_or(0),
    }
}

fn result_from_doc(doc: &Document, match_type: MatchType, cleaned: bool) -> NameSearchResult {
    let mut classification = LinnaeanClassification::default();
    let pairs = [
        (RankType::Kingdom, fields::KINGDOM, fields::KINGDOM_ID),
        (RankType::Phylum, fields::PHYLUM, fields::PHYLUM_ID),
        (RankType::Class, fields::CLASS, fields::CLASS_ID),
        (RankType::Order, fields::ORDER, fields::ORDER_ID),
        (RankType::Family, fields::FAMILY, fields::FAMILY_ID),
        (RankType::Genus, fields::GENUS, fields::GENUS_ID),
        (RankType::Species, fields::SPECIES, fields::SPECIES_ID),
    ];
    for (rank, field, id_field) in pairs {
        if let Some(name) = doc.get(field) {
            classification.set(rank, name, doc.get(id_field).unwrap_or_default());
        }
    }
    NameSearchResult {
        lsid: doc.get(fields::LSID).unwrap_or_default().to_string(),
        scientific_name: doc.get(fields::NAME).unwrap_or_default().to_string(),
        rank: doc.get(fields::RANK).and_then(RankType::from_name),
        accepted_lsid: doc.get(fields::ACCEPTED_LSID).map(|a| a.to_string()),
        left: doc.get_i32(fields::LEFT),
        right: doc.get_i32(fields::RIGHT),
        priority: doc.get_i32(fields::PRIORITY).unwrap_or(0),
        classification,
        match_type,
        cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kingdoms_close() {
        assert!(kingdoms_close("Animalia", "ANIMALIA"));
        assert!(kingdoms_close("Animalia", "Animala"));
        assert!(!kingdoms_close("Animalia", "Plantae"));
        assert!(!kingdoms_close("Animalia", "Animalia incertae sedis"));
    }

    #[test]
    fn test_empty_name_is_generic_error() {
        let mut store = MemoryStore::new();
        store.commit();
        let searcher = NameSearcher::new(store, None).unwrap();
        assert!(matches!(
            searcher.search_by_name("   "),
            Err(MatchError::Generic(_))
        ));
    }

    #[test]
    fn test_spp_marker_rejected() {
        let mut store = MemoryStore::new();
        store.commit();
        let searcher = NameSearcher::new(store, None).unwrap();
        assert!(matches!(
            searcher.search_by_name("Acacia spp."),
            Err(MatchError::SpeciesPlural)
        ));
        assert!(matches!(
            searcher.search_by_name("Acacia spp"),
            Err(MatchError::SpeciesPlural)
        ));
    }

    #[test]
    fn test_embedded_rank() {
        let mut store = MemoryStore::new();
        store.commit();
        let searcher = NameSearcher::new(store, None).unwrap();
        assert_eq!(
            searcher.embedded_rank("Acacia dealbata var. dealbata"),
            Some(RankType::Variety)
        );
        assert_eq!(
            searcher.embedded_rank("Acacia dealbata subsp. subalpina"),
            Some(RankType::Subspecies)
        );
        assert_eq!(searcher.embedded_rank("Acacia dealbata"), None);
    }
}
