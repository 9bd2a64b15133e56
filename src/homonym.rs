//! Genus homonym resolution
//!
//! The same genus name can be applied to unrelated taxa under different
//! codes (Bactrocera the fly, Bactrocera the plant). A secondary reference
//! index maps genus names to higher classifications; resolution asks at
//! which rank, if any, a supplied classification pins the genus down to a
//! single entry.

use tracing::debug;

use crate::instance::LinnaeanClassification;
use crate::rank::RankType;
use crate::store::{fields, BoolQuery, MemoryStore};

/// Outcome of a homonym check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomonymResolution {
    /// The genus has at most one reference entry; nothing to resolve.
    Unambiguous,
    /// Ambiguous, but the classification narrows it to one entry at this
    /// rank.
    ResolvedAt(RankType),
    /// Ambiguous and the classification cannot narrow it down.
    Unresolved,
}

/// Resolves genus homonyms against a committed reference store whose
/// documents carry `genus` plus the major classification fields.
pub struct HomonymResolver<'a> {
    reference: &'a MemoryStore,
}

/// Ranks added to the query, highest first.
const NARROWING: [(RankType, &str); 5] = [
    (RankType::Kingdom, fields::KINGDOM),
    (RankType::Phylum, fields::PHYLUM),
    (RankType::Class, fields::CLASS),
    (RankType::Order, fields::ORDER),
    (RankType::Family, fields::FAMILY),
];

impl<'a> HomonymResolver<'a> {
    pub fn new(reference: &'a MemoryStore) -> Self {
        HomonymResolver { reference }
    }

    /// Progressive narrowing: query the genus alone, then add kingdom,
    /// phylum, class, order and family from the classification one at a
    /// time, returning the first rank where exactly one entry remains.
    ///
    /// Absent classification fields are skipped. A field whose addition
    /// empties the result set conflicts with the reference data and is
    /// withdrawn before the next rank is tried.
    pub fn resolve(&self, classification: &LinnaeanClassification) -> HomonymResolution {
        let Some(genus) = classification.genus.as_deref() else {
            return HomonymResolution::Unambiguous;
        };
        let genus = genus.to_uppercase();
        if self.reference.count(fields::GENUS, &genus) <= 1 {
            return HomonymResolution::Unambiguous;
        }

        let mut query = BoolQuery::new().must(fields::GENUS, &genus);
        for (rank, field) in NARROWING {
            let Some(value) = classification.get(rank) else {
                continue;
            };
            let narrowed = query.clone().must(field, &value.to_uppercase());
            let hits = self.reference.search(&narrowed, usize::MAX).len();
            debug!(genus = %genus, rank = %rank, hits, "homonym narrowing");
            match hits {
                0 => continue,
                1 => return HomonymResolution::ResolvedAt(rank),
                _ => query = narrowed,
            }
        }
        HomonymResolution::Unresolved
    }

    /// Kingdom recorded for a genus, used when a synonym candidate has no
    /// classification of its own.
    pub fn kingdom_for_genus(&self, genus: &str) -> Option<String> {
        self.reference
            .first(fields::GENUS, &genus.to_uppercase())
            .and_then(|doc| doc.get(fields::KINGDOM))
            .map(|k| k.to_string())
    }
}
