//! Taxon concept instances and classification context
//!
//! Plain data carried through the build: one `TaxonConceptInstance` per
//! input record, optional variant sub-records contributing alternate names
//! and priorities, vernacular names, and the partial Linnaean classification
//! threaded down the hierarchy walk and accepted as a match hint.

use serde::{Deserialize, Serialize};

use crate::key::NomenclaturalCode;
use crate::rank::{RankType, MAJOR_RANKS};
use crate::status::TaxonomicType;

/// One provider's assertion about a scientific name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonConceptInstance {
    pub id: String,
    /// Stable identifier (lsid); falls back to `id` when absent upstream.
    pub taxon_id: String,
    pub provider_id: String,
    pub scientific_name: String,
    pub scientific_name_authorship: Option<String>,
    pub year: Option<String>,
    pub rank: RankType,
    pub taxonomic_status: TaxonomicType,
    pub nomenclatural_code: NomenclaturalCode,
    pub dataset_id: Option<String>,
    pub parent_id: Option<String>,
    pub accepted_id: Option<String>,
    #[serde(default)]
    pub classification: LinnaeanClassification,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
    #[serde(default)]
    pub vernacular_names: Vec<VernacularName>,
}

impl TaxonConceptInstance {
    /// True when this instance references a different accepted concept.
    pub fn is_synonym_usage(&self) -> bool {
        match self.accepted_id.as_deref() {
            Some(accepted) => accepted != self.id && accepted != self.taxon_id,
            None => false,
        }
    }

    /// True when this instance roots the accepted hierarchy.
    pub fn is_root(&self) -> bool {
        self.taxonomic_status.is_accepted() && self.parent_id.is_none()
    }
}

/// A per-provider variant of a name, contributing an alternate name string
/// and an optional priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantRecord {
    pub scientific_name: String,
    pub scientific_name_authorship: Option<String>,
    pub priority: Option<i32>,
}

/// A common-use name attached to a concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VernacularName {
    pub name: String,
    pub language: Option<String>,
    pub locality: Option<String>,
}

/// Partial kingdom-to-species classification, names plus lsids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinnaeanClassification {
    pub kingdom: Option<String>,
    pub kingdom_id: Option<String>,
    pub phylum: Option<String>,
    pub phylum_id: Option<String>,
    pub class: Option<String>,
    pub class_id: Option<String>,
    pub order: Option<String>,
    pub order_id: Option<String>,
    pub family: Option<String>,
    pub family_id: Option<String>,
    pub genus: Option<String>,
    pub genus_id: Option<String>,
    pub species: Option<String>,
    pub species_id: Option<String>,
}

impl LinnaeanClassification {
    /// Name recorded at a major rank, if any.
    pub fn get(&self, rank: RankType) -> Option<&str> {
        match rank {
            RankType::Kingdom => self.kingdom.as_deref(),
            RankType::Phylum => self.phylum.as_deref(),
            RankType::Class => self.class.as_deref(),
            RankType::Order => self.order.as_deref(),
            RankType::Family => self.family.as_deref(),
            RankType::Genus => self.genus.as_deref(),
            RankType::Species => self.species.as_deref(),
            _ => None,
        }
    }

    /// Record a name and id at a major rank; other ranks are ignored.
    pub fn set(&mut self, rank: RankType, name: &str, id: &str) {
        let slot = match rank {
            RankType::Kingdom => (&mut self.kingdom, &mut self.kingdom_id),
            RankType::Phylum => (&mut self.phylum, &mut self.phylum_id),
            RankType::Class => (&mut self.class, &mut self.class_id),
            RankType::Order => (&mut self.order, &mut self.order_id),
            RankType::Family => (&mut self.family, &mut self.family_id),
            RankType::Genus => (&mut self.genus, &mut self.genus_id),
            RankType::Species => (&mut self.species, &mut self.species_id),
            _ => return,
        };
        *slot.0 = Some(name.to_string());
        *slot.1 = Some(id.to_string());
    }

    /// The lowest major rank that has a name recorded.
    pub fn lowest_rank(&self) -> Option<RankType> {
        MAJOR_RANKS
            .iter()
            .rev()
            .copied()
            .find(|r| self.get(*r).is_some())
    }

    /// True when no field is recorded.
    pub fn is_empty(&self) -> bool {
        MAJOR_RANKS.iter().all(|r| self.get(*r).is_none())
    }
}
