//! Taxonomic and synonym status vocabularies
//!
//! Closed enumerations describing what a provider asserts about a name.
//! Each status carries flags gating hierarchy participation: only accepted
//! concepts receive nested-set intervals, only synonyms point at accepted
//! concepts, placeholders are carried but flagged.

use serde::{Deserialize, Serialize};

/// The taxonomic status of a concept instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaxonomicType {
    Accepted,
    Synonym,
    HomotypicSynonym,
    HeterotypicSynonym,
    ProParteSynonym,
    Misapplied,
    Excluded,
    IncertaeSedis,
    SpeciesInquirenda,
    Unplaced,
    Inferred,
}

impl TaxonomicType {
    /// The vocabulary term as it appears in source data.
    pub fn term(self) -> &'static str {
        match self {
            TaxonomicType::Accepted => "accepted",
            TaxonomicType::Synonym => "synonym",
            TaxonomicType::HomotypicSynonym => "homotypicSynonym",
            TaxonomicType::HeterotypicSynonym => "heterotypicSynonym",
            TaxonomicType::ProParteSynonym => "proParteSynonym",
            TaxonomicType::Misapplied => "misapplied",
            TaxonomicType::Excluded => "excluded",
            TaxonomicType::IncertaeSedis => "incertaeSedis",
            TaxonomicType::SpeciesInquirenda => "speciesInquirenda",
            TaxonomicType::Unplaced => "unplaced",
            TaxonomicType::Inferred => "inferred",
        }
    }

    /// Primary statuses are first-class assertions rather than annotations.
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            TaxonomicType::Accepted
                | TaxonomicType::Synonym
                | TaxonomicType::HomotypicSynonym
                | TaxonomicType::HeterotypicSynonym
        )
    }

    /// Accepted concepts participate in the hierarchy and get intervals.
    pub fn is_accepted(self) -> bool {
        matches!(
            self,
            TaxonomicType::Accepted
                | TaxonomicType::IncertaeSedis
                | TaxonomicType::SpeciesInquirenda
                | TaxonomicType::Unplaced
                | TaxonomicType::Inferred
        )
    }

    /// Synonyms reference an accepted concept and never get an interval.
    pub fn is_synonym(self) -> bool {
        matches!(
            self,
            TaxonomicType::Synonym
                | TaxonomicType::HomotypicSynonym
                | TaxonomicType::HeterotypicSynonym
                | TaxonomicType::ProParteSynonym
                | TaxonomicType::Misapplied
        )
    }

    /// Placeholders have no proper place in the taxonomy but are carried.
    pub fn is_placeholder(self) -> bool {
        matches!(
            self,
            TaxonomicType::IncertaeSedis
                | TaxonomicType::SpeciesInquirenda
                | TaxonomicType::Unplaced
        )
    }

    /// Parse a raw status term, case-insensitively, tolerating separators.
    pub fn from_term(term: &str) -> Option<TaxonomicType> {
        let folded: String = term
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .flat_map(|c| c.to_lowercase())
            .collect();
        match folded.as_str() {
            "accepted" | "valid" => Some(TaxonomicType::Accepted),
            "synonym" => Some(TaxonomicType::Synonym),
            "homotypicsynonym" | "objectivesynonym" => Some(TaxonomicType::HomotypicSynonym),
            "heterotypicsynonym" | "subjectivesynonym" => Some(TaxonomicType::HeterotypicSynonym),
            "propartesynonym" => Some(TaxonomicType::ProParteSynonym),
            "misapplied" => Some(TaxonomicType::Misapplied),
            "excluded" => Some(TaxonomicType::Excluded),
            "incertaesedis" => Some(TaxonomicType::IncertaeSedis),
            "speciesinquirenda" => Some(TaxonomicType::SpeciesInquirenda),
            "unplaced" => Some(TaxonomicType::Unplaced),
            "inferred" | "inferredaccepted" => Some(TaxonomicType::Inferred),
            _ => None,
        }
    }

    /// The synonym sub-kind written to synonym documents.
    pub fn synonym_type(self) -> Option<SynonymType> {
        match self {
            TaxonomicType::Synonym => Some(SynonymType::Synonym),
            TaxonomicType::HomotypicSynonym => Some(SynonymType::Homotypic),
            TaxonomicType::HeterotypicSynonym => Some(SynonymType::Heterotypic),
            TaxonomicType::ProParteSynonym => Some(SynonymType::ProParte),
            TaxonomicType::Misapplied => Some(SynonymType::Misapplied),
            _ => None,
        }
    }
}

/// Sub-kind label for synonym documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SynonymType {
    Synonym,
    Homotypic,
    Heterotypic,
    ProParte,
    Misapplied,
    Excludes,
}

impl SynonymType {
    pub fn label(self) -> &'static str {
        match self {
            SynonymType::Synonym => "synonym",
            SynonymType::Homotypic => "homotypic",
            SynonymType::Heterotypic => "heterotypic",
            SynonymType::ProParte => "proParte",
            SynonymType::Misapplied => "misapplied",
            SynonymType::Excludes => "excludes",
        }
    }
}
