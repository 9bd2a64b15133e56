//! Taxonomic ranks
//!
//! A fixed, totally ordered vocabulary of ranks, each with the numeric id
//! used in persisted documents. Major ranks (id divisible by 1000) carry
//! full indexing weight; "loose" ranks (id -1) sit outside the strict
//! ordering and are excluded from classification chains.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// The rank of a taxon concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RankType {
    Domain,
    Kingdom,
    Subkingdom,
    Phylum,
    Subphylum,
    Superclass,
    Class,
    Subclass,
    Superorder,
    Order,
    Suborder,
    Infraorder,
    Superfamily,
    Family,
    Subfamily,
    Tribe,
    Subtribe,
    GenusGroup,
    Genus,
    Subgenus,
    SpeciesGroup,
    Species,
    Subspecies,
    InfraspecificName,
    Variety,
    Subvariety,
    Form,
    Subform,
    Cultivar,
    Hybrid,
    SupragenericName,
    CultivarGroup,
    Informal,
    InfrasubspeciesName,
    Unranked,
}

/// The major Linnaean ranks, highest first; the classification chain
/// carried down the hierarchy build uses exactly these.
pub const MAJOR_RANKS: [RankType; 7] = [
    RankType::Kingdom,
    RankType::Phylum,
    RankType::Class,
    RankType::Order,
    RankType::Family,
    RankType::Genus,
    RankType::Species,
];

impl RankType {
    /// Numeric rank id. Higher ids are lower in the hierarchy; loose ranks
    /// report -1 and unranked 0.
    pub fn id(self) -> i32 {
        match self {
            RankType::Domain => 800,
            RankType::Kingdom => 1000,
            RankType::Subkingdom => 1200,
            RankType::Phylum => 2000,
            RankType::Subphylum => 2200,
            RankType::Superclass => 2800,
            RankType::Class => 3000,
            RankType::Subclass => 3200,
            RankType::Superorder => 3800,
            RankType::Order => 4000,
            RankType::Suborder => 4200,
            RankType::Infraorder => 4350,
            RankType::Superfamily => 4500,
            RankType::Family => 5000,
            RankType::Subfamily => 5500,
            RankType::Tribe => 5600,
            RankType::Subtribe => 5700,
            RankType::GenusGroup => 5950,
            RankType::Genus => 6000,
            RankType::Subgenus => 6500,
            RankType::SpeciesGroup => 6950,
            RankType::Species => 7000,
            RankType::Subspecies => 8000,
            RankType::InfraspecificName => 8005,
            RankType::Variety => 8010,
            RankType::Subvariety => 8015,
            RankType::Form => 8020,
            RankType::Subform => 8025,
            RankType::Cultivar => 8050,
            RankType::Hybrid => 8150,
            RankType::SupragenericName => 8200,
            RankType::CultivarGroup => -1,
            RankType::Informal => -1,
            RankType::InfrasubspeciesName => -1,
            RankType::Unranked => 0,
        }
    }

    /// Canonical lowercase label, used in persisted documents and rule files.
    pub fn label(self) -> &'static str {
        match self {
            RankType::Domain => "domain",
            RankType::Kingdom => "kingdom",
            RankType::Subkingdom => "subkingdom",
            RankType::Phylum => "phylum",
            RankType::Subphylum => "subphylum",
            RankType::Superclass => "superclass",
            RankType::Class => "class",
            RankType::Subclass => "subclass",
            RankType::Superorder => "superorder",
            RankType::Order => "order",
            RankType::Suborder => "suborder",
            RankType::Infraorder => "infraorder",
            RankType::Superfamily => "superfamily",
            RankType::Family => "family",
            RankType::Subfamily => "subfamily",
            RankType::Tribe => "tribe",
            RankType::Subtribe => "subtribe",
            RankType::GenusGroup => "genus group",
            RankType::Genus => "genus",
            RankType::Subgenus => "subgenus",
            RankType::SpeciesGroup => "species group",
            RankType::Species => "species",
            RankType::Subspecies => "subspecies",
            RankType::InfraspecificName => "infraspecificname",
            RankType::Variety => "variety",
            RankType::Subvariety => "subvariety",
            RankType::Form => "form",
            RankType::Subform => "subform",
            RankType::Cultivar => "cultivar",
            RankType::Hybrid => "hybrid",
            RankType::SupragenericName => "supragenericname",
            RankType::CultivarGroup => "cultivargroup",
            RankType::Informal => "informal",
            RankType::InfrasubspeciesName => "infrasubspeciesname",
            RankType::Unranked => "unranked",
        }
    }

    /// Accepted spellings beyond the canonical label.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            RankType::Phylum => &["division botany", "division"],
            RankType::Subspecies => &["subsp", "subsp.", "ssp", "ssp.", "subtaxon"],
            RankType::Variety => &["var", "var.", "var,"],
            RankType::Subvariety => &["subvar."],
            RankType::Form => &["forma", "f."],
            RankType::Cultivar => &["cv."],
            RankType::GenusGroup => &["aggregate genera"],
            RankType::SpeciesGroup => &["aggregate species"],
            RankType::InfraspecificName => &["infraspecies"],
            _ => &[],
        }
    }

    /// Major ranks carry full indexing weight; everything between them gets
    /// a reduced priority at build time.
    pub fn is_major(self) -> bool {
        self.id() > 0 && self.id() % 1000 == 0
    }

    /// Loose ranks have no position in the strict ordering.
    pub fn is_loose(self) -> bool {
        self.id() == -1
    }

    /// Look up a rank from a raw string, accepting the alias vocabulary.
    pub fn from_name(name: &str) -> Option<RankType> {
        let map = name_lookup();
        map.get(name.trim().to_lowercase().as_str()).copied()
    }

    /// Look up a rank by numeric id. Loose ranks share id -1 and are not
    /// reachable this way.
    pub fn from_id(id: i32) -> Option<RankType> {
        if id == -1 {
            return None;
        }
        ALL.iter().copied().find(|r| r.id() == id)
    }

    /// Position of this rank in the major-rank chain, if it is major.
    pub fn major_index(self) -> Option<usize> {
        MAJOR_RANKS.iter().position(|r| *r == self)
    }

    /// The next major rank above this one (genus for species, and so on).
    pub fn higher_major(self) -> Option<RankType> {
        let id = self.id();
        if id <= RankType::Kingdom.id() {
            return None;
        }
        MAJOR_RANKS
            .iter()
            .rev()
            .copied()
            .find(|r| r.id() < id)
    }
}

const ALL: [RankType; 35] = [
    RankType::Domain,
    RankType::Kingdom,
    RankType::Subkingdom,
    RankType::Phylum,
    RankType::Subphylum,
    RankType::Superclass,
    RankType::Class,
    RankType::Subclass,
    RankType::Superorder,
    RankType::Order,
    RankType::Suborder,
    RankType::Infraorder,
    RankType::Superfamily,
    RankType::Family,
    RankType::Subfamily,
    RankType::Tribe,
    RankType::Subtribe,
    RankType::GenusGroup,
    RankType::Genus,
    RankType::Subgenus,
    RankType::SpeciesGroup,
    RankType::Species,
    RankType::Subspecies,
    RankType::InfraspecificName,
    RankType::Variety,
    RankType::Subvariety,
    RankType::Form,
    RankType::Subform,
    RankType::Cultivar,
    RankType::Hybrid,
    RankType::SupragenericName,
    RankType::CultivarGroup,
    RankType::Informal,
    RankType::InfrasubspeciesName,
    RankType::Unranked,
];

fn name_lookup() -> &'static FxHashMap<&'static str, RankType> {
    static LOOKUP: OnceLock<FxHashMap<&'static str, RankType>> = OnceLock::new();
    LOOKUP.get_or_init(|| {
        let mut map = FxHashMap::default();
        for rank in ALL {
            map.insert(rank.label(), rank);
            for alias in rank.aliases() {
                map.insert(*alias, rank);
            }
        }
        map
    })
}

// Ordering follows the numeric id; loose ranks tie-break on their label so
// the ordering stays total.
impl Ord for RankType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id()
            .cmp(&other.id())
            .then_with(|| self.label().cmp(other.label()))
    }
}

impl PartialOrd for RankType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for RankType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for RankType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RankType::from_name(&value).ok_or_else(|| format!("unknown rank: {value}"))
    }
}

impl From<RankType> for String {
    fn from(value: RankType) -> Self {
        value.label().to_string()
    }
}
