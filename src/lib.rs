//! Taxonomic name index
//!
//! Merges taxon concepts from multiple prioritised providers into a single
//! searchable index and resolves names against it.
//!
//! - `utils/`: name normalisation, phonetic keys, authorship comparison
//! - `rank`, `status`: controlled vocabularies
//! - `key`: canonical name keys derived by `NameAnalyser`
//! - `instance`, `provider`, `condition`, `adjuster`: provider records and
//!   their per-provider adjustment rules
//! - `store`: in-process term-indexed document store
//! - `builder`: merge, score and left/right interval numbering
//! - `searcher`, `homonym`, `error`: the query cascade and its typed
//!   failures

pub mod adjuster;
pub mod builder;
pub mod condition;
pub mod error;
pub mod homonym;
pub mod instance;
pub mod key;
pub mod provider;
pub mod rank;
pub mod searcher;
pub mod status;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use adjuster::{KeyAdjuster, ScoreAdjuster};
pub use builder::{HierarchyBuilder, IndexerConfig, Usage};
pub use condition::{NameMatchType, TaxonCondition};
pub use error::MatchError;
pub use homonym::{HomonymResolution, HomonymResolver};
pub use instance::{LinnaeanClassification, TaxonConceptInstance};
pub use key::{NameAnalyser, NameKey, NameType, NomenclaturalCode};
pub use provider::NameProvider;
pub use rank::RankType;
pub use searcher::{MatchType, NameSearcher, NameSearchResult};
pub use status::TaxonomicType;
pub use store::{BoolQuery, Document, MemoryStore};
