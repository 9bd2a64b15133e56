//! String utilities shared across the index build and query paths
//!
//! - `normalization`: Unicode cleanup of scientific names and authorship
//! - `soundex`: phonetic keys for fuzzy matching
//! - `authorship`: lenient author citation comparison

pub mod authorship;
pub mod normalization;
pub mod soundex;

pub use authorship::AuthorComparator;
pub use normalization::{normalise_spaces, CleanedName};
pub use soundex::{soundex, treat_word, EpithetKind};
