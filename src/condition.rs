//! Condition DSL for provider rules
//!
//! A small boolean-predicate language over taxon instances and vernacular
//! names, used by the key- and score-adjustment pipelines. Conditions form
//! a closed tagged union (`type` discriminant in JSON): field match,
//! vernacular match, conjunction, disjunction.
//!
//! All derived comparison values (folded strings, phonetic forms, compiled
//! regexes) are built eagerly during deserialization, so a bad pattern is a
//! rule-load error and evaluation never mutates the condition.

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::instance::{TaxonConceptInstance, VernacularName};
use crate::key::NomenclaturalCode;
use crate::provider::NameProvider;
use crate::rank::RankType;
use crate::status::TaxonomicType;
use crate::utils::normalization::{normalise_spaces, CleanedName};
use crate::utils::soundex::soundex;

/// How a configured string value is compared against an instance field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NameMatchType {
    /// Trimmed, byte-for-byte.
    #[default]
    Exact,
    /// Case folded, whitespace collapsed.
    Insensitive,
    /// Phonetic/ASCII fold for names, author-equivalence for authorship.
    Normalised,
    /// Compiled pattern, case-insensitive for name fields.
    Regex,
}

/// A boolean predicate over a taxon instance or vernacular name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TaxonCondition {
    Match(MatchTaxonCondition),
    Vernacular(MatchVernacularCondition),
    All { conditions: Vec<TaxonCondition> },
    Any { conditions: Vec<TaxonCondition> },
}

impl TaxonCondition {
    /// Evaluate against a taxon instance. A vernacular condition matches an
    /// instance when any of the instance's vernacular names matches.
    pub fn matches(&self, instance: &TaxonConceptInstance, provider: &NameProvider) -> bool {
        match self {
            TaxonCondition::Match(m) => m.matches(instance, provider),
            TaxonCondition::Vernacular(v) => instance
                .vernacular_names
                .iter()
                .any(|name| v.matches(name, provider)),
            TaxonCondition::All { conditions } => {
                conditions.iter().all(|c| c.matches(instance, provider))
            }
            TaxonCondition::Any { conditions } => {
                conditions.iter().any(|c| c.matches(instance, provider))
            }
        }
    }

    /// Evaluate against a single vernacular name. Field-match conditions
    /// never match a vernacular name.
    pub fn matches_vernacular(&self, name: &VernacularName, provider: &NameProvider) -> bool {
        match self {
            TaxonCondition::Match(_) => false,
            TaxonCondition::Vernacular(v) => v.matches(name, provider),
            TaxonCondition::All { conditions } => conditions
                .iter()
                .all(|c| c.matches_vernacular(name, provider)),
            TaxonCondition::Any { conditions } => conditions
                .iter()
                .any(|c| c.matches_vernacular(name, provider)),
        }
    }

    /// Deterministic human-readable rendering of the condition tree.
    pub fn explain(&self) -> String {
        match self {
            TaxonCondition::Match(m) => m.explain(),
            TaxonCondition::Vernacular(v) => v.explain(),
            TaxonCondition::All { conditions } => conditions
                .iter()
                .map(|c| c.explain())
                .collect::<Vec<_>>()
                .join(" AND "),
            TaxonCondition::Any { conditions } => conditions
                .iter()
                .map(|c| c.explain())
                .collect::<Vec<_>>()
                .join(" OR "),
        }
    }

    /// Collect every configured locality, for load-time gazetteer checks.
    pub fn localities<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TaxonCondition::Match(_) => {}
            TaxonCondition::Vernacular(v) => {
                if let Some(l) = v.raw.locality.as_deref() {
                    out.push(l);
                }
            }
            TaxonCondition::All { conditions } | TaxonCondition::Any { conditions } => {
                for c in conditions {
                    c.localities(out);
                }
            }
        }
    }
}

/// Raw (serialized) form of a field-match condition. Absent fields are
/// wildcards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMatchCondition {
    pub scientific_name: Option<String>,
    pub scientific_name_authorship: Option<String>,
    pub rank: Option<RankType>,
    pub taxonomic_status: Option<TaxonomicType>,
    pub nomenclatural_code: Option<NomenclaturalCode>,
    pub year: Option<String>,
    pub dataset_id: Option<String>,
    pub match_type: NameMatchType,
}

/// Field-match condition with comparison values compiled at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMatchCondition", into = "RawMatchCondition")]
pub struct MatchTaxonCondition {
    raw: RawMatchCondition,
    name: Option<StringMatcher>,
    // Normalised authorship goes through the author comparator instead
    authorship: Option<StringMatcher>,
}

impl MatchTaxonCondition {
    pub fn new(raw: RawMatchCondition) -> Result<Self> {
        let name = raw
            .scientific_name
            .as_deref()
            .map(|v| StringMatcher::compile(v, raw.match_type))
            .transpose()
            .with_context(|| "compiling scientificName condition".to_string())?;
        let authorship = match (raw.scientific_name_authorship.as_deref(), raw.match_type) {
            (Some(_), NameMatchType::Normalised) => None,
            (Some(v), mode) => Some(
                StringMatcher::compile(v, mode)
                    .with_context(|| "compiling scientificNameAuthorship condition".to_string())?,
            ),
            (None, _) => None,
        };
        Ok(MatchTaxonCondition {
            raw,
            name,
            authorship,
        })
    }

    pub fn matches(&self, instance: &TaxonConceptInstance, provider: &NameProvider) -> bool {
        if let Some(matcher) = &self.name {
            if !matcher.matches(&instance.scientific_name) {
                return false;
            }
        }
        if let Some(expected) = self.raw.scientific_name_authorship.as_deref() {
            let actual = instance.scientific_name_authorship.as_deref();
            let ok = match (&self.authorship, actual) {
                (_, None) => false,
                (Some(matcher), Some(actual)) => matcher.matches(actual),
                (None, Some(actual)) => provider.author_comparator().same(expected, actual),
            };
            if !ok {
                return false;
            }
        }
        if let Some(rank) = self.raw.rank {
            if instance.rank != rank {
                return false;
            }
        }
        if let Some(status) = self.raw.taxonomic_status {
            if instance.taxonomic_status != status {
                return false;
            }
        }
        if let Some(code) = self.raw.nomenclatural_code {
            if instance.nomenclatural_code != code {
                return false;
            }
        }
        if let Some(year) = self.raw.year.as_deref() {
            if instance.year.as_deref().map(str::trim) != Some(year.trim()) {
                return false;
            }
        }
        if let Some(dataset) = self.raw.dataset_id.as_deref() {
            if instance.dataset_id.as_deref() != Some(dataset) {
                return false;
            }
        }
        true
    }

    pub fn explain(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = &self.raw.scientific_name {
            parts.push(format!("scientificName:{v}"));
        }
        if let Some(v) = &self.raw.scientific_name_authorship {
            parts.push(format!("scientificNameAuthorship:{v}"));
        }
        if let Some(v) = self.raw.rank {
            parts.push(format!("taxonRank:{}", v.label()));
        }
        if let Some(v) = self.raw.taxonomic_status {
            parts.push(format!("taxonomicStatus:{}", v.term()));
        }
        if let Some(v) = self.raw.nomenclatural_code {
            parts.push(format!("nomenclaturalCode:{v:?}"));
        }
        if let Some(v) = &self.raw.year {
            parts.push(format!("year:{v}"));
        }
        if let Some(v) = &self.raw.dataset_id {
            parts.push(format!("datasetID:{v}"));
        }
        parts.join(" ")
    }
}

impl TryFrom<RawMatchCondition> for MatchTaxonCondition {
    type Error = anyhow::Error;

    fn try_from(raw: RawMatchCondition) -> Result<Self> {
        MatchTaxonCondition::new(raw)
    }
}

impl From<MatchTaxonCondition> for RawMatchCondition {
    fn from(value: MatchTaxonCondition) -> Self {
        value.raw
    }
}

/// Raw (serialized) form of a vernacular-name condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawVernacularCondition {
    pub vernacular_name: Option<String>,
    pub language: Option<String>,
    pub locality: Option<String>,
    pub match_type: NameMatchType,
}

/// Vernacular-name condition. The configured locality must resolve through
/// the provider gazetteer; `NameProvider::validate` fails the rule load
/// otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawVernacularCondition", into = "RawVernacularCondition")]
pub struct MatchVernacularCondition {
    raw: RawVernacularCondition,
    name: Option<StringMatcher>,
}

impl MatchVernacularCondition {
    pub fn new(raw: RawVernacularCondition) -> Result<Self> {
        let name = raw
            .vernacular_name
            .as_deref()
            .map(|v| StringMatcher::compile(v, raw.match_type))
            .transpose()
            .with_context(|| "compiling vernacularName condition".to_string())?;
        Ok(MatchVernacularCondition { raw, name })
    }

    pub fn matches(&self, candidate: &VernacularName, provider: &NameProvider) -> bool {
        if let Some(matcher) = &self.name {
            if !matcher.matches(&candidate.name) {
                return false;
            }
        }
        if let Some(language) = self.raw.language.as_deref() {
            let same = candidate
                .language
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(language));
            if !same {
                return false;
            }
        }
        if let Some(locality) = self.raw.locality.as_deref() {
            let contained = candidate
                .locality
                .as_deref()
                .is_some_and(|l| provider.locality_within(l, locality));
            if !contained {
                return false;
            }
        }
        true
    }

    pub fn explain(&self) -> String {
        let mut parts = Vec::new();
        if let Some(v) = &self.raw.vernacular_name {
            parts.push(format!("vernacularName:{v}"));
        }
        if let Some(v) = &self.raw.language {
            parts.push(format!("language:{v}"));
        }
        if let Some(v) = &self.raw.locality {
            parts.push(format!("locality:{v}"));
        }
        parts.join(" ")
    }
}

impl TryFrom<RawVernacularCondition> for MatchVernacularCondition {
    type Error = anyhow::Error;

    fn try_from(raw: RawVernacularCondition) -> Result<Self> {
        MatchVernacularCondition::new(raw)
    }
}

impl From<MatchVernacularCondition> for RawVernacularCondition {
    fn from(value: MatchVernacularCondition) -> Self {
        value.raw
    }
}

/// A configured comparison value in its compiled form.
#[derive(Debug, Clone)]
enum StringMatcher {
    Exact(String),
    Insensitive(String),
    Normalised(String),
    Pattern(Regex),
}

impl StringMatcher {
    fn compile(value: &str, mode: NameMatchType) -> Result<Self> {
        Ok(match mode {
            NameMatchType::Exact => StringMatcher::Exact(value.trim().to_string()),
            NameMatchType::Insensitive => StringMatcher::Insensitive(fold_insensitive(value)),
            NameMatchType::Normalised => StringMatcher::Normalised(fold_normalised(value)),
            NameMatchType::Regex => StringMatcher::Pattern(
                Regex::new(&format!("(?i)^(?:{value})$"))
                    .with_context(|| format!("compiling pattern {value}"))?,
            ),
        })
    }

    fn matches(&self, candidate: &str) -> bool {
        match self {
            StringMatcher::Exact(v) => candidate.trim() == v,
            StringMatcher::Insensitive(v) => fold_insensitive(candidate) == *v,
            StringMatcher::Normalised(v) => fold_normalised(candidate) == *v,
            StringMatcher::Pattern(re) => re.is_match(candidate.trim()),
        }
    }
}

fn fold_insensitive(s: &str) -> String {
    normalise_spaces(s).to_uppercase()
}

fn fold_normalised(s: &str) -> String {
    soundex(CleanedName::new(s).basic())
}
