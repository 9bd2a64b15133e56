//! Data providers and their rule configuration
//!
//! A `NameProvider` bundles everything configured per source dataset: the
//! default nomenclatural code, the key- and score-adjustment pipelines, and
//! a small gazetteer used by vernacular locality conditions.
//!
//! Rule files are JSON; loading compiles every condition eagerly and then
//! validates that each configured locality resolves against the gazetteer.
//! An unresolvable locality fails the load — it means a broken rule file,
//! not bad input data.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::adjuster::{KeyAdjuster, ScoreAdjuster};
use crate::key::NomenclaturalCode;
use crate::utils::authorship::AuthorComparator;

/// A named place in the provider gazetteer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A source dataset with its rule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameProvider {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub default_nomenclatural_code: Option<NomenclaturalCode>,
    #[serde(default)]
    pub key_adjuster: KeyAdjuster,
    #[serde(default)]
    pub score_adjuster: ScoreAdjuster,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(skip)]
    author_comparator: AuthorComparator,
}

impl NameProvider {
    /// A bare provider with no rules, for sources that need none.
    pub fn simple(id: &str) -> Self {
        NameProvider {
            id: id.to_string(),
            name: None,
            default_nomenclatural_code: None,
            key_adjuster: KeyAdjuster::default(),
            score_adjuster: ScoreAdjuster::default(),
            locations: Vec::new(),
            author_comparator: AuthorComparator::new(),
        }
    }

    /// Load a provider rule file and validate it.
    pub fn from_json(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading provider rules from {}", path.display()))?;
        let provider: NameProvider = serde_json::from_str(&text)
            .with_context(|| format!("parsing provider rules from {}", path.display()))?;
        provider.validate()?;
        Ok(provider)
    }

    /// Check rule-file integrity: every locality named by a condition must
    /// resolve through the gazetteer.
    pub fn validate(&self) -> Result<()> {
        let mut localities = Vec::new();
        for adjustment in &self.key_adjuster.adjustments {
            adjustment.condition.localities(&mut localities);
        }
        for condition in &self.score_adjuster.forbidden {
            condition.localities(&mut localities);
        }
        for adjustment in &self.score_adjuster.adjustments {
            adjustment.condition.localities(&mut localities);
        }
        for locality in localities {
            if self.find_location(locality).is_none() {
                bail!(
                    "cannot find location for locality {} in provider {}",
                    locality,
                    self.id
                );
            }
        }
        Ok(())
    }

    pub fn default_code(&self) -> NomenclaturalCode {
        self.default_nomenclatural_code
            .unwrap_or(NomenclaturalCode::Any)
    }

    pub fn author_comparator(&self) -> &AuthorComparator {
        &self.author_comparator
    }

    /// Resolve a place name or alias, case-insensitively.
    pub fn find_location(&self, name: &str) -> Option<&Location> {
        let name = name.trim();
        self.locations.iter().find(|l| {
            l.name.eq_ignore_ascii_case(name)
                || l.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
    }

    /// True when `candidate` names the same place as `container` or a place
    /// inside it, following gazetteer parent links.
    pub fn locality_within(&self, candidate: &str, container: &str) -> bool {
        let Some(container) = self.find_location(container) else {
            return false;
        };
        let Some(mut current) = self.find_location(candidate) else {
            return false;
        };
        // Parent chains are short; the guard only protects against a
        // miswired gazetteer
        for _ in 0..64 {
            if current.id == container.id {
                return true;
            }
            match current
                .parent_id
                .as_deref()
                .and_then(|pid| self.locations.iter().find(|l| l.id == pid))
            {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gazetteer() -> Vec<Location> {
        vec![
            Location {
                id: "AU".into(),
                name: "Australia".into(),
                parent_id: None,
                aliases: vec!["AUS".into()],
            },
            Location {
                id: "NSW".into(),
                name: "New South Wales".into(),
                parent_id: Some("AU".into()),
                aliases: Vec::new(),
            },
            Location {
                id: "NZ".into(),
                name: "New Zealand".into(),
                parent_id: None,
                aliases: Vec::new(),
            },
        ]
    }

    #[test]
    fn test_find_location() {
        let mut p = NameProvider::simple("p");
        p.locations = gazetteer();
        assert!(p.find_location("australia").is_some());
        assert!(p.find_location("AUS").is_some());
        assert!(p.find_location("Narnia").is_none());
    }

    #[test]
    fn test_locality_within() {
        let mut p = NameProvider::simple("p");
        p.locations = gazetteer();
        assert!(p.locality_within("New South Wales", "Australia"));
        assert!(p.locality_within("Australia", "Australia"));
        assert!(!p.locality_within("New Zealand", "Australia"));
        assert!(!p.locality_within("Narnia", "Australia"));
    }

    #[test]
    fn test_unresolvable_locality_fails_validation() {
        let json = r#"{
            "id": "p",
            "scoreAdjuster": {
                "forbidden": [
                    {"type":"vernacular","vernacularName":"Weed","locality":"Narnia"}
                ]
            },
            "locations": [{"id":"AU","name":"Australia"}]
        }"#;
        let provider: NameProvider = serde_json::from_str(json).unwrap();
        let err = provider.validate().unwrap_err();
        assert!(err.to_string().contains("Narnia"));
    }

    #[test]
    fn test_valid_locality_passes_validation() {
        let json = r#"{
            "id": "p",
            "scoreAdjuster": {
                "forbidden": [
                    {"type":"vernacular","vernacularName":"Weed","locality":"Australia"}
                ]
            },
            "locations": [{"id":"AU","name":"Australia"}]
        }"#;
        let provider: NameProvider = serde_json::from_str(json).unwrap();
        assert!(provider.validate().is_ok());
    }
}
