//! Key and score rule pipelines
//!
//! Ordered lists of (condition, effect) rules applied per provider per
//! instance at build time:
//! - `KeyAdjuster` overwrites name-key fields; a no-op pass hands back the
//!   borrowed key so callers can detect "unchanged" without comparing
//! - `ScoreAdjuster` forbids instances outright or folds integer deltas
//!   onto the base priority

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::condition::TaxonCondition;
use crate::instance::TaxonConceptInstance;
use crate::key::{NameKey, NameType, NomenclaturalCode};
use crate::provider::NameProvider;
use crate::rank::RankType;

/// A conditional overwrite of name-key fields. Only the fields a rule
/// specifies are touched; an empty-string authorship override clears the
/// authorship to `None` (distinct from leaving it alone).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAdjustment {
    pub condition: TaxonCondition,
    #[serde(default)]
    pub nomenclatural_code: Option<NomenclaturalCode>,
    #[serde(default)]
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub scientific_name_authorship: Option<String>,
    #[serde(default)]
    pub name_type: Option<NameType>,
    #[serde(default)]
    pub rank: Option<RankType>,
}

impl KeyAdjustment {
    fn apply<'a>(
        &self,
        key: Cow<'a, NameKey>,
        instance: &TaxonConceptInstance,
        provider: &NameProvider,
    ) -> Cow<'a, NameKey> {
        if !self.condition.matches(instance, provider) {
            return key;
        }
        let mut adjusted = key.into_owned();
        if let Some(code) = self.nomenclatural_code {
            adjusted.code = code;
        }
        if let Some(name) = &self.scientific_name {
            adjusted.scientific_name = name.clone();
        }
        if let Some(authorship) = &self.scientific_name_authorship {
            adjusted.authorship = if authorship.is_empty() {
                None
            } else {
                Some(authorship.clone())
            };
        }
        if let Some(name_type) = self.name_type {
            adjusted.name_type = name_type;
        }
        if let Some(rank) = self.rank {
            adjusted.rank = rank;
        }
        Cow::Owned(adjusted)
    }
}

/// Applies key adjustments in list order, cumulatively: each matching rule
/// sees the previous rule's output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyAdjuster {
    #[serde(default)]
    pub adjustments: Vec<KeyAdjustment>,
}

impl KeyAdjuster {
    /// Returns `Cow::Borrowed(key)` exactly when no rule matched.
    pub fn adjust<'a>(
        &self,
        key: &'a NameKey,
        instance: &TaxonConceptInstance,
        provider: &NameProvider,
    ) -> Cow<'a, NameKey> {
        let mut current = Cow::Borrowed(key);
        for adjustment in &self.adjustments {
            current = adjustment.apply(current, instance, provider);
        }
        current
    }
}

/// A conditional integer delta on the priority score.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAdjustment {
    pub condition: TaxonCondition,
    pub adjustment: i32,
}

impl ScoreAdjustment {
    fn apply(&self, base: i32, instance: &TaxonConceptInstance, provider: &NameProvider) -> i32 {
        if self.condition.matches(instance, provider) {
            base + self.adjustment
        } else {
            base
        }
    }
}

/// Forbidden-instance conditions plus cumulative score deltas.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreAdjuster {
    #[serde(default)]
    pub forbidden: Vec<TaxonCondition>,
    #[serde(default)]
    pub adjustments: Vec<ScoreAdjustment>,
}

impl ScoreAdjuster {
    /// The explanation of the first matching forbidden condition, if any.
    /// Forbidden instances must be excluded from the index entirely.
    pub fn forbid(
        &self,
        instance: &TaxonConceptInstance,
        provider: &NameProvider,
    ) -> Option<String> {
        self.forbidden
            .iter()
            .find(|c| c.matches(instance, provider))
            .map(|c| c.explain())
    }

    /// Fold every matching adjustment onto the base score, in list order.
    pub fn score(
        &self,
        base: i32,
        instance: &TaxonConceptInstance,
        provider: &NameProvider,
    ) -> i32 {
        self.adjustments
            .iter()
            .fold(base, |score, a| a.apply(score, instance, provider))
    }
}
