//! Hierarchy builder
//!
//! Batch construction of the name-matching index:
//! 1. Load pass: analyse each instance, run the provider rule pipelines,
//!    and write loading documents
//! 2. Accepted pass: walk the parent/child structure depth-first with an
//!    explicit work stack, assigning nested-set left/right intervals and
//!    threading the classification chain down
//! 3. Synonym pass: write synonym documents pointing at their accepted
//!    concepts, copying higher classification down
//!
//! Problems in the input are recovered locally and logged; the build never
//! fails on bad rows. An optional usage map from a prior build keeps
//! interval numbers stable across rebuilds.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::instance::{LinnaeanClassification, TaxonConceptInstance};
use crate::key::NomenclaturalCode;
use crate::provider::NameProvider;
use crate::rank::RankType;
use crate::status::TaxonomicType;
use crate::store::{fields, Document, MemoryStore};
use crate::key::NameAnalyser;
use crate::utils::soundex::soundex;

/// Initial priority before dataset and rank weighting.
pub const DEFAULT_PRIORITY: i32 = 1000;

const PAGE_SIZE: usize = 1000;
const DEPTH_WARN: usize = 900;
const DEPTH_LIMIT: usize = 1000;

/// A nested-set record: build output, and the preferred-ordering hint for
/// the next build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub taxon_id: String,
    pub scientific_name: String,
    pub taxonomic_status: String,
    pub left: i32,
    pub right: i32,
    pub accepted_id: Option<String>,
}

/// Build-wide configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerConfig {
    /// Priority multiplier per dataset id; absent datasets get 1.0.
    #[serde(default)]
    pub dataset_priorities: FxHashMap<String, f64>,
}

impl IndexerConfig {
    /// Base priority for a record: dataset multiplier, with non-major ranks
    /// cut to a fifth.
    pub fn score(&self, dataset_id: Option<&str>, rank: RankType) -> i32 {
        let mut boost = dataset_id
            .and_then(|d| self.dataset_priorities.get(d))
            .copied()
            .unwrap_or(1.0);
        if !rank.is_major() {
            boost *= 0.2;
        }
        (boost * DEFAULT_PRIORITY as f64).round() as i32
    }
}

/// One frame of the interval walk.
struct Frame {
    doc: Document,
    lsid: String,
    depth: usize,
    left: i32,
    limit_right: i32,
    /// Right value of the last completed child; `left` until one finishes.
    running: i32,
    children: Vec<Document>,
    next_child: usize,
    classification: LinnaeanClassification,
}

/// Builds the searchable index from a batch of taxon concept instances.
pub struct HierarchyBuilder {
    config: IndexerConfig,
    analyser: NameAnalyser,
    loading: MemoryStore,
    output: MemoryStore,
    id_map: FxHashMap<String, Usage>,
    preferred: FxHashMap<String, Usage>,
    index_changed: bool,
    loaded: usize,
    skipped: usize,
    forbidden: usize,
}

impl HierarchyBuilder {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        Ok(HierarchyBuilder {
            config,
            analyser: NameAnalyser::new()?,
            loading: MemoryStore::new(),
            output: MemoryStore::new(),
            id_map: FxHashMap::default(),
            preferred: FxHashMap::default(),
            index_changed: false,
            loaded: 0,
            skipped: 0,
            forbidden: 0,
        })
    }

    /// Supply a prior build's usage map to keep intervals stable.
    pub fn set_preferred(&mut self, preferred: FxHashMap<String, Usage>) {
        self.preferred = preferred;
    }

    /// Load a provider's instances into the loading store.
    pub fn load(&mut self, provider: &NameProvider, instances: &[TaxonConceptInstance]) {
        for instance in instances {
            self.load_instance(provider, instance);
            if self.loaded % 100_000 == 0 && self.loaded > 0 {
                info!(loaded = self.loaded, "loading instances");
            }
        }
    }

    fn load_instance(&mut self, provider: &NameProvider, instance: &TaxonConceptInstance) {
        if instance.scientific_name.trim().is_empty() || instance.id.trim().is_empty() {
            self.skipped += 1;
            warn!(
                id = %instance.id,
                skipped = self.skipped,
                "skipping malformed record"
            );
            return;
        }
        let code = match instance.nomenclatural_code {
            NomenclaturalCode::Any => provider.default_code(),
            code => code,
        };
        let key = self.analyser.analyse(
            code,
            &instance.scientific_name,
            instance.scientific_name_authorship.as_deref(),
            Some(instance.rank),
        );
        let key = provider.key_adjuster.adjust(&key, instance, provider);

        if let Some(reason) = provider.score_adjuster.forbid(instance, provider) {
            self.forbidden += 1;
            debug!(id = %instance.id, %reason, "forbidden instance dropped");
            return;
        }

        let base = self.config.score(instance.dataset_id.as_deref(), key.rank);
        let adjusted = provider.score_adjuster.score(base, instance, provider);
        let variant_priority = instance
            .variants
            .iter()
            .filter_map(|v| v.priority)
            .max();
        let priority = variant_priority.unwrap_or(adjusted);

        let mut doc = Document::new();
        doc.set(fields::ID, &instance.id);
        doc.set(fields::LSID, &instance.taxon_id);
        doc.set(fields::NAME, &key.scientific_name);
        if let Some(author) = key.authorship.as_deref() {
            doc.set(fields::AUTHOR, author);
        }
        doc.set(fields::RANK, key.rank.label());
        doc.set(fields::RANK_ID, &key.rank.id().to_string());
        doc.set(fields::STATUS, instance.taxonomic_status.term());
        doc.set(fields::NAME_TYPE, key.name_type.label());
        if let Some(dataset) = instance.dataset_id.as_deref() {
            doc.set(fields::DATASET_ID, dataset);
        }
        if let Some(parent) = instance.parent_id.as_deref() {
            doc.set(fields::PARENT_ID, parent);
        }
        if let Some(accepted) = instance.accepted_id.as_deref() {
            doc.set(fields::ACCEPTED_ID, accepted);
        }
        let synonym = instance.is_synonym_usage();
        doc.set(fields::IS_SYNONYM, if synonym { "T" } else { "F" });
        if !synonym && instance.is_root() {
            doc.set(fields::ROOT, "T");
        }
        doc.set(fields::PRIORITY, &priority.to_string());
        for variant in &instance.variants {
            let variant_key = self.analyser.analyse(
                code,
                &variant.scientific_name,
                variant.scientific_name_authorship.as_deref(),
                Some(instance.rank),
            );
            if variant_key.scientific_name != key.scientific_name {
                doc.add(fields::NAMES, &variant_key.scientific_name);
            }
        }
        self.loading.add(doc);
        self.loaded += 1;
    }

    /// Run the accepted and synonym passes and commit the output store.
    pub fn build(&mut self) -> Result<()> {
        self.loading.commit();
        info!(
            loaded = self.loaded,
            skipped = self.skipped,
            forbidden = self.forbidden,
            "loading store committed"
        );
        self.build_accepted();
        self.output.commit();
        self.build_synonyms();
        self.output.commit();
        info!(documents = self.output.len(), "index build complete");
        Ok(())
    }

    /// The committed search index. Valid after `build`.
    pub fn store(&self) -> &MemoryStore {
        &self.output
    }

    /// The id map produced by this build.
    pub fn usage_map(&self) -> &FxHashMap<String, Usage> {
        &self.id_map
    }

    pub fn into_parts(self) -> (MemoryStore, FxHashMap<String, Usage>) {
        (self.output, self.id_map)
    }

    fn collect_pages(store: &MemoryStore, field: &str, value: &str) -> Vec<Document> {
        let mut cursor = store.term_query(field, value, PAGE_SIZE);
        let mut docs = Vec::new();
        loop {
            let page = cursor.next_page();
            if page.is_empty() {
                break;
            }
            if !docs.is_empty() {
                info!(field, value, "loading next page");
            }
            docs.extend(page.into_iter().cloned());
        }
        docs
    }

    fn build_accepted(&mut self) {
        let mut roots = Self::collect_pages(&self.loading, fields::ROOT, "T");
        let preferred = &self.preferred;
        roots.sort_by(|a, b| preferred_child_order(preferred, a, b));
        info!(roots = roots.len(), "assigning intervals");

        let mut right = 0;
        let mut count = 0usize;
        for root in roots {
            let lsid = root.get(fields::LSID).unwrap_or_default().to_string();
            let mut left = right + 1;
            let mut limit_right = right + 1;
            if let Some(usage) = self.preferred.get(&lsid) {
                left = left.max(usage.left);
                limit_right = limit_right.max(usage.right);
            }
            right = self.walk(root, left, limit_right);
            count += 1;
            if count % 10_000 == 0 {
                info!(count, "processed root concepts");
            }
        }
    }

    /// Depth-first interval assignment over one root, with an explicit work
    /// stack instead of recursion. Returns the root's final right value.
    fn walk(&mut self, root: Document, left: i32, limit_right: i32) -> i32 {
        let base = LinnaeanClassification::default();
        let first = self.open_frame(root, 1, left, limit_right, &base);
        let mut stack = vec![first];
        let mut last_right = left;

        while let Some(top) = stack.last_mut() {
            if top.next_child < top.children.len() {
                let child = top.children[top.next_child].clone();
                top.next_child += 1;
                let child_lsid = child.get(fields::LSID).unwrap_or_default().to_string();
                let mut child_left = top.running + 1;
                let mut child_limit = top.limit_right;
                if let Some(usage) = self.preferred.get(&child_lsid) {
                    child_left = child_left.max(usage.left);
                    child_limit = child_limit.min(usage.right);
                }
                let depth = top.depth + 1;
                let classification = top.classification.clone();
                let frame = self.open_frame(child, depth, child_left, child_limit, &classification);
                stack.push(frame);
            } else {
                let frame = match stack.pop() {
                    Some(frame) => frame,
                    None => break,
                };
                let mut right = if frame.children.is_empty() {
                    frame.left
                } else {
                    frame.running + 1
                };
                if let Some(usage) = self.preferred.get(&frame.lsid) {
                    right = right.max(usage.right);
                }
                if !self.preferred.is_empty() && right > frame.limit_right {
                    if !self.index_changed {
                        warn!(
                            lsid = %frame.lsid,
                            left = frame.left,
                            right,
                            "overflow in left and right values"
                        );
                    }
                    self.index_changed = true;
                }
                self.write_accepted(&frame, right);
                last_right = right;
                if let Some(parent) = stack.last_mut() {
                    parent.running = right;
                }
            }
        }
        last_right
    }

    /// Prepare a frame: extend the classification with this concept and
    /// gather its non-synonym children in preferred order.
    fn open_frame(
        &mut self,
        doc: Document,
        depth: usize,
        left: i32,
        limit_right: i32,
        parent_classification: &LinnaeanClassification,
    ) -> Frame {
        let id = doc.get(fields::ID).unwrap_or_default().to_string();
        let lsid = doc.get(fields::LSID).unwrap_or_default().to_string();
        let name = doc.get(fields::NAME).unwrap_or_default().to_string();
        let rank_id = doc.get_i32(fields::RANK_ID).unwrap_or(-1);

        let mut classification = parent_classification.clone();
        if let Some(rank) = RankType::from_id(rank_id) {
            if rank.is_major() && rank != RankType::Subspecies {
                classification.set(rank, &name, &lsid);
            }
        }

        let mut children = Vec::new();
        if depth >= DEPTH_LIMIT {
            let dropped = self.loading.count(fields::PARENT_ID, &id);
            if dropped > 0 {
                warn!(
                    lsid = %lsid,
                    depth,
                    dropped,
                    "depth ceiling reached, not descending further"
                );
            }
        } else {
            if depth > DEPTH_WARN {
                warn!(lsid = %lsid, depth, "hierarchy depth approaching ceiling");
            }
            let mut found = Self::collect_pages(&self.loading, fields::PARENT_ID, &id);
            if found.is_empty() && lsid != id {
                found = Self::collect_pages(&self.loading, fields::PARENT_ID, &lsid);
            }
            for child in found {
                if child.get(fields::IS_SYNONYM) == Some("T") {
                    warn!(
                        child = child.get(fields::LSID).unwrap_or_default(),
                        parent = %lsid,
                        "synonym claims a structural parent, ignoring"
                    );
                    continue;
                }
                if child.get(fields::ID) == Some(id.as_str()) {
                    continue;
                }
                children.push(child);
            }
            let preferred = &self.preferred;
            children.sort_by(|a, b| preferred_child_order(preferred, a, b));
        }

        Frame {
            doc,
            lsid,
            depth,
            left,
            limit_right,
            running: left,
            children,
            next_child: 0,
            classification,
        }
    }

    /// Write the final document for an accepted concept and record its
    /// usage row.
    fn write_accepted(&mut self, frame: &Frame, right: i32) {
        let name = frame.doc.get(fields::NAME).unwrap_or_default().to_string();
        let mut doc = Document::new();
        for field in [
            fields::ID,
            fields::LSID,
            fields::NAME,
            fields::AUTHOR,
            fields::RANK,
            fields::RANK_ID,
            fields::STATUS,
            fields::NAME_TYPE,
            fields::DATASET_ID,
            fields::PRIORITY,
        ] {
            if let Some(value) = frame.doc.get(field) {
                doc.set(field, value);
            }
        }
        for other in frame.doc.all(fields::NAMES) {
            doc.add(fields::NAMES, other);
            doc.add(fields::SEARCHABLE_NAME, &soundex(other));
        }
        doc.add(fields::SEARCHABLE_NAME, &soundex(&name));
        doc.set(fields::LEFT, &frame.left.to_string());
        doc.set(fields::RIGHT, &right.to_string());
        write_classification(&mut doc, &frame.classification);
        self.output.add(doc);
        self.id_map.insert(
            frame.lsid.clone(),
            Usage {
                taxon_id: frame.lsid.clone(),
                scientific_name: name,
                taxonomic_status: TaxonomicType::Accepted.term().to_string(),
                left: frame.left,
                right,
                accepted_id: None,
            },
        );
    }

    /// Write synonym documents, copying higher classification down from the
    /// accepted concept. A missing accepted concept is logged and the
    /// synonym still written.
    fn build_synonyms(&mut self) {
        let synonyms = Self::collect_pages(&self.loading, fields::IS_SYNONYM, "T");
        info!(synonyms = synonyms.len(), "writing synonyms");
        for source in synonyms {
            let lsid = source.get(fields::LSID).unwrap_or_default().to_string();
            let name = source.get(fields::NAME).unwrap_or_default().to_string();
            let accepted_id = source
                .get(fields::ACCEPTED_ID)
                .unwrap_or_default()
                .to_string();
            let accepted = self.output.first(fields::LSID, &accepted_id).cloned();
            if accepted.is_none() {
                warn!(
                    synonym = %lsid,
                    accepted = %accepted_id,
                    "no accepted concept for synonym"
                );
            }

            let mut doc = Document::new();
            for field in [
                fields::ID,
                fields::LSID,
                fields::NAME,
                fields::AUTHOR,
                fields::RANK,
                fields::RANK_ID,
                fields::STATUS,
                fields::NAME_TYPE,
                fields::DATASET_ID,
                fields::PRIORITY,
                fields::IS_SYNONYM,
            ] {
                if let Some(value) = source.get(field) {
                    doc.set(field, value);
                }
            }
            for other in source.all(fields::NAMES) {
                doc.add(fields::NAMES, other);
                doc.add(fields::SEARCHABLE_NAME, &soundex(other));
            }
            doc.add(fields::SEARCHABLE_NAME, &soundex(&name));
            doc.set(fields::ACCEPTED_LSID, &accepted_id);
            let synonym_type = source
                .get(fields::STATUS)
                .and_then(TaxonomicType::from_term)
                .and_then(|s| s.synonym_type())
                .map(|s| s.label())
                .unwrap_or("synonym");
            doc.set(fields::SYNONYM_TYPE, synonym_type);

            if let Some(accepted) = accepted {
                let accepted_rank = accepted.get_i32(fields::RANK_ID).unwrap_or(-1);
                let pairs = [
                    (RankType::Kingdom, fields::KINGDOM, fields::KINGDOM_ID),
                    (RankType::Phylum, fields::PHYLUM, fields::PHYLUM_ID),
                    (RankType::Class, fields::CLASS, fields::CLASS_ID),
                    (RankType::Order, fields::ORDER, fields::ORDER_ID),
                    (RankType::Family, fields::FAMILY, fields::FAMILY_ID),
                ];
                for (rank, field, id_field) in pairs {
                    if accepted_rank > rank.id() {
                        if let Some(value) = accepted.get(field) {
                            doc.set(field, value);
                        }
                        if let Some(value) = accepted.get(id_field) {
                            doc.set(id_field, value);
                        }
                    }
                }
            }
            self.output.add(doc);
            let status = source
                .get(fields::STATUS)
                .unwrap_or(TaxonomicType::Synonym.term())
                .to_string();
            self.id_map.insert(
                lsid.clone(),
                Usage {
                    taxon_id: lsid,
                    scientific_name: name,
                    taxonomic_status: status,
                    left: 0,
                    right: 0,
                    accepted_id: Some(accepted_id),
                },
            );
        }
    }

    /// Export the id map as tab-separated text for the next build.
    pub fn write_usage_map(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path)
            .with_context(|| format!("creating usage map {}", path.display()))?;
        let mut out = BufWriter::new(file);
        let mut rows: Vec<&Usage> = self.id_map.values().collect();
        rows.sort_by_key(|u| (u.left, u.taxon_id.clone()));
        for usage in rows {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                usage.taxon_id,
                usage.scientific_name,
                usage.taxonomic_status,
                usage.left,
                usage.right,
                usage.accepted_id.as_deref().unwrap_or("")
            )
            .with_context(|| format!("writing usage map {}", path.display()))?;
        }
        Ok(())
    }

    /// Read a prior build's usage map. Malformed lines are skipped with a
    /// warning.
    pub fn load_usage_map(path: &Path) -> Result<FxHashMap<String, Usage>> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading usage map {}", path.display()))?;
        let mut map = FxHashMap::default();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let parts: Vec<&str> = line.split('\t').collect();
            let parsed = (parts.len() >= 5)
                .then(|| {
                    let left = parts[3].parse::<i32>().ok()?;
                    let right = parts[4].parse::<i32>().ok()?;
                    Some(Usage {
                        taxon_id: parts[0].to_string(),
                        scientific_name: parts[1].to_string(),
                        taxonomic_status: parts[2].to_string(),
                        left,
                        right,
                        accepted_id: parts
                            .get(5)
                            .filter(|s| !s.is_empty())
                            .map(|s| s.to_string()),
                    })
                })
                .flatten();
            match parsed {
                Some(usage) => {
                    map.insert(usage.taxon_id.clone(), usage);
                }
                None => warn!(line = number + 1, "skipping malformed usage map line"),
            }
        }
        Ok(map)
    }
}

/// Sibling ordering: prior build's left value first (absent sorts last),
/// ties in lsid order.
fn preferred_child_order(
    preferred: &FxHashMap<String, Usage>,
    a: &Document,
    b: &Document,
) -> std::cmp::Ordering {
    let lsid_a = a.get(fields::LSID).unwrap_or_default();
    let lsid_b = b.get(fields::LSID).unwrap_or_default();
    let left_a = preferred.get(lsid_a).map(|u| u.left).unwrap_or(i32::MAX);
    let left_b = preferred.get(lsid_b).map(|u| u.left).unwrap_or(i32::MAX);
    left_a.cmp(&left_b).then_with(|| lsid_a.cmp(lsid_b))
}

/// Copy the classification chain onto a document.
fn write_classification(doc: &mut Document, cl: &LinnaeanClassification) {
    let pairs = [
        (cl.kingdom.as_deref(), cl.kingdom_id.as_deref(), fields::KINGDOM, fields::KINGDOM_ID),
        (cl.phylum.as_deref(), cl.phylum_id.as_deref(), fields::PHYLUM, fields::PHYLUM_ID),
        (cl.class.as_deref(), cl.class_id.as_deref(), fields::CLASS, fields::CLASS_ID),
        (cl.order.as_deref(), cl.order_id.as_deref(), fields::ORDER, fields::ORDER_ID),
        (cl.family.as_deref(), cl.family_id.as_deref(), fields::FAMILY, fields::FAMILY_ID),
        (cl.genus.as_deref(), cl.genus_id.as_deref(), fields::GENUS, fields::GENUS_ID),
        (cl.species.as_deref(), cl.species_id.as_deref(), fields::SPECIES, fields::SPECIES_ID),
    ];
    for (name, id, field, id_field) in pairs {
        if let Some(name) = name {
            doc.set(field, name);
        }
        if let Some(id) = id {
            doc.set(id_field, id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::VariantRecord;

    fn instance(
        id: &str,
        name: &str,
        rank: RankType,
        parent: Option<&str>,
        accepted: Option<&str>,
        status: TaxonomicType,
    ) -> TaxonConceptInstance {
        TaxonConceptInstance {
            id: id.into(),
            taxon_id: format!("lsid:{id}"),
            provider_id: "p".into(),
            scientific_name: name.into(),
            scientific_name_authorship: None,
            year: None,
            rank,
            taxonomic_status: status,
            nomenclatural_code: NomenclaturalCode::Botanical,
            dataset_id: None,
            parent_id: parent.map(|p| format!("lsid:{p}")),
            accepted_id: accepted.map(|a| format!("lsid:{a}")),
            classification: LinnaeanClassification::default(),
            variants: Vec::new(),
            vernacular_names: Vec::new(),
        }
    }

    fn three_level() -> Vec<TaxonConceptInstance> {
        vec![
            instance("k", "Plantae", RankType::Kingdom, None, None, TaxonomicType::Accepted),
            instance("f", "Fabaceae", RankType::Family, Some("k"), None, TaxonomicType::Accepted),
            instance("s1", "Acacia dealbata", RankType::Species, Some("f"), None, TaxonomicType::Accepted),
            instance("s2", "Acacia mearnsii", RankType::Species, Some("f"), None, TaxonomicType::Accepted),
        ]
    }

    fn built(instances: Vec<TaxonConceptInstance>) -> HierarchyBuilder {
        let mut builder = HierarchyBuilder::new(IndexerConfig::default()).unwrap();
        builder.load(&NameProvider::simple("p"), &instances);
        builder.build().unwrap();
        builder
    }

    fn interval(builder: &HierarchyBuilder, lsid: &str) -> (i32, i32) {
        let usage = &builder.usage_map()[lsid];
        (usage.left, usage.right)
    }

    #[test]
    fn test_three_level_intervals() {
        let builder = built(three_level());
        assert_eq!(interval(&builder, "lsid:k"), (1, 6));
        assert_eq!(interval(&builder, "lsid:f"), (2, 5));
        assert_eq!(interval(&builder, "lsid:s1"), (3, 3));
        assert_eq!(interval(&builder, "lsid:s2"), (4, 4));
    }

    #[test]
    fn test_interval_containment() {
        let builder = built(three_level());
        let (kl, kr) = interval(&builder, "lsid:k");
        let (fl, fr) = interval(&builder, "lsid:f");
        for species in ["lsid:s1", "lsid:s2"] {
            let (sl, sr) = interval(&builder, species);
            assert!(sl <= sr);
            assert!(fl < sl && sr < fr);
        }
        assert!(kl < fl && fr < kr);
        let (s1l, s1r) = interval(&builder, "lsid:s1");
        let (s2l, s2r) = interval(&builder, "lsid:s2");
        assert!(s1r < s2l || s2r < s1l);
    }

    #[test]
    fn test_classification_threaded_down() {
        let builder = built(three_level());
        let doc = builder.store().first(fields::LSID, "lsid:s1").unwrap();
        assert_eq!(doc.get(fields::KINGDOM), Some("PLANTAE"));
        assert_eq!(doc.get(fields::FAMILY), Some("FABACEAE"));
        assert_eq!(doc.get(fields::KINGDOM_ID), Some("lsid:k"));
    }

    #[test]
    fn test_synonym_gets_no_interval_and_copies_classification() {
        let mut instances = three_level();
        instances.push(instance(
            "syn",
            "Racosperma dealbatum",
            RankType::Species,
            None,
            Some("s1"),
            TaxonomicType::Synonym,
        ));
        let builder = built(instances);
        let usage = &builder.usage_map()["lsid:syn"];
        assert_eq!((usage.left, usage.right), (0, 0));
        assert_eq!(usage.accepted_id.as_deref(), Some("lsid:s1"));
        let doc = builder.store().first(fields::LSID, "lsid:syn").unwrap();
        assert_eq!(doc.get(fields::ACCEPTED_LSID), Some("lsid:s1"));
        assert_eq!(doc.get(fields::KINGDOM), Some("PLANTAE"));
        assert!(doc.get(fields::LEFT).is_none());
    }

    #[test]
    fn test_synonym_with_missing_accepted_still_written() {
        let mut instances = three_level();
        instances.push(instance(
            "ghost",
            "Racosperma ghost",
            RankType::Species,
            None,
            Some("nowhere"),
            TaxonomicType::Synonym,
        ));
        let builder = built(instances);
        let doc = builder.store().first(fields::LSID, "lsid:ghost").unwrap();
        assert_eq!(doc.get(fields::ACCEPTED_LSID), Some("lsid:nowhere"));
        assert!(doc.get(fields::KINGDOM).is_none());
    }

    #[test]
    fn test_synonym_child_skipped() {
        let mut instances = three_level();
        // a synonym that also claims a structural parent
        instances.push(instance(
            "syn",
            "Racosperma dealbatum",
            RankType::Species,
            Some("f"),
            Some("s1"),
            TaxonomicType::Synonym,
        ));
        let builder = built(instances);
        // the family interval is unchanged by the synonym child
        assert_eq!(interval(&builder, "lsid:f"), (2, 5));
    }

    #[test]
    fn test_preferred_order_reused() {
        // without a prior map siblings sort by lsid, putting aa first
        let instances = vec![
            instance("k", "Plantae", RankType::Kingdom, None, None, TaxonomicType::Accepted),
            instance("f", "Fabaceae", RankType::Family, Some("k"), None, TaxonomicType::Accepted),
            instance("aa", "Acacia dealbata", RankType::Species, Some("f"), None, TaxonomicType::Accepted),
            instance("zz", "Acacia mearnsii", RankType::Species, Some("f"), None, TaxonomicType::Accepted),
        ];
        let first = built(instances.clone());
        assert_eq!(interval(&first, "lsid:aa"), (3, 3));
        assert_eq!(interval(&first, "lsid:zz"), (4, 4));

        // a prior build that had zz before aa wins over lsid order
        let mut preferred = first.usage_map().clone();
        preferred.get_mut("lsid:zz").unwrap().left = 3;
        preferred.get_mut("lsid:zz").unwrap().right = 3;
        preferred.get_mut("lsid:aa").unwrap().left = 4;
        preferred.get_mut("lsid:aa").unwrap().right = 4;
        let mut builder = HierarchyBuilder::new(IndexerConfig::default()).unwrap();
        builder.set_preferred(preferred);
        builder.load(&NameProvider::simple("p"), &instances);
        builder.build().unwrap();
        assert_eq!(interval(&builder, "lsid:zz"), (3, 3));
        assert_eq!(interval(&builder, "lsid:aa"), (4, 4));
    }

    #[test]
    fn test_depth_ceiling_capped_not_crashed() {
        let mut instances = vec![instance(
            "c0",
            "Chainia 0",
            RankType::Unranked,
            None,
            None,
            TaxonomicType::Accepted,
        )];
        for i in 1..1200 {
            instances.push(instance(
                &format!("c{i}"),
                &format!("Chainia {i}"),
                RankType::Unranked,
                Some(&format!("c{}", i - 1)),
                None,
                TaxonomicType::Accepted,
            ));
        }
        let builder = built(instances);
        // descent stops at the ceiling; everything above it is indexed
        assert_eq!(builder.usage_map().len(), 1000);
    }

    #[test]
    fn test_variant_priority_and_other_names() {
        let mut instances = three_level();
        instances[2].variants = vec![
            VariantRecord {
                scientific_name: "Racosperma dealbatum".into(),
                scientific_name_authorship: None,
                priority: Some(5000),
            },
            VariantRecord {
                scientific_name: "Acacia decurrens var. dealbata".into(),
                scientific_name_authorship: None,
                priority: Some(2000),
            },
        ];
        let builder = built(instances);
        let doc = builder.store().first(fields::LSID, "lsid:s1").unwrap();
        assert_eq!(doc.get_i32(fields::PRIORITY), Some(5000));
        assert!(doc
            .all(fields::NAMES)
            .iter()
            .any(|n| n == "RACOSPERMA DEALBATUM"));
    }

    #[test]
    fn test_malformed_row_skipped() {
        let mut instances = three_level();
        instances.push(instance("", "", RankType::Species, None, None, TaxonomicType::Accepted));
        let builder = built(instances);
        // four good rows still indexed
        assert_eq!(builder.usage_map().len(), 4);
    }

    #[test]
    fn test_non_major_rank_score_penalty() {
        let config = IndexerConfig::default();
        assert_eq!(config.score(None, RankType::Species), DEFAULT_PRIORITY);
        assert_eq!(config.score(None, RankType::Subfamily), DEFAULT_PRIORITY / 5);
    }

    #[test]
    fn test_dataset_priority_multiplier() {
        let mut config = IndexerConfig::default();
        config.dataset_priorities.insert("dr1".into(), 1.5);
        assert_eq!(config.score(Some("dr1"), RankType::Species), 1500);
        assert_eq!(config.score(Some("dr2"), RankType::Species), 1000);
    }

    #[test]
    fn test_usage_map_round_trip() {
        let builder = built(three_level());
        let dir = std::env::temp_dir().join("taxon_index_usage_map_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("usage.tsv");
        builder.write_usage_map(&path).unwrap();
        let loaded = HierarchyBuilder::load_usage_map(&path).unwrap();
        assert_eq!(&loaded["lsid:k"], &builder.usage_map()["lsid:k"]);
        assert_eq!(loaded.len(), builder.usage_map().len());
    }
}
