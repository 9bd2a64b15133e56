//! End-to-end pipeline tests: load a small two-kingdom taxonomy through the
//! hierarchy builder, then resolve names against the committed index.

use taxon_index_rust::builder::{HierarchyBuilder, IndexerConfig};
use taxon_index_rust::error::MatchError;
use taxon_index_rust::instance::{LinnaeanClassification, TaxonConceptInstance, VariantRecord};
use taxon_index_rust::key::NomenclaturalCode;
use taxon_index_rust::provider::NameProvider;
use taxon_index_rust::rank::RankType;
use taxon_index_rust::searcher::{MatchType, NameSearcher};
use taxon_index_rust::status::TaxonomicType;
use taxon_index_rust::store::{fields, Document, MemoryStore};

fn inst(
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
        nomenclatural_code: NomenclaturalCode::Any,
        dataset_id: None,
        parent_id: parent.map(|p| format!("lsid:{p}")),
        accepted_id: accepted.map(|a| format!("lsid:{a}")),
        classification: LinnaeanClassification::default(),
        variants: Vec::new(),
        vernacular_names: Vec::new(),
    }
}

fn taxonomy() -> Vec<TaxonConceptInstance> {
    use RankType::*;
    use TaxonomicType::*;
    let mut instances = vec![
        inst("k-p", "Plantae", Kingdom, None, None, Accepted),
        inst("f-p", "Fabaceae", Family, Some("k-p"), None, Accepted),
        inst("g-ac", "Acacia", Genus, Some("f-p"), None, Accepted),
        inst("s-p", "Acacia dealbata", Species, Some("g-ac"), None, Accepted),
        inst("s-q", "Acacia mearnsii", Species, Some("g-ac"), None, Accepted),
        inst("f-o", "Orchidaceae", Family, Some("k-p"), None, Accepted),
        inst("g-bp", "Bactrocera", Genus, Some("f-o"), None, Accepted),
        inst("x-1", "Hibbertia pustulata", Species, Some("f-p"), None, Excluded),
        inst("x-2", "Senecio glomeratus", Species, Some("f-p"), None, Excluded),
        inst("s-r", "Senecio glomeratus", Species, Some("f-p"), None, Accepted),
        inst("syn", "Racosperma dealbatum", Species, None, Some("s-p"), Synonym),
        inst("k-a", "Animalia", Kingdom, None, None, Accepted),
        inst("f-a", "Tephritidae", Family, Some("k-a"), None, Accepted),
        inst("g-ba", "Bactrocera", Genus, Some("f-a"), None, Accepted),
        inst("s-a", "Bactrocera tryoni", Species, Some("g-ba"), None, Accepted),
    ];
    // alternate name for Acacia mearnsii
    instances[4].variants = vec![VariantRecord {
        scientific_name: "Racosperma mearnsii".into(),
        scientific_name_authorship: None,
        priority: None,
    }];
    instances
}

fn reference_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for (genus, kingdom, phylum, family) in [
        ("BACTROCERA", "ANIMALIA", "ARTHROPODA", "TEPHRITIDAE"),
        ("BACTROCERA", "PLANTAE", "CHAROPHYTA", "ORCHIDACEAE"),
        ("ACACIA", "PLANTAE", "CHAROPHYTA", "FABACEAE"),
    ] {
        let mut doc = Document::new();
        doc.set(fields::GENUS, genus);
        doc.set(fields::KINGDOM, kingdom);
        doc.set(fields::PHYLUM, phylum);
        doc.set(fields::FAMILY, family);
        store.add(doc);
    }
    store.commit();
    store
}

fn searcher() -> NameSearcher {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let mut builder = HierarchyBuilder::new(IndexerConfig::default()).unwrap();
    builder.load(&NameProvider::simple("p"), &taxonomy());
    builder.build().unwrap();
    let (store, _) = builder.into_parts();
    NameSearcher::new(store, Some(reference_store())).unwrap()
}

#[test]
fn test_direct_species_match() {
    let s = searcher();
    let result = s.search_by_name("Acacia dealbata").unwrap().unwrap();
    assert_eq!(result.lsid, "lsid:s-p");
    assert_eq!(result.scientific_name, "ACACIA DEALBATA");
    assert_eq!(result.match_type, MatchType::Direct);
    assert_eq!(result.rank, Some(RankType::Species));
    assert!(!result.cleaned);
}

#[test]
fn test_match_carries_classification_and_interval() {
    let s = searcher();
    let species = s.search_by_name("Acacia dealbata").unwrap().unwrap();
    assert_eq!(species.classification.kingdom.as_deref(), Some("PLANTAE"));
    assert_eq!(species.classification.family.as_deref(), Some("FABACEAE"));
    assert_eq!(species.classification.genus.as_deref(), Some("ACACIA"));

    let family = s
        .search_by_name_rank("Fabaceae", RankType::Family)
        .unwrap()
        .unwrap();
    let (sl, sr) = (species.left.unwrap(), species.right.unwrap());
    let (fl, fr) = (family.left.unwrap(), family.right.unwrap());
    assert!(fl < sl && sr < fr);
}

#[test]
fn test_synonym_resolution() {
    let s = searcher();
    let result = s.search_by_name("Racosperma dealbatum").unwrap().unwrap();
    assert_eq!(result.lsid, "lsid:syn");
    assert_eq!(result.accepted_lsid.as_deref(), Some("lsid:s-p"));
    assert_eq!(result.match_type, MatchType::Direct);
    // no interval of its own, but the accepted classification is copied
    assert_eq!(result.left, None);
    assert_eq!(result.classification.kingdom.as_deref(), Some("PLANTAE"));
}

#[test]
fn test_alternate_name_via_variant() {
    let s = searcher();
    let result = s.search_by_name("Racosperma mearnsii").unwrap().unwrap();
    assert_eq!(result.lsid, "lsid:s-q");
    assert_eq!(result.match_type, MatchType::Alternate);
}

#[test]
fn test_phonetic_match_requires_fuzzy() {
    let s = searcher();
    assert!(s
        .search("Acacia dealbatta", None, None, false)
        .unwrap()
        .is_none());
    let result = s
        .search("Acacia dealbatta", None, None, true)
        .unwrap()
        .unwrap();
    assert_eq!(result.lsid, "lsid:s-p");
    assert_eq!(result.match_type, MatchType::Phonetic);
}

#[test]
fn test_doubtful_name_cleaned() {
    let s = searcher();
    let result = s.search_by_name("Acacia cf. dealbata").unwrap().unwrap();
    assert_eq!(result.lsid, "lsid:s-p");
    assert_eq!(result.match_type, MatchType::Canonical);
    assert!(result.cleaned);
}

#[test]
fn test_unhinted_genus_homonym_fails() {
    let s = searcher();
    let err = s
        .search("Bactrocera", None, Some(RankType::Genus), false)
        .unwrap_err();
    match err {
        MatchError::Homonym { candidates } => assert_eq!(candidates.len(), 2),
        other => panic!("expected homonym error, got {other}"),
    }
}

#[test]
fn test_kingdom_hint_resolves_homonym() {
    let s = searcher();
    let hint = LinnaeanClassification {
        kingdom: Some("Animalia".into()),
        ..Default::default()
    };
    let result = s
        .search("Bactrocera", Some(&hint), Some(RankType::Genus), false)
        .unwrap()
        .unwrap();
    assert_eq!(result.lsid, "lsid:g-ba");
    assert_eq!(result.classification.kingdom.as_deref(), Some("ANIMALIA"));
}

#[test]
fn test_unique_genus_needs_no_hint() {
    let s = searcher();
    let result = s
        .search("Acacia", None, Some(RankType::Genus), false)
        .unwrap()
        .unwrap();
    assert_eq!(result.lsid, "lsid:g-ac");
}

#[test]
fn test_excluded_name_errors() {
    let s = searcher();
    let err = s.search_by_name("Hibbertia pustulata").unwrap_err();
    match err {
        MatchError::Excluded {
            excluded,
            alternative,
        } => {
            assert_eq!(excluded.lsid, "lsid:x-1");
            assert!(alternative.is_none());
        }
        other => panic!("expected excluded error, got {other}"),
    }
}

#[test]
fn test_excluded_with_accepted_alternative() {
    let s = searcher();
    let err = s.search_by_name("Senecio glomeratus").unwrap_err();
    match err {
        MatchError::Excluded {
            excluded,
            alternative,
        } => {
            assert_eq!(excluded.lsid, "lsid:x-2");
            assert_eq!(alternative.unwrap().lsid, "lsid:s-r");
        }
        other => panic!("expected excluded error, got {other}"),
    }
}

#[test]
fn test_higher_rank_fallback() {
    let s = searcher();
    let cl = LinnaeanClassification {
        kingdom: Some("Plantae".into()),
        family: Some("Fabaceae".into()),
        genus: Some("Wombatia".into()),
        ..Default::default()
    };
    assert!(s.search_by_classification(&cl, false).unwrap().is_none());
    let result = s.search_by_classification(&cl, true).unwrap().unwrap();
    assert_eq!(result.lsid, "lsid:f-p");
    assert_eq!(result.match_type, MatchType::HigherRank);
}

#[test]
fn test_search_by_id() {
    let s = searcher();
    let result = s.search_by_id("lsid:s-a").unwrap();
    assert_eq!(result.scientific_name, "BACTROCERA TRYONI");
    assert!(s.search_by_id("lsid:nope").is_none());
}

#[test]
fn test_score_adjustment_applied_at_load() {
    let provider: NameProvider = serde_json::from_str(
        r#"{
            "id": "p",
            "scoreAdjuster": {
                "adjustments": [
                    {"condition":{"type":"match","scientificName":"Acacia mearnsii"},"adjustment":-500}
                ]
            }
        }"#,
    )
    .unwrap();
    let mut builder = HierarchyBuilder::new(IndexerConfig::default()).unwrap();
    builder.load(&provider, &taxonomy());
    builder.build().unwrap();
    let store = builder.store();
    let adjusted = store.first(fields::LSID, "lsid:s-q").unwrap();
    assert_eq!(adjusted.get_i32(fields::PRIORITY), Some(500));
    let untouched = store.first(fields::LSID, "lsid:s-p").unwrap();
    assert_eq!(untouched.get_i32(fields::PRIORITY), Some(1000));
}
