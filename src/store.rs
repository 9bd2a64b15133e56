//! In-process term-indexed document store
//!
//! The persistence contract the build and query paths rely on: append
//! documents of named (multi-valued) string fields, commit, then run
//! exact-term queries with cursor pagination and boolean MUST/SHOULD
//! queries over the committed index. Commit builds the inverted index;
//! after that the store is read-only and safe to share.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{info, warn};

/// Field names shared by the loading and search stores.
pub mod fields {
    pub const ID: &str = "id";
    pub const LSID: &str = "lsid";
    pub const NAME: &str = "name";
    pub const NAMES: &str = "names";
    pub const SEARCHABLE_NAME: &str = "searchable_name";
    pub const AUTHOR: &str = "author";
    pub const RANK: &str = "rank";
    pub const RANK_ID: &str = "rank_id";
    pub const LEFT: &str = "left";
    pub const RIGHT: &str = "right";
    pub const PARENT_ID: &str = "parent_id";
    pub const ACCEPTED_ID: &str = "accepted_id";
    pub const ACCEPTED_LSID: &str = "accepted_lsid";
    pub const IS_SYNONYM: &str = "is_synonym";
    pub const ROOT: &str = "root";
    pub const STATUS: &str = "status";
    pub const SYNONYM_TYPE: &str = "synonym_type";
    pub const PRIORITY: &str = "priority";
    pub const DATASET_ID: &str = "dataset_id";
    pub const NAME_TYPE: &str = "name_type";
    pub const KINGDOM: &str = "kingdom";
    pub const KINGDOM_ID: &str = "kingdom_id";
    pub const PHYLUM: &str = "phylum";
    pub const PHYLUM_ID: &str = "phylum_id";
    pub const CLASS: &str = "class";
    pub const CLASS_ID: &str = "class_id";
    pub const ORDER: &str = "order";
    pub const ORDER_ID: &str = "order_id";
    pub const FAMILY: &str = "family";
    pub const FAMILY_ID: &str = "family_id";
    pub const GENUS: &str = "genus";
    pub const GENUS_ID: &str = "genus_id";
    pub const SPECIES: &str = "species";
    pub const SPECIES_ID: &str = "species_id";
}

/// A stored document: named fields, each holding one or more string values.
#[derive(Debug, Clone, Default)]
pub struct Document {
    values: FxHashMap<String, SmallVec<[String; 1]>>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Append a value to a field.
    pub fn add(&mut self, field: &str, value: &str) {
        self.values
            .entry(field.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Replace a field with a single value.
    pub fn set(&mut self, field: &str, value: &str) {
        let mut values = SmallVec::new();
        values.push(value.to_string());
        self.values.insert(field.to_string(), values);
    }

    /// First value of a field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    /// All values of a field.
    pub fn all(&self, field: &str) -> &[String] {
        self.values.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// First value of a field parsed as an integer.
    pub fn get_i32(&self, field: &str) -> Option<i32> {
        self.get(field).and_then(|v| v.parse().ok())
    }

    pub fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}

/// A document plus its boolean-query score.
#[derive(Debug, Clone, Copy)]
pub struct ScoredDoc<'a> {
    pub doc: &'a Document,
    pub score: f32,
}

/// MUST/SHOULD term clauses over stored fields.
#[derive(Debug, Clone, Default)]
pub struct BoolQuery {
    must: Vec<(String, String)>,
    should: Vec<(String, String)>,
}

impl BoolQuery {
    pub fn new() -> Self {
        BoolQuery::default()
    }

    pub fn must(mut self, field: &str, value: &str) -> Self {
        self.must.push((field.to_string(), value.to_string()));
        self
    }

    pub fn should(mut self, field: &str, value: &str) -> Self {
        self.should.push((field.to_string(), value.to_string()));
        self
    }
}

/// Paginated cursor over an exact-term posting list.
pub struct TermCursor<'a> {
    store: &'a MemoryStore,
    postings: Vec<usize>,
    pos: usize,
    page_size: usize,
}

impl<'a> TermCursor<'a> {
    /// The next page of matching documents; empty when exhausted.
    pub fn next_page(&mut self) -> Vec<&'a Document> {
        let end = (self.pos + self.page_size).min(self.postings.len());
        let page = self.postings[self.pos..end]
            .iter()
            .map(|i| &self.store.docs[*i])
            .collect();
        self.pos = end;
        page
    }

    pub fn total(&self) -> usize {
        self.postings.len()
    }
}

/// Append-then-commit document store with an inverted term index.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Vec<Document>,
    index: FxHashMap<(String, String), Vec<usize>>,
    committed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Append a document. Appending after a commit marks the store dirty;
    /// the new documents become visible at the next commit.
    pub fn add(&mut self, doc: Document) {
        self.committed = false;
        self.docs.push(doc);
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Build the inverted index; queries only see committed documents.
    pub fn commit(&mut self) {
        self.index.clear();
        for (i, doc) in self.docs.iter().enumerate() {
            for (field, values) in &doc.values {
                for value in values {
                    self.index
                        .entry((field.clone(), value.clone()))
                        .or_default()
                        .push(i);
                }
            }
        }
        self.committed = true;
        info!(documents = self.docs.len(), "committed document store");
    }

    fn postings(&self, field: &str, value: &str) -> &[usize] {
        if !self.committed {
            warn!(field, "query against uncommitted store");
            return &[];
        }
        self.index
            .get(&(field.to_string(), value.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Exact-term query with cursor pagination.
    pub fn term_query(&self, field: &str, value: &str, page_size: usize) -> TermCursor<'_> {
        TermCursor {
            store: self,
            postings: self.postings(field, value).to_vec(),
            pos: 0,
            page_size: page_size.max(1),
        }
    }

    /// Number of documents with an exact term.
    pub fn count(&self, field: &str, value: &str) -> usize {
        self.postings(field, value).len()
    }

    /// First document with an exact term.
    pub fn first(&self, field: &str, value: &str) -> Option<&Document> {
        self.postings(field, value).first().map(|i| &self.docs[*i])
    }

    /// Boolean query: every MUST term filters, SHOULD terms add to the
    /// score, and the stored priority breaks ties. Results come back
    /// best-first, at most `limit`.
    pub fn search(&self, query: &BoolQuery, limit: usize) -> Vec<ScoredDoc<'_>> {
        let candidates: Vec<usize> = if query.must.is_empty() {
            let mut seen = Vec::new();
            for (field, value) in &query.should {
                for i in self.postings(field, value) {
                    if !seen.contains(i) {
                        seen.push(*i);
                    }
                }
            }
            seen
        } else {
            let mut iter = query.must.iter();
            let mut current: Vec<usize> = match iter.next() {
                Some((field, value)) => self.postings(field, value).to_vec(),
                None => Vec::new(),
            };
            for (field, value) in iter {
                let postings = self.postings(field, value);
                current.retain(|i| postings.contains(i));
            }
            current
        };

        let mut scored: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|i| {
                let doc = &self.docs[i];
                let hits = query
                    .should
                    .iter()
                    .filter(|(field, value)| doc.all(field).iter().any(|v| v == value))
                    .count() as f32;
                let priority = doc.get_i32(fields::PRIORITY).unwrap_or(0) as f32;
                (i, hits + priority / 10_000.0)
            })
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(limit)
            .map(|(i, score)| ScoredDoc {
                doc: &self.docs[i],
                score,
            })
            .collect()
    }
}
