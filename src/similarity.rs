//! Document-pair similarity.
//!
//! The semantic measure does not need exact lexical overlap. Each term of one
//! document is matched with its most similar term in the other (and vice
//! versa), and the pair similarities are averaged, weighted by how salient the
//! paired terms are. Term similarities come from an embedding model and are
//! cached per term pair for the lifetime of the engine.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::config::SimilarityKind;
use crate::document::{Document, PairLinks, TermPair};
use crate::knowledge::Embeddings;
use crate::matrix::SquareMatrix;
use crate::term::{TermId, Vocabulary};

/// Default noise floor for term similarities.
pub const TERM_SIMILARITY_FLOOR: f64 = 0.4;

/// Lazily-filled, symmetric term × term similarity cache.
///
/// A missing cell means "not computed yet".
#[derive(Debug, Clone, Default)]
pub struct TermSimilarityCache {
    cells: HashMap<(TermId, TermId), f64>,
    lookups: usize,
}

impl TermSimilarityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn key(a: TermId, b: TermId) -> (TermId, TermId) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Cached similarity of two terms, if computed.
    pub fn get(&self, a: TermId, b: TermId) -> Option<f64> {
        self.cells.get(&Self::key(a, b)).copied()
    }

    /// Return the cached value or compute, store and return it.
    pub fn get_or_compute(&mut self, a: TermId, b: TermId, compute: impl FnOnce() -> f64) -> f64 {
        let key = Self::key(a, b);
        if let Some(&v) = self.cells.get(&key) {
            return v;
        }
        self.lookups += 1;
        let v = compute();
        self.cells.insert(key, v);
        v
    }

    /// Number of filled cells (each covers both orientations).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// True if nothing has been computed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of times a cell had to be computed.
    pub fn lookups(&self) -> usize {
        self.lookups
    }
}

/// Computes term and document similarities over one vocabulary.
pub struct SimilarityEngine<'a> {
    vocab: &'a Vocabulary,
    embeddings: &'a dyn Embeddings,
    floor: f64,
    cache: TermSimilarityCache,
    links: Option<PairLinks>,
}

impl<'a> SimilarityEngine<'a> {
    /// Create an engine with the default noise floor and no pair recording.
    pub fn new(vocab: &'a Vocabulary, embeddings: &'a dyn Embeddings) -> Self {
        Self {
            vocab,
            embeddings,
            floor: TERM_SIMILARITY_FLOOR,
            cache: TermSimilarityCache::new(),
            links: None,
        }
    }

    /// Set the term similarity noise floor.
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Record best pairs and similarities per document pair.
    pub fn with_pair_links(mut self, record: bool) -> Self {
        self.links = record.then(PairLinks::default);
        self
    }

    /// The term similarity cache.
    pub fn cache(&self) -> &TermSimilarityCache {
        &self.cache
    }

    /// Recorded pair links, if enabled.
    pub fn links(&self) -> Option<&PairLinks> {
        self.links.as_ref()
    }

    /// Consume the engine, keeping the recorded pair links.
    pub fn into_links(self) -> Option<PairLinks> {
        self.links
    }

    /// Similarity of two terms in `[0, 1]`, cached.
    pub fn term_similarity(&mut self, a: TermId, b: TermId) -> f64 {
        if a == b {
            return 1.0;
        }
        let (vocab, embeddings, floor) = (self.vocab, self.embeddings, self.floor);
        self.cache.get_or_compute(a, b, || {
            embedding_similarity(
                embeddings,
                vocab.get(a).as_str(),
                vocab.get(b).as_str(),
                floor,
            )
        })
    }

    /// Maximally similar term pairs between two documents, in both directions.
    ///
    /// Each term of `d1` is paired with its best match in `d2` and each term
    /// of `d2` with its best match in `d1`; the first maximum wins ties.
    /// Pairs are oriented `(d1 term, d2 term)` and deduplicated.
    pub fn best_pairs(&mut self, d1: &Document, d2: &Document) -> Vec<TermPair> {
        let (rows, cols) = (d1.terms(), d2.terms());
        if rows.is_empty() || cols.is_empty() {
            return Vec::new();
        }

        let m = cols.len();
        let mut sub = vec![0.0f64; rows.len() * m];
        for (i, &a) in rows.iter().enumerate() {
            for (j, &b) in cols.iter().enumerate() {
                sub[i * m + j] = self.term_similarity(a, b);
            }
        }

        let mut forward: BTreeMap<(TermId, TermId), f64> = BTreeMap::new();
        for i in 0..rows.len() {
            let j = argmax((0..m).map(|j| sub[i * m + j]));
            forward.insert((rows[i], cols[j]), sub[i * m + j]);
        }

        let mut backward: BTreeMap<(TermId, TermId), f64> = BTreeMap::new();
        for j in 0..m {
            let i = argmax((0..rows.len()).map(|i| sub[i * m + j]));
            backward.insert((rows[i], cols[j]), sub[i * m + j]);
        }

        if let Some(links) = &mut self.links {
            links.record_pairs(d1.id(), d2.id(), to_pairs(&forward));
            links.record_pairs(d2.id(), d1.id(), to_pairs(&backward));
        }

        forward.extend(backward);
        to_pairs(&forward)
    }

    /// Salience-weighted mean similarity of the best-matching term pairs.
    ///
    /// 0 when either document has no terms.
    pub fn semantic(&mut self, d1: &Document, d2: &Document) -> f64 {
        let pairs = self.best_pairs(d1, d2);
        if pairs.is_empty() {
            return 0.0;
        }

        let (mut weighted, mut total) = (0.0f64, 0.0f64);
        for p in &pairs {
            let w = (self.vocab.get(p.left).salience() + self.vocab.get(p.right).salience()) / 2.0;
            weighted += p.similarity * w;
            total += w;
        }
        let sim = if total > 0.0 { weighted / total } else { 0.0 };

        if let Some(links) = &mut self.links {
            links.record_similarity(d1.id(), d2.id(), sim);
        }
        sim
    }

    /// Salience mass of exactly shared terms over the salience mass of all terms.
    pub fn weak(&self, d1: &Document, d2: &Document) -> f64 {
        let (shared, _, union) = self.overlap_mass(d1, d2);
        if union > 0.0 {
            shared / union
        } else {
            0.0
        }
    }

    /// Like [`weak`](Self::weak), but salience of non-shared terms counts against.
    pub fn strong(&self, d1: &Document, d2: &Document) -> f64 {
        let (shared, differing, union) = self.overlap_mass(d1, d2);
        if union > 0.0 {
            (shared - differing) / (2.0 * union) + 0.5
        } else {
            0.0
        }
    }

    /// Document similarity of the requested kind.
    pub fn similarity(&mut self, kind: SimilarityKind, d1: &Document, d2: &Document) -> f64 {
        match kind {
            SimilarityKind::Semantic => self.semantic(d1, d2),
            SimilarityKind::Weak => self.weak(d1, d2),
            SimilarityKind::Strong => self.strong(d1, d2),
        }
    }

    /// Full symmetric similarity matrix with a unit diagonal.
    ///
    /// Only pairs `i > j` are computed; the upper triangle is mirrored.
    pub fn similarity_matrix(&mut self, docs: &[Document], kind: SimilarityKind) -> SquareMatrix {
        let n = docs.len();
        debug!(documents = n, pairs = n * n.saturating_sub(1) / 2, "building similarity matrix");

        let mut lower = SquareMatrix::zeros(n);
        for i in 0..n {
            lower.set(i, i, 1.0);
            for j in 0..i {
                let sim = self.similarity(kind, &docs[i], &docs[j]);
                lower.set(i, j, sim);
            }
        }

        debug!(
            cached_terms = self.cache.len(),
            lookups = self.cache.lookups(),
            "similarity matrix done"
        );
        lower.symmetrize_lower()
    }

    /// Returns (shared, symmetric difference, union) salience mass.
    fn overlap_mass(&self, d1: &Document, d2: &Document) -> (f64, f64, f64) {
        let a: HashSet<TermId> = d1.unique_terms();
        let b: HashSet<TermId> = d2.unique_terms();
        let shared = self.salience_mass(a.intersection(&b));
        let differing = self.salience_mass(a.symmetric_difference(&b));
        let union = self.salience_mass(a.union(&b));
        (shared, differing, union)
    }

    fn salience_mass<'t>(&self, ids: impl Iterator<Item = &'t TermId>) -> f64 {
        ids.map(|&t| self.vocab.get(t).salience()).sum()
    }
}

/// Similarity of two term strings from the embedding model.
///
/// Multi-word terms the model does not know are compared as word lists.
/// Unknown words give 0, as does anything at or below `floor`.
pub fn embedding_similarity(embeddings: &dyn Embeddings, a: &str, b: &str, floor: f64) -> f64 {
    if a == b {
        return 1.0;
    }

    let a = a.replace(' ', "_");
    let b = b.replace(' ', "_");
    let (a_known, b_known) = (embeddings.contains(&a), embeddings.contains(&b));

    let sim = if a_known && b_known {
        embeddings.similarity(&a, &b)
    } else {
        let words = |t: &str, known: bool| -> Vec<String> {
            if known {
                vec![t.to_string()]
            } else {
                t.split('_').map(str::to_string).collect()
            }
        };
        let wa = words(&a, a_known);
        let wb = words(&b, b_known);
        let wa: Vec<&str> = wa.iter().map(String::as_str).collect();
        let wb: Vec<&str> = wb.iter().map(String::as_str).collect();
        embeddings.n_similarity(&wa, &wb)
    };

    match sim {
        Some(s) if s > floor => s.min(1.0),
        _ => 0.0,
    }
}

/// Index of the first maximum.
fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best_val = v;
            best = i;
        }
    }
    best
}

fn to_pairs(map: &BTreeMap<(TermId, TermId), f64>) -> Vec<TermPair> {
    map.iter()
        .map(|(&(left, right), &similarity)| TermPair {
            left,
            right,
            similarity,
        })
        .collect()
}
