//! Term salience from intra-corpus and global rarity.
//!
//! A term is salient when it is moderately rare: neither in every document
//! nor in just one. Both rarity signals go through the same bell curve
//! centred on 0.5 and the results are averaged.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use crate::document::Document;
use crate::knowledge::GlobalIdf;
use crate::term::{Term, TermId, Vocabulary};

/// Per-term scores for one batch of documents.
#[derive(Debug, Clone, Default)]
pub struct SalienceTable {
    internal_idf: HashMap<String, f64>,
    global_idf: HashMap<String, f64>,
    salience: HashMap<String, f64>,
}

impl SalienceTable {
    /// Salience of a term, if it occurred in the batch.
    pub fn salience(&self, term: &str) -> Option<f64> {
        self.salience.get(term).copied()
    }

    /// Max-normalized intra-corpus IDF of a term.
    pub fn internal_idf(&self, term: &str) -> Option<f64> {
        self.internal_idf.get(term).copied()
    }

    /// Global IDF used for a term (falls back to the internal IDF).
    pub fn global_idf(&self, term: &str) -> Option<f64> {
        self.global_idf.get(term).copied()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.salience.len()
    }

    /// True if no terms were scored.
    pub fn is_empty(&self) -> bool {
        self.salience.is_empty()
    }

    /// Build the canonical vocabulary, one [`Term`] per scored string.
    ///
    /// Terms are inserted in lexicographic order so ids are reproducible.
    pub fn vocabulary(&self) -> Vocabulary {
        let mut names: Vec<&String> = self.salience.keys().collect();
        names.sort();
        Vocabulary::from_terms(names.into_iter().map(|t| {
            Term::new(
                t.clone(),
                self.salience[t],
                self.internal_idf[t],
                self.global_idf[t],
            )
        }))
    }
}

/// Computes salience against an injected global IDF source.
pub struct SalienceEngine<'k> {
    idf: &'k dyn GlobalIdf,
}

impl<'k> SalienceEngine<'k> {
    /// Create an engine reading global rarity from `idf`.
    pub fn new(idf: &'k dyn GlobalIdf) -> Self {
        Self { idf }
    }

    /// Score every distinct term of the tokenized documents.
    pub fn score(&self, docs: &[Vec<String>]) -> SalienceTable {
        let internal_idf = internal_idf(docs);
        let mut global_idf = HashMap::with_capacity(internal_idf.len());
        let mut salience = HashMap::with_capacity(internal_idf.len());

        for (term, &iidf) in &internal_idf {
            let gidf = self.idf.get(term).unwrap_or(iidf);
            salience.insert(term.clone(), (bell(iidf) + bell(gidf)) / 2.0);
            global_idf.insert(term.clone(), gidf);
        }

        debug!(terms = salience.len(), "scored term salience");
        SalienceTable {
            internal_idf,
            global_idf,
            salience,
        }
    }
}

/// Intra-corpus IDF: `ln(N / df + 1)` per term, divided by the maximum.
///
/// Document frequency counts presence, not repetitions.
pub fn internal_idf(docs: &[Vec<String>]) -> HashMap<String, f64> {
    let n = docs.len() as f64;
    let mut df: HashMap<String, usize> = HashMap::new();
    for terms in docs {
        let unique: HashSet<&String> = terms.iter().collect();
        for t in unique {
            *df.entry(t.clone()).or_insert(0) += 1;
        }
    }

    let mut idf: HashMap<String, f64> = df
        .into_iter()
        .map(|(t, c)| (t, (n / c as f64 + 1.0).ln()))
        .collect();

    let max = idf.values().copied().fold(0.0f64, f64::max);
    if max > 0.0 {
        for v in idf.values_mut() {
            *v /= max;
        }
    }
    idf
}

/// Bell curve peaking at 1.0 for `x = 0.5`.
#[inline]
pub fn bell(x: f64) -> f64 {
    let d = x - 0.5;
    (-(d * d) / 0.05).exp()
}

/// Remove references to terms with salience below `min_salience`.
///
/// Returns the ids removed from at least one document. The vocabulary is
/// left untouched.
pub fn prune(docs: &mut [Document], vocab: &Vocabulary, min_salience: f64) -> BTreeSet<TermId> {
    let mut pruned = BTreeSet::new();
    for doc in docs.iter_mut() {
        pruned.extend(doc.retain_terms(|t| vocab.get(t).salience() >= min_salience));
    }
    debug!(min_salience, pruned = pruned.len(), "pruned low-salience terms");
    pruned
}
