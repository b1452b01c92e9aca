//! Terms and the flyweight vocabulary that owns them.
//!
//! A term is a keyword or short keyphrase. Every distinct term string has
//! exactly one [`Term`] in a [`Vocabulary`]; documents refer to it by
//! [`TermId`], so a term's scores are the same wherever it occurs.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

/// Stable key of a term inside its [`Vocabulary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TermId(pub(crate) usize);

impl TermId {
    /// Position of the term in its vocabulary.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A scored term.
///
/// Equality and hashing look at the term string only.
#[derive(Debug, Clone, Serialize)]
pub struct Term {
    term: String,
    salience: f64,
    internal_idf: f64,
    global_idf: f64,
    normalized_salience: f64,
}

impl Term {
    /// Create a term. `normalized_salience` starts equal to `salience` until
    /// the term joins a vocabulary.
    pub fn new(term: impl Into<String>, salience: f64, internal_idf: f64, global_idf: f64) -> Self {
        Self {
            term: term.into(),
            salience,
            internal_idf,
            global_idf,
            normalized_salience: salience,
        }
    }

    /// The canonical term string.
    pub fn as_str(&self) -> &str {
        &self.term
    }

    /// Combined intra-corpus and global salience, in `[0, 1]`.
    pub fn salience(&self) -> f64 {
        self.salience
    }

    /// Max-normalized intra-corpus IDF.
    pub fn internal_idf(&self) -> f64 {
        self.internal_idf
    }

    /// IDF from the global knowledge base (or the internal IDF when unknown).
    pub fn global_idf(&self) -> f64 {
        self.global_idf
    }

    /// Salience divided by the largest salience in the vocabulary.
    pub fn normalized_salience(&self) -> f64 {
        self.normalized_salience
    }

    /// Number of words in the term.
    pub fn word_count(&self) -> usize {
        self.term.split_whitespace().count()
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.hash(state);
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [S:{:.2}|L:{:.2}|G:{:.2}]",
            self.term, self.salience, self.internal_idf, self.global_idf
        )
    }
}

/// One canonical [`Term`] per distinct term string.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: Vec<Term>,
    index: HashMap<String, TermId>,
}

impl Vocabulary {
    /// Build a vocabulary and fill in each term's normalized salience.
    ///
    /// A later term with the same string as an earlier one is ignored.
    pub fn from_terms(terms: impl IntoIterator<Item = Term>) -> Self {
        let mut vocab = Self::default();
        for term in terms {
            vocab.insert(term);
        }
        let max = vocab
            .terms
            .iter()
            .map(|t| t.salience)
            .fold(0.0f64, f64::max);
        if max > 0.0 {
            for term in &mut vocab.terms {
                term.normalized_salience = term.salience / max;
            }
        }
        vocab
    }

    /// Insert a term, returning the id of the canonical instance.
    fn insert(&mut self, term: Term) -> TermId {
        if let Some(&id) = self.index.get(&term.term) {
            return id;
        }
        let id = TermId(self.terms.len());
        self.index.insert(term.term.clone(), id);
        self.terms.push(term);
        id
    }

    /// Look up a term by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different vocabulary and is out of range.
    pub fn get(&self, id: TermId) -> &Term {
        &self.terms[id.0]
    }

    /// Look up the id of a term string.
    pub fn id_of(&self, term: &str) -> Option<TermId> {
        self.index.get(term).copied()
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// True if the vocabulary holds no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterate over `(id, term)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Term)> {
        self.terms.iter().enumerate().map(|(i, t)| (TermId(i), t))
    }
}
