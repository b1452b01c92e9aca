//! External collaborators: tokenization, global IDF and term embeddings.
//!
//! The engine only talks to these through traits and receives them by
//! reference, so callers can plug in their own tokenizer, frequency tables
//! and embedding model. The map-backed implementations here are enough for
//! small deployments and for tests.

use std::collections::{HashMap, HashSet};

/// Splits raw text into terms.
pub trait Tokenizer {
    /// Terms of a document, in order of appearance.
    fn tokenize(&self, raw: &str) -> Vec<String>;

    /// Learn keyphrases across a batch and rewrite the tokenized documents
    /// to use them. Returns the rewritten documents and the learned phrases.
    ///
    /// The default learns nothing.
    fn extract_phrases(
        &self,
        docs: Vec<Vec<String>>,
        _raw: &[String],
    ) -> (Vec<Vec<String>>, HashSet<String>) {
        (docs, HashSet::new())
    }

    /// Number of words in a term.
    fn gram_size(&self, term: &str) -> usize {
        term.split_whitespace().count()
    }

    /// Surface forms of a single-word term as they appear in `text`.
    ///
    /// The default only knows the term itself.
    fn lemma_forms(&self, term: &str, _text: &str) -> HashSet<String> {
        HashSet::from([term.to_string()])
    }
}

/// Corpus-independent rarity of terms.
pub trait GlobalIdf {
    /// IDF of `term`, or `None` if the knowledge base has never seen it.
    fn get(&self, term: &str) -> Option<f64>;
}

/// Term-level semantic similarity from an embedding model.
///
/// Multi-word terms are keyed with underscores (`"tax_cut"`).
pub trait Embeddings {
    /// True if the model has a vector for `term`.
    fn contains(&self, term: &str) -> bool;

    /// Similarity of two in-vocabulary terms, `None` if either is unknown.
    fn similarity(&self, a: &str, b: &str) -> Option<f64>;

    /// Similarity of two word lists (each averaged), `None` if any word is unknown.
    fn n_similarity(&self, a: &[&str], b: &[&str]) -> Option<f64>;
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "am", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have", "he",
    "her", "his", "how", "i", "if", "in", "into", "is", "it", "its", "just", "me", "more", "my",
    "no", "not", "of", "on", "one", "or", "our", "out", "she", "so", "some", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "to", "too", "up", "us", "very",
    "was", "we", "were", "what", "when", "which", "who", "will", "with", "would", "you", "your",
];

const SUFFIXES: &[&str] = &["", "s", "es", "ed", "d", "ing", "er", "ers"];

/// Lowercased alphanumeric words with stop words and one-letter tokens removed.
#[derive(Debug, Clone)]
pub struct SimpleTokenizer {
    stop_words: HashSet<String>,
}

impl Default for SimpleTokenizer {
    fn default() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SimpleTokenizer {
    /// Create a tokenizer with the built-in English stop list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add extra stop words.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words.extend(words.into_iter().map(Into::into));
        self
    }
}

impl Tokenizer for SimpleTokenizer {
    fn tokenize(&self, raw: &str) -> Vec<String> {
        raw.split(|c: char| !c.is_alphanumeric() && c != '\'')
            .map(|w| w.trim_matches('\'').to_lowercase())
            .filter(|w| w.chars().count() > 1 && !self.stop_words.contains(w))
            .collect()
    }

    fn lemma_forms(&self, term: &str, text: &str) -> HashSet<String> {
        let term = term.to_lowercase();
        let mut forms: HashSet<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .filter(|w| {
                SUFFIXES
                    .iter()
                    .any(|s| w.strip_suffix(s).is_some_and(|stem| stem == term))
            })
            .collect();
        forms.insert(term);
        forms
    }
}

/// Map-backed [`GlobalIdf`].
#[derive(Debug, Clone, Default)]
pub struct IdfTable {
    idf: HashMap<String, f64>,
}

impl IdfTable {
    /// Create an empty table; every lookup falls back.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a max-normalized `ln(N / df)` table from a background corpus of
    /// tokenized documents.
    pub fn from_documents<D, T>(docs: D) -> Self
    where
        D: IntoIterator<Item = T>,
        T: IntoIterator,
        T::Item: AsRef<str>,
    {
        let mut df: HashMap<String, usize> = HashMap::new();
        let mut n = 0usize;
        for doc in docs {
            n += 1;
            let unique: HashSet<String> = doc.into_iter().map(|t| t.as_ref().to_string()).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let mut idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(t, c)| (t, (n as f64 / c as f64).ln()))
            .collect();
        let max = idf.values().copied().fold(0.0f64, f64::max);
        if max > 0.0 {
            for v in idf.values_mut() {
                *v /= max;
            }
        }
        Self { idf }
    }

    /// Set the IDF of one term.
    pub fn insert(&mut self, term: impl Into<String>, idf: f64) {
        self.idf.insert(term.into(), idf);
    }

    /// Number of known terms.
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    /// True if no term is known.
    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for IdfTable {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            idf: iter.into_iter().map(|(t, v)| (t.into(), v)).collect(),
        }
    }
}

impl GlobalIdf for IdfTable {
    fn get(&self, term: &str) -> Option<f64> {
        self.idf.get(term).copied()
    }
}

/// Map-backed [`Embeddings`] with cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f32>>,
}

impl EmbeddingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the vector of a word.
    pub fn insert(&mut self, word: impl Into<String>, vector: Vec<f32>) {
        self.vectors.insert(word.into(), vector);
    }

    /// Number of known words.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// True if no word is known.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    fn mean_vector(&self, words: &[&str]) -> Option<Vec<f32>> {
        let mut iter = words.iter();
        let mut sum = self.vectors.get(*iter.next()?)?.clone();
        for w in iter {
            let v = self.vectors.get(*w)?;
            if v.len() != sum.len() {
                return None;
            }
            for (s, x) in sum.iter_mut().zip(v) {
                *s += x;
            }
        }
        let n = words.len() as f32;
        for s in &mut sum {
            *s /= n;
        }
        Some(sum)
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f32>)> for EmbeddingTable {
    fn from_iter<I: IntoIterator<Item = (S, Vec<f32>)>>(iter: I) -> Self {
        Self {
            vectors: iter.into_iter().map(|(w, v)| (w.into(), v)).collect(),
        }
    }
}

impl Embeddings for EmbeddingTable {
    fn contains(&self, term: &str) -> bool {
        self.vectors.contains_key(term)
    }

    fn similarity(&self, a: &str, b: &str) -> Option<f64> {
        Some(cosine_similarity(self.vectors.get(a)?, self.vectors.get(b)?))
    }

    fn n_similarity(&self, a: &[&str], b: &[&str]) -> Option<f64> {
        Some(cosine_similarity(&self.mean_vector(a)?, &self.mean_vector(b)?))
    }
}

/// Cosine similarity between two vectors.
/// Returns 0.0 for mismatched, empty or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}
