//! Documents and the debug side-table of per-pair matches.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{json, Value};

use crate::term::{TermId, Vocabulary};

/// A preprocessed input text.
#[derive(Debug, Clone)]
pub struct Document {
    id: usize,
    raw: String,
    terms: Vec<TermId>,
    term_freqs: HashMap<TermId, usize>,
    highlighted: Option<String>,
}

impl Document {
    /// Create a document from its raw text and extracted terms.
    ///
    /// Terms are ordered by descending salience; equal saliences keep their
    /// original order. Repeated terms are kept and counted.
    pub fn new(
        id: usize,
        raw: impl Into<String>,
        mut terms: Vec<TermId>,
        vocab: &Vocabulary,
    ) -> Self {
        terms.sort_by(|a, b| {
            let (sa, sb) = (vocab.get(*a).salience(), vocab.get(*b).salience());
            sb.total_cmp(&sa)
        });
        let mut term_freqs = HashMap::new();
        for &t in &terms {
            *term_freqs.entry(t).or_insert(0) += 1;
        }
        Self {
            id,
            raw: raw.into(),
            terms,
            term_freqs,
            highlighted: None,
        }
    }

    /// Index of the document in its input batch.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The original text.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Retained terms, most salient first.
    pub fn terms(&self) -> &[TermId] {
        &self.terms
    }

    /// Distinct retained terms.
    pub fn unique_terms(&self) -> HashSet<TermId> {
        self.terms.iter().copied().collect()
    }

    /// How often each term was extracted from this document, before pruning.
    pub fn term_freqs(&self) -> &HashMap<TermId, usize> {
        &self.term_freqs
    }

    /// True if the document still holds a reference to `term`.
    pub fn contains(&self, term: TermId) -> bool {
        self.terms.contains(&term)
    }

    /// Number of times the term string occurs in the raw text.
    pub fn occurrences(&self, term: &str) -> usize {
        if term.is_empty() {
            return 0;
        }
        self.raw.matches(term).count()
    }

    /// Highlight markup, once rendered.
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    pub(crate) fn set_highlighted(&mut self, markup: String) {
        self.highlighted = Some(markup);
    }

    /// Drop every term reference that fails `keep`, returning the removed ids.
    pub(crate) fn retain_terms(&mut self, mut keep: impl FnMut(TermId) -> bool) -> HashSet<TermId> {
        let mut removed = HashSet::new();
        self.terms.retain(|&t| {
            let k = keep(t);
            if !k {
                removed.insert(t);
            }
            k
        });
        removed
    }

    /// Diagnostic JSON view of the document.
    pub fn to_json(&self, vocab: &Vocabulary, links: Option<&PairLinks>) -> Value {
        let term_json = |t: TermId| serde_json::to_value(vocab.get(t)).unwrap_or(Value::Null);

        let mut unique: Vec<TermId> = self.unique_terms().into_iter().collect();
        unique.sort();

        let freqs: BTreeMap<&str, usize> = self
            .term_freqs
            .iter()
            .map(|(&t, &f)| (vocab.get(t).as_str(), f))
            .collect();

        let mut pairs = serde_json::Map::new();
        let mut sims = serde_json::Map::new();
        if let Some(links) = links {
            for (other, matched) in links.pairs_from(self.id) {
                let rows: Vec<Value> = matched
                    .iter()
                    .map(|p| {
                        let left = vocab.get(p.left).as_str();
                        let right = vocab.get(p.right).as_str();
                        json!([left, right, p.similarity])
                    })
                    .collect();
                pairs.insert(other.to_string(), Value::Array(rows));
            }
            for (other, sim) in links.similarities_from(self.id) {
                sims.insert(other.to_string(), json!(sim));
            }
        }

        json!({
            "id": self.id,
            "raw": self.raw,
            "terms": self.terms.iter().map(|&t| term_json(t)).collect::<Vec<_>>(),
            "terms_uniq": unique.into_iter().map(term_json).collect::<Vec<_>>(),
            "term_freqs": freqs,
            "pairs": pairs,
            "sims": sims,
            "highlighted": self.highlighted,
        })
    }
}

/// A best-matching term pair between two documents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TermPair {
    /// Term from the first document.
    pub left: TermId,
    /// Term from the second document.
    pub right: TermId,
    /// Term similarity of the pair.
    pub similarity: f64,
}

/// Debug-only record of what matched between document pairs.
///
/// Keys are `(from, to)` document ids. Best pairs are directional: `(i, j)`
/// holds the best match in `j` for each term of `i`.
#[derive(Debug, Clone, Default)]
pub struct PairLinks {
    pairs: BTreeMap<(usize, usize), Vec<TermPair>>,
    sims: BTreeMap<(usize, usize), f64>,
}

impl PairLinks {
    pub(crate) fn record_pairs(&mut self, from: usize, to: usize, pairs: Vec<TermPair>) {
        self.pairs.insert((from, to), pairs);
    }

    pub(crate) fn record_similarity(&mut self, a: usize, b: usize, sim: f64) {
        self.sims.insert((a, b), sim);
        self.sims.insert((b, a), sim);
    }

    /// Best pairs recorded from document `from` into document `to`.
    pub fn pairs(&self, from: usize, to: usize) -> Option<&[TermPair]> {
        self.pairs.get(&(from, to)).map(Vec::as_slice)
    }

    /// Similarity recorded between two documents.
    pub fn similarity(&self, a: usize, b: usize) -> Option<f64> {
        self.sims.get(&(a, b)).copied()
    }

    fn pairs_from(&self, from: usize) -> impl Iterator<Item = (usize, &Vec<TermPair>)> {
        self.pairs
            .range((from, 0)..=(from, usize::MAX))
            .map(|(&(_, to), p)| (to, p))
    }

    fn similarities_from(&self, from: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.sims
            .range((from, 0)..=(from, usize::MAX))
            .map(|(&(_, to), &s)| (to, s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Term;

    fn vocab() -> Vocabulary {
        Vocabulary::from_terms(vec![
            Term::new("budget", 0.5, 0.5, 0.5),
            Term::new("school", 0.9, 0.5, 0.5),
            Term::new("tutor", 0.7, 0.5, 0.5),
        ])
    }

    #[test]
    fn terms_sorted_by_salience_with_duplicates() {
        let v = vocab();
        let ids: Vec<TermId> = ["budget", "school", "tutor", "school"]
            .iter()
            .map(|t| v.id_of(t).unwrap())
            .collect();
        let doc = Document::new(0, "school budget", ids, &v);
        let names: Vec<&str> = doc.terms().iter().map(|&t| v.get(t).as_str()).collect();
        assert_eq!(names, ["school", "school", "tutor", "budget"]);
        assert_eq!(doc.term_freqs()[&v.id_of("school").unwrap()], 2);
    }

    #[test]
    fn retain_reports_removed_terms() {
        let v = vocab();
        let budget = v.id_of("budget").unwrap();
        let school = v.id_of("school").unwrap();
        let mut doc = Document::new(0, "x", vec![budget, school, budget], &v);
        let removed = doc.retain_terms(|t| t != budget);
        assert_eq!(removed.len(), 1);
        assert!(removed.contains(&budget));
        assert_eq!(doc.terms(), &[school]);
        // Frequencies reflect extraction, not pruning.
        assert_eq!(doc.term_freqs()[&budget], 2);
    }

    #[test]
    fn occurrences_counts_raw_substrings() {
        let v = vocab();
        let doc = Document::new(0, "school after school", vec![], &v);
        assert_eq!(doc.occurrences("school"), 2);
        assert_eq!(doc.occurrences(""), 0);
    }

    #[test]
    fn json_includes_links() {
        let v = vocab();
        let school = v.id_of("school").unwrap();
        let doc = Document::new(3, "school", vec![school], &v);
        let mut links = PairLinks::default();
        let pair = TermPair {
            left: school,
            right: school,
            similarity: 1.0,
        };
        links.record_pairs(3, 5, vec![pair]);
        links.record_similarity(3, 5, 1.0);

        let value = doc.to_json(&v, Some(&links));
        assert_eq!(value["id"], 3);
        assert_eq!(value["pairs"]["5"][0][0], "school");
        assert_eq!(value["sims"]["5"], 1.0);
        assert_eq!(value["term_freqs"]["school"], 1);
    }
}
