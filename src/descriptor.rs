//! Ranked descriptor terms for a cluster.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::document::Document;
use crate::term::{TermId, Vocabulary};

/// A term describing a cluster, with its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Descriptor {
    /// The term.
    pub term: TermId,
    /// Number of member documents containing the term, times its salience.
    pub score: f64,
}

/// Rank the terms of a cluster by `document count × salience`, best first.
///
/// Each document counts once per term however often the term repeats in it.
/// Ties are broken by term string.
pub fn describe<'d>(
    docs: impl IntoIterator<Item = &'d Document>,
    vocab: &Vocabulary,
) -> Vec<Descriptor> {
    let mut counts: HashMap<TermId, usize> = HashMap::new();
    for doc in docs {
        let unique: HashSet<TermId> = doc.unique_terms();
        for t in unique {
            *counts.entry(t).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<Descriptor> = counts
        .into_iter()
        .map(|(term, count)| Descriptor {
            term,
            score: count as f64 * vocab.get(term).salience(),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| vocab.get(a.term).as_str().cmp(vocab.get(b.term).as_str()))
    });
    ranked
}
