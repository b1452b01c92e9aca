//! End-to-end clustering of raw documents.

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use tracing::{debug, info};

use crate::cluster::{distance_matrix, mean_nearest_distance, ClusterSearch, SweepRun};
use crate::config::SemSimConfig;
use crate::descriptor::{describe, Descriptor};
use crate::document::{Document, PairLinks};
use crate::error::{Error, Result};
use crate::highlight::highlight;
use crate::knowledge::{Embeddings, GlobalIdf, Tokenizer};
use crate::matrix::SquareMatrix;
use crate::salience::{prune, SalienceEngine};
use crate::similarity::SimilarityEngine;
use crate::term::{Term, TermId, Vocabulary};

/// Preprocessed documents and their vocabulary.
#[derive(Debug, Clone)]
pub struct Corpus {
    /// One document per input text, terms already pruned.
    pub documents: Vec<Document>,
    /// Every term extracted from the batch, pruned or not.
    pub vocabulary: Vocabulary,
    /// Terms removed from at least one document by pruning.
    pub pruned: BTreeSet<TermId>,
    /// Keyphrases learned by the tokenizer.
    pub phrases: HashSet<String>,
}

impl Corpus {
    /// Distinct terms still referenced by some document.
    pub fn retained_terms(&self) -> BTreeSet<TermId> {
        self.documents
            .iter()
            .flat_map(|d| d.terms().iter().copied())
            .collect()
    }
}

/// Result of [`SemSim::cluster`].
#[derive(Debug, Clone)]
pub struct ClusterOutput {
    /// Preprocessed documents, highlighted when enabled.
    pub documents: Vec<Document>,
    /// Canonical terms.
    pub vocabulary: Vocabulary,
    /// Clusters as sorted document indices, largest first.
    pub clusters: Vec<Vec<usize>>,
    /// Ranked descriptors, parallel to `clusters`.
    pub descriptors: Vec<Vec<Descriptor>>,
    /// Terms removed by pruning.
    pub pruned: BTreeSet<TermId>,
    /// Document similarity matrix.
    pub similarity: SquareMatrix,
    /// Document distance matrix fed to the density primitive.
    pub distances: SquareMatrix,
    /// Every density run that produced clusters.
    pub runs: Vec<SweepRun>,
    /// Best eps of the coarse sweep.
    pub best_eps: Option<f64>,
    /// Per-pair matches, when recorded.
    pub links: Option<PairLinks>,
}

impl ClusterOutput {
    /// Member documents of cluster `k`.
    pub fn cluster_documents(&self, k: usize) -> Vec<&Document> {
        self.clusters[k].iter().map(|&i| &self.documents[i]).collect()
    }

    /// Descriptors of cluster `k` resolved to terms.
    pub fn ranked_terms(&self, k: usize) -> Vec<(&Term, f64)> {
        self.descriptors[k]
            .iter()
            .map(|d| (self.vocabulary.get(d.term), d.score))
            .collect()
    }

    /// Diagnostic JSON view of document `i`.
    pub fn document_json(&self, i: usize) -> Value {
        self.documents[i].to_json(&self.vocabulary, self.links.as_ref())
    }
}

/// Semantic clustering engine.
///
/// Knowledge sources are borrowed, so one loaded model can serve many runs.
pub struct SemSim<'k> {
    config: SemSimConfig,
    tokenizer: &'k dyn Tokenizer,
    idf: &'k dyn GlobalIdf,
    embeddings: &'k dyn Embeddings,
}

impl<'k> SemSim<'k> {
    /// Create an engine, validating `config`.
    pub fn new(
        config: SemSimConfig,
        tokenizer: &'k dyn Tokenizer,
        idf: &'k dyn GlobalIdf,
        embeddings: &'k dyn Embeddings,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tokenizer,
            idf,
            embeddings,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &SemSimConfig {
        &self.config
    }

    /// Tokenize, score and prune a batch of documents.
    pub fn preprocess<S: AsRef<str>>(&self, raw_docs: &[S]) -> Result<Corpus> {
        if raw_docs.is_empty() {
            return Err(Error::EmptyInput);
        }
        let raw: Vec<String> = raw_docs.iter().map(|d| d.as_ref().to_string()).collect();
        debug!(documents = raw.len(), "preprocessing");

        let max_gram = self.config.max_gram_size;
        let tokenized: Vec<Vec<String>> = raw
            .iter()
            .map(|d| {
                self.tokenizer
                    .tokenize(d)
                    .into_iter()
                    .filter(|t| self.tokenizer.gram_size(t) <= max_gram)
                    .collect()
            })
            .collect();
        let (tokenized, phrases) = self.tokenizer.extract_phrases(tokenized, &raw);

        let table = SalienceEngine::new(self.idf).score(&tokenized);
        let vocabulary = table.vocabulary();

        let mut documents: Vec<Document> = raw
            .into_iter()
            .zip(&tokenized)
            .enumerate()
            .map(|(i, (text, terms))| {
                let ids = terms.iter().filter_map(|t| vocabulary.id_of(t)).collect();
                Document::new(i, text, ids, &vocabulary)
            })
            .collect();

        let pruned = prune(&mut documents, &vocabulary, self.config.min_salience);

        let corpus = Corpus {
            documents,
            vocabulary,
            pruned,
            phrases,
        };
        info!(
            documents = corpus.documents.len(),
            terms = corpus.vocabulary.len(),
            retained = corpus.retained_terms().len(),
            pruned = corpus.pruned.len(),
            phrases = corpus.phrases.len(),
            "preprocessed corpus"
        );
        Ok(corpus)
    }

    /// Cluster raw documents, sweeping the given eps values.
    ///
    /// An empty cluster list is a valid outcome: no coherent groups were found.
    pub fn cluster<S: AsRef<str>>(&self, raw_docs: &[S], eps: &[f64]) -> Result<ClusterOutput> {
        if eps.is_empty() {
            return Err(Error::EmptyInput);
        }
        if eps.iter().any(|e| !(*e > 0.0 && e.is_finite())) {
            return Err(Error::InvalidParameter {
                name: "eps",
                message: "must be positive and finite",
            });
        }

        let Corpus {
            mut documents,
            vocabulary,
            pruned,
            ..
        } = self.preprocess(raw_docs)?;

        let mut engine = SimilarityEngine::new(&vocabulary, self.embeddings)
            .with_floor(self.config.term_similarity_floor)
            .with_pair_links(self.config.record_pairs);
        let similarity = engine.similarity_matrix(&documents, self.config.similarity);
        let links = engine.into_links();

        let distances = distance_matrix(&similarity, self.config.zero_similarity_epsilon);
        match mean_nearest_distance(&distances) {
            Some(mean) => debug!(mean_nearest_distance = mean, "distance matrix"),
            None => debug!("mean nearest distance undefined"),
        }

        if self.config.highlight {
            for doc in &mut documents {
                let terms: Vec<&str> = doc
                    .terms()
                    .iter()
                    .map(|&t| vocabulary.get(t).as_str())
                    .collect();
                let markup = highlight(doc.raw(), &terms, self.tokenizer);
                doc.set_highlighted(markup);
            }
        }

        let outcome = ClusterSearch::new()
            .with_min_samples(self.config.min_samples)
            .with_refinement(self.config.refine_radius, self.config.refine_step)
            .with_redundant_cutoff(self.config.redundant_cutoff)
            .run(&distances, eps)?;

        let clusters: Vec<Vec<usize>> = outcome
            .clusters
            .iter()
            .map(|c| c.iter().copied().collect())
            .collect();
        let descriptors: Vec<Vec<Descriptor>> = clusters
            .iter()
            .map(|c| describe(c.iter().map(|&i| &documents[i]), &vocabulary))
            .collect();

        info!(clusters = clusters.len(), "clustering finished");

        Ok(ClusterOutput {
            documents,
            vocabulary,
            clusters,
            descriptors,
            pruned,
            similarity,
            distances,
            runs: outcome.runs,
            best_eps: outcome.best_eps,
            links,
        })
    }
}
