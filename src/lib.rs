//! Semantic clustering of short documents.
//!
//! `semsim` groups short, noisy texts (comments, reviews, survey answers)
//! into clusters of related documents and describes each cluster with a
//! ranked list of terms. Lexical overlap is a weak signal for such texts, so
//! documents are compared through their best-matching term pairs under an
//! embedding model.
//!
//! The pipeline:
//! - [`salience`]: score each term by intra-corpus and global rarity, prune
//!   uninformative terms
//! - [`similarity`]: document similarity from salience-weighted best term pairs
//! - [`cluster`]: distance matrix, DBSCAN eps sweep with a partition score,
//!   redundant-cluster merging
//! - [`descriptor`]: rank cluster terms by document count and salience
//!
//! Tokenization, global IDF and embeddings are supplied through the traits in
//! [`knowledge`].
//!
//! ```rust
//! use semsim::{EmbeddingTable, IdfTable, SemSim, SemSimConfig, SimpleTokenizer};
//!
//! let tokenizer = SimpleTokenizer::new();
//! let idf = IdfTable::new();
//! let embeddings = EmbeddingTable::new();
//! let engine = SemSim::new(SemSimConfig::default(), &tokenizer, &idf, &embeddings).unwrap();
//!
//! let docs = ["rent is too high", "high rent again", "rent keeps rising", "parks are nice"];
//! let output = engine.cluster(&docs, &[0.5, 1.0]).unwrap();
//! assert_eq!(output.documents.len(), 4);
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod highlight;
pub mod knowledge;
pub mod matrix;
pub mod pipeline;
pub mod salience;
pub mod similarity;
pub mod term;

pub use cluster::{Cluster, ClusterSearch, Clustering, Dbscan, SearchOutcome};
pub use config::{SemSimConfig, SimilarityKind};
pub use descriptor::Descriptor;
pub use document::{Document, PairLinks, TermPair};
pub use error::{Error, Result};
pub use knowledge::{EmbeddingTable, Embeddings, GlobalIdf, IdfTable, SimpleTokenizer, Tokenizer};
pub use matrix::SquareMatrix;
pub use pipeline::{ClusterOutput, Corpus, SemSim};
pub use similarity::SimilarityEngine;
pub use term::{Term, TermId, Vocabulary};
