//! Tunable parameters for a clustering run.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which document-pair similarity the pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityKind {
    /// Salience-weighted mean over best-matching term pairs (embedding based).
    #[default]
    Semantic,
    /// Salience mass of exactly shared terms over the union.
    Weak,
    /// Like `Weak`, but non-shared terms pull the score down.
    Strong,
}

/// Configuration for [`SemSim`](crate::SemSim).
///
/// Every field has a default, so a partial JSON object is a valid config:
///
/// ```rust
/// use semsim::SemSimConfig;
///
/// let config: SemSimConfig = serde_json::from_str(r#"{ "min_samples": 2 }"#).unwrap();
/// assert_eq!(config.min_samples, 2);
/// assert_eq!(config.redundant_cutoff, 0.8);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemSimConfig {
    /// Terms with salience below this are pruned from documents.
    pub min_salience: f64,
    /// Terms made of more words than this are dropped at tokenization.
    pub max_gram_size: usize,
    /// Term similarities at or below this are treated as 0.
    pub term_similarity_floor: f64,
    /// Zero document similarities are raised to this before inversion.
    pub zero_similarity_epsilon: f64,
    /// Minimum neighbourhood size (self included) for a core point.
    pub min_samples: usize,
    /// Jaccard index at or above which two clusters are merged.
    pub redundant_cutoff: f64,
    /// Half-width of the refinement window around the best eps.
    pub refine_radius: f64,
    /// Step of the refinement window.
    pub refine_step: f64,
    /// Document similarity measure.
    pub similarity: SimilarityKind,
    /// Record best-matching pairs and similarities per document pair.
    pub record_pairs: bool,
    /// Render highlight markup for every document.
    pub highlight: bool,
}

impl Default for SemSimConfig {
    fn default() -> Self {
        Self {
            min_salience: 0.4,
            max_gram_size: 3,
            term_similarity_floor: 0.4,
            zero_similarity_epsilon: 1e-6,
            min_samples: 3,
            redundant_cutoff: 0.8,
            refine_radius: 0.1,
            refine_step: 0.025,
            similarity: SimilarityKind::Semantic,
            record_pairs: false,
            highlight: true,
        }
    }
}

impl SemSimConfig {
    /// Set the pruning threshold.
    pub fn with_min_salience(mut self, min_salience: f64) -> Self {
        self.min_salience = min_salience;
        self
    }

    /// Set the maximum number of words per term.
    pub fn with_max_gram_size(mut self, max_gram_size: usize) -> Self {
        self.max_gram_size = max_gram_size;
        self
    }

    /// Set the term similarity noise floor.
    pub fn with_term_similarity_floor(mut self, floor: f64) -> Self {
        self.term_similarity_floor = floor;
        self
    }

    /// Set the minimum neighbourhood size of the density primitive.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Set the Jaccard cutoff for merging redundant clusters.
    pub fn with_redundant_cutoff(mut self, cutoff: f64) -> Self {
        self.redundant_cutoff = cutoff;
        self
    }

    /// Set the refinement window.
    pub fn with_refinement(mut self, radius: f64, step: f64) -> Self {
        self.refine_radius = radius;
        self.refine_step = step;
        self
    }

    /// Set the document similarity measure.
    pub fn with_similarity(mut self, similarity: SimilarityKind) -> Self {
        self.similarity = similarity;
        self
    }

    /// Enable or disable the per-pair debug side-table.
    pub fn with_record_pairs(mut self, record_pairs: bool) -> Self {
        self.record_pairs = record_pairs;
        self
    }

    /// Enable or disable highlight markup.
    pub fn with_highlight(mut self, highlight: bool) -> Self {
        self.highlight = highlight;
        self
    }

    /// Check every parameter against its valid range.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_salience) {
            return Err(Error::InvalidParameter {
                name: "min_salience",
                message: "must be in [0, 1]",
            });
        }
        if self.max_gram_size == 0 {
            return Err(Error::InvalidParameter {
                name: "max_gram_size",
                message: "must be at least 1",
            });
        }
        if !(0.0..1.0).contains(&self.term_similarity_floor) {
            return Err(Error::InvalidParameter {
                name: "term_similarity_floor",
                message: "must be in [0, 1)",
            });
        }
        if !(self.zero_similarity_epsilon > 0.0 && self.zero_similarity_epsilon < 1.0) {
            return Err(Error::InvalidParameter {
                name: "zero_similarity_epsilon",
                message: "must be in (0, 1)",
            });
        }
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "min_samples",
                message: "must be at least 1",
            });
        }
        if !(0.0..=1.0).contains(&self.redundant_cutoff) {
            return Err(Error::InvalidParameter {
                name: "redundant_cutoff",
                message: "must be in [0, 1]",
            });
        }
        if !(self.refine_radius >= 0.0 && self.refine_radius.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "refine_radius",
                message: "must be finite and non-negative",
            });
        }
        if !(self.refine_step > 0.0 && self.refine_step.is_finite()) {
            return Err(Error::InvalidParameter {
                name: "refine_step",
                message: "must be finite and positive",
            });
        }
        Ok(())
    }
}
