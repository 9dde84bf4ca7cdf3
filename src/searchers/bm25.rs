//! An implementation of the BM25+ relevance scoring function.
//!
//! BM25+ extends Okapi BM25 with a lower bound `delta` on the term frequency
//! component, so a matching term in a very long field still outranks a field
//! where the term is missing.

use serde::{Deserialize, Serialize};

/// A scorer for ranking field matches using BM25+.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BM25Scorer {
  /// Term frequency saturation. Higher values let repeated terms keep adding
  /// to the score for longer. The default is 1.2.
  #[serde(default = "default_k1")]
  pub k1: f64,
  /// Field length normalization, from 0.0 (none) to 1.0 (full). The default
  /// is 0.7.
  #[serde(default = "default_b")]
  pub b: f64,
  /// Lower bound on the term frequency component. The default is 0.5.
  #[serde(default = "default_delta")]
  pub delta: f64,
}

fn default_k1() -> f64 {
  1.2
}

fn default_b() -> f64 {
  0.7
}

fn default_delta() -> f64 {
  0.5
}

impl Default for BM25Scorer {
  fn default() -> Self {
    Self {
      k1: default_k1(),
      b: default_b(),
      delta: default_delta(),
    }
  }
}

impl BM25Scorer {
  /// Creates a new `BM25Scorer` with the default parameters.
  pub fn new() -> Self {
    Self::default()
  }

  /// Calculates the BM25+ score of one term in one field of one document.
  ///
  /// # Arguments
  ///
  /// * `term_freq` - Occurrences of the term in the field.
  /// * `doc_freq` - Number of documents whose field contains the term.
  /// * `total_docs` - Number of documents in the index.
  /// * `field_length` - Number of terms in the field.
  /// * `avg_field_length` - Average number of terms in this field across the index.
  pub fn score(
    &self,
    term_freq: usize,
    doc_freq: usize,
    total_docs: usize,
    field_length: usize,
    avg_field_length: f64,
  ) -> f64 {
    if term_freq == 0 {
      return 0.0;
    }

    let tf = term_freq as f64;
    let length_ratio = if avg_field_length > 0.0 {
      field_length as f64 / avg_field_length
    } else {
      1.0
    };

    let norm_tf = (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * length_ratio));

    self.idf(doc_freq as f64, total_docs) * (self.delta + norm_tf)
  }

  /// Inverse document frequency of a term.
  fn idf(&self, doc_freq: f64, total_docs: usize) -> f64 {
    let n = total_docs as f64;
    (1.0 + (n - doc_freq + 0.5) / (doc_freq + 0.5)).ln()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bm25_scoring() {
    let scorer = BM25Scorer::new();

    let score = scorer.score(2, 3, 10, 6, 10.0);
    assert!(score > 0.0);

    assert_eq!(scorer.score(0, 3, 10, 6, 10.0), 0.0);
  }

  #[test]
  fn test_rare_terms_score_higher() {
    let scorer = BM25Scorer::new();

    let rare = scorer.score(1, 1, 100, 5, 5.0);
    let common = scorer.score(1, 90, 100, 5, 5.0);
    assert!(rare > common);
  }

  #[test]
  fn test_shorter_fields_score_higher() {
    let scorer = BM25Scorer::new();

    let short = scorer.score(1, 2, 10, 2, 4.0);
    let long = scorer.score(1, 2, 10, 8, 4.0);
    assert!(short > long);
  }

  #[test]
  fn test_single_document_index() {
    // idf stays positive even when every document contains the term
    let score = BM25Scorer::new().score(1, 1, 1, 2, 2.0);
    assert!(score > 0.0);
  }
}
