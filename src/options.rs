//! Configuration for the two search backends.
//!
//! Every struct here deserializes from JSON with sensible defaults, so a host
//! can ship backend settings as data, and offers chained setters for
//! configuring it in code.

use crate::error::{InitError, InitResult};
use crate::field::Field;
use crate::searchers::bm25::BM25Scorer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A field searched by the fuzzy backend, with its relative weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyKey {
  pub field: Field,
  #[serde(default = "default_weight")]
  pub weight: f64,
}

impl FuzzyKey {
  pub fn new(field: Field) -> Self {
    Self {
      field,
      weight: default_weight(),
    }
  }

  /// Set the weight.
  pub fn weight(mut self, weight: f64) -> Self {
    self.weight = weight;
    self
  }
}

impl From<Field> for FuzzyKey {
  fn from(field: Field) -> Self {
    Self::new(field)
  }
}

fn default_weight() -> f64 {
  1.0
}

fn default_keys() -> Vec<FuzzyKey> {
  Field::ALL.iter().copied().map(FuzzyKey::new).collect()
}

fn default_threshold() -> f64 {
  0.6
}

fn default_distance() -> usize {
  100
}

fn default_true() -> bool {
  true
}

/// Options for [`FuzzyIndex`](crate::searchers::FuzzyIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyOptions {
  /// Fields to search.
  #[serde(default = "default_keys")]
  pub keys: Vec<FuzzyKey>,
  /// Highest per-field score still counted as a match. `0.0` demands an
  /// exact match, `1.0` matches anything.
  #[serde(default = "default_threshold")]
  pub threshold: f64,
  /// Character position where the pattern is expected to start.
  #[serde(default)]
  pub location: usize,
  /// How far from `location` a match may drift before its score reaches 1.
  #[serde(default = "default_distance")]
  pub distance: usize,
  #[serde(default)]
  pub is_case_sensitive: bool,
  /// Skip the penalty applied to long field values.
  #[serde(default)]
  pub ignore_field_norm: bool,
  /// Attach [`FieldMatch`](crate::types::FieldMatch) metadata to hits.
  #[serde(default)]
  pub include_matches: bool,
  #[serde(default = "default_true")]
  pub should_sort: bool,
  /// Maximum number of hits to return.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limit: Option<usize>,
}

impl Default for FuzzyOptions {
  fn default() -> Self {
    Self {
      keys: default_keys(),
      threshold: default_threshold(),
      location: 0,
      distance: default_distance(),
      is_case_sensitive: false,
      ignore_field_norm: false,
      include_matches: false,
      should_sort: true,
      limit: None,
    }
  }
}

impl FuzzyOptions {
  /// Replace the searched keys.
  pub fn keys<K: Into<FuzzyKey>>(mut self, keys: impl IntoIterator<Item = K>) -> Self {
    self.keys = keys.into_iter().map(Into::into).collect();
    self
  }

  /// Set the match threshold.
  pub fn threshold(mut self, threshold: f64) -> Self {
    self.threshold = threshold;
    self
  }

  /// Set the expected match location.
  pub fn location(mut self, location: usize) -> Self {
    self.location = location;
    self
  }

  /// Set the proximity distance.
  pub fn distance(mut self, distance: usize) -> Self {
    self.distance = distance;
    self
  }

  pub fn case_sensitive(mut self, yes: bool) -> Self {
    self.is_case_sensitive = yes;
    self
  }

  pub fn ignore_field_norm(mut self, yes: bool) -> Self {
    self.ignore_field_norm = yes;
    self
  }

  pub fn include_matches(mut self, yes: bool) -> Self {
    self.include_matches = yes;
    self
  }

  pub fn should_sort(mut self, yes: bool) -> Self {
    self.should_sort = yes;
    self
  }

  /// Cap the number of hits.
  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  /// Checks that the options can build an index.
  pub fn validate(&self) -> InitResult<()> {
    if self.keys.is_empty() {
      return Err(InitError::InvalidOptions("at least one key is required".into()));
    }
    if !(0.0..=1.0).contains(&self.threshold) {
      return Err(InitError::InvalidOptions(format!(
        "threshold must be within [0, 1], got {}",
        self.threshold
      )));
    }
    if let Some(key) = self.keys.iter().find(|k| !(k.weight > 0.0)) {
      return Err(InitError::InvalidOptions(format!(
        "weight for key {} must be positive",
        key.field
      )));
    }
    Ok(())
  }
}

/// How the results of several query terms are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CombineWith {
  /// A document must match any term.
  #[default]
  Or,
  /// A document must match every term.
  And,
}

/// Relative weights of expanded query terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TermWeights {
  #[serde(default = "default_fuzzy_weight")]
  pub fuzzy: f64,
  #[serde(default = "default_prefix_weight")]
  pub prefix: f64,
}

fn default_fuzzy_weight() -> f64 {
  0.45
}

fn default_prefix_weight() -> f64 {
  0.375
}

impl Default for TermWeights {
  fn default() -> Self {
    Self {
      fuzzy: default_fuzzy_weight(),
      prefix: default_prefix_weight(),
    }
  }
}

fn default_max_fuzzy() -> usize {
  6
}

/// Per-query options for [`InvertedIndex`](crate::searchers::InvertedIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
  /// Score multipliers per field. Fields not listed use `1.0`.
  #[serde(default)]
  pub boost: BTreeMap<Field, f64>,
  /// Fuzzy matching: `0` disables it, values below `1` are a fraction of the
  /// term length, larger values an absolute edit distance.
  #[serde(default)]
  pub fuzzy: f64,
  /// Upper bound for the edit distance derived from a fractional `fuzzy`.
  #[serde(default = "default_max_fuzzy")]
  pub max_fuzzy: usize,
  /// Let query terms match indexed terms they are a prefix of.
  #[serde(default)]
  pub prefix: bool,
  #[serde(default)]
  pub combine_with: CombineWith,
  #[serde(default)]
  pub weights: TermWeights,
  #[serde(default)]
  pub bm25: BM25Scorer,
}

impl Default for SearchOptions {
  fn default() -> Self {
    Self {
      boost: BTreeMap::new(),
      fuzzy: 0.0,
      max_fuzzy: default_max_fuzzy(),
      prefix: false,
      combine_with: CombineWith::default(),
      weights: TermWeights::default(),
      bm25: BM25Scorer::default(),
    }
  }
}

impl SearchOptions {
  /// Boost a field.
  pub fn boost(mut self, field: Field, factor: f64) -> Self {
    self.boost.insert(field, factor);
    self
  }

  /// Enable fuzzy matching.
  pub fn fuzzy(mut self, fuzzy: f64) -> Self {
    self.fuzzy = fuzzy;
    self
  }

  /// Enable or disable prefix matching.
  pub fn prefix(mut self, prefix: bool) -> Self {
    self.prefix = prefix;
    self
  }

  pub fn combine_with(mut self, combine_with: CombineWith) -> Self {
    self.combine_with = combine_with;
    self
  }

  /// The boost factor for a field.
  pub fn boost_for(&self, field: Field) -> f64 {
    self.boost.get(&field).copied().unwrap_or(1.0)
  }

  /// Maximum edit distance allowed for a query term of `term_len` characters.
  pub fn max_distance(&self, term_len: usize) -> usize {
    if self.fuzzy <= 0.0 {
      return 0;
    }
    if self.fuzzy >= 1.0 {
      // An absolute edit count is taken as given.
      return self.fuzzy as usize;
    }
    ((self.fuzzy * term_len as f64).round() as usize).min(self.max_fuzzy)
  }
}

fn default_fields() -> Vec<Field> {
  Field::ALL.to_vec()
}

/// Options for building an [`InvertedIndex`](crate::searchers::InvertedIndex).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOptions {
  /// Fields to index.
  #[serde(default = "default_fields")]
  pub fields: Vec<Field>,
  /// Defaults applied to every search.
  #[serde(default)]
  pub search_options: SearchOptions,
}

impl Default for IndexOptions {
  fn default() -> Self {
    Self {
      fields: default_fields(),
      search_options: SearchOptions::default(),
    }
  }
}

impl IndexOptions {
  /// Replace the indexed fields.
  pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
    self.fields = fields.into_iter().collect();
    self
  }

  /// Replace the default search options.
  pub fn search_options(mut self, options: SearchOptions) -> Self {
    self.search_options = options;
    self
  }

  /// Checks that the options can build an index.
  pub fn validate(&self) -> InitResult<()> {
    if self.fields.is_empty() {
      return Err(InitError::InvalidOptions("at least one field is required".into()));
    }
    let search = &self.search_options;
    if search.fuzzy < 0.0 {
      return Err(InitError::InvalidOptions("fuzzy must not be negative".into()));
    }
    if let Some((field, _)) = search.boost.iter().find(|(_, b)| !(**b > 0.0)) {
      return Err(InitError::InvalidOptions(format!(
        "boost for field {field} must be positive"
      )));
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_fuzzy_defaults_from_empty_json() {
    let options: FuzzyOptions = serde_json::from_value(json!({})).unwrap();
    assert_eq!(options, FuzzyOptions::default());
    assert_eq!(options.keys.len(), 3);
    assert_eq!(options.distance, 100);
  }

  #[test]
  fn test_fuzzy_validation() {
    assert!(FuzzyOptions::default().threshold(0.3).validate().is_ok());
    assert!(FuzzyOptions::default().threshold(1.5).validate().is_err());
    assert!(FuzzyOptions::default()
      .keys(Vec::<Field>::new())
      .validate()
      .is_err());
    assert!(FuzzyOptions::default()
      .keys([FuzzyKey::new(Field::Title).weight(0.0)])
      .validate()
      .is_err());
  }

  #[test]
  fn test_search_options_from_json() {
    let options: SearchOptions = serde_json::from_value(json!({
      "boost": { "title": 2 },
      "fuzzy": 0.2,
      "prefix": true,
      "combineWith": "AND"
    }))
    .unwrap();

    assert_eq!(options.boost_for(Field::Title), 2.0);
    assert_eq!(options.boost_for(Field::AuthorLastName), 1.0);
    assert_eq!(options.combine_with, CombineWith::And);
    assert!(options.prefix);
  }

  #[test]
  fn test_max_distance() {
    let options = SearchOptions::default().fuzzy(0.2);
    assert_eq!(options.max_distance(6), 1);
    assert_eq!(options.max_distance(2), 0);
    assert_eq!(options.max_distance(100), 6);

    assert_eq!(SearchOptions::default().max_distance(10), 0);
    assert_eq!(SearchOptions::default().fuzzy(2.0).max_distance(10), 2);
    // the cap bounds fractional fuzziness only
    assert_eq!(SearchOptions::default().fuzzy(9.0).max_distance(3), 9);
  }

  #[test]
  fn test_index_validation() {
    assert!(IndexOptions::default().validate().is_ok());
    assert!(IndexOptions::default().fields([]).validate().is_err());
    let bad = IndexOptions::default()
      .search_options(SearchOptions::default().boost(Field::Title, -1.0));
    assert!(bad.validate().is_err());
  }
}
