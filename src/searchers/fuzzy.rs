//! A score-threshold fuzzy matcher over whole field values.

use crate::error::{InitResult, QueryResult, SearchError};
use crate::field::Field;
use crate::options::FuzzyOptions;
use crate::searchers::tokenizer::count_tokens;
use crate::types::{FieldMatch, FuzzyHit, Record};
use strsim::levenshtein;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Floor for the score of any match that is not the whole value.
const MIN_PARTIAL_SCORE: f64 = 0.001;

/// The best approximate occurrence of a pattern inside one field value.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PatternMatch {
  score: f64,
  start: usize,
  end: usize,
}

/// A fuzzy index that scores how well a query approximately occurs in each
/// configured field of every record.
///
/// The whole query is treated as one pattern. For every field the matcher
/// looks for the substring that needs the fewest edits to become the
/// pattern, and scores it as `edits / pattern_len + drift / distance`, where
/// `drift` is how far the substring starts from the expected `location`.
/// Field scores at or below `threshold` count as matches and are combined
/// into one record score, lower being better. Only a value equal to the
/// pattern scores `0.0`; every other match scores at least `0.001`.
#[derive(Debug, Clone)]
pub struct FuzzyIndex {
  records: Vec<Record>,
  options: FuzzyOptions,
  /// Key weights normalized to sum to 1, parallel to `options.keys`.
  weights: Vec<f64>,
}

impl FuzzyIndex {
  /// Builds an index over `records`.
  ///
  /// Fails if the options are invalid, see [`FuzzyOptions::validate`].
  pub fn new(records: Vec<Record>, options: FuzzyOptions) -> InitResult<Self> {
    options.validate()?;

    let total: f64 = options.keys.iter().map(|k| k.weight).sum();
    let weights = options.keys.iter().map(|k| k.weight / total).collect();

    Ok(Self {
      records,
      options,
      weights,
    })
  }

  /// Number of indexed records.
  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// The options the index was built with.
  pub fn options(&self) -> &FuzzyOptions {
    &self.options
  }

  /// Searches all records, returning hits ranked best first.
  pub fn search(&self, query: &str) -> QueryResult<Vec<FuzzyHit<Record>>> {
    let query = query.trim();
    if query.is_empty() {
      return Err(SearchError::EmptyQuery);
    }

    let pattern = self.normalize(query);
    let pattern_chars: Vec<char> = pattern.chars().collect();

    #[cfg(feature = "parallel")]
    let mut hits: Vec<FuzzyHit<Record>> = self
      .records
      .par_iter()
      .enumerate()
      .filter_map(|(index, record)| self.match_record(record, index, &pattern, &pattern_chars))
      .collect();

    #[cfg(not(feature = "parallel"))]
    let mut hits: Vec<FuzzyHit<Record>> = self
      .records
      .iter()
      .enumerate()
      .filter_map(|(index, record)| self.match_record(record, index, &pattern, &pattern_chars))
      .collect();

    if self.options.should_sort {
      Self::sort_hits(&mut hits);
    }

    if let Some(limit) = self.options.limit {
      hits.truncate(limit);
    }

    Ok(hits)
  }

  /// Match a single record against the pattern.
  fn match_record(
    &self,
    record: &Record,
    index: usize,
    pattern: &str,
    pattern_chars: &[char],
  ) -> Option<FuzzyHit<Record>> {
    let mut total_score = 1.0;
    let mut matched = false;
    let mut details = Vec::new();

    for (key, weight) in self.options.keys.iter().zip(&self.weights) {
      let Some(value) = key.field.extract(record) else {
        continue;
      };
      let Some(found) = self.match_value(pattern, pattern_chars, value) else {
        continue;
      };

      matched = true;
      let norm = if self.options.ignore_field_norm {
        1.0
      } else {
        field_norm(value)
      };
      let score = if found.score == 0.0 {
        f64::EPSILON
      } else {
        found.score
      };
      total_score *= score.powf(weight * norm);

      if self.options.include_matches {
        details.push(Self::field_match(key.field, value, &found));
      }
    }

    if !matched {
      return None;
    }

    let hit = details
      .into_iter()
      .fold(FuzzyHit::new(record.clone(), index, total_score), FuzzyHit::with_match);
    Some(hit)
  }

  /// Finds the best-scoring approximate occurrence of the pattern in `value`.
  fn match_value(&self, pattern: &str, pattern_chars: &[char], value: &str) -> Option<PatternMatch> {
    let text = self.normalize(value);
    let text_chars: Vec<char> = text.chars().collect();
    let m = pattern_chars.len();
    let n = text_chars.len();

    if m == 0 || n == 0 {
      return None;
    }

    if text == pattern {
      return Some(PatternMatch {
        score: 0.0,
        start: 0,
        end: n - 1,
      });
    }

    let threshold = self.options.threshold;
    let max_errors = (threshold * m as f64).floor() as usize;
    let mut best: Option<PatternMatch> = None;

    for start in 0..n {
      let proximity = self.proximity(start);
      // Drift only grows past the expected location.
      if proximity > threshold && start > self.options.location {
        break;
      }

      let remaining = n - start;
      let hi = (m + max_errors).min(remaining);
      let lo = m.saturating_sub(max_errors).max(1).min(hi);

      for len in lo..=hi {
        let window: String = text_chars[start..start + len].iter().collect();
        let errors = levenshtein(pattern, &window);
        if errors > max_errors {
          continue;
        }

        let score = errors as f64 / m as f64 + proximity;
        if score <= threshold && best.map_or(true, |b| score < b.score) {
          best = Some(PatternMatch {
            score,
            start,
            end: start + len - 1,
          });
        }
      }
    }

    // Only whole-value equality scores a perfect zero.
    best.map(|found| PatternMatch {
      score: found.score.max(MIN_PARTIAL_SCORE),
      ..found
    })
  }

  /// Penalty for a match starting at `start` instead of the expected location.
  fn proximity(&self, start: usize) -> f64 {
    let drift = start.abs_diff(self.options.location);
    if self.options.distance == 0 {
      return if drift == 0 { 0.0 } else { 1.0 };
    }
    drift as f64 / self.options.distance as f64
  }

  fn normalize(&self, text: &str) -> String {
    if self.options.is_case_sensitive {
      text.to_string()
    } else {
      text.to_lowercase()
    }
  }

  fn field_match(field: Field, value: &str, found: &PatternMatch) -> FieldMatch {
    FieldMatch {
      key: field,
      value: value.to_string(),
      indices: vec![(found.start, found.end)],
    }
  }

  /// Sort hits best first, ties broken by input position.
  fn sort_hits(hits: &mut [FuzzyHit<Record>]) {
    hits.sort_by(|a, b| {
      a.score
        .partial_cmp(&b.score)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| a.ref_index.cmp(&b.ref_index))
    });
  }
}

/// Length penalty for a field value: `1 / sqrt(tokens)`, rounded to three
/// decimals.
fn field_norm(value: &str) -> f64 {
  let tokens = count_tokens(value).max(1) as f64;
  (1000.0 / tokens.sqrt()).round() / 1000.0
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::options::FuzzyKey;
  use crate::types::Author;

  fn books() -> Vec<Record> {
    vec![
      Record::new("The Hobbit", Author::new("J.R.R.", "Tolkien")),
      Record::new("Old Man's War", Author::new("John", "Scalzi")),
      Record::new("The Lock Artist", Author::new("Steve", "Hamilton")),
      Record::new("HTML5", Author::new("Remy", "Sharp")),
    ]
  }

  fn index(threshold: f64) -> FuzzyIndex {
    FuzzyIndex::new(books(), FuzzyOptions::default().threshold(threshold)).unwrap()
  }

  #[test]
  fn test_exact_value_scores_best() {
    let index = index(0.3);
    let hits = index.search("tolkien").unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].ref_index, 0);
    // EPSILON raised to a positive power stays tiny
    assert!(hits[0].score < 1e-3);
  }

  #[test]
  fn test_substring_with_drift() {
    let index = index(0.3);
    let hits = index.search("Hobbit").unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.title, "The Hobbit");
    assert!(hits[0].score > 0.0 && hits[0].score < 1.0);
  }

  #[test]
  fn test_leading_substring_is_not_exact() {
    let records = vec![
      Record::new("Hobbit Lore", Author::new("X", "Y")),
      Record::new("Hobbit", Author::new("X", "Y")),
    ];
    let index = FuzzyIndex::new(records, FuzzyOptions::default().threshold(0.3)).unwrap();
    let hits = index.search("hobbit").unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].ref_index, 1);
    // 0.001 ^ (1/3 * 0.707)
    assert!((hits[1].score - 0.196).abs() < 1e-3, "score {}", hits[1].score);
  }

  #[test]
  fn test_typo_tolerated() {
    let index = index(0.3);
    let hits = index.search("Scalsi").unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].item.author.last_name.as_deref(), Some("Scalzi"));
  }

  #[test]
  fn test_threshold_rejects_unrelated() {
    let index = index(0.3);
    assert!(index.search("quantum").unwrap().is_empty());
  }

  #[test]
  fn test_zero_threshold_requires_exact_start() {
    let index = index(0.0);

    assert_eq!(index.search("html5").unwrap().len(), 1);
    assert!(index.search("hobbit").unwrap().is_empty());
  }

  #[test]
  fn test_results_sorted_by_score() {
    let records = vec![
      Record::new("A Tale of the Hobbit Kind", Author::new("X", "Y")),
      Record::new("Hobbit", Author::new("X", "Y")),
    ];
    let index = FuzzyIndex::new(records, FuzzyOptions::default().threshold(0.3)).unwrap();
    let hits = index.search("hobbit").unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].ref_index, 1);
    assert!(hits[0].score <= hits[1].score);
  }

  #[test]
  fn test_include_matches() {
    let options = FuzzyOptions::default().threshold(0.3).include_matches(true);
    let index = FuzzyIndex::new(books(), options).unwrap();
    let hits = index.search("hobbit").unwrap();

    let detail = &hits[0].matches[0];
    assert_eq!(detail.key, Field::Title);
    assert_eq!(detail.indices, vec![(4, 9)]);
  }

  #[test]
  fn test_limit() {
    let options = FuzzyOptions::default().threshold(0.6).limit(1);
    let index = FuzzyIndex::new(books(), options).unwrap();
    assert!(index.search("the").unwrap().len() <= 1);
  }

  #[test]
  fn test_only_configured_keys_are_searched() {
    let options = FuzzyOptions::default()
      .keys([FuzzyKey::new(Field::Title)])
      .threshold(0.3);
    let index = FuzzyIndex::new(books(), options).unwrap();
    assert!(index.search("tolkien").unwrap().is_empty());
  }

  #[test]
  fn test_blank_query_is_an_error() {
    let index = index(0.3);
    assert_eq!(index.search("   ").unwrap_err(), SearchError::EmptyQuery);
  }

  #[test]
  fn test_invalid_options() {
    assert!(FuzzyIndex::new(books(), FuzzyOptions::default().threshold(-0.1)).is_err());
  }

  #[test]
  fn test_field_norm() {
    assert_eq!(field_norm("Hobbit"), 1.0);
    assert_eq!(field_norm("The Hobbit"), 0.707);
    assert_eq!(field_norm(""), 1.0);
  }
}
