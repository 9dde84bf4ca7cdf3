//! Term splitting for the inverted index and token counting for field norms.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Separator runs: line breaks, Unicode spaces and Unicode punctuation.
static SEPARATORS: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"[\n\r\p{Z}\p{P}]+").expect("separator pattern is valid"));

/// Split a field value or query into lower-cased terms.
///
/// Punctuation separates terms, so initials such as `J.R.R.` index as
/// `j`, `r`, `r` and `Man's` as `man`, `s`.
pub fn tokenize(text: &str) -> Vec<String> {
  SEPARATORS
    .split(text)
    .filter(|term| !term.is_empty())
    .map(str::to_lowercase)
    .collect()
}

/// Number of space-separated tokens in a field value.
pub fn count_tokens(text: &str) -> usize {
  text.split_whitespace().count()
}

/// Occurrences of each term in `text`, keyed in term order.
pub fn term_frequencies(text: &str) -> BTreeMap<String, usize> {
  let mut counts = BTreeMap::new();
  for term in tokenize(text) {
    *counts.entry(term).or_insert(0) += 1;
  }
  counts
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_initials_split_into_letters() {
    assert_eq!(tokenize("J.R.R."), vec!["j", "r", "r"]);
    assert_eq!(tokenize("R.R. Tolkien"), vec!["r", "r", "tolkien"]);
  }

  #[test]
  fn test_apostrophes_and_spaces_separate_terms() {
    assert_eq!(tokenize("Old Man's War"), vec!["old", "man", "s", "war"]);
    assert_eq!(tokenize("  The\u{a0}Hobbit\r\n"), vec!["the", "hobbit"]);
    assert!(tokenize(" .,; ").is_empty());
  }

  #[test]
  fn test_repeated_initials_are_counted() {
    let counts = term_frequencies("J.R.R. Tolkien");
    assert_eq!(counts.get("r"), Some(&2));
    assert_eq!(counts.get("j"), Some(&1));
    assert_eq!(counts.get("tolkien"), Some(&1));
    assert_eq!(counts.len(), 3);
  }

  #[test]
  fn test_count_tokens() {
    assert_eq!(count_tokens("Old Man's War"), 3);
    assert_eq!(count_tokens("  J.R.R.   Tolkien "), 2);
    assert_eq!(count_tokens(""), 0);
  }
}
