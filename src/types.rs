//! Core data types shared by both search backends.

use crate::field::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a record inside an index.
///
/// Hosts may send any JSON scalar as an id. Every one is accepted as-is and
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
  /// A non-negative integer id, also used for ids assigned from input
  /// positions.
  Number(u64),
  /// A textual id.
  Text(String),
  /// Any other JSON number: negative or fractional.
  Decimal(serde_json::Number),
  Flag(bool),
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RecordId::Number(n) => write!(f, "{n}"),
      RecordId::Text(s) => f.write_str(s),
      RecordId::Decimal(n) => write!(f, "{n}"),
      RecordId::Flag(b) => write!(f, "{b}"),
    }
  }
}

impl From<usize> for RecordId {
  fn from(position: usize) -> Self {
    RecordId::Number(position as u64)
  }
}

impl From<&str> for RecordId {
  fn from(id: &str) -> Self {
    RecordId::Text(id.to_string())
  }
}

/// The author of a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
}

impl Author {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self {
      first_name: Some(first_name.into()),
      last_name: Some(last_name.into()),
    }
  }
}

/// A searchable record as supplied by the host.
///
/// Records are read-only to the indexes: backends keep their own copies and
/// never write back into the caller's list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
  /// Optional caller-supplied id. Backends that need ids fall back to the
  /// record's position in the input list.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<RecordId>,
  pub title: String,
  pub author: Author,
}

impl Record {
  /// Creates a record without an id.
  pub fn new(title: impl Into<String>, author: Author) -> Self {
    Self {
      id: None,
      title: title.into(),
      author,
    }
  }

  /// Sets the record id.
  pub fn with_id(mut self, id: impl Into<RecordId>) -> Self {
    self.id = Some(id.into());
    self
  }
}

/// Metadata describing where a query matched inside one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
  /// The field that matched.
  pub key: Field,
  /// The field value that was searched.
  pub value: String,
  /// Inclusive character ranges of the matched region.
  pub indices: Vec<(usize, usize)>,
}

/// A native hit from the fuzzy backend.
///
/// Lower scores are better: `0.0` is a perfect match and `1.0` a complete
/// mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuzzyHit<T> {
  /// The matched item.
  pub item: T,
  /// Position of the item in the list the index was built from.
  pub ref_index: usize,
  pub score: f64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub matches: Vec<FieldMatch>,
}

impl<T> FuzzyHit<T> {
  pub fn new(item: T, ref_index: usize, score: f64) -> Self {
    Self {
      item,
      ref_index,
      score,
      matches: Vec::new(),
    }
  }

  /// Adds match metadata to the hit.
  pub fn with_match(mut self, detail: FieldMatch) -> Self {
    self.matches.push(detail);
    self
  }
}

/// The stored subset of a record returned in normalized results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
  pub title: String,
  pub author: Author,
}

impl From<&Record> for ResultItem {
  fn from(record: &Record) -> Self {
    Self {
      title: record.title.clone(),
      author: record.author.clone(),
    }
  }
}

/// A search result in the shape shared by every backend.
///
/// Scores follow the fuzzy backend's direction: lower means a better match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
  pub item: ResultItem,
  /// Reference back to the originating record.
  pub ref_index: RecordId,
  pub score: f64,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub matches: Vec<FieldMatch>,
}

impl From<FuzzyHit<Record>> for SearchResult {
  fn from(hit: FuzzyHit<Record>) -> Self {
    Self {
      item: ResultItem::from(&hit.item),
      ref_index: RecordId::from(hit.ref_index),
      score: hit.score,
      matches: hit.matches,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_record_deserializes_camel_case() {
    let record: Record = serde_json::from_value(json!({
      "title": "The Hobbit",
      "author": { "firstName": "J.R.R.", "lastName": "Tolkien" }
    }))
    .unwrap();

    assert_eq!(record.id, None);
    assert_eq!(record.author.first_name.as_deref(), Some("J.R.R."));
    assert_eq!(record.author.last_name.as_deref(), Some("Tolkien"));
  }

  #[test]
  fn test_record_id_accepts_numbers_and_strings() {
    let ids: Vec<RecordId> = serde_json::from_value(json!([3, "abc"])).unwrap();
    assert_eq!(ids, vec![RecordId::Number(3), RecordId::Text("abc".into())]);
    assert_eq!(ids[1].to_string(), "abc");
  }

  #[test]
  fn test_record_id_accepts_other_scalars() {
    let ids: Vec<RecordId> = serde_json::from_value(json!([-1, 1.5, true])).unwrap();
    assert!(matches!(&ids[0], RecordId::Decimal(n) if n.as_i64() == Some(-1)));
    assert!(matches!(&ids[1], RecordId::Decimal(n) if n.as_f64() == Some(1.5)));
    assert_eq!(ids[2], RecordId::Flag(true));
    assert_eq!(ids[0].to_string(), "-1");
    assert_eq!(ids[1].to_string(), "1.5");

    assert_eq!(serde_json::to_value(&ids).unwrap(), json!([-1, 1.5, true]));
  }

  #[test]
  fn test_record_requires_author() {
    let parsed = serde_json::from_value::<Record>(json!({ "title": "Dune" }));
    assert!(parsed.is_err());
  }

  #[test]
  fn test_search_result_serializes_ref_index() {
    let hit = FuzzyHit::new(
      Record::new("Emma", Author::new("Jane", "Austen")),
      4,
      0.1,
    );
    let result = SearchResult::from(hit);
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["refIndex"], json!(4));
    assert_eq!(value["item"]["author"]["lastName"], json!("Austen"));
    assert!(value.get("matches").is_none());
  }
}
