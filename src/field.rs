//! Searchable fields of a [`Record`] and their extraction functions.
//!
//! Field access is resolved statically against the record schema instead of
//! walking dotted paths through a serialized value.

use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A searchable field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
  #[serde(rename = "title")]
  Title,
  #[serde(rename = "author.firstName")]
  AuthorFirstName,
  #[serde(rename = "author.lastName")]
  AuthorLastName,
}

impl Field {
  /// Every searchable field, in declaration order.
  pub const ALL: [Field; 3] = [Field::Title, Field::AuthorFirstName, Field::AuthorLastName];

  /// The dotted path of the field in the host's JSON shape.
  pub fn path(self) -> &'static str {
    match self {
      Field::Title => "title",
      Field::AuthorFirstName => "author.firstName",
      Field::AuthorLastName => "author.lastName",
    }
  }

  /// Reads the field's text from a record. Missing values yield `None`.
  pub fn extract(self, record: &Record) -> Option<&str> {
    match self {
      Field::Title => Some(record.title.as_str()),
      Field::AuthorFirstName => record.author.first_name.as_deref(),
      Field::AuthorLastName => record.author.last_name.as_deref(),
    }
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.path())
  }
}
