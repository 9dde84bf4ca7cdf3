//! Error types for index construction and querying.
//!
//! The fail-soft entry points (`initialize`, `search`) log these and fall
//! back to a safe default. The `try_*` variants hand them to the caller so
//! "index not ready" can be told apart from "no matches".

use crate::types::RecordId;
use thiserror::Error;

/// Errors raised while building an index.
#[derive(Error, Debug)]
pub enum InitError {
  /// The input could not be decoded into records.
  #[error("malformed record list: {0}")]
  Malformed(#[from] serde_json::Error),

  /// The index options are unusable.
  #[error("invalid index options: {0}")]
  InvalidOptions(String),

  /// Two records share the same id.
  #[error("duplicate record id: {0}")]
  DuplicateId(RecordId),
}

/// Errors raised while answering a query.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
  /// No index has been built yet.
  #[error("search index not initialized")]
  NotInitialized,

  /// The query was empty or whitespace only.
  #[error("empty search query")]
  EmptyQuery,

  /// The backend failed while executing the query.
  #[error("search execution failed: {0}")]
  Internal(String),
}

/// Convenience alias for index construction results.
pub type InitResult<T> = Result<T, InitError>;

/// Convenience alias for query results.
pub type QueryResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    assert_eq!(
      SearchError::NotInitialized.to_string(),
      "search index not initialized"
    );
    assert_eq!(SearchError::EmptyQuery.to_string(), "empty search query");

    let err = InitError::DuplicateId(RecordId::Number(7));
    assert_eq!(err.to_string(), "duplicate record id: 7");

    let err = InitError::InvalidOptions("threshold must be within [0, 1]".into());
    assert!(err.to_string().contains("threshold"));
  }

  #[test]
  fn test_malformed_from_serde() {
    let parse = serde_json::from_str::<Vec<crate::types::Record>>("{not json");
    let err: InitError = parse.unwrap_err().into();
    assert!(matches!(err, InitError::Malformed(_)));
  }
}
