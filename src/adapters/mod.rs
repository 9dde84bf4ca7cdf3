//! Backend adapters sharing one calling convention.
//!
//! Each adapter owns at most one index, built by `initialize` and replaced
//! wholesale on every later call. Two flavors of every operation exist:
//!
//! - `try_initialize` / `try_search` report failures as
//!   [`InitError`](crate::error::InitError) and [`SearchError`], so
//!   callers can tell "not ready" from "no matches".
//! - `initialize` / `search` log failures and fall back to a safe default:
//!   the previous index stays in place, or the search returns no hits.
//!
//! # Example
//!
//! ```rust
//! use swapsearch::prelude::*;
//!
//! let books = vec![Record::new("The Hobbit", Author::new("J.R.R.", "Tolkien"))];
//!
//! let mut fuse = FuseAdapter::new();
//! fuse.initialize(books.clone());
//! assert_eq!(fuse.search("Hobbit").len(), 1);
//!
//! let mut mini = MiniSearchAdapter::new();
//! mini.initialize(books);
//! assert_eq!(mini.search("Hobbit").len(), 1);
//! ```

use crate::error::{InitResult, QueryResult, SearchError};
use crate::types::{Record, SearchResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fuzzy-matching adapter returning native hits.
pub mod fuse;
/// Inverted-index adapter returning normalized results.
pub mod minisearch;

pub use fuse::FuseAdapter;
pub use minisearch::MiniSearchAdapter;

/// Identifies a search backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
  /// Score-threshold fuzzy matching over whole field values.
  Fuse,
  /// Tokenizing inverted index with prefix and fuzzy term expansion.
  MiniSearch,
  /// A user-defined adapter.
  Custom,
}

impl fmt::Display for BackendKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      BackendKind::Fuse => "fuse",
      BackendKind::MiniSearch => "minisearch",
      BackendKind::Custom => "custom",
    };
    f.write_str(name)
  }
}

/// The calling convention shared by every search backend.
///
/// Implementors supply the fallible `try_*` operations; the fail-soft
/// `initialize` and `search` are provided on top of them.
pub trait SearchAdapter: Send + Sync {
  /// The hit type returned by this backend. It must convert into the shared
  /// [`SearchResult`] shape so backends can be swapped.
  type Hit: Into<SearchResult>;

  /// Returns the kind of this backend.
  fn kind(&self) -> BackendKind;

  /// Whether an index has been built.
  fn is_initialized(&self) -> bool;

  /// Builds a new index from `records` and replaces the current one.
  ///
  /// On failure the current index, if any, is left untouched. Returns the
  /// number of indexed records.
  fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize>;

  /// Runs a query against the current index.
  fn try_search(&self, query: &str) -> QueryResult<Vec<Self::Hit>>;

  /// Builds a new index, logging instead of returning failures.
  fn initialize(&mut self, records: Vec<Record>) {
    let result = self.try_initialize(records);
    settle_init(self.kind(), result);
  }

  /// Runs a query, returning no hits when the index is missing, the query
  /// is blank, or the backend fails.
  fn search(&self, query: &str) -> Vec<Self::Hit> {
    settle_search(self.kind(), query, self.try_search(query))
  }
}

/// Logs the outcome of an index build. Returns whether it succeeded.
pub(crate) fn settle_init(kind: BackendKind, result: InitResult<usize>) -> bool {
  match result {
    Ok(count) => {
      tracing::info!(backend = %kind, records = count, "search index initialized");
      true
    }
    Err(e) => {
      tracing::error!(backend = %kind, error = %e, "failed to initialize search index");
      false
    }
  }
}

/// Collapses a search outcome to its hits, logging anything but a blank
/// query.
pub(crate) fn settle_search<T>(kind: BackendKind, query: &str, result: QueryResult<Vec<T>>) -> Vec<T> {
  match result {
    Ok(hits) => hits,
    Err(SearchError::EmptyQuery) => Vec::new(),
    Err(SearchError::NotInitialized) => {
      tracing::warn!(backend = %kind, "search called before initialization");
      Vec::new()
    }
    Err(e) => {
      tracing::error!(backend = %kind, query, error = %e, "search failed");
      Vec::new()
    }
  }
}

/// Rejects blank queries before they reach an index.
pub(crate) fn check_query(query: &str) -> QueryResult<()> {
  if query.trim().is_empty() {
    Err(SearchError::EmptyQuery)
  } else {
    Ok(())
  }
}
