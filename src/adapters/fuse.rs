use crate::adapters::{check_query, BackendKind, SearchAdapter};
use crate::error::{InitResult, QueryResult, SearchError};
use crate::options::FuzzyOptions;
use crate::searchers::FuzzyIndex;
use crate::types::{FuzzyHit, Record};

/// Threshold used by the default fuzzy configuration.
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Adapter over [`FuzzyIndex`].
///
/// Searches `title`, `author.firstName` and `author.lastName` with a
/// threshold of 0.3 and returns the index's native [`FuzzyHit`]s, scores and
/// match metadata included.
#[derive(Debug, Clone)]
pub struct FuseAdapter {
  options: FuzzyOptions,
  index: Option<FuzzyIndex>,
}

impl Default for FuseAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl FuseAdapter {
  /// Creates an uninitialized adapter with the default configuration.
  pub fn new() -> Self {
    Self::with_options(
      FuzzyOptions::default()
        .threshold(DEFAULT_THRESHOLD)
        .include_matches(true),
    )
  }

  /// Creates an uninitialized adapter with custom options.
  pub fn with_options(options: FuzzyOptions) -> Self {
    Self {
      options,
      index: None,
    }
  }

  pub fn options(&self) -> &FuzzyOptions {
    &self.options
  }

  /// The current index, if one has been built.
  pub fn index(&self) -> Option<&FuzzyIndex> {
    self.index.as_ref()
  }
}

impl SearchAdapter for FuseAdapter {
  type Hit = FuzzyHit<Record>;

  fn kind(&self) -> BackendKind {
    BackendKind::Fuse
  }

  fn is_initialized(&self) -> bool {
    self.index.is_some()
  }

  fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize> {
    let index = FuzzyIndex::new(records, self.options.clone())?;
    let count = index.len();
    self.index = Some(index);
    Ok(count)
  }

  fn try_search(&self, query: &str) -> QueryResult<Vec<FuzzyHit<Record>>> {
    let index = self.index.as_ref().ok_or(SearchError::NotInitialized)?;
    check_query(query)?;

    let hits = index.search(query)?;
    tracing::debug!(query, hits = hits.len(), "fuzzy search finished");
    Ok(hits)
  }
}
