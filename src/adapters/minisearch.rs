use crate::adapters::{check_query, BackendKind, SearchAdapter};
use crate::error::{InitResult, QueryResult, SearchError};
use crate::field::Field;
use crate::options::{CombineWith, IndexOptions, SearchOptions};
use crate::searchers::{IndexHit, InvertedIndex};
use crate::types::{Record, RecordId, SearchResult};

/// Adapter over [`InvertedIndex`] that reshapes hits into the fuzzy
/// backend's result format.
///
/// Native scores grow with relevance, so they are reported as
/// `1 - native_score` to match the "lower is better" direction of
/// [`FuseAdapter`](crate::adapters::FuseAdapter).
#[derive(Debug, Clone)]
pub struct MiniSearchAdapter {
  options: IndexOptions,
  index: Option<InvertedIndex>,
}

impl Default for MiniSearchAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl MiniSearchAdapter {
  /// Creates an uninitialized adapter with the default configuration: title
  /// boosted 2x, fuzzy 0.2, prefix matching, every term required.
  pub fn new() -> Self {
    let search = SearchOptions::default()
      .boost(Field::Title, 2.0)
      .fuzzy(0.2)
      .prefix(true)
      .combine_with(CombineWith::And);

    Self::with_options(IndexOptions::default().search_options(search))
  }

  /// Creates an uninitialized adapter with custom options.
  pub fn with_options(options: IndexOptions) -> Self {
    Self {
      options,
      index: None,
    }
  }

  pub fn options(&self) -> &IndexOptions {
    &self.options
  }

  /// The current index, if one has been built.
  pub fn index(&self) -> Option<&InvertedIndex> {
    self.index.as_ref()
  }

  /// The id a record is indexed under: its own id, else its input position.
  pub fn assign_id(position: usize, record: &Record) -> RecordId {
    record
      .id
      .clone()
      .unwrap_or_else(|| RecordId::from(position))
  }

  fn to_result(hit: IndexHit) -> SearchResult {
    SearchResult {
      item: hit.stored,
      ref_index: hit.id,
      score: 1.0 - hit.score,
      matches: Vec::new(),
    }
  }
}

impl SearchAdapter for MiniSearchAdapter {
  type Hit = SearchResult;

  fn kind(&self) -> BackendKind {
    BackendKind::MiniSearch
  }

  fn is_initialized(&self) -> bool {
    self.index.is_some()
  }

  fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize> {
    let mut index = InvertedIndex::new(self.options.clone())?;
    index.add_all(
      records
        .iter()
        .enumerate()
        .map(|(position, record)| (Self::assign_id(position, record), record)),
    )?;

    let count = index.len();
    tracing::debug!(
      records = count,
      terms = index.term_count(),
      "inverted index built"
    );
    self.index = Some(index);
    Ok(count)
  }

  fn try_search(&self, query: &str) -> QueryResult<Vec<SearchResult>> {
    let index = self.index.as_ref().ok_or(SearchError::NotInitialized)?;
    check_query(query)?;

    let hits = index.search_with(query, &self.options.search_options)?;
    tracing::debug!(query, hits = hits.len(), "inverted index search finished");

    Ok(hits.into_iter().map(Self::to_result).collect())
  }
}
