//! A search service that owns one swappable backend.

use crate::adapters::{
  settle_init, settle_search, BackendKind, FuseAdapter, MiniSearchAdapter, SearchAdapter,
};
use crate::error::{InitError, InitResult, QueryResult};
use crate::options::{FuzzyOptions, IndexOptions};
use crate::types::{Record, SearchResult};
use serde::{Deserialize, Serialize};

/// Object-safe view of a [`SearchAdapter`] whose hits are converted to
/// [`SearchResult`].
trait Backend: Send + Sync {
  fn kind(&self) -> BackendKind;
  fn is_initialized(&self) -> bool;
  fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize>;
  fn try_search(&self, query: &str) -> QueryResult<Vec<SearchResult>>;
}

impl<A: SearchAdapter> Backend for A {
  fn kind(&self) -> BackendKind {
    SearchAdapter::kind(self)
  }

  fn is_initialized(&self) -> bool {
    SearchAdapter::is_initialized(self)
  }

  fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize> {
    SearchAdapter::try_initialize(self, records)
  }

  fn try_search(&self, query: &str) -> QueryResult<Vec<SearchResult>> {
    let hits = SearchAdapter::try_search(self, query)?;
    Ok(hits.into_iter().map(Into::into).collect())
  }
}

fn default_backend() -> BackendKind {
  BackendKind::Fuse
}

fn default_fuse_options() -> FuzzyOptions {
  FuseAdapter::new().options().clone()
}

fn default_minisearch_options() -> IndexOptions {
  MiniSearchAdapter::new().options().clone()
}

/// Service configuration, loadable from JSON.
///
/// Missing sections fall back to the adapters' default configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
  /// Which backend serves queries.
  #[serde(default = "default_backend")]
  pub backend: BackendKind,
  #[serde(default = "default_fuse_options")]
  pub fuse: FuzzyOptions,
  #[serde(default = "default_minisearch_options")]
  pub minisearch: IndexOptions,
}

impl Default for ServiceConfig {
  fn default() -> Self {
    Self {
      backend: default_backend(),
      fuse: default_fuse_options(),
      minisearch: default_minisearch_options(),
    }
  }
}

impl ServiceConfig {
  /// Parses a configuration from JSON text.
  pub fn from_json(json: &str) -> InitResult<Self> {
    Ok(serde_json::from_str(json)?)
  }
}

/// Owns one search backend and exposes the shared calling convention.
///
/// Call sites only ever see [`SearchResult`]s, so the backend can be changed
/// through configuration or [`SearchService::swap`] without touching them.
///
/// # Examples
///
/// ```rust
/// use swapsearch::prelude::*;
///
/// let config = ServiceConfig::from_json(r#"{ "backend": "minisearch" }"#).unwrap();
/// let mut service = SearchService::from_config(&config).unwrap();
///
/// service.initialize_json(r#"[
///   { "title": "The Hobbit", "author": { "firstName": "J.R.R.", "lastName": "Tolkien" } }
/// ]"#);
///
/// let results = service.search("hobbit");
/// assert_eq!(results.len(), 1);
/// assert_eq!(results[0].ref_index, RecordId::Number(0));
/// ```
pub struct SearchService {
  backend: Box<dyn Backend>,
}

impl SearchService {
  /// Creates a new `SearchServiceBuilder`.
  pub fn builder() -> SearchServiceBuilder {
    SearchServiceBuilder::new()
  }

  /// Creates a service for the configured backend.
  ///
  /// Fails for [`BackendKind::Custom`], which has no configuration of its
  /// own; use [`SearchServiceBuilder::with`] for custom adapters.
  pub fn from_config(config: &ServiceConfig) -> InitResult<Self> {
    let builder = match config.backend {
      BackendKind::Fuse => Self::builder().fuse(config.fuse.clone()),
      BackendKind::MiniSearch => Self::builder().minisearch(config.minisearch.clone()),
      BackendKind::Custom => {
        return Err(InitError::InvalidOptions(
          "custom backends must be supplied as adapters".into(),
        ))
      }
    };
    Ok(builder.build())
  }

  /// The kind of the active backend.
  pub fn backend(&self) -> BackendKind {
    self.backend.kind()
  }

  pub fn is_initialized(&self) -> bool {
    self.backend.is_initialized()
  }

  /// Replaces the active backend. The new backend starts with whatever index
  /// it already holds.
  pub fn swap<A: SearchAdapter + 'static>(&mut self, adapter: A) {
    tracing::info!(from = %self.backend(), to = %SearchAdapter::kind(&adapter), "swapping search backend");
    self.backend = Box::new(adapter);
  }

  /// Builds a new index, replacing the current one on success.
  pub fn try_initialize(&mut self, records: Vec<Record>) -> InitResult<usize> {
    self.backend.try_initialize(records)
  }

  /// Decodes a JSON array of records and builds a new index from it.
  pub fn try_initialize_json(&mut self, json: &str) -> InitResult<usize> {
    let records: Vec<Record> = serde_json::from_str(json)?;
    self.try_initialize(records)
  }

  /// Builds a new index, logging failures. Returns whether it succeeded.
  pub fn initialize(&mut self, records: Vec<Record>) -> bool {
    let result = self.try_initialize(records);
    settle_init(self.backend(), result)
  }

  /// Like [`SearchService::initialize`], from a JSON array of records.
  pub fn initialize_json(&mut self, json: &str) -> bool {
    let result = self.try_initialize_json(json);
    settle_init(self.backend(), result)
  }

  /// Runs a query against the active backend.
  pub fn try_search(&self, query: &str) -> QueryResult<Vec<SearchResult>> {
    self.backend.try_search(query)
  }

  /// Runs a query, returning no results on any failure.
  pub fn search(&self, query: &str) -> Vec<SearchResult> {
    settle_search(self.backend(), query, self.try_search(query))
  }
}

/// A builder for creating `SearchService` instances.
///
/// Without an explicit backend, the service uses a [`FuseAdapter`] with its
/// default configuration.
#[derive(Default)]
pub struct SearchServiceBuilder {
  backend: Option<Box<dyn Backend>>,
}

impl SearchServiceBuilder {
  /// Creates a new, empty `SearchServiceBuilder`.
  pub fn new() -> Self {
    Self { backend: None }
  }

  /// Uses any adapter as the backend.
  pub fn with<A: SearchAdapter + 'static>(mut self, adapter: A) -> Self {
    self.backend = Some(Box::new(adapter));
    self
  }

  /// Uses a fuzzy backend with the given options.
  pub fn fuse(self, options: FuzzyOptions) -> Self {
    self.with(FuseAdapter::with_options(options))
  }

  /// Uses an inverted-index backend with the given options.
  pub fn minisearch(self, options: IndexOptions) -> Self {
    self.with(MiniSearchAdapter::with_options(options))
  }

  /// Builds the `SearchService`.
  pub fn build(self) -> SearchService {
    SearchService {
      backend: self
        .backend
        .unwrap_or_else(|| Box::new(FuseAdapter::new())),
    }
  }
}
