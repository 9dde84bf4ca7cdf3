//! Swapsearch - interchangeable search backends behind one calling convention.
//!
//! Two backends index the same record schema (`title`, `author.firstName`,
//! `author.lastName`):
//!
//! - [`FuseAdapter`](adapters::FuseAdapter): approximate matching of the whole
//!   query against each field, scored so that lower is better.
//! - [`MiniSearchAdapter`](adapters::MiniSearchAdapter): a tokenizing inverted
//!   index with prefix and fuzzy term expansion, reshaped into the same
//!   result format.
//!
//! A [`SearchService`](service::SearchService) owns one of them, chosen by
//! configuration, so hosts can switch backends without touching call sites.

pub mod adapters;
pub mod error;
pub mod field;
pub mod options;
pub mod searchers;
pub mod service;
pub mod types;

pub mod prelude {
  //! Convenient re-exports for common types and traits.

  pub use crate::adapters::*;
  pub use crate::error::*;
  pub use crate::field::*;
  pub use crate::options::*;
  pub use crate::service::*;
  pub use crate::types::*;
}
