//! Querybridge - divert a content platform's query pipeline to a search index.
//!
//! Querybridge sits on the platform's query hooks. For every eligible query it
//! suppresses the native database fetch, runs the search through an external
//! backend, caches the realized records against the query, and hands them back
//! in whatever shape the platform asks for. In multi-tenant deployments it also
//! follows each record's origin tenant while the platform iterates results.

pub mod backend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod extension;
pub mod format;
pub mod gate;
pub mod query;
pub mod tenant;
pub mod types;

pub mod prelude {
  //! Convenient re-exports for common types and traits.

  pub use crate::backend::*;
  pub use crate::cache::*;
  pub use crate::config::*;
  pub use crate::engine::*;
  pub use crate::error::*;
  pub use crate::extension::*;
  pub use crate::format::*;
  pub use crate::gate::*;
  pub use crate::query::*;
  pub use crate::tenant::*;
  pub use crate::types::*;
}
