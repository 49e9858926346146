//! Defines the extension system for the query integration.

use crate::query::QueryInstance;
use crate::types::{PostTypeFilter, RealizedRecord, ReturnField, SearchEnvelope, SearchScope};

/// A trait for extensions that hook into the diversion lifecycle.
///
/// Every method has a pass-through default, so an extension only implements
/// the hooks it cares about. When several extensions are registered, filters
/// run in registration order with each one receiving the previous one's
/// output, and a query is skipped if any extension vetoes it.
///
/// # Examples
///
/// Keeping admin listings on the database:
///
/// ```rust
/// use querybridge::prelude::*;
///
/// struct SkipDrafts;
///
/// impl IntegrationExtension for SkipDrafts {
///     fn skip_query_integration(&self, query: &QueryInstance) -> bool {
///         query.query_vars.extra.get("post_status")
///             == Some(&serde_json::Value::from("draft"))
///     }
/// }
/// ```
pub trait IntegrationExtension {
  /// Vetoes diversion for a specific query.
  ///
  /// Consulted on every hook, so the answer may depend on where the platform
  /// is in its request.
  fn skip_query_integration(&self, _query: &QueryInstance) -> bool {
    false
  }

  /// Overrides the post type constraint before it is resolved.
  ///
  /// Returning `any` removes the constraint entirely.
  fn override_post_type(
    &self,
    post_type: Option<PostTypeFilter>,
    _query: &QueryInstance,
  ) -> Option<PostTypeFilter> {
    post_type
  }

  /// Overrides the tenant scope of the search.
  fn override_search_scope(&self, scope: SearchScope) -> SearchScope {
    scope
  }

  /// Overrides the fields copied into full records.
  fn override_return_fields(&self, fields: Vec<ReturnField>) -> Vec<ReturnField> {
    fields
  }

  /// Supplies already realized records for a query.
  ///
  /// A non-empty result replaces the backend call for this query.
  fn cached_records(&self, _query: &QueryInstance) -> Vec<RealizedRecord> {
    Vec::new()
  }

  /// Called when a query resolved to no post types and was answered empty.
  fn on_empty_result(&self, _query: &QueryInstance) {}

  /// Called after the backend was actually queried.
  fn on_non_cached_search(
    &self,
    _records: &[RealizedRecord],
    _envelope: &SearchEnvelope,
    _query: &QueryInstance,
  ) {
  }

  /// Called after every successful diversion. `envelope` is `None` when the
  /// records came from `cached_records`.
  fn on_search(
    &self,
    _records: &[RealizedRecord],
    _envelope: Option<&SearchEnvelope>,
    _query: &QueryInstance,
  ) {
  }
}
