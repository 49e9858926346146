//! The platform query object the engine borrows and annotates.

use crate::types::{FieldShape, PostTypeFilter, SearchScope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Engine-assigned identity of one query, used as the Identity Cache key.
///
/// The id is generated when a query is first diverted and stored on the
/// query itself, so every later hook for the same query finds the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
  /// Generates a fresh random id.
  pub fn new() -> Self {
    Self(Uuid::new_v4())
  }
}

impl Default for CorrelationId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for CorrelationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

fn default_posts_per_page() -> i64 {
  10
}

fn default_paged() -> u64 {
  1
}

/// Query variables, the platform's description of what to fetch.
///
/// Variables the engine does not interpret are kept in `extra` and handed to
/// the backend's argument formatter untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVars {
  /// Requested post type(s). `None` means unset.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub post_type: Option<PostTypeFilter>,
  /// Free-text search term.
  #[serde(default, rename = "s", skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  /// Explicit tenant scope.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sites: Option<SearchScope>,
  /// Page size. Zero or negative means everything on one page.
  #[serde(default = "default_posts_per_page")]
  pub posts_per_page: i64,
  #[serde(default = "default_paged")]
  pub paged: u64,
  /// Requested record shape.
  #[serde(default)]
  pub fields: FieldShape,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub cache_results: Option<bool>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Default for QueryVars {
  fn default() -> Self {
    Self {
      post_type: None,
      search: None,
      sites: None,
      posts_per_page: default_posts_per_page(),
      paged: default_paged(),
      fields: FieldShape::default(),
      cache_results: None,
      extra: Map::new(),
    }
  }
}

impl QueryVars {
  /// Creates a new `QueryVarsBuilder`.
  pub fn builder() -> QueryVarsBuilder {
    QueryVarsBuilder::default()
  }

  /// The search term, if one is set and non-empty.
  pub fn search_term(&self) -> Option<&str> {
    self.search.as_deref().filter(|s| !s.is_empty())
  }
}

/// A builder for `QueryVars`.
#[derive(Debug, Default)]
pub struct QueryVarsBuilder {
  vars: QueryVars,
}

impl QueryVarsBuilder {
  /// Restricts the query to a single post type.
  pub fn post_type(mut self, name: impl Into<String>) -> Self {
    self.vars.post_type = Some(PostTypeFilter::One(name.into()));
    self
  }

  /// Restricts the query to a set of post types.
  pub fn post_types<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.vars.post_type = Some(PostTypeFilter::Many(names.into_iter().map(Into::into).collect()));
    self
  }

  pub fn search(mut self, term: impl Into<String>) -> Self {
    self.vars.search = Some(term.into());
    self
  }

  pub fn sites(mut self, scope: SearchScope) -> Self {
    self.vars.sites = Some(scope);
    self
  }

  pub fn posts_per_page(mut self, n: i64) -> Self {
    self.vars.posts_per_page = n;
    self
  }

  pub fn paged(mut self, page: u64) -> Self {
    self.vars.paged = page;
    self
  }

  pub fn fields(mut self, shape: FieldShape) -> Self {
    self.vars.fields = shape;
    self
  }

  pub fn cache_results(mut self, cache: bool) -> Self {
    self.vars.cache_results = Some(cache);
    self
  }

  /// Sets an uninterpreted variable.
  pub fn var(mut self, key: impl Into<String>, value: Value) -> Self {
    self.vars.extra.insert(key.into(), value);
    self
  }

  pub fn build(self) -> QueryVars {
    self.vars
  }
}

/// One platform query, as seen by the engine.
///
/// The platform owns this object; the engine reads its variables and writes
/// the output slots (`found_posts`, `max_num_pages`, `elasticsearch_success`)
/// plus the correlation id it uses to find cached results again.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInstance {
  /// The variables exactly as the caller passed them.
  pub query: QueryVars,
  /// The parsed variables the platform works with. Hooks may change these.
  pub query_vars: QueryVars,
  /// Total matches, across all pages.
  pub found_posts: u64,
  pub max_num_pages: u64,
  /// `Some(false)` once a search failed and the query fell back to the database.
  pub elasticsearch_success: Option<bool>,
  correlation_id: Option<CorrelationId>,
}

impl QueryInstance {
  /// Creates a query whose parsed variables start as a copy of the request.
  pub fn new(vars: QueryVars) -> Self {
    Self {
      query: vars.clone(),
      query_vars: vars,
      found_posts: 0,
      max_num_pages: 0,
      elasticsearch_success: None,
      correlation_id: None,
    }
  }

  /// The shape requested through the `fields` variable.
  pub fn fields(&self) -> FieldShape {
    self.query_vars.fields
  }

  /// The id under which the engine cached this query's results, if any.
  pub fn correlation_id(&self) -> Option<CorrelationId> {
    self.correlation_id
  }

  /// Returns the query's correlation id, assigning one on first use.
  pub(crate) fn ensure_correlation_id(&mut self) -> CorrelationId {
    *self.correlation_id.get_or_insert_with(CorrelationId::new)
  }

  /// Returns `true` if a search was attempted and failed.
  pub fn search_failed(&self) -> bool {
    self.elasticsearch_success == Some(false)
  }
}
