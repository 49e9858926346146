//! The query integration that diverts platform queries to the search backend.

use crate::backend::{NoHeaders, ResponseHeaders, SearchBackend, SingleTenant, TenantDirectory};
use crate::cache::IdentityCache;
use crate::config::IntegrationConfig;
use crate::extension::IntegrationExtension;
use crate::format::{format_hits, reshape_cached};
use crate::gate;
use crate::query::QueryInstance;
use crate::tenant::{LoopState, TenantSwitcher};
use crate::types::{FieldShape, PostTypeFilter, RealizedRecord, SearchEnvelope};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

/// Diverts platform queries to an external search backend.
///
/// One `QueryIntegration` serves one request. The platform calls its hook
/// methods at the matching points of its query pipeline:
///
/// 1.  **`pre_get_posts`**: query setup. Disables result caching and
///     announces the diversion in a response header.
/// 2.  **`filter_posts_request`**: native query construction. Runs the
///     search, stamps totals onto the query, caches the realized records and
///     returns a native query that yields no rows.
/// 3.  **`posts_fields`**: pre-query short circuit for `ids` and
///     `id=>parent` queries.
/// 4.  **`filter_found_posts_query`**: count query construction. Blanks the
///     native row count, the totals are already on the query.
/// 5.  **`filter_the_posts`**: final results. Swaps in the cached records.
/// 6.  **`loop_start`** / **`the_post`** / **`loop_end`**: result iteration.
///     Follows each record's origin tenant in multi-tenant deployments.
///
/// Every hook first checks eligibility and hands the platform's own value
/// back untouched when the query is not diverted. A failed search makes the
/// query fall back to the database transparently.
///
/// Create one with [`QueryIntegration::builder`].
pub struct QueryIntegration {
  backend: Rc<dyn SearchBackend>,
  tenants: Rc<dyn TenantDirectory>,
  headers: Rc<dyn ResponseHeaders>,
  extensions: Vec<Box<dyn IntegrationExtension>>,
  config: IntegrationConfig,
  /// `false` while the backend is indexing; every hook then passes through.
  active: bool,
  cache: RefCell<IdentityCache>,
  switcher: TenantSwitcher,
}

impl QueryIntegration {
  /// Creates a new `QueryIntegrationBuilder` around a search backend.
  pub fn builder(backend: Rc<dyn SearchBackend>) -> QueryIntegrationBuilder {
    QueryIntegrationBuilder::new(backend)
  }

  /// Whether the integration hooks do anything at all.
  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn config(&self) -> &IntegrationConfig {
    &self.config
  }

  /// Whether `query` is diverted. Re-evaluated on every call.
  pub fn is_eligible(&self, query: &QueryInstance) -> bool {
    self.active && gate::is_eligible(self.backend.as_ref(), &self.extensions, query)
  }

  /// Query setup hook.
  ///
  /// Result caching is off for diverted queries unless the caller asked for
  /// it explicitly in the original request.
  pub fn pre_get_posts(&self, query: &mut QueryInstance) {
    if !self.is_eligible(query) {
      return;
    }

    query.query_vars.cache_results = Some(query.query.cache_results == Some(true));

    let header = self.config.search_header.as_str();
    if !header.is_empty() && !self.headers.headers_sent() {
      self.headers.send_header(header, "true");
    }
  }

  /// Native query construction hook.
  ///
  /// Returns `request` unchanged when the query is not diverted or the search
  /// fails; otherwise returns a query that produces no rows.
  pub fn filter_posts_request(&self, request: String, query: &mut QueryInstance) -> String {
    if !self.is_eligible(query) || query.search_failed() {
      return request;
    }

    if let Some(id) = query.correlation_id() {
      if self.cache.borrow().contains(&id) {
        debug!(correlation_id = %id, "query already diverted, reusing cached records");
        return self.config.empty_request();
      }
    }

    let mut query_vars = query.query_vars.clone();
    let Some(post_type) = self.resolve_post_type(query) else {
      let id = query.ensure_correlation_id();
      self.cache.borrow_mut().insert(id, Vec::new());
      debug!(correlation_id = %id, "no post types to search, returning empty result");

      for ext in &self.extensions {
        ext.on_empty_result(query);
      }
      return self.config.empty_request();
    };
    query_vars.post_type = Some(post_type);

    let mut records = self
      .extensions
      .iter()
      .map(|ext| ext.cached_records(query))
      .find(|records| !records.is_empty())
      .unwrap_or_default();
    let mut envelope = None;

    if records.is_empty() {
      let scope = query_vars
        .sites
        .clone()
        .filter(|scope| !scope.is_empty())
        .unwrap_or_default();
      let args = self.backend.format_args(&query_vars);
      let scope = self
        .extensions
        .iter()
        .fold(scope, |scope, ext| ext.override_search_scope(scope));

      let found = match self.backend.query_es(&args, &query.query_vars, &scope) {
        Ok(found) => found,
        Err(err) => {
          warn!(error = %err, "search failed, falling back to the native query");
          query.elasticsearch_success = Some(false);
          return request;
        }
      };

      query.found_posts = found.found_documents;
      query.max_num_pages = page_count(found.found_documents, query.query_vars.posts_per_page);
      query.elasticsearch_success = Some(true);

      records = self.format(&found, query.fields());

      for ext in &self.extensions {
        ext.on_non_cached_search(&records, &found, query);
      }
      envelope = Some(found);
    }

    let id = query.ensure_correlation_id();
    self.cache.borrow_mut().insert(id, records.clone());
    debug!(
      correlation_id = %id,
      records = records.len(),
      found = query.found_posts,
      shape = ?query.fields(),
      "query diverted"
    );

    for ext in &self.extensions {
      ext.on_search(&records, envelope.as_ref(), query);
    }

    self.config.empty_request()
  }

  /// Count query construction hook.
  ///
  /// Diverted queries already carry their totals, so the count query is
  /// blanked out. Queries whose search failed keep the native count.
  pub fn filter_found_posts_query(&self, sql: String, query: &QueryInstance) -> String {
    if query.search_failed() || !self.is_eligible(query) {
      return sql;
    }

    String::new()
  }

  /// Pre-query short circuit hook.
  ///
  /// For `ids` and `id=>parent` queries the platform skips its own result
  /// handling when this returns `Some`, so the cached records go back here.
  /// They are returned as cached, in the shape realized at diversion time.
  pub fn posts_fields(
    &self,
    posts: Option<Vec<RealizedRecord>>,
    query: &QueryInstance,
  ) -> Option<Vec<RealizedRecord>> {
    if !self.is_eligible(query) {
      return posts;
    }

    let Some(cached) = self.cached_records(query) else {
      return posts;
    };

    let requested = query.fields();
    if !requested.is_partial() {
      return posts;
    }

    if let Some(realized) = cached.first().map(RealizedRecord::shape) {
      if realized != requested {
        debug!(?requested, ?realized, "returning cached records in their realized shape");
      }
    }

    Some(cached)
  }

  /// Final result hook. Replaces the native records with the cached ones.
  pub fn filter_the_posts(&self, posts: Vec<RealizedRecord>, query: &QueryInstance) -> Vec<RealizedRecord> {
    if !self.is_eligible(query) {
      return posts;
    }

    self.cached_records(query).unwrap_or(posts)
  }

  /// Result loop start hook.
  pub fn loop_start(&self, query: &QueryInstance) {
    self.switcher.loop_start(self.tenants.as_ref(), query);
  }

  /// Result loop end hook.
  pub fn loop_end(&self, query: &QueryInstance) {
    self
      .switcher
      .loop_end(self.tenants.as_ref(), query, |q| self.is_eligible(q));
  }

  /// Per-record advance hook.
  pub fn the_post(&self, record: &RealizedRecord) {
    self
      .switcher
      .visit_record(self.tenants.as_ref(), record, |q| self.is_eligible(q));
  }

  pub fn loop_state(&self) -> LoopState {
    self.switcher.state()
  }

  /// The records cached for `query`, if it was diverted.
  pub fn cached_records(&self, query: &QueryInstance) -> Option<Vec<RealizedRecord>> {
    let id = query.correlation_id()?;
    self.cache.borrow().get(&id).map(<[RealizedRecord]>::to_vec)
  }

  /// The records cached for `query`, narrowed to `shape` where possible.
  pub fn cached_records_as(&self, query: &QueryInstance, shape: FieldShape) -> Option<Vec<RealizedRecord>> {
    let id = query.correlation_id()?;
    self
      .cache
      .borrow()
      .get(&id)
      .map(|records| reshape_cached(records, shape))
  }

  /// Resolves the post types to search, or `None` when there are none.
  fn resolve_post_type(&self, query: &QueryInstance) -> Option<PostTypeFilter> {
    let post_type = self
      .extensions
      .iter()
      .fold(query.query_vars.post_type.clone(), |post_type, ext| {
        ext.override_post_type(post_type, query)
      })
      .filter(|post_type| !post_type.is_any() && !post_type.is_empty());

    let post_type = match post_type {
      Some(post_type) => post_type,
      None if query.query_vars.search_term().is_some() => {
        PostTypeFilter::Many(self.backend.searchable_post_types())
      }
      None => PostTypeFilter::One(self.config.default_post_type.clone()),
    };

    (!post_type.is_empty()).then_some(post_type)
  }

  fn format(&self, envelope: &SearchEnvelope, shape: FieldShape) -> Vec<RealizedRecord> {
    let fields = self
      .extensions
      .iter()
      .fold(self.config.return_fields.clone(), |fields, ext| {
        ext.override_return_fields(fields)
      });

    format_hits(
      &envelope.documents,
      shape,
      self.tenants.current_tenant_id(),
      &fields,
    )
  }
}

/// Number of result pages for `found` matches at `per_page` per page.
///
/// A page size of zero or less means everything is on a single page.
pub fn page_count(found: u64, per_page: i64) -> u64 {
  match u64::try_from(per_page) {
    Ok(per_page) if per_page > 0 => found.div_ceil(per_page),
    _ => u64::from(found > 0),
  }
}

/// A builder for creating `QueryIntegration` instances.
///
/// Only the search backend is required. Without further configuration the
/// integration runs single-tenant, drops response headers and uses
/// `IntegrationConfig::default()`.
///
/// # Examples
///
/// ```
/// use querybridge::prelude::*;
/// use std::rc::Rc;
///
/// struct Offline;
///
/// impl SearchBackend for Offline {
///     fn elasticpress_enabled(&self, _query: &QueryInstance) -> bool {
///         true
///     }
///
///     fn searchable_post_types(&self) -> Vec<String> {
///         vec!["post".into(), "page".into()]
///     }
///
///     fn format_args(&self, _query_vars: &QueryVars) -> FormattedArgs {
///         serde_json::json!({})
///     }
///
///     fn query_es(
///         &self,
///         _args: &FormattedArgs,
///         _query_vars: &QueryVars,
///         _scope: &SearchScope,
///     ) -> Result<SearchEnvelope, BackendError> {
///         Err(BackendError::Unavailable("offline".into()))
///     }
/// }
///
/// let integration = QueryIntegration::builder(Rc::new(Offline))
///     .tenants(Rc::new(SingleTenant::new(1)))
///     .build();
///
/// let mut query = QueryInstance::new(QueryVars::builder().search("rust").build());
/// let request = "SELECT * FROM wp_posts".to_string();
///
/// // The backend is down, so the platform keeps its own query.
/// assert_eq!(integration.filter_posts_request(request.clone(), &mut query), request);
/// assert!(query.search_failed());
/// ```
pub struct QueryIntegrationBuilder {
  backend: Rc<dyn SearchBackend>,
  tenants: Option<Rc<dyn TenantDirectory>>,
  headers: Option<Rc<dyn ResponseHeaders>>,
  extensions: Vec<Box<dyn IntegrationExtension>>,
  config: Option<IntegrationConfig>,
}

impl QueryIntegrationBuilder {
  pub fn new(backend: Rc<dyn SearchBackend>) -> Self {
    Self {
      backend,
      tenants: None,
      headers: None,
      extensions: Vec::new(),
      config: None,
    }
  }

  /// Sets the tenant directory. Defaults to `SingleTenant`.
  pub fn tenants(mut self, tenants: Rc<dyn TenantDirectory>) -> Self {
    self.tenants = Some(tenants);
    self
  }

  /// Sets where response headers go. Defaults to `NoHeaders`.
  pub fn headers(mut self, headers: Rc<dyn ResponseHeaders>) -> Self {
    self.headers = Some(headers);
    self
  }

  pub fn config(mut self, config: IntegrationConfig) -> Self {
    self.config = Some(config);
    self
  }

  /// Adds an extension. Extensions run in the order they are added.
  pub fn with_extension(mut self, extension: Box<dyn IntegrationExtension>) -> Self {
    self.extensions.push(extension);
    self
  }

  /// Builds the integration.
  ///
  /// If the backend is indexing at this point, the integration is built
  /// inactive and never diverts a query.
  pub fn build(self) -> QueryIntegration {
    let active = !self.backend.is_indexing();
    if !active {
      debug!("indexing in progress, query integration disabled");
    }

    QueryIntegration {
      backend: self.backend,
      tenants: self.tenants.unwrap_or_else(|| Rc::new(SingleTenant::default())),
      headers: self.headers.unwrap_or_else(|| Rc::new(NoHeaders)),
      extensions: self.extensions,
      config: self.config.unwrap_or_default(),
      active,
      cache: RefCell::new(IdentityCache::new()),
      switcher: TenantSwitcher::new(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_page_count() {
    assert_eq!(page_count(25, 10), 3);
    assert_eq!(page_count(20, 10), 2);
    assert_eq!(page_count(0, 10), 0);
    assert_eq!(page_count(1, 10), 1);
    assert_eq!(page_count(7, -1), 1);
    assert_eq!(page_count(0, -1), 0);
    assert_eq!(page_count(7, 0), 1);
  }
}
