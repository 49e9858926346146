//! Ports to the collaborators the engine calls out to.
//!
//! The search client, the tenant directory and the response writer all live
//! outside this crate. The engine only sees them through these traits.

use crate::error::BackendError;
use crate::query::{QueryInstance, QueryVars};
use crate::types::{FullRecord, SearchEnvelope, SearchScope, TenantId};
use serde_json::Value;

/// Backend-specific search arguments built from query variables.
pub type FormattedArgs = Value;

/// The search-index side of the integration.
pub trait SearchBackend {
  /// Whether search-backed querying is enabled for this query's entity type.
  fn elasticpress_enabled(&self, query: &QueryInstance) -> bool;

  /// Whether an indexing run is in progress. While it is, queries are
  /// never diverted.
  fn is_indexing(&self) -> bool {
    false
  }

  /// Post types that take part in free-text search.
  fn searchable_post_types(&self) -> Vec<String>;

  /// Translates (already resolved) query variables into search arguments.
  fn format_args(&self, query_vars: &QueryVars) -> FormattedArgs;

  /// Runs a search.
  ///
  /// `query_vars` are the query's own variables, before type resolution.
  /// An `Err` makes the engine fall back to the native database query.
  fn query_es(
    &self,
    args: &FormattedArgs,
    query_vars: &QueryVars,
    scope: &SearchScope,
  ) -> Result<SearchEnvelope, BackendError>;
}

/// The platform's tenant (site) directory.
///
/// Switching to a tenant that does not exist is a platform-level fault; the
/// engine does not guard against it.
pub trait TenantDirectory {
  fn is_multi_tenant(&self) -> bool;

  fn current_tenant_id(&self) -> TenantId;

  /// Makes `id` the active tenant, remembering the previous one.
  fn switch_tenant(&self, id: TenantId);

  /// Goes back to the tenant active before the last switch.
  fn restore_tenant(&self);

  /// Whether the active tenant is the result of a switch.
  fn is_switched(&self) -> bool;

  /// Runs the platform's per-record setup for `record` under the active tenant.
  fn setup_record(&self, record: &FullRecord);
}

/// Tenant directory for single-site deployments.
#[derive(Debug, Clone, Copy)]
pub struct SingleTenant {
  id: TenantId,
}

impl SingleTenant {
  pub fn new(id: TenantId) -> Self {
    Self { id }
  }
}

impl Default for SingleTenant {
  fn default() -> Self {
    Self::new(1)
  }
}

impl TenantDirectory for SingleTenant {
  fn is_multi_tenant(&self) -> bool {
    false
  }

  fn current_tenant_id(&self) -> TenantId {
    self.id
  }

  fn switch_tenant(&self, _id: TenantId) {}

  fn restore_tenant(&self) {}

  fn is_switched(&self) -> bool {
    false
  }

  fn setup_record(&self, _record: &FullRecord) {}
}

/// Where response headers go.
pub trait ResponseHeaders {
  /// Whether the response has started and headers can no longer be added.
  fn headers_sent(&self) -> bool;

  fn send_header(&self, name: &str, value: &str);
}

/// A header sink that drops everything, for contexts without an HTTP response.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHeaders;

impl ResponseHeaders for NoHeaders {
  fn headers_sent(&self) -> bool {
    true
  }

  fn send_header(&self, _name: &str, _value: &str) {}
}
