//! Decides whether a query is diverted.

use crate::backend::SearchBackend;
use crate::extension::IntegrationExtension;
use crate::query::QueryInstance;

/// A query is eligible when the backend has search enabled for it and no
/// extension vetoes it.
///
/// Not memoised: extensions may answer differently at different hooks.
pub fn is_eligible(
  backend: &dyn SearchBackend,
  extensions: &[Box<dyn IntegrationExtension>],
  query: &QueryInstance,
) -> bool {
  backend.elasticpress_enabled(query)
    && !extensions
      .iter()
      .any(|ext| ext.skip_query_integration(query))
}
