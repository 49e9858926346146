#![allow(dead_code)]

use querybridge::prelude::*;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub const NATIVE_REQUEST: &str = "SELECT wp_posts.* FROM wp_posts WHERE 1=1 ORDER BY post_date DESC";
pub const EMPTY_REQUEST: &str = "SELECT * FROM wp_posts WHERE 1=0";

/// A search backend that answers with a canned envelope, or fails when none is set.
pub struct MockBackend {
  pub enabled: Cell<bool>,
  pub indexing: bool,
  pub searchable: Vec<String>,
  pub response: RefCell<Option<SearchEnvelope>>,
  pub calls: Cell<usize>,
  pub formatted: RefCell<Vec<QueryVars>>,
  pub scopes: RefCell<Vec<SearchScope>>,
}

impl MockBackend {
  pub fn new(response: Option<SearchEnvelope>) -> Rc<Self> {
    Rc::new(Self::plain(response))
  }

  pub fn plain(response: Option<SearchEnvelope>) -> Self {
    Self {
      enabled: Cell::new(true),
      indexing: false,
      searchable: vec!["post".into(), "page".into()],
      response: RefCell::new(response),
      calls: Cell::new(0),
      formatted: RefCell::new(Vec::new()),
      scopes: RefCell::new(Vec::new()),
    }
  }

  pub fn failing() -> Rc<Self> {
    Self::new(None)
  }

  pub fn last_formatted(&self) -> QueryVars {
    self.formatted.borrow().last().cloned().expect("format_args was not called")
  }
}

impl SearchBackend for MockBackend {
  fn elasticpress_enabled(&self, _query: &QueryInstance) -> bool {
    self.enabled.get()
  }

  fn is_indexing(&self) -> bool {
    self.indexing
  }

  fn searchable_post_types(&self) -> Vec<String> {
    self.searchable.clone()
  }

  fn format_args(&self, query_vars: &QueryVars) -> FormattedArgs {
    self.formatted.borrow_mut().push(query_vars.clone());
    json!({ "query": { "match_all": {} } })
  }

  fn query_es(
    &self,
    _args: &FormattedArgs,
    _query_vars: &QueryVars,
    scope: &SearchScope,
  ) -> Result<SearchEnvelope, BackendError> {
    self.calls.set(self.calls.get() + 1);
    self.scopes.borrow_mut().push(scope.clone());
    self
      .response
      .borrow()
      .clone()
      .ok_or_else(|| BackendError::Unavailable("connection refused".into()))
  }
}

/// Builds an envelope from raw hit payloads.
pub fn envelope(found: u64, hits: serde_json::Value) -> SearchEnvelope {
  SearchEnvelope {
    found_documents: found,
    documents: serde_json::from_value(hits).expect("valid hits"),
  }
}

/// A multi-site network with a stack of switched-from tenants.
pub struct Network {
  pub active: Cell<TenantId>,
  pub previous: RefCell<Vec<TenantId>>,
  pub switches: RefCell<Vec<TenantId>>,
  pub setups: RefCell<Vec<(EntityId, TenantId)>>,
  /// When set, per-record setup re-enters the integration like the platform does.
  pub integration: RefCell<Weak<QueryIntegration>>,
}

impl Network {
  pub fn new(home: TenantId) -> Rc<Self> {
    Rc::new(Self {
      active: Cell::new(home),
      previous: RefCell::new(Vec::new()),
      switches: RefCell::new(Vec::new()),
      setups: RefCell::new(Vec::new()),
      integration: RefCell::new(Weak::new()),
    })
  }
}

impl TenantDirectory for Network {
  fn is_multi_tenant(&self) -> bool {
    true
  }

  fn current_tenant_id(&self) -> TenantId {
    self.active.get()
  }

  fn switch_tenant(&self, id: TenantId) {
    self.previous.borrow_mut().push(self.active.get());
    self.switches.borrow_mut().push(id);
    self.active.set(id);
  }

  fn restore_tenant(&self) {
    if let Some(id) = self.previous.borrow_mut().pop() {
      self.active.set(id);
    }
  }

  fn is_switched(&self) -> bool {
    !self.previous.borrow().is_empty()
  }

  fn setup_record(&self, record: &FullRecord) {
    self.setups.borrow_mut().push((record.id, self.active.get()));

    let integration = self.integration.borrow().upgrade();
    if let Some(integration) = integration {
      integration.the_post(&RealizedRecord::Full(record.clone()));
    }
  }
}

#[derive(Default)]
pub struct RecordingHeaders {
  pub sent: Cell<bool>,
  pub headers: RefCell<Vec<(String, String)>>,
}

impl ResponseHeaders for RecordingHeaders {
  fn headers_sent(&self) -> bool {
    self.sent.get()
  }

  fn send_header(&self, name: &str, value: &str) {
    self.headers.borrow_mut().push((name.to_string(), value.to_string()));
  }
}
