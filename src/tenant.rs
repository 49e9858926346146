//! Tenant-context switching while the platform iterates diverted results.
//!
//! Records from a network-wide search can belong to any tenant. While the
//! platform walks such a result set, the active tenant has to follow the
//! record being visited, and has to be put back once the walk is over.
//! Switching is only allowed inside a loop the platform announced through
//! `loop_start`/`loop_end`; outside of one, records are left alone.

use crate::backend::TenantDirectory;
use crate::query::QueryInstance;
use crate::types::RealizedRecord;
use std::cell::{Cell, RefCell};
use tracing::trace;

/// Where the switcher is in the platform's iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
  Idle,
  /// Inside `n` nested loops.
  InLoop(usize),
}

/// Tracks nested result loops and switches tenants per visited record.
///
/// Uses interior mutability so the platform can re-enter `visit_record`
/// while a record's setup is being re-run; such nested visits are ignored.
///
/// Each loop keeps a snapshot of its query taken at `loop_start`. Eligibility
/// checks in `visit_record` see that snapshot, so changes the platform makes
/// to the query during iteration do not affect switching.
#[derive(Debug, Default)]
pub struct TenantSwitcher {
  stack: RefCell<Vec<QueryInstance>>,
  in_setup: Cell<bool>,
}

impl TenantSwitcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> LoopState {
    match self.stack.borrow().len() {
      0 => LoopState::Idle,
      depth => LoopState::InLoop(depth),
    }
  }

  /// Enters a loop over `query`'s results.
  pub fn loop_start(&self, directory: &dyn TenantDirectory, query: &QueryInstance) {
    if !directory.is_multi_tenant() {
      return;
    }

    self.stack.borrow_mut().push(query.clone());
  }

  /// Leaves the innermost loop. Leaving the outermost one restores the
  /// original tenant if a switch happened and `query` was diverted.
  pub fn loop_end<F>(&self, directory: &dyn TenantDirectory, query: &QueryInstance, eligible: F)
  where
    F: Fn(&QueryInstance) -> bool,
  {
    if !directory.is_multi_tenant() {
      return;
    }

    let depth = {
      let mut stack = self.stack.borrow_mut();
      if stack.pop().is_none() {
        return;
      }
      stack.len()
    };

    if depth == 0 && eligible(query) && directory.is_switched() {
      trace!("restoring tenant after result loop");
      directory.restore_tenant();
    }
  }

  /// Called for every record the platform advances to.
  pub fn visit_record<F>(&self, directory: &dyn TenantDirectory, record: &RealizedRecord, eligible: F)
  where
    F: Fn(&QueryInstance) -> bool,
  {
    if !directory.is_multi_tenant() || self.in_setup.get() {
      return;
    }

    let Some(top) = self.stack.borrow().last().cloned() else {
      return;
    };

    if !eligible(&top) {
      return;
    }

    let RealizedRecord::Full(full) = record else {
      return;
    };

    let current = directory.current_tenant_id();
    if full.site_id == 0 || full.site_id == current {
      return;
    }

    if directory.is_switched() {
      directory.restore_tenant();
    }

    trace!(from = current, to = full.site_id, record = full.id, "switching tenant");
    directory.switch_tenant(full.site_id);

    self.in_setup.set(true);
    directory.setup_record(full);
    self.in_setup.set(false);
  }
}
