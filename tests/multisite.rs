mod common;

use common::*;
use querybridge::prelude::*;
use serde_json::json;
use std::rc::Rc;

fn network_hits() -> SearchEnvelope {
  envelope(
    3,
    json!([
      { "post_id": 1, "site_id": 1 },
      { "post_id": 2, "site_id": 2 },
      { "post_id": 3, "site_id": 3 }
    ]),
  )
}

fn setup(backend: &Rc<MockBackend>) -> (Rc<Network>, Rc<QueryIntegration>) {
  let network = Network::new(1);
  let integration = Rc::new(
    QueryIntegration::builder(backend.clone())
      .tenants(network.clone())
      .build(),
  );
  *network.integration.borrow_mut() = Rc::downgrade(&integration);
  (network, integration)
}

fn diverted(integration: &QueryIntegration) -> (QueryInstance, Vec<RealizedRecord>) {
  let mut query = QueryInstance::new(QueryVars::builder().sites(SearchScope::All).build());
  integration.filter_posts_request(NATIVE_REQUEST.to_string(), &mut query);
  let posts = integration.filter_the_posts(Vec::new(), &query);
  (query, posts)
}

#[test]
fn test_loop_follows_origin_tenant() {
  let backend = MockBackend::new(Some(network_hits()));
  let (network, integration) = setup(&backend);
  let (query, posts) = diverted(&integration);

  integration.loop_start(&query);
  assert_eq!(integration.loop_state(), LoopState::InLoop(1));

  let mut visited = Vec::new();
  for post in &posts {
    integration.the_post(post);
    visited.push(network.current_tenant_id());
  }
  assert_eq!(visited, vec![1, 2, 3]);

  // Setup ran once per switch, each time under the new tenant, and the
  // re-entrant visit from inside setup did not switch again.
  assert_eq!(*network.setups.borrow(), vec![(2, 2), (3, 3)]);
  assert_eq!(*network.switches.borrow(), vec![2, 3]);

  integration.loop_end(&query);
  assert_eq!(integration.loop_state(), LoopState::Idle);
  assert_eq!(network.current_tenant_id(), 1);
  assert!(!network.is_switched());
}

#[test]
fn test_no_switch_outside_a_loop() {
  let backend = MockBackend::new(Some(network_hits()));
  let (network, integration) = setup(&backend);
  let (_query, posts) = diverted(&integration);

  for post in &posts {
    integration.the_post(post);
  }

  assert_eq!(network.current_tenant_id(), 1);
  assert!(network.switches.borrow().is_empty());
}

#[test]
fn test_no_switch_for_ineligible_loop() {
  let backend = MockBackend::new(Some(network_hits()));
  let (network, integration) = setup(&backend);
  let (query, posts) = diverted(&integration);

  backend.enabled.set(false);
  integration.loop_start(&query);
  for post in &posts {
    integration.the_post(post);
  }
  integration.loop_end(&query);

  assert!(network.switches.borrow().is_empty());
}

#[test]
fn test_nested_loop_keeps_tenant_until_outer_end() {
  let backend = MockBackend::new(Some(network_hits()));
  let (network, integration) = setup(&backend);
  let (outer, posts) = diverted(&integration);
  let (inner, inner_posts) = diverted(&integration);

  integration.loop_start(&outer);
  integration.the_post(&posts[1]);
  assert_eq!(network.current_tenant_id(), 2);

  integration.loop_start(&inner);
  integration.the_post(&inner_posts[2]);
  assert_eq!(network.current_tenant_id(), 3);
  integration.loop_end(&inner);
  assert_eq!(network.current_tenant_id(), 3);

  integration.loop_end(&outer);
  assert_eq!(network.current_tenant_id(), 1);
}

#[test]
fn test_partial_records_never_switch() {
  let backend = MockBackend::new(Some(network_hits()));
  let (network, integration) = setup(&backend);

  let mut query = QueryInstance::new(QueryVars::builder().fields(FieldShape::Ids).build());
  integration.filter_posts_request(NATIVE_REQUEST.to_string(), &mut query);

  integration.loop_start(&query);
  for post in integration.filter_the_posts(Vec::new(), &query) {
    integration.the_post(&post);
  }
  integration.loop_end(&query);

  assert!(network.switches.borrow().is_empty());
}

#[test]
fn test_records_default_to_the_searching_tenant() {
  let backend = MockBackend::new(Some(envelope(1, json!([{ "post_id": 8 }]))));
  let (network, integration) = setup(&backend);
  network.active.set(5);

  let (_query, posts) = diverted(&integration);
  assert_eq!(posts[0].site_id(), Some(5));
}
