//! End-to-end composition of two positions fetched over HTTP.

use crate::integration::test_utils::{clients, RecordingTracer, StubTransport};
use composer::page::fragment;
use composer::provider::{content_from, content_from_template, with_single};
use composer::tracer::NoOpTracer;
use composer::{Availability, Parameters, Plan, Position, TraceEvent, Tracer};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn x() -> Position {
    Position::new("X")
}

fn y() -> Position {
    Position::new("Y")
}

fn noop() -> Arc<dyn Tracer> {
    Arc::new(NoOpTracer)
}

#[tokio::test]
async fn test_both_positions_available() {
    let transport = StubTransport::new();
    transport
        .respond("/x", 200, "Hello")
        .respond("/y", 200, "World");
    let clients = clients(&transport);

    let plan = Plan::consists_of(vec![
        fragment("X", content_from(clients.get_default(), "/x", "text/plain")),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;

    assert_eq!(contents.len(), 2);
    assert_eq!(contents.get(&x()).body(), "Hello");
    assert_eq!(contents.get(&y()).body(), "World");
    assert_eq!(contents.get(&x()).source(), "/x");
}

#[tokio::test]
async fn test_slow_fragments_run_concurrently_and_are_awaited() {
    let transport = StubTransport::new();
    transport
        .respond_after("/x", 200, "Hello", Duration::from_millis(200))
        .respond_after("/y", 200, "World", Duration::from_millis(200));
    let clients = clients(&transport);

    let plan = Plan::consists_of(vec![
        fragment("X", content_from(clients.get_default(), "/x", "text/plain")),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();
    let started = Instant::now();
    let contents = plan.execute(&Parameters::empty(), noop()).await;
    let elapsed = started.elapsed();

    assert_eq!(contents.len(), 2);
    assert_eq!(contents.get(&x()).body(), "Hello");
    assert_eq!(contents.get(&y()).body(), "World");
    assert!(elapsed >= Duration::from_millis(200), "returned after {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(350), "took {:?}", elapsed);
}

#[tokio::test]
async fn test_empty_body_is_dropped() {
    let transport = StubTransport::new();
    transport.respond("/x", 200, "").respond("/y", 200, "World");
    let clients = clients(&transport);

    let plan = Plan::consists_of(vec![
        fragment("X", content_from(clients.get_default(), "/x", "text/plain")),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;

    assert_eq!(contents.len(), 1);
    assert!(!contents.get(&x()).has_content());
    assert_eq!(contents.get(&x()).availability(), Availability::Empty);
    assert_eq!(contents.get(&x()).source(), "X");
    assert_eq!(contents.get(&y()).body(), "World");
    assert_eq!(transport.calls("/x"), 1);
}

#[tokio::test]
async fn test_server_error_leaves_position_absent() {
    let transport = StubTransport::new();
    transport
        .respond("/x", 500, "Some Server Error")
        .respond("/y", 200, "World");
    let clients = clients(&transport);
    let tracer = RecordingTracer::new();

    let plan = Plan::consists_of(vec![
        fragment("X", content_from(clients.get_default(), "/x", "text/plain")),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), tracer.clone()).await;

    assert!(contents.find(&x()).is_none());
    assert_eq!(contents.get(&y()).body(), "World");
    // singleRetry: one retry before giving up
    assert_eq!(transport.calls("/x"), 2);
    let errors = tracer.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].position(), &x());
    assert_eq!(errors[0].source(), "/x");
}

#[tokio::test]
async fn test_unresolvable_target_leaves_position_absent() {
    let transport = StubTransport::new();
    transport.respond("/y", 200, "World");
    let clients = clients(&transport);

    let plan = Plan::consists_of(vec![
        fragment(
            "X",
            content_from(clients.get_by("noResiliency").unwrap(), "INVALID_URL", "text/plain"),
        ),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;

    assert_eq!(contents.len(), 1);
    assert!(!contents.get(&x()).has_content());
    assert_eq!(contents.get(&y()).body(), "World");
}

#[tokio::test]
async fn test_missing_template_variable_fails_before_request() {
    let transport = StubTransport::new();
    transport
        .respond("/products/42", 200, "Product 42")
        .respond("/y", 200, "World");
    let clients = clients(&transport);
    let tracer = RecordingTracer::new();

    let plan = Plan::consists_of(vec![
        fragment(
            "X",
            content_from_template(clients.get_default(), "/products/{id}", "text/plain").unwrap(),
        ),
        fragment("Y", content_from(clients.get_default(), "/y", "text/plain")),
    ])
    .unwrap();

    let contents = plan.execute(&Parameters::empty(), tracer.clone()).await;
    assert!(contents.find(&x()).is_none());
    assert_eq!(transport.calls("/products/42"), 0);
    assert_eq!(transport.total_calls(), 1);
    assert_eq!(tracer.errors().len(), 1);

    let contents = plan
        .execute(&Parameters::from_pairs([("id", "42")]), tracer.clone())
        .await;
    assert_eq!(contents.get(&x()).body(), "Product 42");
}

#[tokio::test]
async fn test_fetch_events_are_traced() {
    let transport = StubTransport::new();
    transport.respond("/x", 200, "Hello");
    let clients = clients(&transport);
    let tracer = RecordingTracer::new();

    let plan = Plan::consists_of(vec![fragment(
        "X",
        with_single(content_from(clients.get_default(), "/x", "text/plain")),
    )])
    .unwrap();
    plan.execute(&Parameters::empty(), tracer.clone()).await;

    assert_eq!(
        tracer.events(),
        vec![
            TraceEvent::fetch_started(&x(), "/x"),
            TraceEvent::fetch_completed(&x(), "/x", Availability::Available),
        ]
    );
}

#[tokio::test]
async fn test_empty_plan_yields_empty_contents() {
    let plan = Plan::consists_of(Vec::new()).unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;
    assert!(contents.is_empty());
    assert_eq!(contents.get(&x()).availability(), Availability::Empty);
}
