//! Selection among several providers for one position.

use crate::integration::test_utils::{clients_with, StubTransport};
use composer::page::fragment;
use composer::provider::{content_from, with_all, with_first, with_quickest};
use composer::resilience::CircuitBreakerConfig;
use composer::tracer::NoOpTracer;
use composer::{ClientConfig, Content, Parameters, Plan, Position, Tracer};
use std::sync::Arc;
use std::time::Duration;

const FAST_TIMEOUT: &str = "fastTimeout";

fn noop() -> Arc<dyn Tracer> {
    Arc::new(NoOpTracer)
}

fn fast_timeout() -> ClientConfig {
    ClientConfig::resilient(
        FAST_TIMEOUT,
        0,
        Duration::from_millis(100),
        Duration::from_millis(200),
    )
}

#[tokio::test]
async fn test_priority_first_falls_through_timed_out_provider() {
    let transport = StubTransport::new();
    transport
        .respond_after("/x1", 200, "Too late", Duration::from_millis(300))
        .respond("/x2", 200, "World");
    let clients = clients_with(&transport, vec![fast_timeout()], CircuitBreakerConfig::default());
    let client = clients.get_by(FAST_TIMEOUT).unwrap();

    let plan = Plan::consists_of(vec![fragment(
        "X",
        with_first(vec![
            content_from(client, "/x1", "text/plain"),
            content_from(client, "/x2", "text/plain"),
        ]),
    )])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;

    assert_eq!(contents.get(&Position::new("X")).body(), "World");
    assert_eq!(contents.get(&Position::new("X")).source(), "/x2");
}

#[tokio::test]
async fn test_priority_first_skips_client_error_without_retry() {
    let transport = StubTransport::new();
    transport
        .respond("/x1", 404, "Not Found")
        .respond("/x2", 200, "World");
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let plan = Plan::consists_of(vec![fragment(
        "X",
        with_first(vec![
            content_from(clients.get_default(), "/x1", "text/plain"),
            content_from(clients.get_default(), "/x2", "text/plain"),
        ]),
    )])
    .unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;

    assert_eq!(contents.get(&Position::new("X")).body(), "World");
    assert_eq!(transport.calls("/x1"), 1);
}

#[tokio::test]
async fn test_priority_first_prefers_declared_order_over_arrival() {
    let transport = StubTransport::new();
    transport
        .respond_after("/first", 200, "First", Duration::from_millis(80))
        .respond("/second", 200, "Second");
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let provider = with_first(vec![
        content_from(clients.get_default(), "/first", "text/plain"),
        content_from(clients.get_default(), "/second", "text/plain"),
    ]);
    let content = provider
        .fetch(&Position::new("X"), &NoOpTracer, &Parameters::empty())
        .await
        .unwrap();

    assert_eq!(content.body(), "First");
    // both fetches were started concurrently
    assert_eq!(transport.calls("/second"), 1);
}

#[tokio::test]
async fn test_priority_first_yields_nothing_when_all_fail() {
    let transport = StubTransport::new();
    transport.respond("/a", 404, "").fail("/b", "connection refused");
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let provider = with_first(vec![
        content_from(clients.get_by("noRetries").unwrap(), "/a", "text/plain"),
        content_from(clients.get_by("noRetries").unwrap(), "/b", "text/plain"),
    ]);
    let content = provider
        .fetch(&Position::new("X"), &NoOpTracer, &Parameters::empty())
        .await;
    assert!(content.is_none());
}

#[tokio::test]
async fn test_quickest_returns_first_arrival() {
    let transport = StubTransport::new();
    transport
        .respond_after("/slow", 200, "Slow", Duration::from_millis(150))
        .respond("/fast", 200, "Fast");
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let provider = with_quickest(vec![
        content_from(clients.get_default(), "/slow", "text/plain"),
        content_from(clients.get_default(), "/fast", "text/plain"),
    ]);
    let content = provider
        .fetch(&Position::new("X"), &NoOpTracer, &Parameters::empty())
        .await
        .unwrap();
    assert_eq!(content.body(), "Fast");
}

#[tokio::test]
async fn test_quickest_ignores_failed_providers() {
    let transport = StubTransport::new();
    transport
        .fail("/broken", "connection reset")
        .respond_after("/ok", 200, "Ok", Duration::from_millis(30));
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let provider = with_quickest(vec![
        content_from(clients.get_by("noResiliency").unwrap(), "/broken", "text/plain"),
        content_from(clients.get_default(), "/ok", "text/plain"),
    ]);
    let content = provider
        .fetch(&Position::new("X"), &NoOpTracer, &Parameters::empty())
        .await
        .unwrap();
    assert_eq!(content.body(), "Ok");

    let provider = with_quickest(vec![content_from(
        clients.get_by("noResiliency").unwrap(),
        "/broken",
        "text/plain",
    )]);
    assert!(provider
        .fetch(&Position::new("X"), &NoOpTracer, &Parameters::empty())
        .await
        .is_none());
}

#[tokio::test]
async fn test_all_yields_every_available_content() {
    let transport = StubTransport::new();
    transport
        .respond_after("/a", 200, "A", Duration::from_millis(40))
        .respond("/b", 200, "")
        .respond("/c", 200, "C");
    let clients = clients_with(&transport, Vec::new(), CircuitBreakerConfig::default());

    let provider = with_all(vec![
        content_from(clients.get_default(), "/a", "text/plain"),
        content_from(clients.get_default(), "/b", "text/plain"),
        content_from(clients.get_default(), "/c", "text/plain"),
    ]);
    let position = Position::new("X");
    let contents = provider
        .fetch_all(&position, &NoOpTracer, &Parameters::empty())
        .await;
    let bodies: Vec<&str> = contents.iter().map(Content::body).collect();
    assert_eq!(bodies, vec!["A", "C"]);

    // aggregated into one position, the first available content is kept
    let plan = Plan::consists_of(vec![fragment("X", provider)]).unwrap();
    let contents = plan.execute(&Parameters::empty(), noop()).await;
    assert_eq!(contents.get(&position).body(), "A");
}
