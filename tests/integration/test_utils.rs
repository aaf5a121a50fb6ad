//! Shared test utilities for integration tests
//!
//! A scripted in-memory transport and a tracer that records every event, so
//! composition scenarios run without network access.

use async_trait::async_trait;
use composer::content::Headers;
use composer::http::{HttpResponse, Transport};
use composer::resilience::CircuitBreakerConfig;
use composer::{ClientConfig, ComposerError, ServiceClients, TraceEvent, Tracer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Scripted answer for one target
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        body: String,
        delay: Duration,
    },
    Fail(String),
}

/// Transport answering from a per-target script and counting requests.
///
/// Unknown targets fail like an unreachable host.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, target: &str, status: u16, body: &str) -> &Self {
        self.respond_after(target, status, body, Duration::ZERO)
    }

    pub fn respond_after(&self, target: &str, status: u16, body: &str, delay: Duration) -> &Self {
        self.replies.lock().insert(
            target.to_string(),
            Reply::Respond {
                status,
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    pub fn fail(&self, target: &str, message: &str) -> &Self {
        self.replies
            .lock()
            .insert(target.to_string(), Reply::Fail(message.to_string()));
        self
    }

    pub fn calls(&self, target: &str) -> usize {
        self.calls.lock().get(target).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, target: &str, _accept: &str) -> Result<HttpResponse, ComposerError> {
        *self.calls.lock().entry(target.to_string()).or_insert(0) += 1;
        let reply = self.replies.lock().get(target).cloned();
        match reply {
            Some(Reply::Respond { status, body, delay }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse::new(status, Headers::empty(), body))
            }
            Some(Reply::Fail(message)) => Err(ComposerError::Transport(message)),
            None => Err(ComposerError::Transport(format!(
                "unable to resolve host for {}",
                target
            ))),
        }
    }
}

/// Tracer keeping every event in arrival order.
#[derive(Default)]
pub struct RecordingTracer {
    events: Mutex<Vec<TraceEvent>>,
}

impl RecordingTracer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<TraceEvent> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event, TraceEvent::FetchError { .. }))
            .collect()
    }
}

impl Tracer for RecordingTracer {
    fn trace(&self, event: TraceEvent) {
        self.events.lock().push(event);
    }
}

/// Presets plus `extra`, all answering from `transport`, default `singleRetry`.
pub fn clients_with(
    transport: &Arc<StubTransport>,
    extra: Vec<ClientConfig>,
    breaker_config: CircuitBreakerConfig,
) -> ServiceClients {
    let mut configs = vec![
        ClientConfig::single_retry(),
        ClientConfig::no_retries(),
        ClientConfig::no_resiliency(),
    ];
    configs.extend(extra);
    ServiceClients::with_transport(configs, breaker_config, transport.clone())
        .expect("valid service clients")
}

pub fn clients(transport: &Arc<StubTransport>) -> ServiceClients {
    clients_with(transport, Vec::new(), CircuitBreakerConfig::default())
}
