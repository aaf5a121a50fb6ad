//! Resilience for remote fetches: retry, circuit breaking and timeout.
//!
//! Layering, outermost first: breaker gate, timeout over the whole command,
//! retry loop, single attempt. The breaker records one outcome per command, so a
//! retry budget is always used up before the breaker sees the failure.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState,
};

use crate::client::ClientConfig;
use crate::error::ComposerError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResiliencePolicy {
    retries: u32,
    timeout: Duration,
}

impl ResiliencePolicy {
    pub fn new(retries: u32, timeout: Duration) -> Self {
        Self { retries, timeout }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.retries(), config.read_timeout())
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `attempt` under the breaker, retrying retryable failures.
    ///
    /// `attempt` receives the zero-based attempt number. An open breaker fails
    /// with [`ComposerError::CircuitOpen`] without calling `attempt` at all. If the
    /// returned future is dropped before it completes, no outcome is recorded and a
    /// half-open trial slot is handed back.
    pub async fn execute<T, F, Fut>(
        &self,
        breaker: &CircuitBreaker,
        attempt: F,
    ) -> Result<T, ComposerError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ComposerError>>,
    {
        let permit = breaker
            .try_acquire()
            .ok_or_else(|| ComposerError::CircuitOpen(breaker.name().to_string()))?;

        let outcome = match tokio::time::timeout(self.timeout, self.retrying(attempt)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ComposerError::Timeout(self.timeout)),
        };

        match &outcome {
            Ok(_) => permit.success(),
            Err(_) => permit.failure(),
        }
        outcome
    }

    async fn retrying<T, F, Fut>(&self, mut attempt: F) -> Result<T, ComposerError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ComposerError>>,
    {
        let mut attempt_no = 0;
        loop {
            match attempt(attempt_no).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt_no < self.retries => {
                    debug!(
                        attempt = attempt_no + 1,
                        retries = self.retries,
                        error = %err,
                        "Retrying fetch"
                    );
                    attempt_no += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
