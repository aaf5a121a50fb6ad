//! Circuit breakers shared by name.
//!
//! # State Machine
//!
//! ```text
//! Closed --[volume >= threshold && failure% >= threshold in rolling window]--> Open
//! Open --[sleep window elapsed, next request]--> HalfOpen (single trial admitted)
//! HalfOpen --[trial succeeded]--> Closed (window cleared)
//! HalfOpen --[trial failed]--> Open
//! ```
//!
//! All calls configured with the same breaker-group name share one [`CircuitBreaker`]
//! through a [`CircuitBreakerRegistry`]. The registry is injected, never global, so
//! each test can work with an isolated set of breakers.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Thresholds of a circuit breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Minimum number of outcomes in the rolling window before the breaker may open.
    #[serde(default = "default_request_volume_threshold")]
    pub request_volume_threshold: u32,

    /// Failure percentage (0-100) at or above which the breaker opens.
    #[serde(default = "default_error_threshold_percentage")]
    pub error_threshold_percentage: u8,

    /// Length of the rolling statistics window.
    #[serde(default = "default_rolling_window_ms")]
    pub rolling_window_ms: u64,

    /// Time the breaker stays open before admitting a trial request.
    #[serde(default = "default_sleep_window_ms")]
    pub sleep_window_ms: u64,
}

fn default_request_volume_threshold() -> u32 {
    20
}

fn default_error_threshold_percentage() -> u8 {
    50
}

fn default_rolling_window_ms() -> u64 {
    10_000
}

fn default_sleep_window_ms() -> u64 {
    5_000
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            request_volume_threshold: default_request_volume_threshold(),
            error_threshold_percentage: default_error_threshold_percentage(),
            rolling_window_ms: default_rolling_window_ms(),
            sleep_window_ms: default_sleep_window_ms(),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.request_volume_threshold == 0 {
            return Err("request_volume_threshold must be at least 1".to_string());
        }
        if self.error_threshold_percentage > 100 {
            return Err("error_threshold_percentage must be between 0 and 100".to_string());
        }
        if self.rolling_window_ms == 0 {
            return Err("rolling_window_ms must be greater than 0".to_string());
        }
        Ok(())
    }

    fn rolling_window(&self) -> Duration {
        Duration::from_millis(self.rolling_window_ms)
    }

    fn sleep_window(&self) -> Duration {
        Duration::from_millis(self.sleep_window_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct CircuitBreakerInner {
    state: CircuitState,
    /// (recorded at, succeeded)
    outcomes: VecDeque<(Instant, bool)>,
    opened_at: Option<Instant>,
    trial_started_at: Option<Instant>,
}

impl CircuitBreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            outcomes: VecDeque::new(),
            opened_at: None,
            trial_started_at: None,
        }
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some((at, _)) = self.outcomes.front() {
            if now.duration_since(*at) > window {
                self.outcomes.pop_front();
            } else {
                break;
            }
        }
    }

    fn open(&mut self, now: Instant) {
        self.state = CircuitState::Open;
        self.opened_at = Some(now);
        self.trial_started_at = None;
    }
}

pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<CircuitBreakerInner>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("inner", &self.inner)
            .finish()
    }
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(CircuitBreakerInner::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Decides whether a request may go out.
    ///
    /// An open breaker admits a single trial once the sleep window has passed. A
    /// trial that never reports back is replaced by a new one after another sleep
    /// window; use [`CircuitBreaker::try_acquire`] to hand the slot back as soon as
    /// the trial is abandoned.
    pub fn allow_request(&self) -> bool {
        self.admit().is_some()
    }

    /// Admits a request and returns a permit that reports its outcome.
    ///
    /// Dropping the permit without an outcome releases a half-open trial slot, so
    /// the next request becomes the trial instead of waiting another sleep window.
    pub fn try_acquire(&self) -> Option<CallPermit<'_>> {
        self.admit().map(|trial| CallPermit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    /// `Some(None)` for a regular admission, `Some(Some(started))` for a trial.
    fn admit(&self) -> Option<Option<Instant>> {
        let now = Instant::now();
        let sleep_window = self.config.sleep_window();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => Some(None),
            CircuitState::Open => {
                let elapsed = inner
                    .opened_at
                    .map(|at| now.duration_since(at))
                    .unwrap_or(sleep_window);
                if elapsed >= sleep_window {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started_at = Some(now);
                    Some(Some(now))
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                let stale = inner
                    .trial_started_at
                    .map(|at| now.duration_since(at) >= sleep_window)
                    .unwrap_or(true);
                if stale {
                    inner.trial_started_at = Some(now);
                    Some(Some(now))
                } else {
                    None
                }
            }
        }
    }

    fn release_trial(&self, started: Instant) {
        let mut inner = self.inner.lock();
        if inner.state == CircuitState::HalfOpen && inner.trial_started_at == Some(started) {
            inner.trial_started_at = None;
            debug!(breaker = %self.name, "Circuit breaker trial abandoned, slot released");
        }
    }

    pub fn record_success(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.state = CircuitState::Closed;
                inner.outcomes.clear();
                inner.opened_at = None;
                inner.trial_started_at = None;
                info!(breaker = %self.name, "Circuit breaker closed");
            }
            CircuitState::Closed => {
                inner.outcomes.push_back((now, true));
                inner.prune(now, self.config.rolling_window());
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::HalfOpen => {
                inner.open(now);
                warn!(breaker = %self.name, "Circuit breaker trial failed, re-opened");
            }
            CircuitState::Closed => {
                inner.outcomes.push_back((now, false));
                inner.prune(now, self.config.rolling_window());

                let total = inner.outcomes.len() as u64;
                let failures = inner.outcomes.iter().filter(|(_, ok)| !ok).count() as u64;
                if total >= u64::from(self.config.request_volume_threshold)
                    && failures * 100 >= total * u64::from(self.config.error_threshold_percentage)
                {
                    inner.open(now);
                    warn!(
                        breaker = %self.name,
                        failures,
                        total,
                        "Circuit breaker opened"
                    );
                }
            }
            CircuitState::Open => {}
        }
    }
}

/// Admission to one command under a [`CircuitBreaker`].
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    trial: Option<Instant>,
    settled: bool,
}

impl CallPermit<'_> {
    pub fn is_trial(&self) -> bool {
        self.trial.is_some()
    }

    pub fn success(mut self) {
        self.settled = true;
        self.breaker.record_success();
    }

    pub fn failure(mut self) {
        self.settled = true;
        self.breaker.record_failure();
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(started) = self.trial {
            self.breaker.release_trial(started);
        }
    }
}

/// Circuit breakers keyed by breaker-group name, created on first use.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    config: CircuitBreakerConfig,
    breakers: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            breakers: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.breakers.read().get(name) {
            return Arc::clone(breaker);
        }
        let mut breakers = self.breakers.write();
        Arc::clone(
            breakers
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone()))),
        )
    }

    /// State of the named breaker; breakers that were never used are closed.
    pub fn state(&self, name: &str) -> CircuitState {
        self.breakers
            .read()
            .get(name)
            .map(|breaker| breaker.state())
            .unwrap_or(CircuitState::Closed)
    }

    pub fn len(&self) -> usize {
        self.breakers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.read().is_empty()
    }
}
