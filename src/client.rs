//! Service clients: per-dependency resilience settings bound to a transport.
//!
//! A [`ClientConfig`] is attached to every HTTP content provider at construction
//! time and never changes afterwards. Its name doubles as the breaker-group
//! reference: every provider built from clients with the same name shares one
//! circuit breaker.

use crate::error::ComposerError;
use crate::http::{ReqwestTransport, Transport};
use crate::resilience::{CircuitBreakerConfig, CircuitBreakerRegistry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const SINGLE_RETRY: &str = "singleRetry";
pub const NO_RETRIES: &str = "noRetries";
pub const NO_RESILIENCY: &str = "noResiliency";

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Client name and breaker-group reference. Taken from the table key when
    /// loaded through [`ConfigLoader`](crate::config::ConfigLoader).
    #[serde(default)]
    pub name: String,

    /// Enables retries, circuit breaking and fallbacks
    #[serde(default = "default_resilient")]
    pub resilient: bool,

    /// Additional attempts after the first failed one
    #[serde(default)]
    pub retries: u32,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_resilient() -> bool {
    true
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

impl ClientConfig {
    pub fn resilient(
        name: impl Into<String>,
        retries: u32,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            resilient: true,
            retries,
            connect_timeout_ms: connect_timeout.as_millis() as u64,
            read_timeout_ms: read_timeout.as_millis() as u64,
        }
    }

    pub fn non_resilient(
        name: impl Into<String>,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            resilient: false,
            retries: 0,
            connect_timeout_ms: connect_timeout.as_millis() as u64,
            read_timeout_ms: read_timeout.as_millis() as u64,
        }
    }

    pub fn single_retry() -> Self {
        Self::resilient(SINGLE_RETRY, 1, default_connect_timeout(), default_read_timeout())
    }

    pub fn no_retries() -> Self {
        Self::resilient(NO_RETRIES, 0, default_connect_timeout(), default_read_timeout())
    }

    pub fn no_resiliency() -> Self {
        Self::non_resilient(NO_RESILIENCY, default_connect_timeout(), default_read_timeout())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_resilient(&self) -> bool {
        self.resilient
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Client name cannot be empty".to_string());
        }
        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be greater than 0".to_string());
        }
        if !self.resilient && self.retries > 0 {
            return Err("Retries require a resilient client".to_string());
        }
        Ok(())
    }
}

fn default_connect_timeout() -> Duration {
    Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
}

fn default_read_timeout() -> Duration {
    Duration::from_millis(DEFAULT_READ_TIMEOUT_MS)
}

/// A transport together with the resilience settings used for it.
#[derive(Clone)]
pub struct ServiceClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        breakers: Arc<CircuitBreakerRegistry>,
    ) -> Self {
        Self {
            config,
            transport,
            breakers,
        }
    }

    /// Client with a `reqwest` transport and its own breaker registry.
    pub fn from_config(config: ClientConfig) -> Result<Self, ComposerError> {
        let transport = Arc::new(ReqwestTransport::for_config(&config)?);
        Ok(Self::new(
            config,
            transport,
            Arc::new(CircuitBreakerRegistry::default()),
        ))
    }

    pub fn no_resiliency_client() -> Result<Self, ComposerError> {
        Self::from_config(ClientConfig::no_resiliency())
    }

    pub fn single_retry_client() -> Result<Self, ComposerError> {
        Self::from_config(ClientConfig::single_retry())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }
}

/// Named service clients with a designated default, sharing one breaker registry.
#[derive(Debug, Clone)]
pub struct ServiceClients {
    default: String,
    clients: BTreeMap<String, ServiceClient>,
    breakers: Arc<CircuitBreakerRegistry>,
}

impl ServiceClients {
    /// The `singleRetry`, `noRetries` and `noResiliency` presets; `singleRetry` is the default.
    pub fn default_clients() -> Result<Self, ComposerError> {
        Self::default_clients_with(ClientConfig::single_retry())
    }

    /// The presets plus `default_config`, which becomes the default client.
    pub fn default_clients_with(default_config: ClientConfig) -> Result<Self, ComposerError> {
        let mut configs = vec![default_config.clone()];
        configs.extend(
            [
                ClientConfig::single_retry(),
                ClientConfig::no_retries(),
                ClientConfig::no_resiliency(),
            ]
            .into_iter()
            .filter(|preset| preset.name != default_config.name),
        );
        Self::service_clients(configs)
    }

    /// Exactly the given clients; the first one is the default.
    pub fn service_clients(configs: Vec<ClientConfig>) -> Result<Self, ComposerError> {
        Self::build(configs, CircuitBreakerConfig::default(), |config| {
            Ok(Arc::new(ReqwestTransport::for_config(config)?) as Arc<dyn Transport>)
        })
    }

    /// Like [`ServiceClients::service_clients`], with every client using `transport`.
    pub fn with_transport(
        configs: Vec<ClientConfig>,
        breaker_config: CircuitBreakerConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ComposerError> {
        Self::build(configs, breaker_config, |_| Ok(Arc::clone(&transport)))
    }

    pub(crate) fn build<F>(
        configs: Vec<ClientConfig>,
        breaker_config: CircuitBreakerConfig,
        mut transport_for: F,
    ) -> Result<Self, ComposerError>
    where
        F: FnMut(&ClientConfig) -> Result<Arc<dyn Transport>, ComposerError>,
    {
        let default = configs
            .first()
            .map(|config| config.name.clone())
            .ok_or_else(|| {
                ComposerError::Config("At least one service client is required".to_string())
            })?;

        let breakers = Arc::new(CircuitBreakerRegistry::new(breaker_config));
        let mut clients = BTreeMap::new();
        for config in configs {
            config.validate().map_err(|e| {
                ComposerError::Config(format!("Service client '{}': {}", config.name, e))
            })?;
            let transport = transport_for(&config)?;
            let name = config.name.clone();
            let client = ServiceClient::new(config, transport, Arc::clone(&breakers));
            if clients.insert(name.clone(), client).is_some() {
                return Err(ComposerError::Config(format!(
                    "Duplicate service client '{}'",
                    name
                )));
            }
        }

        Ok(Self {
            default,
            clients,
            breakers,
        })
    }

    pub fn get_default(&self) -> &ServiceClient {
        &self.clients[&self.default]
    }

    pub fn get_by(&self, name: &str) -> Option<&ServiceClient> {
        self.clients.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }
}
