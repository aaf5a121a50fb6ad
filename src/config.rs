//! Configuration System
//!
//! Layered configuration for service clients, circuit breakers and logging.
//! Sources, lowest precedence first: merge-policy defaults, the global config
//! file, the workspace config file and `COMPOSER__*` environment variables.

use crate::client::{ClientConfig, ServiceClients, SINGLE_RETRY};
use crate::error::ComposerError;
use crate::http::{ReqwestTransport, Transport};
use crate::logging::LoggingConfig;
use crate::resilience::CircuitBreakerConfig;
use config::Environment;
use config::File;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

mod merge {
    pub mod merge_policy;
}

mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposerConfig {
    /// Service clients by name, in addition to the built-in presets.
    /// A client named like a preset replaces it.
    #[serde(default)]
    pub clients: BTreeMap<String, ClientConfig>,

    /// Client returned by [`ServiceClients::get_default`]; `singleRetry` when unset
    #[serde(default)]
    pub default_client: Option<String>,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            clients: BTreeMap::new(),
            default_client: None,
            circuit_breaker: CircuitBreakerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Client '{0}': {1}")]
    Client(String, String),

    #[error("Default client '{0}' is not configured")]
    UnknownDefaultClient(String),

    #[error("Circuit breaker: {0}")]
    CircuitBreaker(String),

    #[error("Logging: {0}")]
    Logging(String),
}

impl ComposerConfig {
    pub fn default_client_name(&self) -> &str {
        self.default_client.as_deref().unwrap_or(SINGLE_RETRY)
    }

    /// Presets merged with the configured clients, default client first.
    pub fn client_configs(&self) -> Vec<ClientConfig> {
        let mut configs: BTreeMap<String, ClientConfig> = [
            ClientConfig::single_retry(),
            ClientConfig::no_retries(),
            ClientConfig::no_resiliency(),
        ]
        .into_iter()
        .map(|preset| (preset.name.clone(), preset))
        .collect();

        for (name, client) in &self.clients {
            let mut client = client.clone();
            client.name = name.clone();
            configs.insert(name.clone(), client);
        }

        let default = self.default_client_name();
        let mut ordered: Vec<ClientConfig> = configs.into_values().collect();
        ordered.sort_by_key(|config| config.name != default);
        ordered
    }

    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        for (name, client) in &self.clients {
            let mut client = client.clone();
            client.name = name.clone();
            if let Err(e) = client.validate() {
                errors.push(ValidationError::Client(name.clone(), e));
            }
        }

        let default = self.default_client_name();
        if !self.client_configs().iter().any(|c| c.name == default) {
            errors.push(ValidationError::UnknownDefaultClient(default.to_string()));
        }

        if let Err(e) = self.circuit_breaker.validate() {
            errors.push(ValidationError::CircuitBreaker(e));
        }

        errors.extend(
            crate::logging::validate(&self.logging)
                .into_iter()
                .map(ValidationError::Logging),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Builds the service clients with reqwest transports and one shared breaker registry.
    pub fn service_clients(&self) -> Result<ServiceClients, ComposerError> {
        ServiceClients::build(
            self.client_configs(),
            self.circuit_breaker.clone(),
            |config| Ok(Arc::new(ReqwestTransport::for_config(config)?) as Arc<dyn Transport>),
        )
    }
}

/// Loads [`ComposerConfig`] from its layered sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate the configuration for `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<ComposerConfig, ComposerError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(
            Environment::with_prefix("COMPOSER")
                .separator("__")
                .try_parsing(true),
        );

        let config: ComposerConfig = builder.build()?.try_deserialize()?;
        Self::validated(config)
    }

    /// Load and validate a single config file over the defaults.
    pub fn load_from_file(path: &Path) -> Result<ComposerConfig, ComposerError> {
        let config: ComposerConfig = merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()?;
        Self::validated(config)
    }

    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        sources::workspace_file::workspace_config_path(workspace_root)
    }

    fn validated(config: ComposerConfig) -> Result<ComposerConfig, ComposerError> {
        config.validate().map_err(|errors| {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ComposerError::Config(format!(
                "Configuration validation failed:\n{}",
                messages.join("\n")
            ))
        })?;
        info!(
            clients = config.clients.len(),
            default_client = %config.default_client_name(),
            "Configuration loaded"
        );
        Ok(config)
    }
}
