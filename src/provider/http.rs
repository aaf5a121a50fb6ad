//! A content provider fetching content using HTTP GET.
//!
//! Both fixed URLs and URI templates are supported; templates are expanded with
//! the request [`Parameters`] on every fetch. Server errors are raised as
//! retryable failures so that retry, circuit breaker and fallback can act on them.
//! Client errors and empty bodies are mapped to unavailable content and dropped.

use crate::client::ServiceClient;
use crate::content::{Content, Parameters, Position};
use crate::error::ComposerError;
use crate::http::{StatusClass, UriTemplate};
use crate::provider::ContentProvider;
use crate::resilience::ResiliencePolicy;
use crate::tracer::{TraceEvent, Tracer};
use std::fmt;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Url(String),
    Template(UriTemplate),
}

impl Target {
    pub fn url(url: impl Into<String>) -> Self {
        Target::Url(url.into())
    }

    pub fn template(template: &str) -> Result<Self, ComposerError> {
        Ok(Target::Template(UriTemplate::parse(template)?))
    }

    pub fn resolve(&self, parameters: &Parameters) -> Result<String, ComposerError> {
        match self {
            Target::Url(url) => Ok(url.clone()),
            Target::Template(template) => template.expand(parameters),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Target::Url(url) => url,
            Target::Template(template) => template.as_str(),
        }
    }
}

pub struct HttpContentProvider {
    client: ServiceClient,
    target: Target,
    accept: String,
    fallback: Option<ContentProvider>,
}

impl fmt::Debug for HttpContentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpContentProvider")
            .field("client", &self.client.config().name())
            .field("target", &self.target)
            .field("accept", &self.accept)
            .field("fallback", &self.fallback)
            .finish()
    }
}

impl HttpContentProvider {
    pub fn new(client: ServiceClient, target: Target, accept: impl Into<String>) -> Self {
        Self {
            client,
            target,
            accept: accept.into(),
            fallback: None,
        }
    }

    /// Attaches a provider used when the resilient fetch fails. The fallback runs
    /// without any further wrapping.
    pub fn with_fallback(mut self, fallback: ContentProvider) -> Result<Self, ComposerError> {
        if !self.client.config().is_resilient() {
            return Err(ComposerError::FallbackNotAllowed(
                self.client.config().name().to_string(),
            ));
        }
        self.fallback = Some(fallback);
        Ok(self)
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn client(&self) -> &ServiceClient {
        &self.client
    }

    pub async fn fetch(
        &self,
        position: &Position,
        tracer: &dyn Tracer,
        parameters: &Parameters,
    ) -> Option<Content> {
        let url = match self.target.resolve(parameters) {
            Ok(url) => url,
            Err(err) => {
                error!(
                    position = %position,
                    template = %self.target.as_str(),
                    error = %err,
                    "Unable to resolve fetch target"
                );
                tracer.trace(TraceEvent::fetch_error(position, self.target.as_str(), &err));
                return None;
            }
        };

        let config = self.client.config();
        let target = url.as_str();
        let outcome = if config.is_resilient() {
            let breaker = self.client.breakers().get(config.name());
            ResiliencePolicy::from_config(config)
                .execute(&breaker, move |_| self.attempt(target, position, tracer))
                .await
        } else {
            match tokio::time::timeout(
                config.read_timeout(),
                self.attempt(target, position, tracer),
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ComposerError::Timeout(config.read_timeout())),
            }
        };

        match outcome {
            Ok(content) => Some(content).filter(Content::has_content),
            Err(err) => {
                tracer.trace(TraceEvent::fetch_error(position, target, &err));
                match &self.fallback {
                    Some(fallback) => {
                        debug!(position = %position, source = %target, "Delegating to fallback");
                        fallback.fetch(position, tracer, parameters).await
                    }
                    None => None,
                }
            }
        }
    }

    async fn attempt(
        &self,
        url: &str,
        position: &Position,
        tracer: &dyn Tracer,
    ) -> Result<Content, ComposerError> {
        tracer.trace(TraceEvent::fetch_started(position, url));
        let response = self.client.transport().get(url, &self.accept).await?;

        if response.status_class() == StatusClass::ServerError {
            return Err(ComposerError::ServerError {
                status: response.status(),
                body: response.body().to_string(),
            });
        }

        let content = Content::from_response(url, position.clone(), &response);
        tracer.trace(TraceEvent::fetch_completed(
            position,
            url,
            content.availability(),
        ));
        Ok(content)
    }
}
