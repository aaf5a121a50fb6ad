//! Content Provider Abstraction
//!
//! A [`ContentProvider`] fetches zero or one [`Content`] for a position. HTTP
//! providers do the actual fetching; the selection strategies compose several
//! providers for one position into a single provider. Failures never escape a
//! provider: they are absorbed, traced, and turn into "no content".

pub mod http;
pub mod selection;

pub use http::{HttpContentProvider, Target};

use crate::client::ServiceClient;
use crate::content::{Content, Parameters, Position};
use crate::error::ComposerError;
use crate::tracer::Tracer;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

/// Closed set of content providers.
#[derive(Debug, Clone)]
pub enum ContentProvider {
    /// Fetches via HTTP GET, optionally resilient.
    Http(Arc<HttpContentProvider>),
    /// Passthrough of exactly one provider.
    Single(Box<ContentProvider>),
    /// All providers run concurrently; the first one in declared order that
    /// yields content is selected, regardless of arrival time.
    PriorityFirst(Vec<ContentProvider>),
    /// All providers run concurrently; the first content to arrive wins.
    Quickest(Vec<ContentProvider>),
    /// All providers run concurrently; every available content is kept.
    /// Use [`ContentProvider::fetch_all`] to get all of them.
    All(Vec<ContentProvider>),
}

impl ContentProvider {
    /// Fetches at most one available content for `position`.
    ///
    /// For [`ContentProvider::All`] this waits for every provider and returns the
    /// first available content in declared order.
    pub fn fetch<'a>(
        &'a self,
        position: &'a Position,
        tracer: &'a dyn Tracer,
        parameters: &'a Parameters,
    ) -> BoxFuture<'a, Option<Content>> {
        match self {
            ContentProvider::Http(provider) => provider.fetch(position, tracer, parameters).boxed(),
            ContentProvider::Single(provider) => provider.fetch(position, tracer, parameters),
            ContentProvider::PriorityFirst(providers) => {
                let branches = providers
                    .iter()
                    .map(|p| p.fetch(position, tracer, parameters))
                    .collect();
                selection::priority_first(position, branches).boxed()
            }
            ContentProvider::Quickest(providers) => {
                let branches = providers
                    .iter()
                    .map(|p| p.fetch(position, tracer, parameters))
                    .collect();
                selection::quickest(position, branches).boxed()
            }
            ContentProvider::All(_) => self
                .fetch_all(position, tracer, parameters)
                .map(|contents| contents.into_iter().next())
                .boxed(),
        }
    }

    /// Fetches every available content this provider produces, in declared order.
    ///
    /// Only [`ContentProvider::All`] can yield more than one content.
    pub fn fetch_all<'a>(
        &'a self,
        position: &'a Position,
        tracer: &'a dyn Tracer,
        parameters: &'a Parameters,
    ) -> BoxFuture<'a, Vec<Content>> {
        match self {
            ContentProvider::All(providers) => {
                let branches = providers
                    .iter()
                    .map(|p| p.fetch_all(position, tracer, parameters))
                    .collect();
                selection::all(branches).boxed()
            }
            _ => self
                .fetch(position, tracer, parameters)
                .map(|content| content.into_iter().collect())
                .boxed(),
        }
    }
}

impl From<HttpContentProvider> for ContentProvider {
    fn from(provider: HttpContentProvider) -> Self {
        ContentProvider::Http(Arc::new(provider))
    }
}

/// HTTP GET provider for a fixed URL.
pub fn content_from(
    client: &ServiceClient,
    url: impl Into<String>,
    accept: impl Into<String>,
) -> ContentProvider {
    HttpContentProvider::new(client.clone(), Target::url(url), accept).into()
}

/// HTTP GET provider for a URI template expanded with the request parameters.
pub fn content_from_template(
    client: &ServiceClient,
    template: &str,
    accept: impl Into<String>,
) -> Result<ContentProvider, ComposerError> {
    Ok(HttpContentProvider::new(client.clone(), Target::template(template)?, accept).into())
}

/// HTTP GET provider that delegates to `fallback` when the resilient fetch fails.
///
/// Fails if `client` is not resilient.
pub fn resilient_content_from(
    client: &ServiceClient,
    url: impl Into<String>,
    accept: impl Into<String>,
    fallback: ContentProvider,
) -> Result<ContentProvider, ComposerError> {
    Ok(HttpContentProvider::new(client.clone(), Target::url(url), accept)
        .with_fallback(fallback)?
        .into())
}

pub fn resilient_content_from_template(
    client: &ServiceClient,
    template: &str,
    accept: impl Into<String>,
    fallback: ContentProvider,
) -> Result<ContentProvider, ComposerError> {
    Ok(
        HttpContentProvider::new(client.clone(), Target::template(template)?, accept)
            .with_fallback(fallback)?
            .into(),
    )
}

pub fn with_single(provider: ContentProvider) -> ContentProvider {
    ContentProvider::Single(Box::new(provider))
}

pub fn with_first(providers: Vec<ContentProvider>) -> ContentProvider {
    ContentProvider::PriorityFirst(providers)
}

pub fn with_quickest(providers: Vec<ContentProvider>) -> ContentProvider {
    ContentProvider::Quickest(providers)
}

pub fn with_all(providers: Vec<ContentProvider>) -> ContentProvider {
    ContentProvider::All(providers)
}
