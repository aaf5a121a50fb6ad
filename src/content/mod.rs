//! Content model: positions, request parameters, fetched fragments and the
//! per-page result set.

pub mod contents;
pub mod parameters;
pub mod position;

pub use contents::{Contents, ContentsBuilder};
pub use parameters::Parameters;
pub use position::Position;

use crate::http::{HttpResponse, StatusClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Content availability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Availability {
    /// Content is available and not empty.
    Available,
    /// Content is empty, but no error occurred.
    Empty,
    /// An error occurred. The body may contain the error response.
    Error,
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Availability::Available => "AVAILABLE",
            Availability::Empty => "EMPTY",
            Availability::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Meta-information about a content fragment. For HTTP content these are the
/// response headers; names are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Headers {
    values: BTreeMap<String, Vec<String>>,
}

impl Headers {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut headers = Headers::default();
        for (name, value) in pairs {
            headers.append(name.as_ref(), value);
        }
        headers
    }

    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.values
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.values
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Possible content fragment for a [`Position`] on a page.
///
/// Content is immutable once built. If several contents are fetched for one
/// position, the provider composing them decides which one is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    source: String,
    position: Position,
    body: String,
    headers: Headers,
    created: DateTime<Utc>,
    availability: Availability,
}

impl Content {
    /// Builds content whose availability follows from the body: non-empty bodies
    /// are available, empty bodies are empty.
    pub fn new(
        source: impl Into<String>,
        position: Position,
        body: impl Into<String>,
        headers: Headers,
    ) -> Self {
        let body = body.into();
        let availability = if body.is_empty() {
            Availability::Empty
        } else {
            Availability::Available
        };
        Self {
            source: source.into(),
            position,
            body,
            headers,
            created: Utc::now(),
            availability,
        }
    }

    /// Maps a transport response to content.
    ///
    /// Success with a body is available, success without one is empty, and any
    /// other status that reaches this point is an error whose body is kept for
    /// diagnostics. Server errors are expected to be handled by the caller as
    /// retryable failures before mapping.
    pub fn from_response(source: impl Into<String>, position: Position, response: &HttpResponse) -> Self {
        let headers = response.headers().clone();
        match response.status_class() {
            StatusClass::Success => Content::new(source, position, response.body(), headers),
            _ => Self {
                source: source.into(),
                position,
                body: response.body().to_string(),
                headers,
                created: Utc::now(),
                availability: Availability::Error,
            },
        }
    }

    /// The "no content" sentinel for a position. The position name doubles as the source.
    pub fn empty(position: Position) -> Self {
        Self {
            source: position.name().to_string(),
            position,
            body: String::new(),
            headers: Headers::empty(),
            created: Utc::now(),
            availability: Availability::Empty,
        }
    }

    pub fn error(position: Position, source: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            position,
            body: cause.into(),
            headers: Headers::empty(),
            created: Utc::now(),
            availability: Availability::Error,
        }
    }

    /// For HTTP content this is the resolved URL.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Creation time, for diagnostics only.
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    pub fn has_content(&self) -> bool {
        self.availability == Availability::Available
    }

    pub fn is_available(&self) -> bool {
        self.has_content()
    }
}
