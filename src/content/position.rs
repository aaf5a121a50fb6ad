use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Named slot of a page that is filled by at most one content fragment.
///
/// Positions are ordered by name. The order is used when presenting results and has
/// no influence on the order in which fragments are fetched.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Position(Arc<str>);

impl Position {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Position {
    fn from(name: &str) -> Self {
        Position::new(name)
    }
}

impl From<String> for Position {
    fn from(name: String) -> Self {
        Position(Arc::from(name))
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        position.0.to_string()
    }
}
