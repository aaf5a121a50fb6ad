use crate::content::{Content, Position};
use std::collections::BTreeMap;
use tracing::debug;

/// Result of a page execution: at most one available content per position.
///
/// Empty and erroneous contents never make it into this container. Looking up a
/// position without content yields the empty sentinel instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contents {
    contents: BTreeMap<Position, Content>,
}

impl Contents {
    pub fn builder() -> ContentsBuilder {
        ContentsBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The content for `position`, or [`Content::empty`] if there is none.
    pub fn get(&self, position: &Position) -> Content {
        self.contents
            .get(position)
            .cloned()
            .unwrap_or_else(|| Content::empty(position.clone()))
    }

    pub fn find(&self, position: &Position) -> Option<&Content> {
        self.contents.get(position)
    }

    /// All stored contents, in position order.
    pub fn get_all(&self) -> Vec<&Content> {
        self.contents.values().collect()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.contents.keys()
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ContentsBuilder {
    contents: BTreeMap<Position, Content>,
}

impl ContentsBuilder {
    /// Adds available content. Unavailable content is dropped, and the first
    /// content added for a position is kept.
    pub fn add(mut self, content: Content) -> Self {
        if !content.has_content() {
            debug!(
                position = %content.position(),
                source = %content.source(),
                availability = %content.availability(),
                "Dropping unavailable content"
            );
            return self;
        }
        self.contents
            .entry(content.position().clone())
            .or_insert(content);
        self
    }

    pub fn build(self) -> Contents {
        Contents {
            contents: self.contents,
        }
    }
}

impl FromIterator<Content> for Contents {
    fn from_iter<T: IntoIterator<Item = Content>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Contents::builder(), ContentsBuilder::add)
            .build()
    }
}
