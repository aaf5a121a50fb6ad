use crate::content::{Contents, Parameters, Position};
use crate::error::ComposerError;
use crate::page::PlanExecutor;
use crate::provider::ContentProvider;
use crate::tracer::Tracer;
use std::collections::BTreeSet;
use std::sync::Arc;

/// One position bound to the provider that fetches its content.
#[derive(Debug, Clone)]
pub struct Fragment {
    position: Position,
    provider: ContentProvider,
}

impl Fragment {
    pub fn new(position: impl Into<Position>, provider: ContentProvider) -> Self {
        Self {
            position: position.into(),
            provider,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn provider(&self) -> &ContentProvider {
        &self.provider
    }
}

pub fn fragment(position: impl Into<Position>, provider: ContentProvider) -> Fragment {
    Fragment::new(position, provider)
}

/// The fragments of one page, at most one per position, kept in position order.
#[derive(Debug, Clone)]
pub struct Plan {
    fragments: Vec<Arc<Fragment>>,
}

impl Plan {
    pub fn consists_of(fragments: Vec<Fragment>) -> Result<Self, ComposerError> {
        let mut seen = BTreeSet::new();
        for fragment in &fragments {
            if !seen.insert(fragment.position().clone()) {
                return Err(ComposerError::DuplicatePosition(
                    fragment.position().to_string(),
                ));
            }
        }

        let mut fragments: Vec<Arc<Fragment>> = fragments.into_iter().map(Arc::new).collect();
        fragments.sort_by(|a, b| a.position().cmp(b.position()));
        Ok(Self { fragments })
    }

    pub fn fragments(&self) -> &[Arc<Fragment>] {
        &self.fragments
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.fragments.iter().map(|f| f.position())
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Fetches all fragments concurrently. Must be called within a tokio runtime.
    pub async fn execute(&self, parameters: &Parameters, tracer: Arc<dyn Tracer>) -> Contents {
        PlanExecutor::new(tracer).execute(self, parameters).await
    }
}
