//! Selection among concurrently running fetches for one position.
//!
//! Branches are polled in declared order on every wake-up, which gives both
//! strategies a deterministic tie-break. Branches that lose are dropped; a request
//! they had in flight is abandoned and its result discarded.

use crate::content::{Content, Position};
use futures::future::{self, BoxFuture};
use std::task::{Context, Poll};
use tracing::debug;

enum Branch<'a, T> {
    Pending(BoxFuture<'a, T>),
    Settled(T),
}

impl<T> Branch<'_, T> {
    fn poll_settle(&mut self, cx: &mut Context<'_>) {
        if let Branch::Pending(fut) = self {
            if let Poll::Ready(value) = fut.as_mut().poll(cx) {
                *self = Branch::Settled(value);
            }
        }
    }
}

impl Branch<'_, Option<Content>> {
    fn take(&mut self) -> Option<Content> {
        match std::mem::replace(self, Branch::Settled(None)) {
            Branch::Settled(content) => content,
            Branch::Pending(_) => None,
        }
    }
}

/// First branch in declared order that yields content.
///
/// Returns as soon as every earlier branch has settled without content and the
/// current one has content; later branches are dropped at that point.
pub(crate) async fn priority_first<'a>(
    position: &Position,
    branches: Vec<BoxFuture<'a, Option<Content>>>,
) -> Option<Content> {
    let mut branches: Vec<Branch<'a, Option<Content>>> =
        branches.into_iter().map(Branch::Pending).collect();

    let selected = future::poll_fn(|cx| {
        for branch in branches.iter_mut() {
            branch.poll_settle(cx);
        }
        for (index, branch) in branches.iter_mut().enumerate() {
            match branch {
                Branch::Pending(_) => return Poll::Pending,
                Branch::Settled(None) => continue,
                Branch::Settled(Some(_)) => return Poll::Ready(Some((index, branch.take()))),
            }
        }
        Poll::Ready(None)
    })
    .await;

    match selected {
        Some((index, content)) => {
            debug!(position = %position, index, "Selected first content in priority order");
            content
        }
        None => {
            debug!(position = %position, "No provider yielded content");
            None
        }
    }
}

/// Content of whichever branch yields first.
///
/// Branches ready within the same wake-up resolve to declared order.
pub(crate) async fn quickest<'a>(
    position: &Position,
    branches: Vec<BoxFuture<'a, Option<Content>>>,
) -> Option<Content> {
    let mut branches: Vec<Branch<'a, Option<Content>>> =
        branches.into_iter().map(Branch::Pending).collect();

    let selected = future::poll_fn(|cx| {
        let mut pending = false;
        for (index, branch) in branches.iter_mut().enumerate() {
            branch.poll_settle(cx);
            match branch {
                Branch::Pending(_) => pending = true,
                Branch::Settled(None) => {}
                Branch::Settled(Some(_)) => return Poll::Ready(Some((index, branch.take()))),
            }
        }
        if pending {
            Poll::Pending
        } else {
            Poll::Ready(None)
        }
    })
    .await;

    match selected {
        Some((index, content)) => {
            debug!(position = %position, index, "Selected quickest content");
            content
        }
        None => {
            debug!(position = %position, "No provider yielded content");
            None
        }
    }
}

/// Every content of every branch, in declared order.
pub(crate) async fn all<'a>(branches: Vec<BoxFuture<'a, Vec<Content>>>) -> Vec<Content> {
    future::join_all(branches)
        .await
        .into_iter()
        .flatten()
        .collect()
}
