//! Plan executor: fans out one task per fragment and fans the results back in.
//! Fragment failures are absorbed by the providers; a fragment that yields nothing,
//! or whose task dies, is simply absent from the result.

use crate::content::{Contents, Parameters, Position};
use crate::page::Plan;
use crate::tracer::Tracer;
use futures::stream::{FuturesUnordered, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

pub struct PlanExecutor {
    tracer: Arc<dyn Tracer>,
}

impl PlanExecutor {
    pub fn new(tracer: Arc<dyn Tracer>) -> Self {
        Self { tracer }
    }

    /// Runs every fragment of `plan` and waits until all of them have settled.
    ///
    /// Must be called within a tokio runtime; each fragment is spawned as its own task.
    pub async fn execute(&self, plan: &Plan, parameters: &Parameters) -> Contents {
        let started = Instant::now();
        let mut tasks = FuturesUnordered::new();

        for fragment in plan.fragments() {
            let task_fragment = Arc::clone(fragment);
            let tracer = Arc::clone(&self.tracer);
            let parameters = parameters.clone();
            let handle = tokio::spawn(async move {
                task_fragment
                    .provider()
                    .fetch(task_fragment.position(), tracer.as_ref(), &parameters)
                    .await
            });
            let position = fragment.position().clone();
            tasks.push(async move { (position, handle.await) });
        }

        let mut builder = Contents::builder();
        while let Some((position, outcome)) = tasks.next().await {
            match outcome {
                Ok(Some(content)) => {
                    debug!(position = %position, source = %content.source(), "Fragment fetched");
                    builder = builder.add(content);
                }
                Ok(None) => {
                    debug!(position = %position, "Fragment yielded no content");
                }
                Err(err) => {
                    error!(position = %position, error = %err, "Fragment task failed");
                }
            }
        }

        let contents = builder.build();
        info!(
            fragments = plan.len(),
            available = contents.len(),
            missing = %missing_positions(plan, &contents),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Plan executed"
        );
        contents
    }
}

fn missing_positions(plan: &Plan, contents: &Contents) -> String {
    plan.positions()
        .filter(|position| contents.find(position).is_none())
        .map(Position::name)
        .collect::<Vec<_>>()
        .join(",")
}
