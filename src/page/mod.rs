//! Page composition: a plan of fragments and the executor that fetches them.
//! Positions are independent; the executor runs every fragment concurrently and
//! collects whatever content arrives into [`Contents`](crate::content::Contents).

pub mod executor;
pub mod plan;

pub use executor::PlanExecutor;
pub use plan::{fragment, Fragment, Plan};
