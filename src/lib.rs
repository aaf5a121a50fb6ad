//! Composer: Concurrent Page Composition
//!
//! Fetches the fragments of a page (one per named position) concurrently from
//! remote services and assembles whatever content arrives. Each position is
//! served by a [`ContentProvider`](provider::ContentProvider): an HTTP fetch,
//! optionally wrapped in retry, circuit breaker, timeout and fallback, or a
//! selection strategy over several providers. Failures never abort the page;
//! they are absorbed, traced and logged, and the affected position stays empty.

pub mod client;
pub mod config;
pub mod content;
pub mod error;
pub mod http;
pub mod logging;
pub mod page;
pub mod provider;
pub mod resilience;
pub mod tracer;

pub use client::{ClientConfig, ServiceClient, ServiceClients};
pub use config::{ComposerConfig, ConfigLoader};
pub use content::{Availability, Content, Contents, Headers, Parameters, Position};
pub use error::ComposerError;
pub use page::{Fragment, Plan, PlanExecutor};
pub use provider::ContentProvider;
pub use tracer::{NoOpTracer, TraceEvent, Tracer};
