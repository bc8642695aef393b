//! Core pipeline orchestration for prdocs.
//!
//! This crate ties together change-set listing, content retrieval, synthesis
//! and persistence into the end-to-end event-to-documentation flow.

pub mod persist;
pub mod pipeline;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use persist::DocPersister;
pub use pipeline::{BatchProgress, Pipeline, SilentProgress};
pub use router::{Disposition, EventRouter, InboundEvent, RouteOutcome};
