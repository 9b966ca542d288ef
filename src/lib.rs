//! Data orchestration for AI insight reports.
//!
//! Presentation layers ask an [`InsightOrchestrator`] for a report kind and a
//! selection key (a date, an ISO week, a rolling window). The orchestrator
//! serves fresh cached values, collapses concurrent requests for the same
//! report into one service call, and never lets a slow response for an old
//! selection overwrite a newer one.

pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod insights;
pub mod logging;
pub mod orchestrator;
pub mod query;
pub mod selection;
pub mod state;
pub mod subscription;

#[cfg(test)]
mod testing;

pub use error::FetchError;
pub use orchestrator::InsightOrchestrator;
pub use selection::Generation;
pub use state::{ActiveState, ObservableState};
pub use subscription::Subscription;
