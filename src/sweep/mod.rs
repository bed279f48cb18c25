//! Sweep
//!
//! Pulls documents and their revision history from a [`DocumentSource`],
//! turns them into statistics and persists the result.
//!
//! [`DocumentSource`]: crate::source::DocumentSource

pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod report;
pub mod revision;
pub mod task_manager;

pub use config::SweepConfig;
pub use document::{DocumentOutcome, DocumentStatAggregator, SkippedRevision};
pub use engine::SweepEngine;
pub use error::{SweepError, SweepResult};
pub use report::{DocumentReport, DocumentStatus, SweepReport};
pub use revision::RevisionStatBuilder;
pub use task_manager::TaskManager;
