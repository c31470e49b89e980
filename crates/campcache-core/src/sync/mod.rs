//! Fetch → decode → persist pipeline.
//!
//! `SyncOrchestrator` runs one sync cycle per activation and hands the
//! caller a `SyncSession`: the live campground feed plus a status signal
//! that reports which stage the cycle is in and how it ended.

pub mod orchestrator;
pub mod status;

pub use orchestrator::{SyncError, SyncOrchestrator, SyncSession};
pub use status::{SyncFailure, SyncStage, SyncStatus, ViewState};
