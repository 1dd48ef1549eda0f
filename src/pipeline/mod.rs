//! # Feed synchronization pipeline
//!
//! Keeps a local mirror of the remote transfer feed:
//!
//! 1. `fetcher` pulls one full snapshot per call
//! 2. `detector` decides whether it differs from the held snapshot
//! 3. `scheduler` runs fetch/compare/apply on a fixed cadence
//! 4. `filter` derives the prefix-filtered projection of the held snapshot
//!
//! State lives in [`crate::state`]; this module only computes and drives.

pub mod detector;
pub mod fetcher;
pub mod filter;
pub mod scheduler;
pub mod types;

pub use detector::differs;
pub use fetcher::{FetchError, HttpFetcher, SnapshotSource};
pub use filter::project;
pub use scheduler::{run_cycle, CycleOutcome, PollHandle, PollScheduler};
pub use types::{SignedTransaction, SlotGroup, Snapshot, Transfer};
