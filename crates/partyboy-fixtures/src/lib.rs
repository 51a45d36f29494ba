//! Idempotent provisioning of the emulator's local test fixtures: boot ROMs,
//! test-ROM archives, the BIOS-skip snapshot, and the filtered CI test run.

pub mod archive;
pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod nextest;
pub mod process;
pub mod root;
pub mod snapshot;

pub use asset::{Asset, AssetKind, AssetSet};
pub use cache::{AssetCache, AssetStatus, CacheOutcome};
pub use config::PipelineConfig;
pub use error::{ProvisionError, Result};
pub use fetch::{Fetch, HttpFetcher, TlsMode, TrustPolicy};
pub use process::{ProcessCommand, ProcessRunner, SystemRunner};
pub use snapshot::SnapshotRequest;
