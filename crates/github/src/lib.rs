//! GitHub API client for assembling PR snapshots

pub mod client;
pub mod snapshot;

pub use client::{parse_pr_url, ClientError, GitHubClient, PrRef};
pub use snapshot::SnapshotParts;
