//! Common types and utilities for PR Insight

pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod time;

pub use config::Config;
pub use context::RepoContext;
pub use error::{Error, Result};
