//! # compacter-core
//!
//! Core types, the compression target policy, collaborator traits, and
//! durable stores for compacter.
//!
//! This crate provides the data structures and trait definitions that the
//! search and jobs crates depend on, plus the bitrate/resolution policy that
//! turns a requested output-size percentage into encoder parameters.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod policy;
pub mod store;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use policy::{
    bits_per_pixel, compute_compression_target, compute_compression_target_with,
    estimate_output_size, PolicyConfig,
};
pub use store::{MemoryStore, QueueStore, ResultStore, SettingsStore};
pub use traits::*;
