//! # compacter-jobs
//!
//! Background compression jobs for compacter.
//!
//! This crate provides:
//! - The per-video compression handler (URI validation, storage check,
//!   target policy, transcode, result recording)
//! - A chained worker: round-robin chains run in parallel, jobs within a
//!   chain run in order, and a failure cancels the rest of its chain
//! - Linear retry backoff
//! - Progress and lifecycle notifications via broadcast channels
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use compacter_jobs::{CompressionHandler, JobWorker, WorkerConfig};
//! use compacter_core::{MemoryStore, QueueStore, ResultStore, SettingsStore};
//!
//! let kv = Arc::new(MemoryStore::new());
//! let handler = CompressionHandler::new(
//!     transcoder,
//!     storage,
//!     ResultStore::new(kv.clone()),
//!     SettingsStore::new(kv.clone()),
//! );
//! let worker = JobWorker::new(handler, WorkerConfig::from_env());
//!
//! // Drain the queue and listen for events
//! let handle = worker.start_queue(&QueueStore::new(kv)).await?;
//! let mut events = handle.events();
//! while let Ok(event) = events.recv().await {
//!     println!("Event: {:?}", event);
//! }
//! let summary = handle.wait().await?;
//! ```

pub mod compression;
pub mod handler;
pub mod job;
pub mod worker;

// Re-export core types
pub use compacter_core::*;

pub use compression::{CompressionHandler, CompressionOutcome};
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler, ProgressCallback};
pub use job::CompressionJob;
pub use worker::{JobWorker, WorkerConfig, WorkerEvent, WorkerHandle, WorkerSummary};
