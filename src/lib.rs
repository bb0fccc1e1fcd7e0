//! # inventory-agent
//!
//! A background agent that enumerates local data sources (media library,
//! device metadata, installed applications, captured notification events)
//! on a fixed schedule and delivers each record to a remote collection
//! endpoint over HTTP.
//!
//! ## Overview
//!
//! The agent is built around a single collection-and-delivery pipeline:
//!
//! - A [`scheduler::Scheduler`] runs one cycle at startup and then one per
//!   fixed interval until stopped.
//! - Each cycle, the [`pipeline::CollectionPipeline`] pulls up to a capped
//!   number of records from every configured [`sources::SourceEnumerator`],
//!   derives upload jobs, and dispatches them with bounded concurrency.
//! - The [`upload::UploadClient`] posts each job as JSON or multipart form
//!   data, classifies the HTTP result, and never retries on its own.
//!
//! Partial failure is the normal case: a source that cannot be read is
//! skipped for the cycle, a rejected payload is dropped, and jobs still in
//! flight at the cycle deadline are abandoned and counted as failed. The
//! cycle itself always completes with a [`models::CycleReport`].
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use inventory_agent::pipeline::{CollectionPipeline, PipelineSettings};
//! use inventory_agent::scheduler::Scheduler;
//! use inventory_agent::sources::{MediaLibrary, SourceEnumerator};
//! use inventory_agent::upload::UploadClient;
//!
//! # fn main() -> anyhow::Result<()> {
//! let client = UploadClient::new(
//!     "https://collect.example.com",
//!     "user-7",
//!     Duration::from_secs(30),
//!     Duration::from_secs(60),
//! )?;
//!
//! let sources: Vec<Arc<dyn SourceEnumerator>> =
//!     vec![Arc::new(MediaLibrary::new(vec!["/data/photos".into()]))];
//!
//! let pipeline = CollectionPipeline::new(
//!     sources,
//!     Arc::new(client),
//!     PipelineSettings::default(),
//! );
//! let scheduler = Scheduler::new(Arc::new(pipeline), Duration::from_secs(1800));
//! scheduler.start();
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Records, upload jobs, outcomes, and cycle reports
//! - [`sources`]: Source enumerators for media, device, apps, and events
//! - [`pipeline`]: The per-cycle enumerate-cap-dispatch orchestration
//! - [`upload`]: HTTP delivery of jobs with timeout and status classification
//! - [`scheduler`]: Periodic cycle driver with start/stop state
//! - [`identity`]: Persisted subject id and device identifier
//! - [`config`]: Configuration management
//! - [`constants`]: Application-wide defaults

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models used throughout the agent
pub mod models;

/// Source enumerators producing records from host data sources
pub mod sources;

/// Per-cycle collection orchestration
pub mod pipeline;

/// HTTP upload subsystem
pub mod upload;

/// Periodic cycle scheduling
pub mod scheduler;

/// Persisted identity (subject id, device identifier)
pub mod identity;

/// Configuration management
pub mod config;

/// Application constants and default values
pub mod constants;
