//! Upload subsystem: durable HTTP delivery of upload jobs.

pub mod client;

pub use client::{Deliver, UploadClient};
