//! Source enumerators producing records from host data sources.
//!
//! Each enumerator turns one host data source into a bounded batch of
//! records. Enumeration is a read-only operation and is safe to repeat;
//! a failing source reports a [`SourceError`] and the collection pipeline
//! carries on with the remaining sources.

pub mod apps;
pub mod device;
pub mod events;
pub mod media;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Record, SourceKind};

pub use apps::AppInventory;
pub use device::DeviceInfo;
pub use events::EventSpool;
pub use media::MediaLibrary;

/// Why a source could not be enumerated this cycle.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error reading source: {0}")]
    Io(#[from] std::io::Error),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Trait for source enumerators.
///
/// `list` returns at most `limit` records, most-recently-added first when
/// the source has a natural recency ordering (media, events). Implementors
/// must not mutate host state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SourceEnumerator: Send + Sync {
    fn kind(&self) -> SourceKind;
    async fn list(&self, limit: usize) -> Result<Vec<Record>, SourceError>;
}
