//! Notification event enumerator backed by a JSON spool directory.

use std::path::PathBuf;

use async_trait::async_trait;
use log::debug;

use crate::models::{EventRecord, Record, SourceKind};
use crate::sources::{SourceEnumerator, SourceError};

/// Reads captured notification events from a spool directory.
///
/// The notification-delivery subsystem writes one JSON document per file;
/// this enumerator only reads them, so repeated enumeration is safe.
/// Unparseable files are skipped, a missing spool directory means the
/// source is unavailable this cycle.
pub struct EventSpool {
    dir: PathBuf,
}

impl EventSpool {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

#[async_trait]
impl SourceEnumerator for EventSpool {
    fn kind(&self) -> SourceKind {
        SourceKind::Events
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, SourceError> {
        let mut dir = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                SourceError::PermissionDenied(self.dir.display().to_string())
            } else {
                SourceError::Unavailable(format!("event spool {}: {e}", self.dir.display()))
            }
        })?;

        let mut events = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension() != Some(std::ffi::OsStr::new("json")) {
                continue;
            }
            let content = match tokio::fs::read_to_string(&path).await {
                Ok(c) => c,
                Err(e) => {
                    debug!("Skipping unreadable event file {}: {}", path.display(), e);
                    continue;
                }
            };
            match serde_json::from_str::<EventRecord>(&content) {
                Ok(event) => events.push(event),
                Err(e) => {
                    debug!("Skipping malformed event file {}: {}", path.display(), e);
                }
            }
        }

        // Most recently posted first, then truncate to the per-cycle cap
        events.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        events.truncate(limit);

        debug!("Enumerated {} notification events", events.len());
        Ok(events.into_iter().map(Record::Event).collect())
    }
}
