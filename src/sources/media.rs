//! Media library enumerator backed by a filesystem scan.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
use crate::models::{MediaKind, MediaRecord, Record, SourceKind};
use crate::sources::{SourceEnumerator, SourceError};

/// Enumerates image and video files under the configured media roots.
///
/// Recency is taken from filesystem modification time. The scan runs on the
/// blocking pool; the library view can change between enumeration and
/// upload, so stale paths are expected downstream.
pub struct MediaLibrary {
    roots: Vec<PathBuf>,
}

impl MediaLibrary {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

/// Classify a path by extension; None for non-media files.
fn classify(path: &Path) -> Option<MediaKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
        Some(MediaKind::Video)
    } else {
        None
    }
}

fn scan(roots: &[PathBuf], limit: usize) -> Result<Vec<MediaRecord>, SourceError> {
    let mut found = Vec::new();
    let mut accessible_roots = 0usize;

    for root in roots {
        if !root.exists() {
            debug!("Media root {} does not exist, skipping", root.display());
            continue;
        }
        accessible_roots += 1;

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let kind = match classify(entry.path()) {
                Some(k) => k,
                None => continue,
            };
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    debug!("No metadata for {}: {}", entry.path().display(), e);
                    continue;
                }
            };
            let added_at = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);

            let path = entry.path().to_string_lossy().to_string();
            found.push(MediaRecord {
                id: path.clone(),
                display_name: entry.file_name().to_string_lossy().to_string(),
                file_path: path,
                added_at,
                size_bytes: metadata.len(),
                kind,
            });
        }
    }

    if accessible_roots == 0 && !roots.is_empty() {
        return Err(SourceError::Unavailable(
            "no media root is accessible".to_string(),
        ));
    }

    // Most recently added first, then truncate to the per-cycle cap
    found.sort_by(|a, b| b.added_at.cmp(&a.added_at));
    found.truncate(limit);
    Ok(found)
}

#[async_trait]
impl SourceEnumerator for MediaLibrary {
    fn kind(&self) -> SourceKind {
        SourceKind::Media
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, SourceError> {
        let roots = self.roots.clone();
        let records = tokio::task::spawn_blocking(move || scan(&roots, limit))
            .await
            .map_err(|e| {
                warn!("Media scan task failed: {}", e);
                SourceError::Unavailable(format!("media scan aborted: {e}"))
            })??;

        debug!("Enumerated {} media records", records.len());
        Ok(records.into_iter().map(Record::Media).collect())
    }
}
