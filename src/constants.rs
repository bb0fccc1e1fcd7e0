//! Global constants for the inventory agent.
//!
//! This module centralizes all hardcoded values to improve maintainability
//! and make configuration changes easier.

// Collection cycle constants
/// Default number of records requested from each source per cycle
pub const DEFAULT_MAX_PER_SOURCE: usize = 50;

/// Default attachment size cap for multipart media uploads (10MB)
pub const DEFAULT_MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Default number of uploads allowed in flight simultaneously
pub const DEFAULT_MAX_CONCURRENT_UPLOADS: usize = 4;

/// Default interval between collection cycles (30 minutes)
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 30 * 60;

/// Safety margin subtracted from the cycle interval to form the cycle deadline
pub const DEFAULT_CYCLE_DEADLINE_MARGIN_SECS: u64 = 60;

// HTTP timeout constants
/// Default connection timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default whole-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Delivery endpoints (relative to the configured base URL)
pub const ENDPOINT_MEDIA_UPLOAD: &str = "/media/upload";
pub const ENDPOINT_MEDIA_METADATA: &str = "/media/metadata";
pub const ENDPOINT_DEVICE_INFO: &str = "/device/info";
pub const ENDPOINT_APPS_LIST: &str = "/apps/list";
pub const ENDPOINT_NOTIFICATIONS_STORE: &str = "/notifications/store";

// Media classification
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "heic", "tiff",
];

pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "mkv", "avi", "webm", "mpg", "mpeg", "3gp",
];

// File paths and names
/// File name of the persisted identity state inside the state directory
pub const IDENTITY_FILE_NAME: &str = "identity.json";

/// Default state directory when none is configured
pub const DEFAULT_STATE_DIR: &str = ".inventory-agent";
