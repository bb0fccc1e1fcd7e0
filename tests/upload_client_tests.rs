//! Integration tests for the HTTP upload client against a local stub
//! server, verifying encoding and status classification without a real
//! collection endpoint.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use inventory_agent::models::{
    AppOrigin, AppRecord, DeviceRecord, JobPayload, MediaKind, MediaRecord, Outcome, SourceKind,
    UploadJob,
};
use inventory_agent::upload::{Deliver, UploadClient};

/// Minimal one-shot HTTP stub: accepts a single connection, reads one full
/// request, answers with the given status line, and hands the captured
/// request back through the join handle.
async fn stub_server(status: &'static str) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 8192];

        // Read headers, then the content-length body
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break request.len();
            }
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = find_subsequence(&request, b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let content_length = parse_content_length(&request[..header_end]);
        while request.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let response = format!("HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_content_length(headers: &[u8]) -> usize {
    let text = String::from_utf8_lossy(headers);
    text.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if name.eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0)
}

fn client(base_url: &str) -> UploadClient {
    UploadClient::new(
        base_url,
        "user-7",
        Duration::from_secs(5),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn device_job() -> UploadJob {
    UploadJob {
        source: SourceKind::Device,
        payload: JobPayload::Device(DeviceRecord {
            manufacturer: "acme".to_string(),
            model: "host-1".to_string(),
            os_version: "1.2.3".to_string(),
            sdk_level: 6,
            device_id: "device-1".to_string(),
            observed_at: 1_700_000_000_000,
        }),
    }
}

#[tokio::test]
async fn test_2xx_is_delivered_with_subject_attached() {
    let (base_url, captured) = stub_server("201 Created").await;
    let outcome = client(&base_url).deliver(&device_job()).await;
    assert_eq!(outcome, Outcome::Delivered);

    let request = captured.await.unwrap();
    let text = String::from_utf8_lossy(&request);
    assert!(text.starts_with("POST /device/info"));
    assert!(text.contains("\"userId\":\"user-7\""));
    assert!(text.contains("\"deviceId\":\"device-1\""));
}

#[tokio::test]
async fn test_4xx_is_rejected() {
    let (base_url, _captured) = stub_server("400 Bad Request").await;
    let outcome = client(&base_url).deliver(&device_job()).await;
    assert_eq!(outcome, Outcome::Rejected("HTTP 400".to_string()));
}

#[tokio::test]
async fn test_5xx_is_failed() {
    let (base_url, _captured) = stub_server("503 Service Unavailable").await;
    let outcome = client(&base_url).deliver(&device_job()).await;
    assert_eq!(outcome, Outcome::Failed("HTTP 503".to_string()));
}

#[tokio::test]
async fn test_connection_error_is_failed() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let outcome = client(&base_url).deliver(&device_job()).await;
    assert!(matches!(outcome, Outcome::Failed(_)));
}

#[tokio::test]
async fn test_multipart_media_upload() {
    let dir = tempfile::TempDir::new().unwrap();
    let file_path = dir.path().join("photo.jpg");
    std::fs::write(&file_path, b"fake image bytes").unwrap();

    let job = UploadJob {
        source: SourceKind::Media,
        payload: JobPayload::MediaFile(MediaRecord {
            id: "m1".to_string(),
            display_name: "photo.jpg".to_string(),
            file_path: file_path.to_string_lossy().to_string(),
            added_at: 1,
            size_bytes: 16,
            kind: MediaKind::Image,
        }),
    };

    let (base_url, captured) = stub_server("200 OK").await;
    let outcome = client(&base_url).deliver(&job).await;
    assert_eq!(outcome, Outcome::Delivered);

    let request = captured.await.unwrap();
    let text = String::from_utf8_lossy(&request);
    assert!(text.starts_with("POST /media/upload"));
    assert!(text.contains("multipart/form-data"));
    assert!(text.contains("name=\"file\""));
    assert!(text.contains("name=\"metadata\""));
    assert!(text.contains("name=\"type\""));
    assert!(text.contains("images"));
    assert!(text.contains("name=\"userId\""));
    assert!(text.contains("fake image bytes"));
}

#[tokio::test]
async fn test_apps_batch_shape_on_wire() {
    let job = UploadJob {
        source: SourceKind::Apps,
        payload: JobPayload::Apps(vec![
            AppRecord {
                name: "Text Editor".to_string(),
                origin: AppOrigin::System,
            },
            AppRecord {
                name: "Puzzle Game".to_string(),
                origin: AppOrigin::User,
            },
        ]),
    };

    let (base_url, captured) = stub_server("200 OK").await;
    let outcome = client(&base_url).deliver(&job).await;
    assert_eq!(outcome, Outcome::Delivered);

    let request = captured.await.unwrap();
    let text = String::from_utf8_lossy(&request);
    assert!(text.starts_with("POST /apps/list"));

    let body_start = text.find("\r\n\r\n").unwrap() + 4;
    let body: serde_json::Value = serde_json::from_str(&text[body_start..]).unwrap();
    assert_eq!(body["userId"], "user-7");
    assert_eq!(body["apps"].as_array().unwrap().len(), 2);
    assert_eq!(body["apps"][1]["origin"], "user");
}
