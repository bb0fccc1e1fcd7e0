//! Device descriptor enumerator. Yields a singleton record.

use async_trait::async_trait;
use log::debug;
use sysinfo::{System, SystemExt};

use crate::models::{now_millis, DeviceRecord, Record, SourceKind};
use crate::sources::{SourceEnumerator, SourceError};

/// Describes the host device from system information.
///
/// The device identifier is injected at construction so the enumerator
/// itself stays free of persisted state.
pub struct DeviceInfo {
    device_id: String,
}

impl DeviceInfo {
    pub fn new(device_id: String) -> Self {
        Self { device_id }
    }

    fn describe(&self) -> DeviceRecord {
        let system = System::new();

        let model = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown-host".to_string());

        // Major kernel version stands in for a platform API level
        let sdk_level = system
            .kernel_version()
            .and_then(|v| v.split('.').next().and_then(|m| m.parse::<u32>().ok()))
            .unwrap_or(0);

        DeviceRecord {
            manufacturer: system.name().unwrap_or_else(|| "unknown".to_string()),
            model,
            os_version: system.os_version().unwrap_or_else(|| "unknown".to_string()),
            sdk_level,
            device_id: self.device_id.clone(),
            observed_at: now_millis(),
        }
    }
}

#[async_trait]
impl SourceEnumerator for DeviceInfo {
    fn kind(&self) -> SourceKind {
        SourceKind::Device
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, SourceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let record = self.describe();
        debug!(
            "Enumerated device record for {} ({})",
            record.model, record.device_id
        );
        Ok(vec![Record::Device(record)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_device_is_singleton() {
        let source = DeviceInfo::new("device-123".to_string());
        let records = source.list(50).await.unwrap();
        assert_eq!(records.len(), 1);
        match &records[0] {
            Record::Device(d) => {
                assert_eq!(d.device_id, "device-123");
                assert!(d.observed_at > 0);
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_zero_limit_yields_nothing() {
        let source = DeviceInfo::new("device-123".to_string());
        let records = source.list(0).await.unwrap();
        assert!(records.is_empty());
    }
}
