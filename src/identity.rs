//! Persisted identity: subject id and per-install device identifier.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::constants::IDENTITY_FILE_NAME;

#[derive(Debug, Default, Serialize, Deserialize)]
struct IdentityFile {
    subject_id: Option<String>,
    device_id: Option<String>,
}

/// Local preference store backing `subject_id` and `device_identifier`.
///
/// State lives in one JSON file inside the state directory. The device
/// identifier is generated on first use and stable afterwards; the subject
/// id is provisioned by configuration or the CLI.
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Open (and create if needed) the identity store in `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self> {
        fs::create_dir_all(state_dir).context(format!(
            "Failed to create state directory {}",
            state_dir.display()
        ))?;
        Ok(Self {
            path: state_dir.join(IDENTITY_FILE_NAME),
        })
    }

    fn load(&self) -> Result<IdentityFile> {
        if !self.path.exists() {
            return Ok(IdentityFile::default());
        }
        let content = fs::read_to_string(&self.path).context(format!(
            "Failed to read identity file {}",
            self.path.display()
        ))?;
        serde_json::from_str(&content).context("Failed to parse identity file")
    }

    fn save(&self, file: &IdentityFile) -> Result<()> {
        let json = serde_json::to_string_pretty(file).context("Failed to serialize identity")?;
        fs::write(&self.path, json).context(format!(
            "Failed to write identity file {}",
            self.path.display()
        ))?;
        Ok(())
    }

    /// Owning user/account identifier attached to every delivery.
    pub fn subject_id(&self) -> Result<Option<String>> {
        Ok(self.load()?.subject_id)
    }

    pub fn set_subject_id(&self, subject_id: &str) -> Result<()> {
        let mut file = self.load()?;
        file.subject_id = Some(subject_id.to_string());
        self.save(&file)?;
        info!("Subject id persisted");
        Ok(())
    }

    /// Stable per-install device identifier, generated on first use.
    pub fn device_identifier(&self) -> Result<String> {
        let mut file = self.load()?;
        if let Some(id) = &file.device_id {
            return Ok(id.clone());
        }
        let id = uuid::Uuid::new_v4().to_string();
        debug!("Generated device identifier {}", id);
        file.device_id = Some(id.clone());
        self.save(&file)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_device_identifier_is_stable() {
        let dir = TempDir::new().unwrap();
        let store = IdentityStore::open(dir.path()).unwrap();
        let first = store.device_identifier().unwrap();
        let second = store.device_identifier().unwrap();
        assert_eq!(first, second);

        // A fresh handle over the same state dir sees the same id
        let reopened = IdentityStore::open(dir.path()).unwrap();
        assert_eq!(reopened.device_identifier().unwrap(), first);
    }

    #[test]
    fn test_subject_id_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = IdentityStore::open(dir.path()).unwrap();
        assert_eq!(store.subject_id().unwrap(), None);

        store.set_subject_id("user-42").unwrap();
        assert_eq!(store.subject_id().unwrap(), Some("user-42".to_string()));

        // Setting the subject must not clobber the device id
        let device = store.device_identifier().unwrap();
        store.set_subject_id("user-43").unwrap();
        assert_eq!(store.device_identifier().unwrap(), device);
    }
}
