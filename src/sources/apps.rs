//! Installed-application inventory enumerator.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;

use crate::models::{AppOrigin, AppRecord, Record, SourceKind};
use crate::sources::{SourceEnumerator, SourceError};

/// Enumerates installed applications from configured application roots.
///
/// On Linux desktops the conventional roots are `/usr/share/applications`
/// (system) and `~/.local/share/applications` (user); `.desktop` entries are
/// parsed for their display name, anything else falls back to the file stem.
pub struct AppInventory {
    system_roots: Vec<PathBuf>,
    user_roots: Vec<PathBuf>,
}

impl AppInventory {
    pub fn new(system_roots: Vec<PathBuf>, user_roots: Vec<PathBuf>) -> Self {
        Self {
            system_roots,
            user_roots,
        }
    }

    fn scan_root(root: &Path, origin: AppOrigin, out: &mut Vec<AppRecord>) {
        let entries = match fs::read_dir(root) {
            Ok(e) => e,
            Err(e) => {
                debug!("App root {} unreadable: {}", root.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if let Some(name) = app_name(&path) {
                out.push(AppRecord { name, origin });
            }
        }
    }
}

/// Display name for an application entry, or None for non-entries.
fn app_name(path: &Path) -> Option<String> {
    let is_desktop_entry = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("desktop"))
        .unwrap_or(false);

    if is_desktop_entry {
        let content = fs::read_to_string(path).ok()?;
        for line in content.lines() {
            if let Some(name) = line.strip_prefix("Name=") {
                let name = name.trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
        // Malformed entry, fall through to the stem
    }

    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

#[async_trait]
impl SourceEnumerator for AppInventory {
    fn kind(&self) -> SourceKind {
        SourceKind::Apps
    }

    async fn list(&self, limit: usize) -> Result<Vec<Record>, SourceError> {
        let mut apps = Vec::new();
        for root in &self.system_roots {
            Self::scan_root(root, AppOrigin::System, &mut apps);
        }
        for root in &self.user_roots {
            Self::scan_root(root, AppOrigin::User, &mut apps);
        }

        apps.truncate(limit);
        debug!("Enumerated {} installed applications", apps.len());
        Ok(apps.into_iter().map(Record::App).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_desktop_entry(dir: &Path, file: &str, name: &str) {
        let content = format!("[Desktop Entry]\nName={name}\nExec=/usr/bin/true\n");
        fs::write(dir.join(file), content).unwrap();
    }

    #[tokio::test]
    async fn test_desktop_entries_parsed_with_origin() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        write_desktop_entry(system.path(), "editor.desktop", "Text Editor");
        write_desktop_entry(user.path(), "game.desktop", "Puzzle Game");

        let source = AppInventory::new(
            vec![system.path().to_path_buf()],
            vec![user.path().to_path_buf()],
        );
        let records = source.list(50).await.unwrap();
        assert_eq!(records.len(), 2);

        let apps: Vec<&AppRecord> = records
            .iter()
            .map(|r| match r {
                Record::App(a) => a,
                other => panic!("unexpected record: {other:?}"),
            })
            .collect();

        let editor = apps.iter().find(|a| a.name == "Text Editor").unwrap();
        assert_eq!(editor.origin, AppOrigin::System);
        let game = apps.iter().find(|a| a.name == "Puzzle Game").unwrap();
        assert_eq!(game.origin, AppOrigin::User);
    }

    #[tokio::test]
    async fn test_malformed_entry_falls_back_to_stem() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.desktop"), "[Desktop Entry]\n").unwrap();

        let source = AppInventory::new(vec![dir.path().to_path_buf()], vec![]);
        let records = source.list(50).await.unwrap();
        assert_eq!(records.len(), 1);
        match &records[0] {
            Record::App(a) => assert_eq!(a.name, "broken"),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreadable_root_yields_empty_not_error() {
        let source = AppInventory::new(vec![PathBuf::from("/nonexistent/apps")], vec![]);
        let records = source.list(50).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_limit_truncates() {
        let dir = TempDir::new().unwrap();
        for i in 0..5 {
            write_desktop_entry(dir.path(), &format!("app{i}.desktop"), &format!("App {i}"));
        }
        let source = AppInventory::new(vec![dir.path().to_path_buf()], vec![]);
        let records = source.list(3).await.unwrap();
        assert_eq!(records.len(), 3);
    }
}
