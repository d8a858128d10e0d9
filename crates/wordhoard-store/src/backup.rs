//! Timestamped backups of the data file with count-based rotation.
//!
//! A backup of `vocabulary.json` is a plain copy named
//! `vocabulary.json.backup.<YYYYmmdd_HHMMSS_ffffff>`. The timestamp is fixed
//! width, so lexical order is chronological order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use wordhoard_core::traits::BackupInfo;
use wordhoard_core::StorageError;

const BACKUP_MARKER: &str = ".backup.";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";

/// Whether backups are taken and how many are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    pub enabled: bool,
    pub keep: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            keep: 5,
        }
    }
}

/// Path of the backup of `data_file` taken at `at`.
pub fn backup_path(data_file: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut name = data_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(BACKUP_MARKER);
    name.push(at.format(STAMP_FORMAT).to_string());
    data_file.with_file_name(name)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Existing backups of `data_file`, newest first.
pub fn list_backups(data_file: &Path) -> Result<Vec<PathBuf>, StorageError> {
    let Some(file_name) = data_file.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{file_name}{BACKUP_MARKER}");
    let dir = parent_dir(data_file);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut backups = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && entry.file_type()?.is_file() {
            backups.push(entry.path());
        }
    }
    backups.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(backups)
}

/// Delete all but the newest `keep` backups. Returns how many were removed.
pub fn rotate(data_file: &Path, keep: usize) -> Result<usize, StorageError> {
    let mut removed = 0;
    for old in list_backups(data_file)?.into_iter().skip(keep) {
        fs::remove_file(&old)?;
        tracing::debug!(path = %old.display(), "removed old backup");
        removed += 1;
    }
    Ok(removed)
}

/// Copy the data file to a fresh backup, then rotate.
pub fn create_backup(
    data_file: &Path,
    policy: BackupPolicy,
    now: DateTime<Utc>,
) -> Result<BackupInfo, StorageError> {
    if !policy.enabled {
        return Err(StorageError::BackupDisabled);
    }
    if !data_file.exists() {
        return Err(StorageError::NothingToBackup(
            data_file.display().to_string(),
        ));
    }

    let location = backup_path(data_file, now);
    fs::copy(data_file, &location)?;
    let removed = rotate(data_file, policy.keep)?;
    tracing::info!(path = %location.display(), removed, "backup written");

    Ok(BackupInfo {
        location,
        created_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn backup_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 5).unwrap();
        let path = backup_path(Path::new("data/vocabulary.json"), at);
        assert_eq!(
            path,
            PathBuf::from("data/vocabulary.json.backup.20240701_093005_000000")
        );
    }

    #[test]
    fn missing_data_file_has_nothing_to_back_up() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_backup(&dir.path().join("none.json"), BackupPolicy::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, StorageError::NothingToBackup(_)));
    }

    #[test]
    fn disabled_policy() {
        let dir = tempfile::tempdir().unwrap();
        let policy = BackupPolicy {
            enabled: false,
            keep: 5,
        };
        let err = create_backup(&dir.path().join("v.json"), policy, Utc::now()).unwrap_err();
        assert!(matches!(err, StorageError::BackupDisabled));
    }

    #[test]
    fn rotation_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("vocabulary.json");
        fs::write(&data, "{}").unwrap();
        fs::write(dir.path().join("unrelated.json.backup.1"), "").unwrap();

        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let policy = BackupPolicy {
            enabled: true,
            keep: 3,
        };
        let mut created = Vec::new();
        for i in 0..5 {
            let info = create_backup(&data, policy, start + Duration::minutes(i)).unwrap();
            created.push(info.location);
        }

        let remaining = list_backups(&data).unwrap();
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0], created[4]);
        assert_eq!(remaining[2], created[2]);
        assert!(dir.path().join("unrelated.json.backup.1").exists());
    }
}
