//! Backup snapshots.
//!
//! A snapshot is an immutable, timestamped copy of every collection file plus
//! a manifest, stored under its own directory. Restore is all-or-nothing:
//! every snapshot file is parsed and staged first, and the live files are
//! only replaced via the same temp-then-rename discipline the store uses.
//! Retention follows the original cadence: one automatic snapshot per day,
//! pruned after a configurable number of days.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::record::store::{load_collection, stage_collection, Store};
use crate::record::{Goal, Grade, Kind, Note, ProgressEntry, Reminder, Subject};

pub const DEFAULT_KEEP_DAYS: i64 = 30;
const AUTO_INTERVAL_HOURS: i64 = 24;
const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<String>,
    pub total_bytes: u64,
}

/// What an `auto` run did.
#[derive(Debug)]
pub struct AutoBackup {
    pub created: Option<SnapshotInfo>,
    pub pruned: usize,
}

pub struct BackupManager {
    data_dir: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(data_dir: &Path, backup_dir: &Path) -> Self {
        BackupManager {
            data_dir: data_dir.to_path_buf(),
            backup_dir: backup_dir.to_path_buf(),
        }
    }

    /// Copy every existing collection file into a new timestamped snapshot
    /// directory and write its manifest.
    pub fn snapshot(&self) -> Result<SnapshotInfo> {
        let created_at = Utc::now();
        let id = created_at.format("%Y%m%d_%H%M%S").to_string();
        let snapshot_dir = self.backup_dir.join(&id);
        fs::create_dir_all(&snapshot_dir)?;

        let mut files = Vec::new();
        let mut total_bytes = 0u64;

        for kind in Kind::ALL {
            let source = self.data_dir.join(kind.file_name());
            if !source.exists() {
                continue;
            }
            total_bytes += fs::copy(&source, snapshot_dir.join(kind.file_name()))?;
            files.push(kind.file_name().to_string());
        }

        let info = SnapshotInfo { id, created_at, files, total_bytes };
        let manifest = serde_json::to_string_pretty(&info).map_err(|source| Error::Corrupt {
            path: snapshot_dir.join(MANIFEST_FILE).display().to_string(),
            source,
        })?;
        fs::write(snapshot_dir.join(MANIFEST_FILE), manifest)?;

        info!(id = %info.id, files = info.files.len(), "created backup snapshot");
        Ok(info)
    }

    /// All snapshots, newest first. Directories without a readable manifest
    /// are skipped rather than failing the listing.
    pub fn list(&self) -> Result<Vec<SnapshotInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let manifest_path = entry.path().join(MANIFEST_FILE);
            let Ok(content) = fs::read_to_string(&manifest_path) else {
                continue;
            };
            let Ok(info) = serde_json::from_str::<SnapshotInfo>(&content) else {
                continue;
            };
            snapshots.push(info);
        }

        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(snapshots)
    }

    pub fn latest(&self) -> Result<Option<SnapshotInfo>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Replace every live collection with the snapshot's contents.
    ///
    /// All-or-nothing across collection kinds: each snapshot file is parsed
    /// into its typed collection and staged into a temp file before any live
    /// file is touched, and a rename failure mid-commit rewrites the already
    /// replaced collections from the untouched in-memory state. A file
    /// absent from the snapshot means that collection was empty at snapshot
    /// time.
    pub fn restore(&self, id: &str, store: &mut Store) -> Result<()> {
        let snapshot_dir = self.backup_dir.join(id);
        if !snapshot_dir.join(MANIFEST_FILE).exists() {
            return Err(Error::NotFound {
                kind: "snapshot",
                id: id.to_string(),
            });
        }

        // parse everything first
        let subjects: Vec<Subject> = load_collection(&snapshot_dir, Kind::Subjects)?;
        let grades: Vec<Grade> = load_collection(&snapshot_dir, Kind::Grades)?;
        let goals: Vec<Goal> = load_collection(&snapshot_dir, Kind::Goals)?;
        let progress: Vec<ProgressEntry> = load_collection(&snapshot_dir, Kind::Progress)?;
        let reminders: Vec<Reminder> = load_collection(&snapshot_dir, Kind::Reminders)?;
        let notes: Vec<Note> = load_collection(&snapshot_dir, Kind::Notes)?;

        // stage all six temp files before touching any live file
        let data_dir = store.data_dir().to_path_buf();
        let mut staged: Vec<(PathBuf, Kind)> = Vec::new();
        let stage_result = (|| -> Result<()> {
            staged.push((stage_collection(&data_dir, Kind::Subjects, &subjects)?, Kind::Subjects));
            staged.push((stage_collection(&data_dir, Kind::Grades, &grades)?, Kind::Grades));
            staged.push((stage_collection(&data_dir, Kind::Goals, &goals)?, Kind::Goals));
            staged.push((stage_collection(&data_dir, Kind::Progress, &progress)?, Kind::Progress));
            staged.push((stage_collection(&data_dir, Kind::Reminders, &reminders)?, Kind::Reminders));
            staged.push((stage_collection(&data_dir, Kind::Notes, &notes)?, Kind::Notes));
            Ok(())
        })();
        if let Err(e) = stage_result {
            remove_temps(&staged);
            return Err(e);
        }

        // commit; on a mid-sequence rename failure, rewrite the collections
        // already replaced from the store's in-memory (pre-restore) state
        let mut renamed: Vec<Kind> = Vec::new();
        for (tmp, kind) in &staged {
            if let Err(e) = fs::rename(tmp, data_dir.join(kind.file_name())) {
                for kind in &renamed {
                    let _ = store.rewrite(*kind);
                }
                remove_temps(&staged);
                return Err(e.into());
            }
            renamed.push(*kind);
        }

        store.reload()?;
        info!(id, "restored snapshot");
        Ok(())
    }

    /// Remove snapshots older than the retention window. Returns how many
    /// snapshot directories were removed.
    pub fn prune(&self, keep_days: i64) -> Result<usize> {
        let cutoff = Utc::now() - Duration::days(keep_days);
        let mut removed = 0;

        for info in self.list()? {
            if info.created_at < cutoff {
                fs::remove_dir_all(self.backup_dir.join(&info.id))?;
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, keep_days, "pruned old snapshots");
        }
        Ok(removed)
    }

    /// Daily cadence: snapshot only if the newest one is older than 24 h
    /// (or none exists), then prune.
    pub fn auto(&self, keep_days: i64) -> Result<AutoBackup> {
        let due = match self.latest()? {
            None => true,
            Some(last) => Utc::now() - last.created_at >= Duration::hours(AUTO_INTERVAL_HOURS),
        };

        let created = if due { Some(self.snapshot()?) } else { None };
        let pruned = if created.is_some() { self.prune(keep_days)? } else { 0 };

        Ok(AutoBackup { created, pruned })
    }
}

fn remove_temps(staged: &[(PathBuf, Kind)]) {
    for (tmp, _) in staged {
        let _ = fs::remove_file(tmp);
    }
}
