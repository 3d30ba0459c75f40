//! Timestamped copies of the PIN file with rotation and restore

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDateTime};
use log::{debug, error, info};

use crate::{Error, Result};

/// Number of backups retained by [BackupManager::create_backup]
pub const DEFAULT_KEEP_COUNT: usize = 10;

/// Backup file names are the creation time in this format plus a `.json` extension
const BACKUP_NAME_FORMAT: &str = "%y%m%d_%H%M%S";

/// Creates, lists, rotates and restores backups of a PIN file
#[derive(Clone, Debug)]
pub struct BackupManager {
    pins_file: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Creates a manager for `pins_file` that keeps backups in `backup_dir`, creating the folder if
    /// necessary.
    pub fn new(pins_file: &Path, backup_dir: &Path) -> Result<Self> {
        if !backup_dir.exists() {
            if let Err(e) = fs::create_dir_all(backup_dir) {
                error!("Failed to create {}: {e}", backup_dir.display());
                return Err(Error::Io);
            }
        }
        Ok(BackupManager {
            pins_file: pins_file.to_path_buf(),
            backup_dir: backup_dir.to_path_buf(),
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copies the PIN file into the backup folder then prunes all but the newest
    /// [DEFAULT_KEEP_COUNT] backups. Returns the name of the new backup.
    pub fn create_backup(&self) -> Result<String> {
        self.create_backup_at(Local::now().naive_local())
    }

    /// As [create_backup](BackupManager::create_backup) but names the backup after `time`.
    pub fn create_backup_at(&self, time: NaiveDateTime) -> Result<String> {
        if !self.pins_file.exists() {
            error!(
                "Backup failed: {} does not exist",
                self.pins_file.display()
            );
            return Err(Error::NotFound);
        }

        let backup_name = format!("{}.json", time.format(BACKUP_NAME_FORMAT));
        fs::copy(&self.pins_file, self.backup_dir.join(&backup_name))?;
        info!("Created backup {backup_name}");

        self.cleanup_old_backups(DEFAULT_KEEP_COUNT);
        Ok(backup_name)
    }

    /// Returns backup file names, newest first
    pub fn list_backups(&self) -> Vec<String> {
        let mut backups = vec![];
        match fs::read_dir(&self.backup_dir) {
            Ok(entries) => {
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                            backups.push(name.to_string());
                        }
                    }
                }
            }
            Err(e) => {
                debug!("Failed to read {}: {e}", self.backup_dir.display());
            }
        }
        backups.sort_by(|a, b| b.cmp(a));
        backups
    }

    /// Creation time of the newest backup, if any backup name can be parsed
    pub fn latest_backup_time(&self) -> Option<NaiveDateTime> {
        self.list_backups().iter().find_map(|name| {
            let stem = name.strip_suffix(".json")?;
            NaiveDateTime::parse_from_str(stem, BACKUP_NAME_FORMAT).ok()
        })
    }

    /// Returns true when no backup exists or the newest one is at least `interval_minutes` old
    pub fn backup_due(&self, interval_minutes: u64, now: NaiveDateTime) -> bool {
        match self.latest_backup_time() {
            Some(latest) => u64::try_from((now - latest).num_minutes())
                .map_or(false, |elapsed| elapsed >= interval_minutes),
            None => true,
        }
    }

    /// Replaces the PIN file with the contents of the named backup. The backup must hold a JSON
    /// object. If writing fails, the previous PIN file is put back.
    pub fn restore_backup(&self, backup_name: &str) -> Result<()> {
        if backup_name.contains(['/', '\\']) {
            error!("Backup name {backup_name} must not contain a path");
            return Err(Error::BadInput);
        }
        let backup_path = self.backup_dir.join(backup_name);
        if !backup_path.is_file() {
            error!("Backup {backup_name} does not exist");
            return Err(Error::NotFound);
        }

        let contents = fs::read_to_string(&backup_path)?;
        let backup_data: serde_json::Value = serde_json::from_str(&contents)?;
        if !backup_data.is_object() {
            error!("Backup {backup_name} does not contain a JSON object");
            return Err(Error::BadInput);
        }

        let temp_backup = self.pins_file.with_extension("temp");
        let had_pins_file = self.pins_file.exists();
        if had_pins_file {
            fs::copy(&self.pins_file, &temp_backup)?;
        }

        let json = serde_json::to_string_pretty(&backup_data)?;
        if let Err(e) = fs::write(&self.pins_file, json) {
            error!("Failed to restore backup {backup_name}: {e}");
            if had_pins_file {
                if let Err(e) = fs::copy(&temp_backup, &self.pins_file) {
                    error!("Failed to put back previous PIN file: {e}");
                }
                let _ = fs::remove_file(&temp_backup);
            }
            return Err(Error::Io);
        }

        if had_pins_file {
            if let Err(e) = fs::remove_file(&temp_backup) {
                debug!("Failed to remove {}: {e}", temp_backup.display());
            }
        }
        info!("Restored backup {backup_name}");
        Ok(())
    }

    /// Deletes all but the newest `keep_count` backups. Returns the number deleted.
    pub fn cleanup_old_backups(&self, keep_count: usize) -> usize {
        let mut deleted = 0;
        for old_backup in self.list_backups().iter().skip(keep_count) {
            match fs::remove_file(self.backup_dir.join(old_backup)) {
                Ok(()) => {
                    info!("Deleted old backup {old_backup}");
                    deleted += 1;
                }
                Err(e) => error!("Failed to delete old backup {old_backup}: {e}"),
            }
        }
        deleted
    }
}
