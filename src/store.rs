use hourglass_rs::SafeTimeProvider;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::StoreError;
use crate::ledger::LoanLedger;

/// most recent backups kept per store; older ones are pruned
pub const MAX_BACKUPS: usize = 10;

const BACKUP_PREFIX: &str = "finance_";

/// flat-file JSON store for the loan ledger
///
/// every save backs up the previous file, writes the new state to a temp
/// file and atomically renames it over the live file, so the live file is
/// never observed half-written. a corrupt file is snapshotted and surfaced
/// as [`StoreError::Corrupt`]; the caller decides whether to [`reset`] or
/// restore a backup.
///
/// [`reset`]: FinanceStore::reset
#[derive(Debug, Clone)]
pub struct FinanceStore {
    data_file: PathBuf,
    backup_dir: PathBuf,
}

impl FinanceStore {
    pub fn new(data_file: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_file: data_file.into(),
            backup_dir: backup_dir.into(),
        }
    }

    /// conventional layout under one data directory:
    /// `<dir>/finance.json` with backups in `<dir>/backups`
    pub fn at_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join("finance.json"), dir.join("backups"))
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    /// load the ledger, initializing an empty document for a missing file
    ///
    /// a decode failure snapshots the corrupt file into the backup
    /// directory and returns [`StoreError::Corrupt`] instead of silently
    /// resetting
    pub fn load(&self, time: &SafeTimeProvider) -> Result<LoanLedger, StoreError> {
        self.ensure_dirs()?;

        if !self.data_file.exists() {
            let empty = LoanLedger::new();
            self.atomic_write(&empty)?;
            return Ok(empty);
        }

        let raw = fs::read_to_string(&self.data_file)?;
        match serde_json::from_str(&raw) {
            Ok(ledger) => Ok(ledger),
            Err(source) => {
                let snapshot = self.create_backup("corrupt", time)?;
                warn!(snapshot = %snapshot.display(), "finance file is corrupt, snapshot kept");
                Err(StoreError::Corrupt { snapshot, source })
            }
        }
    }

    /// persist the ledger: backup, temp write, atomic replace
    pub fn save(
        &self,
        ledger: &LoanLedger,
        tag: &str,
        time: &SafeTimeProvider,
    ) -> Result<(), StoreError> {
        self.ensure_dirs()?;
        if self.data_file.exists() {
            self.create_backup(tag, time)?;
        }
        self.atomic_write(ledger)?;
        info!(tag, loans = ledger.len(), "finance document saved");
        Ok(())
    }

    /// overwrite the live file with the empty default, keeping a backup
    pub fn reset(&self, tag: &str, time: &SafeTimeProvider) -> Result<LoanLedger, StoreError> {
        let empty = LoanLedger::new();
        self.save(&empty, tag, time)?;
        info!(tag, "finance document reset to empty default");
        Ok(empty)
    }

    /// backups, most recent first
    pub fn list_backups(&self) -> Result<Vec<PathBuf>, StoreError> {
        self.ensure_dirs()?;
        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".json"))
                    .unwrap_or(false)
            })
            .collect();
        backups.sort();
        backups.reverse();
        Ok(backups)
    }

    /// replace the live file with a backup, snapshotting the current state first
    pub fn restore_backup(
        &self,
        backup: &Path,
        time: &SafeTimeProvider,
    ) -> Result<(), StoreError> {
        self.ensure_dirs()?;
        if !backup.exists() {
            return Err(StoreError::BackupNotFound {
                path: backup.to_path_buf(),
            });
        }
        if self.data_file.exists() {
            self.create_backup("before_restore", time)?;
        }
        fs::copy(backup, &self.data_file)?;
        info!(backup = %backup.display(), "finance document restored from backup");
        Ok(())
    }

    fn ensure_dirs(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.data_file.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(&self.backup_dir)?;
        Ok(())
    }

    fn atomic_write(&self, ledger: &LoanLedger) -> Result<(), StoreError> {
        let payload = serde_json::to_string_pretty(ledger).map_err(StoreError::Encode)?;
        let tmp = self.data_file.with_extension("tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.data_file)?;
        Ok(())
    }

    /// copy the live file into the backup directory, pruning old backups
    fn create_backup(&self, tag: &str, time: &SafeTimeProvider) -> Result<PathBuf, StoreError> {
        let stamp = time.now().format("%Y-%m-%d_%H-%M-%S");
        let name = format!("{}{}_{}.json", BACKUP_PREFIX, stamp, tag);
        let target = self.backup_dir.join(name);
        fs::copy(&self.data_file, &target)?;

        self.prune_backups();
        Ok(target)
    }

    fn prune_backups(&self) {
        let Ok(mut backups) = self.list_backups() else {
            return;
        };
        if backups.len() <= MAX_BACKUPS {
            return;
        }
        // list is newest-first; everything past the cap goes
        for old in backups.split_off(MAX_BACKUPS) {
            if let Err(err) = fs::remove_file(&old) {
                warn!(path = %old.display(), %err, "could not prune old backup");
            }
        }
    }
}
