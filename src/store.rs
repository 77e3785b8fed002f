//! Append-only expense log kept in a JSON file.
//!
//! The file holds a single object, `{ "expenses": [...] }`, with records in
//! the order they were added. A missing file is an empty log.

use crate::core::expense::{ExpenseLog, ExpenseRecord};
use crate::core::participant::ParticipantId;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("expense store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("expense store is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Expense log persisted at a fixed path.
#[derive(Debug, Clone)]
pub struct ExpenseStore {
    path: PathBuf,
}

impl ExpenseStore {
    /// Open the store at `path`, creating missing parent directories.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir)?;
                log::info!("created store directory {}", dir.display());
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every record, oldest first.
    pub fn load(&self) -> Result<ExpenseLog, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(ExpenseLog::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(ExpenseLog::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Append one record.
    pub fn append(&self, record: ExpenseRecord) -> Result<(), StoreError> {
        let mut expenses = self.load()?;
        log::info!(
            "recording expense of {} by {}",
            record.amount(),
            record.participant()
        );
        expenses.add(record);
        self.write(&expenses)?;
        log::debug!("store now holds {} expenses", expenses.len());
        Ok(())
    }

    /// Every record, newest first.
    pub fn newest_first(&self) -> Result<Vec<ExpenseRecord>, StoreError> {
        let mut records = self.load()?.records().to_vec();
        records.sort_by(|a, b| b.recorded_at().cmp(&a.recorded_at()));
        Ok(records)
    }

    /// One participant's records, newest first.
    pub fn for_participant(
        &self,
        participant: &ParticipantId,
    ) -> Result<Vec<ExpenseRecord>, StoreError> {
        Ok(self
            .newest_first()?
            .into_iter()
            .filter(|r| r.participant() == participant)
            .collect())
    }

    /// Remove every record.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.write(&ExpenseLog::new())?;
        log::info!("cleared expense store {}", self.path.display());
        Ok(())
    }

    fn write(&self, expenses: &ExpenseLog) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(expenses)?;
        // Written to a sibling file, then renamed into place.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
