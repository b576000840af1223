//! Workout completion history.
//!
//! The record is a small JSON document kept under one key in the kv store.
//! Reads never fail: a missing or unreadable record is replaced by the
//! default, and write failures are logged rather than surfaced, since losing
//! a completion mark is preferable to interrupting a finished workout.

use std::path::Path;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::database::Database;
use crate::error::Result;
use crate::session::ProgressStore;

const PROGRESS_KEY: &str = "c25k_progress";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRecord {
    /// Completed workout ordinals, unique, in the order they were first completed.
    pub completed_workouts: Vec<usize>,
    pub last_completed_index: Option<usize>,
    pub last_active_date: Option<NaiveDate>,
}

impl ProgressRecord {
    pub fn is_completed(&self, ordinal: usize) -> bool {
        self.completed_workouts.contains(&ordinal)
    }

    /// Union-insert `ordinal` and stamp the activity date.
    pub fn mark_complete(&mut self, ordinal: usize, today: NaiveDate) {
        if !self.is_completed(ordinal) {
            self.completed_workouts.push(ordinal);
        }
        self.last_completed_index = Some(ordinal);
        self.last_active_date = Some(today);
    }

    /// First ordinal in `0..total` not yet completed, or the last ordinal
    /// when everything is done.
    pub fn next_incomplete_index(&self, total: usize) -> usize {
        (0..total)
            .find(|i| !self.is_completed(*i))
            .unwrap_or_else(|| total.saturating_sub(1))
    }

    pub fn all_complete(&self, total: usize) -> bool {
        (0..total).all(|i| self.is_completed(i))
    }
}

/// [`ProgressStore`] backed by the SQLite kv table.
pub struct SqliteProgressStore {
    db: Database,
}

impl SqliteProgressStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store in the default database under the data directory.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Database`] if the database cannot be opened.
    pub fn open() -> Result<Self> {
        Ok(Self::new(Database::open()?))
    }

    /// Store in the database at `path`.
    ///
    /// # Errors
    /// Returns [`crate::CoreError::Database`] if the database cannot be opened.
    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::new(Database::open_at(path)?))
    }

    /// Same as [`ProgressStore::mark_complete`] with an explicit date.
    pub fn mark_complete_on(&mut self, ordinal: usize, today: NaiveDate) -> ProgressRecord {
        let mut record = self.load_record();
        record.mark_complete(ordinal, today);
        self.save(&record);
        tracing::info!(ordinal, %today, "workout marked complete");
        record
    }

    fn load_record(&self) -> ProgressRecord {
        let raw = match self.db.kv_get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return ProgressRecord::default(),
            Err(e) => {
                tracing::warn!(error = %e, "cannot read progress, using defaults");
                return ProgressRecord::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "corrupt progress record discarded");
                ProgressRecord::default()
            }
        }
    }

    fn save(&self, record: &ProgressRecord) {
        let result = serde_json::to_string(record)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.db
                    .kv_set(PROGRESS_KEY, &json)
                    .map_err(|e| e.to_string())
            });
        if let Err(e) = result {
            tracing::warn!(error = %e, "cannot persist progress");
        }
    }
}

impl ProgressStore for SqliteProgressStore {
    fn load(&self) -> ProgressRecord {
        self.load_record()
    }

    fn mark_complete(&mut self, ordinal: usize) -> ProgressRecord {
        self.mark_complete_on(ordinal, Local::now().date_naive())
    }

    fn reset(&mut self) {
        match self.db.kv_delete(PROGRESS_KEY) {
            Ok(()) => tracing::info!("progress reset"),
            Err(e) => tracing::warn!(error = %e, "cannot reset progress"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn store() -> SqliteProgressStore {
        SqliteProgressStore::new(Database::open_memory().unwrap())
    }

    #[test]
    fn open_at_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pacer.db");
        SqliteProgressStore::open_at(&path).unwrap().mark_complete(2);
        let reopened = SqliteProgressStore::open_at(&path).unwrap();
        assert!(reopened.load().is_completed(2));
    }

    #[test]
    fn open_at_unreachable_path_is_a_database_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("pacer.db");
        let err = SqliteProgressStore::open_at(&path).err().unwrap();
        assert!(matches!(err, CoreError::Database(_)));
        assert!(err.to_string().starts_with("Database error:"));
    }

    #[test]
    fn load_defaults_when_empty() {
        let s = store();
        assert_eq!(s.load(), ProgressRecord::default());
    }

    #[test]
    fn corrupt_record_is_replaced_by_defaults() {
        let s = store();
        s.db.kv_set(PROGRESS_KEY, "{not json").unwrap();
        assert_eq!(s.load(), ProgressRecord::default());
    }

    #[test]
    fn partial_record_fills_missing_fields() {
        let s = store();
        s.db.kv_set(PROGRESS_KEY, r#"{"completed_workouts":[3]}"#).unwrap();
        let r = s.load();
        assert_eq!(r.completed_workouts, vec![3]);
        assert_eq!(r.last_active_date, None);
    }

    #[test]
    fn mark_complete_round_trips_with_todays_date() {
        let mut s = store();
        s.mark_complete(4);
        let r = s.load();
        assert!(r.is_completed(4));
        assert_eq!(r.last_completed_index, Some(4));
        assert_eq!(r.last_active_date, Some(Local::now().date_naive()));
    }

    #[test]
    fn mark_complete_is_idempotent() {
        let mut s = store();
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        s.mark_complete_on(2, day);
        s.mark_complete_on(0, day);
        let r = s.mark_complete_on(2, day);
        assert_eq!(r.completed_workouts, vec![2, 0]);
        assert_eq!(r.last_completed_index, Some(2));
    }

    #[test]
    fn reset_clears_everything() {
        let mut s = store();
        s.mark_complete(1);
        s.reset();
        assert_eq!(s.load(), ProgressRecord::default());
    }

    #[test]
    fn next_incomplete_finds_first_gap() {
        let record = ProgressRecord {
            completed_workouts: vec![0, 2],
            ..Default::default()
        };
        assert_eq!(record.next_incomplete_index(3), 1);
    }

    #[test]
    fn next_incomplete_returns_last_when_all_done() {
        let record = ProgressRecord {
            completed_workouts: vec![2, 0, 1],
            ..Default::default()
        };
        assert_eq!(record.next_incomplete_index(3), 2);
        assert!(record.all_complete(3));
        assert_eq!(ProgressRecord::default().next_incomplete_index(0), 0);
    }

    #[test]
    fn store_next_incomplete_uses_persisted_record() {
        let mut s = store();
        let day = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        s.mark_complete_on(0, day);
        s.mark_complete_on(2, day);
        assert_eq!(s.next_incomplete_index(3), 1);
    }
}
