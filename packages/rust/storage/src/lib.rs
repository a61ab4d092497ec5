//! Flat-file persistence: weekly documents and the processed-date ledger.
//!
//! Documents are plain Markdown files named by week range. Saves go through
//! a temp file and rename so a crashed run never leaves a half-written
//! document behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use arxivdigest_shared::{DigestError, Result, WeekRange};
use chrono::NaiveDate;
use tracing::debug;

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Store for weekly digest documents under one root directory.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the document for a week: `<root>/<range>.md`.
    pub fn week_path(&self, week: WeekRange) -> PathBuf {
        self.root.join(format!("{week}.md"))
    }

    /// Read a week's document. `None` when it does not exist yet.
    pub fn load(&self, week: WeekRange) -> Result<Option<String>> {
        let path = self.week_path(week);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DigestError::io(&path, e)),
        }
    }

    /// Write a week's document atomically (temp file, then rename).
    pub fn save(&self, week: WeekRange, content: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(|e| DigestError::io(&self.root, e))?;

        let target = self.week_path(week);
        let temp = self.root.join(format!(".{week}.md.tmp"));

        std::fs::write(&temp, content).map_err(|e| DigestError::io(&temp, e))?;
        std::fs::rename(&temp, &target).map_err(|e| DigestError::io(&target, e))?;

        debug!(path = %target.display(), bytes = content.len(), "wrote weekly document");
        Ok(target)
    }
}

// ---------------------------------------------------------------------------
// Processed-date ledger
// ---------------------------------------------------------------------------

/// Record of dates the pipeline has already handled. Callers consult it
/// before a run and append after a successful one; the processing core
/// itself never touches it.
pub trait ProcessedDateLedger {
    fn contains(&self, date: NaiveDate) -> Result<bool>;
    fn add(&mut self, date: NaiveDate) -> Result<()>;
}

/// Ledger backed by a plain text file, one `YYYYMMDD` entry per line.
#[derive(Debug, Clone)]
pub struct FileDateLedger {
    path: PathBuf,
}

impl FileDateLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProcessedDateLedger for FileDateLedger {
    fn contains(&self, date: NaiveDate) -> Result<bool> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(DigestError::io(&self.path, e)),
        };
        let needle = date.format("%Y%m%d").to_string();
        Ok(content.lines().any(|line| line.trim() == needle))
    }

    fn add(&mut self, date: NaiveDate) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DigestError::io(parent, e))?;
            }
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DigestError::io(&self.path, e))?;
        writeln!(file, "{}", date.format("%Y%m%d"))
            .map_err(|e| DigestError::io(&self.path, e))?;

        debug!(date = %date, ledger = %self.path.display(), "date marked processed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("arxivdigest-test-{}", Uuid::now_v7()))
    }

    fn week() -> WeekRange {
        WeekRange::for_date(NaiveDate::from_ymd_opt(2025, 11, 5).expect("date"))
    }

    #[test]
    fn save_then_load_roundtrip() {
        let dir = temp_dir();
        let store = DocumentStore::new(&dir);

        assert!(store.load(week()).unwrap().is_none());

        let path = store.save(week(), "# 20251103-20251109\n").unwrap();
        assert_eq!(path, dir.join("20251103-20251109.md"));
        assert_eq!(
            store.load(week()).unwrap().as_deref(),
            Some("# 20251103-20251109\n")
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_overwrites_existing_document() {
        let dir = temp_dir();
        let store = DocumentStore::new(&dir);

        store.save(week(), "first\n").unwrap();
        store.save(week(), "second\n").unwrap();
        assert_eq!(store.load(week()).unwrap().as_deref(), Some("second\n"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_leaves_no_temp_files() {
        let dir = temp_dir();
        let store = DocumentStore::new(&dir);
        store.save(week(), "content\n").unwrap();

        let leftovers: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ledger_contains_after_add() {
        let dir = temp_dir();
        let mut ledger = FileDateLedger::new(dir.join("arxiv_date.txt"));
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).expect("date");
        let other = NaiveDate::from_ymd_opt(2025, 11, 4).expect("date");

        assert!(!ledger.contains(date).unwrap());
        ledger.add(date).unwrap();
        assert!(ledger.contains(date).unwrap());
        assert!(!ledger.contains(other).unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ledger_persists_across_instances() {
        let dir = temp_dir();
        let path = dir.join("arxiv_date.txt");
        let date = NaiveDate::from_ymd_opt(2025, 11, 3).expect("date");

        FileDateLedger::new(&path).add(date).unwrap();

        let reopened = FileDateLedger::new(&path);
        assert!(reopened.contains(date).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "20251103\n");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn ledger_ignores_blank_and_padded_lines() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("arxiv_date.txt");
        std::fs::write(&path, "\n 20251103 \n\n20251104\n").unwrap();

        let ledger = FileDateLedger::new(&path);
        assert!(ledger
            .contains(NaiveDate::from_ymd_opt(2025, 11, 3).expect("date"))
            .unwrap());
        assert!(ledger
            .contains(NaiveDate::from_ymd_opt(2025, 11, 4).expect("date"))
            .unwrap());

        std::fs::remove_dir_all(&dir).ok();
    }
}
