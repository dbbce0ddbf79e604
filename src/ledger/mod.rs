//! Durable per-item progress record enabling resume.
//!
//! The ledger is a line-oriented checklist, one entry per discovered item,
//! keyed by relative path:
//!
//! ```text
//! - [ ] `Folder1/v2.mp4`     pending
//! - [p] `Folder1/v2.mp4`     local copy staged, upload outstanding
//! - [x] `Folder1/v2.mp4`     uploaded, local copy removed
//! ```
//!
//! Every mutation rewrites the whole file through a temp sibling plus
//! rename, flushed and synced before the mutator returns — a successful
//! return guarantees the change survives a crash immediately after. The
//! format stays compatible with the checklist the earlier script kept:
//! `x`, `X`, and `✓` all read back as done, `[x]` is always written.
//! Entry order is the discovery order of first appearance.

pub mod error;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

pub use error::LedgerError;

use crate::relpath::RelativePath;

/// Processing status of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No record, or nothing completed yet.
    Pending,
    /// Download finished; a local staging copy exists (or existed).
    LocalOnly,
    /// Download and upload both finished, local copy removed. Terminal.
    Done,
}

/// The progress ledger. Single-writer: owned by the run for its duration.
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    /// Keys in order of first appearance.
    order: Vec<String>,
    statuses: HashMap<String, Status>,
}

impl Ledger {
    /// Load the ledger at `path`, or start empty if the file is absent.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let mut ledger = Self {
            path: path.to_path_buf(),
            order: Vec::new(),
            statuses: HashMap::new(),
        };
        if !path.exists() {
            return Ok(ledger);
        }
        let content = fs::read_to_string(path).map_err(|source| LedgerError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        for line in content.lines() {
            if let Some((status, key)) = parse_entry(line) {
                if ledger.statuses.insert(key.to_string(), status).is_none() {
                    ledger.order.push(key.to_string());
                }
            }
        }
        Ok(ledger)
    }

    /// Status of an item, `Pending` if it has no record.
    pub fn status_of(&self, path: &RelativePath) -> Status {
        self.statuses
            .get(&path.to_string())
            .copied()
            .unwrap_or(Status::Pending)
    }

    /// Record that the item's local staging copy is complete.
    ///
    /// A `Done` entry is never regressed; marking it `LocalOnly` is a no-op.
    pub fn mark_local_only(&mut self, path: &RelativePath) -> Result<(), LedgerError> {
        if self.status_of(path) == Status::Done {
            tracing::warn!(path = %path, "refusing to regress done entry");
            return Ok(());
        }
        self.set(path, Status::LocalOnly);
        self.persist()
    }

    /// Record that the item is fully mirrored.
    pub fn mark_done(&mut self, path: &RelativePath) -> Result<(), LedgerError> {
        self.set(path, Status::Done);
        self.persist()
    }

    /// Ensure every discovered item has an entry, adding absent ones as
    /// `Pending` in the given order. Persists once if anything was added.
    pub fn record_discovered<'a>(
        &mut self,
        paths: impl IntoIterator<Item = &'a RelativePath>,
    ) -> Result<(), LedgerError> {
        let mut added = false;
        for path in paths {
            let key = path.to_string();
            if !self.statuses.contains_key(&key) {
                self.statuses.insert(key.clone(), Status::Pending);
                self.order.push(key);
                added = true;
            }
        }
        if added {
            self.persist()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in order of first appearance.
    pub fn entries(&self) -> impl Iterator<Item = (&str, Status)> {
        self.order
            .iter()
            .map(|key| (key.as_str(), self.statuses[key]))
    }

    fn set(&mut self, path: &RelativePath, status: Status) {
        let key = path.to_string();
        if self.statuses.insert(key.clone(), status).is_none() {
            self.order.push(key);
        }
    }

    /// Rewrite the durable record in full: temp sibling, flush, fsync,
    /// rename over the old file.
    fn persist(&self) -> Result<(), LedgerError> {
        let write_err = |source| LedgerError::Write {
            path: self.path.clone(),
            source,
        };

        let mut content = String::with_capacity(64 + self.order.len() * 48);
        content.push_str("# mirror progress\n");
        content.push_str("# [ ] pending   [p] local copy staged   [x] uploaded\n\n");
        for (key, status) in self.entries() {
            let marker = match status {
                Status::Pending => ' ',
                Status::LocalOnly => 'p',
                Status::Done => 'x',
            };
            let _ = writeln!(content, "- [{marker}] `{key}`");
        }

        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp).map_err(write_err)?;
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// Parse one checklist line; anything else (headers, blanks) is skipped.
fn parse_entry(line: &str) -> Option<(Status, &str)> {
    let rest = line.trim_end().strip_prefix("- [")?;
    let close = rest.find(']')?;
    let status = match &rest[..close] {
        "x" | "X" | "✓" => Status::Done,
        "p" | "P" => Status::LocalOnly,
        " " | "" => Status::Pending,
        _ => return None,
    };
    let raw = rest[close + 1..].trim();
    let key = raw
        .strip_prefix('`')
        .and_then(|k| k.strip_suffix('`'))
        .unwrap_or(raw);
    if key.is_empty() {
        return None;
    }
    Some((status, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("ydisk-mirror-tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn rp(s: &str) -> RelativePath {
        RelativePath::parse(s).unwrap()
    }

    #[test]
    fn test_load_absent_file_is_empty() {
        let dir = test_dir("ledger_absent");
        let ledger = Ledger::load(&dir.join("tree.md")).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.status_of(&rp("anything.mp4")), Status::Pending);
    }

    #[test]
    fn test_mark_and_reload() {
        let dir = test_dir("ledger_roundtrip");
        let path = dir.join("tree.md");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_local_only(&rp("Folder1/v2.mp4")).unwrap();
        ledger.mark_done(&rp("v1.mp4")).unwrap();

        // A fresh load sees exactly what was persisted.
        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.status_of(&rp("Folder1/v2.mp4")), Status::LocalOnly);
        assert_eq!(reloaded.status_of(&rp("v1.mp4")), Status::Done);
        assert_eq!(reloaded.status_of(&rp("unseen.mp4")), Status::Pending);
    }

    #[test]
    fn test_persist_is_synchronous_per_mutation() {
        let dir = test_dir("ledger_sync");
        let path = dir.join("tree.md");

        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_local_only(&rp("a.mp4")).unwrap();
        // Observed on disk before any further mutation.
        let on_disk = Ledger::load(&path).unwrap();
        assert_eq!(on_disk.status_of(&rp("a.mp4")), Status::LocalOnly);
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let dir = test_dir("ledger_tmp");
        let path = dir.join("tree.md");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_done(&rp("a.mp4")).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_done_never_regresses() {
        let dir = test_dir("ledger_regress");
        let path = dir.join("tree.md");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_done(&rp("a.mp4")).unwrap();
        ledger.mark_local_only(&rp("a.mp4")).unwrap();
        assert_eq!(ledger.status_of(&rp("a.mp4")), Status::Done);
        let reloaded = Ledger::load(&path).unwrap();
        assert_eq!(reloaded.status_of(&rp("a.mp4")), Status::Done);
    }

    #[test]
    fn test_legacy_done_markers_read_as_done() {
        let dir = test_dir("ledger_legacy");
        let path = dir.join("tree.md");
        fs::write(
            &path,
            "- [✓] `old/one.mp4`\n- [X] `old/two.mp4`\n- [p] `old/three.mp4`\n",
        )
        .unwrap();
        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.status_of(&rp("old/one.mp4")), Status::Done);
        assert_eq!(ledger.status_of(&rp("old/two.mp4")), Status::Done);
        assert_eq!(ledger.status_of(&rp("old/three.mp4")), Status::LocalOnly);
    }

    #[test]
    fn test_canonical_marker_written_for_legacy_done() {
        let dir = test_dir("ledger_canonical");
        let path = dir.join("tree.md");
        fs::write(&path, "- [✓] `a.mp4`\n").unwrap();
        let mut ledger = Ledger::load(&path).unwrap();
        // Any persist rewrites with the canonical marker.
        ledger.mark_done(&rp("b.mp4")).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("- [x] `a.mp4`"));
        assert!(content.contains("- [x] `b.mp4`"));
        assert!(!content.contains('✓'));
    }

    #[test]
    fn test_headers_and_noise_ignored() {
        let dir = test_dir("ledger_noise");
        let path = dir.join("tree.md");
        fs::write(
            &path,
            "# mirror progress\n\nsome prose\n- [?] `weird.mp4`\n- [x] `ok.mp4`\n",
        )
        .unwrap();
        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.status_of(&rp("ok.mp4")), Status::Done);
    }

    #[test]
    fn test_bare_paths_without_backticks_accepted() {
        let dir = test_dir("ledger_bare");
        let path = dir.join("tree.md");
        fs::write(&path, "- [p] some dir/file.mp4\n").unwrap();
        let ledger = Ledger::load(&path).unwrap();
        assert_eq!(ledger.status_of(&rp("some dir/file.mp4")), Status::LocalOnly);
    }

    #[test]
    fn test_record_discovered_appends_pending_in_order() {
        let dir = test_dir("ledger_discovered");
        let path = dir.join("tree.md");
        let mut ledger = Ledger::load(&path).unwrap();
        ledger.mark_done(&rp("b.mp4")).unwrap();

        let discovered = [rp("a.mp4"), rp("b.mp4"), rp("c.mp4")];
        ledger.record_discovered(discovered.iter()).unwrap();

        // Existing entry keeps its status and position; new ones append.
        let entries: Vec<_> = ledger.entries().collect();
        assert_eq!(
            entries,
            [
                ("b.mp4", Status::Done),
                ("a.mp4", Status::Pending),
                ("c.mp4", Status::Pending),
            ]
        );

        // Idempotent.
        ledger.record_discovered(discovered.iter()).unwrap();
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_order_of_first_appearance_survives_reload() {
        let dir = test_dir("ledger_order");
        let path = dir.join("tree.md");
        let mut ledger = Ledger::load(&path).unwrap();
        for name in ["z.mp4", "a.mp4", "m.mp4"] {
            ledger.mark_done(&rp(name)).unwrap();
        }
        let reloaded = Ledger::load(&path).unwrap();
        let keys: Vec<_> = reloaded.entries().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, ["z.mp4", "a.mp4", "m.mp4"]);
    }

    #[test]
    fn test_parse_entry_rejects_garbage() {
        assert!(parse_entry("- [x] ``").is_none());
        assert!(parse_entry("- [q] `a.mp4`").is_none());
        assert!(parse_entry("[x] `a.mp4`").is_none());
        assert!(parse_entry("").is_none());
    }
}
