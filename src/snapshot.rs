use crate::config::STORE_VERSION;
use crate::models::Keyed;
use crate::store::Store;
use anyhow::{bail, Context, Result};
use bincode::Options;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub record_count: usize,
}

#[derive(Deserialize)]
struct SnapshotDe<R> {
    metadata: SnapshotMetadata,
    records: Vec<R>,
}

/// Borrows the records so a save doesn't clone the whole store.
#[derive(Serialize)]
struct SnapshotSer<'a, R> {
    metadata: SnapshotMetadata,
    records: Vec<&'a R>,
}

/// File-backed store. The whole record set lives in memory and is rewritten
/// atomically (temp file + rename) on every `save_all`.
pub struct SnapshotStore<R> {
    path: PathBuf,
    records: FxHashMap<String, R>,
}

impl<R> SnapshotStore<R>
where
    R: Keyed + Clone + Serialize + DeserializeOwned,
{
    /// Opens the snapshot at `path`, starting empty if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = if path.exists() {
            load_snapshot(&path)?
        } else {
            debug!(path = %path.display(), "No snapshot yet, starting empty");
            FxHashMap::default()
        };

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<R> Store<R> for SnapshotStore<R>
where
    R: Keyed + Clone + Serialize + DeserializeOwned,
{
    /// The in-memory view only changes once the new snapshot is on disk.
    fn save_all(&mut self, records: Vec<R>) -> Result<()> {
        let mut next = self.records.clone();
        next.reserve(records.len());
        for record in records {
            next.insert(record.id().to_string(), record);
        }

        write_snapshot(&self.path, &next)?;
        self.records = next;
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<R>> {
        Ok(self.records.get(id).cloned())
    }
}

fn load_snapshot<R>(path: &Path) -> Result<FxHashMap<String, R>>
where
    R: Keyed + DeserializeOwned,
{
    let file_size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    let file = File::open(path)
        .with_context(|| format!("Failed to open snapshot: {}", path.display()))?;
    let reader = BufReader::with_capacity(256 * 1024, file);

    let options = bincode::options().with_limit(file_size.saturating_add(1024));
    let snapshot: SnapshotDe<R> = options
        .deserialize_from(reader)
        .with_context(|| format!("Snapshot is corrupt or unreadable: {}", path.display()))?;

    if snapshot.metadata.version != STORE_VERSION {
        bail!(
            "Snapshot {} has version {}, expected {}",
            path.display(),
            snapshot.metadata.version,
            STORE_VERSION
        );
    }

    info!(
        path = %path.display(),
        records = snapshot.metadata.record_count,
        "Snapshot loaded"
    );

    Ok(snapshot
        .records
        .into_iter()
        .map(|r| (r.id().to_string(), r))
        .collect())
}

/// Records are written sorted by id so identical contents give identical files.
fn write_snapshot<R>(path: &Path, records: &FxHashMap<String, R>) -> Result<()>
where
    R: Serialize,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let mut sorted: Vec<(&String, &R)> = records.iter().collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let snapshot = SnapshotSer {
        metadata: SnapshotMetadata {
            version: STORE_VERSION,
            record_count: sorted.len(),
        },
        records: sorted.into_iter().map(|(_, r)| r).collect(),
    };

    let tmp_path = path.with_extension("store.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp snapshot file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);

    bincode::DefaultOptions::new()
        .serialize_into(&mut writer, &snapshot)
        .context("Failed to serialize snapshot")?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush temp snapshot file: {:?}", tmp_path))?;

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename temp snapshot: {:?}", path))?;

    debug!(
        path = %path.display(),
        records = snapshot.metadata.record_count,
        "Snapshot written"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, Book};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn author(id: &str, name: &str) -> Author {
        Author {
            id: id.to_string(),
            name: name.to_string(),
            personal_name: format!("{name} (personal)"),
        }
    }

    #[test]
    fn open_missing_snapshot_is_empty() {
        let dir = TempDir::new().unwrap();
        let store: SnapshotStore<Author> =
            SnapshotStore::open(dir.path().join("authors.store")).unwrap();
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn save_and_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authors.store");

        let mut store = SnapshotStore::open(&path).unwrap();
        store
            .save_all(vec![author("OL1A", "Mark Twain"), author("OL2A", "Jane Austen")])
            .unwrap();
        assert!(path.exists());

        let reopened: SnapshotStore<Author> = SnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            reopened.find_by_id("OL1A").unwrap(),
            Some(author("OL1A", "Mark Twain"))
        );
    }

    #[test]
    fn rerun_overwrites_by_id() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authors.store");

        let mut first = SnapshotStore::open(&path).unwrap();
        first
            .save_all(vec![author("OL1A", "Old"), author("OL2A", "Jane Austen")])
            .unwrap();

        let mut second = SnapshotStore::open(&path).unwrap();
        second.save_all(vec![author("OL1A", "Mark Twain")]).unwrap();

        let reopened: SnapshotStore<Author> = SnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.find_by_id("OL1A").unwrap().unwrap().name, "Mark Twain");
    }

    #[test]
    fn books_with_dates_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("books.store");
        let book = Book {
            id: "OL1W".to_string(),
            name: "Tom Sawyer".to_string(),
            description: Some(String::new()),
            published_date: NaiveDate::from_ymd_opt(2024, 3, 9),
            cover_ids: vec!["12345".to_string()],
            author_ids: vec!["/OL1A".to_string()],
            author_names: vec!["Unknown Author".to_string()],
        };

        let mut store = SnapshotStore::open(&path).unwrap();
        store.save_all(vec![book.clone()]).unwrap();

        let reopened: SnapshotStore<Book> = SnapshotStore::open(&path).unwrap();
        assert_eq!(reopened.find_by_id("OL1W").unwrap(), Some(book));
    }

    #[test]
    fn corrupt_snapshot_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authors.store");
        fs::write(&path, b"not a snapshot").unwrap();

        let result = SnapshotStore::<Author>::open(&path);
        assert!(result.is_err());
    }

    #[test]
    fn version_mismatch_fails_to_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authors.store");
        let mut store = SnapshotStore::open(&path).unwrap();
        store.save_all(vec![author("OL1A", "Mark Twain")]).unwrap();

        // leading varint is the version
        let mut bytes = fs::read(&path).unwrap();
        assert_eq!(bytes[0], STORE_VERSION as u8);
        bytes[0] = 7;
        fs::write(&path, &bytes).unwrap();

        let err = SnapshotStore::<Author>::open(&path).err().unwrap();
        assert!(err.to_string().contains("has version 7"));
    }

    #[test]
    fn failed_save_leaves_store_unchanged() {
        let dir = TempDir::new().unwrap();
        // parent is a regular file, so the snapshot directory can't be created
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();

        let mut store = SnapshotStore::open(blocker.join("authors.store")).unwrap();
        let result = store.save_all(vec![author("OL1A", "Mark Twain")]);

        assert!(result.is_err());
        assert!(store.is_empty());
        assert!(store.find_by_id("OL1A").unwrap().is_none());
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("authors.store");
        let mut store = SnapshotStore::open(&path).unwrap();
        store.save_all(vec![author("OL1A", "Mark Twain")]).unwrap();

        assert!(!path.with_extension("store.tmp").exists());
    }
}
