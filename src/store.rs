use crate::models::Keyed;
use anyhow::Result;
use rustc_hash::FxHashMap;

/// Persistence capability for one record kind.
pub trait Store<R> {
    /// Bulk write. Records overwrite existing ones with the same id. On error
    /// the caller must assume none of `records` was committed.
    fn save_all(&mut self, records: Vec<R>) -> Result<()>;

    /// Point lookup by exact id.
    fn find_by_id(&self, id: &str) -> Result<Option<R>>;
}

/// Volatile store used for dry runs and tests.
pub struct MemoryStore<R> {
    records: FxHashMap<String, R>,
    save_calls: usize,
}

impl<R> Default for MemoryStore<R> {
    fn default() -> Self {
        Self {
            records: FxHashMap::default(),
            save_calls: 0,
        }
    }
}

impl<R: Keyed> MemoryStore<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = R>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|r| (r.id().to_string(), r))
                .collect(),
            save_calls: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.records.get(id)
    }

    /// Number of `save_all` calls received so far
    pub fn save_calls(&self) -> usize {
        self.save_calls
    }
}

impl<R: Keyed + Clone> Store<R> for MemoryStore<R> {
    fn save_all(&mut self, records: Vec<R>) -> Result<()> {
        self.save_calls += 1;
        self.records.reserve(records.len());
        for record in records {
            self.records.insert(record.id().to_string(), record);
        }
        Ok(())
    }

    fn find_by_id(&self, id: &str) -> Result<Option<R>> {
        Ok(self.records.get(id).cloned())
    }
}
