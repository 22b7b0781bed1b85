use crate::store::Store;
use anyhow::{Context, Result};
use tracing::info;

/// Collects one phase's records and commits them with a single `save_all`.
pub struct BatchLoader<R> {
    label: &'static str,
    records: Vec<R>,
}

impl<R> BatchLoader<R> {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: R) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persists the whole batch, even when empty. Returns the number of records
    /// handed to the store.
    pub fn commit<S: Store<R>>(self, store: &mut S) -> Result<usize> {
        let count = self.records.len();
        info!(records = count, "Saving {} batch", self.label);
        store
            .save_all(self.records)
            .with_context(|| format!("Failed to save {} batch of {count} records", self.label))?;
        Ok(count)
    }
}
