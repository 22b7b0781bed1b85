use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Records a [`Store`](crate::store::Store) can key by id.
pub trait Keyed {
    fn id(&self) -> &str;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub personal_name: String,
}

/// A parsed work whose author references have not been resolved yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub cover_ids: Vec<String>,
    pub author_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub published_date: Option<NaiveDate>,
    pub cover_ids: Vec<String>,
    pub author_ids: Vec<String>,
    /// Snapshot of author names taken at link time, positionally matching `author_ids`
    pub author_names: Vec<String>,
}

impl Book {
    /// Returns `None` when `author_names` does not line up with the record's `author_ids`.
    pub fn from_record(record: WorkRecord, author_names: Vec<String>) -> Option<Self> {
        if author_names.len() != record.author_ids.len() {
            return None;
        }
        Some(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            published_date: record.published_date,
            cover_ids: record.cover_ids,
            author_ids: record.author_ids,
            author_names,
        })
    }
}

impl Keyed for Author {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Keyed for Book {
    fn id(&self) -> &str {
        &self.id
    }
}
