use crate::config::UNKNOWN_AUTHOR;
use crate::models::{Author, Book, WorkRecord};
use crate::store::Store;
use anyhow::{Context, Result};
use std::cell::Cell;
use tracing::trace;

/// Resolves author ids to display names against the committed author store.
///
/// Each referenced id costs one `find_by_id` call; nothing is cached, so a
/// repeated id is looked up again.
pub struct AuthorLinker<'s, S> {
    authors: &'s S,
    lookups: Cell<u64>,
    unknown: Cell<u64>,
}

impl<'s, S: Store<Author>> AuthorLinker<'s, S> {
    pub fn new(authors: &'s S) -> Self {
        Self {
            authors,
            lookups: Cell::new(0),
            unknown: Cell::new(0),
        }
    }

    /// One name per id, in the same order. Unmatched ids map to the unknown-author sentinel.
    pub fn resolve_names(&self, author_ids: &[String]) -> Result<Vec<String>> {
        author_ids
            .iter()
            .map(|id| -> Result<String> {
                self.lookups.set(self.lookups.get() + 1);
                let found = self
                    .authors
                    .find_by_id(id)
                    .with_context(|| format!("Author lookup failed for id {id:?}"))?;
                Ok(match found {
                    Some(author) => author.name,
                    None => {
                        trace!(author_id = %id, "Author not found");
                        self.unknown.set(self.unknown.get() + 1);
                        UNKNOWN_AUTHOR.to_string()
                    }
                })
            })
            .collect()
    }

    pub fn link(&self, record: WorkRecord) -> Result<Book> {
        let names = self.resolve_names(&record.author_ids)?;
        Book::from_record(record, names)
            .context("Resolved author names do not line up with author ids")
    }

    /// Store lookups performed so far
    pub fn lookups(&self) -> u64 {
        self.lookups.get()
    }

    /// Ids that resolved to the unknown-author sentinel
    pub fn unknown_authors(&self) -> u64 {
        self.unknown.get()
    }
}
