use crate::config::{AUTHOR_KEY_PREFIX, WORK_AUTHOR_REF_PREFIX, WORK_KEY_PREFIX};
use crate::error::{LineResult, SkipReason};
use crate::json::{
    opt_array, opt_object, opt_string, parse_object, required_object, required_str,
    strip_key_prefix, type_name, Object,
};
use crate::models::WorkRecord;
use chrono::{Local, NaiveDate};
use serde_json::Value;

/// How author references inside a work are turned into author ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthorRefMode {
    /// Strip `/authors` (no trailing slash): `/authors/OL1A` -> `/OL1A`.
    ///
    /// These ids never match the ids produced for the author dump, so every
    /// reference resolves to the unknown-author sentinel. Kept as the default
    /// until the id format is confirmed.
    #[default]
    AsBuilt,
    /// Strip `/authors/`, the same prefix the author dump uses: `/authors/OL1A` -> `OL1A`.
    Normalized,
}

impl AuthorRefMode {
    fn prefix(self) -> &'static str {
        match self {
            AuthorRefMode::AsBuilt => WORK_AUTHOR_REF_PREFIX,
            AuthorRefMode::Normalized => AUTHOR_KEY_PREFIX,
        }
    }
}

pub struct WorkParser {
    author_refs: AuthorRefMode,
    ingest_date: NaiveDate,
}

impl WorkParser {
    pub fn new(author_refs: AuthorRefMode) -> Self {
        Self::with_ingest_date(author_refs, Local::now().date_naive())
    }

    pub fn with_ingest_date(author_refs: AuthorRefMode, ingest_date: NaiveDate) -> Self {
        Self {
            author_refs,
            ingest_date,
        }
    }

    /// Parses the JSON payload of one works dump line.
    pub fn parse(&self, payload: &str) -> LineResult<WorkRecord> {
        let obj = parse_object(payload)?;
        self.record_from_object(&obj)
    }

    pub fn record_from_object(&self, obj: &Object) -> LineResult<WorkRecord> {
        Ok(WorkRecord {
            id: strip_key_prefix(&opt_string(obj, "key"), WORK_KEY_PREFIX),
            name: opt_string(obj, "title"),
            description: opt_object(obj, "description").map(|d| opt_string(d, "value")),
            published_date: self.published_date(obj)?,
            cover_ids: cover_ids(obj)?,
            author_ids: self.author_ids(obj)?,
        })
    }

    /// PLACEHOLDER: `created.value` is required to be a string but is not parsed.
    /// Any work carrying it is stamped with the ingestion date instead. Needs a
    /// product decision before real publication dates can be relied on.
    fn published_date(&self, obj: &Object) -> LineResult<Option<NaiveDate>> {
        match opt_object(obj, "created") {
            Some(created) => {
                required_str(created, "value")?;
                Ok(Some(self.ingest_date))
            }
            None => Ok(None),
        }
    }

    fn author_ids(&self, obj: &Object) -> LineResult<Vec<String>> {
        let Some(authors) = opt_array(obj, "authors") else {
            return Ok(Vec::new());
        };

        let prefix = self.author_refs.prefix();
        authors
            .iter()
            .map(|entry| -> LineResult<String> {
                let entry = entry.as_object().ok_or(SkipReason::InvalidField {
                    field: "authors[]",
                    found: type_name(entry),
                })?;
                let key = required_str(required_object(entry, "author")?, "key")?;
                Ok(strip_key_prefix(key, prefix))
            })
            .collect()
    }
}

fn cover_ids(obj: &Object) -> LineResult<Vec<String>> {
    let Some(covers) = opt_array(obj, "covers") else {
        return Ok(Vec::new());
    };

    covers
        .iter()
        .map(|cover| match cover {
            Value::Number(n) => Ok(match n.as_i64() {
                Some(i) => itoa::Buffer::new().format(i).to_owned(),
                None => n.to_string(),
            }),
            Value::String(s) => Ok(s.clone()),
            other => Err(SkipReason::InvalidField {
                field: "covers[]",
                found: type_name(other),
            }),
        })
        .collect()
}
