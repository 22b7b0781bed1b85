use crate::config::AUTHOR_KEY_PREFIX;
use crate::error::LineResult;
use crate::json::{opt_string, parse_object, strip_key_prefix, Object};
use crate::models::Author;

/// Parses the JSON payload of one author dump line.
pub fn parse_author(payload: &str) -> LineResult<Author> {
    let obj = parse_object(payload)?;
    Ok(author_from_object(&obj))
}

/// Every field is optional; a missing `key` yields an empty id.
pub fn author_from_object(obj: &Object) -> Author {
    Author {
        id: strip_key_prefix(&opt_string(obj, "key"), AUTHOR_KEY_PREFIX),
        name: opt_string(obj, "name"),
        personal_name: opt_string(obj, "personal_name"),
    }
}
