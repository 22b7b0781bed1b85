use thiserror::Error;

/// Why a single dump line was skipped. Skips are logged and counted; they never abort a phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("line has no JSON payload")]
    NoJsonPayload,

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has unexpected type {found}")]
    InvalidField {
        field: &'static str,
        found: &'static str,
    },
}

impl From<serde_json::Error> for SkipReason {
    fn from(e: serde_json::Error) -> Self {
        SkipReason::MalformedJson(e.to_string())
    }
}

pub type LineResult<T> = Result<T, SkipReason>;
