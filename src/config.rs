/// Prefix stripped from author keys (`/authors/OL1A` -> `OL1A`)
pub const AUTHOR_KEY_PREFIX: &str = "/authors/";

/// Prefix stripped from work keys (`/works/OL1W` -> `OL1W`)
pub const WORK_KEY_PREFIX: &str = "/works/";

/// Prefix stripped from author references inside a work.
///
/// No trailing slash, so `/authors/OL1A` becomes `/OL1A`. This does not match
/// [`AUTHOR_KEY_PREFIX`]; see `AuthorRefMode` for the opt-in normalization.
pub const WORK_AUTHOR_REF_PREFIX: &str = "/authors";

/// Name used when a referenced author is not in the store
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Progress update interval (tick every N lines)
pub const PROGRESS_INTERVAL: u64 = 10_000;

/// Buffer size for dump readers
pub const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Bump when the snapshot layout changes
pub const STORE_VERSION: u32 = 1;

/// Snapshot file names inside the store directory
pub const AUTHOR_STORE_FILE: &str = "authors.store";
pub const BOOK_STORE_FILE: &str = "books.store";
