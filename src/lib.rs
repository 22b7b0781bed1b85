//! Bookloader: Open Library dump ingestion
//!
//! Loads two line-delimited dumps, one of authors and one of works, into a
//! book store. Each dump line is some non-JSON prefix (the Open Library dumps
//! use tab-separated type, key, revision and timestamp columns) followed by a
//! JSON object.
//!
//! The run has two strictly ordered phases:
//!
//! 1. **Author phase** -- Parse every author line and commit all authors with a
//!    single bulk save
//! 2. **Works phase** -- Parse every work line, resolve its author references
//!    against the committed author store, and commit all books with a single
//!    bulk save
//!
//! A bad line (no JSON, malformed JSON, unexpected nested shape) is logged and
//! skipped. A missing dump or a failing store aborts the run.
//!
//! # Key Modules
//!
//! - [`reader`] -- Lazy line reader with JSON payload extraction and BZ2 support
//! - [`author`] -- Author line parsing
//! - [`work`] -- Work line parsing
//! - [`linker`] -- Author id to name resolution
//! - [`batch`] -- Per-phase accumulation and single bulk save
//! - [`pipeline`] -- The two-phase orchestrator and its state machine
//! - [`store`] -- Persistence interface and in-memory store
//! - [`snapshot`] -- File-backed store with atomic snapshot writes
//! - [`models`] -- Author, WorkRecord and Book
//! - [`stats`] -- Per-phase counters and the run report
//! - [`config`] -- Key prefixes, sentinel values and tuning constants
//!
//! # Known Quirks
//!
//! - Author references inside works are stripped of `/authors` without the
//!   trailing slash, so by default they do not match author ids and resolve to
//!   `Unknown Author`. [`work::AuthorRefMode::Normalized`] opts into matching ids.
//! - `published_date` is the ingestion date for any work with a `created`
//!   timestamp; the timestamp itself is not parsed.
//!
//! # Example Usage
//!
//! ```bash
//! bookloader --authors ol_dump_authors.txt.bz2 --works ol_dump_works.txt.bz2 --store-dir store/
//!
//! # Parse and link without writing anything
//! bookloader --authors authors.txt --works works.txt --dry-run -v
//! ```

pub mod author;
pub mod batch;
pub mod config;
pub mod error;
pub mod json;
pub mod linker;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod work;
