use crate::author::parse_author;
use crate::batch::BatchLoader;
use crate::config::PROGRESS_INTERVAL;
use crate::error::LineResult;
use crate::linker::AuthorLinker;
use crate::models::{Author, Book, Keyed};
use crate::reader::DumpReader;
use crate::stats::{IngestReport, PhaseStats};
use crate::store::Store;
use crate::work::{AuthorRefMode, WorkParser};
use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub author_dump: PathBuf,
    pub works_dump: PathBuf,
    /// Read at most this many lines from each dump
    pub limit: Option<u64>,
    pub author_refs: AuthorRefMode,
}

impl IngestConfig {
    pub fn new(author_dump: impl Into<PathBuf>, works_dump: impl Into<PathBuf>) -> Self {
        Self {
            author_dump: author_dump.into(),
            works_dump: works_dump.into(),
            limit: None,
            author_refs: AuthorRefMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    ReadingAuthors,
    PersistingAuthors,
    ReadingWorks,
    PersistingWorks,
    Done,
}

impl PipelineState {
    /// The only state reachable from `self`
    pub fn successor(self) -> Option<Self> {
        match self {
            PipelineState::Idle => Some(PipelineState::ReadingAuthors),
            PipelineState::ReadingAuthors => Some(PipelineState::PersistingAuthors),
            PipelineState::PersistingAuthors => Some(PipelineState::ReadingWorks),
            PipelineState::ReadingWorks => Some(PipelineState::PersistingWorks),
            PipelineState::PersistingWorks => Some(PipelineState::Done),
            PipelineState::Done => None,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::ReadingAuthors => "reading authors",
            PipelineState::PersistingAuthors => "persisting authors",
            PipelineState::ReadingWorks => "reading works",
            PipelineState::PersistingWorks => "persisting works",
            PipelineState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Two-phase ingestion: every author is committed before the first work line is read,
/// so work linking only ever sees the complete author store.
///
/// A pipeline runs once. After a failure it stays in the state where the failure
/// happened and refuses to run again; build a new one to retry.
pub struct Pipeline<'a, A, B> {
    config: IngestConfig,
    authors: &'a mut A,
    books: &'a mut B,
    state: PipelineState,
}

impl<'a, A, B> Pipeline<'a, A, B>
where
    A: Store<Author>,
    B: Store<Book>,
{
    pub fn new(config: IngestConfig, authors: &'a mut A, books: &'a mut B) -> Self {
        Self {
            config,
            authors,
            books,
            state: PipelineState::Idle,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn run(&mut self) -> Result<IngestReport> {
        if self.state != PipelineState::Idle {
            bail!("Pipeline has already run (state: {})", self.state);
        }

        self.advance(PipelineState::ReadingAuthors)?;
        let (batch, mut authors) = self.read_authors()?;

        self.advance(PipelineState::PersistingAuthors)?;
        authors.records_saved = batch
            .commit(&mut *self.authors)
            .context("Author phase failed")? as u64;
        info!(
            lines = authors.lines_read,
            saved = authors.records_saved,
            skipped = authors.lines_skipped,
            "Author phase complete"
        );

        self.advance(PipelineState::ReadingWorks)?;
        let (batch, mut works) = self.read_works()?;

        self.advance(PipelineState::PersistingWorks)?;
        works.records_saved = batch
            .commit(&mut *self.books)
            .context("Works phase failed")? as u64;
        info!(
            lines = works.lines_read,
            saved = works.records_saved,
            skipped = works.lines_skipped,
            unknown_authors = works.unknown_authors,
            "Works phase complete"
        );

        self.advance(PipelineState::Done)?;
        Ok(IngestReport { authors, works })
    }

    fn advance(&mut self, next: PipelineState) -> Result<()> {
        if self.state.successor() != Some(next) {
            bail!("Illegal pipeline transition: {} -> {}", self.state, next);
        }
        debug!(from = %self.state, to = %next, "Pipeline state change");
        self.state = next;
        Ok(())
    }

    fn read_authors(&self) -> Result<(BatchLoader<Author>, PhaseStats)> {
        let mut stats = PhaseStats::new();
        let batch = read_dump(
            &self.config.author_dump,
            self.config.limit,
            "authors",
            &mut stats,
            |payload| Ok(parse_author(payload)),
        )
        .context("Author phase failed")?;
        Ok((batch, stats))
    }

    fn read_works(&self) -> Result<(BatchLoader<Book>, PhaseStats)> {
        let mut stats = PhaseStats::new();
        let parser = WorkParser::new(self.config.author_refs);
        let linker = AuthorLinker::new(&*self.authors);

        let batch = read_dump(
            &self.config.works_dump,
            self.config.limit,
            "works",
            &mut stats,
            |payload| match parser.parse(payload) {
                Ok(record) => Ok(Ok(linker.link(record)?)),
                Err(reason) => Ok(Err(reason)),
            },
        )
        .context("Works phase failed")?;

        stats.author_lookups = linker.lookups();
        stats.unknown_authors = linker.unknown_authors();
        Ok((batch, stats))
    }
}

/// Reads one dump into a batch. `parse` returns `Err` only for fatal problems;
/// a line-level `SkipReason` is logged and counted.
fn read_dump<R, F>(
    path: &Path,
    limit: Option<u64>,
    label: &'static str,
    stats: &mut PhaseStats,
    mut parse: F,
) -> Result<BatchLoader<R>>
where
    R: Keyed,
    F: FnMut(&str) -> Result<LineResult<R>>,
{
    let reader = DumpReader::open(path)?;
    let mut batch = BatchLoader::new(label);
    let pb = ProgressBar::new_spinner();

    info!("Reading {} from: {}", label, path.display());

    for line in reader {
        let line = line?;
        if limit.is_some_and(|limit| line.number > limit) {
            debug!(?limit, "Line limit reached");
            break;
        }
        stats.inc_lines();

        let parsed = match line.payload() {
            Ok(payload) => parse(payload)?,
            Err(reason) => Err(reason),
        };

        match parsed {
            Ok(record) => {
                if record.id().is_empty() {
                    warn!(
                        phase = label,
                        line = line.number,
                        "Record has no key, stored with empty id"
                    );
                    stats.inc_empty_ids();
                }
                stats.inc_parsed();
                batch.push(record);
            }
            Err(reason) => {
                warn!(phase = label, line = line.number, reason = %reason, "Skipping line");
                stats.inc_skipped();
            }
        }

        if line.number % PROGRESS_INTERVAL == 0 {
            pb.tick();
        }
    }

    pb.finish_and_clear();

    info!(
        lines = stats.lines_read,
        records = stats.records_parsed,
        skipped = stats.lines_skipped,
        "Finished reading {}",
        label
    );

    Ok(batch)
}
