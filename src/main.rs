use anyhow::{Context, Result};
use bookloader::config::{AUTHOR_STORE_FILE, BOOK_STORE_FILE};
use bookloader::models::{Author, Book};
use bookloader::pipeline::{IngestConfig, Pipeline};
use bookloader::snapshot::SnapshotStore;
use bookloader::stats::IngestReport;
use bookloader::store::{MemoryStore, Store};
use bookloader::work::AuthorRefMode;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "bookloader")]
#[command(about = "Load Open Library author and work dumps into a book store")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to the author dump (.txt or .txt.bz2)
    #[arg(long, env = "BOOKLOADER_AUTHOR_DUMP")]
    authors: PathBuf,

    /// Path to the works dump (.txt or .txt.bz2)
    #[arg(long, env = "BOOKLOADER_WORKS_DUMP")]
    works: PathBuf,

    /// Directory holding the author and book snapshots
    #[arg(long, default_value = "store")]
    store_dir: PathBuf,

    /// Parse and link without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Limit number of lines read from each dump (for testing)
    #[arg(long)]
    limit: Option<u64>,

    /// Strip "/authors/" instead of "/authors" from work author references
    #[arg(long)]
    normalize_author_refs: bool,
}

impl Cli {
    fn ingest_config(&self) -> IngestConfig {
        let mut config = IngestConfig::new(&self.authors, &self.works);
        config.limit = self.limit;
        config.author_refs = if self.normalize_author_refs {
            AuthorRefMode::Normalized
        } else {
            AuthorRefMode::AsBuilt
        };
        config
    }
}

fn run_ingest<A, B>(config: IngestConfig, authors: &mut A, books: &mut B) -> Result<()>
where
    A: Store<Author>,
    B: Store<Book>,
{
    let start = Instant::now();
    let report = Pipeline::new(config, authors, books).run()?;
    print_summary(&report, start.elapsed().as_secs_f64());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.ingest_config();

    if cli.dry_run {
        info!("Dry run, using in-memory stores");
        return run_ingest(
            config,
            &mut MemoryStore::<Author>::new(),
            &mut MemoryStore::<Book>::new(),
        );
    }

    fs::create_dir_all(&cli.store_dir).with_context(|| {
        format!(
            "Failed to create store directory: {}",
            cli.store_dir.display()
        )
    })?;

    let mut authors: SnapshotStore<Author> =
        SnapshotStore::open(cli.store_dir.join(AUTHOR_STORE_FILE))?;
    let mut books: SnapshotStore<Book> =
        SnapshotStore::open(cli.store_dir.join(BOOK_STORE_FILE))?;
    run_ingest(config, &mut authors, &mut books)
}

fn print_summary(report: &IngestReport, elapsed_secs: f64) {
    println!();
    println!("=== Summary ===");
    println!("Total time:         {:.2}s", elapsed_secs);
    println!();
    println!("Author lines read:  {}", report.authors.lines_read);
    println!("Authors saved:      {}", report.authors.records_saved);
    println!("Authors skipped:    {}", report.authors.lines_skipped);
    println!("Authors without id: {}", report.authors.empty_ids);
    println!();
    println!("Work lines read:    {}", report.works.lines_read);
    println!("Books saved:        {}", report.works.records_saved);
    println!("Works skipped:      {}", report.works.lines_skipped);
    println!("Works without id:   {}", report.works.empty_ids);
    println!("Author lookups:     {}", report.works.author_lookups);
    println!("Unknown authors:    {}", report.works.unknown_authors);
    println!();
    println!("Total saved:        {}", report.total_saved());
    println!("Total skipped:      {}", report.total_skipped());
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    match run(cli) {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["bookloader", "--authors", "a.txt", "--works", "w.txt.bz2"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_keep_author_refs_as_built() {
        let cli = parse(&[]);
        assert_eq!(cli.store_dir, PathBuf::from("store"));
        assert!(!cli.dry_run);

        let config = cli.ingest_config();
        assert_eq!(config.author_dump, PathBuf::from("a.txt"));
        assert_eq!(config.works_dump, PathBuf::from("w.txt.bz2"));
        assert_eq!(config.limit, None);
        assert_eq!(config.author_refs, AuthorRefMode::AsBuilt);
    }

    #[test]
    fn normalize_flag_selects_normalized_refs() {
        let config = parse(&["--normalize-author-refs"]).ingest_config();
        assert_eq!(config.author_refs, AuthorRefMode::Normalized);
    }

    #[test]
    fn limit_and_dry_run_are_passed_through() {
        let cli = parse(&["--limit", "50", "--dry-run", "-vv"]);
        assert!(cli.dry_run);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.ingest_config().limit, Some(50));
    }

    #[test]
    fn limit_must_be_a_number() {
        let mut argv = vec!["bookloader", "--authors", "a.txt", "--works", "w.txt"];
        argv.extend_from_slice(&["--limit", "many"]);
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
