mod db;
mod error;
mod firestore;
mod parser;
mod seed;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use db::{DocumentStore, MemoryStore, SqliteStore};
use firestore::FirestoreStore;
use parser::sections::Section;
use settings::Settings;

const DEFAULT_DOCUMENT: &str = "DEVELOPMENT_BEST_PRACTICES.md";
const DEFAULT_COLLECTION: &str = "knowledge_base";

#[derive(Parser)]
#[command(
    name = "kb_seeder",
    about = "Seed a Firestore knowledge base from a markdown best-practices document"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload every `## ` section of the document, overwriting existing records
    Seed {
        /// Markdown document to read
        #[arg(short, long, default_value = DEFAULT_DOCUMENT)]
        file: PathBuf,
        /// Target collection
        #[arg(short, long, default_value = DEFAULT_COLLECTION)]
        collection: String,
        /// Write to a local SQLite file instead of Firestore
        #[arg(long, conflicts_with = "dry_run")]
        sqlite: Option<PathBuf>,
        /// Parse and classify only; print the records that would be written
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the sections the document splits into
    Preview {
        /// Markdown document to read
        #[arg(short, long, default_value = DEFAULT_DOCUMENT)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Seed {
            file,
            collection,
            sqlite,
            dry_run,
        } => run_seed(&file, &collection, sqlite.as_deref(), dry_run).await,
        Commands::Preview { file } => {
            let sections = parser::load_sections(&file)?;
            print_preview(&sections);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_seed(
    file: &Path,
    collection: &str,
    sqlite: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<()> {
    println!("Starting to seed knowledge base from {}...", file.display());
    let sections = parser::load_sections(file)?;
    info!(file = %file.display(), sections = sections.len(), "document loaded");

    if dry_run {
        let store = MemoryStore::new();
        let report = seed::seed_as(&store, collection, &sections, seed::DRY_RUN).await?;
        println!(
            "Dry run: {} sections ({} universal, {} situational) -> {} distinct documents, nothing written.",
            report.seeded,
            report.universal,
            report.situational,
            store.documents(collection).len()
        );
        return Ok(());
    }

    if let Some(path) = sqlite {
        let store = SqliteStore::open(path)
            .with_context(|| format!("Failed to open SQLite store {:?}", path))?;
        let report = seed::seed(&store, collection, &sections).await?;
        println!(
            "Finished seeding knowledge base: {} sections ({} universal, {} situational); {} documents in {}:{}.",
            report.seeded,
            report.universal,
            report.situational,
            store.count(collection)?,
            path.display(),
            collection
        );
        return Ok(());
    }

    let settings = Settings::load().context("Failed to load Firebase settings")?;
    info!(settings = ?settings, "Firestore settings loaded");
    let store = FirestoreStore::from_settings(&settings)?;
    seed_and_report(&store, collection, &sections).await
}

async fn seed_and_report(
    store: &dyn DocumentStore,
    collection: &str,
    sections: &[Section],
) -> anyhow::Result<()> {
    let report = seed::seed(store, collection, sections).await?;
    println!(
        "Finished seeding knowledge base: {} sections ({} universal, {} situational).",
        report.seeded, report.universal, report.situational
    );
    Ok(())
}

fn print_preview(sections: &[Section]) {
    if sections.is_empty() {
        println!("No `## ` sections found.");
        return;
    }

    println!(
        "{:>3} | {:<40} | {:<11} | {:<40} | {:>6}",
        "#", "Id", "Type", "Title", "Chars"
    );
    println!("{}", "-".repeat(112));

    for (i, s) in sections.iter().enumerate() {
        println!(
            "{:>3} | {:<40} | {:<11} | {:<40} | {:>6}",
            i + 1,
            truncate(&s.id(), 40),
            s.category().as_str(),
            truncate(&s.title, 40),
            s.content.chars().count()
        );
    }

    println!("\n{} sections", sections.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn seed_defaults() {
        let cli = Cli::try_parse_from(["kb_seeder", "seed"]).unwrap();
        match cli.command {
            Commands::Seed {
                file,
                collection,
                sqlite,
                dry_run,
            } => {
                assert_eq!(file, PathBuf::from(DEFAULT_DOCUMENT));
                assert_eq!(collection, "knowledge_base");
                assert!(sqlite.is_none());
                assert!(!dry_run);
            }
            _ => panic!("expected seed"),
        }
    }

    #[test]
    fn sqlite_and_dry_run_conflict() {
        assert!(Cli::try_parse_from(["kb_seeder", "seed", "--sqlite", "kb.db", "--dry-run"]).is_err());
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn durations() {
        use std::time::Duration;
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_secs(3725)), "1h 2m 5s");
    }

    #[tokio::test]
    async fn dry_run_writes_nothing_and_succeeds() {
        run_seed(
            Path::new("tests/fixtures/best_practices.md"),
            "knowledge_base",
            None,
            true,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn dry_run_rejects_titles_without_an_id() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("doc.md");
        std::fs::write(&doc, "\n## Core Philosophy\nBe kind.\n## !!!\nB\n").unwrap();

        let err = run_seed(&doc, "kb", None, true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<error::SeedError>(),
            Some(error::SeedError::StorageWrite { id, .. }) if id.is_empty()
        ));
    }

    #[tokio::test]
    async fn missing_document_fails_before_any_write() {
        let err = run_seed(Path::new("tests/fixtures/nope.md"), "kb", None, true)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<error::SeedError>(),
            Some(error::SeedError::DocumentLoad { .. })
        ));
    }

    #[tokio::test]
    async fn sqlite_backend_round() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("kb.sqlite");
        for _ in 0..2 {
            run_seed(
                Path::new("tests/fixtures/best_practices.md"),
                "knowledge_base",
                Some(db_path.as_path()),
                false,
            )
            .await
            .unwrap();
        }
        let store = SqliteStore::open(&db_path).unwrap();
        assert_eq!(store.count("knowledge_base").unwrap(), 8);
    }
}
