//! commgraph CLI
//!
//! A command-line interface for the communication knowledge graph:
//! ingest raw communication records, resolve aliases, and search the
//! vector namespaces.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commgraph_agents::{
    AgentError, EmbeddingClient, HeaderScanExtractor, IngestionPipeline, SearchAgent,
    VectorStoreClient,
};
use commgraph_core::{AliasResolver, AliasTable, NameObservation};
use commgraph_db::{init_memory, init_persistent, DbConnection, GraphWriter};
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Namespaces queried when none are given explicitly
const DEFAULT_NAMESPACES: &[&str] = &["emails", "relationships", "email_chains"];

/// commgraph - a knowledge graph over communication records
#[derive(Parser)]
#[command(name = "commgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (defaults to ~/.commgraph/data)
    #[arg(short, long)]
    db_path: Option<PathBuf>,

    /// Use in-memory database (for testing)
    #[arg(long)]
    memory: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest one raw communication record (reads stdin if no path)
    Ingest {
        /// Path to a text file
        path: Option<PathBuf>,

        /// Alias overrides JSON file (lowercased name -> canonical name)
        #[arg(long)]
        overrides: Option<PathBuf>,
    },

    /// Ingest every record from a CSV column
    ImportCsv {
        /// Path to the CSV file
        path: PathBuf,

        /// Column holding the raw text
        #[arg(short, long, default_value = "email_text")]
        column: String,

        /// Alias overrides JSON file
        #[arg(long)]
        overrides: Option<PathBuf>,
    },

    /// Scan a CSV for header observations and write the alias table
    Aliases {
        /// Path to the CSV file
        path: PathBuf,

        /// Column holding the raw text
        #[arg(short, long, default_value = "email_text")]
        column: String,

        /// Where to write the alias table JSON
        #[arg(short, long, default_value = "aliases.json")]
        output: PathBuf,

        /// Alias overrides JSON file
        #[arg(long)]
        overrides: Option<PathBuf>,
    },

    /// Semantic search across vector namespaces
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Comma-separated namespaces (defaults to the standard set)
        #[arg(short, long)]
        namespaces: Option<String>,
    },

    /// Show database statistics
    Stats,

    /// List people in the graph
    ListPeople {
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show a person and their contacts
    ShowPerson {
        /// Email address
        email: String,
    },

    /// Delete the local database (fresh start)
    ResetDb {
        /// Database path (defaults to ~/.commgraph/data)
        #[arg(short, long)]
        db_path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env if present.
    let _ = dotenvy::dotenv();

    let Cli {
        db_path,
        memory,
        verbose,
        command,
    } = Cli::parse();

    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match command {
        Commands::Ingest { path, overrides } => {
            let db = connect(db_path, memory).await?;
            let text = read_input(path)?;
            run_ingest(db, &text, overrides).await?;
        }
        Commands::ImportCsv {
            path,
            column,
            overrides,
        } => {
            let db = connect(db_path, memory).await?;
            let records = read_csv_column(&path, &column)?;
            run_import(db, records, overrides).await?;
        }
        Commands::Aliases {
            path,
            column,
            output,
            overrides,
        } => {
            let records = read_csv_column(&path, &column)?;
            run_aliases(records, output, overrides)?;
        }
        Commands::Search {
            query,
            limit,
            namespaces,
        } => {
            run_search(&query, limit, namespaces).await?;
        }
        Commands::Stats => {
            let db = connect(db_path.clone(), memory).await?;
            let writer = GraphWriter::new(db);
            let stats = writer.get_stats().await?;
            println!("People: {}", stats.person_count);
            println!("Edges:  {}", stats.edge_count);
        }
        Commands::ListPeople { limit } => {
            let db = connect(db_path.clone(), memory).await?;
            let writer = GraphWriter::new(db);
            for person in writer.list_people(limit).await? {
                println!(
                    "{}  {}",
                    person.email,
                    person.name.as_deref().unwrap_or("(unnamed)")
                );
            }
        }
        Commands::ShowPerson { email } => {
            let db = connect(db_path.clone(), memory).await?;
            let writer = GraphWriter::new(db);
            match writer.get_person(&email).await? {
                Some(person) => {
                    println!(
                        "{}  {}",
                        person.email,
                        person.name.as_deref().unwrap_or("(unnamed)")
                    );
                    let contacts = writer.contacts_of(&email).await?;
                    if contacts.is_empty() {
                        println!("No outgoing edges.");
                    } else {
                        println!("Communicates with:");
                        for contact in contacts {
                            println!(
                                "  {}  {}",
                                contact.email,
                                contact.name.as_deref().unwrap_or("(unnamed)")
                            );
                        }
                    }
                }
                None => println!("No person found for {}", email),
            }
        }
        Commands::ResetDb { db_path } => {
            let path = db_path.unwrap_or_else(default_db_path);
            if path.exists() {
                std::fs::remove_dir_all(&path)
                    .with_context(|| format!("removing {}", path.display()))?;
                println!("Removed {}", path.display());
            } else {
                println!("Nothing to remove at {}", path.display());
            }
        }
    }

    Ok(())
}

async fn run_ingest(db: DbConnection, text: &str, overrides: Option<PathBuf>) -> Result<()> {
    let resolver = build_resolver(overrides)?;
    let pipeline = IngestionPipeline::new(
        HeaderScanExtractor::with_resolver(resolver),
        GraphWriter::new(db),
    );

    let cancel = cancel_on_ctrl_c();
    let report = pipeline
        .ingest_with_cancellation(text, &cancel)
        .await
        .map_err(|e| anyhow::anyhow!("{} (resume from there)", e))?;

    if report.cancelled {
        println!(
            "Cancelled after {} identities and {} edges.",
            report.identities_applied, report.edges_applied
        );
    } else {
        println!(
            "Ingested {} identities and {} edges.",
            report.identities_applied, report.edges_applied
        );
    }
    Ok(())
}

async fn run_import(
    db: DbConnection,
    records: Vec<String>,
    overrides: Option<PathBuf>,
) -> Result<()> {
    let resolver = build_resolver(overrides)?;
    let pipeline = IngestionPipeline::new(
        HeaderScanExtractor::with_resolver(resolver),
        GraphWriter::new(db),
    );

    let cancel = cancel_on_ctrl_c();
    let mut identities = 0;
    let mut edges = 0;
    let mut skipped = 0;

    for record in &records {
        if cancel.is_cancelled() {
            println!("Cancelled.");
            break;
        }
        match pipeline.ingest_with_cancellation(record, &cancel).await {
            Ok(report) => {
                identities += report.identities_applied;
                edges += report.edges_applied;
            }
            // Unparseable records are expected in a raw dump
            Err(e) if matches!(&e.source, AgentError::Extraction(_)) => {
                warn!("Skipping record: {}", e);
                skipped += 1;
            }
            // A timeout or unreachable store affects every remaining
            // record too; stop and report what was applied so the
            // caller can resume.
            Err(e) => {
                identities += e.report.identities_applied;
                edges += e.report.edges_applied;
                println!(
                    "Import halted: {} identity upserts, {} edge upserts applied.",
                    identities, edges
                );
                return Err(e.into());
            }
        }
    }

    println!(
        "Imported {} records: {} identity upserts, {} edge upserts, {} skipped.",
        records.len(),
        identities,
        edges,
        skipped
    );
    Ok(())
}

fn run_aliases(records: Vec<String>, output: PathBuf, overrides: Option<PathBuf>) -> Result<()> {
    let resolver = build_resolver(overrides)?;

    let mut observations: Vec<NameObservation> = Vec::new();
    for record in &records {
        observations.extend(commgraph_agents::extract::scan_observations(record));
    }
    println!(
        "Scanned {} records, {} observations.",
        records.len(),
        observations.len()
    );

    let table: AliasTable = resolver.resolve(&observations).into_iter().collect();
    table
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("Saved {} unique aliases to {}", table.len(), output.display());
    Ok(())
}

async fn run_search(query: &str, limit: usize, namespaces: Option<String>) -> Result<()> {
    let embedder = EmbeddingClient::new(
        std::env::var("COMMGRAPH_EMBEDDER_URL")
            .unwrap_or_else(|_| "http://localhost:8100".into()),
    );
    let store = VectorStoreClient::new(
        std::env::var("COMMGRAPH_VECTOR_URL").unwrap_or_else(|_| "http://localhost:8200".into()),
    );
    let agent = SearchAgent::new(embedder, store);

    let namespaces: Vec<String> = match namespaces {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => DEFAULT_NAMESPACES.iter().map(|s| s.to_string()).collect(),
    };

    let outcome = agent.search(query, &namespaces, limit).await?;

    if outcome.is_partial() {
        for failure in &outcome.failures {
            eprintln!("Warning: skipped namespace {}: {}", failure.namespace, failure.error);
        }
    }

    if outcome.hits.is_empty() {
        println!("No results.");
    }
    for (i, hit) in outcome.hits.iter().enumerate() {
        println!("{}. [{:.4}] ({})", i + 1, hit.score, hit.namespace);
        for (key, value) in &hit.metadata {
            println!("     {}: {}", key, value);
        }
    }
    Ok(())
}

// ==========================================
// HELPERS
// ==========================================

fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".commgraph")
        .join("data")
}

async fn connect(db_path: Option<PathBuf>, memory: bool) -> Result<DbConnection> {
    if memory {
        Ok(init_memory().await?)
    } else {
        let path = db_path.unwrap_or_else(default_db_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(init_persistent(&path).await?)
    }
}

fn build_resolver(overrides: Option<PathBuf>) -> Result<AliasResolver> {
    match overrides {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let map: HashMap<String, String> = serde_json::from_str(&json)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(AliasResolver::with_overrides(map))
        }
        None => Ok(AliasResolver::new()),
    }
}

fn read_input(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn read_csv_column(path: &PathBuf, column: &str) -> Result<Vec<String>> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("opening {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let index = headers
        .iter()
        .position(|h| h == column)
        .with_context(|| format!("no column named '{}' in {}", column, path.display()))?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;
        if let Some(value) = record.get(index) {
            if !value.trim().is_empty() {
                records.push(value.to_string());
            }
        }
    }
    Ok(records)
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
    cancel
}
