//! Docosphere command line
//!
//! Process documents into an index, ask questions, inspect the index or start the server.

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use walkdir::WalkDir;

use docosphere::{
    config::RagConfig,
    error::Error,
    retrieval::IndexStore,
    server::{AppState, RagServer},
    types::{AnswerRoute, FileType, SkippedFile, UploadedDocument},
};

/// Docosphere: ask questions about your PDF and Word documents
#[derive(Parser, Debug)]
#[command(name = "docosphere", version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, chunk and index documents, replacing the current index
    Process {
        /// Files or directories (searched for .pdf and .docx)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Ask a question
    Ask {
        /// The question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the current index
    Status,
    /// Start the HTTP server
    Serve,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "docosphere=warn",
        1 => "docosphere=info",
        _ => "docosphere=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Expand directories into the supported files beneath them
fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_supported(p))
                .collect();
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| FileType::from_extension(ext).is_supported())
        .unwrap_or(false)
}

/// Read each file, setting aside the ones that cannot be opened
fn read_documents(files: &[PathBuf]) -> (Vec<UploadedDocument>, Vec<SkippedFile>) {
    let mut documents = Vec::with_capacity(files.len());
    let mut unreadable = Vec::new();
    for file in files {
        match UploadedDocument::from_path(file) {
            Ok(document) => documents.push(document),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", file.display(), e);
                unreadable.push(SkippedFile {
                    filename: file.display().to_string(),
                    reason: format!("could not be read: {}", e),
                });
            }
        }
    }
    (documents, unreadable)
}

fn print_skipped(skipped: &[SkippedFile]) {
    for file in skipped {
        println!("  {} {}: {}", style("skipped").yellow(), file.filename, file.reason);
    }
}

fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn report(err: &Error) {
    eprintln!("{} {}", style("⚠").yellow().bold(), style(err.user_message()).yellow());
    tracing::debug!("{:?}", err);
}

async fn process(config: RagConfig, paths: &[PathBuf]) -> anyhow::Result<bool> {
    let (documents, unreadable) = read_documents(&collect_files(paths));
    if documents.is_empty() {
        print_skipped(&unreadable);
        eprintln!("{}", style("Please provide at least one PDF or Word file.").yellow());
        return Ok(false);
    }

    let state = AppState::new(config)?;
    let pb = spinner(&format!("Extracting text & creating vector index for {} files…", documents.len()))?;
    let result = state.pipeline().process(documents).await;
    pb.finish_and_clear();

    match result {
        Ok(response) => {
            println!(
                "{} Documents processed! {} chunks from {} files ({} chars) in {}ms",
                style("✓").green().bold(),
                response.total_chunks,
                response.documents_indexed.len(),
                response.total_chars,
                response.processing_time_ms
            );
            print_skipped(&unreadable);
            print_skipped(&response.skipped);
            Ok(true)
        }
        Err(e) => {
            print_skipped(&unreadable);
            report(&e);
            Ok(false)
        }
    }
}

async fn ask(config: RagConfig, question: &str) -> anyhow::Result<bool> {
    let state = AppState::new(config)?;
    let pb = spinner("Thinking…")?;
    let result = state.router().ask(question).await;
    pb.finish_and_clear();

    match result {
        Ok(response) => {
            let notice = match response.route {
                AnswerRoute::Documents => style(response.notice.as_str()).cyan(),
                AnswerRoute::ModelKnowledge => style(response.notice.as_str()).magenta(),
            };
            println!("{}\n", notice);
            println!("{}\n", style("Answer").bold().underlined());
            println!("{}", response.answer);
            Ok(true)
        }
        Err(e) => {
            report(&e);
            Ok(false)
        }
    }
}

async fn status(config: RagConfig) -> anyhow::Result<bool> {
    let store = IndexStore::from_config(&config);
    match store.manifest().await {
        Ok(manifest) => {
            println!("{} {}", style("Index:").bold(), store.file_path().display());
            println!("  Built:      {}", manifest.created_at.to_rfc3339());
            println!("  Embeddings: {} ({}, {} dims)", manifest.model, manifest.provider, manifest.dimensions);
            println!(
                "  Chunks:     {} ({} chars, {} overlap)",
                manifest.chunk_count, manifest.chunking.chunk_size, manifest.chunking.chunk_overlap
            );
            println!("  Documents:");
            for source in &manifest.sources {
                println!(
                    "    {} ({}, {} chars, sha256 {})",
                    source.filename,
                    source.file_type.display_name(),
                    source.chars,
                    &source.content_hash[..12.min(source.content_hash.len())]
                );
            }
            Ok(true)
        }
        Err(e) => {
            report(&e);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = RagConfig::load(cli.config.as_deref())?;

    let ok = match cli.command {
        Commands::Process { paths } => process(config, &paths).await?,
        Commands::Ask { question } => ask(config, &question.join(" ")).await?,
        Commands::Status => status(config).await?,
        Commands::Serve => {
            RagServer::new(config)?.start().await?;
            true
        }
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("notes.pdf");
        std::fs::write(&good, b"%PDF-1.4").unwrap();
        let missing = dir.path().join("missing.docx");

        let (documents, unreadable) = read_documents(&[missing.clone(), good]);

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].filename, "notes.pdf");
        assert_eq!(unreadable.len(), 1);
        assert_eq!(unreadable[0].filename, missing.display().to_string());
    }

    #[test]
    fn test_all_unreadable_yields_no_documents() {
        let dir = tempfile::tempdir().unwrap();
        let (documents, unreadable) = read_documents(&[dir.path().join("a.pdf"), dir.path().join("b.pdf")]);

        assert!(documents.is_empty());
        assert_eq!(unreadable.len(), 2);
    }

    #[test]
    fn test_collect_files_filters_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.docx"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("skip.txt"), b"x").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]);
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect();
        assert_eq!(names, ["a.pdf", "b.docx"]);
    }
}
