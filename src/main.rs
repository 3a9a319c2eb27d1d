//! marginalia
//!
//! Keeps the annotations a PDF viewer stores in its SQLite files and the
//! annotations embedded in the PDFs themselves in sync.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marginalia::config::{Config, EmbedMethod};
use marginalia::db::SqliteRepository;
use marginalia::pdf::MupdfDocument;
use marginalia::sync::{
    embed_text, extract_output_path, parse_free_text_options, parse_page_rect,
    remove_annotations, SyncContext, SyncReport,
};

#[derive(Parser)]
#[command(name = "marginalia")]
#[command(about = "Sync viewer highlights and bookmarks with annotations inside PDF files")]
#[command(version)]
struct Cli {
    /// Viewer database holding the path to hash table
    #[arg(long, global = true)]
    local_db: Option<PathBuf>,

    /// Viewer database holding highlights and bookmarks
    #[arg(long, global = true)]
    shared_db: Option<PathBuf>,

    /// Print one JSON object per document instead of a summary line
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write stored highlights and bookmarks into the PDFs
    Embed {
        /// PDF files
        #[arg(required = true)]
        documents: Vec<String>,

        /// Place highlights by text search (search) or by stored word positions (words)
        #[arg(short, long)]
        method: Option<String>,
    },

    /// Store the PDFs' highlights and notes in the viewer database
    Import {
        /// PDF files
        #[arg(required = true)]
        documents: Vec<String>,
    },

    /// Copy highlighted regions into a new PDF linked back to the document
    Extract {
        /// PDF file
        document: String,

        /// Where to write the extract [default: <name>_highlights.pdf beside the document]
        #[arg(short, long)]
        output: Option<String>,

        /// Viewer zoom level; links open at half of it
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
    },

    /// Delete annotations intersecting a rectangle
    Remove {
        /// PDF file
        document: String,

        /// Area as page,x0,y0,x1,y1
        rect: String,
    },

    /// Add a free-text box
    AddText {
        /// PDF file
        document: String,

        /// Box as page,x0,y0,x1,y1
        rect: String,

        /// Text to show
        text: String,

        /// Styling as key=value (fontsize, text_color, fill_color, border_color)
        options: Vec<String>,
    },
}

/// Strip one pair of matching quotes; the viewer passes quoted paths
fn unquote(arg: &str) -> &str {
    let arg = arg.trim();
    for quote in ['"', '\''] {
        if arg.len() >= 2 && arg.starts_with(quote) && arg.ends_with(quote) {
            return &arg[1..arg.len() - 1];
        }
    }
    arg
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "marginalia=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(path) = cli.local_db {
        config.database.local_path = Some(PathBuf::from(unquote(&path.to_string_lossy())));
    }
    if let Some(path) = cli.shared_db {
        config.database.shared_path = Some(PathBuf::from(unquote(&path.to_string_lossy())));
    }

    match cli.command {
        Commands::Embed { documents, method } => {
            if let Some(method) = method {
                config.sync.embed_method = unquote(&method).parse::<EmbedMethod>()?;
            }
            run_sync(&config, &documents, Pass::Embed, cli.json).await
        }
        Commands::Import { documents } => {
            run_sync(&config, &documents, Pass::Import, cli.json).await
        }
        Commands::Extract {
            document,
            output,
            zoom,
        } => {
            let path = unquote(&document);
            let output = output
                .as_deref()
                .map(|o| PathBuf::from(unquote(o)))
                .unwrap_or_else(|| extract_output_path(Path::new(path)));
            let repository = open_repository(&config).await?;

            let pdf = MupdfDocument::open(path).with_context(|| format!("Failed to open {}", path))?;
            let source = pdf.bytes().to_vec();
            let mut context = SyncContext::for_path(pdf, repository, path, config.sync.clone()).await?;
            let report = context.extract(&source, &output, zoom).await?;

            if cli.json {
                println!("{}", serde_json::json!({ "document": path, "report": report }));
            } else {
                println!("{}: {}", path, report);
            }
            Ok(())
        }
        Commands::Remove { document, rect } => {
            let path = unquote(&document);
            let (page, rect) = parse_page_rect(unquote(&rect))?;
            let mut pdf = MupdfDocument::open(path).with_context(|| format!("Failed to open {}", path))?;
            let removed = remove_annotations(&mut pdf, page, &rect)?;
            println!("{}: removed {} annotations", path, removed);
            Ok(())
        }
        Commands::AddText {
            document,
            rect,
            text,
            options,
        } => {
            let path = unquote(&document);
            let (page, rect) = parse_page_rect(unquote(&rect))?;
            let options = parse_free_text_options(options.iter().map(|o| unquote(o)))?;
            let mut pdf = MupdfDocument::open(path).with_context(|| format!("Failed to open {}", path))?;
            embed_text(&mut pdf, page, rect, unquote(&text), &options)?;
            println!("{}: text added on page {}", path, page);
            Ok(())
        }
    }
}

#[derive(Clone, Copy)]
enum Pass {
    Embed,
    Import,
}

async fn open_repository(config: &Config) -> Result<Arc<SqliteRepository>> {
    let local = config
        .database
        .local_path
        .as_deref()
        .context("No local database; pass --local-db or set MARGINALIA_LOCAL_DB")?;
    let shared = config
        .database
        .shared_path
        .as_deref()
        .context("No shared database; pass --shared-db or set MARGINALIA_SHARED_DB")?;

    let repository = SqliteRepository::connect(local, shared)
        .await
        .context("Failed to open viewer databases")?;
    Ok(Arc::new(repository))
}

async fn run_sync(config: &Config, documents: &[String], pass: Pass, json: bool) -> Result<()> {
    let repository = open_repository(config).await?;

    let mut failures = 0;
    for document in documents {
        let path = unquote(document);
        match sync_document(config, repository.clone(), path, pass).await {
            Ok(report) if json => {
                println!("{}", serde_json::json!({ "document": path, "report": report }));
            }
            Ok(report) => println!("{}: {}", path, report),
            Err(e) => {
                failures += 1;
                tracing::error!(path = %path, error = %format!("{:#}", e), "Sync failed");
                if json {
                    println!("{}", serde_json::json!({ "document": path, "error": format!("{:#}", e) }));
                } else {
                    println!("{}: failed: {:#}", path, e);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} documents failed", failures, documents.len());
    }
    Ok(())
}

async fn sync_document(
    config: &Config,
    repository: Arc<SqliteRepository>,
    path: &str,
    pass: Pass,
) -> Result<SyncReport> {
    let pdf = MupdfDocument::open(path).with_context(|| format!("Failed to open {}", path))?;
    let mut context = SyncContext::for_path(pdf, repository, path, config.sync.clone()).await?;

    let report = match pass {
        Pass::Embed => context.embed().await?,
        Pass::Import => context.import().await?,
    };

    let stats = context.cache_stats();
    tracing::debug!(
        pages_cached = stats.pages_used,
        hits = stats.hits,
        misses = stats.misses,
        "Page cache"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"/home/u/a b.pdf\""), "/home/u/a b.pdf");
        assert_eq!(unquote("'/home/u/a.pdf'"), "/home/u/a.pdf");
        assert_eq!(unquote("/home/u/a.pdf"), "/home/u/a.pdf");
        assert_eq!(unquote("\"unbalanced"), "\"unbalanced");
        assert_eq!(unquote("\""), "\"");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from([
            "marginalia",
            "--shared-db",
            "/tmp/shared.db",
            "add-text",
            "a.pdf",
            "0,10,10,100,40",
            "hello",
            "fontsize=12",
        ]);
        assert_eq!(cli.shared_db, Some(PathBuf::from("/tmp/shared.db")));
        assert!(matches!(cli.command, Commands::AddText { ref options, .. } if options.len() == 1));

        let cli = Cli::parse_from(["marginalia", "extract", "paper.pdf", "--zoom", "2.5"]);
        assert!(matches!(
            cli.command,
            Commands::Extract { ref output, zoom, .. } if output.is_none() && zoom == 2.5
        ));
    }
}
