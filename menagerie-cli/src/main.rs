//! Menagerie CLI - animal records with a seed-stable ranked search

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use menagerie::mcp::McpServer;
use menagerie::{AnimalDto, AnimalService, Config, Page, PageRequest, SqliteIndex, Store};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "menagerie")]
#[command(
    author,
    version,
    about = "Menagerie - Animal records with a seed-stable, promotion-weighted search"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Record store path (default: ~/.cache/menagerie/animals.sqlite)
    #[arg(long, short = 'd', env = "MENAGERIE_DB_PATH", global = true)]
    database: Option<PathBuf>,

    /// Search index path (default: ~/.cache/menagerie/index.sqlite)
    #[arg(long, short = 'i', env = "MENAGERIE_INDEX_PATH", global = true)]
    index: Option<PathBuf>,

    /// YAML config file
    #[arg(long, short = 'c', env = "MENAGERIE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the record store and search index
    Init,

    /// Create an animal
    Create {
        /// Animal name (must be unique)
        name: String,

        /// Rank this animal above all others in search
        #[arg(long, short = 'p')]
        promoted: bool,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Replace an animal's name and promotion flag
    Update {
        /// Animal id
        id: i64,

        /// New name
        name: String,

        /// Rank this animal above all others in search
        #[arg(long, short = 'p')]
        promoted: bool,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Show one animal
    Get {
        /// Animal id
        id: i64,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// List animals in id order
    List {
        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: usize,

        /// Page size (default from config)
        #[arg(long, short = 'n')]
        size: Option<usize>,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Delete an animal
    Delete {
        /// Animal id
        id: i64,
    },

    /// Search animals by name
    Search {
        /// Search text; the last word matches as a prefix
        term: String,

        /// Shuffle seed; reuse it to page through the same order
        #[arg(long, short = 's')]
        seed: Option<String>,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: usize,

        /// Page size (default from config)
        #[arg(long, short = 'n')]
        size: Option<usize>,

        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Push every stored animal into the search index
    Reindex,

    /// Show store and index statistics
    Status {
        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Start MCP server (stdio transport)
    Serve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. Always on stderr: stdout carries results, and for
    // `serve` the protocol itself.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if matches!(cli.command, Commands::Serve) {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Init => cmd_init(&config),
        Commands::Create {
            name,
            promoted,
            format,
        } => cmd_create(&config, &name, promoted, &format),
        Commands::Update {
            id,
            name,
            promoted,
            format,
        } => cmd_update(&config, id, &name, promoted, &format),
        Commands::Get { id, format } => cmd_get(&config, id, &format),
        Commands::List { page, size, format } => cmd_list(&config, page, size, &format),
        Commands::Delete { id } => cmd_delete(&config, id),
        Commands::Search {
            term,
            seed,
            page,
            size,
            format,
        } => cmd_search(&config, &term, seed, page, size, &format),
        Commands::Reindex => cmd_reindex(&config),
        Commands::Status { format } => cmd_status(&config, &format),
        Commands::Serve => cmd_serve(&config),
    }
}

/// Config file first, then environment and flags on top
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(index) = &cli.index {
        config.index = index.clone();
    }

    Ok(config)
}

fn open_service(config: &Config) -> Result<AnimalService<SqliteIndex>> {
    let store = Store::open(&config.database)
        .with_context(|| format!("Failed to open store at {}", config.database.display()))?;
    let index = SqliteIndex::open(&config.index, &config.index_name)
        .with_context(|| format!("Failed to open index at {}", config.index.display()))?;
    Ok(AnimalService::new(store, index, config.index_name.clone()))
}

/// Seed for a search that did not name one
fn clock_seed() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageOutput<'a> {
    animals: &'a [AnimalDto],
    total: u64,
    page: usize,
    size: usize,
    total_pages: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<&'a str>,
}

impl<'a> PageOutput<'a> {
    fn new(page: &'a Page<AnimalDto>, seed: Option<&'a str>) -> Self {
        Self {
            animals: &page.content,
            total: page.total,
            page: page.request.page,
            size: page.request.size,
            total_pages: page.total_pages(),
            seed,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput {
    store_path: String,
    index_path: String,
    index_name: String,
    animals: u64,
    indexed: u64,
    in_sync: bool,
    store_bytes: u64,
    index_bytes: u64,
}

fn format_animal(dto: &AnimalDto) -> String {
    let id = dto.id.map(|id| id.to_string()).unwrap_or_default();
    let name = dto.name.as_deref().unwrap_or("");
    let mut line = format!("{:>6}  {}", id, name);
    if dto.promoted {
        line.push_str("  [promoted]");
    }
    if let Some(score) = dto.score {
        line.push_str(&format!("  (score {})", score));
    }
    line
}

fn print_animal(dto: &AnimalDto, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(dto)?);
    } else {
        println!("{}", format_animal(dto));
    }
    Ok(())
}

/// Format bytes as human-readable size
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}

fn cmd_init(config: &Config) -> Result<()> {
    println!("Initializing Menagerie store at: {}", config.database.display());
    println!("Initializing search index at: {}", config.index.display());
    let _service = open_service(config)?;
    println!("Initialized successfully.");
    Ok(())
}

fn cmd_create(config: &Config, name: &str, promoted: bool, format: &str) -> Result<()> {
    let service = open_service(config)?;
    let created = service.create(&AnimalDto::new(name, promoted))?;
    print_animal(&created, format)
}

fn cmd_update(config: &Config, id: i64, name: &str, promoted: bool, format: &str) -> Result<()> {
    let service = open_service(config)?;
    let updated = service.update(&AnimalDto::new(name, promoted).with_id(id))?;
    print_animal(&updated, format)
}

fn cmd_get(config: &Config, id: i64, format: &str) -> Result<()> {
    let service = open_service(config)?;
    match service.find_one(id)? {
        Some(dto) => print_animal(&dto, format),
        None => anyhow::bail!("Animal not found: {}", id),
    }
}

fn cmd_list(config: &Config, page: usize, size: Option<usize>, format: &str) -> Result<()> {
    let service = open_service(config)?;
    let request = PageRequest::of(page, size.unwrap_or(config.default_page_size));
    let result = service.find_all(&request)?;

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&PageOutput::new(&result, None))?
        );
        return Ok(());
    }

    if result.total == 0 {
        println!("No animals found. Use 'menagerie create' to add one.");
        return Ok(());
    }

    for dto in &result.content {
        println!("{}", format_animal(dto));
    }
    println!(
        "\nPage {} of {} ({} animals)",
        result.request.page.saturating_add(1),
        result.total_pages(),
        result.total
    );
    if !result.is_last() {
        println!("  (next: menagerie list --page {})", result.request.page.saturating_add(1));
    }
    Ok(())
}

fn cmd_delete(config: &Config, id: i64) -> Result<()> {
    let service = open_service(config)?;
    service.delete(id)?;
    println!("Deleted animal {}", id);
    Ok(())
}

fn cmd_search(
    config: &Config,
    term: &str,
    seed: Option<String>,
    page: usize,
    size: Option<usize>,
    format: &str,
) -> Result<()> {
    let service = open_service(config)?;
    let seed = seed.unwrap_or_else(clock_seed);
    let request = PageRequest::of(page, size.unwrap_or(config.default_page_size));
    let result = service.search(term, &seed, &request)?;

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&PageOutput::new(&result, Some(&seed)))?
        );
        return Ok(());
    }

    println!("Seed: {}", seed);
    if result.is_empty() {
        println!("No animals match '{}'", term);
        return Ok(());
    }

    for dto in &result.content {
        println!("{}", format_animal(dto));
    }
    println!(
        "\nPage {} of {} ({} matches)",
        result.request.page.saturating_add(1),
        result.total_pages(),
        result.total
    );
    if !result.is_last() {
        println!(
            "  (next: menagerie search '{}' --seed '{}' --page {})",
            term,
            seed,
            result.request.page.saturating_add(1)
        );
    }
    Ok(())
}

fn cmd_reindex(config: &Config) -> Result<()> {
    let service = open_service(config)?;
    let stats = service.reindex_all()?;

    println!("Reindex complete:");
    println!("  Indexed: {}", stats.indexed);
    if stats.errors > 0 {
        println!("  Errors: {}", stats.errors);
    }
    println!("  Duration: {:.2}s", stats.duration.as_secs_f64());
    Ok(())
}

fn cmd_status(config: &Config, format: &str) -> Result<()> {
    if !config.database.exists() {
        println!("Store not initialized. Run 'menagerie init' first.");
        return Ok(());
    }

    let service = open_service(config)?;
    let animals = service.store().count()?;
    let indexed = service
        .index()
        .count(Some(menagerie::model::ANIMAL_DOC_TYPE))?;

    let status = StatusOutput {
        store_path: config.database.display().to_string(),
        index_path: config.index.display().to_string(),
        index_name: config.index_name.clone(),
        animals,
        indexed,
        in_sync: animals == indexed,
        store_bytes: service.store().database_size()?,
        index_bytes: service.index().database_size()?,
    };

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Menagerie Status");
    println!("================");
    println!(
        "Store: {} ({})",
        status.store_path,
        format_bytes(status.store_bytes)
    );
    println!(
        "Index: {} '{}' ({})",
        status.index_path,
        status.index_name,
        format_bytes(status.index_bytes)
    );
    println!("Animals: {}", status.animals);
    println!("Indexed: {}/{}", status.indexed, status.animals);
    if !status.in_sync {
        println!("  (run 'menagerie reindex' to repair the index)");
    }
    Ok(())
}

fn cmd_serve(config: &Config) -> Result<()> {
    let server = McpServer::new(config)?;
    Ok(server.run()?)
}
