//! CLI administration tool for jumplink.
//!
//! Shortens, resolves, and lists links directly against the database, without
//! going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List links, newest first
//! cargo run --bin admin -- urls list --search example --page 1 --page-size 20
//!
//! # Shorten a URL (prompts when the URL is omitted)
//! cargo run --bin admin -- urls shorten https://example.com/page?x=1
//!
//! # Show where a short code points
//! cargo run --bin admin -- urls resolve 0a9f3c
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! Same as the server: `DATABASE_URL` (or `DB_*` components), `BASE_URL`,
//! `CODE_LENGTH`, `MAX_CODE_ATTEMPTS`. `STORAGE_BACKEND` must be `postgres`.

use jumplink::application::services::ShortenerService;
use jumplink::config::{Config, StorageBackend};
use jumplink::domain::repositories::UrlMappingFilter;
use jumplink::server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Input;

/// CLI tool for managing jumplink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage short links
    Urls {
        #[command(subcommand)]
        action: UrlsAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Short link subcommands.
#[derive(Subcommand)]
enum UrlsAction {
    /// List short links, newest first
    List {
        /// Case-insensitive match on the original URL or the short code
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },

    /// Shorten a URL, reusing the existing code for an equivalent URL
    Shorten {
        /// URL to shorten (prompted for when omitted)
        url: Option<String>,
    },

    /// Print the original URL behind a short code
    Resolve { code: String },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::from_env().context("Failed to load configuration")?;
    if config.storage_backend != StorageBackend::Postgres {
        anyhow::bail!("admin commands require STORAGE_BACKEND=postgres");
    }

    match cli.command {
        Commands::Urls { action } => handle_urls_action(action, &config).await?,
        Commands::Db { action } => handle_db_action(action, &config).await?,
    }

    Ok(())
}

/// Dispatches link management commands.
async fn handle_urls_action(action: UrlsAction, config: &Config) -> Result<()> {
    let repository = server::build_repository(config).await?;
    let shortener = server::build_shortener(config, repository);

    match action {
        UrlsAction::List {
            search,
            page,
            page_size,
        } => list_urls(&shortener, search, page, page_size).await,
        UrlsAction::Shorten { url } => shorten_url(&shortener, url).await,
        UrlsAction::Resolve { code } => resolve_code(&shortener, &code).await,
    }
}

/// Prints one page of short links as a table.
///
/// # Output Format
///
/// ```text
/// 📋 Short Links
///
///   ID    Original URL                                  Short Code   Created At
///   ───────────────────────────────────────────────────────────────────────────────
///   2     https://example.com/page?x=1                  0a9f3c       2026-01-15 10:30:00
/// ```
async fn list_urls(
    shortener: &ShortenerService,
    search: Option<String>,
    page: u32,
    page_size: u32,
) -> Result<()> {
    if page == 0 || page_size == 0 {
        anyhow::bail!("--page and --page-size must be greater than 0");
    }

    println!("{}", "📋 Short Links".bright_blue().bold());
    println!();

    let offset = (i64::from(page) - 1) * i64::from(page_size);
    let filter = UrlMappingFilter::new(offset, i64::from(page_size)).with_search(search);
    let listing = shortener.list(filter).await?;

    if listing.items.is_empty() {
        println!("{}", "  No shortened URLs found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<45} {:<12} {}",
        "ID".bright_white().bold(),
        "Original URL".bright_white().bold(),
        "Short Code".bright_white().bold(),
        "Created At".bright_white().bold()
    );
    println!("  {}", "─".repeat(85).bright_black());

    for mapping in &listing.items {
        println!(
            "  {:<5} {:<45} {:<12} {}",
            mapping.id.to_string().bright_black(),
            truncate(&mapping.original_url, 45),
            mapping.short_code.cyan(),
            mapping
                .created_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .bright_black()
        );
    }

    println!();
    println!(
        "  Page {} · showing {} of {}",
        page,
        listing.items.len().to_string().bright_white().bold(),
        listing.total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn shorten_url(shortener: &ShortenerService, url: Option<String>) -> Result<()> {
    let url = match url {
        Some(u) => u,
        None => Input::<String>::new()
            .with_prompt("URL to shorten")
            .interact_text()?,
    };

    let shortened = shortener.shorten(&url).await?;

    println!();
    if shortened.created {
        println!("{}", "✅ Short link created".green().bold());
    } else {
        println!("{}", "ℹ️  URL was already shortened".yellow().bold());
    }
    println!("  Code:      {}", shortened.mapping.short_code.cyan());
    println!("  Short URL: {}", shortened.short_reference.bright_yellow());
    println!("  Target:    {}", shortened.mapping.original_url);
    println!();

    Ok(())
}

async fn resolve_code(shortener: &ShortenerService, code: &str) -> Result<()> {
    let mapping = shortener.get_by_code(code).await?;

    println!("  Code:       {}", mapping.short_code.cyan());
    println!("  Target:     {}", mapping.original_url.bright_white());
    println!(
        "  Created At: {}",
        mapping.created_at.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    let pool = server::connect_database(config).await?;

    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(&pool)
                .await?;

            // Fails when migrations have not run yet.
            let mappings: Option<i64> = sqlx::query_scalar("SELECT COUNT(*) FROM url_mappings")
                .fetch_one(&pool)
                .await
                .ok();

            println!("  PostgreSQL:  {}", version.bright_white());
            match mappings {
                Some(count) => println!(
                    "  Short links: {}",
                    count.to_string().bright_green().bold()
                ),
                None => println!("  Short links: {}", "schema not migrated".yellow()),
            }
            println!();
        }
    }

    Ok(())
}

/// Shortens `s` to at most `max` characters for table display.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
