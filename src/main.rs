//! # Post Harness CLI (`posts`)
//!
//! Every tool is also a subcommand, so the store can be filled and
//! inspected without an MCP client.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `posts fetch <username>` | Fetch posts and overwrite the store |
//! | `posts list` | Paginate saved posts |
//! | `posts search <keyword>` | Keyword search in post text |
//! | `posts top` | Top posts by engagement metric |
//! | `posts by-date <start> <end>` | Posts within a date range |
//! | `posts tools` | List the registered tools |
//! | `posts serve stdio` | MCP over stdin/stdout |
//! | `posts serve http` | HTTP API and MCP Streamable HTTP |
//!
//! ## MCP client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "linkedin-posts": {
//!       "command": "posts",
//!       "args": ["--config", "/path/to/posts.toml", "serve", "stdio"],
//!       "env": { "RAPIDAPI_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use post_harness::config::{self, Credentials};
use post_harness::ingest::fetch_and_save_posts;
use post_harness::query;
use post_harness::server;
use post_harness::tools::{ToolContext, ToolRegistry};

/// Fetch a profile's LinkedIn posts into a local store and query them.
#[derive(Parser)]
#[command(
    name = "posts",
    about = "Fetch a profile's LinkedIn posts into a local store and query them as MCP tools",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/posts.toml`; built-in defaults are used when
    /// that file does not exist.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error). Logs go to stderr.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch posts for a profile and overwrite the store.
    Fetch {
        /// Profile handle.
        username: String,
    },

    /// Show saved posts, at most 5 at a time.
    List {
        /// Index of the first post.
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Number of posts (capped at 5).
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Search saved posts by keyword (case-insensitive, post text only).
    Search { keyword: String },

    /// Show the top posts by an engagement metric.
    Top {
        /// `Like Count` or `Total Reactions`.
        #[arg(long, default_value = "Like Count")]
        metric: String,

        #[arg(long, default_value_t = 5, allow_negative_numbers = true)]
        top_n: i64,
    },

    /// Show posts posted between two dates (YYYY-MM-DD, inclusive).
    ByDate { start_date: String, end_date: String },

    /// List the registered tools and their parameter schemas.
    Tools,

    /// Serve the tools to an MCP client.
    Serve {
        #[command(subcommand)]
        transport: Transport,
    },
}

#[derive(Subcommand)]
enum Transport {
    /// MCP over stdin/stdout.
    Stdio,
    /// HTTP API and MCP Streamable HTTP on `[server].bind`.
    Http,
}

fn setup_logging(level: Option<&str>) {
    let level = match level.map(|s| s.to_uppercase()) {
        Some(s) if s == "TRACE" => tracing::Level::TRACE,
        Some(s) if s == "DEBUG" => tracing::Level::DEBUG,
        Some(s) if s == "WARN" => tracing::Level::WARN,
        Some(s) if s == "ERROR" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level.as_deref());

    let (config_path, explicit) = match &cli.config {
        Some(p) => (p.clone(), true),
        None => (PathBuf::from(config::DEFAULT_CONFIG_PATH), false),
    };
    let cfg = Arc::new(config::load_or_minimal(&config_path, explicit)?);
    let credentials = Credentials::from_env(&cfg);
    let ctx = ToolContext::from_config(cfg.clone(), credentials);
    let tools = Arc::new(ToolRegistry::with_builtins());

    match cli.command {
        Commands::Fetch { username } => {
            let message = fetch_and_save_posts(&cfg, ctx.credentials(), ctx.store(), &username)
                .await
                .with_context(|| format!("fetch for '{}' failed", username))?;
            println!("{}", message);
        }
        Commands::List { start, limit } => {
            print_json(&query::get_saved_posts(ctx.store(), start, limit))?;
        }
        Commands::Search { keyword } => {
            print_json(&query::search_posts(ctx.store(), &keyword))?;
        }
        Commands::Top { metric, top_n } => {
            print_json(&query::get_top_posts(ctx.store(), &metric, top_n))?;
        }
        Commands::ByDate {
            start_date,
            end_date,
        } => {
            print_json(&query::get_posts_by_date(
                ctx.store(),
                &start_date,
                &end_date,
            ))?;
        }
        Commands::Tools => {
            for t in tools.tools() {
                let access = if t.read_only() { "read" } else { "write" };
                println!("{:<22} {:<6} {}", t.name(), access, t.description());
            }
        }
        Commands::Serve { transport } => match transport {
            Transport::Stdio => server::run_stdio(ctx, tools).await?,
            Transport::Http => server::run_http(ctx, tools).await?,
        },
    }

    Ok(())
}
