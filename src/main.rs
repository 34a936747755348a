//! Snippet-Harvest main entry point
//!
//! This is the command-line interface for the documentation/code pair harvester.

use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use snippet_harvest::config::{
    credential_fingerprint, parse_config, validate, validate_credentials, Config,
};
use snippet_harvest::crawler::{
    restart_process, Coordinator, CredentialQueue, RestartSettings, RunOutcome, CREDENTIALS_ENV,
};
use snippet_harvest::output::{load_statistics, print_statistics};
use snippet_harvest::state::{Ledger, SharedState};
use snippet_harvest::storage::open_storage;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Snippet-Harvest: documentation/code pair harvester
///
/// Searches a code-hosting platform for repositories, walks their source
/// trees, and stores every documented function and class as training
/// pairs in SQLite. Progress survives restarts; when a credential's quota
/// runs out the process restarts itself on the next one.
#[derive(Parser, Debug)]
#[command(name = "snippet-harvest")]
#[command(version)]
#[command(about = "Harvest documented code snippets from public repositories", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Repository search filter, passed verbatim to the search endpoint
    #[arg(long)]
    query: Option<String>,

    /// API credential; repeat for rotation order
    #[arg(
        long = "token",
        value_name = "TOKEN",
        env = CREDENTIALS_ENV,
        value_delimiter = ',',
        hide_env_values = true
    )]
    tokens: Vec<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// SQLite database file
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Visited-repository ledger file
    #[arg(long, value_name = "PATH")]
    ledger: Option<String>,

    /// Column width documentation is wrapped to
    #[arg(long)]
    wrap_width: Option<usize>,

    /// Also append log lines to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show what would be harvested
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and ledger, then exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Credentials spent by earlier generations of this run
    #[arg(long, default_value_t = 0, hide = true)]
    spent_credentials: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match effective_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            setup_logging(cli.verbose, cli.quiet, None)?;
            tracing::error!("Invalid configuration: {}", e);
            return Err(e);
        }
    };

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;

    if cli.stats {
        handle_stats(&config)?;
    } else if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_harvest(&cli, config).await?;
    }

    Ok(())
}

/// Layers command-line flags over the configuration file and validates the result
fn effective_config(cli: &Cli) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => parse_config(&std::fs::read_to_string(path)?)?,
        None => Config::default(),
    };

    if let Some(query) = &cli.query {
        config.search.query = query.clone();
    }
    if !cli.tokens.is_empty() {
        config.github.tokens = cli.tokens.clone();
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(database) = &cli.database {
        config.output.database_path = database.clone();
    }
    if let Some(ledger) = &cli.ledger {
        config.output.ledger_path = ledger.clone();
    }
    if let Some(width) = cli.wrap_width {
        config.extract.wrap_width = width;
    }
    if let Some(log_file) = &cli.log_file {
        config.output.log_path = Some(log_file.clone());
    }

    validate(&config)?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// When `log_path` is set, a second ANSI-free layer appends to that file.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("snippet_harvest=info,warn"),
            1 => EnvFilter::new("snippet_harvest=debug,info"),
            2 => EnvFilter::new("snippet_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .try_init()?;

    Ok(())
}

/// Handles the --dry-run mode: validates config and shows what would be harvested
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    validate_credentials(&config.github.tokens)?;

    println!("=== Snippet-Harvest Dry Run ===\n");

    println!("Search:");
    println!("  Query: {}", config.search.query);
    println!("  Results per page: {}", config.search.per_page);

    println!("\nAPI:");
    println!("  Base URL: {}", config.github.api_url);
    println!("  User agent: {}", config.github.user_agent);
    println!("  Timeout: {}s", config.github.timeout_secs);

    println!("\nCredentials ({}):", config.github.tokens.len());
    for (i, token) in config.github.tokens.iter().enumerate() {
        println!("  {}. {}", i + 1, credential_fingerprint(token));
    }

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Poll interval: {}ms", config.crawler.poll_interval_ms);
    println!("  Shutdown grace: {}ms", config.crawler.shutdown_grace_ms);
    println!("  Wrap width: {}", config.extract.wrap_width);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Ledger: {}", config.output.ledger_path);
    if let Some(log_path) = &config.output.log_path {
        println!("  Log file: {}", log_path);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database and ledger
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}", config.output.database_path);
    println!("Ledger: {}\n", config.output.ledger_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let ledger = Ledger::load(&config.output.ledger_path)?;

    let stats = load_statistics(&storage, &ledger)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the harvest: runs one generation and restarts on rotation
async fn handle_harvest(cli: &Cli, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    validate_credentials(&config.github.tokens)?;
    let credentials = CredentialQueue::new(config.github.tokens.clone(), cli.spent_credentials)?;

    let ledger = Ledger::load(&config.output.ledger_path)?;
    let store = open_storage(Path::new(&config.output.database_path))?;
    tracing::info!(
        "Loaded ledger with {} visited repositories, database at {}",
        ledger.len(),
        config.output.database_path
    );

    let shared = Arc::new(SharedState::new(ledger, store));
    let settings = restart_settings(cli, &config);

    let outcome = Coordinator::new(config, Arc::clone(&shared), credentials)
        .run()
        .await?;

    tracing::info!(
        "{} repositories visited, {} snippets stored",
        shared.visited_count()?,
        shared.snippet_count()?
    );

    match outcome {
        RunOutcome::Completed => {
            tracing::info!("Harvest completed");
        }
        RunOutcome::Interrupted => {
            tracing::info!("Harvest interrupted; progress is saved");
        }
        RunOutcome::CredentialsExhausted => {
            tracing::info!("All credentials spent; rerun with fresh credentials to continue");
        }
        RunOutcome::Rotate(next) => {
            drop(shared);
            let program = std::env::current_exe()?;
            let args = settings.to_args(&next);
            tracing::info!("Restarting on credential {}", next.label());

            let code = restart_process(&program, &args, &next)?;
            std::process::exit(code);
        }
    }

    Ok(())
}

fn restart_settings(cli: &Cli, config: &Config) -> RestartSettings {
    RestartSettings {
        config_path: cli.config.clone(),
        query: config.search.query.clone(),
        workers: config.crawler.workers,
        database_path: config.output.database_path.clone(),
        ledger_path: config.output.ledger_path.clone(),
        wrap_width: config.extract.wrap_width,
        log_file: config.output.log_path.clone(),
        verbose: cli.verbose,
        quiet: cli.quiet,
    }
}
