//! Editor Directory - API server and administrative commands.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use editor_directory::cleanup::CleanupEngine;
use editor_directory::config::{AppConfig, ConfigError, ConfigLoader};
use editor_directory::directory::{DirectoryError, Importer};
use editor_directory::display;
use editor_directory::store::{open_store, SharedStore, StoreError};
use editor_directory::sync::{SyncError, SyncOrchestrator, SyncTarget};
use editor_directory::web::{ApiServer, AppState, ServerError};

#[derive(Parser)]
#[command(
    name = "editor-directory",
    about = "Searchable directory of television editors",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve {
        /// Host address to bind to.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import editors, credits, and awards from JSON files.
    Import {
        /// Files holding an array of editor bundles.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Pull editors from a provider feed (tmdb, imdb, emmy, all).
    Sync {
        source: String,
        /// Maximum editors to fetch per source.
        #[arg(long)]
        max_items: Option<usize>,
    },
    /// Delete mock editor records and their credits and awards.
    Cleanup {
        /// Report matches without deleting anything.
        #[arg(long)]
        dry_run: bool,
        /// Delete operations per batch commit.
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("Invalid cleanup rules: {0}")]
    Rules(#[from] regex::Error),
    #[error("{0} of {1} import file(s) failed")]
    ImportFailed(usize, usize),
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

fn load_config(path: Option<PathBuf>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) if !path.exists() => Err(ConfigError::Validation(format!(
            "config file {} does not exist",
            path.display()
        ))),
        Some(path) => ConfigLoader::with_path(path).load(),
        None => ConfigLoader::new().load(),
    }
}

/// Open the store for a one-shot command, which must be persistent.
async fn open_admin_store(config: &AppConfig) -> Result<SharedStore, CliError> {
    let path = config.require_persistent_store()?;
    tracing::info!(path = %path.display(), "Opening document store");
    Ok(open_store(&config.store).await?)
}

async fn serve(config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<(), CliError> {
    let store = open_store(&config.store).await?;
    let state = AppState::new(store, &config)?;

    let mut server_config = config.server.clone();
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    let server = ApiServer::new(state).with_config(server_config);
    let cancel = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl-C");
        }
        cancel.cancel();
    });

    server.run().await?;
    Ok(())
}

async fn import(config: AppConfig, files: Vec<PathBuf>) -> Result<(), CliError> {
    let store = open_admin_store(&config).await?;
    let importer = Importer::new(store);

    let mut failed = 0;
    for file in &files {
        match importer.import_file(file).await {
            Ok(stats) => display::print_import_stats(&file.display().to_string(), &stats),
            Err(e) => {
                failed += 1;
                tracing::error!(file = %file.display(), error = %e, "Import failed");
                display::print_error(&e.to_string());
            }
        }
    }

    if failed > 0 {
        return Err(CliError::ImportFailed(failed, files.len()));
    }
    Ok(())
}

async fn sync(config: AppConfig, source: String, max_items: Option<usize>) -> Result<(), CliError> {
    SyncTarget::parse(&source)?;
    let store = open_admin_store(&config).await?;
    let orchestrator = SyncOrchestrator::from_config(&config.sync, &Importer::new(store))?;

    let result = orchestrator.run(&source, max_items).await?;
    display::print_sync_result(&source, &result);
    Ok(())
}

async fn cleanup(config: AppConfig, dry_run: bool, batch_size: Option<usize>) -> Result<(), CliError> {
    let store = open_admin_store(&config).await?;
    let mut engine = CleanupEngine::from_config(store, &config.cleanup)?;
    if let Some(batch_size) = batch_size {
        engine = engine.with_batch_size(batch_size);
    }

    let report = engine.run(dry_run).await?;
    display::print_cleanup_report(&report);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match load_config(cli.config) {
        Ok(config) => match cli.command {
            Commands::Serve { host, port } => serve(config, host, port).await,
            Commands::Import { files } => import(config, files).await,
            Commands::Sync { source, max_items } => sync(config, source, max_items).await,
            Commands::Cleanup {
                dry_run,
                batch_size,
            } => cleanup(config, dry_run, batch_size).await,
        },
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
