//! sqlpipe - run SQL statement chains across one or more databases.
//!
//! The binary is the composition root: it loads the configuration file,
//! registers the shipped drivers, executes one named task, and collapses
//! the typed result into a process exit code. Success is silent (exit 0);
//! any failure exits non-zero with a diagnostic naming the failing
//! statement and connection(s).

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sqlpipe_core::application::{
    cancel_channel, exit_code, render_failure, ChainRunner, DriverCatalog, EngineOptions,
};
use sqlpipe_core::config::RunConfig;
use sqlpipe_infra_sqlite::SqliteDriver;

#[derive(Parser)]
#[command(name = "sqlpipe")]
#[command(about = "SQL statement-chain runner", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute one task from a configuration file
    Run {
        /// Path to the configuration file (TOML/YAML/JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Name of the task to execute
        task: String,

        /// Rows per transfer batch
        #[arg(long, env = "SQLPIPE_BATCH_SIZE")]
        batch_size: Option<usize>,
    },

    /// Validate a configuration file without executing anything
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn init_logging() {
    let log_format = std::env::var("SQLPIPE_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("sqlpipe=info"))
        .expect("Failed to create env filter");

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}

fn driver_catalog() -> DriverCatalog {
    let mut catalog = DriverCatalog::new();
    catalog.register(Arc::new(SqliteDriver));
    catalog
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            task,
            batch_size,
        } => run_task(&config, &task, batch_size).await,
        Commands::Check { config } => check_config(&config),
    }
}

async fn run_task(config_path: &Path, task: &str, batch_size: Option<usize>) -> ExitCode {
    let config = match RunConfig::load(config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", format!("✗ {}", err).red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut options = EngineOptions::default();
    if let Some(size) = batch_size {
        options.batch_size = size;
    }
    let runner = ChainRunner::with_options(driver_catalog(), options);

    // Ctrl-C stops issuing new statements once the in-flight one finishes;
    // teardown still closes every connection.
    let (cancel_sender, cancel_token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_sender.cancel();
        }
    });

    let result = runner
        .execute_with_cancel(&config, task, Some(cancel_token))
        .await;

    if let Some(diagnostic) = render_failure(task, &result) {
        eprintln!("{}", format!("✗ {}", diagnostic).red().bold());
    } else {
        info!(task, "Task completed");
    }

    ExitCode::from(exit_code(&result) as u8)
}

fn check_config(config_path: &Path) -> ExitCode {
    match RunConfig::load(config_path) {
        Ok(config) => {
            println!(
                "{}",
                format!(
                    "✓ {} connection(s), {} task(s)",
                    config.connections.len(),
                    config.tasks.len()
                )
                .green()
                .bold()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{}", format!("✗ {}", err).red().bold());
            ExitCode::FAILURE
        }
    }
}
