//! mongo-mysql-migrate CLI - migrate a MongoDB BSON backup into MySQL.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use mongo_mysql_migrate::{
    BsonDirSource, Config, MemoryTarget, MigrateError, MigrationReport, MysqlTarget, Orchestrator,
    TargetStore,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "mongo-mysql-migrate")]
#[command(about = "Migrate a MongoDB BSON backup into MySQL")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the destination and migrate every kind
    Run {
        /// Override the backup directory
        #[arg(long)]
        backup_path: Option<PathBuf>,

        /// Dry run: migrate into an in-memory destination
        #[arg(long)]
        dry_run: bool,
    },

    /// Count the documents of every batch in the backup
    Inspect {
        /// Override the backup directory
        #[arg(long)]
        backup_path: Option<PathBuf>,
    },

    /// Test the database connection
    HealthCheck,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), MigrateError> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format)
        .map_err(|e| MigrateError::Config(e.to_string()))?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::Run {
            backup_path,
            dry_run,
        } => {
            if let Some(path) = backup_path {
                config.source.backup_path = path;
            }

            let orchestrator = if dry_run {
                info!("Dry run: writing to an in-memory destination");
                let source = BsonDirSource::open(&config.source.backup_path)?;
                Orchestrator::with_parts(
                    config,
                    Arc::new(source),
                    Arc::new(MemoryTarget::with_destination_schema()),
                )
            } else {
                Orchestrator::new(config).await?
            };

            let result = orchestrator.run().await;
            orchestrator.close().await;
            let report = result?;

            if cli.output_json {
                println!("{}", report.to_json()?);
            } else {
                print_summary(&report, dry_run);
            }
        }

        Commands::Inspect { backup_path } => {
            if let Some(path) = backup_path {
                config.source.backup_path = path;
            }
            let source = BsonDirSource::open(&config.source.backup_path)?;
            let batches = mongo_mysql_migrate::inspect(&source, &config.source).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&batches)?);
            } else {
                println!("Backup: {}", config.source.backup_path.display());
                for batch in &batches {
                    match batch.documents {
                        Some(n) => println!("  {} ({}.bson): {}", batch.kind, batch.batch, n),
                        None => println!("  {} ({}.bson): not found", batch.kind, batch.batch),
                    }
                }
            }
        }

        Commands::HealthCheck => {
            let target = MysqlTarget::connect(&config.target)?;
            let result = mongo_mysql_migrate::health_check(&target).await;
            target.close().await;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!(
                    "  Target ({}): {} ({}ms)",
                    target.db_type(),
                    if result.target_connected { "OK" } else { "FAILED" },
                    result.target_latency_ms
                );
                if let Some(ref err) = result.target_error {
                    println!("    Error: {}", err);
                }
            }
            result.into_result()?;
        }
    }

    Ok(())
}

fn print_summary(report: &MigrationReport, dry_run: bool) {
    let status_msg = if dry_run {
        "Dry run completed!"
    } else {
        "Migration completed!"
    };
    println!("\n{}", status_msg);
    println!("  Run ID: {}", report.run_id);
    println!("  Duration: {:.2}s", report.duration_seconds);

    let failures = report.failures();
    if failures > 0 {
        println!("  Failed documents: {}", failures);
    }

    println!();
    for line in report.summary_lines() {
        println!("{}", line);
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
