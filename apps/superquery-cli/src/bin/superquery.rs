use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use superquery_compiler::Intent;
use superquery_core::config::{Config, Settings};
use superquery_core::request::{ExploreRequest, QueryRequest, Response, DEFAULT_QUERY_LIMIT, DEFAULT_SAMPLE_SIZE};
use superquery_core::types::CredentialStatus;
use superquery_engine::{format_table, statistics, validate_binary};
use superquery_service::{MemoryObjectStore, QueryService};

#[derive(Parser)]
#[command(name = "superquery", version, about = "Ask business questions of S3 data through the super engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a question and run it.
    Query {
        /// Natural-language question, e.g. "top 5 customers by revenue".
        question: String,
        /// Source locator (s3://bucket/path/*).
        #[arg(long)]
        path: String,
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
        /// Print a fixed-width table instead of JSON.
        #[arg(long)]
        table: bool,
    },
    /// Sample a locator and report its schema and completeness.
    Explore {
        path: String,
        #[arg(long, default_value_t = DEFAULT_SAMPLE_SIZE)]
        sample_size: usize,
    },
    /// Show the recognized intent and compiled query without running it.
    Compile {
        question: String,
        #[arg(long)]
        path: String,
        #[arg(long, default_value_t = DEFAULT_QUERY_LIMIT)]
        limit: usize,
    },
    /// Self-test the engine binary, optionally probing a locator.
    Check {
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Serialize)]
struct CompileOutput {
    intent: Option<Intent>,
    query: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "Error loading config");
        e
    })?;
    Ok(config.settings()?)
}

/// No object-store client is wired into the CLI; locators are checked by the
/// engine alone.
fn store() -> MemoryObjectStore {
    MemoryObjectStore::new().with_credentials(CredentialStatus {
        configured: false,
        account_id: None,
        user_arn: None,
        error: Some("no object store client configured".to_string()),
    })
}

fn service(settings: &Settings) -> anyhow::Result<QueryService<MemoryObjectStore>> {
    validate_binary(&settings.super_binary_path)?;
    tracing::info!(path = %settings.super_binary_path.display(), "Super binary validated");
    Ok(QueryService::new(settings, store()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the envelope; error envelopes exit non-zero.
fn emit<T: Serialize, C: Serialize>(response: &Response<T, C>) -> anyhow::Result<()> {
    print_json(response)?;
    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Query { question, path, limit, table } => {
            let settings = load_settings()?;
            let service = service(&settings)?;
            let response = service.query(&QueryRequest { request: question, s3_path: path, limit }).await;
            match (&response, table) {
                (Response::Success(payload), true) => {
                    let result = superquery_core::types::ResultSet {
                        records: payload.results.clone(),
                        truncated: payload.truncated,
                        skipped_lines: 0,
                    };
                    let stats = statistics(&result);
                    println!("{}", payload.query);
                    println!();
                    println!("{}", format_table(&result));
                    println!();
                    println!(
                        "{} records, {} fields{}",
                        stats.total_records,
                        stats.field_count,
                        if stats.truncated { " (truncated)" } else { "" }
                    );
                }
                _ => emit(&response)?,
            }
        }
        Commands::Explore { path, sample_size } => {
            let settings = load_settings()?;
            let service = service(&settings)?;
            emit(&service.explore(&ExploreRequest { s3_path: path, sample_size }).await)?;
        }
        Commands::Compile { question, path, limit } => {
            let output = CompileOutput {
                intent: superquery_compiler::classify(&question),
                query: superquery_compiler::compile(&question, &path, limit),
            };
            print_json(&output)?;
        }
        Commands::Check { path } => {
            let settings = load_settings()?;
            // No preflight here: an unusable binary is part of the report.
            let report = QueryService::new(&settings, store()).health(path.as_deref()).await;
            print_json(&report)?;
            if !report.healthy {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
