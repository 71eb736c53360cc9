//! ldap-rdbm CLI - directory operations over a MySQL/PostgreSQL schema.

mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use ldap_rdbm::coerce::TypeCoercer;
use ldap_rdbm::{
    import_ldif_files, ApplyOptions, Config, Directory, EntityRow, Fetch, QueryOutcome,
    RdbmError, SchemaCatalog, SearchScope,
};
use serde_json::json;
use tracing::info;

#[derive(Parser)]
#[command(name = "ldap-rdbm")]
#[command(about = "LDAP-style directory operations over a relational database")]
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

    /// Also write every DEBUG-and-above event to this file
    #[arg(long)]
    diagnostic_log: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Test the database connection
    HealthCheck,

    /// List discovered tables
    Reflect,

    /// Show the syntax and column type of an attribute (offline)
    AttrType {
        /// Attribute name
        attribute: String,
    },

    /// Convert directory values into a column value (offline)
    Coerce {
        /// Attribute name
        attribute: String,

        /// Directory values
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Run a filter search
    Search {
        /// Search base DN
        #[arg(long, default_value = "o=jans")]
        base: String,

        /// Filter: (attr=value) or (&(attr=value)(attr=value))
        #[arg(long)]
        filter: String,

        /// Scope: base, one or sub
        #[arg(long, default_value = "sub")]
        scope: String,

        /// Return every match instead of the first one
        #[arg(long)]
        all: bool,
    },

    /// Look up the entry stored under a DN
    DnExists {
        /// Distinguished name
        dn: String,
    },

    /// Apply LDIF files in order
    Import {
        /// LDIF files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Re-discover tables before importing
        #[arg(long)]
        force_reflect: bool,
    },

    /// Run a backend-native statement
    Exec {
        /// SQL statement
        statement: String,

        /// Rows to return: none, one or all
        #[arg(long, default_value = "none")]
        fetch: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), RdbmError> {
    let cli = Cli::parse();

    logging::setup_logging(
        &cli.verbosity,
        &cli.log_format,
        cli.diagnostic_log.as_deref(),
    )
    .map_err(RdbmError::Config)?;

    let config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match cli.command {
        Commands::AttrType { attribute } => {
            let catalog = SchemaCatalog::from_config(&config.schema)?;
            let backend = config.rdbm.r#type;
            let syntax = catalog.syntax_of(&attribute);
            let column_type = catalog.relational_type(&attribute, backend)?;

            if cli.output_json {
                let result = json!({
                    "attribute": attribute,
                    "syntax": syntax,
                    "backend": backend.as_str(),
                    "type": column_type,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", attribute);
                println!("  Syntax: {}", syntax);
                println!("  Type ({}): {}", backend, column_type);
            }
        }

        Commands::Coerce { attribute, values } => {
            let catalog = SchemaCatalog::from_config(&config.schema)?;
            let coercer = TypeCoercer::new(&catalog, config.rdbm.r#type);
            let value = coercer.coerce(&attribute, values.as_slice())?;
            println!("{}", serde_json::to_string(&value.to_json())?);
        }

        Commands::HealthCheck => {
            let start = Instant::now();
            let mut dir = Directory::open(&config).await?;
            dir.ping().await?;
            let latency_ms = start.elapsed().as_millis() as u64;

            if cli.output_json {
                let result = json!({
                    "healthy": true,
                    "backend": dir.backend().as_str(),
                    "latency_ms": latency_ms,
                });
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("Health Check Results:");
                println!("  Database ({}): OK ({}ms)", dir.backend(), latency_ms);
            }
        }

        Commands::Reflect => {
            let mut dir = Directory::open(&config).await?;
            let tables = dir.tables().await?;

            if cli.output_json {
                let result: Vec<_> = tables
                    .values()
                    .map(|t| json!({"table": t.name, "columns": t.columns.len()}))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{} tables:", tables.len());
                for table in tables.values() {
                    println!("  {} ({} columns)", table.name, table.columns.len());
                }
            }
        }

        Commands::Search {
            base,
            filter,
            scope,
            all,
        } => {
            let scope = SearchScope::parse(&scope)
                .ok_or_else(|| RdbmError::Config(format!("invalid scope '{}'", scope)))?;
            let mut dir = Directory::open(&config).await?;
            let outcome = dir.search(&base, &filter, scope, all).await;
            print_outcome(outcome, "search")?;
        }

        Commands::DnExists { dn } => {
            let mut dir = Directory::open(&config).await?;
            let row = dir
                .dn_exists(&dn)
                .await
                .ok_or_else(|| RdbmError::EntryNotFound(dn.clone()))?;
            print_rows(std::slice::from_ref(&row))?;
        }

        Commands::Import {
            files,
            force_reflect,
        } => {
            let mut dir = Directory::open(&config).await?;
            let report =
                import_ldif_files(&mut dir, &files, ApplyOptions { force_reflect }).await?;

            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Import completed!");
                println!("  Files: {}", files.len());
                println!("  Created: {}", report.created);
                println!("  Updated: {}", report.updated);
                println!("  Unchanged: {}", report.unchanged);
                println!("  Skipped: {}", report.skipped);
            }
        }

        Commands::Exec { statement, fetch } => {
            let fetch = match fetch.to_lowercase().as_str() {
                "none" => Fetch::None,
                "one" => Fetch::One,
                "all" => Fetch::All,
                other => return Err(RdbmError::Config(format!("invalid fetch mode '{}'", other))),
            };
            let mut dir = Directory::open(&config).await?;
            let outcome = dir.exec_raw(&statement, fetch).await;
            print_outcome(outcome, "exec")?;
        }
    }

    Ok(())
}

/// Print the rows of a query, or turn a failed query into an error.
fn print_outcome(outcome: QueryOutcome, context: &str) -> Result<(), RdbmError> {
    match outcome {
        QueryOutcome::Rows(rows) => print_rows(&rows),
        QueryOutcome::Failed(message) => Err(RdbmError::query(message, context)),
    }
}

/// One JSON object per line.
fn print_rows(rows: &[EntityRow]) -> Result<(), RdbmError> {
    for row in rows {
        println!("{}", serde_json::to_string(&row.to_json())?);
    }
    Ok(())
}
