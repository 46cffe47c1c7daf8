//! crudql command-line tool
//!
//! Validates CRUD queries against a JSON schema and compiles them into
//! document-store filters or parameterised SQL, without touching a database.

mod commands;
mod config;
mod formatter;

use clap::{Parser, Subcommand};
use commands::{BackendKind, CompileTarget, Outcome};
use config::ConfigArgs;
use crudql_core::{CrudOperation, Dialect, QueryConfig};
use formatter::OutputFormat;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// crudql command-line tool
#[derive(Parser, Debug)]
#[command(name = "crudql")]
#[command(version, about = "Validate and compile CRUD queries against a schema")]
pub struct Args {
    /// Output format
    #[arg(long, global = true, default_value = "json", value_enum)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Schema, entity and query shared by `validate` and `compile`.
#[derive(clap::Args, Debug)]
pub struct QueryTarget {
    /// Schema file (JSON)
    #[arg(short, long)]
    pub schema: PathBuf,

    /// Entity the query runs against
    #[arg(short, long)]
    pub entity: String,

    /// Query file, or an inline JSON object
    #[arg(short, long)]
    pub query: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a query
    Validate(QueryTarget),

    /// Validate a query and compile it for a backend
    Compile {
        #[command(flatten)]
        target: QueryTarget,

        /// Backend to compile for
        #[arg(long, default_value = "document", value_enum)]
        backend: BackendKind,

        /// SQL dialect (relational backend only)
        #[arg(long, default_value = "postgres")]
        dialect: Dialect,

        /// Table name (relational backend only; defaults to the entity name)
        #[arg(long)]
        table: Option<String>,
    },

    /// Check whether an entity allows a CRUD operation
    Allows {
        /// Schema file (JSON)
        #[arg(short, long)]
        schema: PathBuf,

        /// Entity to check
        #[arg(short, long)]
        entity: String,

        /// Operation name, e.g. ReadById or DeleteByQuery
        #[arg(short, long)]
        operation: CrudOperation,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("crudql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(&args) {
        Ok(outcome) => {
            println!("{}", outcome.output);
            if outcome.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<Outcome> {
    let config = QueryConfig::from(&args.config);
    let formatter = formatter::create_formatter(args.format);

    match &args.command {
        Command::Validate(target) => {
            let schema = commands::load_schema(&target.schema)?;
            let query = commands::load_query(&target.query)?;
            Ok(commands::validate(
                &schema,
                &config,
                &target.entity,
                &query,
                &*formatter,
            ))
        }
        Command::Compile {
            target,
            backend,
            dialect,
            table,
        } => {
            let schema = commands::load_schema(&target.schema)?;
            let query = commands::load_query(&target.query)?;
            let emit = CompileTarget::new(*backend, *dialect, table.clone());
            commands::compile(
                &schema,
                &config,
                &target.entity,
                &query,
                &emit,
                &*formatter,
            )
        }
        Command::Allows {
            schema,
            entity,
            operation,
        } => {
            let schema = commands::load_schema(schema)?;
            commands::allows(&schema, entity, *operation, &*formatter)
        }
    }
}
