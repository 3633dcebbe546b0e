//! kql-builder CLI - compile, migrate and shape visual-builder queries
//!
//! Usage:
//!   kql-builder compile --query <query.json> [--schema <schema.json>] [--database <db>]
//!   kql-builder migrate --query <query.json>
//!   kql-builder tables --schema <schema.json> --database <db>
//!   kql-builder shape --result <result.json> [--format <format>]
//!
//! Examples:
//!   kql-builder compile --query saved/errors.json --schema cluster.json
//!   kql-builder shape --result out.json --format time_series
//!
//! Logging goes to stderr and is controlled with RUST_LOG.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use kql_builder::compile::QueryBuilder;
use kql_builder::config::Settings;
use kql_builder::migration::migrate_query;
use kql_builder::query::ResultFormat;
use kql_builder::result::{shape, RawTable};
use kql_builder::schema::{ClusterSchema, FileSchemaProvider, SchemaProvider};
use kql_builder::{Error, Result};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kql-builder")]
#[command(about = "Compile visual query-builder expressions to KQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to KQL_BUILDER_CONFIG, ./kql-builder.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a stored query and print its KQL
    Compile {
        /// Stored query JSON
        #[arg(short, long)]
        query: PathBuf,

        /// Cluster schema JSON used to resolve column types
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Database used when the query names none
        #[arg(short, long)]
        database: Option<String>,

        /// Also print compile warnings
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print a stored query upgraded to the current shape
    Migrate {
        /// Stored query JSON
        #[arg(short, long)]
        query: PathBuf,
    },

    /// List the table options offered for a database
    Tables {
        /// Cluster schema JSON
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        database: String,
    },

    /// Shape raw result tables into frames
    Shape {
        /// Result tables JSON: `[{ name, columns: [{ name, type, values }] }]`
        #[arg(short, long)]
        result: PathBuf,

        #[arg(short, long, default_value = "table")]
        format: FormatArg,
    },
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    Table,
    TimeSeries,
    AdxTimeSeries,
}

impl From<FormatArg> for ResultFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => ResultFormat::Table,
            FormatArg::TimeSeries => ResultFormat::TimeSeries,
            FormatArg::AdxTimeSeries => ResultFormat::AdxTimeSeries,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kql_builder=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            query,
            schema,
            database,
            verbose,
        } => cmd_compile(cli.config.as_deref(), &query, schema, database, verbose).await,
        Commands::Migrate { query } => cmd_migrate(cli.config.as_deref(), &query),
        Commands::Tables { schema, database } => {
            cmd_tables(cli.config.as_deref(), schema, &database).await
        }
        Commands::Shape { result, format } => cmd_shape(&result, format.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_compile(
    config: Option<&Path>,
    query: &Path,
    schema: Option<PathBuf>,
    database: Option<String>,
    verbose: bool,
) -> Result<()> {
    let settings = load_settings(config)?;
    let schema = match schema {
        Some(path) => FileSchemaProvider::new(path).get_schema().await?,
        None => ClusterSchema::default(),
    };

    let mut defaults = settings.query_defaults()?;
    if let Some(database) = database {
        defaults.database = database;
    }
    let builder = QueryBuilder::from_settings(&settings, schema)?.with_defaults(defaults);

    let output = builder.compile_value(&read_json(query)?)?;
    println!("{}", output.text);

    if verbose {
        for warning in &output.warnings {
            eprintln!("warning: {}", warning);
        }
    }
    Ok(())
}

fn cmd_migrate(config: Option<&Path>, query: &Path) -> Result<()> {
    let settings = load_settings(config)?;
    let defaults = settings.query_defaults()?;

    let value = read_json(query)?;
    let migrated = migrate_query(&value, &defaults);
    println!("{}", serde_json::to_string_pretty(&*migrated)?);
    Ok(())
}

async fn cmd_tables(config: Option<&Path>, schema: PathBuf, database: &str) -> Result<()> {
    let settings = load_settings(config)?;
    let schema = FileSchemaProvider::new(schema).get_schema().await?;
    let builder = QueryBuilder::from_settings(&settings, schema)?;

    let options = builder.table_options(database);
    if options.is_empty() {
        println!("No tables in {}.", database);
    }
    for option in &options {
        if option.label == option.value {
            println!("  - {}", option.value);
        } else {
            println!("  - {} ({})", option.label, option.value);
        }
    }
    Ok(())
}

fn cmd_shape(result: &Path, format: ResultFormat) -> Result<()> {
    let tables: Vec<RawTable> = serde_json::from_value(read_json(result)?)?;
    let shaped = shape(&tables, format)?;

    if shaped.time_not_ascending() {
        eprintln!("warning: time field is not ascending");
    }
    println!("{}", serde_json::to_string_pretty(&shaped)?);
    Ok(())
}

fn load_settings(config: Option<&Path>) -> Result<Settings> {
    let settings = match config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&content)?)
}
