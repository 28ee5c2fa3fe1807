//! eelhole CLI - Browse a data catalog and compile grid filters to SQL
//!
//! Usage:
//!   eelhole tables [--manifest <file>...]
//!   eelhole search <query> [--package <name>]
//!   eelhole complete <query>
//!   eelhole compile --table <name> [--filters <json>] [--page <n>] [--per-page <n>]
//!   eelhole serve [--bind <addr>]
//!
//! Examples:
//!   eelhole search plant --manifest pudl.json
//!   eelhole complete cap --manifest pudl.json
//!   eelhole compile --manifest pudl.json --table plants_eia \
//!       --filters '[{"fieldName":"capacity_mw","fieldType":"number","operation":"greaterThan","value":100}]'

use clap::{Args, Parser, Subcommand, ValueEnum};
use eelhole::catalog::Catalog;
use eelhole::compile::QueryCompiler;
use eelhole::config::Settings;
use eelhole::filter::Filter;
use eelhole::search::{SearchIndex, SearchScope};
use eelhole::{Error, Result};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eelhole")]
#[command(about = "eelhole - Search a data catalog and compile grid filters to DuckDB SQL")]
#[command(version)]
struct Cli {
    /// Path to an eelhole.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CatalogArgs {
    /// Manifest file(s); defaults to the manifests in the config file
    #[arg(short, long = "manifest")]
    manifests: Vec<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog tables
    Tables {
        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Rank tables matching a free text query
    Search {
        query: String,

        /// Only search tables from this data package
        #[arg(short, long)]
        package: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Suggest table and column names for a partial query
    Complete {
        query: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Compile filters into a paginated query and a count query
    Compile {
        /// Table to query
        #[arg(short, long)]
        table: String,

        /// JSON array of filters
        #[arg(short, long, default_value = "[]")]
        filters: String,

        /// 1-based page number
        #[arg(long, default_value_t = 1)]
        page: i64,

        /// Rows per page (defaults to the preview page size)
        #[arg(long)]
        per_page: Option<i64>,

        /// Override the data file location prefix
        #[arg(long)]
        base_location: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "json")]
        output: OutputFormat,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Serve the HTTP API
    #[cfg(feature = "server")]
    Serve {
        /// Address to listen on (defaults to the config file)
        #[arg(short, long)]
        bind: Option<String>,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Statements and bind values as JSON
    Json,
    /// Statements as SQL with values in comments
    Sql,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_settings(cli.config.as_ref()).and_then(|settings| match cli.command {
        Commands::Tables { catalog } => cmd_tables(&settings, &catalog),
        Commands::Search {
            query,
            package,
            catalog,
        } => cmd_search(&settings, &catalog, &query, package),
        Commands::Complete { query, catalog } => cmd_complete(&settings, &catalog, &query),
        Commands::Compile {
            table,
            filters,
            page,
            per_page,
            base_location,
            output,
            catalog,
        } => cmd_compile(
            settings,
            &catalog,
            &table,
            &filters,
            page,
            per_page,
            base_location,
            output,
        ),
        #[cfg(feature = "server")]
        Commands::Serve { bind, catalog } => cmd_serve(settings, &catalog, bind),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    Ok(settings)
}

fn load_catalog(settings: &Settings, args: &CatalogArgs) -> Result<Catalog> {
    let paths = if args.manifests.is_empty() {
        settings.catalog.manifest_paths()?
    } else {
        args.manifests.clone()
    };
    if paths.is_empty() {
        return Err(Error::Settings(eelhole::config::SettingsError::InvalidConfig(
            "no manifests given; pass --manifest or set [catalog] manifests".to_string(),
        )));
    }

    let catalog = Catalog::from_paths(&paths)?;
    tracing::info!(
        manifests = paths.len(),
        tables = catalog.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| Error::Internal(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn cmd_tables(settings: &Settings, args: &CatalogArgs) -> Result<()> {
    let catalog = load_catalog(settings, args)?;

    if catalog.is_empty() {
        println!("No tables defined.");
        return Ok(());
    }

    println!("Tables:");
    for table in catalog.list_tables() {
        match &table.package {
            Some(package) => println!(
                "  - {} ({}, {} columns)",
                table.name,
                package,
                table.columns.len()
            ),
            None => println!("  - {} ({} columns)", table.name, table.columns.len()),
        }
    }
    Ok(())
}

fn cmd_search(
    settings: &Settings,
    args: &CatalogArgs,
    query: &str,
    package: Option<String>,
) -> Result<()> {
    let catalog = load_catalog(settings, args)?;
    let index = SearchIndex::new(&catalog);
    let scope = package.map(SearchScope::Package).unwrap_or_default();
    print_json(&index.search_scoped(query, &scope))
}

fn cmd_complete(settings: &Settings, args: &CatalogArgs, query: &str) -> Result<()> {
    let catalog = load_catalog(settings, args)?;
    let index = SearchIndex::new(&catalog);
    print_json(&index.autocomplete(query))
}

#[allow(clippy::too_many_arguments)]
fn cmd_compile(
    mut settings: Settings,
    args: &CatalogArgs,
    table: &str,
    filters: &str,
    page: i64,
    per_page: Option<i64>,
    base_location: Option<String>,
    output: OutputFormat,
) -> Result<()> {
    let catalog = load_catalog(&settings, args)?;
    if let Some(base_location) = base_location {
        settings.query.base_location = base_location;
    }

    let filters = Filter::parse_list(filters)?;
    let per_page = per_page.unwrap_or(settings.query.preview_page_size as i64);
    let compiler = QueryCompiler::new(Arc::new(catalog), settings.query.compile_options()?);
    let spec = compiler.compile(table, &filters, page, per_page)?;

    tracing::debug!(
        event = settings.query.page_kind(per_page).event(),
        table,
        filters = filters.len(),
        "compiled query"
    );

    match output {
        OutputFormat::Json => print_json(&spec)?,
        OutputFormat::Sql => {
            let values: Vec<String> = spec.values.iter().map(|v| v.to_string()).collect();
            println!("-- eelhole compiled SQL");
            println!("-- Table: {}", table);
            println!("-- Values: [{}]", values.join(", "));
            println!();
            println!("{};", spec.statement);
            println!();
            println!("{};", spec.count_statement);
        }
    }
    Ok(())
}

#[cfg(feature = "server")]
fn cmd_serve(settings: Settings, args: &CatalogArgs, bind: Option<String>) -> Result<()> {
    let catalog = load_catalog(&settings, args)?;
    let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
    let state = Arc::new(eelhole::web::AppState::new(catalog, settings.query)?);

    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;
    runtime
        .block_on(eelhole::web::serve(state, &bind))
        .map_err(|e| Error::Internal(e.to_string()))
}
