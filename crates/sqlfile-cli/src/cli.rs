//! `sqlfile` command line runner
//!
//! ```text
//! sqlfile split schema.sql seed.sql       # show the statements a file yields
//! sqlfile run --database app.db migrations/
//! ```

mod logging;
mod output;
mod settings;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use sqlfile::StatementBatch;
use sqlfile_driver_sqlite::SqliteConnection;
use std::path::PathBuf;

use logging::LoggingConfig;
use output::OutputFormat;
use settings::Settings;

#[derive(Parser, Debug)]
#[command(name = "sqlfile")]
#[command(version)]
#[command(about = "Split SQL files into statements and run them in a single transaction")]
struct Cli {
    /// Settings file (defaults to <config_dir>/sqlfile/settings.toml)
    #[arg(long, global = true, value_name = "FILE", env = "SQLFILE_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. `debug` or `info,sqlfile=trace`
    #[arg(long, global = true, value_name = "FILTER", env = "SQLFILE_LOG")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the statements the given SQL sources split into
    Split {
        /// SQL files, or a single directory of `.sql` files
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Execute the given SQL sources against a SQLite database, all or nothing
    Run {
        /// SQLite database file, or `:memory:`
        #[arg(short, long, value_name = "FILE", env = "SQLFILE_DATABASE")]
        database: Option<String>,

        /// SQL files, or a single directory of `.sql` files
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,

        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    let _log_guard = logging::init(LoggingConfig::resolve(
        cli.log_level.as_deref(),
        settings.log_filter.as_deref(),
        settings.log_dir.clone(),
    ))?;

    match cli.command {
        Command::Split { paths, format } => {
            let batch = load_sources(&paths)?;
            let format = format.unwrap_or(settings.format);
            println!("{}", output::render_statements(&batch, format)?);
        }
        Command::Run {
            database,
            paths,
            format,
        } => {
            let Some(database) = database.or(settings.database) else {
                bail!("No database configured: pass --database or set `database` in settings");
            };
            let batch = load_sources(&paths)?;
            let format = format.unwrap_or(settings.format);

            let conn = SqliteConnection::open(&database)
                .with_context(|| format!("Failed to open database {database}"))?;
            let outcomes = batch.execute(&conn).await?;

            tracing::info!(
                database = %database,
                statement_count = outcomes.len(),
                "batch committed"
            );
            println!("{}", output::render_outcomes(&batch, &outcomes, format)?);
        }
    }

    Ok(())
}

/// A single directory argument loads every `.sql` file in it, otherwise each
/// path is read as a file in the order given.
fn load_sources(paths: &[PathBuf]) -> Result<StatementBatch> {
    let batch = match paths {
        [dir] if dir.is_dir() => StatementBatch::load_dir(dir)?,
        _ => StatementBatch::load_files(paths.iter().map(PathBuf::as_path))?,
    };
    tracing::debug!(
        sources = paths.len(),
        statement_count = batch.len(),
        "loaded SQL sources"
    );
    Ok(batch)
}
