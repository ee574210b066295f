use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dxdb_api::Database;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod shell;
mod table;

use table::OutputFormat;

#[derive(Parser)]
#[command(name = "dxdb")]
#[command(about = "dxdb CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive shell
    Shell {
        /// Database name
        #[arg(short, long)]
        name: String,
        /// Folder holding the database files (in-memory when omitted)
        #[arg(short, long)]
        folder: Option<PathBuf>,
    },
    /// Execute SQL statements and print their results
    Query {
        /// Database name
        #[arg(short, long)]
        name: String,
        /// Folder holding the database files (in-memory when omitted)
        #[arg(short, long)]
        folder: Option<PathBuf>,
        /// Output format (table, json)
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
        /// SQL text; several statements are separated by `;`
        sql: String,
    },
}

fn open(name: &str, folder: Option<&PathBuf>) -> Result<(Database, String)> {
    let db = Database::new(name, folder.map(|f| f.as_path()))
        .with_context(|| format!("Failed to open database '{}'", name))?;
    let location = match folder {
        Some(folder) => folder.display().to_string(),
        None => ":memory:".to_string(),
    };
    Ok((db, location))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Shell { name, folder } => {
            let (db, location) = open(&name, folder.as_ref())?;
            let mut shell = shell::Shell::new(db, location)?;
            shell.run()?;
        }

        Commands::Query {
            name,
            folder,
            output,
            sql,
        } => {
            let (db, _) = open(&name, folder.as_ref())?;
            match db.execute_script(&sql) {
                Ok(results) => {
                    for result in &results {
                        println!("{}", table::render(result, output)?);
                    }
                }
                Err(e) => eprintln!("Error: {}", e),
            }
            db.close();
        }
    }

    Ok(())
}
