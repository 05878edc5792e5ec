use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use db_interpose::{rewrite_fts, DeclType};
use rusqlite::{Connection, OpenFlags};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(author, version, about = "Offline diagnostics for the db_interpose shim", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the FTS rewriter over a statement (argument, or stdin if omitted)
    Rewrite {
        /// SQL statement to rewrite
        sql: Option<String>,
    },
    /// Print the canonical type tag for declared column types
    Decltype {
        /// Declared types as the database reports them
        #[arg(required = true)]
        types: Vec<String>,
    },
    /// List FTS virtual tables and declared column types in a SQLite file
    Inspect {
        /// Path to the SQLite database
        db: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Rewrite { sql } => rewrite(sql),
        Commands::Decltype { types } => {
            for declared in &types {
                println!("{declared} -> {}", DeclType::from_declared(declared));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Inspect { db } => {
            inspect(&db)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Prints the rewritten statement, or the input unchanged when no rewrite
/// applies (exit code 1 distinguishes the latter).
fn rewrite(sql: Option<String>) -> Result<ExitCode> {
    let sql = match sql {
        Some(sql) => sql,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read SQL from stdin")?;
            buf
        }
    };
    let sql = sql.trim_end();
    match rewrite_fts(sql) {
        Some(rewritten) => {
            println!("{rewritten}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{sql}");
            Ok(ExitCode::from(1))
        }
    }
}

fn inspect(db: &Path) -> Result<()> {
    let conn = Connection::open_with_flags(db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("failed to open {}", db.display()))?;

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'fts4_%' ORDER BY name",
    )?;
    let fts_tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    if fts_tables.is_empty() {
        println!("no FTS virtual tables");
    } else {
        for table in &fts_tables {
            println!("fts table: {table}");
        }
    }

    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' \
         AND name NOT LIKE 'fts4_%' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    for table in &tables {
        let mut info = conn.prepare(&format!("PRAGMA table_info({table})"))?;
        let columns: Vec<(String, String)> = info
            .query_map([], |row| Ok((row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;
        for (column, declared) in columns {
            println!(
                "{table}.{column}: {declared} -> {}",
                DeclType::from_declared(&declared)
            );
        }
    }
    Ok(())
}
