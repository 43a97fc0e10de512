//! hashcabinet CLI
//!
//! Inspect and edit a cabinet directory from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hashcabinet::{Cabinet, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// hashcabinet CLI
#[derive(Parser, Debug)]
#[command(name = "cabinet")]
#[command(about = "Inspect and edit a hashcabinet store")]
#[command(version)]
struct Args {
    /// Cabinet directory
    #[arg(short, long, default_value = "./cabinet_data")]
    path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the value at a key
    Get {
        /// The key to look up
        key: String,
    },

    /// Store a value at a key
    Set {
        /// The key to set
        key: String,

        /// Integer, float, true/false, null, or any other text as a string
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List all keys
    Keys,

    /// Print every record
    Dump,

    /// Print the number of records
    Len,

    /// Remove every record
    Clear,

    /// Fold the WAL into the snapshot
    Compact,
}

fn main() {
    // Logs go to stderr so command output stays clean on stdout
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cabinet: Cabinet = Cabinet::new(&args.path);

    tracing::debug!("hashcabinet CLI v{} on {}", hashcabinet::VERSION, args.path.display());

    if let Err(e) = run(&cabinet, args.command) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cabinet: &Cabinet, command: Commands) -> hashcabinet::Result<()> {
    match command {
        Commands::Get { key } => match cabinet.get(&key)? {
            Some(value) => println!("{}", value),
            None => {
                eprintln!("(not found)");
                std::process::exit(2);
            }
        },
        Commands::Set { key, value } => {
            cabinet.set(&key, Value::parse_scalar(&value))?;
            println!("OK");
        }
        Commands::Del { key } => {
            let removed = cabinet.delete(&key)?;
            println!("{}", if removed { 1 } else { 0 });
        }
        Commands::Keys => {
            cabinet.each_key(|key| println!("{}", key))?;
        }
        Commands::Dump => {
            cabinet.each(|key, value| println!("{}\t{}", key, value))?;
        }
        Commands::Len => println!("{}", cabinet.len()?),
        Commands::Clear => {
            cabinet.clear()?;
            println!("OK");
        }
        Commands::Compact => {
            cabinet.compact()?;
            println!("OK");
        }
    }
    Ok(())
}
