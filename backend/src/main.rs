//! csvclean CLI
//!
//! ```bash
//! csvclean clean input.csv -o cleaned.csv          # Clean a local file
//! csvclean invoke event.json --store-root ./data   # Handle a storage event
//! csvclean process raw uploads/a.csv               # Handle one object directly
//! csvclean serve --port 3000                       # Start HTTP server
//! ```
//!
//! `invoke`, `process` and `serve` need `OUTPUT_BUCKET` (environment or
//! `.env`). Buckets are directories under `--store-root`.

use clap::{Parser, Subcommand};
use csvclean::handler::event_for;
use csvclean::{clean_csv_file, Config, FsStore, Handler, ObjectLocation};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "csvclean")]
#[command(about = "Normalize and deduplicate CSV datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a local CSV file
    Clean {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Handle a storage event read from a JSON file
    Invoke {
        /// Event JSON file
        event: PathBuf,

        /// Directory holding one sub-directory per bucket
        #[arg(long, default_value = ".")]
        store_root: PathBuf,
    },

    /// Handle one object given by bucket and key
    Process {
        bucket: String,
        key: String,

        /// Directory holding one sub-directory per bucket
        #[arg(long, default_value = ".")]
        store_root: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Directory holding one sub-directory per bucket
        #[arg(long, default_value = ".")]
        store_root: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { input, output } => cmd_clean(&input, output.as_deref()),
        Commands::Invoke { event, store_root } => cmd_invoke(&event, store_root).await,
        Commands::Process {
            bucket,
            key,
            store_root,
        } => {
            let event = event_for(&ObjectLocation::new(bucket, key));
            run_event(&event, store_root).await
        }
        Commands::Serve { port, store_root } => cmd_serve(port, store_root).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_clean(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let cleaned = clean_csv_file(input)?;

    let stats = &cleaned.stats;
    eprintln!("   Rows read:          {}", stats.rows_read);
    for (reason, count) in &stats.rejected {
        eprintln!("   Rejected {:<20} {}", format!("{}:", reason), count);
    }
    eprintln!("   Duplicates removed: {}", stats.duplicates_removed);
    eprintln!("   Rows written:       {}", stats.rows_output);

    if cleaned.is_empty() {
        eprintln!("⚠️  Nothing to write");
        return Ok(());
    }

    let csv = cleaned.to_csv()?;
    match output {
        Some(p) => {
            fs::write(p, &csv)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => print!("{}", String::from_utf8_lossy(&csv)),
    }
    Ok(())
}

async fn cmd_invoke(event_path: &Path, store_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(event_path)?;
    let event: Value = serde_json::from_str(&content)?;
    run_event(&event, store_root).await
}

async fn run_event(event: &Value, store_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let handler = Handler::new(FsStore::new(store_root), Config::from_env()?);

    let response = handler.handle_event(event).await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        return Err(format!("invocation failed with status {}", response.status_code).into());
    }
    Ok(())
}

async fn cmd_serve(port: u16, store_root: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let handler = Handler::new(FsStore::new(store_root), Config::from_env()?);
    csvclean::server::start_server(port, handler).await?;
    Ok(())
}
