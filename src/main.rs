//! Replay mock CLI

use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use replay_mock::config::Config;
use replay_mock::storage::{FileRecordStore, RecordStore};
use replay_mock::{Category, ResultCodec};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        usage();
    }

    let result = match (args[1].as_str(), args.len()) {
        ("stats", 3) => show_stats(Path::new(&args[2])),
        ("dump", 5) => dump(Path::new(&args[2]), &args[3], &args[4]),
        _ => usage(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("Replay mock v{}", env!("CARGO_PKG_VERSION"));
    eprintln!();
    eprintln!("Usage: replay-mock <command> <config.toml> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  stats <config>                       Show entries per category");
    eprintln!("  dump <config> <category> <record-id> Print a recorded sequence");
    process::exit(1);
}

fn open_store(config: &Config, category: Category) -> Result<FileRecordStore> {
    FileRecordStore::open(
        &config.storage_dir,
        category,
        ResultCodec::new(config.codec.compression_level),
        config.limits.max_payload_size,
    )
    .with_context(|| format!("Failed to open {} store", category.name()))
}

fn show_stats(config_path: &Path) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load config")?;

    println!("Storage directory: {}", config.storage_dir.display());
    println!();

    for category in &config.stores {
        let store = open_store(&config, *category)?;
        let stats = store
            .log_stats()
            .with_context(|| format!("Failed to read {}", store.path().display()))?;
        println!(
            "  {:<18} {:>8} entries  (tag {})",
            category.name(),
            stats.entries,
            stats.category_tag
        );
    }

    Ok(())
}

fn dump(config_path: &Path, category: &str, record_id: &str) -> Result<()> {
    let config = Config::from_file(config_path).context("Failed to load config")?;
    let category: Category = category.parse()?;

    if !config.stores.contains(&category) {
        anyhow::bail!("No store configured for category '{}'", category.name());
    }

    let store = open_store(&config, category)?;
    let sequence = store.load_sequence(record_id)?;

    eprintln!("{} items for record {}", sequence.len(), record_id);
    for item in sequence {
        println!("{}", serde_json::to_string(&item)?);
    }

    Ok(())
}
