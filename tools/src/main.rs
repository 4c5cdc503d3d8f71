//! etl-runner: load a raw transaction file into the star-schema warehouse.
//!
//! Usage:
//!   etl-runner [source.csv] [--config config/warehouse.json] [--db warehouse.db]
//!   etl-runner data/raw/paysim1.csv --export data/processed/warehouse.csv
//!   etl-runner data/raw/paysim1.csv --validate-only
//!
//! Without a source argument the configured `data.raw_csv` is used.
//! Any error exits non-zero.

use anyhow::{Context, Result};
use std::{env, path::PathBuf};
use warehouse_core::{
    config::WarehouseConfig,
    export::export_warehouse_view,
    pipeline::{Pipeline, RunSummary},
    store::WarehouseStore,
    validation::SchemaValidator,
};

const DEFAULT_CONFIG: &str = "config/warehouse.json";

/// Flags that take a value, so their values are not mistaken for the source.
const VALUE_FLAGS: [&str; 3] = ["--config", "--db", "--export"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let config = load_config(&args)?;
    let validate_only = args.iter().any(|a| a == "--validate-only");
    let source = source_arg(&args)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.data.raw_csv));
    let db = flag_value(&args, "--db").unwrap_or(config.database.path.as_str());

    println!("Transaction warehouse loader");
    println!("  source:   {}", source.display());
    println!("  db:       {db}");
    println!("  chunk:    {}", config.ingestion.chunk_size);
    println!();

    if validate_only {
        let report = SchemaValidator::new(
            config.ingestion.validation_sample_rows,
            config.delimiter(),
        )
        .validate(&source)?;
        println!("Schema OK: {} rows sampled", report.rows_sampled);
        return Ok(());
    }

    if let Some(parent) = PathBuf::from(db).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }
    let store = WarehouseStore::open(db)?;
    let version = store.verify_connection()?;
    log::info!(
        "Connected to SQLite {version} at {}",
        store.path().unwrap_or(":memory:")
    );

    let summary = Pipeline::new(&store, config.clone()).run(&source)?;
    print_summary(&summary);

    if let Some(out) = flag_value(&args, "--export") {
        let rows = export_warehouse_view(&store, &PathBuf::from(out), config.delimiter())?;
        println!("  exported:       {rows} rows -> {out}");
    }
    Ok(())
}

fn load_config(args: &[String]) -> Result<WarehouseConfig> {
    match flag_value(args, "--config") {
        Some(path) => WarehouseConfig::load(path),
        None if PathBuf::from(DEFAULT_CONFIG).exists() => WarehouseConfig::load(DEFAULT_CONFIG),
        None => {
            log::warn!("{DEFAULT_CONFIG} not found, using built-in defaults");
            Ok(WarehouseConfig::default())
        }
    }
}

fn print_summary(s: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  run_id:         {}", s.run_id);
    println!("  staging rows:   {}", s.staging.rows);
    println!("  chunks:         {}", s.staging.chunks);
    println!("  dim_time:       {} (+{})", s.time.total, s.time.inserted);
    println!("  dim_account:    {} (+{})", s.accounts.total, s.accounts.inserted);
    println!("  facts:          {}", s.facts.inserted);
    println!("  dropped rows:   {}", s.facts.unmatched_total);
    println!("  orphans:        {}", s.integrity.orphans);

    println!();
    println!("=== FRAUD DISTRIBUTION ===");
    for share in &s.fraud_distribution {
        println!("  {:<15} {:>10} ({:.2}%)", share.label, share.count, share.percent);
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// The first argument that is neither a flag nor a flag's value.
fn source_arg(args: &[String]) -> Option<&str> {
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
            continue;
        }
        if !arg.starts_with("--") {
            return Some(arg);
        }
    }
    None
}
