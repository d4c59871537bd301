use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::{info, warn};

use txn_grid::config::Config;
use txn_grid::data::data_view::SortDirection;
use txn_grid::data::dataset_loader::JsonFileSource;
use txn_grid::data::record::{Field, Status};
use txn_grid::logging;
use txn_grid::ui::{grid_tui, table_print};
use txn_grid::GridEngine;

fn print_help() {
    println!("txn-grid - virtualized transaction grid");
    println!();
    println!("USAGE:");
    println!("    txn-grid [FILE.json]");
    println!("    txn-grid --print FILE.json [--filter TEXT] [--status STATUS] [--sort FIELD[:desc]] [--offset ROW]");
    println!("    txn-grid --generate-config");
    println!();
    println!("OPTIONS:");
    println!("    --print             Print the visible window as a table and exit");
    println!("    --filter TEXT       Merchant substring filter (case-insensitive)");
    println!("    --status STATUS     Completed, Pending or Failed");
    println!("    --sort FIELD[:desc] Sort by id, date, merchant, category, amount, status or description");
    println!("    --offset ROW        First row to scroll to");
    println!("    --generate-config   Write a commented default config file");
    println!("    -h, --help          Show this help");
    println!();
    println!("With no FILE the [behavior] default_dataset from the config file is used.");
}

/// Value following `flag`, if the flag is present
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        Some(pos) => args
            .get(pos + 1)
            .map(|value| Some(value.as_str()))
            .ok_or_else(|| anyhow!("{} needs a value", flag)),
        None => Ok(None),
    }
}

/// `FIELD` or `FIELD:asc` / `FIELD:desc`
fn parse_sort(raw: &str) -> Result<(Field, SortDirection)> {
    let (name, direction) = match raw.split_once(':') {
        Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, SortDirection::Descending),
        Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, SortDirection::Ascending),
        Some((_, dir)) => bail!("Unknown sort direction '{}'", dir),
        None => (raw, SortDirection::Ascending),
    };
    Ok((Field::from_str(name)?, direction))
}

fn dataset_path(args: &[String], config: &Config) -> Result<PathBuf> {
    // Values of flags are not dataset paths
    let flag_values: Vec<&String> = ["--filter", "--status", "--sort", "--offset"]
        .iter()
        .filter_map(|flag| args.iter().position(|arg| arg == flag))
        .filter_map(|pos| args.get(pos + 1))
        .collect();

    args.iter()
        .skip(1)
        .filter(|arg| !arg.starts_with("--"))
        .find(|arg| !flag_values.contains(arg))
        .map(PathBuf::from)
        .or_else(|| config.behavior.default_dataset.clone())
        .ok_or_else(|| anyhow!("No dataset given and no default_dataset configured (see --help)"))
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(target: "config", "Could not load config, using defaults: {:#}", e);
        Config::default()
    })
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating config directory {:?}", parent))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("Error writing config file {:?}", path))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

fn run_print(args: &[String]) -> Result<()> {
    logging::init_stderr_tracing();
    let config = load_config();
    let path = dataset_path(args, &config)?;

    let mut engine = GridEngine::new(config.engine_options());
    engine
        .load(&JsonFileSource::new(&path))
        .with_context(|| format!("Failed to load {:?}", path))?;

    let now = Instant::now();
    if let Some(text) = flag_value(args, "--filter")? {
        engine.set_filter_text(text, now);
        engine.commit_filter_text();
    }
    if let Some(status) = flag_value(args, "--status")? {
        engine.set_status_filter(Some(Status::from_str(status)?));
    }
    if let Some(sort) = flag_value(args, "--sort")? {
        let (field, direction) = parse_sort(sort)?;
        if engine.set_sort_key(field).direction != direction {
            engine.set_sort_key(field);
        }
    }
    if let Some(offset) = flag_value(args, "--offset")? {
        let row: usize = offset
            .parse()
            .with_context(|| format!("--offset expects a row number, got '{}'", offset))?;
        engine.set_scroll_offset(row as f64 * engine.metrics().row_extent, now);
        engine.on_frame();
    }

    table_print::print_window(&engine);
    Ok(())
}

fn run_tui(args: &[String]) -> Result<()> {
    let log_buffer = logging::init_tracing();
    let config = load_config();
    let path = dataset_path(args, &config)?;

    let mut engine = GridEngine::new(config.engine_options());
    let started = Instant::now();
    engine
        .load(&JsonFileSource::new(&path))
        .with_context(|| format!("Failed to load {:?}", path))?;
    info!(target: "system", "Dataset ready in {:?}", started.elapsed());

    grid_tui::run_grid_tui(engine, &config, Some(log_buffer))?;
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.contains(&"--generate-config".to_string()) {
        return generate_config();
    }

    if args.contains(&"--print".to_string()) {
        return run_print(&args);
    }

    run_tui(&args)
}
