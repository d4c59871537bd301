//! Writes a synthetic transaction dataset as a flat JSON array.
//!
//! Usage: generate_data [--count N] [--output PATH]

use anyhow::{anyhow, Context, Result};
use chrono::{DurationRound, TimeDelta, Utc};
use rand::Rng;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use txn_grid::data::record::{Record, Status};

const DEFAULT_COUNT: u64 = 1_000_000;
const DEFAULT_OUTPUT: &str = "transactions.json";

const MERCHANTS: [&str; 5] = ["TechCorp", "FinBank", "RetailHub", "GlobalMart", "CloudNine"];
const CATEGORIES: [&str; 5] = ["Food", "Travel", "Shopping", "Utilities", "Finance"];

/// Dates fall up to this far in the past (about 115 days)
const MAX_AGE_MS: f64 = 1e10;

fn flag_value(args: &[String], flag: &str) -> Result<Option<String>> {
    match args.iter().position(|arg| arg == flag) {
        Some(pos) => args
            .get(pos + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| anyhow!("{} needs a value", flag)),
        None => Ok(None),
    }
}

fn generate_record<R: Rng>(rng: &mut R, id: u64, now: chrono::DateTime<Utc>) -> Record {
    let age = TimeDelta::milliseconds((rng.gen::<f64>() * MAX_AGE_MS) as i64);
    let date = (now - age)
        .duration_trunc(TimeDelta::milliseconds(1))
        .unwrap_or(now - age);

    Record {
        id,
        date,
        merchant: MERCHANTS[rng.gen_range(0..MERCHANTS.len())].to_string(),
        category: CATEGORIES[rng.gen_range(0..CATEGORIES.len())].to_string(),
        amount: (rng.gen::<f64>() * 10_000.0 * 100.0).round() / 100.0,
        status: Status::ALL[rng.gen_range(0..Status::ALL.len())],
        description: format!("Transaction {} description", id),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let count = match flag_value(&args, "--count")? {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("--count expects a number, got '{}'", raw))?,
        None => DEFAULT_COUNT,
    };
    let output = flag_value(&args, "--output")?.unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    let started = Instant::now();
    let file = File::create(&output).with_context(|| format!("Cannot create {}", output))?;
    let mut writer = BufWriter::new(file);
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    // Stream one record at a time; the whole array never sits in memory
    writer.write_all(b"[")?;
    for id in 1..=count {
        if id > 1 {
            writer.write_all(b",")?;
        }
        serde_json::to_writer(&mut writer, &generate_record(&mut rng, id, now))?;
    }
    writer.write_all(b"]")?;
    writer.flush()?;

    println!(
        "Generated {} records in {} ({:.2?})",
        count,
        output,
        started.elapsed()
    );
    Ok(())
}
