//! triage-runner: headless runner for the alert triage simulator.
//!
//! Usage:
//!   triage-runner --data-dir ./data
//!   triage-runner --raw-dir in/ --output-dir out/ --json
//!   triage-runner --generate --seed 42 --customers 200 --alerts 500

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use triage_core::{
    config::{TriageConfig, DEFAULT_DATA_DIR},
    pipeline::{RunSummary, TriagePipeline},
    synth,
};

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;
    let json = has_flag(&args, "--json");

    if has_flag(&args, "--generate") {
        let seed = parse_arg(&args, "--seed", 42u64);
        let tables = synth::generate(&config.synth, seed);
        tables.write_to(&config.raw_dir)?;
        println!(
            "Wrote {} alerts, {} customers, {} transactions to {}",
            tables.alerts.len(),
            tables.customers.len(),
            tables.transactions.len(),
            config.raw_dir.display()
        );
        return Ok(());
    }

    let summary = TriagePipeline::new(config).run()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

/// Defaults < --data-dir < --config file < individual overrides.
fn build_config(args: &[String]) -> Result<TriageConfig> {
    let data_dir = string_arg(args, "--data-dir").unwrap_or(DEFAULT_DATA_DIR);
    let base = TriageConfig::from_data_dir(data_dir);
    let mut config = match string_arg(args, "--config") {
        Some(path) => {
            log::info!("Loading config from {path} over data dir {data_dir}");
            TriageConfig::load_over(base, path)?
        }
        None => base,
    };

    if let Some(raw) = string_arg(args, "--raw-dir") {
        config.raw_dir = PathBuf::from(raw);
    }
    if let Some(out) = string_arg(args, "--output-dir") {
        config.output_dir = PathBuf::from(out);
    }
    config.synth.customers = parse_arg(args, "--customers", config.synth.customers);
    config.synth.alerts = parse_arg(args, "--alerts", config.synth.alerts);
    config.model.max_iter = parse_arg(args, "--max-iter", config.model.max_iter);
    Ok(config)
}

fn print_summary(summary: &RunSummary) {
    println!("=== RUN SUMMARY ===");
    println!("  alerts scored:  {}", summary.rows);
    println!("  output:         {}", summary.output_path.display());
    println!("  iterations:     {}", summary.model.iterations);
    println!("  converged:      {}", summary.model.converged);
    println!("  intercept:      {:+.6}", summary.model.intercept);
    for (name, weight) in summary.model.named_weights() {
        println!("  w[{name}]: {weight:+.6}");
    }
    println!();
    println!(
        "Wrote {} priority scores to {}",
        summary.rows,
        summary.output_path.display()
    );
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
