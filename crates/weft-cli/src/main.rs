//! weft-validate - standalone graph validation CLI.
//!
//! Reads a persisted connection graph (or a legacy suggestion map),
//! cleans it, writes the result atomically, and prints a stats summary.
//! Exits non-zero only on unrecoverable I/O failure; validation itself
//! never fails.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use weft_core::defaults;
use weft_graph::{load_json, save_json, validate_value};

/// Validate a connection graph JSON file (graph or legacy map format).
#[derive(Parser, Debug)]
#[command(name = "weft-validate", version, about)]
struct Args {
    /// Input JSON path.
    #[arg(long = "in", value_name = "PATH", default_value = "output/graph.json")]
    input: PathBuf,

    /// Output JSON path (defaults to the input path).
    #[arg(long = "out", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Drop edges/targets with similarity below this value.
    #[arg(long = "min-sim", default_value_t = defaults::VALIDATE_MIN_SIM)]
    min_sim: u8,

    /// Do not deduplicate edges (graph format only).
    #[arg(long = "no-dedup", action = clap::ArgAction::SetFalse)]
    dedup: bool,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let output = args.output.clone().unwrap_or_else(|| args.input.clone());

    let data = load_json(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))?;

    let (cleaned, report) = validate_value(&data, args.min_sim, args.dedup);

    save_json(&cleaned, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("\n{}", report);
    println!("\nSaved to: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["weft-validate"]);
        assert_eq!(args.input, PathBuf::from("output/graph.json"));
        assert!(args.output.is_none());
        assert_eq!(args.min_sim, 55);
        assert!(args.dedup);
    }

    #[test]
    fn test_no_dedup_flag() {
        let args = Args::parse_from(["weft-validate", "--no-dedup"]);
        assert!(!args.dedup);
    }

    #[test]
    fn test_explicit_paths_and_threshold() {
        let args = Args::parse_from([
            "weft-validate",
            "--in",
            "a.json",
            "--out",
            "b.json",
            "--min-sim",
            "70",
        ]);
        assert_eq!(args.input, PathBuf::from("a.json"));
        assert_eq!(args.output, Some(PathBuf::from("b.json")));
        assert_eq!(args.min_sim, 70);
    }
}
