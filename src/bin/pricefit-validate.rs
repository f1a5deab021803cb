//! Validates a listings CSV and prints the column mapping, valid records and skipped rows.

use std::path::PathBuf;

use pricefit::config::{self, AppSettings};
use pricefit::ingest::{self, CanonicalField};
use pricefit::logging;

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings: AppSettings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;

    let parsed = ingest::read_csv_file(&options.csv).map_err(|err| err.to_string())?;
    let report = ingest::ingest_parsed(&parsed, &settings.fields);

    println!("Columns:");
    for field in CanonicalField::ALL {
        match report.mapping.column(field) {
            Some(column) => println!(
                "  {field:<10} -> #{} {:?}",
                column.index + 1,
                column.header
            ),
            None => println!("  {field:<10} -> (missing)"),
        }
    }
    for diagnostic in &report.diagnostics {
        println!("Note: {diagnostic}");
    }

    let dataset = &report.dataset;
    let summary = dataset.summary();
    println!("Valid records: {}", summary.valid);
    println!(
        "{:>12} {:>10} {:>9} {:>14}",
        "size", "bathrooms", "bedrooms", "price"
    );
    for record in dataset.records().iter().take(options.limit) {
        let features = record.features();
        println!(
            "{:>12} {:>10} {:>9} {:>14}",
            features.size,
            features.bathrooms,
            features.bedrooms,
            record.price()
        );
    }
    if summary.valid > options.limit {
        println!("... {} more", summary.valid - options.limit);
    }

    println!("Warnings: {}", summary.rejected);
    for entry in dataset.rejections() {
        println!("  {entry}");
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    csv: PathBuf,
    config: Option<PathBuf>,
    limit: usize,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut csv: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut limit = 20usize;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--csv" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--csv requires a value".to_string())?;
                csv = Some(PathBuf::from(value));
            }
            "--config" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--limit" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--limit requires a value".to_string())?;
                limit = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --limit value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let csv = csv.ok_or_else(help_text)?;
    Ok(CliOptions { csv, config, limit })
}

fn help_text() -> String {
    [
        "pricefit-validate",
        "",
        "Checks a listings CSV without training.",
        "",
        "Usage:",
        "  pricefit-validate --csv <file> [--config <file>] [--limit <n>]",
        "",
        "Options:",
        "  --csv <file>      Listings CSV (required).",
        "  --config <file>   Config TOML (default: config.toml in the app directory).",
        "  --limit <n>       Valid records to print (default: 20). Skipped rows are always listed.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parses_csv_config_and_limit() {
        let options = parse_args(args(&[
            "--csv",
            "listings.csv",
            "--config",
            "custom.toml",
            "--limit",
            "3",
        ]))
        .unwrap();
        assert_eq!(options.csv, PathBuf::from("listings.csv"));
        assert_eq!(options.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(options.limit, 3);
    }

    #[test]
    fn csv_is_required() {
        assert!(parse_args(Vec::new()).unwrap_err().starts_with("pricefit-validate"));
        let options = parse_args(args(&["--csv", "a.csv"])).unwrap();
        assert_eq!(options.limit, 20);
        assert!(parse_args(args(&["--csv", "a.csv", "--limit", "all"])).is_err());
    }
}
