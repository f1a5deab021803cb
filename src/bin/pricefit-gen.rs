//! Writes a synthetic listings CSV with a known price rule plus uniform noise.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use pricefit::synthetic::{SynthOptions, write_listings};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let (options, out) = parse_args(std::env::args().skip(1).collect())?;
    match out {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|err| format!("Failed to create {}: {err}", path.display()))?;
            write_listings(BufWriter::new(file), &options).map_err(|err| err.to_string())?;
            eprintln!("Wrote {} rows to {}", options.rows, path.display());
        }
        None => {
            let stdout = std::io::stdout();
            write_listings(stdout.lock(), &options).map_err(|err| err.to_string())?;
        }
    }
    Ok(())
}

fn parse_args(args: Vec<String>) -> Result<(SynthOptions, Option<PathBuf>), String> {
    let mut options = SynthOptions::default();
    let mut out = None;

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--rows" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--rows requires a value".to_string())?;
                options.rows = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --rows value: {value}"))?;
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                options.seed = value
                    .parse::<u64>()
                    .map_err(|_| format!("Invalid --seed value: {value}"))?;
            }
            "--out" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--out requires a value".to_string())?;
                out = Some(PathBuf::from(value));
            }
            "--normalized" => {
                options.normalized = true;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok((options, out))
}

fn help_text() -> String {
    [
        "pricefit-gen",
        "",
        "Generates listings priced at size*4000 + bathrooms*10000 + bedrooms*15000 +/- 50000.",
        "",
        "Usage:",
        "  pricefit-gen [--rows <n>] [--seed <u64>] [--out <file>] [--normalized]",
        "",
        "Options:",
        "  --rows <n>       Listings to write (default: 100000).",
        "  --seed <u64>     RNG seed (default: 42).",
        "  --out <file>     Output path (default: stdout).",
        "  --normalized     Scale every column into 0..1 instead of raw units.",
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
    fn defaults_write_raw_rows_to_stdout() {
        let (options, out) = parse_args(Vec::new()).unwrap();
        assert_eq!(options, SynthOptions::default());
        assert!(out.is_none());
    }

    #[test]
    fn parses_every_flag() {
        let (options, out) = parse_args(args(&[
            "--rows",
            "250",
            "--seed",
            "9",
            "--out",
            "listings.csv",
            "--normalized",
        ]))
        .unwrap();
        assert_eq!(options.rows, 250);
        assert_eq!(options.seed, 9);
        assert!(options.normalized);
        assert_eq!(out, Some(PathBuf::from("listings.csv")));
    }

    #[test]
    fn rejects_bad_values() {
        assert_eq!(
            parse_args(args(&["--rows"])).unwrap_err(),
            "--rows requires a value"
        );
        assert!(parse_args(args(&["--seed", "-1"])).is_err());
        assert!(parse_args(args(&["--help"])).unwrap_err().starts_with("pricefit-gen"));
    }
}
