//! Prices one listing with a model saved by `pricefit --model-out`.

use std::path::PathBuf;

use pricefit::currency::{CurrencyFormat, CurrencyLocale};
use pricefit::logging;
use pricefit::ml::linreg::load_model;
use pricefit::prediction::{PredictionInput, PredictionService};

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
    let saved = load_model(&options.model).map_err(|err| err.to_string())?;
    let service = PredictionService::new(saved.normalization, CurrencyFormat::new(options.locale));
    let prediction = service.predict(&saved.model, &options.input);
    println!("{}", prediction.formatted);
    Ok(())
}

#[derive(Debug, Clone)]
struct CliOptions {
    model: PathBuf,
    input: PredictionInput,
    locale: CurrencyLocale,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut model: Option<PathBuf> = None;
    let mut input: Option<PredictionInput> = None;
    let mut locale = CurrencyLocale::default();

    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--model" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--model requires a value".to_string())?;
                model = Some(PathBuf::from(value));
            }
            "--input" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--input requires a value".to_string())?;
                input = Some(value.parse::<PredictionInput>()?);
            }
            "--locale" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--locale requires a value".to_string())?;
                locale = CurrencyLocale::parse(value)
                    .ok_or_else(|| format!("Unsupported --locale value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let model = model.ok_or_else(help_text)?;
    let input = input.ok_or_else(help_text)?;
    Ok(CliOptions {
        model,
        input,
        locale,
    })
}

fn help_text() -> String {
    [
        "pricefit-predict",
        "",
        "Predicts a listing price from a saved model.",
        "",
        "Usage:",
        "  pricefit-predict --model <file> --input <size,bathrooms,bedrooms> [--locale pt-BR|en-US]",
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
    fn parses_model_input_and_locale() {
        let options = parse_args(args(&[
            "--model",
            "model.json",
            "--input",
            "120,2,3",
            "--locale",
            "en-US",
        ]))
        .unwrap();
        assert_eq!(options.model, PathBuf::from("model.json"));
        assert_eq!(options.input.size, 120.0);
        assert_eq!(options.input.bathrooms, 2.0);
        assert_eq!(options.input.bedrooms, 3.0);
        assert_eq!(options.locale, CurrencyLocale::EnUs);
    }

    #[test]
    fn model_and_input_are_required() {
        assert!(
            parse_args(args(&["--input", "120,2,3"]))
                .unwrap_err()
                .starts_with("pricefit-predict")
        );
        assert!(
            parse_args(args(&["--model", "model.json"]))
                .unwrap_err()
                .starts_with("pricefit-predict")
        );
        assert!(
            parse_args(args(&["--model", "m.json", "--input", "1,2,3", "--locale", "fr-FR"]))
                .unwrap_err()
                .starts_with("Unsupported --locale value")
        );
    }
}
