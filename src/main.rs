//! Command-line front end: load a listings CSV, train, report, chart and predict.

use std::path::PathBuf;
use std::time::Duration;

use pricefit::chart::{PngRenderer, save_board};
use pricefit::config::{self, AppSettings};
use pricefit::ingest::CanonicalField;
use pricefit::logging;
use pricefit::ml::LinearTrainer;
use pricefit::ml::linreg::{SavedModel, save_model};
use pricefit::prediction::PredictionInput;
use pricefit::session::{Session, SessionOptions, Status};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

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
    let settings = load_settings(&options)?;
    let currency = settings.currency;

    let mut session = Session::new(
        LinearTrainer::new(settings.training.clone()),
        PngRenderer::new(settings.charts),
        SessionOptions {
            fields: settings.fields.clone(),
            normalization: settings.normalization,
            currency,
        },
    );

    session
        .load_file(&options.csv)
        .map_err(|err| err.to_string())?;
    println!("{}", session.status());
    if let Some(report) = session.report() {
        let rejections = report.dataset.rejections();
        for entry in rejections.iter().take(options.show_rejected) {
            println!("{entry}");
        }
        if rejections.len() > options.show_rejected {
            println!(
                "... {} more skipped rows",
                rejections.len() - options.show_rejected
            );
        }
    }

    session.start_training().map_err(|err| err.to_string())?;
    println!("{}", session.status());
    let mut reported = 0usize;
    loop {
        let done = session.poll_training().map_err(|err| err.to_string())?;
        for sample in &session.losses()[reported..] {
            println!("epoch {:>4}  loss {:.6}", sample.epoch, sample.loss);
        }
        reported = session.losses().len();
        if done {
            break;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    println!("{}", session.status());

    if let Some(metrics) = session.metrics() {
        let summary = &metrics.summary;
        println!("mse:  {:.2}", summary.mse);
        println!("rmse: {}", currency.format(summary.rmse));
        println!("mae:  {}", currency.format(summary.mae));
        match summary.r2 {
            Some(r2) => println!("r2:   {r2:.4}"),
            None => println!("r2:   n/a"),
        }
        if metrics.undefined_price_per_area > 0 {
            println!(
                "price per m² undefined for {} listing(s) with zero size",
                metrics.undefined_price_per_area
            );
        }
    }

    if let Some(dir) = &options.charts {
        let written = save_board(session.board(), dir).map_err(|err| err.to_string())?;
        for path in written {
            println!("chart: {}", path.display());
        }
    }

    if let Some(path) = &options.model_out {
        let model = session
            .model()
            .ok_or_else(|| "No trained model to save".to_string())?;
        let mut saved = SavedModel::new(*model, *session.policy());
        saved.epochs = session.losses().len();
        saved.final_loss = session.losses().last().map(|sample| sample.loss);
        save_model(path, &saved).map_err(|err| err.to_string())?;
        println!("model: {}", path.display());
    }

    if let Some(input) = options.predict {
        session.set_input(CanonicalField::Size, input.size);
        session.set_input(CanonicalField::Bathrooms, input.bathrooms);
        session.set_input(CanonicalField::Bedrooms, input.bedrooms);
        let prediction = session.predict().map_err(|err| err.to_string())?;
        println!(
            "Predicted price for {} m², {} bathroom(s), {} bedroom(s): {}",
            input.size, input.bathrooms, input.bedrooms, prediction.formatted
        );
    }

    if let Status::Failed(message) = session.status() {
        return Err(message.clone());
    }
    Ok(())
}

fn load_settings(options: &CliOptions) -> Result<AppSettings, String> {
    let mut settings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let training = &mut settings.training;
    if let Some(epochs) = options.epochs {
        training.epochs = epochs;
    }
    if let Some(learning_rate) = options.learning_rate {
        training.learning_rate = learning_rate;
    }
    if let Some(batch_size) = options.batch_size {
        training.batch_size = batch_size.max(1);
    }
    if let Some(seed) = options.seed {
        training.seed = seed;
    }
    settings.validate()?;
    Ok(settings)
}

#[derive(Debug, Clone)]
struct CliOptions {
    csv: PathBuf,
    config: Option<PathBuf>,
    epochs: Option<usize>,
    learning_rate: Option<f64>,
    batch_size: Option<usize>,
    seed: Option<u64>,
    charts: Option<PathBuf>,
    model_out: Option<PathBuf>,
    predict: Option<PredictionInput>,
    show_rejected: usize,
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut csv: Option<PathBuf> = None;
    let mut config: Option<PathBuf> = None;
    let mut epochs = None;
    let mut learning_rate = None;
    let mut batch_size = None;
    let mut seed = None;
    let mut charts = None;
    let mut model_out = None;
    let mut predict = None;
    let mut show_rejected = 10usize;

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
            "--epochs" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--epochs requires a value".to_string())?;
                epochs = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --epochs value: {value}"))?,
                );
            }
            "--learning-rate" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--learning-rate requires a value".to_string())?;
                learning_rate = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("Invalid --learning-rate value: {value}"))?,
                );
            }
            "--batch-size" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--batch-size requires a value".to_string())?;
                batch_size = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid --batch-size value: {value}"))?,
                );
            }
            "--seed" => {
                idx += 1;
                let value = args.get(idx).ok_or_else(|| "--seed requires a value".to_string())?;
                seed = Some(
                    value
                        .parse::<u64>()
                        .map_err(|_| format!("Invalid --seed value: {value}"))?,
                );
            }
            "--charts" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--charts requires a value".to_string())?;
                charts = Some(PathBuf::from(value));
            }
            "--model-out" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--model-out requires a value".to_string())?;
                model_out = Some(PathBuf::from(value));
            }
            "--predict" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--predict requires a value".to_string())?;
                predict = Some(value.parse::<PredictionInput>()?);
            }
            "--show-rejected" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--show-rejected requires a value".to_string())?;
                show_rejected = value
                    .parse::<usize>()
                    .map_err(|_| format!("Invalid --show-rejected value: {value}"))?;
            }
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let csv = csv.ok_or_else(help_text)?;
    Ok(CliOptions {
        csv,
        config,
        epochs,
        learning_rate,
        batch_size,
        seed,
        charts,
        model_out,
        predict,
        show_rejected,
    })
}

fn help_text() -> String {
    [
        "pricefit",
        "",
        "Validates a listings CSV, trains a linear price model and reports on the fit.",
        "",
        "Usage:",
        "  pricefit --csv <file> [options]",
        "",
        "Options:",
        "  --csv <file>             Listings CSV with size, bathroom, bedroom and price columns (required).",
        "  --config <file>          Config TOML (default: config.toml in the app directory).",
        "  --epochs <n>             Epoch count (default: 50).",
        "  --learning-rate <f64>    Adam learning rate (default: 0.1).",
        "  --batch-size <n>         Mini-batch size (default: 32).",
        "  --seed <u64>             RNG seed (default: 42).",
        "  --charts <dir>           Write loss, fit, residual and price-per-area charts as PNG + JSON.",
        "  --model-out <file>       Save the trained model as JSON.",
        "  --predict <s,b,b>        Predict the price of one listing (size,bathrooms,bedrooms).",
        "  --show-rejected <n>      Skipped rows to print (default: 10).",
    ]
    .join("\n")
}
