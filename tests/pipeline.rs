mod support;

use pricefit::chart::{ChartSlot, PngRenderer, save_board};
use pricefit::currency::CurrencyFormat;
use pricefit::ingest::CanonicalField;
use pricefit::ml::linreg::{SavedModel, load_model, save_model};
use pricefit::ml::{LinearTrainer, TrainOptions};
use pricefit::prediction::{PredictionInput, PredictionService};
use pricefit::session::{Session, SessionOptions, SessionState};
use support::write_listings_csv;

fn session(epochs: usize) -> Session<LinearTrainer, PngRenderer> {
    Session::new(
        LinearTrainer::new(TrainOptions {
            epochs,
            ..TrainOptions::default()
        }),
        PngRenderer::default(),
        SessionOptions::default(),
    )
}

#[test]
fn file_to_charts_model_and_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_listings_csv(dir.path(), "listings.csv", 400);

    let mut session = session(30);
    let summary = session.load_file(&csv).unwrap();
    assert_eq!(summary.valid, 400);
    assert_eq!(summary.rejected, 0);

    session.start_training().unwrap();
    session.finish_training().unwrap();
    assert_eq!(session.state(), SessionState::Trained);
    let losses = session.losses().to_vec();
    assert_eq!(losses.len(), 30);
    assert!(losses.last().unwrap().loss < losses[0].loss);
    let r2 = session.metrics().unwrap().summary.r2.unwrap();
    assert!(r2 > 0.5, "r2 = {r2}");

    let charts = dir.path().join("charts");
    let written = save_board(session.board(), &charts).unwrap();
    assert_eq!(written.len(), 4);
    for slot in ChartSlot::ALL {
        assert!(charts.join(format!("{}.png", slot.file_stem())).is_file());
        assert!(charts.join(format!("{}.json", slot.file_stem())).is_file());
    }

    let model_path = dir.path().join("model.json");
    let mut saved = SavedModel::new(*session.model().unwrap(), *session.policy());
    saved.epochs = losses.len();
    save_model(&model_path, &saved).unwrap();
    let loaded = load_model(&model_path).unwrap();
    assert_eq!(loaded, saved);

    let input = PredictionInput {
        size: 150.0,
        bathrooms: 2.0,
        bedrooms: 3.0,
    };
    let offline = PredictionService::new(loaded.normalization, CurrencyFormat::default())
        .predict(&loaded.model, &input);
    session.set_input(CanonicalField::Size, 150.0);
    session.set_input(CanonicalField::Bedrooms, 3.0);
    let online = session.predict().unwrap();
    assert_eq!(online.price, offline.price);
    assert_eq!(online.formatted, offline.formatted);
}

#[test]
fn mixed_file_reports_rejected_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mixed.csv");
    std::fs::write(
        &path,
        "Tamanho(m2), Banheiros ,QUARTOS,Preco,Bairro\n100,2,2,500000,Centro\nabc,2,2,500000,Sul\n80,1,,310000,Norte\n",
    )
    .unwrap();
    let mut session = session(5);
    let summary = session.load_file(&path).unwrap();
    assert_eq!((summary.valid, summary.rejected), (1, 2));
    let report = session.report().unwrap();
    let lines: Vec<usize> = report
        .dataset
        .rejections()
        .iter()
        .map(|entry| entry.line_number())
        .collect();
    assert_eq!(lines, vec![3, 4]);
    assert!(
        report.dataset.rejections()[0]
            .to_string()
            .starts_with("Line 3 skipped: {")
    );
}
