use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pricefit::ingest::{FieldPatterns, ingest_text};
use pricefit::ml::{LinearTrainer, NormalizationPolicy, TrainOptions};
use pricefit::synthetic::{SynthOptions, write_listings};
use pricefit::training::{EpochControl, Trainer, TrainingSet};

const ROW_COUNT: usize = 10_000;

fn listings_csv(rows: usize) -> String {
    let mut buf = Vec::new();
    write_listings(
        &mut buf,
        &SynthOptions {
            rows,
            seed: 7,
            normalized: false,
        },
    )
    .expect("generate listings");
    String::from_utf8(buf).expect("utf8 csv")
}

fn bench_ingest(c: &mut Criterion) {
    let text = listings_csv(ROW_COUNT);
    let patterns = FieldPatterns::default();
    c.bench_with_input(BenchmarkId::new("ingest_text", ROW_COUNT), &text, |b, text| {
        b.iter(|| ingest_text(black_box(text), &patterns).expect("ingest"));
    });
}

fn bench_train(c: &mut Criterion) {
    let text = listings_csv(ROW_COUNT);
    let report = ingest_text(&text, &FieldPatterns::default()).expect("ingest");
    let set = TrainingSet::from_records(report.dataset.records(), &NormalizationPolicy::default());
    let trainer = LinearTrainer::new(TrainOptions {
        epochs: 5,
        ..TrainOptions::default()
    });
    c.bench_with_input(BenchmarkId::new("train_5_epochs", ROW_COUNT), &set, |b, set| {
        b.iter(|| {
            trainer
                .fit(black_box(set), &mut |_| EpochControl::Continue)
                .expect("fit")
        });
    });
}

criterion_group!(benches, bench_ingest, bench_train);
criterion_main!(benches);
