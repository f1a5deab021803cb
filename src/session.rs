//! Session context driving one file from load through training to prediction.
//!
//! All mutation goes through `&mut self` event methods on the owning thread.
//! Training results arrive as channel messages and are applied in order.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use crate::chart::{
    ChartBoard, ChartSlot, RenderError, Renderer, actual_vs_predicted_chart, loss_chart,
    price_per_area_chart, residuals_chart,
};
use crate::currency::CurrencyFormat;
use crate::ingest::{
    self, CanonicalField, CsvError, DatasetSummary, FieldPatterns, IngestReport, ParsedCsv,
};
use crate::ml::metrics::{DerivedMetrics, derive_metrics};
use crate::ml::normalization::NormalizationPolicy;
use crate::prediction::{Prediction, PredictionInput, PredictionService};
use crate::training::{
    JobPoll, TrainError, Trainer, TrainingJob, TrainingMessage, TrainingSample, TrainingSet,
    spawn_training,
};

mod status;

pub use status::{SessionState, Status};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No valid records to train on")]
    EmptyDataset,
    #[error("No trained model available")]
    ModelNotReady,
    #[error("Training is already running")]
    TrainingInProgress,
    #[error("Training worker exited without a result")]
    WorkerLost,
    #[error(transparent)]
    Csv(#[from] CsvError),
    #[error("Training failed: {0}")]
    Train(#[from] TrainError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Settings a session is built with.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub fields: FieldPatterns,
    pub normalization: NormalizationPolicy,
    pub currency: CurrencyFormat,
}

pub struct Session<T, R>
where
    T: Trainer + Clone + Send + 'static,
    R: Renderer,
{
    trainer: T,
    fields: FieldPatterns,
    policy: NormalizationPolicy,
    predictor: PredictionService,
    state: SessionState,
    status: Status,
    report: Option<IngestReport>,
    job: Option<TrainingJob<T::Model>>,
    model: Option<T::Model>,
    losses: Vec<TrainingSample>,
    metrics: Option<DerivedMetrics>,
    board: ChartBoard<R>,
    input: PredictionInput,
    prediction: Option<Prediction>,
}

impl<T, R> Session<T, R>
where
    T: Trainer + Clone + Send + 'static,
    R: Renderer,
{
    pub fn new(trainer: T, renderer: R, options: SessionOptions) -> Self {
        Self {
            trainer,
            fields: options.fields.normalized(),
            policy: options.normalization,
            predictor: PredictionService::new(options.normalization, options.currency),
            state: SessionState::Idle,
            status: Status::Idle,
            report: None,
            job: None,
            model: None,
            losses: Vec::new(),
            metrics: None,
            board: ChartBoard::new(renderer),
            input: PredictionInput::default(),
            prediction: None,
        }
    }

    /// Replace the dataset with the contents of `text`.
    pub fn load_csv(&mut self, text: &str) -> Result<DatasetSummary, SessionError> {
        self.begin_load();
        let parsed = ingest::parse_csv(text);
        self.finish_load(parsed)
    }

    /// Replace the dataset with the contents of the file at `path`.
    pub fn load_file(&mut self, path: &Path) -> Result<DatasetSummary, SessionError> {
        self.begin_load();
        info!("Loading {}", path.display());
        let parsed = ingest::read_csv_file(path);
        self.finish_load(parsed)
    }

    fn begin_load(&mut self) {
        self.invalidate();
        self.report = None;
        self.state = SessionState::Idle;
        self.status = Status::Reading;
    }

    fn finish_load(
        &mut self,
        parsed: Result<ParsedCsv, CsvError>,
    ) -> Result<DatasetSummary, SessionError> {
        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(err) => {
                self.status = Status::Failed(err.to_string());
                return Err(err.into());
            }
        };
        let report = ingest::ingest_parsed(&parsed, &self.fields);
        let summary = report.dataset.summary();
        self.report = Some(report);
        self.state = SessionState::FileLoaded;
        self.status = Status::Validated {
            valid: summary.valid,
            rejected: summary.rejected,
        };
        Ok(summary)
    }

    /// Drop every artifact derived from the current dataset.
    fn invalidate(&mut self) {
        if self.job.take().is_some() {
            info!("Abandoning training run");
        }
        self.model = None;
        self.losses.clear();
        self.metrics = None;
        self.prediction = None;
        self.board.clear();
    }

    pub fn can_train(&self) -> bool {
        matches!(
            self.state,
            SessionState::FileLoaded | SessionState::Trained
        ) && self
            .report
            .as_ref()
            .is_some_and(|report| !report.dataset.is_empty())
    }

    /// Start a run on the current dataset. Retraining from `Trained` is allowed.
    pub fn start_training(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Training {
            return Err(SessionError::TrainingInProgress);
        }
        let records = match &self.report {
            Some(report) if !report.dataset.is_empty() => report.dataset.records(),
            _ => {
                warn!("Refusing to train: no valid records");
                self.status = Status::Failed(SessionError::EmptyDataset.to_string());
                return Err(SessionError::EmptyDataset);
            }
        };
        let set = TrainingSet::from_records(records, &self.policy);
        self.invalidate();
        let job = spawn_training(self.trainer.clone(), set);
        info!(
            "Training on {} records for {} epochs",
            self.report.as_ref().map_or(0, |r| r.dataset.summary().valid),
            job.epochs()
        );
        self.status = Status::Training {
            epoch: 0,
            epochs: job.epochs(),
        };
        self.job = Some(job);
        self.state = SessionState::Training;
        Ok(())
    }

    /// Apply every message already waiting. Returns `true` once trained.
    pub fn poll_training(&mut self) -> Result<bool, SessionError> {
        loop {
            let Some(job) = &self.job else {
                return Ok(self.state == SessionState::Trained);
            };
            match job.poll() {
                JobPoll::Message(message) => self.apply(message)?,
                JobPoll::Pending => return Ok(false),
                JobPoll::Disconnected => return Err(self.worker_lost()),
            }
        }
    }

    /// Block until the current run finishes.
    pub fn finish_training(&mut self) -> Result<(), SessionError> {
        loop {
            let Some(job) = &self.job else {
                return if self.state == SessionState::Trained {
                    Ok(())
                } else {
                    Err(SessionError::ModelNotReady)
                };
            };
            match job.recv() {
                Some(message) => self.apply(message)?,
                None => return Err(self.worker_lost()),
            }
        }
    }

    fn worker_lost(&mut self) -> SessionError {
        self.job = None;
        self.state = SessionState::FileLoaded;
        self.status = Status::Failed(SessionError::WorkerLost.to_string());
        SessionError::WorkerLost
    }

    fn apply(&mut self, message: TrainingMessage<T::Model>) -> Result<(), SessionError> {
        match message {
            TrainingMessage::Epoch(sample) => {
                self.losses.push(sample);
                let epochs = self.job.as_ref().map_or(sample.epoch, TrainingJob::epochs);
                self.status = Status::Training {
                    epoch: sample.epoch,
                    epochs,
                };
                self.board
                    .show(ChartSlot::Loss, &loss_chart(&self.losses))?;
                Ok(())
            }
            TrainingMessage::Finished(Ok(model)) => {
                self.job = None;
                self.install_model(model)
            }
            TrainingMessage::Finished(Err(err)) => {
                self.job = None;
                self.state = SessionState::FileLoaded;
                self.status = Status::Failed(err.to_string());
                Err(err.into())
            }
        }
    }

    fn install_model(&mut self, model: T::Model) -> Result<(), SessionError> {
        let records = self
            .report
            .as_ref()
            .map(|report| report.dataset.records())
            .unwrap_or_default();
        let metrics = derive_metrics(&model, &self.policy, records);
        info!(
            "Training finished: rmse {:.2}, mae {:.2}, r2 {}",
            metrics.summary.rmse,
            metrics.summary.mae,
            metrics
                .summary
                .r2
                .map_or_else(|| "n/a".to_string(), |r2| format!("{r2:.4}"))
        );
        self.model = Some(model);
        self.state = SessionState::Trained;
        self.status = Status::Trained;
        self.board.show(
            ChartSlot::ActualVsPredicted,
            &actual_vs_predicted_chart(&metrics),
        )?;
        self.board
            .show(ChartSlot::Residuals, &residuals_chart(&metrics))?;
        self.board.show(
            ChartSlot::PricePerArea,
            &price_per_area_chart(&metrics),
        )?;
        self.metrics = Some(metrics);
        Ok(())
    }

    /// Edit one field of the prediction input.
    pub fn set_input(&mut self, field: CanonicalField, value: f64) {
        if field == CanonicalField::Price {
            warn!("Price is not a prediction input");
            return;
        }
        self.input.set(field, value);
    }

    pub fn can_predict(&self) -> bool {
        self.state == SessionState::Trained && self.model.is_some()
    }

    pub fn predict(&mut self) -> Result<&Prediction, SessionError> {
        let model = match (&self.model, self.state) {
            (Some(model), SessionState::Trained) => model,
            _ => return Err(SessionError::ModelNotReady),
        };
        self.status = Status::Predicting;
        let prediction = self.predictor.predict(model, &self.input);
        info!(
            "Predicted {} for size {}, {} bathrooms, {} bedrooms",
            prediction.formatted, self.input.size, self.input.bathrooms, self.input.bedrooms
        );
        self.status = Status::Predicted(prediction.formatted.clone());
        Ok(self.prediction.insert(prediction))
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn report(&self) -> Option<&IngestReport> {
        self.report.as_ref()
    }

    pub fn losses(&self) -> &[TrainingSample] {
        &self.losses
    }

    pub fn metrics(&self) -> Option<&DerivedMetrics> {
        self.metrics.as_ref()
    }

    pub fn model(&self) -> Option<&T::Model> {
        self.model.as_ref()
    }

    pub fn board(&self) -> &ChartBoard<R> {
        &self.board
    }

    pub fn input(&self) -> &PredictionInput {
        &self.input
    }

    pub fn prediction(&self) -> Option<&Prediction> {
        self.prediction.as_ref()
    }

    pub fn policy(&self) -> &NormalizationPolicy {
        &self.policy
    }
}
