//! Background training run streaming progress over a channel.

use std::{
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use super::{EpochControl, TrainError, Trainer, TrainingSample, TrainingSet};

/// Progress reported by the worker, in the order it happened.
#[derive(Debug)]
pub enum TrainingMessage<M> {
    Epoch(TrainingSample),
    Finished(Result<M, TrainError>),
}

/// Result of a non-blocking poll.
#[derive(Debug)]
pub enum JobPoll<M> {
    Message(TrainingMessage<M>),
    Pending,
    /// The worker exited without reporting completion.
    Disconnected,
}

/// Handle to an in-flight run.
///
/// Dropping the handle abandons the run: the worker stops at its next epoch
/// boundary because its sends start failing.
pub struct TrainingJob<M> {
    rx: Receiver<TrainingMessage<M>>,
    epochs: usize,
}

impl<M> TrainingJob<M> {
    /// Epoch count the run was configured with.
    pub fn epochs(&self) -> usize {
        self.epochs
    }

    pub fn poll(&self) -> JobPoll<M> {
        match self.rx.try_recv() {
            Ok(message) => JobPoll::Message(message),
            Err(TryRecvError::Empty) => JobPoll::Pending,
            Err(TryRecvError::Disconnected) => JobPoll::Disconnected,
        }
    }

    /// Block until the next message; `None` once the worker is gone.
    pub fn recv(&self) -> Option<TrainingMessage<M>> {
        self.rx.recv().ok()
    }
}

/// Run `trainer` over `set` on a worker thread.
pub fn spawn_training<T>(trainer: T, set: TrainingSet) -> TrainingJob<T::Model>
where
    T: Trainer + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let epochs = trainer.epochs();
    thread::spawn(move || {
        let mut on_epoch = |sample: TrainingSample| {
            if tx.send(TrainingMessage::Epoch(sample)).is_ok() {
                EpochControl::Continue
            } else {
                EpochControl::Stop
            }
        };
        let result = trainer.fit(&set, &mut on_epoch);
        if let Err(TrainError::Stopped { epoch }) = &result {
            tracing::debug!("Abandoned training run stopped after epoch {epoch}");
        }
        let _ = tx.send(TrainingMessage::Finished(result));
    });
    TrainingJob { rx, epochs }
}
