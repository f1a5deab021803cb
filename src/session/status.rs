use std::fmt;

use serde::Serialize;

/// Coarse state used to gate user actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    FileLoaded,
    Training,
    Trained,
}

/// Progress shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Status {
    Idle,
    Reading,
    Validated { valid: usize, rejected: usize },
    Training { epoch: usize, epochs: usize },
    Trained,
    Predicting,
    Predicted(String),
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Idle => f.write_str("Select a CSV file."),
            Status::Reading => f.write_str("Reading and validating CSV..."),
            Status::Validated { valid, rejected } => {
                write!(f, "{valid} valid | {rejected} skipped")
            }
            Status::Training { epoch: 0, .. } => f.write_str("Training model..."),
            Status::Training { epoch, epochs } => {
                write!(f, "Training model... epoch {epoch}/{epochs}")
            }
            Status::Trained => f.write_str("Model trained successfully!"),
            Status::Predicting => f.write_str("Predicting price..."),
            Status::Predicted(formatted) => write!(f, "Estimated price: {formatted}"),
            Status::Failed(message) => write!(f, "Error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_line_text() {
        assert_eq!(
            Status::Validated {
                valid: 38,
                rejected: 2
            }
            .to_string(),
            "38 valid | 2 skipped"
        );
        assert_eq!(
            Status::Training { epoch: 0, epochs: 50 }.to_string(),
            "Training model..."
        );
        assert_eq!(
            Status::Training { epoch: 7, epochs: 50 }.to_string(),
            "Training model... epoch 7/50"
        );
        assert_eq!(
            Status::Predicted("R$ 512.000,00".into()).to_string(),
            "Estimated price: R$ 512.000,00"
        );
        assert_eq!(Status::Failed("boom".into()).to_string(), "Error: boom");
    }
}
