//! Error types for dataset access and evaluation.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom error.
pub type Result<T> = std::result::Result<T, VqaError>;

/// Errors that can occur while loading VQA files or scoring results.
#[derive(Error, Debug)]
pub enum VqaError {
    /// Error reading or writing files.
    #[error("I/O error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error during serialization/deserialization.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The result file is not a JSON array of predictions.
    #[error("Results are not an array of objects: {0}")]
    ResultsNotArray(String),

    /// The predicted question ids do not match the annotated question ids.
    #[error(
        "Results do not correspond to the current VQA set: {missing} annotated question(s) have no prediction, {unexpected} prediction(s) do not belong to the annotation file"
    )]
    ResultsMismatch { missing: usize, unexpected: usize },

    /// A question id appears more than once in the result file.
    #[error("Duplicate prediction for question {0}")]
    DuplicatePrediction(u64),

    /// A multiple-choice prediction is not one of the offered choices.
    #[error("Predicted answer '{answer}' for question {question_id} is not one of the multiple choices")]
    InvalidChoice { question_id: u64, answer: String },

    /// No ground truth or question entry for the requested id.
    #[error("Question {0} not found in the annotation set")]
    QuestionNotFound(u64),

    /// No prediction for the requested id.
    #[error("No prediction for question {0}")]
    PredictionNotFound(u64),

    /// Ground truth is required but the store was opened without annotations.
    #[error("Ground truth annotations are required: {0}")]
    MissingGroundTruth(String),

    /// The operation needs annotations and the store is in questions-only mode.
    #[error("'{0}' is not available when only questions are loaded")]
    TestMode(&'static str),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl VqaError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for VqaError {
    fn from(err: serde_json::Error) -> Self {
        VqaError::Serialization(err.to_string())
    }
}
