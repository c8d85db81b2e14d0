//! Failure taxonomy for preprocessing and inference

/// Any reason a record could not be scored.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Invalid value for '{field}': {value} is not a number")]
    InvalidValue { field: &'static str, value: String },

    #[error("Missing value for '{field}' and no other rows to impute from")]
    MissingValue { field: &'static str },

    #[error("Transform produced a non-finite value for '{field}'")]
    NonFinite { field: &'static str },

    #[error("Model expects {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl PredictionError {
    /// Whether the caller's input, rather than the model, caused the failure
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PredictionError::InvalidValue { .. }
                | PredictionError::MissingValue { .. }
                | PredictionError::NonFinite { .. }
        )
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::InvalidValue { .. } => "invalid_value",
            PredictionError::MissingValue { .. } => "missing_value",
            PredictionError::NonFinite { .. } => "non_finite",
            PredictionError::FeatureMismatch { .. } => "feature_mismatch",
            PredictionError::Inference(_) => "inference",
        }
    }
}

impl From<ort::Error> for PredictionError {
    fn from(e: ort::Error) -> Self {
        PredictionError::Inference(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;
