//! Hypertension Risk Service Library
//!
//! Scores hypertension risk for a single patient record with a pre-trained
//! binary classifier. Raw form input is cleaned and encoded into the feature
//! layout the model was trained on, then thresholded into a risk decision.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod predictor;
pub mod preprocessor;
pub mod server;
pub mod stats;
pub mod types;

pub use config::AppConfig;
pub use error::PredictionError;
pub use models::{LogisticModel, ModelLoader, OnnxModel, RiskModel, StandardScaler};
pub use predictor::Predictor;
pub use preprocessor::{PreprocessOptions, Preprocessor};
pub use types::{FeatureVector, PredictionResponse, PredictionResult, RawRecord, RiskClass};
