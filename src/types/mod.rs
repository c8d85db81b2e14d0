//! Type definitions for the hypertension risk service

pub mod prediction;
pub mod record;

pub use prediction::{FeatureVector, PredictionResponse, PredictionResult, RiskClass};
pub use record::{FieldValue, RawRecord};
