//! Scoring service: preprocess, optionally scale, run the model, threshold.

use crate::error::{PredictionError, Result};
use crate::models::{Artifacts, RiskModel, StandardScaler};
use crate::preprocessor::Preprocessor;
use crate::types::prediction::PredictionResult;
use crate::types::record::RawRecord;
use std::sync::Arc;
use tracing::debug;

/// Default decision threshold on P(hypertension)
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Holds the loaded artifacts and turns raw records into risk decisions.
///
/// Built once at startup and shared read-only between requests.
pub struct Predictor {
    preprocessor: Preprocessor,
    model: Arc<dyn RiskModel>,
    /// Applied only when present
    scaler: Option<StandardScaler>,
    /// A scaler artifact was loaded, whether or not it is applied
    scaler_loaded: bool,
    threshold: f64,
}

impl Predictor {
    /// Create a predictor that feeds unscaled features to the model
    pub fn new(preprocessor: Preprocessor, model: Arc<dyn RiskModel>) -> Self {
        Self {
            preprocessor,
            model,
            scaler: None,
            scaler_loaded: false,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Build from loaded artifacts; the scaler is used only if `apply_scaler` is set
    pub fn from_artifacts(
        preprocessor: Preprocessor,
        artifacts: Artifacts,
        apply_scaler: bool,
        threshold: f64,
    ) -> Self {
        let scaler_loaded = artifacts.scaler.is_some();
        let scaler = if apply_scaler { artifacts.scaler } else { None };
        let mut predictor = Self::new(preprocessor, artifacts.model)
            .with_scaler(scaler)
            .with_threshold(threshold);
        predictor.scaler_loaded = scaler_loaded;
        predictor
    }

    pub fn with_scaler(mut self, scaler: Option<StandardScaler>) -> Self {
        self.scaler_loaded = scaler.is_some();
        self.scaler = scaler;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn scales_features(&self) -> bool {
        self.scaler.is_some()
    }

    pub fn scaler_loaded(&self) -> bool {
        self.scaler_loaded
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Score one record. Fails atomically; no partial result is produced.
    pub fn predict(&self, record: &RawRecord) -> Result<PredictionResult> {
        let mut features = self.preprocessor.preprocess(record)?;

        if let Some(scaler) = &self.scaler {
            features = scaler.transform(&features)?;
        }

        let probability = self.model.predict_proba(&features.to_f32())?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(PredictionError::Inference(format!(
                "model '{}' returned probability {} outside [0, 1]",
                self.model.name(),
                probability
            )));
        }

        let result = PredictionResult::from_probability(probability, self.threshold);

        debug!(
            model = %self.model.name(),
            probability,
            prediction = result.predicted_class.as_label(),
            "Prediction complete"
        );

        Ok(result)
    }
}
