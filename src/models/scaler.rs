//! Fitted standard scaler artifact

use crate::error::{PredictionError, Result};
use crate::types::prediction::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Per-column standardization, `(x - mean) / scale`.
///
/// Stored as JSON exported from the training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column names, must match the model input order
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Load and validate a scaler artifact.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scaler from {:?}", path))?;
        let scaler: StandardScaler = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse scaler {:?}", path))?;
        scaler.validate()?;
        Ok(scaler)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.mean.len() == FEATURE_COUNT && self.scale.len() == FEATURE_COUNT,
            "Scaler has {} means and {} scales, expected {}",
            self.mean.len(),
            self.scale.len(),
            FEATURE_COUNT
        );
        ensure!(
            self.feature_names.iter().map(String::as_str).eq(FEATURE_NAMES),
            "Scaler feature order {:?} does not match {:?}",
            self.feature_names,
            FEATURE_NAMES
        );
        Ok(())
    }

    /// Standardize one feature vector. A zero scale leaves the column centered only.
    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        for len in [self.mean.len(), self.scale.len()] {
            if len != FEATURE_COUNT {
                return Err(PredictionError::FeatureMismatch {
                    expected: FEATURE_COUNT,
                    actual: len,
                });
            }
        }

        let values = features.to_array();
        let mut scaled = [0.0; FEATURE_COUNT];

        for (i, value) in values.iter().enumerate() {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            scaled[i] = (value - self.mean[i]) / scale;
            if !scaled[i].is_finite() {
                return Err(PredictionError::NonFinite {
                    field: FEATURE_NAMES[i],
                });
            }
        }

        Ok(FeatureVector::from_array(scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scaler() -> StandardScaler {
        StandardScaler {
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            mean: vec![50.0, 8.0, 5.0, 7.0, 27.0, 0.5, 0.5],
            scale: vec![10.0, 2.0, 2.5, 1.0, 4.0, 0.5, 0.0],
        }
    }

    #[test]
    fn test_transform() {
        let features = FeatureVector::from_array([60.0, 9.0, 5.0, 6.0, 31.0, 1.0, 0.0]);
        let scaled = scaler().transform(&features).unwrap();

        assert_eq!(scaled.to_array(), [1.0, 0.5, 0.0, -1.0, 1.0, 1.0, -0.5]);
    }

    #[test]
    fn test_transform_short_scaler() {
        let mut short = scaler();
        short.mean.truncate(3);
        short.scale.truncate(3);

        let features = FeatureVector::from_array([60.0, 9.0, 5.0, 6.0, 31.0, 1.0, 0.0]);
        assert_eq!(
            short.transform(&features).unwrap_err(),
            PredictionError::FeatureMismatch {
                expected: FEATURE_COUNT,
                actual: 3
            }
        );
    }

    #[test]
    fn test_validation() {
        assert!(scaler().validate().is_ok());

        let mut short = scaler();
        short.scale.pop();
        assert!(short.validate().is_err());

        let mut reordered = scaler();
        reordered.feature_names.swap(0, 1);
        assert!(reordered.validate().is_err());
    }
}
