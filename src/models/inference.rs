//! Classifier backends producing P(hypertension)

use crate::error::{PredictionError, Result};
use crate::models::loader::LoadedModel;
use crate::types::prediction::FEATURE_COUNT;
use anyhow::{ensure, Context};
use ort::memory::Allocator;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// A loaded binary classifier.
pub trait RiskModel: Send + Sync {
    /// Name used in logs and health output
    fn name(&self) -> &str;

    /// Probability of the positive class for one feature row
    fn predict_proba(&self, features: &[f32]) -> Result<f64>;
}

/// ONNX classifier run through ONNX Runtime
pub struct OnnxModel {
    /// Session run needs exclusive access
    model: Mutex<LoadedModel>,
    name: String,
}

impl OnnxModel {
    pub fn new(model: LoadedModel) -> Self {
        let name = model.name.clone();
        Self {
            model: Mutex::new(model),
            name,
        }
    }

    /// Extract the positive-class probability from the session outputs.
    /// Handles plain tensor outputs as well as seq(map) outputs from zipmap exports.
    fn extract_probability(
        &self,
        outputs: &ort::session::SessionOutputs,
        output_name: &str,
    ) -> Result<f64> {
        if let Some(output) = outputs.get(output_name) {
            if let Some(prob) = self.probability_from_value(&output) {
                return Ok(prob);
            }
        }

        // Fall back to any output that is not the label
        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Some(prob) = self.probability_from_value(&output) {
                debug!(model = %self.name, output = %name, prob, "Extracted from fallback output");
                return Ok(prob);
            }
        }

        Err(PredictionError::Inference(format!(
            "model '{}' produced no probability output",
            self.name
        )))
    }

    fn probability_from_value(&self, output: &ort::value::DynValue) -> Option<f64> {
        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            return positive_prob_from_tensor(&dims, data);
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return self.extract_from_sequence_map(output).ok();
        }

        None
    }

    /// Read class 1 from seq(map(int64, float))
    fn extract_from_sequence_map(&self, output: &ort::value::DynValue) -> Result<f64> {
        let allocator = Allocator::default();

        let sequence = output
            .downcast_ref::<DynSequenceValueType>()
            .map_err(|e| PredictionError::Inference(format!("Failed to downcast to sequence: {}", e)))?;

        let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
        let map_value = maps
            .first()
            .ok_or_else(|| PredictionError::Inference("Empty sequence output".to_string()))?;

        let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

        positive_prob_from_class_map(&kv_pairs)
            .ok_or_else(|| PredictionError::Inference("No class probability in map output".to_string()))
    }
}

impl RiskModel for OnnxModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        use ort::value::Tensor;

        let mut model = self
            .model
            .lock()
            .map_err(|e| PredictionError::Inference(format!("Lock error: {}", e)))?;

        // Input tensor of shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))?;

        let input_name = model.input_name.clone();
        let output_name = model.output_name.clone();
        let outputs = model.session.run(ort::inputs![&input_name => input_tensor])?;

        self.extract_probability(&outputs, &output_name)
    }
}

/// Probability of class 1 from a [batch, classes] or [classes] tensor
fn positive_prob_from_tensor(dims: &[i64], data: &[f32]) -> Option<f64> {
    let classes = match dims {
        [_, classes] | [classes] => *classes,
        _ => return data.last().map(|&v| v as f64),
    };

    match classes {
        1 => data.first().map(|&v| v as f64),
        c if c >= 2 => data.get(1).map(|&v| v as f64),
        _ => None,
    }
}

/// Class 1 from a zipmap entry, else the complement of class 0
fn positive_prob_from_class_map(kv_pairs: &[(i64, f32)]) -> Option<f64> {
    if let Some((_, prob)) = kv_pairs.iter().find(|(class_id, _)| *class_id == 1) {
        return Some(*prob as f64);
    }
    kv_pairs
        .iter()
        .find(|(class_id, _)| *class_id == 0)
        .map(|(_, prob)| 1.0 - *prob as f64)
}

/// Logistic regression exported as plain coefficients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    #[serde(default = "default_logistic_name")]
    pub name: String,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

fn default_logistic_name() -> String {
    "logistic".to_string()
}

impl LogisticModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            name: default_logistic_name(),
            coefficients,
            intercept,
        }
    }

    /// Load coefficients from a JSON artifact
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model from {:?}", path))?;
        let model: LogisticModel = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse model {:?}", path))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.coefficients.len() == FEATURE_COUNT,
            "Model '{}' has {} coefficients, expected {}",
            self.name,
            self.coefficients.len(),
            FEATURE_COUNT
        );
        Ok(())
    }
}

impl RiskModel for LogisticModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.coefficients.len() {
            return Err(PredictionError::FeatureMismatch {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }

        let logit = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, &x)| c * x as f64)
                .sum::<f64>();

        Ok(1.0 / (1.0 + (-logit).exp()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logistic_probability() {
        let model = LogisticModel::new(vec![1.0, -1.0], 0.0);

        assert_eq!(model.predict_proba(&[2.0, 2.0]).unwrap(), 0.5);
        assert!(model.predict_proba(&[10.0, 0.0]).unwrap() > 0.99);
        assert!(model.predict_proba(&[0.0, 10.0]).unwrap() < 0.01);
    }

    #[test]
    fn test_logistic_feature_mismatch() {
        let model = LogisticModel::new(vec![1.0, -1.0], 0.0);
        let err = model.predict_proba(&[1.0, 2.0, 3.0]).unwrap_err();

        assert_eq!(
            err,
            PredictionError::FeatureMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_logistic_artifact_format() {
        let json = r#"{"coefficients": [0.5, 0.25], "intercept": -1.0}"#;
        let model: LogisticModel = serde_json::from_str(json).unwrap();

        assert_eq!(model.name(), "logistic");
        assert_eq!(model.coefficients, vec![0.5, 0.25]);
    }

    #[test]
    fn test_logistic_artifact_width_checked() {
        assert!(LogisticModel::new(vec![0.1; FEATURE_COUNT], 0.0).validate().is_ok());

        let path = std::env::temp_dir().join(format!("short-logistic-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"coefficients": [0.5, 0.25], "intercept": -1.0}"#).unwrap();
        let err = LogisticModel::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(err.to_string().contains("2 coefficients, expected 7"));
    }

    #[test]
    fn test_tensor_two_class_output() {
        assert_eq!(positive_prob_from_tensor(&[1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(positive_prob_from_tensor(&[2], &[0.25, 0.75]), Some(0.75));
    }

    #[test]
    fn test_tensor_single_column_output() {
        assert_eq!(positive_prob_from_tensor(&[1, 1], &[0.625]), Some(0.625));
        assert_eq!(positive_prob_from_tensor(&[1], &[0.625]), Some(0.625));
    }

    #[test]
    fn test_tensor_unexpected_shapes() {
        // Higher rank falls back to the last value
        assert_eq!(positive_prob_from_tensor(&[1, 1, 2], &[0.25, 0.75]), Some(0.75));
        assert_eq!(positive_prob_from_tensor(&[1, 1, 2], &[]), None);

        assert_eq!(positive_prob_from_tensor(&[1, 0], &[]), None);
        assert_eq!(positive_prob_from_tensor(&[1, 2], &[]), None);
        assert_eq!(positive_prob_from_tensor(&[1, 2], &[0.25]), None);
    }

    #[test]
    fn test_class_map_output() {
        assert_eq!(positive_prob_from_class_map(&[(0, 0.25), (1, 0.75)]), Some(0.75));
        assert_eq!(positive_prob_from_class_map(&[(1, 0.5)]), Some(0.5));
        assert_eq!(positive_prob_from_class_map(&[(0, 0.25)]), Some(0.75));
        assert_eq!(positive_prob_from_class_map(&[(2, 0.5)]), None);
        assert_eq!(positive_prob_from_class_map(&[]), None);
    }
}
