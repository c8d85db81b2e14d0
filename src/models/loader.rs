//! Startup loading of the model and scaler artifacts

use crate::config::{ModelBackend, ModelsConfig};
use crate::models::inference::{LogisticModel, OnnxModel, RiskModel};
use crate::models::scaler::StandardScaler;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Loaded ONNX session with its tensor names
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input name for the model
    pub input_name: String,
    /// Output name for probabilities
    pub output_name: String,
}

/// Everything the predictor needs, loaded once before serving
pub struct Artifacts {
    pub model: Arc<dyn RiskModel>,
    pub scaler: Option<StandardScaler>,
}

/// Loader for the classifier and scaler files
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    /// Create a new model loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self { onnx_threads }
    }

    /// Load the configured model backend and, if present, the scaler.
    pub fn load(&self, config: &ModelsConfig) -> Result<Artifacts> {
        let model: Arc<dyn RiskModel> = match config.backend {
            ModelBackend::Onnx => Arc::new(self.load_onnx(&config.model_path, "hypertension")?),
            ModelBackend::Logistic => {
                let model = LogisticModel::from_file(&config.model_path)?;
                info!(
                    model = %model.name,
                    coefficients = model.coefficients.len(),
                    "Logistic model loaded"
                );
                Arc::new(model)
            }
        };

        let scaler = match &config.scaler_path {
            Some(path) => {
                let scaler = StandardScaler::from_file(path)?;
                info!(path = %path, "Scaler loaded");
                Some(scaler)
            }
            None => None,
        };

        Ok(Artifacts { model, scaler })
    }

    /// Load an ONNX classifier from file
    pub fn load_onnx<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxModel> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx classifiers expose "output_label" and "output_probability"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_probability".to_string());

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxModel::new(LoadedModel {
            name: name.to_string(),
            session,
            input_name,
            output_name,
        }))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn test_load_logistic_with_scaler() {
        let config = ModelsConfig {
            model_path: fixture("hypertension_logistic.json"),
            scaler_path: Some(fixture("hypertension_scaler.json")),
            backend: ModelBackend::Logistic,
            onnx_threads: 1,
        };

        let artifacts = ModelLoader::new().load(&config).unwrap();
        assert_eq!(artifacts.model.name(), "hypertension-logistic-v1");
        assert!(artifacts.scaler.is_some());
    }

    #[test]
    fn test_missing_artifact_fails() {
        let config = ModelsConfig {
            model_path: fixture("does_not_exist.json"),
            scaler_path: None,
            backend: ModelBackend::Logistic,
            onnx_threads: 1,
        };

        let err = ModelLoader::new().load(&config).err().unwrap();
        assert!(err.to_string().contains("Failed to read model"));
    }
}
