//! Model-ready features and prediction outcomes

use serde::{Deserialize, Serialize};

/// Number of model input columns
pub const FEATURE_COUNT: usize = 7;

/// Column order expected by the trained model
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "age",
    "salt_intake",
    "stress_score",
    "sleep_duration",
    "bmi",
    "family_history",
    "smoking_status",
];

/// Fully numeric, imputed and encoded record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age: f64,
    pub salt_intake: f64,
    pub stress_score: f64,
    pub sleep_duration: f64,
    pub bmi: f64,
    /// 1 = Yes, 0 = No, -1 = unseen
    pub family_history: f64,
    /// 1 = Smoker, 0 = Non-Smoker, -1 = unseen
    pub smoking_status: f64,
}

impl FeatureVector {
    /// Values in `FEATURE_NAMES` order
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age,
            self.salt_intake,
            self.stress_score,
            self.sleep_duration,
            self.bmi,
            self.family_history,
            self.smoking_status,
        ]
    }

    /// Model input tensor row
    pub fn to_f32(&self) -> Vec<f32> {
        self.to_array().iter().map(|&v| v as f32).collect()
    }

    pub fn from_array(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            age: values[0],
            salt_intake: values[1],
            stress_score: values[2],
            sleep_duration: values[3],
            bmi: values[4],
            family_history: values[5],
            smoking_status: values[6],
        }
    }
}

/// Binary risk decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskClass {
    Low,
    High,
}

impl RiskClass {
    /// Threshold a positive-class probability; the boundary belongs to `High`.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            RiskClass::High
        } else {
            RiskClass::Low
        }
    }

    pub fn as_label(&self) -> u8 {
        match self {
            RiskClass::Low => 0,
            RiskClass::High => 1,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RiskClass::Low => "Low risk of hypertension",
            RiskClass::High => "High risk of hypertension - consult a doctor",
        }
    }
}

/// Outcome of scoring one record
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// P(hypertension), 0.0 - 1.0
    pub probability: f64,
    pub predicted_class: RiskClass,
    /// Probability scaled to 0-100, rounded to 3 decimals
    pub risk_percent: f64,
    pub message: &'static str,
}

impl PredictionResult {
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        let predicted_class = RiskClass::from_probability(probability, threshold);
        Self {
            probability,
            predicted_class,
            risk_percent: round_to(probability * 100.0, 3),
            message: predicted_class.message(),
        }
    }

    /// Body returned by `POST /predict`
    pub fn to_response(&self) -> PredictionResponse {
        PredictionResponse {
            prediction: self.predicted_class.as_label(),
            risk_percent: self.risk_percent,
            message: self.message.to_string(),
        }
    }
}

/// Wire format of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: u8,
    pub risk_percent: f64,
    pub message: String,
}

/// Round to `decimals` places on the exact binary value, ties to even.
fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
