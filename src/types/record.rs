//! Raw input records as submitted by clients

use serde::{Deserialize, Serialize};

/// Numeric columns, in model input order
pub const NUMERIC_FIELDS: [&str; 5] = ["age", "salt_intake", "stress_score", "sleep_duration", "bmi"];

/// Categorical columns, in model input order (after the numeric ones)
pub const CATEGORICAL_FIELDS: [&str; 2] = ["family_history", "smoking_status"];

/// A single scalar value as it arrived on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Interpret the value as a finite number, accepting numeric strings.
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Text form, used for categorical lookups and error messages
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One patient record from the prediction form.
///
/// Absent keys and explicit `null`s are both treated as missing entries.
/// Keys outside the seven known fields are rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRecord {
    /// Age in years
    #[serde(default)]
    pub age: Option<FieldValue>,

    /// Daily salt intake in grams
    #[serde(default)]
    pub salt_intake: Option<FieldValue>,

    /// Self-reported stress on a 0-10 scale
    #[serde(default)]
    pub stress_score: Option<FieldValue>,

    /// Average sleep per night in hours
    #[serde(default)]
    pub sleep_duration: Option<FieldValue>,

    /// Body mass index (kg/m²)
    #[serde(default)]
    pub bmi: Option<FieldValue>,

    /// "Yes" / "No"
    #[serde(default)]
    pub family_history: Option<FieldValue>,

    /// "Smoker" / "Non-Smoker"
    #[serde(default)]
    pub smoking_status: Option<FieldValue>,
}

impl RawRecord {
    /// Build a fully populated record
    pub fn new(
        age: f64,
        salt_intake: f64,
        stress_score: f64,
        sleep_duration: f64,
        bmi: f64,
        family_history: &str,
        smoking_status: &str,
    ) -> Self {
        Self {
            age: Some(age.into()),
            salt_intake: Some(salt_intake.into()),
            stress_score: Some(stress_score.into()),
            sleep_duration: Some(sleep_duration.into()),
            bmi: Some(bmi.into()),
            family_history: Some(family_history.into()),
            smoking_status: Some(smoking_status.into()),
        }
    }

    /// Look up a field by column name
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        match field {
            "age" => self.age.as_ref(),
            "salt_intake" => self.salt_intake.as_ref(),
            "stress_score" => self.stress_score.as_ref(),
            "sleep_duration" => self.sleep_duration.as_ref(),
            "bmi" => self.bmi.as_ref(),
            "family_history" => self.family_history.as_ref(),
            "smoking_status" => self.smoking_status.as_ref(),
            _ => None,
        }
    }
}
