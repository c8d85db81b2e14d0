//! Preprocessing of raw form input into model-ready features.
//!
//! Mirrors the cleaning applied to the training frame: skew-aware
//! imputation, IQR capping, log1p on still-skewed columns and fixed
//! categorical codes. Statistics are computed per column over the records
//! passed in, so a single record only ever sees itself.

use crate::error::{PredictionError, Result};
use crate::stats;
use crate::types::prediction::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::types::record::{FieldValue, RawRecord, CATEGORICAL_FIELDS, NUMERIC_FIELDS};
use tracing::{debug, warn};

/// Fill value for missing categoricals when mode imputation is off
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Code for any category outside the lookup tables
pub const UNSEEN_CATEGORY_CODE: f64 = -1.0;

const FAMILY_HISTORY_CODES: [(&str, f64); 2] = [("Yes", 1.0), ("No", 0.0)];
const SMOKING_STATUS_CODES: [(&str, f64); 2] = [("Smoker", 1.0), ("Non-Smoker", 0.0)];

/// Plausible ranges per numeric field. Values outside are logged, never rejected.
pub const PHYSIOLOGICAL_RANGES: [(&str, f64, f64); 5] = [
    ("age", 0.0, 120.0),
    ("salt_intake", 0.0, 50.0),   // g/day
    ("stress_score", 0.0, 10.0),
    ("sleep_duration", 0.0, 24.0), // hours
    ("bmi", 10.0, 60.0),           // kg/m²
];

/// Preprocessing switches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessOptions {
    /// Fill missing categoricals with the column mode instead of "Unknown"
    pub impute_with_mode: bool,
    /// Clamp numeric columns to their IQR fences
    pub cap_outliers: bool,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            impute_with_mode: true,
            cap_outliers: true,
        }
    }
}

/// Turns raw records into feature vectors in the column order the model was
/// trained on.
#[derive(Debug, Clone, Default)]
pub struct Preprocessor {
    options: PreprocessOptions,
}

impl Preprocessor {
    pub fn new(options: PreprocessOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PreprocessOptions {
        &self.options
    }

    /// Preprocess a single record.
    pub fn preprocess(&self, record: &RawRecord) -> Result<FeatureVector> {
        let columns = self.transform_columns(std::slice::from_ref(record))?;
        Ok(row(&columns, 0))
    }

    /// Preprocess several records together; statistics span all of them.
    pub fn preprocess_batch(&self, records: &[RawRecord]) -> Result<Vec<FeatureVector>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let columns = self.transform_columns(records)?;
        Ok((0..records.len()).map(|i| row(&columns, i)).collect())
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        FEATURE_COUNT
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_NAMES.to_vec()
    }

    fn transform_columns(&self, records: &[RawRecord]) -> Result<[Vec<f64>; FEATURE_COUNT]> {
        for record in records {
            warn_out_of_range(record);
        }

        let [age, salt_intake, stress_score, sleep_duration, bmi] = NUMERIC_FIELDS;
        let [family_history, smoking_status] = CATEGORICAL_FIELDS;

        Ok([
            self.numeric_column(age, records)?,
            self.numeric_column(salt_intake, records)?,
            self.numeric_column(stress_score, records)?,
            self.numeric_column(sleep_duration, records)?,
            self.numeric_column(bmi, records)?,
            self.categorical_column(family_history, &FAMILY_HISTORY_CODES, records)?,
            self.categorical_column(smoking_status, &SMOKING_STATUS_CODES, records)?,
        ])
    }

    fn numeric_column(&self, field: &'static str, records: &[RawRecord]) -> Result<Vec<f64>> {
        let raw = records
            .iter()
            .map(|record| match record.get(field) {
                None => Ok(None),
                Some(value) => value.as_number().map(Some).ok_or_else(|| {
                    PredictionError::InvalidValue {
                        field,
                        value: value.to_string(),
                    }
                }),
            })
            .collect::<Result<Vec<Option<f64>>>>()?;

        let mut values = impute_numeric(field, &raw)?;

        if self.options.cap_outliers {
            cap_outliers(&mut values);
        }

        let skew = stats::skewness(&values);
        if skew.abs() > 1.0 {
            debug!(field, skew, "Applying log1p to skewed column");
            for value in values.iter_mut() {
                *value = value.ln_1p();
                if !value.is_finite() {
                    return Err(PredictionError::NonFinite { field });
                }
            }
        }

        Ok(values)
    }

    fn categorical_column(
        &self,
        field: &'static str,
        codes: &[(&str, f64)],
        records: &[RawRecord],
    ) -> Result<Vec<f64>> {
        let raw: Vec<Option<&FieldValue>> = records.iter().map(|r| r.get(field)).collect();

        let unknown = FieldValue::Text(UNKNOWN_CATEGORY.to_string());
        let fill = if raw.iter().any(Option::is_none) {
            if self.options.impute_with_mode {
                let mode = stats::mode(raw.iter().flatten().map(|v| (mode_key(v), *v)))
                    .ok_or(PredictionError::MissingValue { field })?;
                debug!(field, fill = %mode, "Imputed missing category with mode");
                mode
            } else {
                &unknown
            }
        } else {
            &unknown
        };

        Ok(raw
            .into_iter()
            .map(|value| encode(codes, value.unwrap_or(fill)))
            .collect())
    }
}

/// Numbers sort ahead of text; text compares as written.
fn mode_key(value: &FieldValue) -> (u8, String) {
    match value {
        FieldValue::Number(n) => (0, n.to_string()),
        FieldValue::Text(s) => (1, s.clone()),
    }
}

/// Fill gaps with the mean for roughly symmetric columns, the median otherwise.
fn impute_numeric(field: &'static str, raw: &[Option<f64>]) -> Result<Vec<f64>> {
    if raw.iter().all(Option::is_some) {
        return Ok(raw.iter().flatten().copied().collect());
    }

    let present: Vec<f64> = raw.iter().flatten().copied().collect();
    let skew = stats::skewness(&present);
    let fill = if skew.abs() < 1.0 {
        stats::mean(&present)
    } else {
        stats::median(&present)
    }
    .ok_or(PredictionError::MissingValue { field })?;

    debug!(field, skew, fill, "Imputed missing numeric values");
    Ok(raw.iter().map(|v| v.unwrap_or(fill)).collect())
}

fn cap_outliers(values: &mut [f64]) {
    if let Some((lower, upper)) = stats::iqr_bounds(values) {
        for value in values.iter_mut() {
            *value = value.clamp(lower, upper);
        }
    }
}

fn encode(codes: &[(&str, f64)], value: &FieldValue) -> f64 {
    value
        .as_text()
        .and_then(|text| codes.iter().find(|(label, _)| *label == text))
        .map(|(_, code)| *code)
        .unwrap_or(UNSEEN_CATEGORY_CODE)
}

fn row(columns: &[Vec<f64>; FEATURE_COUNT], index: usize) -> FeatureVector {
    FeatureVector::from_array(std::array::from_fn(|col| columns[col][index]))
}

/// Numeric fields whose present values fall outside `PHYSIOLOGICAL_RANGES`
pub fn out_of_range_fields(record: &RawRecord) -> Vec<&'static str> {
    PHYSIOLOGICAL_RANGES
        .iter()
        .filter(|(field, min, max)| {
            record
                .get(field)
                .and_then(FieldValue::as_number)
                .is_some_and(|v| v < *min || v > *max)
        })
        .map(|(field, _, _)| *field)
        .collect()
}

fn warn_out_of_range(record: &RawRecord) {
    for field in out_of_range_fields(record) {
        warn!(
            field,
            value = %record.get(field).map(ToString::to_string).unwrap_or_default(),
            "Value outside physiological range"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> RawRecord {
        RawRecord::new(45.0, 9.5, 7.0, 6.2, 28.1, "Yes", "Non-Smoker")
    }

    #[test]
    fn test_single_record_passes_through() {
        let preprocessor = Preprocessor::default();
        let features = preprocessor.preprocess(&sample_record()).unwrap();

        assert_eq!(
            features.to_array(),
            [45.0, 9.5, 7.0, 6.2, 28.1, 1.0, 0.0]
        );
    }

    #[test]
    fn test_encoding_happens_once() {
        let preprocessor = Preprocessor::default();

        let record = RawRecord::new(30.0, 5.0, 2.0, 8.0, 22.0, "No", "Smoker");
        let features = preprocessor.preprocess(&record).unwrap();
        assert_eq!(features.family_history, 0.0);
        assert_eq!(features.smoking_status, 1.0);

        // Feeding already-encoded codes back in is not an identity
        let mut reencoded = record.clone();
        reencoded.family_history = Some(FieldValue::Number(features.family_history));
        reencoded.smoking_status = Some(FieldValue::Number(features.smoking_status));
        let features = preprocessor.preprocess(&reencoded).unwrap();
        assert_eq!(features.family_history, UNSEEN_CATEGORY_CODE);
        assert_eq!(features.smoking_status, UNSEEN_CATEGORY_CODE);
    }

    #[test]
    fn test_unseen_category_encodes_to_minus_one() {
        let mut record = sample_record();
        record.family_history = Some("Maybe".into());
        record.smoking_status = Some("smoker".into());

        let features = Preprocessor::default().preprocess(&record).unwrap();
        assert_eq!(features.family_history, -1.0);
        assert_eq!(features.smoking_status, -1.0);
    }

    #[test]
    fn test_numeric_strings_accepted() {
        let mut record = sample_record();
        record.age = Some("45".into());

        let features = Preprocessor::default().preprocess(&record).unwrap();
        assert_eq!(features.age, 45.0);
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        let mut record = sample_record();
        record.bmi = Some("heavy".into());

        let err = Preprocessor::default().preprocess(&record).unwrap_err();
        assert_eq!(
            err,
            PredictionError::InvalidValue {
                field: "bmi",
                value: "\"heavy\"".to_string()
            }
        );
    }

    #[test]
    fn test_missing_numeric_in_single_record() {
        let mut record = sample_record();
        record.sleep_duration = None;

        let err = Preprocessor::default().preprocess(&record).unwrap_err();
        assert_eq!(err, PredictionError::MissingValue { field: "sleep_duration" });
    }

    #[test]
    fn test_missing_category_single_record() {
        let mut record = sample_record();
        record.smoking_status = None;

        // No other rows to take a mode from
        let err = Preprocessor::default().preprocess(&record).unwrap_err();
        assert_eq!(err, PredictionError::MissingValue { field: "smoking_status" });

        // Without mode imputation the gap becomes "Unknown"
        let preprocessor = Preprocessor::new(PreprocessOptions {
            impute_with_mode: false,
            cap_outliers: true,
        });
        let features = preprocessor.preprocess(&record).unwrap();
        assert_eq!(features.smoking_status, UNSEEN_CATEGORY_CODE);
    }

    #[test]
    fn test_out_of_range_not_enforced() {
        let record = RawRecord::new(150.0, 9.5, 7.0, 30.0, 28.1, "Yes", "Smoker");

        assert_eq!(out_of_range_fields(&record), vec!["age", "sleep_duration"]);

        let features = Preprocessor::default().preprocess(&record).unwrap();
        assert_eq!(features.age, 150.0);
        assert_eq!(features.sleep_duration, 30.0);
    }

    #[test]
    fn test_batch_mean_imputation() {
        let mut records = vec![
            RawRecord::new(40.0, 8.0, 5.0, 7.0, 25.0, "Yes", "Smoker"),
            RawRecord::new(50.0, 9.0, 6.0, 6.0, 27.0, "No", "Smoker"),
            RawRecord::new(60.0, 10.0, 7.0, 8.0, 29.0, "No", "Non-Smoker"),
            RawRecord::new(55.0, 9.0, 6.0, 7.0, 26.0, "Yes", "Non-Smoker"),
        ];
        records[3].age = None;

        let preprocessor = Preprocessor::new(PreprocessOptions {
            impute_with_mode: true,
            cap_outliers: false,
        });
        let features = preprocessor.preprocess_batch(&records).unwrap();

        // [40, 50, 60] is symmetric, so the mean fills the gap
        assert_eq!(features[3].age, 50.0);
    }

    #[test]
    fn test_batch_median_imputation_when_skewed() {
        let mut records: Vec<RawRecord> = [1.0, 2.0, 10.0, 0.0]
            .iter()
            .map(|&salt| RawRecord::new(40.0, salt, 5.0, 7.0, 25.0, "Yes", "Smoker"))
            .collect();
        records[3].salt_intake = None;

        let preprocessor = Preprocessor::new(PreprocessOptions {
            impute_with_mode: true,
            cap_outliers: false,
        });
        let features = preprocessor.preprocess_batch(&records).unwrap();

        // Skew of [1, 2, 10] is ~1.65, so the median (2) fills the gap.
        // The filled column [1, 2, 10, 2] is still skewed and gets log1p.
        assert!((features[3].salt_intake - 2f64.ln_1p()).abs() < 1e-12);
        assert!((features[2].salt_intake - 10f64.ln_1p()).abs() < 1e-12);
    }

    #[test]
    fn test_batch_mode_imputation() {
        let mut records = vec![
            RawRecord::new(40.0, 8.0, 5.0, 7.0, 25.0, "Yes", "Smoker"),
            RawRecord::new(50.0, 9.0, 6.0, 6.0, 27.0, "No", "Smoker"),
            RawRecord::new(60.0, 10.0, 7.0, 8.0, 29.0, "No", "Non-Smoker"),
        ];
        records[0].smoking_status = None;

        let features = Preprocessor::default().preprocess_batch(&records).unwrap();
        // Tie between "Non-Smoker" and "Smoker" goes to the smaller label
        assert_eq!(features[0].smoking_status, 0.0);
    }

    #[test]
    fn test_batch_mode_tie_on_raw_text() {
        let mut records = vec![
            RawRecord::new(40.0, 8.0, 5.0, 7.0, 25.0, "Yes!", "Smoker"),
            RawRecord::new(50.0, 9.0, 6.0, 6.0, 27.0, "Yes", "Smoker"),
            RawRecord::new(60.0, 10.0, 7.0, 8.0, 29.0, "No", "Smoker"),
        ];
        records[2].family_history = None;

        let features = Preprocessor::default().preprocess_batch(&records).unwrap();
        // "Yes" < "Yes!", so the gap takes the known label
        assert_eq!(features[2].family_history, 1.0);
        assert_eq!(features[0].family_history, -1.0);
    }

    #[test]
    fn test_batch_outlier_capping() {
        let bmis = [5.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 59.0];
        let records: Vec<RawRecord> = bmis
            .iter()
            .map(|&bmi| RawRecord::new(40.0, 8.0, 5.0, 7.0, bmi, "Yes", "Smoker"))
            .collect();

        let features = Preprocessor::default().preprocess_batch(&records).unwrap();

        // Q1 = 22.25, Q3 = 26.75, fences = [15.5, 33.5]
        assert!((features[0].bmi - 15.5).abs() < 1e-9);
        assert!((features[9].bmi - 33.5).abs() < 1e-9);
        assert_eq!(features[4].bmi, 24.0);
    }

    #[test]
    fn test_log_transform_domain_error() {
        let stress = [-5.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let records: Vec<RawRecord> = stress
            .iter()
            .map(|&s| RawRecord::new(40.0, 8.0, s, 7.0, 25.0, "Yes", "Smoker"))
            .collect();

        let preprocessor = Preprocessor::new(PreprocessOptions {
            impute_with_mode: true,
            cap_outliers: false,
        });
        let err = preprocessor.preprocess_batch(&records).unwrap_err();
        assert_eq!(err, PredictionError::NonFinite { field: "stress_score" });
    }

    #[test]
    fn test_feature_count() {
        let preprocessor = Preprocessor::default();
        assert_eq!(preprocessor.feature_count(), 7);
        assert_eq!(preprocessor.feature_names().len(), 7);
        assert!(preprocessor.preprocess_batch(&[]).unwrap().is_empty());
    }
}
