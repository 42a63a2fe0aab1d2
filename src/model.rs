use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// One rater's result file as written by the classification driver.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RaterResultFile {
    #[serde(default)]
    pub classifications: Vec<RawClassification>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClassification {
    #[serde(default, alias = "item_id")]
    pub table_name: Option<String>,
    #[serde(default, alias = "group_key")]
    pub schema: Option<String>,
    #[serde(default, alias = "score")]
    pub score_relevancia: Option<Value>,
    #[serde(default, alias = "justification")]
    pub justificativa: Option<String>,
    #[serde(default, alias = "contributing_columns")]
    pub colunas_contribuintes: Option<Vec<String>>,
}

/// A classification entry after load-time defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct RaterRecord {
    pub item_id: String,
    pub group_key: Option<String>,
    pub score: Option<f64>,
    pub justification: Option<String>,
    pub contributing_columns: Vec<String>,
}

impl RawClassification {
    /// Applies the defaulting rules; entries without an item id yield `None`.
    pub fn into_record(self) -> Option<RaterRecord> {
        let item_id = self
            .table_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())?;

        let score = score_from_raw(&item_id, self.score_relevancia);

        Some(RaterRecord {
            item_id,
            group_key: self.schema.filter(|schema| !schema.trim().is_empty()),
            score,
            justification: self.justificativa,
            contributing_columns: self.colunas_contribuintes.unwrap_or_default(),
        })
    }
}

/// Only an absent or `null` score is missing. Any other value that does not
/// coerce to a number scores the range minimum.
fn score_from_raw(item_id: &str, raw: Option<Value>) -> Option<f64> {
    let value = raw.filter(|value| !value.is_null())?;
    let score = coerce_score(&value).unwrap_or_else(|| {
        warn!(item = %item_id, value = %value, "non-numeric score treated as zero");
        SCORE_MIN
    });
    Some(score)
}

/// Numbers pass through, numeric strings are parsed, everything else is `None`.
/// Finite values are clamped into the score range.
pub fn coerce_score(value: &Value) -> Option<f64> {
    let raw = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;

    if raw.is_finite() {
        Some(raw.clamp(SCORE_MIN, SCORE_MAX))
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct RaterSource {
    pub name: String,
    pub path: PathBuf,
    pub sha256: String,
    pub records: Vec<RaterRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDigest {
    pub rater: String,
    pub path: String,
    pub sha256: String,
}

impl From<&RaterSource> for SourceDigest {
    fn from(source: &RaterSource) -> Self {
        Self {
            rater: source.name.clone(),
            path: source.path.display().to_string(),
            sha256: source.sha256.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classification_accepts_original_and_english_keys() {
        let original: RawClassification = serde_json::from_value(json!({
            "table_name": "tb_paciente",
            "schema": "public",
            "score_relevancia": 85,
            "justificativa": "contains blood pressure",
            "colunas_contribuintes": ["pa_sistolica"]
        }))
        .expect("original keys should deserialize");
        let english: RawClassification = serde_json::from_value(json!({
            "item_id": "tb_paciente",
            "group_key": "public",
            "score": 85,
            "justification": "contains blood pressure",
            "contributing_columns": ["pa_sistolica"]
        }))
        .expect("english keys should deserialize");

        assert_eq!(original.into_record(), english.into_record());
    }

    #[test]
    fn missing_fields_are_synthesized_as_empty() {
        let raw: RawClassification =
            serde_json::from_value(json!({ "table_name": "exams" })).expect("deserialize");
        let record = raw.into_record().expect("item id present");

        assert_eq!(record.item_id, "exams");
        assert!(record.group_key.is_none());
        assert!(record.score.is_none());
        assert!(record.justification.is_none());
        assert!(record.contributing_columns.is_empty());
    }

    #[test]
    fn entry_without_item_id_is_dropped() {
        let raw: RawClassification =
            serde_json::from_value(json!({ "score": 10 })).expect("deserialize");
        assert!(raw.into_record().is_none());
    }

    #[test]
    fn coerce_score_parses_strings_and_clamps() {
        assert_eq!(coerce_score(&json!("42.5")), Some(42.5));
        assert_eq!(coerce_score(&json!(140)), Some(100.0));
        assert_eq!(coerce_score(&json!(-3)), Some(0.0));
        assert_eq!(coerce_score(&json!("high")), None);
        assert_eq!(coerce_score(&json!(null)), None);
        assert_eq!(coerce_score(&json!([1])), None);
    }

    #[test]
    fn non_numeric_score_counts_as_zero_but_null_stays_missing() {
        let record = |score: serde_json::Value| {
            let raw: RawClassification =
                serde_json::from_value(json!({ "table_name": "t1", "score": score }))
                    .expect("deserialize");
            raw.into_record().expect("item id present").score
        };

        assert_eq!(record(json!("N/A")), Some(0.0));
        assert_eq!(record(json!(true)), Some(0.0));
        assert_eq!(record(json!({ "value": 10 })), Some(0.0));
        assert_eq!(record(json!("nan")), Some(0.0));
        assert_eq!(record(json!("75")), Some(75.0));
        assert_eq!(record(json!(null)), None);
    }

    #[test]
    fn result_file_without_classifications_is_empty() {
        let file: RaterResultFile = serde_json::from_value(json!({ "model": "x" })).expect("parse");
        assert!(file.classifications.is_empty());
    }
}
