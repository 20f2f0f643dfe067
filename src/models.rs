//! Data models for the emotion-analysis client.
//!
//! This module contains the communication records returned by the service,
//! the custom-model entities managed through it, and the derived views
//! computed for the dashboard.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Label used whenever an emotion is missing or empty.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Placeholder for values a record does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// Default `chrono` format for human-readable timestamps.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Returns the label itself, or [`UNKNOWN_LABEL`] if it is missing or empty.
pub fn label_or_unknown(label: Option<&str>) -> &str {
    match label {
        Some(l) if !l.is_empty() => l,
        _ => UNKNOWN_LABEL,
    }
}

/// Opaque identifier assigned by the service.
///
/// The service hands out numeric ids, but nothing here relies on that, so
/// both JSON strings and numbers are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    #[cfg(test)]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(RecordId(s)),
            Value::Number(n) => Ok(RecordId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or number id, got {}",
                other
            ))),
        }
    }
}

/// One emotion label with its confidence percentage (0-100).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionScore {
    #[serde(default, deserialize_with = "lenient")]
    pub emotion: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub percentage: Option<f64>,
}

impl EmotionScore {
    pub fn new(emotion: &str, percentage: f64) -> Self {
        Self {
            emotion: Some(emotion.to_string()),
            percentage: Some(percentage),
        }
    }

    /// The emotion label, falling back to [`UNKNOWN_LABEL`].
    pub fn label(&self) -> &str {
        label_or_unknown(self.emotion.as_deref())
    }
}

/// A submitted or uploaded text together with its analysis result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<RecordId>,
    /// Original text; absent when the record came from a file upload.
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub primary_emotion: Option<EmotionScore>,
    #[serde(default, deserialize_with = "lenient_scores")]
    pub secondary_emotions: Vec<EmotionScore>,
    #[serde(default, deserialize_with = "lenient")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub model_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub confidence_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl CommunicationRecord {
    /// Label of the primary emotion. A record without one counts as
    /// [`UNKNOWN_LABEL`].
    pub fn primary_label(&self) -> &str {
        label_or_unknown(
            self.primary_emotion
                .as_ref()
                .and_then(|p| p.emotion.as_deref()),
        )
    }

    /// Labels of the secondary emotions, in order.
    pub fn secondary_labels(&self) -> impl Iterator<Item = &str> {
        self.secondary_emotions.iter().map(EmotionScore::label)
    }

    /// Confidence used when averaging; a missing rating counts as zero.
    pub fn confidence_or_zero(&self) -> f64 {
        self.confidence_rating.unwrap_or(0.0)
    }

    /// Human-readable timestamp (UTC), or [`NOT_AVAILABLE`].
    pub fn formatted_timestamp(&self, format: &str) -> String {
        match self.timestamp {
            Some(ts) => ts.format(format).to_string(),
            None => NOT_AVAILABLE.to_string(),
        }
    }
}

/// Reads an optional field, turning a value of the wrong type into `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match serde_json::from_value(v) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            debug!("Ignoring malformed field: {}", e);
            None
        }
    }))
}

/// Secondary emotions: `null` or a non-list reads as empty, and entries
/// that are not objects are skipped.
fn lenient_scores<'de, D>(deserializer: D) -> Result<Vec<EmotionScore>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(entries)) => entries,
        _ => return Ok(Vec::new()),
    };

    Ok(entries
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

/// Accepts RFC 3339, zone-less ISO date-times (taken as UTC) and epoch
/// milliseconds. Anything else becomes `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(naive.and_utc());
                }
            }
            debug!("Unrecognised timestamp: {}", s);
            None
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Request body for saving or updating a communication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommunication {
    pub content: String,
    pub model_name: String,
}

/// A user-defined emotion model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomModel {
    pub id: RecordId,
    #[serde(default)]
    pub name: String,
}

/// An emotion category belonging to a custom model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionCategory {
    pub id: RecordId,
    #[serde(default)]
    pub emotion: String,
}

/// A word mapped to an emotion category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordAssociation {
    pub id: RecordId,
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub emotion_category: Option<String>,
}

/// Primary and secondary occurrence counts for one emotion label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmotionTally {
    pub primary: usize,
    pub secondary: usize,
}

/// Emotion label → tally, iterated in first-observation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmotionCounts {
    entries: Vec<(String, EmotionTally)>,
}

impl EmotionCounts {
    pub(crate) fn from_ordered(entries: Vec<(String, EmotionTally)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, label: &str) -> Option<&EmotionTally> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, tally)| tally)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmotionTally)> {
        self.entries.iter().map(|(l, t)| (l.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One bar-chart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionRow {
    pub name: String,
    #[serde(rename = "Primary")]
    pub primary: usize,
    #[serde(rename = "Secondary")]
    pub secondary: usize,
}

/// Result of the distribution pass: the mapping and its row projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmotionDistribution {
    pub counts: EmotionCounts,
    pub rows: Vec<DistributionRow>,
}

/// Parallel series for the radar chart; index `i` of each refers to the
/// same label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub labels: Vec<String>,
    pub primary: Vec<usize>,
    pub secondary: Vec<usize>,
}

/// Average confidence and record count for one model version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparisonRow {
    /// The record's `modelVersion` as given; `None` when it was absent.
    pub model: Option<String>,
    pub confidence: f64,
    pub count: usize,
}

/// One point on the confidence timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub timestamp: String,
    pub confidence: Option<f64>,
    pub model: Option<String>,
}

/// All derived views for one set of records.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Where the records came from (API URL or file path).
    pub source: String,
    pub generated_at: DateTime<Utc>,
    pub total: usize,
    pub distribution: Vec<DistributionRow>,
    pub radar: RadarSeries,
    pub models: Vec<ModelComparisonRow>,
    pub timeline: Vec<TimelinePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_label_or_unknown() {
        assert_eq!(label_or_unknown(Some("Joy")), "Joy");
        assert_eq!(label_or_unknown(Some("")), UNKNOWN_LABEL);
        assert_eq!(label_or_unknown(None), UNKNOWN_LABEL);
    }

    #[test]
    fn test_record_from_service_json() {
        let record: CommunicationRecord = serde_json::from_value(json!({
            "id": 42,
            "content": "What a lovely day",
            "primaryEmotion": {"emotion": "Joy", "percentage": 80.0},
            "secondaryEmotions": [{"emotion": "Trust", "percentage": 40.0}],
            "modelName": "default",
            "modelVersion": "v1",
            "confidenceRating": 90,
            "timestamp": "2024-11-20T10:15:30.123"
        }))
        .unwrap();

        assert_eq!(record.id, Some(RecordId::new("42")));
        assert_eq!(record.primary_label(), "Joy");
        assert_eq!(record.secondary_labels().collect::<Vec<_>>(), vec!["Trust"]);
        assert_eq!(record.confidence_rating, Some(90.0));
        assert_eq!(
            record.formatted_timestamp(DEFAULT_TIMESTAMP_FORMAT),
            "2024-11-20 10:15:30"
        );
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let record: CommunicationRecord =
            serde_json::from_value(json!({"secondaryEmotions": null})).unwrap();

        assert!(record.secondary_emotions.is_empty());
        assert_eq!(record.primary_label(), UNKNOWN_LABEL);
        assert_eq!(record.model_version, None);
        assert_eq!(record.confidence_or_zero(), 0.0);
        assert_eq!(record.formatted_timestamp(DEFAULT_TIMESTAMP_FORMAT), "N/A");
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(
            parse_timestamp(&json!("2024-01-02T03:04:05Z")).map(|t| t.timestamp()),
            Some(1704164645)
        );
        assert_eq!(
            parse_timestamp(&json!("2024-01-02 03:04:05")).map(|t| t.timestamp()),
            Some(1704164645)
        );
        assert_eq!(
            parse_timestamp(&json!(1704164645000i64)).map(|t| t.timestamp()),
            Some(1704164645)
        );
        assert_eq!(parse_timestamp(&json!("yesterday")), None);
        assert_eq!(parse_timestamp(&json!(true)), None);
    }

    #[test]
    fn test_wrongly_typed_fields_read_as_missing() {
        let record: CommunicationRecord = serde_json::from_value(json!({
            "id": true,
            "content": 17,
            "primaryEmotion": {"emotion": "Joy", "percentage": "80"},
            "secondaryEmotions": [null, {"emotion": ["Trust"]}, "Fear", {"emotion": "Calm"}],
            "modelVersion": 2,
            "confidenceRating": "high",
            "summary": {}
        }))
        .unwrap();

        assert_eq!(record.id, None);
        assert_eq!(record.content, None);
        assert_eq!(record.primary_label(), "Joy");
        assert_eq!(record.primary_emotion.as_ref().unwrap().percentage, None);
        assert_eq!(
            record.secondary_labels().collect::<Vec<_>>(),
            vec![UNKNOWN_LABEL, "Calm"]
        );
        assert_eq!(record.model_version, None);
        assert_eq!(record.confidence_rating, None);
        assert_eq!(record.summary, None);
    }

    #[test]
    fn test_secondary_emotions_not_a_list() {
        let record: CommunicationRecord =
            serde_json::from_value(json!({"secondaryEmotions": {"emotion": "Joy"}})).unwrap();
        assert!(record.secondary_emotions.is_empty());
    }

    #[test]
    fn test_record_id_rejects_objects() {
        let result: Result<RecordId, _> = serde_json::from_value(json!({"id": 1}));
        assert!(result.is_err());
    }

    #[test]
    fn test_distribution_row_keys() {
        let row = DistributionRow {
            name: "Joy".to_string(),
            primary: 2,
            secondary: 0,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json, json!({"name": "Joy", "Primary": 2, "Secondary": 0}));
    }

    #[test]
    fn test_word_association_from_json() {
        let assoc: WordAssociation = serde_json::from_value(json!({
            "id": "7",
            "word": "sunshine",
            "emotionCategory": "Joy"
        }))
        .unwrap();
        assert_eq!(assoc.id.as_str(), "7");
        assert_eq!(assoc.emotion_category.as_deref(), Some("Joy"));
    }
}
