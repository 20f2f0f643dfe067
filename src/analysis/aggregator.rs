//! Record aggregation for the dashboard views.
//!
//! Every function here is a pure pass over a slice of records: nothing is
//! cached between calls and the output depends only on the input.

use crate::models::{
    CommunicationRecord, Dashboard, DistributionRow, EmotionCounts, EmotionDistribution,
    EmotionTally, ModelComparisonRow, RadarSeries, TimelinePoint,
};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while turning untyped input into records.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("invalid input shape: {0}")]
    InvalidInputShape(String),
}

/// Convert a JSON document into a record sequence.
///
/// The document must be an array of objects. Fields inside each object are
/// all optional; a field of the wrong type reads as missing.
pub fn records_from_value(value: Value) -> Result<Vec<CommunicationRecord>, AggregationError> {
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(AggregationError::InvalidInputShape(format!(
                "expected a list of records, got {}",
                json_kind(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(AggregationError::InvalidInputShape(format!(
                    "record {} is {}, not an object",
                    index,
                    json_kind(&item)
                )));
            }
            serde_json::from_value(item).map_err(|e| {
                AggregationError::InvalidInputShape(format!("record {}: {}", index, e))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Labels in first-observation order with a per-label counter.
#[derive(Default)]
struct OrderedTally<'a> {
    order: Vec<&'a str>,
    counts: HashMap<&'a str, usize>,
}

impl<'a> OrderedTally<'a> {
    fn bump(&mut self, label: &'a str) {
        match self.counts.get_mut(label) {
            Some(count) => *count += 1,
            None => {
                self.order.push(label);
                self.counts.insert(label, 1);
            }
        }
    }

    fn get(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }
}

/// Count primary and secondary emotion labels.
///
/// Rows list primary labels by first appearance, followed by labels that
/// only ever appeared as secondary emotions.
pub fn compute_emotion_distribution(records: &[CommunicationRecord]) -> EmotionDistribution {
    let mut primary = OrderedTally::default();
    let mut secondary = OrderedTally::default();

    for record in records {
        primary.bump(record.primary_label());
        for label in record.secondary_labels() {
            secondary.bump(label);
        }
    }

    let secondary_only = secondary
        .order
        .iter()
        .filter(|label| !primary.counts.contains_key(*label));

    let entries: Vec<(String, EmotionTally)> = primary
        .order
        .iter()
        .chain(secondary_only)
        .map(|label| {
            let tally = EmotionTally {
                primary: primary.get(label),
                secondary: secondary.get(label),
            };
            (label.to_string(), tally)
        })
        .collect();

    let rows = entries
        .iter()
        .map(|(label, tally)| DistributionRow {
            name: label.clone(),
            primary: tally.primary,
            secondary: tally.secondary,
        })
        .collect();

    EmotionDistribution {
        counts: EmotionCounts::from_ordered(entries),
        rows,
    }
}

/// Split an emotion mapping into parallel radar series.
pub fn compute_radar_series(counts: &EmotionCounts) -> RadarSeries {
    let mut series = RadarSeries::default();

    for (label, tally) in counts.iter() {
        series.labels.push(label.to_string());
        series.primary.push(tally.primary);
        series.secondary.push(tally.secondary);
    }

    series
}

/// Average confidence per model version, in first-observation order.
///
/// Versions are compared exactly; an absent version is a group of its own.
/// Records without a confidence rating contribute zero to the sum but
/// still count towards the group size.
pub fn compute_model_comparison(records: &[CommunicationRecord]) -> Vec<ModelComparisonRow> {
    let mut order: Vec<Option<&str>> = Vec::new();
    let mut groups: HashMap<Option<&str>, (f64, usize)> = HashMap::new();

    for record in records {
        let model = record.model_version.as_deref();
        let group = groups.entry(model).or_insert_with(|| {
            order.push(model);
            (0.0, 0)
        });
        group.0 += record.confidence_or_zero();
        group.1 += 1;
    }

    order
        .into_iter()
        .map(|model| {
            let (sum, count) = groups[&model];
            ModelComparisonRow {
                model: model.map(String::from),
                confidence: sum / count as f64,
                count,
            }
        })
        .collect()
}

/// One timeline point per record, in input order.
pub fn compute_timeline(
    records: &[CommunicationRecord],
    timestamp_format: &str,
) -> Vec<TimelinePoint> {
    records
        .iter()
        .map(|record| TimelinePoint {
            timestamp: record.formatted_timestamp(timestamp_format),
            confidence: record.confidence_rating,
            model: record.model_version.clone(),
        })
        .collect()
}

/// Compute every derived view for a set of records.
pub fn build_dashboard(
    records: &[CommunicationRecord],
    source: &str,
    timestamp_format: &str,
) -> Dashboard {
    let distribution = compute_emotion_distribution(records);
    let radar = compute_radar_series(&distribution.counts);

    Dashboard {
        source: source.to_string(),
        generated_at: Utc::now(),
        total: records.len(),
        distribution: distribution.rows,
        radar,
        models: compute_model_comparison(records),
        timeline: compute_timeline(records, timestamp_format),
    }
}
