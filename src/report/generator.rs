//! Dashboard and result rendering.
//!
//! This module turns the derived dashboard views into Markdown or JSON
//! reports, and formats single analysis results for the terminal.

use crate::models::{
    CommunicationRecord, Dashboard, DistributionRow, EmotionScore, ModelComparisonRow,
    RadarSeries, TimelinePoint, NOT_AVAILABLE,
};
use anyhow::Result;

/// Placeholder printed for views with nothing to show.
const NO_DATA: &str = "No communications available.";

/// Generate a complete Markdown dashboard report.
pub fn generate_markdown_report(dashboard: &Dashboard, confidence_decimals: usize) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Deep Purple Dashboard\n\n");

    output.push_str(&generate_metadata_section(dashboard));
    output.push_str(&generate_distribution_section(&dashboard.distribution));
    output.push_str(&generate_radar_section(&dashboard.radar));
    output.push_str(&generate_model_section(&dashboard.models, confidence_decimals));
    output.push_str(&generate_timeline_section(&dashboard.timeline));
    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(dashboard: &Dashboard) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** {}\n", dashboard.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Total Communications:** {}\n\n",
        dashboard.total
    ));

    section
}

/// Generate the emotion distribution (bar chart) section.
fn generate_distribution_section(rows: &[DistributionRow]) -> String {
    let mut section = String::new();

    section.push_str("## Emotion Distribution\n\n");
    if rows.is_empty() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    section.push_str("| Emotion | Primary | Secondary |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&row.name),
            row.primary,
            row.secondary
        ));
    }
    section.push('\n');

    section
}

/// Generate the emotion intensity (radar) section.
fn generate_radar_section(radar: &RadarSeries) -> String {
    let mut section = String::new();

    section.push_str("## Emotion Intensity\n\n");
    if radar.labels.is_empty() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    let labels = radar
        .labels
        .iter()
        .map(|label| escape_cell(label))
        .collect::<Vec<_>>()
        .join(" | ");

    section.push_str(&format!("| Series | {} |\n", labels));
    section.push_str(&format!("|:---|{}\n", ":---:|".repeat(radar.labels.len())));
    section.push_str(&format!(
        "| Primary Emotions | {} |\n",
        join_counts(&radar.primary)
    ));
    section.push_str(&format!(
        "| Secondary Emotions | {} |\n\n",
        join_counts(&radar.secondary)
    ));

    section
}

fn join_counts(values: &[usize]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Generate the model performance section.
fn generate_model_section(models: &[ModelComparisonRow], decimals: usize) -> String {
    let mut section = String::new();

    section.push_str("## Model Performance\n\n");
    if models.is_empty() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    section.push_str("| Model | Analysis Count | Avg. Confidence |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for model in models {
        section.push_str(&format!(
            "| {} | {} | {:.*} |\n",
            model_cell(model.model.as_deref()),
            model.count,
            decimals,
            model.confidence
        ));
    }
    section.push('\n');

    section
}

/// Generate the confidence timeline section.
fn generate_timeline_section(points: &[TimelinePoint]) -> String {
    let mut section = String::new();

    section.push_str("## Confidence Timeline\n\n");
    if points.is_empty() {
        section.push_str(&format!("{}\n\n", NO_DATA));
        return section;
    }

    section.push_str("| Timestamp | Confidence Rating | Model |\n");
    section.push_str("|:---|:---:|:---|\n");
    for point in points {
        let confidence = point
            .confidence
            .map(|c| c.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            escape_cell(&point.timestamp),
            confidence,
            model_cell(point.model.as_deref())
        ));
    }
    section.push('\n');

    section
}

/// Make text safe to place inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", " ")
        .replace(|c: char| c == '\r' || c == '\n', " ")
}

/// Model version cell: code-formatted, `N/A` when the record had none.
fn model_cell(model: Option<&str>) -> String {
    match model {
        None => NOT_AVAILABLE.to_string(),
        Some("") => String::new(),
        Some(model) => format!("`{}`", escape_cell(model)),
    }
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by deep-purple*\n");

    footer
}

/// Generate a JSON dashboard report.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

fn or_na(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_AVAILABLE,
    }
}

fn format_score(score: &EmotionScore) -> String {
    match score.percentage {
        Some(p) => format!("{} ({:.1}%)", score.label(), p),
        None => score.label().to_string(),
    }
}

/// One emotion slice: label and percentage, primary first.
pub fn emotion_breakdown(record: &CommunicationRecord) -> Vec<(String, f64)> {
    record
        .primary_emotion
        .iter()
        .chain(record.secondary_emotions.iter())
        .map(|score| (score.label().to_string(), score.percentage.unwrap_or(0.0)))
        .collect()
}

/// Format a single analysis result for the terminal.
pub fn render_analysis_result(record: &CommunicationRecord, timestamp_format: &str) -> String {
    let mut lines = Vec::new();

    let id = record.id.as_ref().map(|id| id.to_string());
    lines.push(format!("ID: {}", or_na(id.as_deref())));
    lines.push(format!("Content: {}", or_na(record.content.as_deref())));
    lines.push(format!(
        "Primary Emotion: {}",
        record
            .primary_emotion
            .as_ref()
            .map(format_score)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    ));

    if record.secondary_emotions.is_empty() {
        lines.push("Secondary Emotions: No secondary emotions available".to_string());
    } else {
        lines.push("Secondary Emotions:".to_string());
        for score in &record.secondary_emotions {
            lines.push(format!("  - {}", format_score(score)));
        }
    }

    lines.push(format!("Model: {}", or_na(record.model_name.as_deref())));
    lines.push(format!(
        "AI Model Version: {}",
        or_na(record.model_version.as_deref())
    ));
    let confidence = record.confidence_rating.map(|c| c.to_string());
    lines.push(format!(
        "Confidence Rating: {}",
        or_na(confidence.as_deref())
    ));
    lines.push(format!("Summary: {}", or_na(record.summary.as_deref())));
    lines.push(format!(
        "Timestamp: {}",
        record.formatted_timestamp(timestamp_format)
    ));

    let breakdown = emotion_breakdown(record);
    if !breakdown.is_empty() {
        lines.push(String::new());
        lines.push("Emotion Distribution:".to_string());
        for (label, percentage) in breakdown {
            let bar = "█".repeat((percentage.clamp(0.0, 100.0) / 5.0).round() as usize);
            lines.push(format!("  {:<12} {:>5.1}% {}", label, percentage, bar));
        }
    }

    lines.join("\n")
}

/// Format a list of stored communications for the terminal.
pub fn render_communication_list(records: &[CommunicationRecord], timestamp_format: &str) -> String {
    if records.is_empty() {
        return "No communications found.".to_string();
    }

    records
        .iter()
        .map(|record| render_analysis_result(record, timestamp_format))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
