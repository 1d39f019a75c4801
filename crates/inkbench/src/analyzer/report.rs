//! Markdown monitoring report over an analysis + readiness pair.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::analyzer::analysis::DatasetAnalysis;
use crate::analyzer::readiness::ReadinessReport;
use crate::error::ExportError;
use crate::store::SampleStatus;

const TOP_WORD_COUNT: usize = 10;

/// Renders the monitoring report as markdown.
pub fn render_report(analysis: &DatasetAnalysis, readiness: &ReadinessReport) -> String {
    let mut out = String::new();
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S");

    let _ = writeln!(out, "# Handwriting Dataset Monitoring Report");
    let _ = writeln!(out, "Generated: {}", timestamp);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Dataset Overview");
    let _ = writeln!(out, "- Total Samples: {}", analysis.total_samples);
    let _ = writeln!(
        out,
        "- Average Text Length: {:.1} characters",
        analysis.text_lengths.mean
    );
    let _ = writeln!(
        out,
        "- Total Dataset Size: {:.1} MB",
        analysis.files.total_size as f64 / (1024.0 * 1024.0)
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "## Status Breakdown");
    for status in [
        SampleStatus::Pending,
        SampleStatus::Approved,
        SampleStatus::Rejected,
    ] {
        let count = analysis.status_counts.get(status);
        let percentage = if analysis.total_samples > 0 {
            count as f64 / analysis.total_samples as f64 * 100.0
        } else {
            0.0
        };
        let _ = writeln!(
            out,
            "- {}: {} ({:.1}%)",
            capitalize(status.as_str()),
            count,
            percentage
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Quality Metrics");
    let _ = writeln!(
        out,
        "- Samples with OCR predictions: {}",
        analysis.quality.has_predicted_text
    );
    let _ = writeln!(
        out,
        "- Samples with user-provided text: {}",
        analysis.quality.has_provided_text
    );
    let _ = writeln!(
        out,
        "- Samples with corrected text: {}",
        analysis.quality.has_corrected_text
    );
    if let Some(accuracy) = analysis.quality.prediction_accuracy {
        let _ = writeln!(out, "- Average OCR accuracy: {:.1}%", accuracy * 100.0);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Training Readiness");
    let _ = writeln!(
        out,
        "- Ready for training: {}",
        if readiness.ready { "yes" } else { "no" }
    );
    let _ = writeln!(
        out,
        "- Approved samples: {} / {} minimum",
        readiness.approved_samples, readiness.minimum_required
    );
    let _ = writeln!(
        out,
        "- Training data prepared: {}",
        if readiness.training_data_exists {
            "yes"
        } else {
            "no"
        }
    );

    if !readiness.recommendations.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Recommendations");
        for recommendation in &readiness.recommendations {
            let _ = writeln!(out, "- {}", recommendation);
        }
    }

    if !readiness.quality_issues.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Quality Issues");
        for issue in &readiness.quality_issues {
            let _ = writeln!(out, "- {}", issue);
        }
    }

    let top_words = analysis.top_words(TOP_WORD_COUNT);
    if !top_words.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "### Most Common Words");
        for (word, count) in top_words {
            let _ = writeln!(out, "- '{}': {} times", word, count);
        }
    }

    out
}

/// Writes a timestamped monitoring report into `reports_dir` and returns
/// its path.
pub fn write_report(
    reports_dir: &Path,
    analysis: &DatasetAnalysis,
    readiness: &ReadinessReport,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(reports_dir).map_err(|e| ExportError::CreateDirectory {
        path: reports_dir.to_path_buf(),
        source: e,
    })?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = reports_dir.join(format!("monitoring_report_{}.md", stamp));
    let content = render_report(analysis, readiness);

    std::fs::write(&path, content).map_err(|e| ExportError::WriteReport {
        path: path.clone(),
        source: e,
    })?;

    tracing::info!(path = %path.display(), "Wrote monitoring report");
    Ok(path)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
