//! Training readiness policy: a go/no-go signal over the approved corpus.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::ReadinessConfig;
use crate::store::SampleRecord;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub ready: bool,
    pub total_samples: usize,
    pub approved_samples: usize,
    pub minimum_required: usize,
    pub recommendations: Vec<String>,
    pub quality_issues: Vec<String>,
    pub training_data_exists: bool,
}

/// Assesses whether the approved corpus is worth training on.
///
/// Ready means: approved count meets the minimum AND no quality issue.
/// Any failing quality clause makes the dataset not ready even when the
/// count clause passes.
pub fn assess(
    records: &[SampleRecord],
    thresholds: &ReadinessConfig,
    training_data_exists: bool,
) -> ReadinessReport {
    let approved: Vec<&SampleRecord> = records.iter().filter(|r| r.is_approved()).collect();

    let mut recommendations = Vec::new();
    let mut quality_issues = Vec::new();

    if approved.len() < thresholds.min_approved {
        recommendations.push(format!(
            "Need at least {} approved samples. Currently have {}.",
            thresholds.min_approved,
            approved.len()
        ));
    }

    let with_corrections = approved
        .iter()
        .filter(|r| !r.corrected_text.trim().is_empty())
        .count();
    if (with_corrections as f64) < approved.len() as f64 * thresholds.correction_ratio {
        quality_issues.push(format!(
            "Less than {:.0}% of approved samples have corrected text",
            thresholds.correction_ratio * 100.0
        ));
    }

    let unique_texts: HashSet<String> = approved
        .iter()
        .map(|r| r.corrected_text.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    if (unique_texts.len() as f64) < approved.len() as f64 * thresholds.diversity_ratio {
        quality_issues.push("Low text diversity - many duplicate texts detected".to_string());
    }

    let ready = approved.len() >= thresholds.min_approved && quality_issues.is_empty();

    ReadinessReport {
        ready,
        total_samples: records.len(),
        approved_samples: approved.len(),
        minimum_required: thresholds.min_approved,
        recommendations,
        quality_issues,
        training_data_exists,
    }
}
