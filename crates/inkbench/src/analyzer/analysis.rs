//! Read-only dataset aggregation. Never mutates the store.

use std::collections::HashMap;

use serde::Serialize;

use crate::store::{SampleRecord, SampleStatus};

/// Aggregate statistics over a label store snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetAnalysis {
    pub total_samples: usize,
    pub status_counts: StatusCounts,
    pub text_lengths: LengthStats,
    pub character_frequency: HashMap<char, u64>,
    pub word_frequency: HashMap<String, u64>,
    pub quality: QualityMetrics,
    pub files: FileStats,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    fn record(&mut self, status: SampleStatus) {
        match status {
            SampleStatus::Pending => self.pending += 1,
            SampleStatus::Approved => self.approved += 1,
            SampleStatus::Rejected => self.rejected += 1,
        }
    }

    pub fn get(&self, status: SampleStatus) -> usize {
        match status {
            SampleStatus::Pending => self.pending,
            SampleStatus::Approved => self.approved,
            SampleStatus::Rejected => self.rejected,
        }
    }
}

/// Mean and population standard deviation over observed text lengths.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthStats {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub has_predicted_text: usize,
    pub has_provided_text: usize,
    pub has_corrected_text: usize,
    /// Fraction of exact case-insensitive matches between predicted and
    /// provided text, over samples carrying both. `None` when no sample
    /// carries both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_size: u64,
    pub average_size: f64,
}

/// Analyzes a snapshot of sample records.
pub fn analyze(records: &[SampleRecord]) -> DatasetAnalysis {
    let mut status_counts = StatusCounts::default();
    let mut lengths: Vec<usize> = Vec::new();
    let mut character_frequency: HashMap<char, u64> = HashMap::new();
    let mut word_frequency: HashMap<String, u64> = HashMap::new();
    let mut quality = QualityMetrics::default();
    let mut files = FileStats::default();
    let mut accuracy_hits = 0usize;
    let mut accuracy_total = 0usize;

    for record in records {
        status_counts.record(record.status);

        for text in [
            &record.predicted_text,
            &record.provided_text,
            &record.corrected_text,
        ] {
            if text.is_empty() {
                continue;
            }
            lengths.push(text.chars().count());
            for ch in text.to_lowercase().chars() {
                if ch.is_alphanumeric() || ch.is_whitespace() {
                    *character_frequency.entry(ch).or_insert(0) += 1;
                }
            }
            for word in text.to_lowercase().split_whitespace() {
                if !word.is_empty() && word.chars().all(char::is_alphanumeric) {
                    *word_frequency.entry(word.to_string()).or_insert(0) += 1;
                }
            }
        }

        if !record.predicted_text.is_empty() {
            quality.has_predicted_text += 1;
        }
        if !record.provided_text.is_empty() {
            quality.has_provided_text += 1;
        }
        if !record.corrected_text.is_empty() {
            quality.has_corrected_text += 1;
        }

        let predicted = record.predicted_text.trim().to_lowercase();
        let provided = record.provided_text.trim().to_lowercase();
        if !predicted.is_empty() && !provided.is_empty() {
            accuracy_total += 1;
            if predicted == provided {
                accuracy_hits += 1;
            }
        }

        files.total_size += record.file_size;
    }

    if !records.is_empty() {
        files.average_size = files.total_size as f64 / records.len() as f64;
    }

    quality.prediction_accuracy = if accuracy_total > 0 {
        Some(accuracy_hits as f64 / accuracy_total as f64)
    } else {
        None
    };

    DatasetAnalysis {
        total_samples: records.len(),
        status_counts,
        text_lengths: length_stats(&lengths),
        character_frequency,
        word_frequency,
        quality,
        files,
    }
}

impl DatasetAnalysis {
    /// Most frequent words, count descending, ties broken alphabetically.
    pub fn top_words(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .word_frequency
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    /// Most frequent characters, count descending, ties broken by codepoint.
    pub fn top_characters(&self, n: usize) -> Vec<(char, u64)> {
        let mut entries: Vec<(char, u64)> = self
            .character_frequency
            .iter()
            .map(|(ch, count)| (*ch, *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }
}

fn length_stats(lengths: &[usize]) -> LengthStats {
    if lengths.is_empty() {
        return LengthStats::default();
    }

    let count = lengths.len();
    let mean = lengths.iter().sum::<usize>() as f64 / count as f64;
    let variance = lengths
        .iter()
        .map(|&len| {
            let delta = len as f64 - mean;
            delta * delta
        })
        .sum::<f64>()
        / count as f64;

    LengthStats {
        count,
        mean,
        stddev: variance.sqrt(),
    }
}
