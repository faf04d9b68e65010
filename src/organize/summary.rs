//! Run statistics
//!
//! Computed once at the end of an organize run from the final lists, never
//! incrementally and never mutated afterward.

use super::{FailedEntry, OrganizeEntry};
use crate::taxonomy;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Organized items bucketed by confidence band
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceStats {
    /// confidence >= 0.8
    pub high: usize,
    /// 0.5 <= confidence < 0.8
    pub medium: usize,
    /// confidence < 0.5
    pub low: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationSummary {
    pub total: usize,
    pub organized_count: usize,
    pub failed_count: usize,
    /// Percentage; 0.0 for an empty run
    pub success_rate: f32,
    /// Organized items per category label
    pub category_breakdown: BTreeMap<String, usize>,
    pub confidence_stats: ConfidenceStats,
    pub generated_at: DateTime<Utc>,
}

impl OrganizationSummary {
    pub fn compute(organized: &[OrganizeEntry], failed: &[FailedEntry]) -> Self {
        let total = organized.len() + failed.len();
        let success_rate = if total == 0 {
            0.0
        } else {
            organized.len() as f32 / total as f32 * 100.0
        };

        let mut category_breakdown: BTreeMap<String, usize> = BTreeMap::new();
        let mut confidence_stats = ConfidenceStats {
            high: 0,
            medium: 0,
            low: 0,
        };

        for entry in organized {
            let label = taxonomy::by_code(&entry.category)
                .map(|c| c.label.to_string())
                .unwrap_or_else(|| entry.category.clone());
            *category_breakdown.entry(label).or_insert(0) += 1;

            if entry.confidence >= 0.8 {
                confidence_stats.high += 1;
            } else if entry.confidence >= 0.5 {
                confidence_stats.medium += 1;
            } else {
                confidence_stats.low += 1;
            }
        }

        Self {
            total,
            organized_count: organized.len(),
            failed_count: failed.len(),
            success_rate,
            category_breakdown,
            confidence_stats,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, confidence: f32) -> OrganizeEntry {
        OrganizeEntry {
            original_name: "in.pdf".to_string(),
            new_name: "out.pdf".to_string(),
            category: category.to_string(),
            target_folder: "folder".to_string(),
            document_number: 1,
            confidence,
        }
    }

    fn failure() -> FailedEntry {
        FailedEntry {
            filename: "bad.pdf".to_string(),
            error: "boom".to_string(),
        }
    }

    #[test]
    fn test_empty_run_has_zero_rate_without_division_error() {
        let summary = OrganizationSummary::compute(&[], &[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.category_breakdown.is_empty());
    }

    #[test]
    fn test_breakdown_totals_match_organized_count() {
        let organized = vec![entry("COF", 0.9), entry("COF", 0.6), entry("DO", 0.3)];
        let failed = vec![failure()];

        let summary = OrganizationSummary::compute(&organized, &failed);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.organized_count, 3);
        assert_eq!(summary.failed_count, 1);
        assert_eq!(summary.success_rate, 75.0);

        let breakdown_sum: usize = summary.category_breakdown.values().sum();
        assert_eq!(breakdown_sum, organized.len());
        assert_eq!(summary.category_breakdown["Computer Order Form"], 2);
        assert_eq!(summary.category_breakdown["Delivery Order"], 1);
    }

    #[test]
    fn test_confidence_bands() {
        let organized = vec![
            entry("COF", 0.8),  // boundary: high
            entry("COF", 0.79), // medium
            entry("COF", 0.5),  // boundary: medium
            entry("COF", 0.49), // low
            entry("COF", 0.1),  // low
        ];

        let summary = OrganizationSummary::compute(&organized, &[]);
        assert_eq!(summary.confidence_stats.high, 1);
        assert_eq!(summary.confidence_stats.medium, 2);
        assert_eq!(summary.confidence_stats.low, 2);
    }
}
