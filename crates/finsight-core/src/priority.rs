//! Improvement priorities
//!
//! Orders weaknesses by severity, then by how far the value sits from its
//! reference, and keeps the top N. Ties keep the rule definition order.

use serde::Serialize;

use crate::config::PriorityConfig;
use crate::weakness::{Category, Severity, Weakness};

/// One entry of the improvement list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Priority {
    /// 1-based, contiguous
    pub rank: usize,
    pub rule_id: String,
    pub title: String,
    pub recommendation: String,
    pub category: Category,
    pub severity: Severity,
}

#[derive(Debug, Clone)]
pub struct PriorityRanker {
    top_n: usize,
}

impl Default for PriorityRanker {
    fn default() -> Self {
        Self::new(PriorityConfig::default().top_n)
    }
}

impl PriorityRanker {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rank(&self, weaknesses: &[Weakness]) -> Vec<Priority> {
        let mut ordered: Vec<&Weakness> = weaknesses.iter().collect();
        // sort_by is stable, equal keys keep definition order
        ordered.sort_by(|a, b| {
            b.severity
                .priority()
                .cmp(&a.severity.priority())
                .then_with(|| {
                    b.gap()
                        .partial_cmp(&a.gap())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });

        ordered
            .into_iter()
            .take(self.top_n)
            .enumerate()
            .map(|(idx, w)| Priority {
                rank: idx + 1,
                rule_id: w.rule_id.clone(),
                title: w.title.clone(),
                recommendation: w.recommendation.clone(),
                category: w.category,
                severity: w.severity,
            })
            .collect()
    }
}
