//! Cross-PR aggregates for combined reports

use std::collections::BTreeSet;

use common::models::PrSnapshot;
use serde::{Deserialize, Serialize};

use crate::conversation::{ConversationAnalysis, ResolutionStatus};
use crate::prompt::AnalysisResult;
use crate::timeline::TimelineMetrics;

const LEARNING_OPPORTUNITY_LIMIT: usize = 5;
const RECURRING_PATTERN_LIMIT: usize = 5;
const PATTERN_KEY_WORDS: usize = 3;

/// The finished analyses of one PR, borrowed for aggregation
#[derive(Debug, Clone, Copy)]
pub struct PrOutcome<'a> {
    pub snapshot: &'a PrSnapshot,
    pub timeline: &'a TimelineMetrics,
    pub conversation: Option<&'a ConversationAnalysis>,
    pub narrative: Option<&'a AnalysisResult>,
}

/// A developer mistake seen in more than one narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPattern {
    /// First words of the mistake, lowercased
    pub pattern: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparativeSummary {
    pub pr_count: usize,
    pub total_files: usize,
    pub total_comments: usize,
    pub total_commits: usize,
    /// PRs without a review count as zero hours
    pub avg_time_to_first_review: f64,
    pub merged_count: usize,
    /// Over merged PRs only
    pub avg_time_to_merge: Option<f64>,
    pub avg_files: f64,
    pub avg_comments: f64,
    pub distinct_authors: usize,
    pub total_threads: usize,
    pub resolved_threads: usize,
    /// Percentage, `None` when no PR had threads
    pub resolution_rate: Option<f64>,
    /// First mistakes across all narratives, in PR order
    pub learning_opportunities: Vec<String>,
    pub recurring_mistakes: Vec<RecurringPattern>,
}

impl ComparativeSummary {
    pub fn from_outcomes(outcomes: &[PrOutcome<'_>]) -> Self {
        let pr_count = outcomes.len();
        let divisor = pr_count.max(1) as f64;

        let total_files: usize = outcomes.iter().map(|o| o.snapshot.changed_files.len()).sum();
        let total_comments: usize = outcomes.iter().map(|o| o.snapshot.comments.len()).sum();
        let total_commits: usize = outcomes.iter().map(|o| o.snapshot.commits.len()).sum();

        let avg_time_to_first_review = outcomes
            .iter()
            .map(|o| o.timeline.time_to_first_review.unwrap_or(0.0))
            .sum::<f64>()
            / divisor;

        let merge_times: Vec<f64> = outcomes
            .iter()
            .filter_map(|o| o.timeline.time_to_merge)
            .collect();
        let avg_time_to_merge = if merge_times.is_empty() {
            None
        } else {
            Some(merge_times.iter().sum::<f64>() / merge_times.len() as f64)
        };

        let distinct_authors = outcomes
            .iter()
            .map(|o| o.snapshot.author.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        let threads = outcomes
            .iter()
            .filter_map(|o| o.conversation)
            .flat_map(|c| c.threads.iter());
        let (total_threads, resolved_threads) = threads.fold((0, 0), |(total, resolved), t| {
            let done = t.resolution_status == ResolutionStatus::Resolved;
            (total + 1, resolved + usize::from(done))
        });
        let resolution_rate = if total_threads > 0 {
            Some(resolved_threads as f64 / total_threads as f64 * 100.0)
        } else {
            None
        };

        let mistakes: Vec<&str> = outcomes
            .iter()
            .filter_map(|o| o.narrative)
            .flat_map(|n| n.developer_mistakes.iter().map(String::as_str))
            .collect();

        Self {
            pr_count,
            total_files,
            total_comments,
            total_commits,
            avg_time_to_first_review,
            merged_count: merge_times.len(),
            avg_time_to_merge,
            avg_files: total_files as f64 / divisor,
            avg_comments: total_comments as f64 / divisor,
            distinct_authors,
            total_threads,
            resolved_threads,
            resolution_rate,
            learning_opportunities: mistakes
                .iter()
                .take(LEARNING_OPPORTUNITY_LIMIT)
                .map(|m| m.to_string())
                .collect(),
            recurring_mistakes: recurring_patterns(&mistakes),
        }
    }
}

/// Group mistakes by their first words; only groups seen more than once.
///
/// Most frequent first, ties in order of first appearance.
pub fn recurring_patterns(mistakes: &[&str]) -> Vec<RecurringPattern> {
    let mut counts: Vec<RecurringPattern> = Vec::new();
    for mistake in mistakes {
        let pattern = mistake
            .to_lowercase()
            .split_whitespace()
            .take(PATTERN_KEY_WORDS)
            .collect::<Vec<_>>()
            .join(" ");
        match counts.iter_mut().find(|p| p.pattern == pattern) {
            Some(entry) => entry.count += 1,
            None => counts.push(RecurringPattern { pattern, count: 1 }),
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(RECURRING_PATTERN_LIMIT);
    counts.retain(|p| p.count > 1);
    counts
}
