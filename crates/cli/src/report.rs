//! Markdown and JSON reports assembled from finished analysis results

use std::collections::BTreeSet;

use common::models::PrSnapshot;
use processor::conversation::ConversationAnalysis;
use processor::timeline::{ActivityPeriod, TimelineMetrics};
use processor::{AnalysisResult, ComparativeSummary, FileAnalysis, PrOutcome};
use serde::Serialize;

const OVERVIEW_TITLE_CHARS: usize = 50;

/// Everything the report shows for one PR; nothing here is recomputed
#[derive(Debug, Serialize)]
pub struct Report {
    pub snapshot: PrSnapshot,
    pub timeline: TimelineMetrics,
    pub activity_periods: Vec<ActivityPeriod>,
    pub conversation: Option<ConversationAnalysis>,
    pub narrative: Option<AnalysisResult>,
    pub file_analyses: Vec<FileAnalysis>,
}

impl Report {
    pub fn outcome(&self) -> PrOutcome<'_> {
        PrOutcome {
            snapshot: &self.snapshot,
            timeline: &self.timeline,
            conversation: self.conversation.as_ref(),
            narrative: self.narrative.as_ref(),
        }
    }
}

/// Several PRs plus their comparative summary
#[derive(Debug, Serialize)]
pub struct CombinedReport<'a> {
    pub summary: ComparativeSummary,
    pub reports: &'a [Report],
}

impl<'a> CombinedReport<'a> {
    pub fn new(reports: &'a [Report]) -> Self {
        let outcomes: Vec<PrOutcome<'_>> = reports.iter().map(Report::outcome).collect();
        Self {
            summary: ComparativeSummary::from_outcomes(&outcomes),
            reports,
        }
    }
}

fn heading(out: &mut String, level: usize, text: &str) {
    out.push_str(&format!("{} {}\n\n", "#".repeat(level), text));
}

fn hours(value: Option<f64>, missing: &str) -> String {
    value
        .map(|h| format!("{:.1} hours", h))
        .unwrap_or_else(|| missing.to_string())
}

fn bullets(out: &mut String, level: usize, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    heading(out, level, title);
    for item in items {
        out.push_str(&format!("- {}\n", item));
    }
    out.push('\n');
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn clip_title(title: &str) -> String {
    if title.chars().count() > OVERVIEW_TITLE_CHARS {
        let head: String = title.chars().take(OVERVIEW_TITLE_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// `owner/repo` part of a PR URL
fn repository(url: &str) -> &str {
    let base = url.split("/pull/").next().unwrap_or(url);
    base.trim_start_matches("https://github.com/")
        .trim_start_matches("http://github.com/")
}

pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    render_pr(
        &mut out,
        report,
        &format!("PR Analysis: {}", report.snapshot.title),
        1,
    );
    out
}

/// One PR; `level` is the heading level of its title
fn render_pr(out: &mut String, report: &Report, title: &str, level: usize) {
    let pr = &report.snapshot;
    let t = &report.timeline;
    let section = level + 1;

    heading(out, level, title);
    out.push_str(&format!("- **URL:** {}\n", pr.url));
    out.push_str(&format!("- **Author:** {}\n", pr.author));
    out.push_str(&format!("- **State:** {}\n", pr.state));
    out.push_str(&format!(
        "- **Files changed:** {} | **Comments:** {} | **Reviews:** {} | **Commits:** {}\n\n",
        pr.changed_files.len(),
        pr.comments.len(),
        pr.reviews.len(),
        pr.commits.len()
    ));

    heading(out, section, "Timeline");
    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!(
        "| Created | {} |\n",
        t.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    out.push_str(&format!(
        "| Time to first review | {} |\n",
        hours(t.time_to_first_review, "No review")
    ));
    out.push_str(&format!(
        "| Time to merge | {} |\n",
        hours(t.time_to_merge, "Not merged")
    ));
    out.push_str(&format!("| Total lifecycle | {:.1} hours |\n", t.total_lifecycle));
    out.push_str(&format!("| Review cycles | {} |\n", t.review_cycles));
    out.push_str(&format!(
        "| Comment frequency | {:.1} comments/day |\n\n",
        t.comment_frequency
    ));

    if !report.activity_periods.is_empty() {
        heading(out, section, "Activity Periods");
        for period in &report.activity_periods {
            let participants: Vec<&str> = period.participants.iter().map(String::as_str).collect();
            out.push_str(&format!(
                "- {} → {}: **{}** ({})\n",
                period.start.format("%Y-%m-%d %H:%M"),
                period.end.format("%Y-%m-%d %H:%M"),
                period.kind.as_str(),
                participants.join(", ")
            ));
        }
        out.push('\n');
    }

    if let Some(conversation) = &report.conversation {
        render_conversation(out, conversation, section);
    }

    if let Some(narrative) = &report.narrative {
        render_narrative(out, narrative, section);
    }

    if !report.file_analyses.is_empty() {
        heading(out, section, "File Analysis");
        for file in &report.file_analyses {
            heading(out, section + 1, &format!("`{}`", file.filename));
            out.push_str(&format!(
                "*Risk: {} | Complexity: {:.1}/10*\n\n{}\n\n",
                file.risk_level.as_str(),
                file.complexity_score,
                file.analysis.trim()
            ));
        }
    }
}

fn render_narrative(out: &mut String, narrative: &AnalysisResult, level: usize) {
    let sub = level + 1;
    heading(out, level, "AI Analysis");
    if !narrative.summary.is_empty() {
        heading(out, sub, "Summary");
        out.push_str(&format!("{}\n\n", narrative.summary));
    }
    bullets(out, sub, "Key Changes", &narrative.key_changes);
    if !narrative.comment_analysis.is_empty() {
        heading(out, sub, "Comment Analysis");
        out.push_str(&format!("{}\n\n", narrative.comment_analysis));
    }
    bullets(out, sub, "Developer Mistakes", &narrative.developer_mistakes);
    bullets(out, sub, "Code Quality Issues", &narrative.code_quality_issues);
    bullets(out, sub, "Suggestions", &narrative.suggestions);
    if !narrative.overall_assessment.is_empty() {
        heading(out, sub, "Overall Assessment");
        out.push_str(&format!("{}\n\n", narrative.overall_assessment));
    }
}

fn render_conversation(out: &mut String, analysis: &ConversationAnalysis, level: usize) {
    let sub = level + 1;
    heading(out, level, "Conversation");
    out.push_str(&format!("{}\n\n", analysis.summary));

    let m = &analysis.metrics;
    out.push_str(&format!(
        "**Threads:** {} ({} resolved, {} unresolved) | **Avg comments/thread:** {:.1} | **Tone:** {}\n\n",
        m.total_threads,
        m.resolved_threads,
        m.unresolved_threads,
        m.avg_responses_per_thread,
        m.communication_tone.as_str()
    ));

    if !analysis.threads.is_empty() {
        heading(out, sub, "Threads");
        out.push_str("| Topic | Type | Status | Comments | Participants |\n|---|---|---|---|---|\n");
        for thread in &analysis.threads {
            let participants: Vec<&str> = thread.participants.iter().map(String::as_str).collect();
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                cell(&thread.topic),
                thread.thread_type.as_str(),
                thread.resolution_status.as_str(),
                thread.comments.len(),
                participants.join(", ")
            ));
        }
        out.push('\n');
    }

    if !analysis.reviewer_profiles.is_empty() {
        heading(out, sub, "Reviewers");
        out.push_str("| Reviewer | Comments | Questions | Suggestions | Approvals | General | Engagement |\n|---|---|---|---|---|---|---|\n");
        for p in &analysis.reviewer_profiles {
            let c = &p.comment_types;
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                p.name,
                p.total_comments,
                c.questions,
                c.suggestions,
                c.approvals,
                c.general,
                p.engagement_level.as_str()
            ));
        }
        out.push('\n');
    }

    let patterns = &analysis.patterns;
    heading(out, sub, "Communication Patterns");
    out.push_str(&format!(
        "- Author responsiveness: {:.2}\n",
        patterns.author_responsiveness
    ));
    let conflict: BTreeSet<&str> = patterns.conflict_indicators.iter().map(String::as_str).collect();
    if !conflict.is_empty() {
        out.push_str(&format!(
            "- Possible disagreement from: {}\n",
            conflict.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    let collaboration: BTreeSet<&str> = patterns
        .collaboration_indicators
        .iter()
        .map(String::as_str)
        .collect();
    if !collaboration.is_empty() {
        out.push_str(&format!(
            "- Collaborative signals from: {}\n",
            collaboration.into_iter().collect::<Vec<_>>().join(", ")
        ));
    }
    out.push('\n');
}

/// One document for several PRs: overview, comparison, each PR, shared insights
pub fn render_combined_markdown(combined: &CombinedReport<'_>) -> String {
    let s = &combined.summary;
    let mut out = String::new();

    heading(
        &mut out,
        1,
        &format!("Combined PR Analysis: {} Pull Requests", s.pr_count),
    );
    out.push_str("| PR | Title | Author | Repository |\n|---|---|---|---|\n");
    for (i, report) in combined.reports.iter().enumerate() {
        let pr = &report.snapshot;
        out.push_str(&format!(
            "| PR {} | {} | {} | {} |\n",
            i + 1,
            cell(&clip_title(&pr.title)),
            pr.author,
            repository(&pr.url)
        ));
    }
    out.push('\n');

    heading(&mut out, 2, "Executive Summary");
    out.push_str(&format!(
        "This report analyzes {} pull requests involving {} file changes, {} comments and {} commits.",
        s.pr_count, s.total_files, s.total_comments, s.total_commits
    ));
    if s.avg_time_to_first_review > 0.0 {
        out.push_str(&format!(
            " The average time to first review was {:.1} hours.",
            s.avg_time_to_first_review
        ));
    }
    if let Some(avg) = s.avg_time_to_merge {
        out.push_str(&format!(
            " Among the {} merged PRs, the average time to merge was {:.1} hours.",
            s.merged_count, avg
        ));
    }
    out.push_str("\n\n");
    bullets(
        &mut out,
        3,
        "Common Learning Opportunities",
        &s.learning_opportunities,
    );

    heading(&mut out, 2, "Comparative Analysis");
    heading(&mut out, 3, "Timeline Comparison");
    out.push_str("| PR | Author | Files | Comments | Time to Review (hrs) | Time to Merge (hrs) | Review Cycles | Tone |\n|---|---|---|---|---|---|---|---|\n");
    for (i, report) in combined.reports.iter().enumerate() {
        let t = &report.timeline;
        let hrs = |v: Option<f64>| v.map_or_else(|| "N/A".to_string(), |h| format!("{:.1}", h));
        out.push_str(&format!(
            "| PR {} | {} | {} | {} | {} | {} | {} | {} |\n",
            i + 1,
            report.snapshot.author,
            report.snapshot.changed_files.len(),
            report.snapshot.comments.len(),
            hrs(t.time_to_first_review),
            hrs(t.time_to_merge),
            t.review_cycles,
            report
                .conversation
                .as_ref()
                .map_or("n/a", |c| c.metrics.communication_tone.as_str())
        ));
    }
    out.push('\n');

    heading(&mut out, 3, "Patterns and Trends");
    out.push_str(&format!("- Average files changed per PR: {:.1}\n", s.avg_files));
    out.push_str(&format!("- Average comments per PR: {:.1}\n", s.avg_comments));
    if s.distinct_authors > 1 {
        out.push_str(&format!(
            "- Analysis covers {} different authors\n",
            s.distinct_authors
        ));
    }
    out.push('\n');

    for (i, report) in combined.reports.iter().enumerate() {
        render_pr(
            &mut out,
            report,
            &format!("Pull Request {}: {}", i + 1, report.snapshot.title),
            2,
        );
    }

    heading(&mut out, 2, "Combined Insights");
    if let Some(rate) = s.resolution_rate {
        heading(&mut out, 3, "Team Communication");
        out.push_str(&format!(
            "- Total conversation threads across all PRs: {}\n- Overall resolution rate: {:.1}%\n\n",
            s.total_threads, rate
        ));
    }
    if !s.recurring_mistakes.is_empty() {
        heading(&mut out, 3, "Recurring Mistakes");
        for p in &s.recurring_mistakes {
            out.push_str(&format!("- {} (seen {} times)\n", p.pattern, p.count));
        }
        out.push('\n');
    }
    heading(&mut out, 3, "Recommendations");
    out.push_str("- Consider automated checks to cut down on repeated review cycles\n");
    out.push_str(&format!(
        "- Average time to first review of {:.1} hours could be optimized\n",
        s.avg_time_to_first_review
    ));

    out
}
