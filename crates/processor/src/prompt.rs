//! LLM prompt construction and reply parsing
//!
//! The reply is expected to contain these section markers, in any case:
//! - `### SUMMARY`
//! - `### KEY CHANGES`
//! - `### COMMENT ANALYSIS`
//! - `### DEVELOPER MISTAKES`
//! - `### CODE QUALITY ISSUES`
//! - `### SUGGESTIONS`
//! - `### OVERALL ASSESSMENT`
//!
//! List sections collect bullet lines, text sections join their lines.

use common::models::{ChangedFile, PrSnapshot};
use serde::{Deserialize, Serialize};

use crate::timeline::TimelineMetrics;

const DESCRIPTION_LIMIT: usize = 1000;
const REPO_CONTEXT_LIMIT: usize = 1000;
const PROMPT_COMMENT_LIMIT: usize = 10;
const COMMENT_BODY_LIMIT: usize = 200;
const PROMPT_FILE_LIMIT: usize = 15;
const PATCH_LIMIT: usize = 2000;
const FILE_CONTEXT_LIMIT: usize = 500;

/// Structured reply of the PR-level analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub key_changes: Vec<String>,
    pub comment_analysis: String,
    pub developer_mistakes: Vec<String>,
    pub code_quality_issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub overall_assessment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Summary,
    KeyChanges,
    CommentAnalysis,
    DeveloperMistakes,
    CodeQualityIssues,
    Suggestions,
    OverallAssessment,
}

const SECTION_MARKERS: &[(&str, Section)] = &[
    ("### SUMMARY", Section::Summary),
    ("### KEY CHANGES", Section::KeyChanges),
    ("### COMMENT ANALYSIS", Section::CommentAnalysis),
    ("### DEVELOPER MISTAKES", Section::DeveloperMistakes),
    ("### CODE QUALITY ISSUES", Section::CodeQualityIssues),
    ("### SUGGESTIONS", Section::Suggestions),
    ("### OVERALL ASSESSMENT", Section::OverallAssessment),
];

const BULLETS: &[char] = &['-', '*', '•'];

impl AnalysisResult {
    fn list_mut(&mut self, section: Section) -> Option<&mut Vec<String>> {
        match section {
            Section::KeyChanges => Some(&mut self.key_changes),
            Section::DeveloperMistakes => Some(&mut self.developer_mistakes),
            Section::CodeQualityIssues => Some(&mut self.code_quality_issues),
            Section::Suggestions => Some(&mut self.suggestions),
            _ => None,
        }
    }

    fn text_mut(&mut self, section: Section) -> Option<&mut String> {
        match section {
            Section::Summary => Some(&mut self.summary),
            Section::CommentAnalysis => Some(&mut self.comment_analysis),
            Section::OverallAssessment => Some(&mut self.overall_assessment),
            _ => None,
        }
    }
}

/// Split an LLM reply into its sections. Text before the first marker is dropped.
pub fn parse_analysis_response(text: &str) -> AnalysisResult {
    let mut result = AnalysisResult::default();
    let mut current: Option<Section> = None;

    for raw in text.lines() {
        let line = raw.trim();
        let upper = line.to_uppercase();

        if let Some((_, section)) = SECTION_MARKERS
            .iter()
            .find(|(marker, _)| upper.contains(marker))
        {
            current = Some(*section);
            continue;
        }

        let Some(section) = current else {
            continue;
        };
        if line.is_empty() {
            continue;
        }

        if let Some(list) = result.list_mut(section) {
            if let Some(item) = line.strip_prefix(BULLETS) {
                list.push(item.trim().to_string());
            } else if !line.starts_with('#') {
                list.push(line.to_string());
            }
        } else if let Some(text) = result.text_mut(section) {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(line);
        }
    }

    result
}

/// Longest prefix of at most `max` chars
fn clip(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn hours_or(value: Option<f64>, missing: &str) -> String {
    match value {
        Some(hours) => format!("{:.1} hours", hours),
        None => missing.to_string(),
    }
}

/// Prompt for the PR-level narrative analysis
pub fn build_analysis_prompt(
    snapshot: &PrSnapshot,
    metrics: &TimelineMetrics,
    repo_context: &str,
) -> String {
    let mut comments = String::new();
    for (i, c) in snapshot.comments.iter().take(PROMPT_COMMENT_LIMIT).enumerate() {
        comments.push_str(&format!(
            "\n{}. [{}] {}: {}...",
            i + 1,
            c.kind.as_str(),
            c.author,
            clip(&c.body, COMMENT_BODY_LIMIT)
        ));
    }

    let mut changes = String::new();
    for f in snapshot.changed_files.iter().take(PROMPT_FILE_LIMIT) {
        changes.push_str(&format!(
            "\n- {}: {} (+{} -{})",
            f.filename, f.status, f.additions, f.deletions
        ));
    }

    let context = if repo_context.is_empty() {
        "No additional context provided"
    } else {
        clip(repo_context, REPO_CONTEXT_LIMIT)
    };

    format!(
        r#"You are an expert code reviewer and software engineering analyst. Please analyze this GitHub Pull Request comprehensively and provide structured insights.

## PULL REQUEST DATA:
PR Title: {title}
Author: {author}
State: {state}
Created: {created}
Updated: {updated}

Description:
{description}...

Files Changed: {files}
Total Comments: {comment_count}
Reviews: {reviews}
Commits: {commits}

## TIMELINE ANALYSIS:
Timeline Metrics:
- Time to first review: {first_review}
- Time to merge: {merge}
- Total lifecycle: {lifecycle:.1} hours
- Review cycles: {cycles}
- Comment frequency: {frequency:.1} comments/day

## REPOSITORY CONTEXT:
{context}

## COMMENTS AND DISCUSSIONS:
{comments}

## FILE CHANGES:
{changes}

## ANALYSIS REQUIREMENTS:
Please provide a comprehensive analysis in the following structured format:

### SUMMARY
[Provide a concise overview of what this PR accomplishes, its scope, and significance]

### KEY CHANGES
[List the 5-10 most important changes made in this PR]

### COMMENT ANALYSIS
[Analyze the comment patterns, reviewer concerns, and how the author responded to feedback]

### DEVELOPER MISTAKES
[Identify any mistakes, oversights, or issues that were caught during review]

### CODE QUALITY ISSUES
[Highlight any code quality, performance, security, or maintainability concerns]

### SUGGESTIONS
[Provide suggestions for improvement or lessons learned]

### OVERALL ASSESSMENT
[Give an overall assessment of the PR quality, review process, and development practices]

Please be specific, actionable, and focus on learning opportunities. Consider the timeline metrics when assessing the efficiency of the review process.
"#,
        title = snapshot.title,
        author = snapshot.author,
        state = snapshot.state,
        created = snapshot.created_at,
        updated = snapshot.updated_at,
        description = clip(&snapshot.description, DESCRIPTION_LIMIT),
        files = snapshot.changed_files.len(),
        comment_count = snapshot.comments.len(),
        reviews = snapshot.reviews.len(),
        commits = snapshot.commits.len(),
        first_review = hours_or(metrics.time_to_first_review, "No review"),
        merge = hours_or(metrics.time_to_merge, "Not merged"),
        lifecycle = metrics.total_lifecycle,
        cycles = metrics.review_cycles,
        frequency = metrics.comment_frequency,
    )
}

/// Prompt for a single file's diff
pub fn build_file_prompt(file: &ChangedFile, pr_context: &str) -> String {
    format!(
        r#"Analyze this specific file change from a pull request:

File: {filename}
Status: {status}
Additions: {additions}
Deletions: {deletions}

PR Context: {context}

Code Changes:
{patch}

Please analyze:
1. What is the purpose of these changes?
2. Are there any potential issues or improvements?
3. How does this fit into the overall PR goal?
4. Any security, performance, or maintainability concerns?

Provide a concise analysis (2-3 paragraphs max).
"#,
        filename = file.filename,
        status = file.status,
        additions = file.additions,
        deletions = file.deletions,
        context = clip(pr_context, FILE_CONTEXT_LIMIT),
        patch = clip(file.patch.as_deref().unwrap_or_default(), PATCH_LIMIT),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
    Minimal,
    /// The file could not be analysed
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Minimal => "minimal",
            Self::Unknown => "unknown",
        }
    }
}

const SENSITIVE_NAME_PARTS: &[&str] = &["auth", "security", "payment", "config", "sql"];
const SENSITIVE_EXTENSIONS: &[&str] = &[".sql", ".env", ".config"];

/// Risk from the file name first, then from the size of the change
pub fn assess_risk_level(file: &ChangedFile) -> RiskLevel {
    let name = file.filename.to_lowercase();
    if SENSITIVE_NAME_PARTS.iter().any(|p| name.contains(p))
        || SENSITIVE_EXTENSIONS.iter().any(|e| name.ends_with(e))
    {
        RiskLevel::High
    } else if file.changes > 100 {
        RiskLevel::Medium
    } else if file.changes > 20 {
        RiskLevel::Low
    } else {
        RiskLevel::Minimal
    }
}

/// `changes / 50`, capped at 10
pub fn complexity_score(file: &ChangedFile) -> f64 {
    (file.changes as f64 / 50.0).min(10.0)
}

/// The `limit` largest changes that carry a patch
pub fn significant_files(files: &[ChangedFile], limit: usize) -> Vec<&ChangedFile> {
    let mut by_size: Vec<&ChangedFile> = files.iter().collect();
    by_size.sort_by(|a, b| b.changes.cmp(&a.changes));
    by_size
        .into_iter()
        .take(limit)
        .filter(|f| f.patch.is_some())
        .collect()
}
