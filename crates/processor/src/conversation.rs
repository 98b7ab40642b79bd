//! Conversation analysis: threads, reviewer profiles, tone and summary
//!
//! Every comment is assigned to exactly one thread from its own text (file
//! reference, @mention, keyword bucket, or its comment type). Threads, profiles
//! and metrics are then derived from keyword tables in [`crate::rules`].

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use common::models::{Comment, PrSnapshot};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::Result;
use crate::rules::{
    contains_any, first_match, first_match_lowered, COLLABORATION_KEYWORDS,
    COLLABORATIVE_KEYWORDS, CONFLICT_KEYWORDS, DIRECTIVE_KEYWORDS, POSITIVE_KEYWORDS,
    RESOLUTION_RULES, REVIEWER_COMMENT_RULES, THREAD_BUCKET_RULES, THREAD_TYPE_RULES,
};

const STAGE: &str = "conversation";

const FILE_REFERENCE_PATTERN: &str = r"`([^`]+\.[a-zA-Z]+)`";
const MENTION_PATTERN: &str = r"@(\w+)";

const TOPIC_MAX_CHARS: usize = 100;
const RESOLUTION_WINDOW: usize = 3;
const MOST_ACTIVE_LIMIT: usize = 5;
const MAJOR_THREAD_MIN_COMMENTS: usize = 3;
const MAJOR_THREAD_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Resolved,
    Unresolved,
    Ongoing,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Unresolved => "unresolved",
            Self::Ongoing => "ongoing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadType {
    Approval,
    Suggestion,
    Question,
    IssueDiscussion,
    ReviewFeedback,
}

impl ThreadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Suggestion => "suggestion",
            Self::Question => "question",
            Self::IssueDiscussion => "issue_discussion",
            Self::ReviewFeedback => "review_feedback",
        }
    }
}

/// Comments believed to discuss one topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentThread {
    pub key: String,
    pub participants: BTreeSet<String>,
    /// Chronological
    pub comments: Vec<Comment>,
    pub topic: String,
    pub resolution_status: ResolutionStatus,
    pub thread_type: ThreadType,
}

/// Category of a single reviewer comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentCategory {
    Questions,
    Suggestions,
    Approvals,
    General,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTypeCounts {
    pub questions: usize,
    pub suggestions: usize,
    pub approvals: usize,
    pub general: usize,
}

impl CommentTypeCounts {
    fn add(&mut self, category: CommentCategory) {
        match category {
            CommentCategory::Questions => self.questions += 1,
            CommentCategory::Suggestions => self.suggestions += 1,
            CommentCategory::Approvals => self.approvals += 1,
            CommentCategory::General => self.general += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    Low,
    Medium,
    High,
}

impl EngagementLevel {
    pub fn from_comment_count(count: usize) -> Self {
        if count >= 5 {
            Self::High
        } else if count >= 2 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Participation of one non-author commenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerProfile {
    pub name: String,
    pub total_comments: usize,
    pub comment_types: CommentTypeCounts,
    /// Not computed yet; always 0.0
    pub avg_response_time: f64,
    pub engagement_level: EngagementLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunicationTone {
    Collaborative,
    Directive,
    Mixed,
}

impl CommunicationTone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collaborative => "collaborative",
            Self::Directive => "directive",
            Self::Mixed => "mixed",
        }
    }
}

/// A commenter and how many comments they wrote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantActivity {
    pub name: String,
    pub comments: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMetrics {
    pub total_threads: usize,
    pub resolved_threads: usize,
    pub unresolved_threads: usize,
    pub avg_responses_per_thread: f64,
    /// Not computed yet; always 0.0
    pub response_time_avg: f64,
    pub most_active_reviewers: Vec<ParticipantActivity>,
    pub communication_tone: CommunicationTone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunicationPatterns {
    /// Author comments per reviewer comment
    pub author_responsiveness: f64,
    /// One entry per matching comment
    pub conflict_indicators: Vec<String>,
    /// One entry per matching comment
    pub collaboration_indicators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationAnalysis {
    pub threads: Vec<CommentThread>,
    /// Ordered by each reviewer's first comment
    pub reviewer_profiles: Vec<ReviewerProfile>,
    pub metrics: ConversationMetrics,
    pub patterns: CommunicationPatterns,
    pub summary: String,
}

/// Analyze the conversation of a snapshot
pub fn analyze_conversations(snapshot: &PrSnapshot) -> Result<ConversationAnalysis> {
    ConversationAnalyzer::new()?.analyze(snapshot, &mut TracingSink)
}

/// [`analyze_conversations`] reporting to a caller-supplied sink
pub fn analyze_conversations_with(
    snapshot: &PrSnapshot,
    sink: &mut dyn DiagnosticSink,
) -> Result<ConversationAnalysis> {
    ConversationAnalyzer::new()?.analyze(snapshot, sink)
}

/// Holds the compiled thread-key patterns for one or more analyses
#[derive(Debug, Clone)]
pub struct ConversationAnalyzer {
    file_reference: Regex,
    mention: Regex,
}

impl ConversationAnalyzer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            file_reference: Regex::new(FILE_REFERENCE_PATTERN)?,
            mention: Regex::new(MENTION_PATTERN)?,
        })
    }

    pub fn analyze(
        &self,
        snapshot: &PrSnapshot,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ConversationAnalysis> {
        let threads = self.identify_threads(&snapshot.comments)?;
        let reviewer_profiles = reviewer_profiles(&snapshot.comments, &snapshot.author);
        let metrics = conversation_metrics(&threads, &snapshot.comments);
        let patterns = communication_patterns(&snapshot.comments, &snapshot.author);
        let summary = conversation_summary(&threads, &reviewer_profiles);

        sink.record(Diagnostic::new(
            STAGE,
            format!(
                "{} comments -> {} threads, {} reviewers, tone {}",
                snapshot.comments.len(),
                threads.len(),
                reviewer_profiles.len(),
                metrics.communication_tone.as_str()
            ),
        ));

        Ok(ConversationAnalysis {
            threads,
            reviewer_profiles,
            metrics,
            patterns,
            summary,
        })
    }

    /// Bucket a comment by its own text, first matching rule wins
    pub fn thread_key(&self, comment: &Comment) -> String {
        if let Some(caps) = self.file_reference.captures(&comment.body) {
            return format!("file_{}", &caps[1]);
        }
        if let Some(caps) = self.mention.captures(&comment.body) {
            return format!("mention_{}", &caps[1]);
        }
        match first_match(THREAD_BUCKET_RULES, &comment.body) {
            Some(bucket) => bucket.key().to_string(),
            None => format!("general_{}", comment.kind.as_str()),
        }
    }

    fn identify_threads(&self, comments: &[Comment]) -> Result<Vec<CommentThread>> {
        // Buckets keep the order in which their key first appeared
        let mut order: Vec<String> = Vec::new();
        let mut buckets: HashMap<String, Vec<(DateTime<Utc>, &Comment)>> = HashMap::new();

        for comment in comments {
            let key = self.thread_key(comment);
            let created = comment.created()?;
            buckets
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key);
                    Vec::new()
                })
                .push((created, comment));
        }

        let mut threads = Vec::with_capacity(order.len());
        for key in order {
            let Some(mut members) = buckets.remove(&key) else {
                continue;
            };
            if members.is_empty() {
                continue;
            }
            members.sort_by_key(|(created, _)| *created);
            let comments: Vec<Comment> = members.into_iter().map(|(_, c)| c.clone()).collect();
            threads.push(build_thread(key, comments));
        }

        Ok(threads)
    }
}

fn build_thread(key: String, comments: Vec<Comment>) -> CommentThread {
    CommentThread {
        participants: comments.iter().map(|c| c.author.clone()).collect(),
        topic: extract_topic(&comments),
        resolution_status: resolution_status(&comments),
        thread_type: classify_thread_type(&comments),
        key,
        comments,
    }
}

/// First sentence of the earliest comment; expects chronological input
pub fn extract_topic(comments: &[Comment]) -> String {
    let Some(first) = comments.first() else {
        return "General Discussion".to_string();
    };
    let sentence = first.body.split('.').next().unwrap_or_default().trim();
    truncate_chars(sentence, TOPIC_MAX_CHARS)
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Scan the last few comments newest first; expects chronological input
pub fn resolution_status(comments: &[Comment]) -> ResolutionStatus {
    let window_start = comments.len().saturating_sub(RESOLUTION_WINDOW);
    comments[window_start..]
        .iter()
        .rev()
        .find_map(|c| first_match(RESOLUTION_RULES, &c.body))
        .unwrap_or(ResolutionStatus::Unresolved)
}

pub fn classify_thread_type(comments: &[Comment]) -> ThreadType {
    let all_text = comments
        .iter()
        .map(|c| c.body.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ");
    first_match_lowered(THREAD_TYPE_RULES, &all_text).unwrap_or(ThreadType::ReviewFeedback)
}

/// Group comments by author, skipping the PR author
fn group_by_author<'a>(
    comments: &'a [Comment],
    pr_author: &str,
) -> Vec<(&'a str, Vec<&'a Comment>)> {
    let mut grouped: Vec<(&str, Vec<&Comment>)> = Vec::new();
    for comment in comments.iter().filter(|c| c.author != pr_author) {
        match grouped.iter_mut().find(|(name, _)| *name == comment.author) {
            Some((_, list)) => list.push(comment),
            None => grouped.push((&comment.author, vec![comment])),
        }
    }
    grouped
}

pub fn reviewer_profiles(comments: &[Comment], pr_author: &str) -> Vec<ReviewerProfile> {
    group_by_author(comments, pr_author)
        .into_iter()
        .map(|(name, authored)| {
            let mut comment_types = CommentTypeCounts::default();
            for comment in &authored {
                let category = first_match(REVIEWER_COMMENT_RULES, &comment.body)
                    .unwrap_or(CommentCategory::General);
                comment_types.add(category);
            }
            ReviewerProfile {
                name: name.to_string(),
                total_comments: authored.len(),
                comment_types,
                avg_response_time: 0.0,
                engagement_level: EngagementLevel::from_comment_count(authored.len()),
            }
        })
        .collect()
}

pub fn conversation_metrics(threads: &[CommentThread], comments: &[Comment]) -> ConversationMetrics {
    let total_threads = threads.len();
    let resolved_threads = threads
        .iter()
        .filter(|t| t.resolution_status == ResolutionStatus::Resolved)
        .count();
    let unresolved_threads = threads
        .iter()
        .filter(|t| t.resolution_status == ResolutionStatus::Unresolved)
        .count();

    let total_responses: usize = threads.iter().map(|t| t.comments.len()).sum();
    let avg_responses_per_thread = total_responses as f64 / total_threads.max(1) as f64;

    ConversationMetrics {
        total_threads,
        resolved_threads,
        unresolved_threads,
        avg_responses_per_thread,
        response_time_avg: 0.0,
        most_active_reviewers: most_active(comments),
        communication_tone: communication_tone(comments),
    }
}

/// Commenters by comment count, descending; ties keep first-seen order
fn most_active(comments: &[Comment]) -> Vec<ParticipantActivity> {
    let mut activity: Vec<ParticipantActivity> = Vec::new();
    for comment in comments {
        match activity.iter_mut().find(|a| a.name == comment.author) {
            Some(entry) => entry.comments += 1,
            None => activity.push(ParticipantActivity {
                name: comment.author.clone(),
                comments: 1,
            }),
        }
    }
    activity.sort_by(|a, b| b.comments.cmp(&a.comments));
    activity.truncate(MOST_ACTIVE_LIMIT);
    activity
}

/// Tone from independent keyword counts.
///
/// Collaborative needs strictly more collaborative than directive comments and
/// at least one positive one; a tie is always mixed.
pub fn communication_tone(comments: &[Comment]) -> CommunicationTone {
    let mut positive = 0usize;
    let mut directive = 0usize;
    let mut collaborative = 0usize;

    for comment in comments {
        let lowered = comment.body.to_lowercase();
        if contains_any(&lowered, POSITIVE_KEYWORDS) {
            positive += 1;
        }
        if contains_any(&lowered, DIRECTIVE_KEYWORDS) {
            directive += 1;
        }
        if contains_any(&lowered, COLLABORATIVE_KEYWORDS) {
            collaborative += 1;
        }
    }

    tone_from_counts(positive, directive, collaborative)
}

pub fn tone_from_counts(positive: usize, directive: usize, collaborative: usize) -> CommunicationTone {
    if collaborative > directive && positive > 0 {
        CommunicationTone::Collaborative
    } else if directive > collaborative {
        CommunicationTone::Directive
    } else {
        CommunicationTone::Mixed
    }
}

pub fn communication_patterns(comments: &[Comment], pr_author: &str) -> CommunicationPatterns {
    let author_comments = comments.iter().filter(|c| c.author == pr_author).count();
    let reviewer_comments = comments.len() - author_comments;

    let author_responsiveness = if reviewer_comments > 0 {
        author_comments as f64 / reviewer_comments as f64
    } else {
        0.0
    };

    let mut conflict_indicators = Vec::new();
    let mut collaboration_indicators = Vec::new();
    for comment in comments {
        let lowered = comment.body.to_lowercase();
        if contains_any(&lowered, CONFLICT_KEYWORDS) {
            conflict_indicators.push(comment.author.clone());
        }
        if contains_any(&lowered, COLLABORATION_KEYWORDS) {
            collaboration_indicators.push(comment.author.clone());
        }
    }

    CommunicationPatterns {
        author_responsiveness,
        conflict_indicators,
        collaboration_indicators,
    }
}

/// Human-readable recap of already computed threads and profiles
pub fn conversation_summary(threads: &[CommentThread], profiles: &[ReviewerProfile]) -> String {
    let mut parts = Vec::new();

    parts.push(format!(
        "This PR involved {} participants in {} conversation threads.",
        profiles.len() + 1,
        threads.len()
    ));

    let major: Vec<&CommentThread> = threads
        .iter()
        .filter(|t| t.comments.len() >= MAJOR_THREAD_MIN_COMMENTS)
        .take(MAJOR_THREAD_LIMIT)
        .collect();
    if !major.is_empty() {
        parts.push("\nMajor discussion points included:".to_string());
        for thread in major {
            parts.push(format!(
                "• {} ({} exchanges, {})",
                thread.topic,
                thread.comments.len(),
                thread.resolution_status.as_str()
            ));
        }
    }

    let active: Vec<&str> = profiles
        .iter()
        .filter(|p| p.engagement_level != EngagementLevel::Low)
        .map(|p| p.name.as_str())
        .collect();
    if !active.is_empty() {
        parts.push(format!("\nActive reviewers: {}", active.join(", ")));
    }

    if !threads.is_empty() {
        let resolved = threads
            .iter()
            .filter(|t| t.resolution_status == ResolutionStatus::Resolved)
            .count();
        let rate = resolved as f64 / threads.len() as f64 * 100.0;
        parts.push(format!(
            "\nConversation resolution rate: {:.1}% ({}/{} threads resolved)",
            rate,
            resolved,
            threads.len()
        ));
    }

    parts.join("\n")
}
