//! Keyword rule tables
//!
//! Every text heuristic is an ordered list of `(keywords, outcome)` rules checked
//! top to bottom; the first rule with any keyword contained in the lowercased text
//! wins. Precedence is the order of the slice.

use crate::conversation::{CommentCategory, ResolutionStatus, ThreadType};

/// One row of a keyword table
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T> {
    pub keywords: &'static [&'static str],
    pub outcome: T,
}

/// Keyword buckets used when assigning a comment to a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordBucket {
    Approval,
    Questions,
    Suggestions,
}

impl KeywordBucket {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
            Self::Questions => "questions",
            Self::Suggestions => "suggestions",
        }
    }
}

/// True if `text` (already lowercased) contains any keyword
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// First outcome whose keywords appear in `text`, case-insensitively
pub fn first_match<T: Copy>(rules: &[KeywordRule<T>], text: &str) -> Option<T> {
    let lowered = text.to_lowercase();
    first_match_lowered(rules, &lowered)
}

/// Same as [`first_match`] for text that is already lowercase
pub fn first_match_lowered<T: Copy>(rules: &[KeywordRule<T>], lowered: &str) -> Option<T> {
    rules
        .iter()
        .find(|rule| contains_any(lowered, rule.keywords))
        .map(|rule| rule.outcome)
}

pub const THREAD_BUCKET_RULES: &[KeywordRule<KeywordBucket>] = &[
    KeywordRule {
        keywords: &["lgtm", "looks good", "approved"],
        outcome: KeywordBucket::Approval,
    },
    KeywordRule {
        keywords: &["question", "?", "why", "how"],
        outcome: KeywordBucket::Questions,
    },
    KeywordRule {
        keywords: &["suggest", "could", "might", "consider"],
        outcome: KeywordBucket::Suggestions,
    },
];

/// Applied to the concatenated bodies of a thread; fallback is review feedback
pub const THREAD_TYPE_RULES: &[KeywordRule<ThreadType>] = &[
    KeywordRule {
        keywords: &["approve", "lgtm", "looks good"],
        outcome: ThreadType::Approval,
    },
    KeywordRule {
        keywords: &["suggest", "recommend", "could", "might"],
        outcome: ThreadType::Suggestion,
    },
    KeywordRule {
        keywords: &["?", "question", "why", "how", "what"],
        outcome: ThreadType::Question,
    },
    KeywordRule {
        keywords: &["issue", "problem", "error", "bug"],
        outcome: ThreadType::IssueDiscussion,
    },
];

/// Applied per reviewer comment; fallback is general
pub const REVIEWER_COMMENT_RULES: &[KeywordRule<CommentCategory>] = &[
    KeywordRule {
        keywords: &["?", "question", "why", "how"],
        outcome: CommentCategory::Questions,
    },
    KeywordRule {
        keywords: &["suggest", "recommend", "could"],
        outcome: CommentCategory::Suggestions,
    },
    KeywordRule {
        keywords: &["approve", "lgtm", "looks good"],
        outcome: CommentCategory::Approvals,
    },
];

/// Applied to each of the last comments of a thread, newest first
pub const RESOLUTION_RULES: &[KeywordRule<ResolutionStatus>] = &[
    KeywordRule {
        keywords: &["resolved", "fixed", "done", "thanks", "lgtm", "merged"],
        outcome: ResolutionStatus::Resolved,
    },
    KeywordRule {
        keywords: &["will", "todo", "later", "next"],
        outcome: ResolutionStatus::Ongoing,
    },
];

pub const POSITIVE_KEYWORDS: &[&str] = &["thanks", "great", "good", "excellent", "perfect", "nice"];

pub const DIRECTIVE_KEYWORDS: &[&str] = &["must", "should", "need to", "required", "necessary"];

pub const COLLABORATIVE_KEYWORDS: &[&str] =
    &["suggest", "perhaps", "might", "could", "what do you think"];

pub const CONFLICT_KEYWORDS: &[&str] = &["disagree", "wrong", "incorrect", "no", "but", "however"];

pub const COLLABORATION_KEYWORDS: &[&str] = &["agree", "yes", "good point", "thanks", "exactly"];
