//! Domain models
//!
//! A [`PrSnapshot`] is everything fetched for one pull request. Timestamps stay
//! as the ISO-8601 strings the platform returned; analyzers parse them on use so
//! malformed input surfaces as an error at analysis time.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::{local_date, parse_optional, parse_timestamp};

/// Where a comment came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CommentKind {
    /// General conversation on the PR
    IssueComment,
    /// Inline comment on a diff line
    ReviewComment,
    /// Body of a submitted review
    Review,
}

impl CommentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IssueComment => "issue_comment",
            Self::ReviewComment => "review_comment",
            Self::Review => "review",
        }
    }

    /// Inline comments and review bodies both count as review activity
    pub fn is_review(&self) -> bool {
        matches!(self, Self::ReviewComment | Self::Review)
    }
}

/// One discussion utterance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub author: String,
    pub body: String,
    pub created_at: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "type")]
    pub kind: CommentKind,
}

impl Comment {
    pub fn created(&self) -> Result<DateTime<Utc>> {
        parse_timestamp("comment.created_at", &self.created_at)
    }

    /// Day the comment was written, in the author's offset
    pub fn created_day(&self) -> Result<NaiveDate> {
        local_date("comment.created_at", &self.created_at)
    }
}

/// A file touched by the PR
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    #[serde(default)]
    pub patch: Option<String>,
}

/// A formal review submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReviewRecord {
    pub id: i64,
    pub author: String,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A commit on the PR branch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommitRecord {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl CommitRecord {
    pub fn committed(&self) -> Result<DateTime<Utc>> {
        parse_timestamp("commit.date", &self.date)
    }

    /// Day of the commit, in the committer's offset
    pub fn committed_day(&self) -> Result<NaiveDate> {
        local_date("commit.date", &self.date)
    }
}

/// Complete, read-only data for one pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrSnapshot {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub author: String,
    pub created_at: String,
    pub updated_at: String,
    pub state: String,
    pub url: String,
    #[serde(default)]
    pub merged_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub changed_files: Vec<ChangedFile>,
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
}

impl PrSnapshot {
    /// Decode a snapshot captured as JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn created(&self) -> Result<DateTime<Utc>> {
        require("created_at", &self.created_at)?;
        parse_timestamp("created_at", &self.created_at)
    }

    pub fn updated(&self) -> Result<DateTime<Utc>> {
        require("updated_at", &self.updated_at)?;
        parse_timestamp("updated_at", &self.updated_at)
    }

    pub fn merged(&self) -> Result<Option<DateTime<Utc>>> {
        parse_optional("merged_at", self.merged_at.as_deref())
    }

    pub fn closed(&self) -> Result<Option<DateTime<Utc>>> {
        parse_optional("closed_at", self.closed_at.as_deref())
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::MissingField(field.to_string()));
    }
    Ok(())
}
