//! Snapshot builders shared by unit tests

use common::models::{Comment, CommentKind, CommitRecord, PrSnapshot, ReviewRecord};

pub const AUTHOR: &str = "author";

pub fn snapshot(created_at: &str, updated_at: &str) -> PrSnapshot {
    PrSnapshot {
        title: "Test PR".to_string(),
        description: "Adds a thing.".to_string(),
        author: AUTHOR.to_string(),
        created_at: created_at.to_string(),
        updated_at: updated_at.to_string(),
        state: "open".to_string(),
        url: "https://github.com/acme/widgets/pull/1".to_string(),
        merged_at: None,
        closed_at: None,
        comments: Vec::new(),
        changed_files: Vec::new(),
        reviews: Vec::new(),
        commits: Vec::new(),
    }
}

pub fn comment(id: i64, author: &str, body: &str, created_at: &str, kind: CommentKind) -> Comment {
    Comment {
        id,
        author: author.to_string(),
        body: body.to_string(),
        created_at: created_at.to_string(),
        url: format!("https://github.com/acme/widgets/pull/1#c{}", id),
        kind,
    }
}

pub fn issue_comment(id: i64, author: &str, body: &str, created_at: &str) -> Comment {
    comment(id, author, body, created_at, CommentKind::IssueComment)
}

pub fn review_comment(id: i64, author: &str, body: &str, created_at: &str) -> Comment {
    comment(id, author, body, created_at, CommentKind::ReviewComment)
}

pub fn commit(sha: &str, author: &str, date: &str) -> CommitRecord {
    CommitRecord {
        sha: sha.to_string(),
        message: format!("commit {}", sha),
        author: author.to_string(),
        date: date.to_string(),
        url: None,
    }
}

pub fn review(id: i64, author: &str, state: &str, submitted_at: Option<&str>) -> ReviewRecord {
    ReviewRecord {
        id,
        author: author.to_string(),
        state: state.to_string(),
        body: None,
        submitted_at: submitted_at.map(str::to_string),
        html_url: None,
    }
}
