//! GitHub API payloads and their conversion into a [`PrSnapshot`]

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

use common::models::{ChangedFile, Comment, CommentKind, CommitRecord, PrSnapshot, ReviewRecord};

/// User as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubUser {
    pub login: String,
}

/// PR as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubPr {
    pub number: i32,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub html_url: String,
    pub user: GithubUser,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

/// Comment on the issue side of a PR
#[derive(Debug, Deserialize)]
pub struct GithubIssueComment {
    pub id: i64,
    pub user: Option<GithubUser>,
    pub body: Option<String>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

/// Inline review comment
#[derive(Debug, Deserialize)]
pub struct GithubReviewComment {
    pub id: i64,
    pub user: Option<GithubUser>,
    pub body: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

/// Review as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubReview {
    pub id: i64,
    pub user: Option<GithubUser>,
    pub state: String,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Commit as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubCommit {
    pub sha: String,
    pub html_url: Option<String>,
    pub commit: GithubCommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitDetail {
    pub author: GithubCommitAuthor,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GithubCommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

/// Changed file as returned by GitHub API
#[derive(Debug, Deserialize)]
pub struct GithubFile {
    pub filename: String,
    pub status: String,
    pub additions: u32,
    pub deletions: u32,
    pub changes: u32,
    pub patch: Option<String>,
}

/// Raw responses for one PR, before conversion
#[derive(Debug)]
pub struct SnapshotParts {
    pub pr: GithubPr,
    pub issue_comments: Vec<GithubIssueComment>,
    pub review_comments: Vec<GithubReviewComment>,
    pub reviews: Vec<GithubReview>,
    pub commits: Vec<GithubCommit>,
    pub files: Vec<GithubFile>,
}

fn iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn login(user: &Option<GithubUser>) -> String {
    user.as_ref()
        .map(|u| u.login.clone())
        .unwrap_or_else(|| "ghost".to_string())
}

impl SnapshotParts {
    /// Flatten into a snapshot.
    ///
    /// Reviews with a non-empty body also become `review` comments; reviews not
    /// yet submitted are kept as records but produce no comment.
    pub fn into_snapshot(self) -> PrSnapshot {
        let mut timed: Vec<(DateTime<Utc>, Comment)> = Vec::new();

        for c in &self.issue_comments {
            timed.push((
                c.created_at,
                Comment {
                    id: c.id,
                    author: login(&c.user),
                    body: c.body.clone().unwrap_or_default(),
                    created_at: iso(c.created_at),
                    url: c.html_url.clone(),
                    kind: CommentKind::IssueComment,
                },
            ));
        }

        for c in &self.review_comments {
            timed.push((
                c.created_at,
                Comment {
                    id: c.id,
                    author: login(&c.user),
                    body: c.body.clone(),
                    created_at: iso(c.created_at),
                    url: c.html_url.clone(),
                    kind: CommentKind::ReviewComment,
                },
            ));
        }

        for r in &self.reviews {
            let (Some(body), Some(submitted)) = (r.body.as_deref(), r.submitted_at) else {
                continue;
            };
            if body.trim().is_empty() {
                continue;
            }
            timed.push((
                submitted,
                Comment {
                    id: r.id,
                    author: login(&r.user),
                    body: body.to_string(),
                    created_at: iso(submitted),
                    url: r.html_url.clone().unwrap_or_default(),
                    kind: CommentKind::Review,
                },
            ));
        }

        timed.sort_by_key(|(at, _)| *at);

        let reviews = self
            .reviews
            .into_iter()
            .map(|r| ReviewRecord {
                id: r.id,
                author: login(&r.user),
                state: r.state,
                body: r.body,
                submitted_at: r.submitted_at.map(iso),
                html_url: r.html_url,
            })
            .collect();

        let commits = self
            .commits
            .into_iter()
            .map(|c| CommitRecord {
                sha: c.sha,
                message: c.commit.message,
                author: c.commit.author.name,
                date: iso(c.commit.author.date),
                url: c.html_url,
            })
            .collect();

        let changed_files = self
            .files
            .into_iter()
            .map(|f| ChangedFile {
                filename: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
                changes: f.changes,
                patch: f.patch,
            })
            .collect();

        let pr = self.pr;
        PrSnapshot {
            title: pr.title,
            description: pr.body.unwrap_or_default(),
            author: pr.user.login,
            created_at: iso(pr.created_at),
            updated_at: iso(pr.updated_at),
            state: pr.state,
            url: pr.html_url,
            merged_at: pr.merged_at.map(iso),
            closed_at: pr.closed_at.map(iso),
            comments: timed.into_iter().map(|(_, c)| c).collect(),
            changed_files,
            reviews,
            commits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts() -> SnapshotParts {
        let pr: GithubPr = serde_json::from_str(
            r#"{
                "number": 412,
                "title": "Shard the response cache",
                "body": null,
                "state": "closed",
                "html_url": "https://github.com/acme/gateway/pull/412",
                "user": {"login": "maria", "id": 1},
                "created_at": "2024-03-04T09:00:00Z",
                "updated_at": "2024-03-08T17:30:00Z",
                "merged_at": "2024-03-08T17:00:00Z",
                "closed_at": "2024-03-08T17:00:00Z"
            }"#,
        )
        .unwrap();

        let issue_comments: Vec<GithubIssueComment> = serde_json::from_str(
            r#"[{"id": 3, "user": {"login": "maria"}, "body": "will do",
                 "html_url": "https://github.com/acme/gateway/pull/412#issuecomment-3",
                 "created_at": "2024-03-04T18:00:00Z"}]"#,
        )
        .unwrap();

        let review_comments: Vec<GithubReviewComment> = serde_json::from_str(
            r#"[{"id": 1, "user": null, "body": "Why?",
                 "html_url": "https://github.com/acme/gateway/pull/412#discussion_r1",
                 "created_at": "2024-03-04T15:00:00Z", "pull_request_review_id": 100}]"#,
        )
        .unwrap();

        let reviews: Vec<GithubReview> = serde_json::from_str(
            r#"[
                {"id": 100, "user": {"login": "ivan"}, "state": "COMMENTED", "body": "",
                 "html_url": null, "submitted_at": "2024-03-04T15:01:00Z"},
                {"id": 101, "user": {"login": "ivan"}, "state": "APPROVED", "body": "LGTM",
                 "html_url": "https://github.com/acme/gateway/pull/412#pullrequestreview-101",
                 "submitted_at": "2024-03-04T12:00:00Z"},
                {"id": 102, "user": {"login": "li"}, "state": "PENDING", "body": "draft",
                 "submitted_at": null}
            ]"#,
        )
        .unwrap();

        let commits: Vec<GithubCommit> = serde_json::from_str(
            r#"[{"sha": "a1f3c0d", "html_url": null,
                 "commit": {"message": "Add cache",
                            "author": {"name": "Maria", "email": "m@example.com", "date": "2024-03-04T09:00:00Z"}}}]"#,
        )
        .unwrap();

        let files: Vec<GithubFile> = serde_json::from_str(
            r#"[{"filename": "src/cache.rs", "status": "modified", "additions": 3,
                 "deletions": 1, "changes": 4, "patch": "@@ -1 +1 @@"}]"#,
        )
        .unwrap();

        SnapshotParts {
            pr,
            issue_comments,
            review_comments,
            reviews,
            commits,
            files,
        }
    }

    #[test]
    fn test_into_snapshot_metadata() {
        let snapshot = parts().into_snapshot();

        assert_eq!(snapshot.author, "maria");
        assert_eq!(snapshot.description, "");
        assert_eq!(snapshot.created_at, "2024-03-04T09:00:00Z");
        assert_eq!(snapshot.merged_at.as_deref(), Some("2024-03-08T17:00:00Z"));
        assert_eq!(snapshot.reviews.len(), 3);
        assert_eq!(snapshot.reviews[2].submitted_at, None);
        assert_eq!(snapshot.commits[0].author, "Maria");
        assert_eq!(snapshot.changed_files[0].changes, 4);
    }

    #[test]
    fn test_comments_merged_and_sorted() {
        let snapshot = parts().into_snapshot();

        let kinds: Vec<(i64, CommentKind)> =
            snapshot.comments.iter().map(|c| (c.id, c.kind)).collect();

        // Empty-bodied and unsubmitted reviews produce no comment
        assert_eq!(
            kinds,
            vec![
                (101, CommentKind::Review),
                (1, CommentKind::ReviewComment),
                (3, CommentKind::IssueComment),
            ]
        );
        assert_eq!(snapshot.comments[1].author, "ghost");
        assert_eq!(snapshot.comments[0].created_at, "2024-03-04T12:00:00Z");
    }

    #[test]
    fn test_snapshot_timestamps_parse_back() {
        let snapshot = parts().into_snapshot();

        assert!(snapshot.created().is_ok());
        assert!(snapshot.merged().unwrap().is_some());
        assert!(snapshot.comments.iter().all(|c| c.created().is_ok()));
    }
}
