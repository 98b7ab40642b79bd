//! GitHub REST API client for fetching everything about one PR

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use common::context::{ContextFile, RepoContext};
use common::models::PrSnapshot;

use crate::snapshot::{
    GithubCommit, GithubFile, GithubIssueComment, GithubPr, GithubReview, GithubReviewComment,
    SnapshotParts,
};

const API_BASE: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;
const MAX_PAGES: u32 = 50;
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("GitHub API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Invalid PR URL: {0}")]
    InvalidUrl(String),
}

/// Owner, repository and number of a pull request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// Parse `https://github.com/{owner}/{repo}/pull/{number}[/...]`
pub fn parse_pr_url(url: &str) -> Result<PrRef, ClientError> {
    let invalid = || ClientError::InvalidUrl(url.to_string());

    if !url.contains("github.com") {
        return Err(invalid());
    }
    let (repo_part, rest) = url.split_once("/pull/").ok_or_else(invalid)?;

    let path = repo_part
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches("www.")
        .trim_start_matches("github.com/");
    let (owner, repo) = path.split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }

    let number = rest
        .split(['/', '?', '#'])
        .next()
        .and_then(|n| n.parse().ok())
        .ok_or_else(invalid)?;

    Ok(PrRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

async fn check_status(
    url: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ClientError> {
    let status = resp.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ClientError::NotFound(url.to_string()));
    }
    if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    {
        let retry_after = resp
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);
        return Err(ClientError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(resp)
}

/// GitHub API client
pub struct GitHubClient {
    client: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        let client = reqwest::Client::new();
        Self { client, token }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-insight/0.1"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(ref token) = self.token {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ClientError> {
        debug!("GET {}", url);
        let resp = self.client.get(url).headers(self.headers()).send().await?;
        Ok(check_status(url, resp).await?.json().await?)
    }

    /// Raw file body from the contents API; `None` if the path does not exist
    async fn get_raw(&self, url: &str) -> Result<Option<String>, ClientError> {
        debug!("GET {} (raw)", url);
        let mut headers = self.headers();
        headers.insert(ACCEPT, HeaderValue::from_static(RAW_MEDIA_TYPE));
        let resp = self.client.get(url).headers(headers).send().await?;

        match check_status(url, resp).await {
            Ok(resp) => Ok(Some(resp.text().await?)),
            Err(ClientError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Follow `page=` until a short page comes back
    async fn get_paginated<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Vec<T>, ClientError> {
        let mut all = Vec::new();
        let separator = if url.contains('?') { '&' } else { '?' };

        for page in 1..=MAX_PAGES {
            let page_url = format!("{}{}per_page={}&page={}", url, separator, PER_PAGE, page);
            let items: Vec<T> = self.get(&page_url).await?;
            let count = items.len();
            all.extend(items);

            if count < PER_PAGE as usize {
                return Ok(all);
            }
        }

        warn!("Hit pagination limit of {} pages for {}", MAX_PAGES, url);
        Ok(all)
    }

    fn pr_url(&self, pr: &PrRef) -> String {
        format!("{}/repos/{}/{}/pulls/{}", API_BASE, pr.owner, pr.repo, pr.number)
    }

    pub async fn get_pr(&self, pr: &PrRef) -> Result<GithubPr, ClientError> {
        self.get(&self.pr_url(pr)).await
    }

    /// General PR conversation (the issue side of the PR)
    pub async fn list_issue_comments(
        &self,
        pr: &PrRef,
    ) -> Result<Vec<GithubIssueComment>, ClientError> {
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            API_BASE, pr.owner, pr.repo, pr.number
        );
        self.get_paginated(&url).await
    }

    /// Inline diff comments
    pub async fn list_review_comments(
        &self,
        pr: &PrRef,
    ) -> Result<Vec<GithubReviewComment>, ClientError> {
        self.get_paginated(&format!("{}/comments", self.pr_url(pr)))
            .await
    }

    pub async fn list_reviews(&self, pr: &PrRef) -> Result<Vec<GithubReview>, ClientError> {
        self.get_paginated(&format!("{}/reviews", self.pr_url(pr)))
            .await
    }

    pub async fn list_commits(&self, pr: &PrRef) -> Result<Vec<GithubCommit>, ClientError> {
        self.get_paginated(&format!("{}/commits", self.pr_url(pr)))
            .await
    }

    pub async fn list_files(&self, pr: &PrRef) -> Result<Vec<GithubFile>, ClientError> {
        self.get_paginated(&format!("{}/files", self.pr_url(pr)))
            .await
    }

    fn contents_url(&self, pr: &PrRef, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            API_BASE,
            pr.owner,
            pr.repo,
            path.trim_start_matches('/')
        )
    }

    /// Current contents of `paths` on the repository's default branch
    pub async fn fetch_repo_context(
        &self,
        pr: &PrRef,
        paths: &[&str],
    ) -> Result<RepoContext, ClientError> {
        info!(
            "Fetching {} files of context from {}/{}",
            paths.len(),
            pr.owner,
            pr.repo
        );

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let content = self.get_raw(&self.contents_url(pr, path)).await?;
            if content.is_none() {
                debug!("{} not found on default branch", path);
            }
            files.push(ContextFile {
                path: path.to_string(),
                content,
            });
        }

        Ok(RepoContext { files })
    }

    /// Fetch the PR and everything attached to it
    pub async fn fetch_snapshot(&self, pr: &PrRef) -> Result<PrSnapshot, ClientError> {
        info!("Fetching PR data for {}/{}#{}", pr.owner, pr.repo, pr.number);

        let parts = SnapshotParts {
            pr: self.get_pr(pr).await?,
            issue_comments: self.list_issue_comments(pr).await?,
            review_comments: self.list_review_comments(pr).await?,
            reviews: self.list_reviews(pr).await?,
            commits: self.list_commits(pr).await?,
            files: self.list_files(pr).await?,
        };

        let snapshot = parts.into_snapshot();
        info!(
            "Fetched {} comments, {} reviews, {} commits, {} files",
            snapshot.comments.len(),
            snapshot.reviews.len(),
            snapshot.commits.len(),
            snapshot.changed_files.len()
        );
        Ok(snapshot)
    }
}
