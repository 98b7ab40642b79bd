//! Repository context handed to the narrative prompt
//!
//! Holds the current contents of the files a PR touches so the model sees more
//! than the diff hunks.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::PrSnapshot;

/// Changed files whose contents are fetched for context
pub const REPO_CONTEXT_FILE_LIMIT: usize = 10;

/// One file of repository context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextFile {
    pub path: String,
    /// `None` when the path does not exist in the repository
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoContext {
    pub files: Vec<ContextFile>,
}

impl RepoContext {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Markdown with one fenced block per file; empty when there are no files
    pub fn render(&self) -> String {
        if self.files.is_empty() {
            return String::new();
        }

        let mut out = String::from("# Focused Repository Context\n");
        for file in &self.files {
            out.push_str(&format!("\n## {}\n", file.path));
            match &file.content {
                Some(content) => out.push_str(&format!(
                    "```{}\n{}\n```\n",
                    language_for(&file.path),
                    content
                )),
                None => out.push_str("File not found in repository\n"),
            }
        }
        out
    }
}

/// Paths of the first changed files, in the order the platform listed them
pub fn context_paths(snapshot: &PrSnapshot) -> Vec<&str> {
    snapshot
        .changed_files
        .iter()
        .take(REPO_CONTEXT_FILE_LIMIT)
        .map(|f| f.filename.as_str())
        .collect()
}

/// Code fence language for a path, `text` when unknown
pub fn language_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "cs" => "csharp",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "php" => "php",
        "sql" => "sql",
        "html" => "html",
        "css" => "css",
        "scss" => "scss",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "sh" => "bash",
        "md" => "markdown",
        "dockerfile" => "dockerfile",
        _ => "text",
    }
}
