//! PR Insight command line entry point

use anyhow::{bail, Context};
use clap::Parser;
use common::context::context_paths;
use common::models::PrSnapshot;
use common::Config;
use github::GitHubClient;
use processor::{analyze_activity_periods, analyze_conversations, analyze_timeline, NarrativeClient};
use tracing::{debug, info, warn};

mod report;

use report::{CombinedReport, Report};

#[derive(Parser, Debug)]
#[command(name = "pr-insight")]
#[command(
    about = "Analyze GitHub pull requests: timeline, conversations and an optional LLM review",
    long_about = None
)]
struct Cli {
    /// GitHub PR URLs or saved snapshot JSON files; several give one combined report
    #[arg(required = true)]
    targets: Vec<String>,

    /// GitHub access token
    #[arg(short = 't', long, env = "GITHUB_TOKEN")]
    github_token: Option<String>,

    /// LLM model used for the narrative and per-file reviews
    #[arg(short = 'm', long, env = "LLM_MODEL", default_value = "llama3:latest")]
    llm_model: String,

    /// Write the report to this path (`.json` for JSON, Markdown otherwise)
    #[arg(short, long)]
    output: Option<String>,

    /// Skip fetching changed-file contents for the LLM prompt
    #[arg(long)]
    no_repo_context: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file before clap reads env fallbacks
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for the report
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("pr_insight={}", level).parse()?)
                .add_directive(format!("github={}", level).parse()?)
                .add_directive(format!("processor={}", level).parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::from_env();
    config.github_token = cli.github_token.clone();
    config.llm_model = cli.llm_model.clone();

    let github = GitHubClient::new(config.github_token.clone());
    let narrative = if config.llm_enabled {
        Some(NarrativeClient::from_config(&config))
    } else {
        info!("LLM disabled, skipping narrative");
        None
    };

    let combined = cli.targets.len() > 1;
    let mut reports = Vec::with_capacity(cli.targets.len());

    for (i, target) in cli.targets.iter().enumerate() {
        if combined {
            info!("Processing PR {}/{}", i + 1, cli.targets.len());
        }
        // Context is fetched once, for the first PR
        let with_context = !cli.no_repo_context && i == 0;

        match analyze_target(target, &config, &github, narrative.as_ref(), with_context).await {
            Ok(report) => reports.push(report),
            Err(e) if combined => warn!("Failed to analyze {} (continuing): {:#}", target, e),
            Err(e) => return Err(e),
        }
    }

    if reports.is_empty() {
        bail!("none of the {} PRs could be analyzed", cli.targets.len());
    }

    let as_json = cli
        .output
        .as_deref()
        .is_some_and(|path| path.ends_with(".json"));
    let rendered = match (combined, as_json) {
        (false, true) => serde_json::to_string_pretty(&reports[0])?,
        (false, false) => report::render_markdown(&reports[0]),
        (true, true) => serde_json::to_string_pretty(&CombinedReport::new(&reports))?,
        (true, false) => report::render_combined_markdown(&CombinedReport::new(&reports)),
    };

    match cli.output {
        Some(path) => {
            tokio::fs::write(&path, rendered)
                .await
                .with_context(|| format!("failed to write {}", path))?;
            info!("Report written to {}", path);
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// Load, analyze and (optionally) narrate one PR
async fn analyze_target(
    target: &str,
    config: &Config,
    github: &GitHubClient,
    narrative: Option<&NarrativeClient>,
    with_context: bool,
) -> anyhow::Result<Report> {
    let snapshot = load_snapshot(target, github).await?;
    info!("Analyzing PR: {}", snapshot.title);

    let timeline = analyze_timeline(&snapshot).context("timeline analysis failed")?;
    let activity_periods = analyze_activity_periods(&snapshot)
        .context("activity period analysis failed")?
        .iter()
        .collect();

    let conversation = match analyze_conversations(&snapshot) {
        Ok(analysis) => Some(analysis),
        Err(e) => {
            warn!("Conversation analysis failed (continuing): {}", e);
            None
        }
    };

    let (narrative, file_analyses) = match narrative {
        Some(client) => {
            let repo_context = if with_context {
                repo_context(&snapshot, github).await
            } else {
                String::new()
            };

            let narrative = match client.analyze_pr(&snapshot, &timeline, &repo_context).await {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("AI analysis failed (continuing without narrative): {}", e);
                    None
                }
            };
            let pr_context = format!(
                "{} {}",
                snapshot.title,
                snapshot.description.chars().take(200).collect::<String>()
            );
            let files = client
                .analyze_code_changes(&snapshot.changed_files, &pr_context, config.file_analysis_limit)
                .await;
            (narrative, files)
        }
        None => (None, Vec::new()),
    };

    Ok(Report {
        snapshot,
        timeline,
        activity_periods,
        conversation,
        narrative,
        file_analyses,
    })
}

/// Changed-file contents rendered for the prompt; empty when unavailable
async fn repo_context(snapshot: &PrSnapshot, github: &GitHubClient) -> String {
    let pr = match github::parse_pr_url(&snapshot.url) {
        Ok(pr) => pr,
        Err(e) => {
            debug!("No repository context: {}", e);
            return String::new();
        }
    };

    match github.fetch_repo_context(&pr, &context_paths(snapshot)).await {
        Ok(context) => context.render(),
        Err(e) => {
            warn!("Could not get repository context (continuing without): {}", e);
            String::new()
        }
    }
}

/// Fetch from GitHub for PR URLs, otherwise read a captured JSON snapshot
async fn load_snapshot(target: &str, github: &GitHubClient) -> anyhow::Result<PrSnapshot> {
    if target.contains("github.com") {
        let pr = github::parse_pr_url(target)?;
        return Ok(github.fetch_snapshot(&pr).await?);
    }

    let json = tokio::fs::read_to_string(target)
        .await
        .with_context(|| format!("failed to read snapshot {}", target))?;
    Ok(PrSnapshot::from_json(&json)?)
}
