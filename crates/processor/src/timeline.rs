//! PR lifecycle timeline metrics and activity periods

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use common::models::PrSnapshot;
use common::time::hours_between;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::Result;

/// Idle time after which the next event opens a new activity period
pub const ACTIVITY_GAP_HOURS: i64 = 24;

const STAGE: &str = "timeline";

/// Lifecycle metrics derived from one snapshot. Durations are in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineMetrics {
    pub created_at: DateTime<Utc>,
    /// `None` when nobody reviewed the PR
    pub first_review_at: Option<DateTime<Utc>>,
    pub last_activity_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub time_to_first_review: Option<f64>,
    /// `None` whenever `merged_at` is `None`
    pub time_to_merge: Option<f64>,
    pub total_lifecycle: f64,
    /// Always at least 1
    pub review_cycles: u32,
    /// Comments per day
    pub comment_frequency: f64,
}

/// What dominated an activity period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Revision,
    Review,
    Discussion,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revision => "revision",
            Self::Review => "review",
            Self::Discussion => "discussion",
        }
    }
}

/// A run of events with no gap longer than [`ACTIVITY_GAP_HOURS`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub kind: ActivityKind,
    pub participants: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventSource {
    Comment,
    Commit,
}

#[derive(Debug, Clone)]
struct ActivityEvent {
    at: DateTime<Utc>,
    author: String,
    source: EventSource,
}

/// Chronologically sorted events of a snapshot, grouped into periods on iteration.
///
/// Iterating is lazy and can be restarted any number of times with [`iter`](Self::iter).
#[derive(Debug, Clone)]
pub struct ActivityPeriods {
    events: Vec<ActivityEvent>,
}

impl ActivityPeriods {
    pub fn iter(&self) -> PeriodIter<'_> {
        PeriodIter {
            events: &self.events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of comments and commits the periods are built from
    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}

impl<'a> IntoIterator for &'a ActivityPeriods {
    type Item = ActivityPeriod;
    type IntoIter = PeriodIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields one [`ActivityPeriod`] per gap-separated run of events
#[derive(Debug, Clone)]
pub struct PeriodIter<'a> {
    events: &'a [ActivityEvent],
}

impl Iterator for PeriodIter<'_> {
    type Item = ActivityPeriod;

    fn next(&mut self) -> Option<Self::Item> {
        if self.events.is_empty() {
            return None;
        }

        let gap = Duration::hours(ACTIVITY_GAP_HOURS);
        let mut end = 1;
        while end < self.events.len() && self.events[end].at - self.events[end - 1].at <= gap {
            end += 1;
        }

        let (run, rest) = self.events.split_at(end);
        self.events = rest;
        Some(build_period(run))
    }
}

fn build_period(run: &[ActivityEvent]) -> ActivityPeriod {
    let commits = run
        .iter()
        .filter(|e| e.source == EventSource::Commit)
        .count();
    let comments = run.len() - commits;

    let kind = if commits > comments {
        ActivityKind::Revision
    } else if comments > 0 {
        ActivityKind::Review
    } else {
        ActivityKind::Discussion
    };

    ActivityPeriod {
        start: run[0].at,
        end: run[run.len() - 1].at,
        kind,
        participants: run.iter().map(|e| e.author.clone()).collect(),
    }
}

/// Compute lifecycle metrics for a snapshot
pub fn analyze_timeline(snapshot: &PrSnapshot) -> Result<TimelineMetrics> {
    analyze_timeline_with(snapshot, &mut TracingSink)
}

/// [`analyze_timeline`] reporting to a caller-supplied sink
pub fn analyze_timeline_with(
    snapshot: &PrSnapshot,
    sink: &mut dyn DiagnosticSink,
) -> Result<TimelineMetrics> {
    let created_at = snapshot.created()?;
    let last_activity_at = snapshot.updated()?;
    let merged_at = snapshot.merged()?;
    let closed_at = snapshot.closed()?;

    let first_review_at = find_first_review(snapshot)?;
    let time_to_first_review = first_review_at.map(|at| hours_between(created_at, at));
    let time_to_merge = merged_at.map(|at| hours_between(created_at, at));
    let total_lifecycle = hours_between(created_at, last_activity_at);

    let review_cycles = count_review_cycles(snapshot)?;

    let total_days = (last_activity_at - created_at).num_days().max(1);
    let comment_frequency = snapshot.comments.len() as f64 / total_days as f64;

    sink.record(Diagnostic::new(
        STAGE,
        format!(
            "lifecycle {:.1}h, first review {:?}, {} review cycle(s)",
            total_lifecycle, time_to_first_review, review_cycles
        ),
    ));

    Ok(TimelineMetrics {
        created_at,
        first_review_at,
        last_activity_at,
        merged_at,
        closed_at,
        time_to_first_review,
        time_to_merge,
        total_lifecycle,
        review_cycles,
        comment_frequency,
    })
}

/// Earliest review-type comment or submitted formal review
fn find_first_review(snapshot: &PrSnapshot) -> Result<Option<DateTime<Utc>>> {
    let mut earliest: Option<DateTime<Utc>> = None;

    for comment in snapshot.comments.iter().filter(|c| c.kind.is_review()) {
        let at = comment.created()?;
        earliest = Some(earliest.map_or(at, |e| e.min(at)));
    }

    for review in &snapshot.reviews {
        if let Some(at) =
            common::time::parse_optional("review.submitted_at", review.submitted_at.as_deref())?
        {
            earliest = Some(earliest.map_or(at, |e| e.min(at)));
        }
    }

    Ok(earliest)
}

#[derive(Debug, Default, Clone, Copy)]
struct DayActivity {
    reviews: u32,
    commits: u32,
}

/// Count review-then-revise rounds.
///
/// Activity is bucketed by each event's calendar day in the offset it was
/// recorded with. A cycle is a day with review activity followed by a commit on
/// the next day that has any recorded activity, which is not necessarily the
/// next calendar day.
fn count_review_cycles(snapshot: &PrSnapshot) -> Result<u32> {
    let mut by_day: BTreeMap<NaiveDate, DayActivity> = BTreeMap::new();

    for comment in snapshot.comments.iter().filter(|c| c.kind.is_review()) {
        by_day.entry(comment.created_day()?).or_default().reviews += 1;
    }
    for commit in &snapshot.commits {
        by_day.entry(commit.committed_day()?).or_default().commits += 1;
    }

    let days: Vec<DayActivity> = by_day.into_values().collect();
    let cycles = days
        .windows(2)
        .filter(|pair| pair[0].reviews > 0 && pair[1].commits > 0)
        .count() as u32;

    Ok(cycles.max(1))
}

/// Split the snapshot's comments and commits into activity periods
pub fn analyze_activity_periods(snapshot: &PrSnapshot) -> Result<ActivityPeriods> {
    analyze_activity_periods_with(snapshot, &mut TracingSink)
}

/// [`analyze_activity_periods`] reporting to a caller-supplied sink
pub fn analyze_activity_periods_with(
    snapshot: &PrSnapshot,
    sink: &mut dyn DiagnosticSink,
) -> Result<ActivityPeriods> {
    let mut events = Vec::with_capacity(snapshot.comments.len() + snapshot.commits.len());

    for comment in &snapshot.comments {
        events.push(ActivityEvent {
            at: comment.created()?,
            author: comment.author.clone(),
            source: EventSource::Comment,
        });
    }
    for commit in &snapshot.commits {
        events.push(ActivityEvent {
            at: commit.committed()?,
            author: commit.author.clone(),
            source: EventSource::Commit,
        });
    }

    // Stable, so simultaneous comments stay ahead of commits
    events.sort_by_key(|e| e.at);

    sink.record(Diagnostic::new(
        STAGE,
        format!("{} timestamped events for activity periods", events.len()),
    ));

    Ok(ActivityPeriods { events })
}
