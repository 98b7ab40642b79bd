//! PR timeline and conversation analysis
//!
//! [`timeline`] and [`conversation`] are pure functions of a
//! [`PrSnapshot`](common::models::PrSnapshot); [`narrative`] is the only module
//! that performs I/O.

pub mod combined;
pub mod conversation;
pub mod diagnostics;
pub mod error;
pub mod narrative;
pub mod prompt;
pub mod rules;
pub mod timeline;

#[cfg(test)]
mod combined_test;
#[cfg(test)]
mod conversation_test;
#[cfg(test)]
mod test_support;

pub use combined::{ComparativeSummary, PrOutcome};
pub use conversation::{analyze_conversations, ConversationAnalysis};
pub use diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
pub use error::AnalysisError;
pub use narrative::{FileAnalysis, NarrativeClient, NarrativeError};
pub use prompt::AnalysisResult;
pub use timeline::{analyze_activity_periods, analyze_timeline, ActivityPeriods, TimelineMetrics};
