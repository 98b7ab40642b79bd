#[cfg(test)]
mod tests {
    use crate::conversation::*;
    use crate::diagnostics::Diagnostic;
    use crate::test_support::*;
    use common::models::{Comment, CommentKind};

    fn analyzer() -> ConversationAnalyzer {
        ConversationAnalyzer::new().unwrap()
    }

    fn bodies(texts: &[&str]) -> Vec<Comment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, body)| {
                issue_comment(
                    i as i64,
                    "bob",
                    body,
                    &format!("2024-01-01T{:02}:00:00Z", i),
                )
            })
            .collect()
    }

    // thread_key tests
    #[test]
    fn test_file_reference_outranks_keywords() {
        let c = issue_comment(
            1,
            "bob",
            "Could we refactor `utils.py` to handle this?",
            "2024-01-01T00:00:00Z",
        );
        assert_eq!(analyzer().thread_key(&c), "file_utils.py");
    }

    #[test]
    fn test_mention_outranks_keywords() {
        let c = issue_comment(1, "bob", "@alice why is this here?", "2024-01-01T00:00:00Z");
        assert_eq!(analyzer().thread_key(&c), "mention_alice");
    }

    #[test]
    fn test_backticked_identifier_without_extension_is_not_a_file() {
        let c = issue_comment(1, "bob", "Rename `foo_bar` please, lgtm", "2024-01-01T00:00:00Z");
        assert_eq!(analyzer().thread_key(&c), "approval");
    }

    #[test]
    fn test_keyword_buckets_in_priority_order() {
        let a = analyzer();
        let key = |body: &str| a.thread_key(&issue_comment(1, "bob", body, "2024-01-01T00:00:00Z"));

        assert_eq!(key("LGTM, but how about tests?"), "approval");
        assert_eq!(key("Why is this async?"), "questions");
        assert_eq!(key("Consider a builder here"), "suggestions");
    }

    #[test]
    fn test_unmatched_comment_falls_back_to_type() {
        let a = analyzer();
        let inline = comment(1, "bob", "Nit: trailing space", "2024-01-01T00:00:00Z", CommentKind::ReviewComment);
        let review = comment(2, "bob", "Ran it locally", "2024-01-01T00:00:00Z", CommentKind::Review);

        assert_eq!(a.thread_key(&inline), "general_review_comment");
        assert_eq!(a.thread_key(&review), "general_review");
    }

    // thread construction tests
    #[test]
    fn test_every_comment_lands_in_exactly_one_thread() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        pr.comments = vec![
            issue_comment(1, "bob", "Why not `lib.rs`?", "2024-01-01T01:00:00Z"),
            issue_comment(2, "author", "@bob fair point", "2024-01-01T02:00:00Z"),
            review_comment(3, "carol", "Looks good", "2024-01-01T03:00:00Z"),
            review_comment(4, "carol", "Consider renaming", "2024-01-01T04:00:00Z"),
            issue_comment(5, "dave", "Ran the benchmarks", "2024-01-01T05:00:00Z"),
            issue_comment(6, "bob", "Also `lib.rs` line 4", "2024-01-01T06:00:00Z"),
        ];

        let analysis = analyze_conversations(&pr).unwrap();

        let mut seen: Vec<i64> = analysis
            .threads
            .iter()
            .flat_map(|t| t.comments.iter().map(|c| c.id))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);
        assert!(analysis.threads.iter().all(|t| !t.comments.is_empty()));
        assert_eq!(analysis.threads[0].key, "file_lib.rs");
        assert_eq!(analysis.threads[0].comments.len(), 2);
    }

    #[test]
    fn test_thread_comments_sorted_and_participants_deduplicated() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        pr.comments = vec![
            issue_comment(2, "bob", "Why second?", "2024-01-02T00:00:00Z"),
            issue_comment(1, "carol", "Why first. More text", "2024-01-01T00:00:00Z"),
            issue_comment(3, "bob", "Why third?", "2024-01-03T00:00:00Z"),
        ];

        let analysis = analyze_conversations(&pr).unwrap();
        let thread = &analysis.threads[0];

        assert_eq!(analysis.threads.len(), 1);
        assert_eq!(thread.key, "questions");
        let ids: Vec<i64> = thread.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(thread.participants.len(), 2);
        assert_eq!(thread.topic, "Why first");
        assert_eq!(thread.thread_type, ThreadType::Question);
    }

    #[test]
    fn test_topic_truncated_to_100_chars() {
        let long = "x".repeat(150);
        let topic = extract_topic(&bodies(&[long.as_str()]));

        assert_eq!(topic.chars().count(), 103);
        assert!(topic.ends_with("..."));
        assert_eq!(extract_topic(&[]), "General Discussion");
    }

    // resolution_status tests
    #[test]
    fn test_ongoing_found_before_older_resolution() {
        let thread = bodies(&["will fix later", "ok", "👍"]);
        assert_eq!(resolution_status(&thread), ResolutionStatus::Ongoing);
    }

    #[test]
    fn test_resolution_only_looks_at_last_three() {
        let thread = bodies(&["fixed", "hmm", "hmm", "hmm"]);
        assert_eq!(resolution_status(&thread), ResolutionStatus::Unresolved);

        let thread = bodies(&["will do", "hmm", "Thanks!"]);
        assert_eq!(resolution_status(&thread), ResolutionStatus::Resolved);
    }

    // classify_thread_type tests
    #[test]
    fn test_thread_type_over_concatenated_bodies() {
        assert_eq!(
            classify_thread_type(&bodies(&["There is a bug", "lgtm now"])),
            ThreadType::Approval
        );
        assert_eq!(
            classify_thread_type(&bodies(&["There is a bug"])),
            ThreadType::IssueDiscussion
        );
        assert_eq!(
            classify_thread_type(&bodies(&["Renamed"])),
            ThreadType::ReviewFeedback
        );
    }

    // reviewer_profiles tests
    #[test]
    fn test_profiles_exclude_author_and_bucket_engagement() {
        let mut comments = Vec::new();
        for i in 0..5 {
            comments.push(issue_comment(i, "bob", "Why?", "2024-01-01T00:00:00Z"));
        }
        comments.push(issue_comment(10, "carol", "I suggest a trait", "2024-01-01T00:00:00Z"));
        comments.push(issue_comment(11, "carol", "lgtm", "2024-01-01T00:00:00Z"));
        comments.push(issue_comment(12, "dave", "Ran it", "2024-01-01T00:00:00Z"));
        comments.push(issue_comment(13, AUTHOR, "Done", "2024-01-01T00:00:00Z"));

        let profiles = reviewer_profiles(&comments, AUTHOR);

        assert_eq!(profiles.len(), 3);
        assert_eq!(profiles[0].name, "bob");
        assert_eq!(profiles[0].engagement_level, EngagementLevel::High);
        assert_eq!(profiles[0].comment_types.questions, 5);
        assert_eq!(profiles[1].engagement_level, EngagementLevel::Medium);
        assert_eq!(profiles[1].comment_types.suggestions, 1);
        assert_eq!(profiles[1].comment_types.approvals, 1);
        assert_eq!(profiles[2].engagement_level, EngagementLevel::Low);
        assert_eq!(profiles[2].comment_types.general, 1);
        assert!(profiles.iter().all(|p| p.avg_response_time == 0.0));
    }

    // metrics tests
    #[test]
    fn test_metrics_counts_and_most_active_order() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        pr.comments = vec![
            issue_comment(1, "carol", "Why this?", "2024-01-01T01:00:00Z"),
            issue_comment(2, "bob", "Why that?", "2024-01-01T02:00:00Z"),
            issue_comment(3, "bob", "Ran it, fixed", "2024-01-01T03:00:00Z"),
            issue_comment(4, "carol", "Nothing here", "2024-01-01T04:00:00Z"),
            issue_comment(5, AUTHOR, "Will look later", "2024-01-01T05:00:00Z"),
        ];

        let metrics = analyze_conversations(&pr).unwrap().metrics;

        // questions (unresolved), general_issue_comment (ongoing: "will" is newest)
        assert_eq!(metrics.total_threads, 2);
        assert_eq!(metrics.resolved_threads, 0);
        assert_eq!(metrics.unresolved_threads, 1);
        assert_eq!(metrics.avg_responses_per_thread, 2.5);
        assert_eq!(metrics.response_time_avg, 0.0);
        let names: Vec<&str> = metrics
            .most_active_reviewers
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["carol", "bob", AUTHOR]);
    }

    #[test]
    fn test_most_active_keeps_top_five() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        for (i, name) in ["a", "b", "c", "d", "e", "f", "f"].iter().enumerate() {
            pr.comments
                .push(issue_comment(i as i64, name, "ok", "2024-01-01T00:00:00Z"));
        }

        let active = analyze_conversations(&pr).unwrap().metrics.most_active_reviewers;

        assert_eq!(active.len(), 5);
        assert_eq!(active[0].name, "f");
        assert_eq!(active[0].comments, 2);
        assert_eq!(active[4].name, "d");
    }

    // communication_tone tests
    #[test]
    fn test_tone_tie_is_mixed() {
        assert_eq!(tone_from_counts(1, 2, 2), CommunicationTone::Mixed);
        assert_eq!(tone_from_counts(0, 0, 0), CommunicationTone::Mixed);
    }

    #[test]
    fn test_tone_collaborative_needs_positive() {
        assert_eq!(tone_from_counts(1, 0, 1), CommunicationTone::Collaborative);
        assert_eq!(tone_from_counts(0, 0, 1), CommunicationTone::Mixed);
        assert_eq!(tone_from_counts(3, 2, 1), CommunicationTone::Directive);
    }

    #[test]
    fn test_tone_from_comments() {
        let comments = bodies(&["Perhaps use a map? Great work", "You must add tests"]);
        assert_eq!(communication_tone(&comments), CommunicationTone::Mixed);

        let comments = bodies(&["Perhaps use a map? Great work", "Might be simpler"]);
        assert_eq!(communication_tone(&comments), CommunicationTone::Collaborative);

        let comments = bodies(&["You must add tests", "This should be private"]);
        assert_eq!(communication_tone(&comments), CommunicationTone::Directive);
    }

    // communication_patterns tests
    #[test]
    fn test_only_author_comments_gives_zero_responsiveness() {
        let comments: Vec<Comment> = (0..10)
            .map(|i| issue_comment(i, AUTHOR, "pushed", "2024-01-01T00:00:00Z"))
            .collect();

        let patterns = communication_patterns(&comments, AUTHOR);

        assert_eq!(patterns.author_responsiveness, 0.0);
    }

    #[test]
    fn test_indicators_keep_one_entry_per_comment() {
        let comments = vec![
            issue_comment(1, "bob", "This is incorrect", "2024-01-01T00:00:00Z"),
            issue_comment(2, "bob", "That is wrong", "2024-01-01T01:00:00Z"),
            issue_comment(3, AUTHOR, "Yes, good point, thanks", "2024-01-01T02:00:00Z"),
        ];

        let patterns = communication_patterns(&comments, AUTHOR);

        assert_eq!(patterns.conflict_indicators, vec!["bob", "bob"]);
        assert_eq!(patterns.collaboration_indicators, vec![AUTHOR]);
        assert_eq!(patterns.author_responsiveness, 0.5);
    }

    // analyze_conversations tests
    #[test]
    fn test_empty_conversation() {
        let pr = snapshot("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");

        let analysis = analyze_conversations(&pr).unwrap();

        assert!(analysis.threads.is_empty());
        assert!(analysis.reviewer_profiles.is_empty());
        assert_eq!(analysis.metrics.avg_responses_per_thread, 0.0);
        assert_eq!(analysis.metrics.communication_tone, CommunicationTone::Mixed);
        assert_eq!(
            analysis.summary,
            "This PR involved 1 participants in 0 conversation threads."
        );
    }

    #[test]
    fn test_summary_lists_major_threads_and_active_reviewers() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        pr.comments = vec![
            issue_comment(1, "bob", "Why a mutex. It seems heavy", "2024-01-01T01:00:00Z"),
            issue_comment(2, "carol", "How about RwLock?", "2024-01-01T02:00:00Z"),
            issue_comment(3, "bob", "Why not atomics? thanks", "2024-01-01T03:00:00Z"),
        ];

        let summary = analyze_conversations(&pr).unwrap().summary;

        assert!(summary.starts_with("This PR involved 3 participants in 1 conversation threads."));
        assert!(summary.contains("• Why a mutex (3 exchanges, resolved)"));
        assert!(summary.contains("Active reviewers: bob"));
        assert!(summary.contains("Conversation resolution rate: 100.0% (1/1 threads resolved)"));
    }

    #[test]
    fn test_malformed_comment_timestamp_fails() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        pr.comments.push(issue_comment(1, "bob", "hi", "later"));

        assert!(analyze_conversations(&pr).is_err());
    }

    #[test]
    fn test_analysis_is_idempotent_and_reports_diagnostic() {
        let mut pr = snapshot("2024-01-01T00:00:00Z", "2024-01-05T00:00:00Z");
        pr.comments = bodies(&["Why?", "lgtm", "See `a.rs`", "@bob ping", "Ran it"]);
        let mut sink: Vec<Diagnostic> = Vec::new();

        let first = analyze_conversations_with(&pr, &mut sink).unwrap();
        let second = analyze_conversations(&pr).unwrap();

        assert_eq!(first, second);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].stage, "conversation");
    }
}
