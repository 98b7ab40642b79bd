#[cfg(test)]
mod tests {
    use crate::combined::*;
    use crate::conversation::analyze_conversations;
    use crate::prompt::AnalysisResult;
    use crate::test_support::*;
    use crate::timeline::analyze_timeline;
    use common::models::ChangedFile;

    fn file(name: &str) -> ChangedFile {
        ChangedFile {
            filename: name.to_string(),
            status: "modified".to_string(),
            additions: 3,
            deletions: 1,
            changes: 4,
            patch: None,
        }
    }

    fn mistakes(items: &[&str]) -> AnalysisResult {
        AnalysisResult {
            developer_mistakes: items.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_summary_across_two_prs() {
        let mut merged = snapshot("2024-01-01T00:00:00Z", "2024-01-03T00:00:00Z");
        merged.merged_at = Some("2024-01-02T00:00:00Z".to_string());
        merged.comments.push(review_comment(
            1,
            "bob",
            "Looks good, thanks",
            "2024-01-01T04:00:00Z",
        ));
        merged.commits.push(commit("a1", AUTHOR, "2024-01-01T01:00:00Z"));
        merged.changed_files = vec![file("src/a.rs"), file("src/b.rs"), file("src/c.rs")];

        let mut open = snapshot("2024-02-01T00:00:00Z", "2024-02-02T00:00:00Z");
        open.author = "zoe".to_string();
        open.comments
            .push(issue_comment(2, "bob", "why?", "2024-02-01T05:00:00Z"));
        open.changed_files = vec![file("README.md")];

        let timelines = [
            analyze_timeline(&merged).unwrap(),
            analyze_timeline(&open).unwrap(),
        ];
        let conversations = [
            analyze_conversations(&merged).unwrap(),
            analyze_conversations(&open).unwrap(),
        ];
        let narrative_a = mistakes(&["Missing error handling in parser", "Unused import"]);
        let narrative_b = mistakes(&["missing error handling for IO", "Magic numbers"]);

        let outcomes = [
            PrOutcome {
                snapshot: &merged,
                timeline: &timelines[0],
                conversation: Some(&conversations[0]),
                narrative: Some(&narrative_a),
            },
            PrOutcome {
                snapshot: &open,
                timeline: &timelines[1],
                conversation: Some(&conversations[1]),
                narrative: Some(&narrative_b),
            },
        ];

        let summary = ComparativeSummary::from_outcomes(&outcomes);

        assert_eq!(summary.pr_count, 2);
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.total_comments, 2);
        assert_eq!(summary.total_commits, 1);
        // The unreviewed PR counts as zero
        assert_eq!(summary.avg_time_to_first_review, 2.0);
        assert_eq!(summary.merged_count, 1);
        assert_eq!(summary.avg_time_to_merge, Some(24.0));
        assert_eq!(summary.avg_files, 2.0);
        assert_eq!(summary.avg_comments, 1.0);
        assert_eq!(summary.distinct_authors, 2);
        assert_eq!(summary.total_threads, 2);
        assert_eq!(summary.resolved_threads, 1);
        assert_eq!(summary.resolution_rate, Some(50.0));
        assert_eq!(summary.learning_opportunities.len(), 4);
        assert_eq!(
            summary.learning_opportunities[0],
            "Missing error handling in parser"
        );
        assert_eq!(
            summary.recurring_mistakes,
            vec![RecurringPattern {
                pattern: "missing error handling".to_string(),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_missing_narratives_and_conversations_are_skipped() {
        let pr = snapshot("2024-01-01T00:00:00Z", "2024-01-02T00:00:00Z");
        let timeline = analyze_timeline(&pr).unwrap();

        let summary = ComparativeSummary::from_outcomes(&[PrOutcome {
            snapshot: &pr,
            timeline: &timeline,
            conversation: None,
            narrative: None,
        }]);

        assert_eq!(summary.total_threads, 0);
        assert_eq!(summary.resolution_rate, None);
        assert_eq!(summary.avg_time_to_merge, None);
        assert!(summary.learning_opportunities.is_empty());
        assert!(summary.recurring_mistakes.is_empty());
    }

    #[test]
    fn test_empty_input() {
        let summary = ComparativeSummary::from_outcomes(&[]);

        assert_eq!(summary.pr_count, 0);
        assert_eq!(summary.avg_time_to_first_review, 0.0);
        assert_eq!(summary.avg_files, 0.0);
        assert_eq!(summary.distinct_authors, 0);
    }

    #[test]
    fn test_recurring_patterns_group_by_leading_words() {
        let patterns = recurring_patterns(&[
            "Unused import here",
            "no tests",
            "unused IMPORT here too",
            "No tests",
            "no tests added",
        ]);

        assert_eq!(
            patterns,
            vec![
                RecurringPattern {
                    pattern: "unused import here".to_string(),
                    count: 2,
                },
                RecurringPattern {
                    pattern: "no tests".to_string(),
                    count: 2,
                },
            ]
        );
    }
}
